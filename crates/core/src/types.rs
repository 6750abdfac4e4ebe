/// Product identifiers come from the marketplace and are stored as BIGINT.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
