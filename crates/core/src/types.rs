/// Task identifiers are opaque strings chosen by the ingestion layer
/// (UUID v4 when the caller supplies none).
pub type TaskId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
