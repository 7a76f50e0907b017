/// Analysis ids are opaque strings assigned by the remote service.
pub type AnalysisId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
