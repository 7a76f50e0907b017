#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Unknown tier: {0}")]
    UnknownTier(String),
}
