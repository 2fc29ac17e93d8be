use thiserror::Error;
use uuid::Uuid;

/// The property or saved-search store could not serve a request. Fatal for
/// the current run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] homealert_db::DbError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A single alert could not be delivered. Recorded per item; never aborts a run.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("mail transport misconfigured: {0}")]
    Config(String),
    #[error("invalid address \"{address}\": {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("failed to build message: {0}")]
    Message(String),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("mail server rejected message: {0}")]
    Rejected(String),
    #[error("send timed out after {0}s")]
    Timeout(u64),
}

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("an alert run is already in progress")]
    RunInProgress,
    #[error("hours_back must be between 1 and {max}, got {got}")]
    InvalidWindow { got: u32, max: u32 },
    #[error("saved search not found: {0}")]
    NotFound(Uuid),
}
