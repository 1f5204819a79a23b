use dispatch_core::DispatchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("invalid payload: {0}")]
    Payload(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("console state lock poisoned")]
    StatePoisoned,
}
