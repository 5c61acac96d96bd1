//! Bridge error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// IO error reading the event stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The downstream pipeline stopped accepting text
    #[error("Event sink closed")]
    Closed,
}

pub type BridgeResult<T> = Result<T, BridgeError>;
