use thiserror::Error;

/// Splitter construction errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    /// A zero maximum length can never make progress.
    #[error("maximum chunk length must be greater than zero")]
    ZeroLength,

    /// Not enough room left for fence repair markers.
    #[error("maximum chunk length {max_len} leaves no room for fence markers (need more than {reserve})")]
    NoRoomForFences { max_len: usize, reserve: usize },
}

pub type SplitResult<T> = Result<T, SplitError>;
