//! Decoder-specific error types

/// Result type for decoder operations
pub type DecoderResult<T> = Result<T, DecoderError>;

/// Decoder-specific error types
///
/// For the admission filter every variant means the same thing: the output
/// is not a candidate for the topic. The distinctions exist for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("invalid script hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("script does not match the tagged-data pattern: {0}")]
    NotTaggedData(String),

    #[error("push at offset {offset} declares {declared} bytes but only {available} remain")]
    TruncatedPush {
        offset: usize,
        declared: usize,
        available: usize,
    },

    #[error("drop opcodes account for {dropped} stack items but {pushed} were pushed")]
    DropCountMismatch { dropped: usize, pushed: usize },
}
