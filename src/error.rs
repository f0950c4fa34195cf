//! Main Crate Error

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Chord crate error enum.
pub enum Error {
    /// Indicates that an [Id](crate::Id) was built from the wrong number of bytes.
    #[error("Invalid Id size, expected 20 bytes, got {0}")]
    InvalidIdSize(usize),

    /// Indicates that an [Id](crate::Id) string is not valid hex.
    #[error("Invalid Id encoding: {0}")]
    InvalidIdEncoding(String),

    /// Finger table slots are 1-indexed.
    #[error("Invalid finger index {0}, finger indices start at 1")]
    InvalidFingerIndex(usize),
}

/// Alias for `Result<T, Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;
