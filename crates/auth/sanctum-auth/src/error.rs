//! Authentication storage error types

/// Errors raised while reading or writing stored credentials
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    /// Storage backend failure (keychain, file system)
    #[error("Storage error: {0}")]
    Storage(String),
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
    /// A stored secret exists but cannot be read back (corrupt, foreign key)
    #[error("Unreadable secret: {0}")]
    Unreadable(String),
    /// Token error (empty, not UTF-8)
    #[error("Token error: {0}")]
    Token(String),
    /// Other errors
    #[error("Other: {0}")]
    Other(String),
}
