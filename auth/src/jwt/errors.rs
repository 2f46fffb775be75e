use thiserror::Error;

/// Error type for JWT operations.
///
/// Verification failures are classified once here, so callers
/// pattern-match on `TokenExpired` / `InvalidToken` instead of inspecting
/// library error messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is expired")]
    TokenExpired,

    #[error("Token is invalid: {0}")]
    InvalidToken(String),
}
