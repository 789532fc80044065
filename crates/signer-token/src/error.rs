//! Error types for the token crate.

use thiserror::Error;

/// Errors that can occur during token operations.
///
/// Verification errors are only surfaced internally (for logging); the
/// request-facing checks collapse them into a plain `false`.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Failed to parse the service signing key.
    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),

    /// Failed to create token.
    #[error("failed to create token: {0}")]
    TokenCreationFailed(String),

    /// No bearer token in the request.
    #[error("no bearer token presented")]
    MissingToken,

    /// Token could not be decoded or its signature did not verify.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Header asserts an algorithm other than the expected one.
    #[error("unexpected token algorithm: {0}")]
    InvalidAlgorithm(String),

    /// Header asserts a different key identifier.
    #[error("unexpected key id")]
    InvalidKeyId,

    /// Token is missing required claim.
    #[error("token missing required claim: {claim}")]
    MissingClaim { claim: String },

    /// Audience does not name this service.
    #[error("invalid audience: {0}")]
    InvalidAudience(String),

    /// Current time is before `nbf` or `iat`.
    #[error("token is not yet valid")]
    NotYetValid,

    /// Current time is after `exp`.
    #[error("token has expired at {expired_at}")]
    Expired { expired_at: i64 },

    /// IO error (reading keys).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TokenError {
    pub fn missing_claim(claim: impl Into<String>) -> Self {
        Self::MissingClaim {
            claim: claim.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::InvalidAlgorithm => TokenError::InvalidAlgorithm(err.to_string()),
            _ => TokenError::InvalidToken(err.to_string()),
        }
    }
}
