//! Error types and HTTP status mapping
//!
//! Each stage of the extraction pipeline has its own error enum. `ExtractError`
//! wraps them with the stage description so the root cause survives logging.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for extractor operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Failure of an outbound HTTP request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },
}

impl TransportError {
    pub fn request(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }
}

/// Failure while redeeming an authorization code at the token endpoint
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("invalid exchange request: {message}")]
    InvalidRequest { message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("provider rejected the request (HTTP {status}): {}", describe_rejection(.error, .description))]
    Rejected {
        status: u16,
        error: String,
        description: Option<String>,
    },

    #[error("token endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed token response: {message}")]
    MalformedResponse { message: String },
}

impl ExchangeError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }
}

fn describe_rejection(error: &str, description: &Option<String>) -> String {
    match description {
        Some(description) if !description.is_empty() => format!("{} ({})", error, description),
        _ => error.to_string(),
    }
}

/// Failure while verifying an ID token
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("invalid verifier configuration: {message}")]
    InvalidConfig { message: String },

    #[error("malformed ID token: {message}")]
    Malformed { message: String },

    #[error("unsupported signing algorithm {alg}")]
    UnsupportedAlgorithm { alg: String },

    #[error("failed to fetch signing keys: {message}")]
    KeyFetch { message: String },

    #[error("no signing key found for {}", describe_kid(.kid))]
    KeyNotFound { kid: Option<String> },

    #[error("signature verification failed: {message}")]
    Signature { message: String },

    #[error("issuer mismatch: expected '{expected}', got '{actual}'")]
    IssuerMismatch { expected: String, actual: String },

    #[error("audience mismatch: expected '{expected}', got {actual:?}")]
    AudienceMismatch { expected: String, actual: Vec<String> },

    #[error("token expired at {expired_at} (now {now})")]
    Expired { expired_at: u64, now: u64 },

    #[error("token is not valid before {not_before} (now {now})")]
    NotYetValid { not_before: u64, now: u64 },

    #[error("token issued in the future at {issued_at} (now {now})")]
    IssuedInFuture { issued_at: u64, now: u64 },
}

impl VerifyError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    pub fn key_fetch(message: impl Into<String>) -> Self {
        Self::KeyFetch {
            message: message.into(),
        }
    }

    pub fn signature(message: impl Into<String>) -> Self {
        Self::Signature {
            message: message.into(),
        }
    }
}

fn describe_kid(kid: &Option<String>) -> String {
    match kid {
        Some(kid) => format!("key id '{}'", kid),
        None => "token without key id".to_string(),
    }
}

/// Extraction error, one variant per pipeline stage
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("cannot apply OIDC option: {message}")]
    InvalidOption { message: String },

    #[error("cannot exchange code for token: {0}")]
    Exchange(#[source] ExchangeError),

    #[error("response missing ID token")]
    MissingIdToken,

    #[error("cannot verify ID token: {0}")]
    Verification(#[source] VerifyError),

    #[error("cannot extract claims from ID token: {0}")]
    Claims(#[source] serde_json::Error),

    #[error("ID token has no '{claim}' claim")]
    MissingUsername { claim: String },
}

impl ExtractError {
    pub fn invalid_option(message: impl Into<String>) -> Self {
        Self::InvalidOption {
            message: message.into(),
        }
    }

    /// True when the provider answered successfully but returned no ID token,
    /// which usually means the `openid` scope was not requested.
    pub fn is_missing_id_token(&self) -> bool {
        matches!(self, Self::MissingIdToken)
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidOption { .. } => 500,
            Self::Exchange(ExchangeError::InvalidRequest { .. }) => 400,
            Self::Exchange(ExchangeError::Rejected { .. }) => 400,
            Self::Exchange(ExchangeError::Transport(TransportError::Timeout { .. })) => 504,
            Self::Exchange(_) => 502,
            Self::MissingIdToken => 502,
            Self::Verification(VerifyError::KeyFetch { .. }) => 502,
            Self::Verification(_) => 401,
            Self::Claims(_) => 401,
            Self::MissingUsername { .. } => 401,
        }
    }

    /// Get the error key for this error
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::InvalidOption { .. } => "invalid_option",
            Self::Exchange(_) => "exchange_failed",
            Self::MissingIdToken => "missing_id_token",
            Self::Verification(_) => "token_verification_failed",
            Self::Claims(_) => "invalid_claims",
            Self::MissingUsername { .. } => "missing_username",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<&ExtractError> for ErrorResponse {
    fn from(err: &ExtractError) -> Self {
        Self {
            error: err.error_key().to_string(),
            message: err.to_string(),
        }
    }
}
