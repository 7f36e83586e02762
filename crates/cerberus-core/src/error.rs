//! Unified application error types for Cerberus.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The credential is malformed or its signature does not verify.
    CredentialInvalid,
    /// The credential verified but is past its expiry.
    CredentialExpired,
    /// The store holds no entry for the requested session slot.
    SessionNotFound,
    /// The presented credential does not match the stored one.
    CredentialMismatch,
    /// The user store rejected the identity or password.
    IdentityRejected,
    /// The key-value backend failed or is unreachable.
    Backend,
    /// A backend call did not finish before its deadline.
    Timeout,
    /// Signing a credential failed.
    Signing,
    /// The system random source failed.
    Entropy,
    /// A configuration error occurred.
    Configuration,
    /// Input validation failed.
    Validation,
    /// A conflict occurred (duplicate entry).
    Conflict,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether this kind describes a failure of the infrastructure rather
    /// than of the presented credentials.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Backend | Self::Timeout | Self::Signing | Self::Entropy | Self::Internal
        )
    }

    /// Whether this kind means "the caller is not authenticated".
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::CredentialInvalid
                | Self::CredentialExpired
                | Self::SessionNotFound
                | Self::CredentialMismatch
                | Self::IdentityRejected
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CredentialInvalid => write!(f, "CREDENTIAL_INVALID"),
            Self::CredentialExpired => write!(f, "CREDENTIAL_EXPIRED"),
            Self::SessionNotFound => write!(f, "SESSION_NOT_FOUND"),
            Self::CredentialMismatch => write!(f, "CREDENTIAL_MISMATCH"),
            Self::IdentityRejected => write!(f, "IDENTITY_REJECTED"),
            Self::Backend => write!(f, "BACKEND"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Signing => write!(f, "SIGNING"),
            Self::Entropy => write!(f, "ENTROPY"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Cerberus.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid-credential error.
    pub fn credential_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialInvalid, message)
    }

    /// Create an expired-credential error.
    pub fn credential_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialExpired, message)
    }

    /// Create a session-not-found error.
    pub fn session_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SessionNotFound, message)
    }

    /// Create a credential-mismatch error.
    pub fn credential_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialMismatch, message)
    }

    /// Create an identity-rejected error.
    pub fn identity_rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IdentityRejected, message)
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Backend, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Create a signing error.
    pub fn signing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Signing, message)
    }

    /// Create an entropy error.
    pub fn entropy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Entropy, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// See [`ErrorKind::is_infrastructure`].
    pub fn is_infrastructure(&self) -> bool {
        self.kind.is_infrastructure()
    }

    /// See [`ErrorKind::is_unauthenticated`].
    pub fn is_unauthenticated(&self) -> bool {
        self.kind.is_unauthenticated()
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
