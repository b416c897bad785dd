//! Error types for the SIP price engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while refreshing configuration
//! snapshots or deriving prices.

use thiserror::Error;

/// The main error type for the SIP price engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use sip_price_engine::error::EngineError;
///
/// let error = EngineError::InvalidParameter {
///     field: "primary_item_price".to_string(),
///     message: "must be positive".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Invalid parameter 'primary_item_price': must be positive"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Caller input was malformed or out of range.
    #[error("Invalid parameter '{field}': {message}")]
    InvalidParameter {
        /// The offending field.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A configuration row or mapping record does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// The kind of record that was looked up.
        entity: String,
        /// The key that was looked up.
        key: String,
    },

    /// An internal invariant was violated (corrupt configuration or a logic defect).
    #[error("Invariant violation: {message}")]
    InvariantViolation {
        /// A description of the violated invariant.
        message: String,
    },

    /// A collaborator service or store failed.
    #[error("External service '{service}' failed: {message}")]
    ExternalService {
        /// The collaborator that failed.
        service: String,
        /// A description of the failure.
        message: String,
    },

    /// A cache was read before its first successful refresh.
    #[error("Cache '{domain}' has not completed its first refresh")]
    CacheNotReady {
        /// The cache domain.
        domain: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

/// Coarse classification of an [`EngineError`] used for retry and status decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected caller input; never retried.
    Parameter,
    /// Missing configuration or mapping record.
    NotFound,
    /// Invariant violation or broken configuration.
    Internal,
    /// Collaborator failure.
    External,
    /// Engine not ready to serve yet.
    Unavailable,
}

impl EngineError {
    /// Returns the error's kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidParameter { .. } => ErrorKind::Parameter,
            EngineError::NotFound { .. } => ErrorKind::NotFound,
            EngineError::InvariantViolation { .. }
            | EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. } => ErrorKind::Internal,
            EngineError::ExternalService { .. } => ErrorKind::External,
            EngineError::CacheNotReady { .. } => ErrorKind::Unavailable,
        }
    }

    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        EngineError::InvalidParameter {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        EngineError::InvariantViolation {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: &str, key: impl ToString) -> Self {
        EngineError::NotFound {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
