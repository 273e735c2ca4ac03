//! Error types for Veridoc.
//!
//! All fallible operations in the library return [`Result`], which uses the
//! single [`VeridocError`] enum. The error design follows two rules:
//!
//! - **System errors bubble up unchanged.** `VeridocError::Io` wraps
//!   `std::io::Error` via `#[from]` and is never re-wrapped or suppressed;
//!   an unreadable file is a real system problem the caller must see.
//! - **Application errors carry context.** Extraction failures record the
//!   failure kind and how many attempts were made; lookup failures record
//!   the offending type id; wrapped causes are preserved with `#[source]`.
//!
//! Classification outcomes (`DOCUMENT_INVALID`, `FIELDS_MISSING`,
//! `NAME_MISMATCH`) are **not** errors. They are successful, typed results
//! the caller branches on; see [`crate::types::Classification`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`VeridocError`].
pub type Result<T> = std::result::Result<T, VeridocError>;

/// Failure kind for a text-extraction attempt.
///
/// The kind decides retry behavior: `Timeout` and `ServiceError` (which
/// covers connection failures) are worth repeating, everything else fails
/// the extraction immediately because repeating the call cannot fix it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionErrorKind {
    /// Source file does not exist or is not readable.
    NotFound,
    /// The recognition request exceeded its deadline.
    Timeout,
    /// The recognition service failed: connection error, processing-error
    /// flag, or a response without parse results.
    ServiceError,
    /// Recognition succeeded but produced no legible text.
    NoText,
    /// No API credential configured for the recognition service.
    Misconfigured,
}

impl ExtractionErrorKind {
    /// Whether an attempt failing with this kind may be retried.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Timeout | Self::ServiceError)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Timeout => "TIMEOUT",
            Self::ServiceError => "SERVICE_ERROR",
            Self::NoText => "NO_TEXT",
            Self::Misconfigured => "MISCONFIGURED",
        }
    }
}

impl std::fmt::Display for ExtractionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for all Veridoc operations.
#[derive(Debug, Error)]
pub enum VeridocError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction error ({kind}) after {attempts} attempt(s): {message}")]
    Extraction {
        kind: ExtractionErrorKind,
        message: String,
        attempts: u32,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unknown document type: {type_id}")]
    UnknownDocumentType { type_id: String },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl VeridocError {
    /// Create an extraction error for a single attempt.
    pub fn extraction<S: Into<String>>(kind: ExtractionErrorKind, message: S) -> Self {
        Self::Extraction {
            kind,
            message: message.into(),
            attempts: 1,
            source: None,
        }
    }

    /// Create an extraction error preserving the underlying cause.
    pub fn extraction_with_source<S, E>(kind: ExtractionErrorKind, message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Extraction {
            kind,
            message: message.into(),
            attempts: 1,
            source: Some(Box::new(source)),
        }
    }

    /// Create a Validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a Cache error.
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Extraction kind, if this is an extraction error.
    pub fn extraction_kind(&self) -> Option<ExtractionErrorKind> {
        match self {
            Self::Extraction { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether the retry loop may repeat the failed attempt.
    pub fn is_retryable(&self) -> bool {
        self.extraction_kind().is_some_and(ExtractionErrorKind::is_retryable)
    }

    /// Tag an extraction error with the number of attempts made before
    /// surfacing it. No-op for other variants.
    pub fn with_attempts(mut self, total: u32) -> Self {
        if let Self::Extraction { attempts, .. } = &mut self {
            *attempts = total;
        }
        self
    }

    /// Message safe to show an end user. Infrastructure detail stays in the
    /// error chain and the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::UnknownDocumentType { .. } => "The document type is not recognized",
            _ => "Document validation failed",
        }
    }
}

impl From<serde_json::Error> for VeridocError {
    fn from(err: serde_json::Error) -> Self {
        VeridocError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::de::Error> for VeridocError {
    fn from(err: toml::de::Error) -> Self {
        VeridocError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_bubbles_unchanged() {
        fn read_file() -> Result<String> {
            let content = std::fs::read_to_string("/nonexistent/file.txt")?;
            Ok(content)
        }

        let result = read_file();
        assert!(matches!(result.unwrap_err(), VeridocError::Io(_)));
    }

    #[test]
    fn test_extraction_error_display() {
        let err = VeridocError::extraction(ExtractionErrorKind::NoText, "no legible text");
        assert_eq!(
            err.to_string(),
            "Extraction error (NO_TEXT) after 1 attempt(s): no legible text"
        );
    }

    #[test]
    fn test_extraction_error_with_source() {
        let source = std::io::Error::other("connection reset");
        let err = VeridocError::extraction_with_source(ExtractionErrorKind::ServiceError, "request failed", source);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_with_attempts_tags_extraction_errors() {
        let err = VeridocError::extraction(ExtractionErrorKind::Timeout, "deadline exceeded").with_attempts(3);
        assert!(err.to_string().contains("after 3 attempt(s)"));

        let other = VeridocError::validation("bad input").with_attempts(3);
        assert!(matches!(other, VeridocError::Validation { .. }));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ExtractionErrorKind::Timeout.is_retryable());
        assert!(ExtractionErrorKind::ServiceError.is_retryable());
        assert!(!ExtractionErrorKind::NotFound.is_retryable());
        assert!(!ExtractionErrorKind::NoText.is_retryable());
        assert!(!ExtractionErrorKind::Misconfigured.is_retryable());
    }

    #[test]
    fn test_is_retryable_on_error() {
        let retryable = VeridocError::extraction(ExtractionErrorKind::Timeout, "slow");
        assert!(retryable.is_retryable());

        let fatal = VeridocError::UnknownDocumentType {
            type_id: "99".to_string(),
        };
        assert!(!fatal.is_retryable());
    }

    #[test]
    fn test_unknown_document_type_display() {
        let err = VeridocError::UnknownDocumentType {
            type_id: "lease-v2".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown document type: lease-v2");
    }

    #[test]
    fn test_user_message_is_generic_for_infrastructure() {
        let err = VeridocError::extraction(ExtractionErrorKind::ServiceError, "backend exploded");
        assert_eq!(err.user_message(), "Document validation failed");
    }
}
