//! Error types for Catena.
//!
//! Two families of errors exist:
//!
//! - [`StageError`] is raised by a middleware or a terminal handler. It is
//!   always recoverable: the chain resolves it into a normal result through
//!   the failing stage's own error handler or the chain default.
//! - [`ChainError`] is a misuse of the engine itself (for example running a
//!   chain without a terminal handler). It is the only error that comes out
//!   of `Chain::run`.
//!
//! A `StageError` carries a machine-readable `code` (the discriminator an
//! error handler branches on), a human-readable message, an optional
//! attribute path and an optional source that is never exposed to clients.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for stage operations.
pub type StageResult<T> = Result<T, StageError>;

/// Coarse classification of a [`StageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input did not match the expected schema.
    Validation,
    /// Input could not be decoded (empty or malformed body).
    Parse,
    /// Unexpected failure inside a stage.
    Internal,
    /// A collaborator called from a stage failed.
    External,
    /// The run already has its final result from an error handler further
    /// down the chain. Enclosing stages should propagate it with `?`.
    Resolved,
}

impl ErrorKind {
    /// Returns the default status code for this kind.
    #[must_use]
    pub const fn default_status(self) -> u16 {
        match self {
            Self::Validation | Self::Parse => 400,
            Self::Internal | Self::Resolved => 500,
            Self::External => 502,
        }
    }

    /// Returns `true` if errors of this kind are caused by the caller.
    #[must_use]
    pub const fn is_client_error(self) -> bool {
        matches!(self, Self::Validation | Self::Parse)
    }

    /// Returns the kind name as used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Parse => "parse",
            Self::Internal => "internal",
            Self::External => "external",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure raised by a pipeline stage.
///
/// # Example
///
/// ```
/// use catena_core::{ErrorKind, StageError};
///
/// let error = StageError::validation("MissingAttribute", "Attribute 'age' is required")
///     .with_path("age");
///
/// assert_eq!(error.kind(), ErrorKind::Validation);
/// assert!(error.is_code("MissingAttribute"));
/// assert_eq!(error.path(), Some("age"));
/// ```
#[derive(Error, Debug)]
#[error("{code}: {message}")]
pub struct StageError {
    kind: ErrorKind,
    code: String,
    message: String,
    path: Option<String>,
    #[source]
    source: Option<anyhow::Error>,
}

impl StageError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Creates a validation error.
    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, code, message)
    }

    /// Creates a parse error.
    pub fn parse(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, code, message)
    }

    /// Creates an internal error with the generic `InternalError` code.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, "InternalError", message)
    }

    /// Creates an error for a failed collaborator.
    pub fn external(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::External, code, message)
    }

    /// Creates the marker handed to enclosing stages once an error handler
    /// has produced the run's result.
    pub fn resolved() -> Self {
        Self::new(
            ErrorKind::Resolved,
            "Resolved",
            "The run was resolved by an error handler.",
        )
    }

    /// Attaches the attribute path the error refers to.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attaches an underlying cause. The cause is logged, never serialized.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the discriminator code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the attribute path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns `true` if the error carries the given code.
    #[must_use]
    pub fn is_code(&self, code: &str) -> bool {
        self.code == code
    }

    /// Returns `true` if this is the marker created by [`StageError::resolved`].
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self.kind, ErrorKind::Resolved)
    }

    /// Returns the default status code for this error.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.kind.default_status()
    }

    /// Converts this error to the serializable client envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: self.code.clone(),
            message: self.message.clone(),
            path: self.path.clone(),
        }
    }
}

impl From<serde_json::Error> for StageError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse("SyntaxError", error.to_string()).with_source(error)
    }
}

/// Serializable error body returned to clients.
///
/// ```json
/// { "error": "MissingAttribute", "message": "...", "path": "age" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Machine-readable discriminator.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Attribute path the error refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Errors caused by misuse of the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// `run` was called before a terminal handler was registered.
    #[error("Handler not defined in the middleware chain.")]
    HandlerNotDefined,
}

impl ChainError {
    /// Returns the discriminator name of this error.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::HandlerNotDefined => "HandlerNotDefinedError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_validation_error() {
        let error = StageError::validation("MissingAttribute", "Attribute 'age' is required");
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(error.status(), 400);
        assert_eq!(error.to_string(), "MissingAttribute: Attribute 'age' is required");
    }

    #[test]
    fn test_internal_error_uses_generic_code() {
        let error = StageError::internal("database exploded");
        assert_eq!(error.code(), "InternalError");
        assert_eq!(error.status(), 500);
        assert!(!error.kind().is_client_error());
    }

    #[test]
    fn test_with_path() {
        let error = StageError::validation("InvalidAttribute", "expected number").with_path("age");
        assert_eq!(error.path(), Some("age"));
    }

    #[test]
    fn test_source_is_kept_out_of_envelope() {
        let cause = std::io::Error::other("secret connection string");
        let error = StageError::external("StoreUnavailable", "item store is unavailable")
            .with_source(cause);

        assert!(error.source().is_some());

        let json = serde_json::to_string(&error.to_envelope()).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("path"));
    }

    #[test]
    fn test_envelope_serialization() {
        let error = StageError::validation("MissingAttribute", "Attribute 'age' is required")
            .with_path("age");
        let value = serde_json::to_value(error.to_envelope()).unwrap();

        assert_eq!(value["error"], "MissingAttribute");
        assert_eq!(value["path"], "age");
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{*").unwrap_err();
        let error = StageError::from(err);
        assert_eq!(error.kind(), ErrorKind::Parse);
        assert!(error.is_code("SyntaxError"));
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::Validation).unwrap();
        assert_eq!(json, "\"validation\"");
    }

    #[test]
    fn test_resolved_marker() {
        let marker = StageError::resolved();
        assert!(marker.is_resolved());
        assert_eq!(marker.kind().as_str(), "resolved");
        assert!(!StageError::internal("boom").is_resolved());
    }

    #[test]
    fn test_chain_error_message() {
        let error = ChainError::HandlerNotDefined;
        assert_eq!(error.to_string(), "Handler not defined in the middleware chain.");
        assert_eq!(error.name(), "HandlerNotDefinedError");
    }

    #[test]
    fn test_all_kinds_map_to_error_statuses() {
        for kind in [
            ErrorKind::Validation,
            ErrorKind::Parse,
            ErrorKind::Internal,
            ErrorKind::External,
        ] {
            let status = kind.default_status();
            assert!((400..600).contains(&status), "{kind} mapped to {status}");
        }
    }

    proptest::proptest! {
        #[test]
        fn prop_code_is_preserved(code in "[A-Za-z]{1,24}", message in ".{0,64}") {
            let error = StageError::validation(code.clone(), message.clone());
            proptest::prop_assert!(error.is_code(&code));
            proptest::prop_assert_eq!(error.to_envelope().message, message);
        }
    }
}
