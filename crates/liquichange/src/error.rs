//! Error types for building and serializing changelogs.

use std::path::PathBuf;

/// Errors that can occur while building, rendering or saving a changelog.
#[derive(Debug, thiserror::Error)]
pub enum ChangelogError {
    /// A required field is missing, empty or malformed at construction time.
    #[error("Invalid {element}: {message}")]
    Validation {
        /// The XML element being built (e.g. `changeSet`, `neo4j:cypher`).
        element: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// An element violates a document invariant at render time.
    #[error("Cannot serialize {element}: {message}")]
    Serialization {
        /// The XML element being rendered.
        element: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// The destination file could not be written.
    #[error("IO error writing '{}': {source}", path.display())]
    Io {
        /// The destination path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Writing to a caller-provided sink failed.
    #[error("IO error writing changelog: {0}")]
    Sink(#[from] std::io::Error),

    /// The requested text encoding is not supported.
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// A JSON changelog definition could not be parsed.
    #[error("Invalid changelog definition: {0}")]
    Definition(#[from] serde_json::Error),
}

impl ChangelogError {
    pub(crate) fn validation(element: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            element,
            message: message.into(),
        }
    }

    pub(crate) fn serialization(element: &'static str, message: impl Into<String>) -> Self {
        Self::Serialization {
            element,
            message: message.into(),
        }
    }

    /// Reports a validation failure found while rendering as a serialization failure.
    pub(crate) fn into_serialization(self) -> Self {
        match self {
            Self::Validation { element, message } => Self::Serialization { element, message },
            other => other,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for construction-time validation failures.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns true for render-time invariant violations.
    #[must_use]
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Returns true for failures writing to a file or sink.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Sink(_))
    }
}

/// Result type for changelog operations.
pub type Result<T> = std::result::Result<T, ChangelogError>;

/// Fails with [`ChangelogError::Validation`] when `value` is empty or only whitespace.
pub(crate) fn require(element: &'static str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ChangelogError::validation(
            element,
            format!("'{}' is required and must not be empty", field),
        ));
    }
    Ok(())
}

/// Fails with [`ChangelogError::Validation`] when `values` is empty or holds an empty entry.
pub(crate) fn require_all(element: &'static str, field: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Err(ChangelogError::validation(
            element,
            format!("'{}' needs at least one entry", field),
        ));
    }
    for value in values {
        require(element, field, value)?;
    }
    Ok(())
}
