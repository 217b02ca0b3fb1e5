use std::time::Duration;
use thiserror::Error;

/// Coarse classification of a [`CoreError`], used by callers that need to map
/// failures onto responses without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Io,
    Engine,
    Timeout,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not-found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Validation => "validation",
            ErrorKind::Io => "io",
            ErrorKind::Engine => "engine",
            ErrorKind::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// Error type shared by the catalog, pipeline, and chain executor.
///
/// Variants stay distinguishable at the service boundary: the surrounding
/// layer picks its response from [`CoreError::kind`], never from the message.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine: {0}")]
    Engine(String),

    #[error("deadline exceeded while {operation} (budget {budget:?})")]
    Timeout { operation: String, budget: Duration },
}

impl CoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        CoreError::Conflict(what.into())
    }

    pub fn validation(what: impl Into<String>) -> Self {
        CoreError::Validation(what.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CoreError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn engine(what: impl Into<String>) -> Self {
        CoreError::Engine(what.into())
    }

    pub fn timeout(operation: impl Into<String>, budget: Duration) -> Self {
        CoreError::Timeout {
            operation: operation.into(),
            budget,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::Io { .. } => ErrorKind::Io,
            CoreError::Engine(_) => ErrorKind::Engine,
            CoreError::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Prefix the error message with caller context (e.g. which chain step
    /// failed) while preserving the variant, so the kind survives annotation.
    pub fn annotate(self, prefix: impl AsRef<str>) -> Self {
        let prefix = prefix.as_ref();
        match self {
            CoreError::NotFound(msg) => CoreError::NotFound(format!("{prefix}: {msg}")),
            CoreError::Conflict(msg) => CoreError::Conflict(format!("{prefix}: {msg}")),
            CoreError::Validation(msg) => CoreError::Validation(format!("{prefix}: {msg}")),
            CoreError::Io { context, source } => CoreError::Io {
                context: format!("{prefix}: {context}"),
                source,
            },
            CoreError::Engine(msg) => CoreError::Engine(format!("{prefix}: {msg}")),
            CoreError::Timeout { operation, budget } => CoreError::Timeout {
                operation: format!("{prefix}: {operation}"),
                budget,
            },
        }
    }
}
