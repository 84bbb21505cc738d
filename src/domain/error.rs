//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the namespace tree rules.
/// None of them is fatal; the tree stays structurally valid after each.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("'{0}' does not exist")]
    NotFound(String),

    #[error("'{0}' already exists")]
    AlreadyExists(String),

    #[error("'{name}' is not a {expected}")]
    WrongKind { name: String, expected: &'static str },

    #[error("symlink target not found: {0}")]
    TargetNotFound(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("invalid name: '{0}'")]
    InvalidName(String),

    #[error("invalid content: {0}")]
    InvalidContent(String),

    #[error("corrupt data at line {line}: {message}")]
    CorruptData { line: usize, message: String },

    #[error("I/O failure: {0}")]
    IoFailure(String),

    #[error("tree invariant violated: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    pub(crate) fn corrupt(line: usize, message: impl Into<String>) -> Self {
        Self::CorruptData {
            line,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        Self::IoFailure(e.to_string())
    }
}

/// Result type for tree operations.
pub type DomainResult<T> = Result<T, DomainError>;
