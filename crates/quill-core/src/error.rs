//! Error types for compilation

use std::fmt;

use thiserror::Error;

/// Broad class of a failure, used to pick a process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed source: lexing or call-syntax errors
    CompileTime,
    /// A function call failed while running
    Runtime,
    /// A raw value could not be converted to the expected type
    IllegalConversion,
    /// Invariant violation inside the compiler or a library
    Internal,
}

/// A line/column position in source text (both 1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Compute the position of a byte offset within `source`
    pub fn locate(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors that can occur while compiling a document
#[derive(Error, Debug)]
pub enum QuillError {
    /// Unterminated braces or illegal identifier characters
    #[error("Lexical error at {position}: {message}")]
    Lexical { position: Position, message: String },

    /// A call site that does not follow the call grammar
    #[error("Malformed function call at {position}: {message}")]
    Walker { position: Position, message: String },

    /// No function accepts the supplied arguments
    #[error("Cannot call .{call}: {message}")]
    Binding {
        call: String,
        message: String,
        /// Signatures of the functions that were considered
        candidates: Vec<String>,
    },

    /// A validator rejected the call
    #[error(".{call} is not allowed here: {constraint}")]
    Veto { call: String, constraint: String },

    /// A raw value could not be converted to a parameter type
    #[error("Cannot convert '{raw}' to {expected}")]
    TypeConversion { expected: String, raw: String },

    /// A function failed while running
    #[error("{0}")]
    Runtime(String),

    /// The context was used before a pipeline was attached to it
    #[error("Context is not attached to a pipeline")]
    UnattachedPipeline,

    /// A function descriptor breaks registration rules
    #[error("Invalid descriptor for .{function}: {reason}")]
    InvalidDescriptor { function: String, reason: String },

    /// An external resource could not be loaded
    #[error("Cannot load '{path}': {message}")]
    Resource { path: String, message: String },
}

impl QuillError {
    /// Create a runtime error
    pub fn runtime(message: impl Into<String>) -> Self {
        QuillError::Runtime(message.into())
    }

    /// Create a type conversion error
    pub fn conversion(expected: impl Into<String>, raw: impl Into<String>) -> Self {
        QuillError::TypeConversion {
            expected: expected.into(),
            raw: raw.into(),
        }
    }

    /// The class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuillError::Lexical { .. } | QuillError::Walker { .. } => ErrorKind::CompileTime,
            QuillError::Binding { .. }
            | QuillError::Veto { .. }
            | QuillError::Runtime(_)
            | QuillError::Resource { .. } => ErrorKind::Runtime,
            QuillError::TypeConversion { .. } => ErrorKind::IllegalConversion,
            QuillError::UnattachedPipeline | QuillError::InvalidDescriptor { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// Whether the error only spoils the call that raised it.
    ///
    /// Such errors become an in-tree error node unless compilation is strict.
    pub fn is_call_local(&self) -> bool {
        matches!(
            self,
            QuillError::Binding { .. } | QuillError::Veto { .. } | QuillError::Runtime(_)
        )
    }
}

/// Result type for compilation
pub type Result<T> = std::result::Result<T, QuillError>;
