//! Compiler diagnostics
//!
//! Non-fatal problems found while compiling (unresolved references, failed
//! calls in lenient mode, missing media) are collected as [`Diagnostic`]s in
//! the [`crate::Context`] instead of aborting compilation.
//!
//! # Example
//!
//! ```
//! use quill_core::diagnostics::{codes, Diagnostic, Severity};
//!
//! let diag = Diagnostic::warning("Unresolved reference to 'fig2'")
//!     .with_code(codes::UNRESOLVED_CROSS_REFERENCE)
//!     .with_help("Add {#fig2} to the element you want to reference");
//! assert_eq!(diag.severity, Severity::Warning);
//! ```

use std::fmt;

use serde::Serialize;

use crate::error::Position;

/// Diagnostic codes
pub mod codes {
    /// `.ref` to a label that no element defines
    pub const UNRESOLVED_CROSS_REFERENCE: &str = "QD001";
    /// `.cite` of a key missing from every bibliography
    pub const UNRESOLVED_CITATION: &str = "QD002";
    /// `[text][label]` without a matching definition
    pub const UNRESOLVED_LINK: &str = "QD003";
    /// Two elements share the same label
    pub const DUPLICATE_LABEL: &str = "QD004";
    /// A call failed to bind or run and was replaced by an error node
    pub const CALL_FAILED: &str = "QD100";
    /// A validator vetoed a call
    pub const CALL_VETOED: &str = "QD101";
    /// A media file could not be exported
    pub const MEDIA_UNAVAILABLE: &str = "QD200";
}

/// A diagnostic message from the compiler
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Severity level of the diagnostic
    pub severity: Severity,

    /// The diagnostic message
    pub message: String,

    /// Stable code, see [`codes`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,

    /// Where the issue occurred, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<(usize, usize)>,

    /// Additional help text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,
    /// Something was degraded but output was still produced
    Warning,
    /// Part of the document could not be compiled
    Error,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            code: None,
            position: None,
            help: None,
        }
    }

    /// Create an error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create an info diagnostic
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Set the diagnostic code
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the source position
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some((position.line, position.column));
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Whether this diagnostic is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match self.code {
            Some(code) => write!(f, "{label}[{code}]")?,
            None => write!(f, "{label}")?,
        }
        if let Some((line, column)) = self.position {
            write!(f, " at {line}:{column}")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(help) = &self.help {
            write!(f, "\n  help: {help}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_code_and_position() {
        let diag = Diagnostic::error("Cannot call .foo")
            .with_code(codes::CALL_FAILED)
            .with_position(Position { line: 3, column: 1 });
        assert_eq!(diag.to_string(), "error[QD100] at 3:1: Cannot call .foo");
    }

    #[test]
    fn test_display_with_help() {
        let diag = Diagnostic::warning("Missing image").with_help("Check the path");
        assert_eq!(diag.to_string(), "warning: Missing image\n  help: Check the path");
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_serialize_skips_empty_fields() {
        let json = serde_json::to_string(&Diagnostic::info("hello")).unwrap();
        assert_eq!(json, r#"{"severity":"info","message":"hello"}"#);
    }
}
