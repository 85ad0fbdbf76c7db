//! quill-core - Markdown with an embedded function language
//!
//! Core compiler for quill: the lexer and call walker, the value and
//! expression evaluator, function binding and execution, the markup parser,
//! two-stage reference resolution and the render pipeline.
//!
//! # Example
//!
//! ```
//! use quill_core::function::{Function, Library};
//! use quill_core::value::{ParamType, Value};
//! use quill_core::Context;
//!
//! let mut ctx = Context::default();
//! let library = Library::new("greetings").with(
//!     Function::new("hello", |call| {
//!         Ok(Value::Dynamic(format!("Hello, **{}**!", call.args.string("name")?)))
//!     })
//!     .param("name", ParamType::String),
//! );
//! ctx.load_library(&library).unwrap();
//!
//! let nodes = ctx.parse_blocks(".hello {world}\n").unwrap();
//! assert_eq!(nodes.len(), 1);
//! assert_eq!(nodes[0].plain_text(), "Hello, world!");
//! ```

pub mod bibliography;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod document;
pub mod engine;
pub mod error;
pub mod expression;
pub mod function;
pub mod lambda;
pub mod lexer;
pub mod loader;
pub mod localization;
pub mod media;
pub mod numbering;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod resolution;
pub mod text;
pub mod value;
pub mod walker;

// Re-export main types
pub use config::{MediaStorageOptions, PipelineOptions};
pub use context::Context;
pub use diagnostics::{Diagnostic, Severity};
pub use error::{ErrorKind, Position, QuillError, Result};
pub use function::{Function, Library};
pub use loader::{MemoryLoader, ResourceLoader};
pub use pipeline::{CompilationOutput, Pipeline};
pub use render::{CompiledDocument, OutputResource, ResourceContent, Target};
pub use value::{ParamType, Value};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "1.0.0");
    }
}
