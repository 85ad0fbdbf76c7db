//! quill CLI - Command-line interface library
//!
//! This library provides the CLI functionality for quill:
//! - Compile: render a document to HTML or plain text
//! - Repl: compile entries read from stdin, keeping state between them
//!
//! # Library Usage
//!
//! ```ignore
//! use quill_cli::{compile_command, CompileArgs, TargetFormat};
//!
//! let mut args = CompileArgs::new("guide.md");
//! args.target = TargetFormat::Text;
//! let output = compile_command(&args)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Compile to HTML in ./output
//! quill compile guide.md
//!
//! # Plain text to stdout
//! quill compile guide.md -t text --pipe
//!
//! # Make the functions of macros.md available to `.include {macros}`
//! quill compile guide.md --lib macros.md
//! ```
//!
//! Exit codes: 66 when the source is missing, 65 for malformed source,
//! 64 for illegal value conversions and 70 for other failures.

pub mod app;
pub mod loader;

// Re-export main entry point and types
pub use app::{
    compile_command, exit_code, load_options, repl, run_cli, user_library, write_resources,
    CompileArgs, MissingSource, TargetFormat, CONFIG_FILE, EXIT_COMPILE, EXIT_CONVERSION,
    EXIT_NO_SOURCE, EXIT_RUNTIME,
};
pub use loader::FileLoader;
