//! quill-stdlib - Standard function library
//!
//! Every function a document can call without loading anything else:
//! arithmetic, strings, flow control with lambdas, optional values,
//! collections, document metadata and numbering, layout, references and
//! bibliographies, slides and localization.
//!
//! # Example
//!
//! ```
//! use quill_core::Context;
//!
//! let mut ctx = Context::default();
//! ctx.load_library(&quill_stdlib::library()).unwrap();
//!
//! let nodes = ctx.parse_blocks("Total: .sum {1} {.multiply {2} by:{3}}\n").unwrap();
//! assert_eq!(nodes[0].plain_text(), "Total: 7");
//! ```

mod collections;
mod document;
mod flow;
mod layout;
mod localization;
mod math;
mod optionality;
mod reference;
mod slides;
mod string;

use quill_core::Library;

/// Name the standard library is registered under
pub const LIBRARY_NAME: &str = "stdlib";

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The standard library.
///
/// Loading it also registers the `std` localization table.
pub fn library() -> Library {
    Library::new(LIBRARY_NAME)
        .with_functions(math::functions())
        .with_functions(string::functions())
        .with_functions(flow::functions())
        .with_functions(optionality::functions())
        .with_functions(collections::functions())
        .with_functions(document::functions())
        .with_functions(layout::functions())
        .with_functions(reference::functions())
        .with_functions(slides::functions())
        .with_functions(localization::functions())
        .on_load(|ctx| {
            localization::register_std_table(&mut ctx.localization);
            Ok(())
        })
}
