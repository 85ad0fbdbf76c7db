//! Two-stage reference resolution
//!
//! Stage 1 ([`collect`]) folds over the assembled tree once and produces an
//! immutable [`SymbolTable`]: element locations and numbers, identifiers,
//! labels, link definitions and citation order. Stage 2 ([`resolve`]) reads
//! that table to resolve every cross-reference, citation and reference link,
//! yielding either a resolved value or an explicit
//! [`Resolution::Unresolved`] marker per reference.
//!
//! ```
//! use quill_core::resolution::{collect, resolve, Resolution};
//! use quill_core::render::NoIdentifiers;
//! use quill_core::Context;
//! use quill_ast::{CrossReference, Node, NodeKind, Tree};
//!
//! let mut ctx = Context::default();
//! let tree = Tree::assemble(vec![Node::new(NodeKind::CrossReference(CrossReference {
//!     label: "missing".to_string(),
//! }))]);
//! let symbols = collect(&tree, &mut ctx, &NoIdentifiers).unwrap();
//! let (resolutions, warnings) = resolve(&tree, &symbols, &ctx);
//! let reference = tree.children(tree.root())[0];
//! assert!(matches!(resolutions.get(reference), Some(Resolution::Unresolved { .. })));
//! assert_eq!(warnings.len(), 1);
//! ```

mod resolver;
mod symbols;

use serde::{Deserialize, Serialize};

pub use resolver::{resolve, Resolution, Resolutions};
pub use symbols::{collect, BibliographyItem, SymbolTable, TrackedElement};

/// Where a reference link points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTarget {
    pub url: String,
    pub title: Option<String>,
}
