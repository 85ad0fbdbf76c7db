//! quill-ast - Document tree definitions
//!
//! This crate provides the tree types used by quill for representing
//! compiled documents.
//!
//! Parsing and function expansion build an owned [`Node`] hierarchy, which is
//! then flattened into an arena-backed [`Tree`]. Once assembled, the tree's
//! structure never changes: children are referenced by [`NodeId`] and each
//! node's owner is looked up through a reverse index built during assembly.
//!
//! # Example
//!
//! ```
//! use quill_ast::{Heading, Node, NodeKind, Tree};
//!
//! let tree = Tree::assemble(vec![
//!     Node::with_children(NodeKind::Heading(Heading::new(1)), vec![Node::text("Intro")]),
//!     Node::with_children(NodeKind::Paragraph, vec![Node::text("Hello")]),
//! ]);
//!
//! let heading = tree.children(tree.root())[0];
//! assert_eq!(tree.text_content(heading), "Intro");
//! assert_eq!(tree.parent(heading), Some(tree.root()));
//! ```

pub mod node;
pub mod tree;

pub use node::{
    Alignment, BibliographyView, BoxKind, BoxNode, Citation, CodeBlock, Container, CrossReference,
    Figure, Heading, Image, Link, LinkDefinition, List, ListItem, ListItemVariant, MathBlock, Node,
    NodeKind, ReferenceLink, SlideFragment, Stacked, StackOrientation, Table, TableOfContents,
    TrackableKind,
};
pub use tree::{NodeId, Preorder, Tree};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
