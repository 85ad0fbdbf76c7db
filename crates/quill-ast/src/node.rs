//! Node variants of the compiled document tree
//!
//! [`NodeKind`] is a closed set: every renderer matches it exhaustively, so
//! adding a variant is a compile-time checked change across all targets.
//! Structural relationships are not stored here; see [`crate::Tree`].

use serde::{Deserialize, Serialize};

use crate::tree::NodeId;

/// An owned node, used while parsing and expanding function calls.
///
/// Owned nodes are flattened into a [`crate::Tree`] once the whole document
/// is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// What this node is
    pub kind: NodeKind,
    /// Ordered children
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Create a childless node
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    /// Create a node with children
    pub fn with_children(kind: NodeKind, children: Vec<Node>) -> Self {
        Self { kind, children }
    }

    /// Create a text node
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Text(text.into()))
    }

    /// Whether the node belongs to block-level flow
    pub fn is_block(&self) -> bool {
        self.kind.is_block()
    }

    /// Concatenated text of this node and its descendants
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match &node.kind {
        NodeKind::Text(text) | NodeKind::CodeSpan(text) | NodeKind::MathSpan(text) => {
            out.push_str(text)
        }
        NodeKind::LineBreak => out.push('\n'),
        _ => {}
    }
    for child in &node.children {
        collect_text(child, out);
    }
}

/// The kind of a node, with its own payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Document root, always at [`NodeId::ROOT`]
    Root,

    // Block-level
    /// A paragraph of inline content
    Paragraph,
    /// A section heading
    Heading(Heading),
    /// A block quote
    BlockQuote,
    /// An ordered or unordered list
    List(List),
    /// A list item
    ListItem(ListItem),
    /// A fenced code block
    CodeBlock(CodeBlock),
    /// A display math block
    MathBlock(MathBlock),
    /// A table; children are rows
    Table(Table),
    /// A table row; children are cells
    TableRow {
        /// Whether this is the header row
        header: bool,
    },
    /// A table cell; children are inline content
    TableCell,
    /// A thematic break
    HorizontalRule,
    /// A forced page break
    PageBreak,
    /// A link reference definition (`[label]: url`)
    LinkDefinition(LinkDefinition),
    /// A figure wrapping an image or other content
    Figure(Figure),
    /// A generic layout container
    Container(Container),
    /// Children laid out in a row or column
    Stacked(Stacked),
    /// A titled box (callout, tip, warning...)
    Box(BoxNode),
    /// A table of contents, rendered from the document's headings
    TableOfContents(TableOfContents),
    /// The bibliography listing
    BibliographyView(BibliographyView),
    /// A slide fragment revealed step by step
    SlideFragment(SlideFragment),
    /// Speaker notes attached to a slide
    SpeakerNote,

    // Inline
    /// Plain text
    Text(String),
    /// Emphasized content
    Emphasis,
    /// Strongly emphasized content
    Strong,
    /// Struck-through content
    Strikethrough,
    /// Inline code
    CodeSpan(String),
    /// Inline math
    MathSpan(String),
    /// An inline link; children are the label
    Link(Link),
    /// A link whose target comes from a link definition
    ReferenceLink(ReferenceLink),
    /// An image
    Image(Image),
    /// A hard line break
    LineBreak,
    /// A reference to a labelled element
    CrossReference(CrossReference),
    /// A bibliography citation
    Citation(Citation),

    // Function calls
    /// Content produced by a function call
    FunctionCallOutput {
        /// Name of the called function
        name: String,
        /// Whether the call was a block call
        block: bool,
    },
    /// A call that failed to bind or was vetoed
    CallError {
        /// What went wrong
        message: String,
        /// Whether the call was a block call
        block: bool,
    },
}

impl NodeKind {
    /// Whether this kind belongs to block-level flow
    pub fn is_block(&self) -> bool {
        match self {
            NodeKind::Text(_)
            | NodeKind::Emphasis
            | NodeKind::Strong
            | NodeKind::Strikethrough
            | NodeKind::CodeSpan(_)
            | NodeKind::MathSpan(_)
            | NodeKind::Link(_)
            | NodeKind::ReferenceLink(_)
            | NodeKind::Image(_)
            | NodeKind::LineBreak
            | NodeKind::CrossReference(_)
            | NodeKind::Citation(_) => false,
            NodeKind::FunctionCallOutput { block, .. } | NodeKind::CallError { block, .. } => {
                *block
            }
            _ => true,
        }
    }

    /// The numbering kind this node takes part in, if any.
    ///
    /// Figures, tables and listings are only tracked when they carry a
    /// caption or a label; equations only when labelled. Decorative headings
    /// are never numbered.
    pub fn trackable_kind(&self) -> Option<TrackableKind> {
        match self {
            NodeKind::Heading(heading) if !heading.decorative => Some(TrackableKind::Heading),
            NodeKind::Figure(figure) if figure.caption.is_some() || figure.label.is_some() => {
                Some(TrackableKind::Figure)
            }
            NodeKind::Table(table) if table.caption.is_some() || table.label.is_some() => {
                Some(TrackableKind::Table)
            }
            NodeKind::MathBlock(math) if math.label.is_some() => Some(TrackableKind::Equation),
            NodeKind::CodeBlock(code) if code.caption.is_some() || code.label.is_some() => {
                Some(TrackableKind::CodeListing)
            }
            _ => None,
        }
    }

    /// The user-facing label of an identifiable node
    pub fn label(&self) -> Option<&str> {
        match self {
            NodeKind::Heading(heading) => heading.custom_id.as_deref(),
            NodeKind::Figure(figure) => figure.label.as_deref(),
            NodeKind::Table(table) => table.label.as_deref(),
            NodeKind::MathBlock(math) => math.label.as_deref(),
            NodeKind::CodeBlock(code) => code.label.as_deref(),
            _ => None,
        }
    }
}

/// Element kinds with independent numbering
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TrackableKind {
    /// Section headings
    Heading,
    /// Figures
    Figure,
    /// Tables
    Table,
    /// Display equations
    Equation,
    /// Code listings
    CodeListing,
}

impl TrackableKind {
    /// All kinds, in a stable order
    pub const ALL: [TrackableKind; 5] = [
        TrackableKind::Heading,
        TrackableKind::Figure,
        TrackableKind::Table,
        TrackableKind::Equation,
        TrackableKind::CodeListing,
    ];

    /// Key of the kind's display name in localization tables
    pub fn localization_key(self) -> &'static str {
        match self {
            TrackableKind::Heading => "section",
            TrackableKind::Figure => "figure",
            TrackableKind::Table => "table",
            TrackableKind::Equation => "equation",
            TrackableKind::CodeListing => "listing",
        }
    }
}

/// A section heading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading depth (1-6, where 1 is the highest)
    pub depth: u8,
    /// Explicit id from `{#id}`
    pub custom_id: Option<String>,
    /// Decorative headings (`#!`) are never numbered nor listed
    pub decorative: bool,
}

impl Heading {
    /// A plain heading of the given depth
    pub fn new(depth: u8) -> Self {
        Self {
            depth,
            custom_id: None,
            decorative: false,
        }
    }
}

/// A list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    /// Ordered (numbered) list
    pub ordered: bool,
    /// First number of an ordered list
    pub start: u32,
    /// Tight lists render item paragraphs without spacing
    pub tight: bool,
}

/// A list item
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListItem {
    /// Independent augmentations of the item
    pub variants: Vec<ListItemVariant>,
}

/// An augmentation of a list item.
///
/// Variants are additive: an item may be a task, be focused and target a
/// location all at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ListItemVariant {
    /// A checkbox item (`- [x]`)
    Task {
        /// Whether the box is checked
        checked: bool,
    },
    /// Highlighted among its siblings
    Focus {
        /// Whether the item is the focused one
        focused: bool,
    },
    /// The item points at a numbered element
    LocationTarget {
        /// Element whose number is shown
        target: NodeId,
    },
}

/// A fenced code block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Language from the info string
    pub language: Option<String>,
    /// Verbatim content
    pub content: String,
    /// Optional caption
    pub caption: Option<String>,
    /// Optional label for cross-references
    pub label: Option<String>,
}

/// A display math block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathBlock {
    /// TeX source
    pub expression: String,
    /// Optional label for cross-references
    pub label: Option<String>,
}

/// Horizontal alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Start of the line
    Start,
    /// Centered
    Center,
    /// End of the line
    End,
}

impl Alignment {
    /// CSS keyword
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Start => "start",
            Alignment::Center => "center",
            Alignment::End => "end",
        }
    }
}

/// A table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Per-column alignment
    pub alignments: Vec<Option<Alignment>>,
    /// Optional caption
    pub caption: Option<String>,
    /// Optional label for cross-references
    pub label: Option<String>,
}

/// `[label]: url "title"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDefinition {
    pub label: String,
    pub url: String,
    pub title: Option<String>,
}

/// A figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    /// Caption shown under the content
    pub caption: Option<String>,
    /// Optional label for cross-references
    pub label: Option<String>,
}

/// A generic container
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Container {
    pub alignment: Option<Alignment>,
    pub full_width: bool,
    pub class_name: Option<String>,
}

/// Direction of a [`Stacked`] layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackOrientation {
    Row,
    Column,
}

/// Children laid out in one direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stacked {
    pub orientation: StackOrientation,
    pub alignment: Option<Alignment>,
    /// Gap between children, as a CSS length
    pub gap: Option<String>,
}

/// Flavour of a [`BoxNode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxKind {
    Callout,
    Tip,
    Note,
    Warning,
    Error,
}

impl BoxKind {
    /// Lowercase name, also used as CSS class
    pub fn as_str(self) -> &'static str {
        match self {
            BoxKind::Callout => "callout",
            BoxKind::Tip => "tip",
            BoxKind::Note => "note",
            BoxKind::Warning => "warning",
            BoxKind::Error => "error",
        }
    }
}

/// A titled box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxNode {
    pub title: Option<String>,
    pub kind: BoxKind,
}

/// Table of contents placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableOfContents {
    /// Heading shown above the list
    pub title: Option<String>,
    /// Deepest heading level listed
    pub max_depth: u8,
    /// Heading text of the entry to mark as focused
    pub focus: Option<String>,
}

/// Bibliography placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibliographyView {
    /// Heading shown above the entries; localized default when absent
    pub title: Option<String>,
    /// Index of the listed bibliography among those the context loaded
    pub source: usize,
}

/// A step-by-step revealed block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideFragment {
    /// Reveal behavior (`show`, `hide`, `semihide`, `showhide`)
    pub behavior: String,
}

/// An inline link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub title: Option<String>,
}

/// A link resolved through a [`LinkDefinition`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLink {
    /// Definition label to look up
    pub label: String,
    /// Source text, shown verbatim when the label is undefined
    pub fallback: String,
}

/// An image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub title: Option<String>,
    pub alt: String,
}

/// `.ref {label}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossReference {
    pub label: String,
}

/// `.cite {key}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub keys: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_kinds_are_not_blocks() {
        assert!(!Node::text("a").is_block());
        assert!(!NodeKind::Strong.is_block());
        assert!(NodeKind::Paragraph.is_block());
        assert!(!NodeKind::FunctionCallOutput {
            name: "sum".to_string(),
            block: false
        }
        .is_block());
    }

    #[test]
    fn test_trackable_requires_caption_or_label() {
        let bare = NodeKind::Figure(Figure {
            caption: None,
            label: None,
        });
        assert_eq!(bare.trackable_kind(), None);

        let captioned = NodeKind::Figure(Figure {
            caption: Some("A cat".to_string()),
            label: None,
        });
        assert_eq!(captioned.trackable_kind(), Some(TrackableKind::Figure));
    }

    #[test]
    fn test_decorative_heading_is_not_tracked() {
        let heading = NodeKind::Heading(Heading {
            depth: 1,
            custom_id: None,
            decorative: true,
        });
        assert_eq!(heading.trackable_kind(), None);
    }

    #[test]
    fn test_plain_text_collects_descendants() {
        let node = Node::with_children(
            NodeKind::Paragraph,
            vec![
                Node::text("a "),
                Node::with_children(NodeKind::Strong, vec![Node::text("b")]),
                Node::new(NodeKind::CodeSpan(" c".to_string())),
            ],
        );
        assert_eq!(node.plain_text(), "a b c");
    }

    #[test]
    fn test_variant_serialization() {
        let item = ListItem {
            variants: vec![ListItemVariant::Task { checked: true }],
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("Task"));
    }
}
