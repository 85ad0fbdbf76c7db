use std::collections::{BTreeMap, HashMap, HashSet};

use quill_ast::{NodeId, NodeKind, TrackableKind, Tree};
use tracing::debug;

use super::LinkTarget;
use crate::context::Context;
use crate::diagnostics::{codes, Diagnostic};
use crate::error::Result;
use crate::numbering::DocumentNumbering;
use crate::render::{IdentifierGenerator, IdentifierRequest};

/// An element taking part in numbering
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedElement {
    pub id: NodeId,
    pub kind: TrackableKind,
    /// Section location when the element was met, gap-filled with zeros
    pub location: Vec<usize>,
    /// Formatted number; `None` when the kind is not numbered
    pub number: Option<String>,
    /// Target-specific identifier
    pub identifier: Option<String>,
    pub label: Option<String>,
    /// Heading text or caption
    pub title: String,
    /// Heading depth, 0 for other kinds
    pub depth: u8,
    /// Decorative headings are identified but never numbered or listed
    pub decorative: bool,
}

/// An entry listed by a bibliography view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibliographyItem {
    pub key: String,
    /// Display number, shared with the citations of the key
    pub number: usize,
    /// Target-specific anchor, unique in the document
    pub anchor: Option<String>,
}

/// Everything stage 1 learns about a document
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    elements: Vec<TrackedElement>,
    by_node: HashMap<NodeId, usize>,
    labels: HashMap<String, usize>,
    links: BTreeMap<String, LinkTarget>,
    citations: Vec<String>,
    bibliographies: HashMap<NodeId, Vec<BibliographyItem>>,
    citation_anchors: HashMap<String, String>,
}

impl SymbolTable {
    /// Tracked elements in document order
    pub fn elements(&self) -> &[TrackedElement] {
        &self.elements
    }

    pub fn element(&self, id: NodeId) -> Option<&TrackedElement> {
        self.by_node.get(&id).map(|&index| &self.elements[index])
    }

    /// The element carrying a label
    pub fn by_label(&self, label: &str) -> Option<&TrackedElement> {
        self.labels.get(label).map(|&index| &self.elements[index])
    }

    pub fn identifier(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(|e| e.identifier.as_deref())
    }

    /// Non-decorative headings, for tables of contents
    pub fn headings(&self) -> impl Iterator<Item = &TrackedElement> {
        self.elements
            .iter()
            .filter(|e| e.kind == TrackableKind::Heading && !e.decorative)
    }

    /// Link definitions, keyed by lowercased label
    pub fn links(&self) -> &BTreeMap<String, LinkTarget> {
        &self.links
    }

    pub fn link(&self, label: &str) -> Option<&LinkTarget> {
        self.links.get(&label.to_lowercase())
    }

    /// Cited bibliography keys, in order of first citation
    pub fn citations(&self) -> &[String] {
        &self.citations
    }

    /// Display number of a cited key
    pub fn citation_number(&self, key: &str) -> Option<usize> {
        self.citations.iter().position(|k| k == key).map(|i| i + 1)
    }

    /// Entries listed by the bibliography view `id`, in display order
    pub fn bibliography_items(&self, id: NodeId) -> &[BibliographyItem] {
        self.bibliographies.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Anchor of the first listing of a cited key
    pub fn citation_anchor(&self, key: &str) -> Option<&str> {
        self.citation_anchors.get(key).map(String::as_str)
    }
}

/// Stage 1: fold over the tree and build the symbol table.
///
/// Labels defined twice keep their first element and report a warning.
/// Bibliography views are listed once every citation is known, so entries
/// cited after the view still take their citation number. Images are registered into the context's media storage according to
/// the attached pipeline's preferences.
pub fn collect(
    tree: &Tree,
    ctx: &mut Context,
    identifiers: &dyn IdentifierGenerator,
) -> Result<SymbolTable> {
    let numbering = ctx.document.effective_numbering();
    let mut collector = Collector {
        numbering,
        identifiers,
        table: SymbolTable {
            links: ctx.link_definitions().clone(),
            ..SymbolTable::default()
        },
        location: Vec::new(),
        counts: HashMap::new(),
        ordinals: HashMap::new(),
        used_identifiers: HashSet::new(),
        warnings: Vec::new(),
    };

    let mut views = Vec::new();
    for id in tree.preorder() {
        match tree.kind(id) {
            NodeKind::LinkDefinition(definition) => {
                collector.table.links.insert(
                    definition.label.to_lowercase(),
                    LinkTarget {
                        url: definition.url.clone(),
                        title: definition.title.clone(),
                    },
                );
            }
            NodeKind::Citation(citation) => {
                for key in &citation.keys {
                    if ctx.knows_citation(key) && !collector.table.citations.contains(key) {
                        collector.table.citations.push(key.clone());
                    }
                }
            }
            NodeKind::Image(image) => {
                let media = ctx.attached_pipeline()?.media;
                ctx.media.register(&image.url, media);
            }
            NodeKind::BibliographyView(view) => views.push((id, view.source)),
            NodeKind::Heading(heading) if heading.decorative => {
                collector.track(tree, id, TrackableKind::Heading, true);
            }
            kind => {
                if let Some(tracked) = kind.trackable_kind() {
                    collector.track(tree, id, tracked, false);
                }
            }
        }
    }
    collector.list_bibliographies(ctx, &views);

    debug!(
        elements = collector.table.elements.len(),
        labels = collector.table.labels.len(),
        citations = collector.table.citations.len(),
        "symbol table built"
    );
    for warning in collector.warnings {
        ctx.report(warning);
    }
    Ok(collector.table)
}

struct Collector<'a> {
    numbering: DocumentNumbering,
    identifiers: &'a dyn IdentifierGenerator,
    table: SymbolTable,
    location: Vec<usize>,
    counts: HashMap<(TrackableKind, Vec<usize>), usize>,
    ordinals: HashMap<TrackableKind, usize>,
    used_identifiers: HashSet<String>,
    warnings: Vec<Diagnostic>,
}

impl Collector<'_> {
    fn track(&mut self, tree: &Tree, id: NodeId, kind: TrackableKind, decorative: bool) {
        let node = tree.kind(id);
        let (title, depth) = match node {
            NodeKind::Heading(heading) => {
                if !decorative {
                    self.enter_section(heading.depth as usize);
                }
                (tree.text_content(id), heading.depth)
            }
            NodeKind::Figure(figure) => (figure.caption.clone().unwrap_or_default(), 0),
            NodeKind::Table(table) => (table.caption.clone().unwrap_or_default(), 0),
            NodeKind::CodeBlock(code) => (code.caption.clone().unwrap_or_default(), 0),
            _ => (String::new(), 0),
        };
        let number = if decorative { None } else { self.number(kind) };
        let label = node.label().map(str::to_string);

        let ordinal = self.ordinals.entry(kind).or_insert(0);
        *ordinal += 1;
        let request = IdentifierRequest {
            kind,
            label: label.as_deref(),
            number: number.as_deref(),
            title: &title,
            ordinal: *ordinal,
        };
        let identifier = self
            .identifiers
            .identifier(&request)
            .map(|id| self.unique_identifier(id));

        let index = self.table.elements.len();
        if let Some(label) = &label {
            if self.table.labels.contains_key(label) {
                self.warnings.push(
                    Diagnostic::warning(format!("label '{label}' is defined more than once"))
                        .with_code(codes::DUPLICATE_LABEL)
                        .with_help("references resolve to the first element with this label"),
                );
            } else {
                self.table.labels.insert(label.clone(), index);
            }
        }
        self.table.by_node.insert(id, index);
        self.table.elements.push(TrackedElement {
            id,
            kind,
            location: self.location.clone(),
            number,
            identifier,
            label,
            title,
            depth,
            decorative,
        });
    }

    /// Number and anchor the entries of every bibliography view.
    ///
    /// Cited entries keep their citation number; uncited ones continue the
    /// sequence in the order the views list them.
    fn list_bibliographies(&mut self, ctx: &Context, views: &[(NodeId, usize)]) {
        let mut next = self.table.citations.len();
        for &(view, source) in views {
            let Some(bibliography) = ctx.bibliography(source) else {
                continue;
            };
            let mut items = Vec::new();
            for entry in bibliography.ordered(&self.table.citations) {
                let number = match self.table.citation_number(&entry.key) {
                    Some(number) => number,
                    None => {
                        next += 1;
                        next
                    }
                };
                let anchor = self
                    .identifiers
                    .bibliography_anchor(&entry.key)
                    .map(|anchor| self.unique_identifier(anchor));
                if let Some(anchor) = &anchor {
                    self.table
                        .citation_anchors
                        .entry(entry.key.clone())
                        .or_insert_with(|| anchor.clone());
                }
                items.push(BibliographyItem {
                    key: entry.key.clone(),
                    number,
                    anchor,
                });
            }
            self.table.bibliographies.insert(view, items);
        }
    }

    /// Move the section location to a new heading of `depth`
    fn enter_section(&mut self, depth: usize) {
        let depth = depth.max(1);
        if self.location.len() < depth {
            self.location.resize(depth, 0);
        } else {
            self.location.truncate(depth);
        }
        self.location[depth - 1] += 1;
    }

    fn number(&mut self, kind: TrackableKind) -> Option<String> {
        let format = self.numbering.get(kind)?;
        let accuracy = format.accuracy();
        if accuracy == 0 {
            return None;
        }
        if kind == TrackableKind::Heading {
            if self.location.len() > accuracy {
                return None;
            }
            return Some(format.format(&self.location));
        }

        let mut levels: Vec<usize> = self.location.iter().copied().take(accuracy - 1).collect();
        levels.resize(accuracy - 1, 0);
        let count = self.counts.entry((kind, levels.clone())).or_insert(0);
        *count += 1;
        levels.push(*count);
        Some(format.format(&levels))
    }

    fn unique_identifier(&mut self, identifier: String) -> String {
        let mut candidate = identifier.clone();
        let mut suffix = 2;
        while !self.used_identifiers.insert(candidate.clone()) {
            candidate = format!("{identifier}-{suffix}");
            suffix += 1;
        }
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibliography::Bibliography;
    use crate::document::DocumentType;
    use crate::render::NoIdentifiers;
    use quill_ast::{Citation, Figure, Heading, LinkDefinition, Node};

    struct Slugs;

    impl IdentifierGenerator for Slugs {
        fn identifier(&self, request: &IdentifierRequest<'_>) -> Option<String> {
            Some(
                request
                    .label
                    .map(str::to_string)
                    .unwrap_or_else(|| request.title.to_lowercase().replace(' ', "-")),
            )
        }
    }

    fn heading(depth: u8, text: &str) -> Node {
        Node::with_children(NodeKind::Heading(Heading::new(depth)), vec![Node::text(text)])
    }

    fn figure(label: &str) -> Node {
        Node::new(NodeKind::Figure(Figure {
            caption: Some(format!("Caption of {label}")),
            label: Some(label.to_string()),
        }))
    }

    fn paged() -> Context {
        let mut ctx = Context::default();
        ctx.document.doc_type = DocumentType::Paged;
        ctx
    }

    fn numbers(symbols: &SymbolTable, kind: TrackableKind) -> Vec<Option<String>> {
        symbols
            .elements()
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.number.clone())
            .collect()
    }

    #[test]
    fn test_heading_numbers() {
        let mut ctx = paged();
        let tree = Tree::assemble(vec![
            heading(1, "A"),
            heading(1, "B"),
            heading(2, "B.A"),
            heading(1, "C"),
            heading(3, "C.0.A"),
            heading(4, "Too deep"),
        ]);
        let symbols = collect(&tree, &mut ctx, &NoIdentifiers).unwrap();
        assert_eq!(
            numbers(&symbols, TrackableKind::Heading),
            vec![
                Some("1".to_string()),
                Some("2".to_string()),
                Some("2.1".to_string()),
                Some("3".to_string()),
                Some("3.0.1".to_string()),
                None,
            ]
        );
    }

    #[test]
    fn test_figures_count_within_section() {
        let mut ctx = paged();
        let tree = Tree::assemble(vec![
            heading(1, "One"),
            figure("a"),
            heading(2, "One.One"),
            figure("b"),
            heading(1, "Two"),
            figure("c"),
        ]);
        let symbols = collect(&tree, &mut ctx, &NoIdentifiers).unwrap();
        assert_eq!(
            numbers(&symbols, TrackableKind::Figure),
            vec![
                Some("1.1".to_string()),
                Some("1.2".to_string()),
                Some("2.1".to_string()),
            ]
        );
    }

    #[test]
    fn test_plain_documents_are_not_numbered() {
        let mut ctx = Context::default();
        let tree = Tree::assemble(vec![heading(1, "A"), figure("a")]);
        let symbols = collect(&tree, &mut ctx, &NoIdentifiers).unwrap();
        assert!(symbols.elements().iter().all(|e| e.number.is_none()));
        assert_eq!(symbols.by_label("a").map(|e| e.kind), Some(TrackableKind::Figure));
    }

    #[test]
    fn test_identifiers_are_unique() {
        let mut ctx = Context::default();
        let tree = Tree::assemble(vec![heading(1, "Intro"), heading(1, "Intro")]);
        let symbols = collect(&tree, &mut ctx, &Slugs).unwrap();
        let ids: Vec<_> = symbols
            .elements()
            .iter()
            .filter_map(|e| e.identifier.clone())
            .collect();
        assert_eq!(ids, vec!["intro".to_string(), "intro-2".to_string()]);
    }

    #[test]
    fn test_decorative_headings_share_the_identifier_space() {
        let mut ctx = paged();
        let decorative = Node::with_children(
            NodeKind::Heading(Heading {
                depth: 1,
                custom_id: Some("intro".to_string()),
                decorative: true,
            }),
            vec![Node::text("Other")],
        );
        let tree = Tree::assemble(vec![heading(1, "Intro"), decorative, heading(1, "Next")]);
        let symbols = collect(&tree, &mut ctx, &Slugs).unwrap();

        let ids: Vec<_> = symbols
            .elements()
            .iter()
            .map(|e| e.identifier.clone().unwrap_or_default())
            .collect();
        assert_eq!(ids, vec!["intro", "intro-2", "next"]);
        assert_eq!(
            numbers(&symbols, TrackableKind::Heading),
            vec![Some("1".to_string()), None, Some("2".to_string())]
        );
        assert_eq!(symbols.by_label("intro").map(|e| e.decorative), Some(true));
        assert_eq!(symbols.headings().count(), 2);
    }

    #[test]
    fn test_bibliography_views_list_their_own_source() {
        struct Anchors;

        impl IdentifierGenerator for Anchors {
            fn identifier(&self, _request: &IdentifierRequest<'_>) -> Option<String> {
                None
            }

            fn bibliography_anchor(&self, key: &str) -> Option<String> {
                Some(format!("bib-{key}"))
            }
        }

        let mut ctx = Context::default();
        let first = ctx.add_bibliography(
            "a.bib",
            Bibliography::parse("@book{knuth, title = {TAOCP}}\n@book{dijkstra, title = {EWD}}")
                .unwrap(),
        );
        let second = ctx.add_bibliography(
            "b.bib",
            Bibliography::parse("@book{wirth, title = {AD}}\n@book{knuth, title = {TAOCP}}")
                .unwrap(),
        );
        let view = |source| {
            Node::new(NodeKind::BibliographyView(quill_ast::BibliographyView {
                title: None,
                source,
            }))
        };
        let tree = Tree::assemble(vec![
            view(first),
            Node::new(NodeKind::Citation(Citation {
                keys: vec!["wirth".to_string(), "knuth".to_string()],
            })),
            view(second),
        ]);
        let symbols = collect(&tree, &mut ctx, &Anchors).unwrap();
        assert_eq!(symbols.citations(), &["wirth".to_string(), "knuth".to_string()]);

        let listed = |index: usize| -> Vec<(String, usize, Option<String>)> {
            let id = tree.children(tree.root())[index];
            symbols
                .bibliography_items(id)
                .iter()
                .map(|item| (item.key.clone(), item.number, item.anchor.clone()))
                .collect()
        };
        assert_eq!(
            listed(0),
            vec![
                ("knuth".to_string(), 2, Some("bib-knuth".to_string())),
                ("dijkstra".to_string(), 3, Some("bib-dijkstra".to_string())),
            ]
        );
        assert_eq!(
            listed(2),
            vec![
                ("wirth".to_string(), 1, Some("bib-wirth".to_string())),
                ("knuth".to_string(), 2, Some("bib-knuth-2".to_string())),
            ]
        );
        assert_eq!(symbols.citation_anchor("knuth"), Some("bib-knuth"));
    }

    #[test]
    fn test_duplicate_label_warns() {
        let mut ctx = Context::default();
        let tree = Tree::assemble(vec![figure("a"), figure("a")]);
        let symbols = collect(&tree, &mut ctx, &NoIdentifiers).unwrap();
        assert_eq!(symbols.by_label("a").map(|e| e.id), Some(symbols.elements()[0].id));
        assert_eq!(ctx.diagnostics()[0].code, Some(codes::DUPLICATE_LABEL));
    }

    #[test]
    fn test_links_and_citations() {
        let mut ctx = Context::default();
        ctx.add_bibliography(
            "refs.bib",
            Bibliography::parse("@book{knuth, title = {TAOCP}}\n@book{wirth, title = {AD}}")
                .unwrap(),
        );
        let tree = Tree::assemble(vec![
            Node::new(NodeKind::LinkDefinition(LinkDefinition {
                label: "Docs".to_string(),
                url: "https://docs.rs".to_string(),
                title: None,
            })),
            Node::new(NodeKind::Citation(Citation {
                keys: vec!["wirth".to_string(), "missing".to_string()],
            })),
            Node::new(NodeKind::Citation(Citation {
                keys: vec!["knuth".to_string(), "wirth".to_string()],
            })),
        ]);
        let symbols = collect(&tree, &mut ctx, &NoIdentifiers).unwrap();
        assert_eq!(symbols.link("docs").map(|l| l.url.as_str()), Some("https://docs.rs"));
        assert_eq!(symbols.citations(), &["wirth".to_string(), "knuth".to_string()]);
        assert_eq!(symbols.citation_number("knuth"), Some(2));
        assert_eq!(symbols.citation_number("missing"), None);
    }

    #[test]
    fn test_images_need_an_attached_pipeline() {
        let mut ctx = Context::default();
        let tree = Tree::assemble(vec![Node::new(NodeKind::Image(quill_ast::Image {
            url: "cat.png".to_string(),
            title: None,
            alt: String::new(),
        }))]);
        assert!(collect(&tree, &mut ctx, &NoIdentifiers).is_err());
    }
}
