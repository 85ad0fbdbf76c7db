use std::collections::HashMap;

use quill_ast::{NodeId, NodeKind, TrackableKind, Tree};
use serde::Serialize;

use super::symbols::SymbolTable;
use crate::context::Context;
use crate::diagnostics::{codes, Diagnostic};

/// The outcome of resolving one reference
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Resolution {
    /// `.ref` to a tracked element
    CrossReference {
        target: NodeId,
        kind: TrackableKind,
        number: Option<String>,
        /// Identifier of the target, when the render target assigns one
        anchor: Option<String>,
        /// Display text, e.g. `Figure 1.2`
        text: String,
    },
    /// `.cite`, one display number per key
    Citation { numbers: Vec<usize> },
    /// `[text][label]` with a matching definition
    Link { url: String, title: Option<String> },
    /// Nothing matched; rendered as a visibly broken reference
    Unresolved { reference: String },
}

/// Resolutions of every reference in a tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolutions {
    entries: HashMap<NodeId, Resolution>,
}

impl Resolutions {
    pub fn get(&self, id: NodeId) -> Option<&Resolution> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of references that could not be resolved
    pub fn unresolved(&self) -> usize {
        self.entries
            .values()
            .filter(|r| matches!(r, Resolution::Unresolved { .. }))
            .count()
    }
}

/// Stage 2: resolve references against the symbol table.
///
/// The context is only read. Every unresolved reference yields one warning;
/// the caller decides where to report them.
pub fn resolve(tree: &Tree, symbols: &SymbolTable, ctx: &Context) -> (Resolutions, Vec<Diagnostic>) {
    let mut resolutions = Resolutions::default();
    let mut warnings = Vec::new();

    for id in tree.preorder() {
        let resolution = match tree.kind(id) {
            NodeKind::CrossReference(reference) => match symbols.by_label(&reference.label) {
                Some(element) => {
                    let name = kind_name(ctx, element.kind);
                    let text = match (&element.number, element.title.is_empty()) {
                        (Some(number), _) => format!("{name} {number}"),
                        (None, false) => element.title.clone(),
                        (None, true) => name,
                    };
                    Resolution::CrossReference {
                        target: element.id,
                        kind: element.kind,
                        number: element.number.clone(),
                        anchor: element.identifier.clone(),
                        text,
                    }
                }
                None => {
                    warnings.push(
                        Diagnostic::warning(format!(
                            "unresolved cross-reference to '{}'",
                            reference.label
                        ))
                        .with_code(codes::UNRESOLVED_CROSS_REFERENCE)
                        .with_help(format!(
                            "add {{#{}}} to the element you want to reference",
                            reference.label
                        )),
                    );
                    Resolution::Unresolved {
                        reference: reference.label.clone(),
                    }
                }
            },
            NodeKind::Citation(citation) => {
                let missing: Vec<&str> = citation
                    .keys
                    .iter()
                    .filter(|key| symbols.citation_number(key).is_none())
                    .map(String::as_str)
                    .collect();
                if missing.is_empty() && !citation.keys.is_empty() {
                    Resolution::Citation {
                        numbers: citation
                            .keys
                            .iter()
                            .filter_map(|key| symbols.citation_number(key))
                            .collect(),
                    }
                } else {
                    warnings.push(
                        Diagnostic::warning(format!(
                            "unresolved citation of '{}'",
                            missing.join(", ")
                        ))
                        .with_code(codes::UNRESOLVED_CITATION),
                    );
                    Resolution::Unresolved {
                        reference: citation.keys.join(", "),
                    }
                }
            }
            NodeKind::ReferenceLink(link) => match symbols.link(&link.label) {
                Some(target) => Resolution::Link {
                    url: target.url.clone(),
                    title: target.title.clone(),
                },
                None => {
                    warnings.push(
                        Diagnostic::warning(format!("no link definition for '{}'", link.label))
                            .with_code(codes::UNRESOLVED_LINK),
                    );
                    Resolution::Unresolved {
                        reference: link.label.clone(),
                    }
                }
            },
            _ => continue,
        };
        resolutions.entries.insert(id, resolution);
    }
    (resolutions, warnings)
}

/// Localized display name of a kind, e.g. `Figure`
pub(crate) fn kind_name(ctx: &Context, kind: TrackableKind) -> String {
    let key = kind.localization_key();
    match ctx.localize(key) {
        Some(name) => name.to_string(),
        None => {
            let mut chars = key.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect())
                .unwrap_or_default()
        }
    }
}
