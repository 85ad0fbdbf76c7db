//! Element identifiers for HTML anchors

use quill_core::render::{IdentifierGenerator, IdentifierRequest};

/// Lowercase ASCII slug: alphanumerics kept, whitespace, `-` and `_`
/// turned into single hyphens, everything else dropped.
///
/// ```
/// use quill_html::slugify;
///
/// assert_eq!(slugify("Getting Started"), "getting-started");
/// assert_eq!(slugify("  What's new?  "), "whats-new");
/// ```
pub fn slugify(text: &str) -> String {
    text.chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Labels are used as they are; headings otherwise take the slug of their
/// text, and other elements their kind and number.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlIdentifiers;

impl IdentifierGenerator for HtmlIdentifiers {
    fn identifier(&self, request: &IdentifierRequest<'_>) -> Option<String> {
        if let Some(label) = request.label {
            return Some(label.to_string());
        }
        let slug = slugify(request.title);
        if request.kind == quill_ast::TrackableKind::Heading && !slug.is_empty() {
            return Some(slug);
        }
        let suffix = match request.number {
            Some(number) => slugify(&number.replace(|c: char| !c.is_ascii_alphanumeric(), "-")),
            None => request.ordinal.to_string(),
        };
        let suffix = if suffix.is_empty() {
            request.ordinal.to_string()
        } else {
            suffix
        };
        Some(format!("{}-{suffix}", request.kind.localization_key()))
    }

    fn bibliography_anchor(&self, key: &str) -> Option<String> {
        let slug = slugify(key);
        Some(if slug.is_empty() {
            "bib".to_string()
        } else {
            format!("bib-{slug}")
        })
    }
}
