//! Document-level metadata set by the document itself

use serde::{Deserialize, Serialize};

use crate::numbering::DocumentNumbering;

/// Kind of output document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// A continuous page with no numbering by default
    #[default]
    Plain,
    /// Print-like pages
    Paged,
    /// A slide deck
    Slides,
    /// Technical documentation
    Docs,
}

impl DocumentType {
    /// Names accepted by `.doctype`, in declaration order
    pub const NAMES: &'static [&'static str] = &["plain", "paged", "slides", "docs"];

    pub fn name(&self) -> &'static str {
        match self {
            DocumentType::Plain => "plain",
            DocumentType::Paged => "paged",
            DocumentType::Slides => "slides",
            DocumentType::Docs => "docs",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "plain" => Some(DocumentType::Plain),
            "paged" => Some(DocumentType::Paged),
            "slides" => Some(DocumentType::Slides),
            "docs" => Some(DocumentType::Docs),
            _ => None,
        }
    }
}

/// Page geometry for paged documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFormat {
    /// Named size such as `A4` or `letter`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    /// CSS-like margin, e.g. `2cm 1cm`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<String>,
    /// Number of text columns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
}

/// Slide deck presentation settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlidesOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controls: Option<bool>,
}

/// Metadata of the document being compiled
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentInfo {
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    /// Locale tag, e.g. `en` or `it-IT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub page_format: PageFormat,
    pub slides: SlidesOptions,
    /// Numbering set with `.numbering`; type defaults apply when unset
    #[serde(skip)]
    pub numbering: Option<DocumentNumbering>,
    /// Set by `.nonumbering`
    #[serde(skip)]
    pub numbering_disabled: bool,
}

impl DocumentInfo {
    /// The numbering formats in force for this document
    pub fn effective_numbering(&self) -> DocumentNumbering {
        if self.numbering_disabled {
            return DocumentNumbering::default();
        }
        self.numbering
            .clone()
            .unwrap_or_else(|| DocumentNumbering::defaults_for(self.doc_type))
    }
}
