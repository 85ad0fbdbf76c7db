//! Document metadata, numbering and library inclusion
//!
//! Setters return nothing. Called without arguments, `.doctype`,
//! `.docname`, `.doclang` and `.theme` return the current value instead.

use quill_core::document::DocumentType;
use quill_core::error::QuillError;
use quill_core::function::Function;
use quill_core::numbering::{kind_from_key, DocumentNumbering, NumberingFormat};
use quill_core::value::{ParamType, Value};
use quill_core::Result;
use tracing::debug;

const ORIENTATIONS: &[&str] = &["portrait", "landscape"];

pub(crate) fn functions() -> Vec<Function> {
    vec![
        Function::new("doctype", |call| match call.args.opt_enumeration("type") {
            Some(name) => {
                let doc_type = DocumentType::from_name(name)
                    .ok_or_else(|| QuillError::runtime(format!("unknown document type '{name}'")))?;
                debug!(doc_type = name, "document type set");
                call.ctx.document.doc_type = doc_type;
                Ok(Value::Void)
            }
            None => Ok(Value::Enum(call.ctx.document.doc_type.name().to_string())),
        })
        .optional("type", ParamType::Enum(DocumentType::NAMES)),
        Function::new("docname", |call| {
            let current = &mut call.ctx.document.name;
            Ok(get_or_set(current, call.args.opt_string("name")))
        })
        .optional("name", ParamType::String),
        Function::new("doclang", |call| {
            let current = &mut call.ctx.document.locale;
            Ok(get_or_set(current, call.args.opt_string("locale")))
        })
        .optional("locale", ParamType::String),
        Function::new("theme", |call| {
            let current = &mut call.ctx.document.theme;
            Ok(get_or_set(current, call.args.opt_string("name")))
        })
        .optional("name", ParamType::String),
        Function::new("docauthor", |call| {
            let author = call.args.string("name")?.to_string();
            call.ctx.document.authors.push(author);
            Ok(Value::Void)
        })
        .param("name", ParamType::String),
        Function::new("pageformat", |call| {
            let format = &mut call.ctx.document.page_format;
            if let Some(size) = call.args.opt_string("size") {
                format.size = Some(size.to_string());
            }
            if let Some(orientation) = call.args.opt_enumeration("orientation") {
                format.orientation = Some(orientation.to_string());
            }
            if let Some(margin) = call.args.opt_string("margin") {
                format.margin = Some(margin.to_string());
            }
            if call.args.has("columns") {
                format.columns = Some(call.args.count("columns")? as u32);
            }
            Ok(Value::Void)
        })
        .optional("size", ParamType::String)
        .optional("orientation", ParamType::Enum(ORIENTATIONS))
        .optional("margin", ParamType::String)
        .optional("columns", ParamType::Number),
        Function::new("numbering", |call| {
            let numbering = parse_numbering(call.args.string("formats")?)?;
            call.ctx.document.numbering = Some(numbering);
            call.ctx.document.numbering_disabled = false;
            Ok(Value::Void)
        })
        .body("formats", ParamType::String),
        Function::new("nonumbering", |call| {
            call.ctx.document.numbering_disabled = true;
            Ok(Value::Void)
        }),
        Function::new("include", |call| {
            let name = call.args.string("name")?.to_string();
            call.ctx.include(&name)?;
            Ok(Value::Void)
        })
        .param("name", ParamType::String),
    ]
}

fn get_or_set(current: &mut Option<String>, new: Option<&str>) -> Value {
    match new {
        Some(value) => {
            *current = Some(value.to_string());
            Value::Void
        }
        None => current.clone().map(Value::String).unwrap_or(Value::None),
    }
}

/// Parse `key: format` lines, optionally written as a markup list.
///
/// Kinds left out, or set to `none`, are not numbered.
fn parse_numbering(source: &str) -> Result<DocumentNumbering> {
    let mut numbering = DocumentNumbering::default();
    for line in source.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let line = line.strip_prefix("- ").unwrap_or(line);
        let (key, format) = line.split_once(':').ok_or_else(|| {
            QuillError::runtime(format!("expected 'kind: format', got '{line}'"))
        })?;
        let kind = kind_from_key(key.trim())
            .ok_or_else(|| QuillError::runtime(format!("unknown numbering kind '{}'", key.trim())))?;
        match format.trim() {
            "none" => numbering.remove(kind),
            format => numbering.set(kind, NumberingFormat::parse(format)),
        }
    }
    Ok(numbering)
}
