//! Complete HTML page around a rendered body
//!
//! Generates a self-contained page: metadata in the head, a stylesheet
//! adapted to the document type, and the document settings embedded as
//! JSON for scripts and themes to read.

use quick_xml::escape::escape;
use quill_core::document::{DocumentInfo, DocumentType};
use quill_core::{Context, QuillError, Result};

const REVEAL_VERSION: &str = "5.1.0";

/// Wrap `body` in a full page for the document described by `ctx`
pub(crate) fn wrap(body: &str, ctx: &Context) -> Result<String> {
    let info = &ctx.document;
    let title = info
        .name
        .as_deref()
        .or(ctx.options().document_name.as_deref())
        .unwrap_or("Untitled");
    let authors = if info.authors.is_empty() {
        String::new()
    } else {
        format!(
            "\n    <meta name=\"author\" content=\"{}\">",
            escape(info.authors.join(", "))
        )
    };
    let theme = match &info.theme {
        Some(theme) => format!(" data-theme=\"{}\"", escape(theme.as_str())),
        None => String::new(),
    };

    let (head, content, scripts) = match info.doc_type {
        DocumentType::Slides => (
            format!(
                "\n    <link rel=\"stylesheet\" href=\"https://cdn.jsdelivr.net/npm/reveal.js@{REVEAL_VERSION}/dist/reveal.css\">"
            ),
            format!("<div class=\"reveal\">\n<div class=\"slides\">\n{body}</div>\n</div>"),
            reveal_scripts(info)?,
        ),
        DocumentType::Paged => (
            String::new(),
            format!("<main class=\"paged\">\n{body}</main>"),
            String::new(),
        ),
        DocumentType::Plain | DocumentType::Docs => {
            (String::new(), format!("<main>\n{body}</main>"), String::new())
        }
    };

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="generator" content="quill {version}">
    <title>{title}</title>{authors}{head}
    <style>
{style}
    </style>
</head>
<body class="{doc_type}"{theme}>
{content}
<script type="application/json" id="quill-document">{config}</script>{scripts}
</body>
</html>
"#,
        lang = escape(ctx.locale()),
        version = crate::VERSION,
        title = escape(title),
        style = stylesheet(info),
        doc_type = info.doc_type.name(),
        config = document_config(info)?,
    ))
}

/// Document settings as JSON, safe to embed in a script element
fn document_config(info: &DocumentInfo) -> Result<String> {
    let json = serde_json::to_string(info)
        .map_err(|err| QuillError::runtime(format!("failed to serialize document settings: {err}")))?;
    Ok(json.replace("</", "<\\/"))
}

fn reveal_scripts(info: &DocumentInfo) -> Result<String> {
    let slides = &info.slides;
    let options = serde_json::json!({
        "hash": true,
        "transition": slides.transition.as_deref().unwrap_or("slide"),
        "center": slides.center.unwrap_or(true),
        "controls": slides.controls.unwrap_or(true),
    });
    let options = serde_json::to_string(&options)
        .map_err(|err| QuillError::runtime(format!("failed to serialize slide options: {err}")))?;
    Ok(format!(
        "\n<script src=\"https://cdn.jsdelivr.net/npm/reveal.js@{REVEAL_VERSION}/dist/reveal.js\"></script>\n<script>Reveal.initialize({options});</script>"
    ))
}

fn stylesheet(info: &DocumentInfo) -> String {
    let mut css = String::from(BASE_STYLE);
    match info.doc_type {
        DocumentType::Paged => {
            let format = &info.page_format;
            let size = match (&format.size, &format.orientation) {
                (Some(size), Some(orientation)) => format!("{size} {orientation}"),
                (Some(size), None) => size.clone(),
                (None, Some(orientation)) => orientation.clone(),
                (None, None) => "A4".to_string(),
            };
            css.push_str(&format!("        @page {{ size: {size};"));
            if let Some(margin) = &format.margin {
                css.push_str(&format!(" margin: {margin};"));
            }
            css.push_str(" }\n");
            if let Some(columns) = format.columns.filter(|&columns| columns > 1) {
                css.push_str(&format!(
                    "        main.paged {{ column-count: {columns}; column-gap: 2em; }}\n"
                ));
            }
            css.push_str(PAGED_STYLE);
        }
        DocumentType::Docs => css.push_str(DOCS_STYLE),
        DocumentType::Plain | DocumentType::Slides => {}
    }
    css
}

const BASE_STYLE: &str = r#"        * { box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
            line-height: 1.6;
            color: #333;
        }
        main { max-width: 960px; margin: 0 auto; padding: 2rem; }
        h1, h2, h3 { color: #212529; }
        h1[data-location]::before, h2[data-location]::before, h3[data-location]::before,
        h4[data-location]::before, h5[data-location]::before, h6[data-location]::before {
            content: attr(data-location) " ";
            color: #6c757d;
        }
        pre { background: #f8f9fa; padding: 1rem; border-radius: 4px; overflow-x: auto; }
        figure { margin: 1.5rem 0; text-align: center; }
        figcaption[data-element-label]::before { content: attr(data-element-label) " "; font-weight: bold; }
        table { border-collapse: collapse; margin: 1rem auto; }
        th, td { border: 1px solid #dee2e6; padding: 0.5rem 0.75rem; }
        th { background: #f8f9fa; }
        .stack { display: flex; }
        .stack-row { flex-direction: row; }
        .stack-column { flex-direction: column; }
        .container.fullwidth { width: 100%; }
        .box { border-left: 4px solid #0d6efd; background: #f1f6ff; padding: 0.5rem 1rem; margin: 1rem 0; border-radius: 4px; }
        .box header h4 { margin: 0.25rem 0; }
        .box.tip { border-color: #28a745; background: #eefaf1; }
        .box.note { border-color: #6c757d; background: #f5f5f5; }
        .box.warning { border-color: #ffc107; background: #fff9e6; }
        .box.error { border-color: #dc3545; background: #fdeeee; }
        .call-error { color: #dc3545; font-family: monospace; }
        .unresolved { color: #dc3545; }
        .task-list-item { list-style: none; }
        .focused { font-weight: bold; }
        .table-of-contents ol { list-style: none; }
        .table-of-contents a[data-location]::before { content: attr(data-location) " "; }
        .bibliography-entry-label { font-weight: bold; }
        .page-break { break-after: page; }
"#;

const PAGED_STYLE: &str = r#"        main.paged { max-width: none; padding: 0; }
        @media screen {
            main.paged { max-width: 21cm; margin: 2rem auto; padding: 2cm; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        }
"#;

const DOCS_STYLE: &str = r#"        main { max-width: 1200px; }
        h1, h2 { border-bottom: 1px solid #dee2e6; padding-bottom: 0.3rem; }
        nav.table-of-contents { background: #f8f9fa; padding: 1rem; border-radius: 8px; }
"#;
