//! Localization
//!
//! The `std` table holds the names renderers and the resolver show for
//! numbered elements and generated sections. Documents can add tables of
//! their own with `.localization` and read any table with `.localize`.

use quill_core::error::QuillError;
use quill_core::function::Function;
use quill_core::localization::{LocalizationTables, DEFAULT_LOCALE, STD_TABLE};
use quill_core::value::{ParamType, Value};
use quill_core::Result;
use tracing::debug;

const ENGLISH: &[(&str, &str)] = &[
    ("section", "Section"),
    ("figure", "Figure"),
    ("table", "Table"),
    ("equation", "Equation"),
    ("listing", "Listing"),
    ("tableofcontents", "Table of Contents"),
    ("bibliography", "Bibliography"),
];

const ITALIAN: &[(&str, &str)] = &[
    ("section", "Sezione"),
    ("figure", "Figura"),
    ("table", "Tabella"),
    ("equation", "Equazione"),
    ("listing", "Listato"),
    ("tableofcontents", "Indice"),
    ("bibliography", "Bibliografia"),
];

const GERMAN: &[(&str, &str)] = &[
    ("section", "Abschnitt"),
    ("figure", "Abbildung"),
    ("table", "Tabelle"),
    ("equation", "Gleichung"),
    ("listing", "Listing"),
    ("tableofcontents", "Inhaltsverzeichnis"),
    ("bibliography", "Literaturverzeichnis"),
];

const FRENCH: &[(&str, &str)] = &[
    ("section", "Section"),
    ("figure", "Figure"),
    ("table", "Tableau"),
    ("equation", "Équation"),
    ("listing", "Listing"),
    ("tableofcontents", "Table des matières"),
    ("bibliography", "Bibliographie"),
];

const SPANISH: &[(&str, &str)] = &[
    ("section", "Sección"),
    ("figure", "Figura"),
    ("table", "Tabla"),
    ("equation", "Ecuación"),
    ("listing", "Listado"),
    ("tableofcontents", "Índice"),
    ("bibliography", "Bibliografía"),
];

/// Register the `std` table in every built-in locale
pub(crate) fn register_std_table(tables: &mut LocalizationTables) {
    for (locale, entries) in [
        ("en", ENGLISH),
        ("it", ITALIAN),
        ("de", GERMAN),
        ("fr", FRENCH),
        ("es", SPANISH),
    ] {
        tables.register(STD_TABLE, locale, entries.iter().copied());
    }
}

pub(crate) fn functions() -> Vec<Function> {
    vec![
        Function::new("localize", |call| {
            let key = call.args.string("key")?;
            let table = call.args.string("table")?;
            let locale = call.ctx.locale();
            let tables = &call.ctx.localization;
            tables
                .get(table, locale, key)
                .or_else(|| tables.get(table, DEFAULT_LOCALE, key))
                .map(|value| Value::String(value.to_string()))
                .ok_or_else(|| {
                    QuillError::runtime(format!(
                        "no localization for '{key}' in table '{table}' ({locale})"
                    ))
                })
        })
        .param("key", ParamType::String)
        .defaulted("table", ParamType::String, STD_TABLE),
        Function::new("localization", |call| {
            let name = call.args.string("name")?.to_string();
            let source = call.args.string("entries")?;
            for (locale, entries) in parse_table(source)? {
                debug!(table = %name, locale = %locale, entries = entries.len(), "localization registered");
                call.ctx.localization.register(&name, &locale, entries);
            }
            Ok(Value::Void)
        })
        .param("name", ParamType::String)
        .body("entries", ParamType::String),
    ]
}

type LocaleEntries = (String, Vec<(String, String)>);

/// Parse a table written as a nested list:
///
/// ```text
/// - en
///   - greeting: Hello
/// - it
///   - greeting: Ciao
/// ```
fn parse_table(source: &str) -> Result<Vec<LocaleEntries>> {
    let mut locales: Vec<LocaleEntries> = Vec::new();
    for line in source.lines().filter(|l| !l.trim().is_empty()) {
        let nested = line.starts_with([' ', '\t']);
        let item = line.trim();
        let item = item.strip_prefix("- ").unwrap_or(item);
        if !nested {
            locales.push((item.to_string(), Vec::new()));
            continue;
        }
        let (key, value) = item
            .split_once(':')
            .ok_or_else(|| QuillError::runtime(format!("expected 'key: value', got '{item}'")))?;
        let (_, entries) = locales
            .last_mut()
            .ok_or_else(|| QuillError::runtime(format!("entry '{item}' has no locale")))?;
        entries.push((key.trim().to_string(), value.trim().to_string()));
    }
    Ok(locales)
}
