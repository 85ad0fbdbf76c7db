//! Localization tables
//!
//! A table maps locale tags to key/value entries. Lookups fall back from a
//! regional tag (`it-IT`) to its language (`it`).

use std::collections::HashMap;

/// Table registered by the standard library
pub const STD_TABLE: &str = "std";

/// Locale used when the document does not set one
pub const DEFAULT_LOCALE: &str = "en";

/// Named localization tables
#[derive(Debug, Clone, Default)]
pub struct LocalizationTables {
    tables: HashMap<String, HashMap<String, HashMap<String, String>>>,
}

impl LocalizationTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add entries for a locale, merging with existing ones
    pub fn register<K, V>(
        &mut self,
        table: &str,
        locale: &str,
        entries: impl IntoIterator<Item = (K, V)>,
    ) where
        K: Into<String>,
        V: Into<String>,
    {
        let locale_entries = self
            .tables
            .entry(table.to_string())
            .or_default()
            .entry(normalize(locale))
            .or_default();
        for (key, value) in entries {
            locale_entries.insert(key.into(), value.into());
        }
    }

    /// Look up a key, falling back to the language subtag
    pub fn get(&self, table: &str, locale: &str, key: &str) -> Option<&str> {
        let table = self.tables.get(table)?;
        let locale = normalize(locale);
        let exact = table.get(&locale).and_then(|entries| entries.get(key));
        exact
            .or_else(|| {
                let language = locale.split('-').next()?;
                table.get(language)?.get(key)
            })
            .map(String::as_str)
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Locales of a table, sorted
    pub fn locales(&self, table: &str) -> Vec<&str> {
        let mut locales: Vec<&str> = self
            .tables
            .get(table)
            .map(|entries| entries.keys().map(String::as_str).collect())
            .unwrap_or_default();
        locales.sort_unstable();
        locales
    }
}

/// Lowercase a tag and use `-` as separator
fn normalize(locale: &str) -> String {
    locale.trim().replace('_', "-").to_ascii_lowercase()
}
