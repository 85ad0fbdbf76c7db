//! Bibliography entries read from BibTeX
//!
//! Only the subset needed to list and cite works is understood: entries
//! with braced, quoted or bare field values. `@comment`, `@preamble` and
//! `@string` blocks are skipped.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{QuillError, Result};

/// One bibliography entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BibEntry {
    /// Citation key
    pub key: String,
    /// Entry type, lowercase (`article`, `book`...)
    pub entry_type: String,
    /// Field values with braces removed, keyed by lowercase name
    pub fields: BTreeMap<String, String>,
}

impl BibEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Authors joined for display
    pub fn authors(&self) -> Option<String> {
        let authors: Vec<&str> = self
            .field("author")?
            .split(" and ")
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect();
        match authors.as_slice() {
            [] => None,
            [one] => Some(one.to_string()),
            [init @ .., last] => Some(format!("{} and {last}", init.join(", "))),
        }
    }

    /// Plain-text reference line: authors, title, venue, year
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(authors) = self.authors() {
            parts.push(authors);
        }
        if let Some(title) = self.field("title") {
            parts.push(title.to_string());
        }
        let venue = ["journal", "booktitle", "publisher", "howpublished"]
            .iter()
            .find_map(|name| self.field(name));
        match (venue, self.field("year")) {
            (Some(venue), Some(year)) => parts.push(format!("{venue}, {year}")),
            (Some(venue), None) => parts.push(venue.to_string()),
            (None, Some(year)) => parts.push(year.to_string()),
            (None, None) => {}
        }
        let mut text = parts.join(". ");
        if !text.is_empty() && !text.ends_with('.') {
            text.push('.');
        }
        text
    }
}

/// Parsed bibliography, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Bibliography {
    entries: Vec<BibEntry>,
}

impl Bibliography {
    /// Parse BibTeX text
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = BibParser { source, pos: 0 };
        let mut entries = Vec::new();
        while let Some(entry) = parser.next_entry()? {
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[BibEntry] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&BibEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display order: cited entries in order of first citation, then the
    /// uncited ones in source order
    pub fn ordered<'a>(&'a self, cited: &[String]) -> Vec<&'a BibEntry> {
        let mut ordered: Vec<&BibEntry> = cited.iter().filter_map(|key| self.get(key)).collect();
        ordered.extend(
            self.entries
                .iter()
                .filter(|entry| !cited.contains(&entry.key)),
        );
        ordered
    }
}

struct BibParser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> BibParser<'a> {
    fn error(&self, message: impl Into<String>) -> QuillError {
        QuillError::Resource {
            path: "bibliography".to_string(),
            message: format!("{} at byte {}", message.into(), self.pos),
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn word(&mut self) -> String {
        self.skip_whitespace();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || "_-:./+".contains(c)))
            .unwrap_or(rest.len());
        self.pos += len;
        rest[..len].to_string()
    }

    /// Text up to the brace matching the one just consumed
    fn braced(&mut self) -> Result<String> {
        let mut depth = 1;
        let start = self.pos;
        for (offset, c) in self.rest().char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let value = &self.source[start..start + offset];
                        self.pos = start + offset + 1;
                        return Ok(value.to_string());
                    }
                }
                _ => {}
            }
        }
        Err(self.error("unbalanced braces"))
    }

    fn value(&mut self) -> Result<String> {
        self.skip_whitespace();
        let raw = if self.eat('{') {
            self.braced()?
        } else if self.eat('"') {
            let rest = self.rest();
            let end = rest.find('"').ok_or_else(|| self.error("unterminated quote"))?;
            let value = rest[..end].to_string();
            self.pos += end + 1;
            value
        } else {
            self.word()
        };
        let cleaned: String = raw.chars().filter(|c| *c != '{' && *c != '}').collect();
        Ok(cleaned.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    fn next_entry(&mut self) -> Result<Option<BibEntry>> {
        loop {
            let Some(at) = self.rest().find('@') else {
                return Ok(None);
            };
            self.pos += at + 1;
            let entry_type = self.word().to_ascii_lowercase();
            if !self.eat('{') {
                return Err(self.error(format!("expected '{{' after @{entry_type}")));
            }
            if matches!(entry_type.as_str(), "comment" | "preamble" | "string") {
                self.braced()?;
                continue;
            }

            let key = self.word();
            if key.is_empty() {
                return Err(self.error("entry without a key"));
            }
            let mut fields = BTreeMap::new();
            loop {
                if self.eat('}') {
                    break;
                }
                if !self.eat(',') {
                    return Err(self.error(format!("expected ',' in entry '{key}'")));
                }
                if self.eat('}') {
                    break;
                }
                let name = self.word().to_ascii_lowercase();
                if name.is_empty() || !self.eat('=') {
                    return Err(self.error(format!("malformed field in entry '{key}'")));
                }
                let value = self.value()?;
                fields.insert(name, value);
            }
            return Ok(Some(BibEntry {
                key,
                entry_type,
                fields,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
@comment{ ignored {entirely} }
@article{knuth84,
  author = {Donald E. Knuth},
  title = {Literate {P}rogramming},
  journal = "The Computer Journal",
  year = 1984,
}

@book{lamport94,
  author = {Leslie Lamport and Donald Knuth and Someone Else},
  title = {LaTeX},
  publisher = {Addison-Wesley},
  year = {1994}
}
"#;

    #[test]
    fn test_parse_entries() {
        let bibliography = Bibliography::parse(SOURCE).unwrap();
        assert_eq!(bibliography.len(), 2);
        let knuth = bibliography.get("knuth84").unwrap();
        assert_eq!(knuth.entry_type, "article");
        assert_eq!(knuth.field("title"), Some("Literate Programming"));
        assert_eq!(knuth.field("year"), Some("1984"));
        assert_eq!(
            knuth.describe(),
            "Donald E. Knuth. Literate Programming. The Computer Journal, 1984."
        );
    }

    #[test]
    fn test_author_lists() {
        let bibliography = Bibliography::parse(SOURCE).unwrap();
        let lamport = bibliography.get("lamport94").unwrap();
        assert_eq!(
            lamport.authors().unwrap(),
            "Leslie Lamport, Donald Knuth and Someone Else"
        );
    }

    #[test]
    fn test_display_order() {
        let bibliography = Bibliography::parse(SOURCE).unwrap();
        let ordered = bibliography.ordered(&["lamport94".to_string()]);
        let keys: Vec<&str> = ordered.iter().map(|entry| entry.key.as_str()).collect();
        assert_eq!(keys, vec!["lamport94", "knuth84"]);
    }

    #[test]
    fn test_malformed_entry() {
        assert!(Bibliography::parse("@article{key, title = {open").is_err());
        assert!(Bibliography::parse("@article{key title}").is_err());
    }
}
