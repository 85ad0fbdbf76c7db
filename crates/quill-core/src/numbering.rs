//! Numbering formats
//!
//! A format string mixes counter symbols with literal characters:
//!
//! | Symbol | Counter            |
//! |--------|--------------------|
//! | `1`    | decimal            |
//! | `a`    | lowercase letters  |
//! | `A`    | uppercase letters  |
//! | `i`    | lowercase roman    |
//! | `I`    | uppercase roman    |
//!
//! Each symbol consumes one level of a location, so `1.a` renders `[2, 3]`
//! as `2.c`. The number of symbols is the format's accuracy.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use quill_ast::TrackableKind;

use crate::document::DocumentType;

/// Style of one counter symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterStyle {
    Decimal,
    LowerAlpha,
    UpperAlpha,
    LowerRoman,
    UpperRoman,
}

impl CounterStyle {
    fn from_symbol(c: char) -> Option<Self> {
        match c {
            '1' => Some(CounterStyle::Decimal),
            'a' => Some(CounterStyle::LowerAlpha),
            'A' => Some(CounterStyle::UpperAlpha),
            'i' => Some(CounterStyle::LowerRoman),
            'I' => Some(CounterStyle::UpperRoman),
            _ => None,
        }
    }

    /// Render one level; zero always renders as `0`
    pub fn render(self, n: usize) -> String {
        if n == 0 {
            return "0".to_string();
        }
        match self {
            CounterStyle::Decimal => n.to_string(),
            CounterStyle::LowerAlpha => alpha(n),
            CounterStyle::UpperAlpha => alpha(n).to_uppercase(),
            CounterStyle::LowerRoman => roman(n).to_lowercase(),
            CounterStyle::UpperRoman => roman(n),
        }
    }
}

/// Bijective base-26: a..z, aa, ab...
fn alpha(mut n: usize) -> String {
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn roman(n: usize) -> String {
    const TABLE: [(usize, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    if n >= 4000 {
        return n.to_string();
    }
    let mut rest = n;
    let mut out = String::new();
    for (value, numeral) in TABLE {
        while rest >= value {
            out.push_str(numeral);
            rest -= value;
        }
    }
    out
}

/// One element of a format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Counter(CounterStyle),
    Fixed(char),
}

/// Custom numbering: the accuracy and a rendering function
pub type CustomFormat = Rc<dyn Fn(&[usize]) -> String>;

/// How the location of an element turns into a displayed number
#[derive(Clone)]
pub enum NumberingFormat {
    Symbols(Vec<Symbol>),
    Custom { accuracy: usize, render: CustomFormat },
}

impl NumberingFormat {
    /// Parse a format string such as `1.1.a` or `(1)`
    pub fn parse(format: &str) -> Self {
        NumberingFormat::Symbols(
            format
                .chars()
                .map(|c| match CounterStyle::from_symbol(c) {
                    Some(style) => Symbol::Counter(style),
                    None => Symbol::Fixed(c),
                })
                .collect(),
        )
    }

    /// A format rendered by a function
    pub fn custom(accuracy: usize, render: impl Fn(&[usize]) -> String + 'static) -> Self {
        NumberingFormat::Custom {
            accuracy,
            render: Rc::new(render),
        }
    }

    /// Number of levels the format displays
    pub fn accuracy(&self) -> usize {
        match self {
            NumberingFormat::Symbols(symbols) => symbols
                .iter()
                .filter(|s| matches!(s, Symbol::Counter(_)))
                .count(),
            NumberingFormat::Custom { accuracy, .. } => *accuracy,
        }
    }

    /// Render a location.
    ///
    /// Rendering stops at the first counter without a level, dropping the
    /// literals written since the previous counter. Trailing literals are
    /// kept only when every counter was rendered.
    pub fn format(&self, levels: &[usize]) -> String {
        let symbols = match self {
            NumberingFormat::Symbols(symbols) => symbols,
            NumberingFormat::Custom { render, .. } => return render(levels),
        };

        let mut out = String::new();
        let mut pending = String::new();
        let mut level = 0;
        for symbol in symbols {
            match symbol {
                Symbol::Fixed(c) => pending.push(*c),
                Symbol::Counter(style) => {
                    let Some(&value) = levels.get(level) else {
                        return out;
                    };
                    out.push_str(&pending);
                    pending.clear();
                    out.push_str(&style.render(value));
                    level += 1;
                }
            }
        }
        out.push_str(&pending);
        out
    }
}

impl fmt::Debug for NumberingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberingFormat::Symbols(symbols) => f.debug_tuple("Symbols").field(symbols).finish(),
            NumberingFormat::Custom { accuracy, .. } => f
                .debug_struct("Custom")
                .field("accuracy", accuracy)
                .finish_non_exhaustive(),
        }
    }
}

/// Numbering formats for each kind of trackable element
#[derive(Debug, Clone, Default)]
pub struct DocumentNumbering {
    formats: BTreeMap<TrackableKind, NumberingFormat>,
}

impl DocumentNumbering {
    /// Formats applied when a document does not set its own
    pub fn defaults_for(doc_type: DocumentType) -> Self {
        let mut numbering = Self::default();
        match doc_type {
            DocumentType::Plain => {}
            DocumentType::Paged | DocumentType::Docs => {
                numbering.set(TrackableKind::Heading, NumberingFormat::parse("1.1.1"));
                numbering.set(TrackableKind::Figure, NumberingFormat::parse("1.1"));
                numbering.set(TrackableKind::Table, NumberingFormat::parse("1.1"));
                numbering.set(TrackableKind::CodeListing, NumberingFormat::parse("1.1"));
                numbering.set(TrackableKind::Equation, NumberingFormat::parse("(1)"));
            }
            DocumentType::Slides => {
                numbering.set(TrackableKind::Figure, NumberingFormat::parse("1"));
                numbering.set(TrackableKind::Table, NumberingFormat::parse("1"));
                numbering.set(TrackableKind::CodeListing, NumberingFormat::parse("1"));
                numbering.set(TrackableKind::Equation, NumberingFormat::parse("(1)"));
            }
        }
        numbering
    }

    pub fn get(&self, kind: TrackableKind) -> Option<&NumberingFormat> {
        self.formats.get(&kind)
    }

    pub fn set(&mut self, kind: TrackableKind, format: NumberingFormat) {
        self.formats.insert(kind, format);
    }

    pub fn remove(&mut self, kind: TrackableKind) {
        self.formats.remove(&kind);
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

/// Map a `.numbering` key to the kind it configures
pub fn kind_from_key(key: &str) -> Option<TrackableKind> {
    match key.to_ascii_lowercase().as_str() {
        "headings" | "heading" | "sections" => Some(TrackableKind::Heading),
        "figures" | "figure" => Some(TrackableKind::Figure),
        "tables" | "table" => Some(TrackableKind::Table),
        "equations" | "equation" => Some(TrackableKind::Equation),
        "code" | "listings" | "listing" => Some(TrackableKind::CodeListing),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_levels() {
        let format = NumberingFormat::parse("1.1.a");
        assert_eq!(format.accuracy(), 3);
        assert_eq!(format.format(&[2, 1, 3]), "2.1.c");
        assert_eq!(format.format(&[2, 1]), "2.1");
    }

    #[test]
    fn test_trailing_literals() {
        let format = NumberingFormat::parse("(1)");
        assert_eq!(format.format(&[4]), "(4)");

        let format = NumberingFormat::parse("1.1)");
        assert_eq!(format.format(&[1]), "1");
        assert_eq!(format.format(&[1, 2]), "1.2)");
    }

    #[test]
    fn test_zero_levels() {
        let format = NumberingFormat::parse("I.a");
        assert_eq!(format.format(&[0, 2]), "0.b");
    }

    #[test]
    fn test_counter_styles() {
        assert_eq!(CounterStyle::LowerAlpha.render(27), "aa");
        assert_eq!(CounterStyle::UpperAlpha.render(26), "Z");
        assert_eq!(CounterStyle::UpperRoman.render(1994), "MCMXCIV");
        assert_eq!(CounterStyle::LowerRoman.render(4), "iv");
    }

    #[test]
    fn test_custom_format() {
        let format = NumberingFormat::custom(2, |levels| {
            levels
                .iter()
                .map(|n| format!("<{n}>"))
                .collect::<Vec<_>>()
                .join("")
        });
        assert_eq!(format.accuracy(), 2);
        assert_eq!(format.format(&[1, 2]), "<1><2>");
    }

    #[test]
    fn test_defaults() {
        let slides = DocumentNumbering::defaults_for(DocumentType::Slides);
        assert!(slides.get(TrackableKind::Heading).is_none());
        assert_eq!(
            slides
                .get(TrackableKind::Equation)
                .map(|f| f.format(&[3])),
            Some("(3)".to_string())
        );
        assert!(DocumentNumbering::defaults_for(DocumentType::Plain).is_empty());
    }

    #[test]
    fn test_kind_keys() {
        assert_eq!(kind_from_key("Figures"), Some(TrackableKind::Figure));
        assert_eq!(kind_from_key("code"), Some(TrackableKind::CodeListing));
        assert_eq!(kind_from_key("pages"), None);
    }
}
