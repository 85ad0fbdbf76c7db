//! Dynamic values
//!
//! Every argument, variable and function result is a [`Value`]. Raw argument
//! text enters as [`Value::Dynamic`] and is converted to the type a parameter
//! declares with [`ParamType::convert`].

use std::fmt;

use once_cell::sync::Lazy;
use quill_ast::{Node, NodeKind};
use regex::Regex;

use crate::context::Context;
use crate::error::{QuillError, Result};
use crate::lambda::Lambda;

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?$").unwrap());
static RANGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(-?\d+)?\.\.(-?\d+)?$").unwrap());

/// A dynamically tagged runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Result of a function that returns nothing
    Void,
    /// Absent optional value
    None,
    /// Raw text that has not been given a type yet
    Dynamic(String),
    String(String),
    Number(f64),
    Boolean(bool),
    /// A token from a fixed vocabulary, stored in its canonical spelling
    Enum(String),
    Range(NumberRange),
    Sequence(Vec<Value>),
    Pair(Box<Value>, Box<Value>),
    /// Tree content
    Content(Vec<Node>),
    Lambda(Lambda),
}

impl Value {
    /// Name of the value's type, for messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::None => "none",
            Value::Dynamic(_) => "dynamic",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Enum(_) => "enum",
            Value::Range(_) => "range",
            Value::Sequence(_) => "sequence",
            Value::Pair(_, _) => "pair",
            Value::Content(_) => "content",
            Value::Lambda(_) => "lambda",
        }
    }

    /// Whether the value is absent
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Textual representation, as substituted into running text
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Interpret the value as a number, if it is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            Value::Dynamic(raw) | Value::String(raw) => parse_number(raw),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => Ok(()),
            Value::None => write!(f, "None"),
            Value::Dynamic(text) | Value::String(text) | Value::Enum(text) => write!(f, "{text}"),
            Value::Number(number) => write!(f, "{}", format_number(*number)),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Range(range) => write!(f, "{range}"),
            Value::Sequence(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Pair(first, second) => write!(f, "({first}, {second})"),
            Value::Content(nodes) => {
                let text: String = nodes.iter().map(Node::plain_text).collect();
                write!(f, "{text}")
            }
            Value::Lambda(_) => write!(f, "<lambda>"),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

/// Format a number, dropping the fractional part of integral values
pub fn format_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

/// Parse decimal text (`3`, `-2.5`, `.5`, `1e3`)
pub fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if NUMBER.is_match(raw) {
        raw.parse().ok()
    } else {
        None
    }
}

/// Parse `true`/`yes` and `false`/`no`, ignoring case
pub fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

/// Most items a range may expand to, and most repetitions of a body
pub const MAX_EXPANSION: usize = 100_000;

/// An integer range with optional bounds, `a..b` inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl NumberRange {
    /// Parse `a..b`, `..b`, `a..` or `..`
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = RANGE.captures(raw.trim())?;
        let bound = |index| caps.get(index).and_then(|m| m.as_str().parse().ok());
        Some(Self {
            start: bound(1),
            end: bound(2),
        })
    }

    /// Number of values, when both bounds are known
    pub fn size(&self) -> Option<u64> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start <= end => Some(end.abs_diff(start).saturating_add(1)),
            (Some(_), Some(_)) => Some(0),
            _ => None,
        }
    }

    /// All values, when both bounds are known.
    ///
    /// Ranges longer than [`MAX_EXPANSION`] are a runtime error.
    pub fn values(&self) -> Result<Option<Vec<i64>>> {
        let (Some(start), Some(size)) = (self.start, self.size()) else {
            return Ok(None);
        };
        if size > MAX_EXPANSION as u64 {
            return Err(QuillError::runtime(format!(
                "range {self} has {size} values, more than the {MAX_EXPANSION} allowed"
            )));
        }
        Ok(Some((0..size as i64).map(|offset| start + offset).collect()))
    }
}

impl fmt::Display for NumberRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{start}")?;
        }
        write!(f, "..")?;
        if let Some(end) = self.end {
            write!(f, "{end}")?;
        }
        Ok(())
    }
}

/// The type a parameter declares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Receives the wrapped [`Value`] untouched
    Any,
    String,
    Number,
    /// Like [`ParamType::Number`], but unparsable text counts as `0`
    LenientNumber,
    Boolean,
    /// One of a fixed vocabulary, matched ignoring case
    Enum(&'static [&'static str]),
    Range,
    Sequence,
    /// Block-level markup
    Content,
    /// Inline markup
    InlineContent,
    /// A callable; its raw text is never evaluated eagerly
    Lambda,
}

impl ParamType {
    /// Name used in signatures and conversion errors
    pub fn name(&self) -> String {
        match self {
            ParamType::Any => "any".to_string(),
            ParamType::String => "string".to_string(),
            ParamType::Number | ParamType::LenientNumber => "number".to_string(),
            ParamType::Boolean => "boolean".to_string(),
            ParamType::Enum(vocabulary) => format!("one of {}", vocabulary.join(", ")),
            ParamType::Range => "range".to_string(),
            ParamType::Sequence => "sequence".to_string(),
            ParamType::Content => "content".to_string(),
            ParamType::InlineContent => "inline content".to_string(),
            ParamType::Lambda => "lambda".to_string(),
        }
    }

    /// Whether arguments of this type are passed as raw text instead of
    /// being evaluated before binding
    pub fn is_deferred(&self) -> bool {
        matches!(self, ParamType::Lambda)
    }

    /// Convert a value to this type.
    ///
    /// [`Value::None`] passes through every type. A failed conversion is a
    /// [`QuillError::TypeConversion`] carrying the offending text.
    pub fn convert(&self, value: Value, ctx: &mut Context) -> Result<Value> {
        if value.is_none() {
            return Ok(value);
        }
        let fail = |value: &Value| QuillError::conversion(self.name(), value.to_text());
        match self {
            ParamType::Any => Ok(value),
            ParamType::String => match value {
                Value::Dynamic(text) | Value::String(text) => Ok(Value::String(text)),
                Value::Lambda(_) | Value::Void => Err(fail(&value)),
                other => Ok(Value::String(other.to_text())),
            },
            ParamType::Number => value
                .as_number()
                .map(Value::Number)
                .ok_or_else(|| fail(&value)),
            ParamType::LenientNumber => Ok(Value::Number(value.as_number().unwrap_or(0.0))),
            ParamType::Boolean => match &value {
                Value::Boolean(_) => Ok(value),
                Value::Dynamic(raw) | Value::String(raw) | Value::Enum(raw) => parse_boolean(raw)
                    .map(Value::Boolean)
                    .ok_or_else(|| fail(&value)),
                _ => Err(fail(&value)),
            },
            ParamType::Enum(vocabulary) => match &value {
                Value::Dynamic(raw) | Value::String(raw) | Value::Enum(raw) => vocabulary
                    .iter()
                    .find(|entry| entry.eq_ignore_ascii_case(raw.trim()))
                    .map(|entry| Value::Enum(entry.to_string()))
                    .ok_or_else(|| fail(&value)),
                _ => Err(fail(&value)),
            },
            ParamType::Range => match &value {
                Value::Range(_) => Ok(value),
                Value::Dynamic(raw) | Value::String(raw) => NumberRange::parse(raw)
                    .map(Value::Range)
                    .ok_or_else(|| fail(&value)),
                _ => Err(fail(&value)),
            },
            ParamType::Sequence => to_sequence(value)?.map_err(|value| fail(&value)),
            ParamType::Content => match value {
                Value::Content(nodes) => Ok(Value::Content(nodes)),
                Value::Dynamic(raw) => Ok(Value::Content(ctx.parse_blocks(&raw)?)),
                Value::Lambda(_) | Value::Void => Err(fail(&value)),
                other => Ok(Value::Content(vec![Node::with_children(
                    NodeKind::Paragraph,
                    vec![Node::text(other.to_text())],
                )])),
            },
            ParamType::InlineContent => match value {
                Value::Content(nodes) => Ok(Value::Content(unwrap_paragraph(nodes))),
                Value::Dynamic(raw) => Ok(Value::Content(ctx.parse_inlines(&raw)?)),
                Value::Lambda(_) | Value::Void => Err(fail(&value)),
                other => Ok(Value::Content(vec![Node::text(other.to_text())])),
            },
            ParamType::Lambda => match value {
                Value::Lambda(_) => Ok(value),
                Value::Dynamic(raw) | Value::String(raw) => Ok(Value::Lambda(Lambda::parse(&raw))),
                other => Err(fail(&other)),
            },
        }
    }
}

/// The sequence `value` stands for; the inner error hands back a value
/// that is not a sequence
fn to_sequence(value: Value) -> Result<std::result::Result<Value, Value>> {
    let numbers = |values: Vec<i64>| {
        Value::Sequence(values.into_iter().map(|n| Value::Number(n as f64)).collect())
    };
    Ok(match value {
        Value::Sequence(_) => Ok(value),
        Value::Pair(first, second) => Ok(Value::Sequence(vec![*first, *second])),
        Value::Range(range) => match range.values()? {
            Some(values) => Ok(numbers(values)),
            None => Err(Value::Range(range)),
        },
        Value::Dynamic(raw) => {
            if let Some(range) = NumberRange::parse(&raw) {
                if let Some(values) = range.values()? {
                    return Ok(Ok(numbers(values)));
                }
            }
            let items: Option<Vec<Value>> = raw
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| {
                    let line = line.trim_start();
                    line.strip_prefix("- ")
                        .or_else(|| line.strip_prefix("* "))
                        .map(|item| Value::Dynamic(item.trim().to_string()))
                })
                .collect();
            match items {
                Some(items) if !items.is_empty() => Ok(Value::Sequence(items)),
                _ => Err(Value::Dynamic(raw)),
            }
        }
        other => Err(other),
    })
}

/// Inline children of a lone paragraph, or the nodes themselves
pub fn unwrap_paragraph(mut nodes: Vec<Node>) -> Vec<Node> {
    if nodes.len() == 1 && nodes[0].kind == NodeKind::Paragraph {
        return nodes.remove(0).children;
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(raw: &str, ty: ParamType) -> Result<Value> {
        let mut ctx = Context::default();
        ty.convert(Value::Dynamic(raw.to_string()), &mut ctx)
    }

    #[test]
    fn test_numeric_conversion() {
        assert_eq!(convert("3.14", ParamType::Number).unwrap(), Value::Number(3.14));
        assert_eq!(convert(" -2 ", ParamType::Number).unwrap(), Value::Number(-2.0));
        match convert("abc", ParamType::Number) {
            Err(QuillError::TypeConversion { raw, .. }) => assert_eq!(raw, "abc"),
            other => panic!("expected a conversion failure, got {other:?}"),
        }
    }

    #[test]
    fn test_lenient_numeric_conversion() {
        assert_eq!(convert("abc", ParamType::LenientNumber).unwrap(), Value::Number(0.0));
        assert_eq!(convert("7", ParamType::LenientNumber).unwrap(), Value::Number(7.0));
    }

    #[test]
    fn test_rejects_non_decimal_numbers() {
        assert!(convert("inf", ParamType::Number).is_err());
        assert!(convert("0x10", ParamType::Number).is_err());
    }

    #[test]
    fn test_boolean_vocabulary() {
        assert_eq!(convert("YES", ParamType::Boolean).unwrap(), Value::Boolean(true));
        assert_eq!(convert("False", ParamType::Boolean).unwrap(), Value::Boolean(false));
        assert!(convert("maybe", ParamType::Boolean).is_err());
    }

    #[test]
    fn test_enum_vocabulary() {
        const ALIGNMENTS: &[&str] = &["start", "center", "end"];
        assert_eq!(
            convert("Center", ParamType::Enum(ALIGNMENTS)).unwrap(),
            Value::Enum("center".to_string())
        );
        assert!(convert("middle", ParamType::Enum(ALIGNMENTS)).is_err());
    }

    #[test]
    fn test_range_and_sequence() {
        assert_eq!(
            convert("2..4", ParamType::Sequence).unwrap(),
            Value::Sequence(vec![
                Value::Number(2.0),
                Value::Number(3.0),
                Value::Number(4.0)
            ])
        );
        assert_eq!(
            convert("..5", ParamType::Range).unwrap(),
            Value::Range(NumberRange {
                start: None,
                end: Some(5)
            })
        );
    }

    #[test]
    fn test_oversized_range_is_a_runtime_error() {
        let huge = NumberRange {
            start: Some(1),
            end: Some(1_000_000_000_000_000_000),
        };
        assert_eq!(huge.size(), Some(1_000_000_000_000_000_000));
        assert!(matches!(huge.values(), Err(QuillError::Runtime(_))));

        let full = NumberRange {
            start: Some(i64::MIN),
            end: Some(i64::MAX),
        };
        assert_eq!(full.size(), Some(u64::MAX));

        let mut ctx = Context::default();
        assert!(matches!(
            ParamType::Sequence.convert(Value::Range(huge), &mut ctx),
            Err(QuillError::Runtime(_))
        ));
        assert!(matches!(
            convert("1..10000000", ParamType::Sequence),
            Err(QuillError::Runtime(_))
        ));
        let limit = format!("1..{MAX_EXPANSION}");
        assert!(convert(&limit, ParamType::Sequence).is_ok());
    }

    #[test]
    fn test_sequence_from_markup_list() {
        let value = convert("- a\n- b", ParamType::Sequence).unwrap();
        assert_eq!(
            value,
            Value::Sequence(vec![
                Value::Dynamic("a".to_string()),
                Value::Dynamic("b".to_string())
            ])
        );
        assert!(convert("just text", ParamType::Sequence).is_err());
    }

    #[test]
    fn test_none_passes_through() {
        let mut ctx = Context::default();
        assert_eq!(
            ParamType::Number.convert(Value::None, &mut ctx).unwrap(),
            Value::None
        );
    }

    #[test]
    fn test_number_display() {
        assert_eq!(Value::Number(3.0).to_text(), "3");
        assert_eq!(Value::Number(2.5).to_text(), "2.5");
        assert_eq!(
            Value::Sequence(vec![Value::Number(1.0), Value::from("a")]).to_text(),
            "1, a"
        );
    }

    #[test]
    fn test_string_conversion_of_scalars() {
        let mut ctx = Context::default();
        assert_eq!(
            ParamType::String
                .convert(Value::Number(4.0), &mut ctx)
                .unwrap(),
            Value::String("4".to_string())
        );
    }
}
