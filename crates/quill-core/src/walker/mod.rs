//! Function-call walker
//!
//! Turns the text span of a call site into a [`WalkedFunctionCall`] chain.
//!
//! # Syntax
//!
//! - `.name` calls a function; the identifier follows [`IDENTIFIER_PATTERN`]
//! - `{value}` is a positional argument, `name:{value}` a named one
//! - braces inside a value must balance; `\{` and `\}` do not count
//! - `::` chains another call, which receives the previous result first
//! - a block call may be followed by a body: the next lines indented by at
//!   least two spaces or a tab
//!
//! Argument values are kept verbatim: nested calls inside them are left for
//! the expression evaluator.
//!
//! # Example
//!
//! ```
//! use quill_core::walker::{walk, CallMode};
//!
//! let walked = walk(".sum {1} {2}::multiply by:{3}", CallMode::Inline).unwrap();
//! assert_eq!(walked.call.name, "sum");
//! assert_eq!(walked.call.chain_len(), 2);
//! ```

use std::fmt;

use once_cell::sync::Lazy;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use regex::Regex;

use crate::error::{Position, QuillError};
use crate::text::{is_body_indented, line_at, line_end, trim_indent};

/// Identifier of a callable, shared with every tool that spots call sites
pub const IDENTIFIER_PATTERN: &str = r"[A-Za-z][A-Za-z0-9_]*";

/// Character opening a call site
pub const CALL_PREFIX: char = '.';

/// Operator chaining a call onto the previous one
pub const CHAIN_SEPARATOR: &str = "::";

#[derive(Parser)]
#[grammar = "walker/call.pest"]
struct CallGrammar;

static NAMED_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{IDENTIFIER_PATTERN}:")).unwrap());

/// Whether a call is a block of its own or sits within a paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Starts a line and may carry an indented body
    Block,
    /// Part of running text; bodies are not allowed
    Inline,
}

/// One argument as written in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFunctionArgument {
    /// Name for `name:{value}` arguments
    pub name: Option<String>,
    /// Raw text, de-indented and trimmed
    pub value: String,
}

impl WalkedFunctionArgument {
    /// A positional argument
    pub fn positional(value: impl Into<String>) -> Self {
        Self {
            name: None,
            value: value.into(),
        }
    }

    /// A named argument
    pub fn named(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }
}

/// One parsed call, linked to the call chained after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFunctionCall {
    pub name: String,
    pub arguments: Vec<WalkedFunctionArgument>,
    /// Indented body; only ever set on the last link of a chain
    pub body: Option<WalkedFunctionArgument>,
    pub next: Option<Box<WalkedFunctionCall>>,
}

impl WalkedFunctionCall {
    /// Iterate over the links of the chain in source order
    pub fn links(&self) -> impl Iterator<Item = &WalkedFunctionCall> {
        std::iter::successors(Some(self), |call| call.next.as_deref())
    }

    /// Number of calls in the chain
    pub fn chain_len(&self) -> usize {
        self.links().count()
    }

    /// Serialize back to canonical call syntax
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        let mut body = None;
        for (index, call) in self.links().enumerate() {
            if index == 0 {
                out.push(CALL_PREFIX);
            } else {
                out.push_str(CHAIN_SEPARATOR);
            }
            out.push_str(&call.name);
            for argument in &call.arguments {
                out.push(' ');
                if let Some(name) = &argument.name {
                    out.push_str(name);
                    out.push(':');
                }
                out.push('{');
                out.push_str(&argument.value);
                out.push('}');
            }
            if call.body.is_some() {
                body = call.body.as_ref();
            }
        }
        if let Some(body) = body {
            for line in body.value.lines() {
                out.push('\n');
                if !line.is_empty() {
                    out.push_str("    ");
                    out.push_str(line);
                }
            }
        }
        out
    }
}

/// A walked call and how many bytes of input it spans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walked {
    pub call: WalkedFunctionCall,
    /// Bytes consumed from the start of the input
    pub consumed: usize,
}

/// What went wrong while walking a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkErrorKind {
    /// An argument's opening brace is never closed
    UnterminatedArgument,
    /// An identifier runs into a character it may not contain
    IllegalIdentifier,
    /// `name:` without a value directly after it
    MissingNamedValue,
    /// A body below an inline call
    UnexpectedBody,
    /// The input does not start with a call
    NotACall,
}

impl WalkErrorKind {
    /// Lexical errors are the ones detected when delimiting a token
    pub fn is_lexical(self) -> bool {
        matches!(
            self,
            WalkErrorKind::UnterminatedArgument | WalkErrorKind::IllegalIdentifier
        )
    }
}

/// A walker failure at a byte offset of the walked input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkError {
    pub kind: WalkErrorKind,
    pub offset: usize,
    pub message: String,
}

impl WalkError {
    fn new(kind: WalkErrorKind, offset: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            offset,
            message: message.into(),
        }
    }

    /// Convert into a compilation error, locating it within `source` where
    /// the walked input started at byte `base`
    pub fn into_error(self, source: &str, base: usize) -> QuillError {
        let position = Position::locate(source, base + self.offset);
        if self.kind.is_lexical() {
            QuillError::Lexical {
                position,
                message: self.message,
            }
        } else {
            QuillError::Walker {
                position,
                message: self.message,
            }
        }
    }
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.offset)
    }
}

/// Walk the call chain at the start of `input`
pub fn walk(input: &str, mode: CallMode) -> Result<Walked, WalkError> {
    let chain = CallGrammar::parse(Rule::chain, input)
        .map_err(|err| WalkError::new(WalkErrorKind::NotACall, 0, err.to_string()))?
        .next()
        .ok_or_else(|| WalkError::new(WalkErrorKind::NotACall, 0, "expected a call"))?;
    let head_end = chain.as_span().end();
    let links: Vec<WalkedFunctionCall> = chain.into_inner().map(walk_link).collect();

    check_tail(input, head_end)?;
    let (mut body, consumed) = scan_body(input, head_end, mode)?;

    let mut chained: Option<WalkedFunctionCall> = None;
    for mut link in links.into_iter().rev() {
        if chained.is_none() {
            link.body = body.take();
        }
        link.next = chained.map(Box::new);
        chained = Some(link);
    }
    let call =
        chained.ok_or_else(|| WalkError::new(WalkErrorKind::NotACall, 0, "expected a call"))?;
    Ok(Walked { call, consumed })
}

fn walk_link(pair: Pair<'_, Rule>) -> WalkedFunctionCall {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .map(|identifier| identifier.as_str().to_string())
        .unwrap_or_default();
    WalkedFunctionCall {
        name,
        arguments: inner.map(walk_argument).collect(),
        body: None,
        next: None,
    }
}

fn walk_argument(pair: Pair<'_, Rule>) -> WalkedFunctionArgument {
    let mut argument = WalkedFunctionArgument::positional("");
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::identifier => argument.name = Some(part.as_str().to_string()),
            Rule::value => argument.value = trim_indent(part.as_str()).trim().to_string(),
            _ => {}
        }
    }
    argument
}

/// Reject what the grammar silently stops at but is clearly a broken call
fn check_tail(input: &str, head_end: usize) -> Result<(), WalkError> {
    let rest = &input[head_end..];
    if let Some(next) = rest.chars().next() {
        if next.is_alphanumeric() && !next.is_ascii() {
            return Err(WalkError::new(
                WalkErrorKind::IllegalIdentifier,
                head_end,
                format!("illegal character '{next}' in function name"),
            ));
        }
    }

    let trimmed = rest.trim_start_matches([' ', '\t']);
    let offset = head_end + (rest.len() - trimmed.len());
    let after_name = match NAMED_PREFIX.find(trimmed) {
        Some(name) => {
            let after = &trimmed[name.end()..];
            let dangling = after.is_empty()
                || after.starts_with('\n')
                || after.starts_with("\r\n")
                || (after.starts_with([' ', '\t'])
                    && after.trim_start_matches([' ', '\t']).starts_with('{'));
            if dangling {
                return Err(WalkError::new(
                    WalkErrorKind::MissingNamedValue,
                    offset,
                    format!(
                        "named argument '{}' has no value",
                        &name.as_str()[..name.as_str().len() - 1]
                    ),
                ));
            }
            after
        }
        None => trimmed,
    };
    if after_name.starts_with('{') {
        return Err(WalkError::new(
            WalkErrorKind::UnterminatedArgument,
            offset,
            "unterminated argument: missing '}'",
        ));
    }
    Ok(())
}

/// Scan the indented body following the call's line, if any
fn scan_body(
    input: &str,
    head_end: usize,
    mode: CallMode,
) -> Result<(Option<WalkedFunctionArgument>, usize), WalkError> {
    let body_start = line_end(input, head_end);
    if !input[head_end..body_start].trim().is_empty() || body_start >= input.len() {
        return Ok((None, head_end));
    }

    let mut pos = body_start;
    let mut body_end = None;
    while pos < input.len() {
        let line = line_at(input, pos);
        if !line.trim().is_empty() {
            if !is_body_indented(line) {
                break;
            }
            body_end = Some(pos + line.len());
        }
        pos = line_end(input, pos);
    }

    let Some(body_end) = body_end else {
        return Ok((None, head_end));
    };
    if mode == CallMode::Inline {
        return Err(WalkError::new(
            WalkErrorKind::UnexpectedBody,
            body_start,
            "an inline function call cannot have a body",
        ));
    }
    let value = trim_indent(&input[body_start..body_end]).trim_end().to_string();
    Ok((
        Some(WalkedFunctionArgument::positional(value)),
        body_end,
    ))
}
