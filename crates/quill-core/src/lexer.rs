//! Lexer
//!
//! Splits source text into tokens that cover the whole input, with no gaps
//! and no overlaps. Lexing happens on two levels:
//!
//! - [`tokenize`] cuts the source into block tokens, one per markup block,
//!   with block-level function calls as their own tokens
//! - [`tokenize_inline`] cuts the text of a paragraph-like block into inline
//!   tokens, including inline function calls
//!
//! Call sites are delimited with the [`crate::walker`], so unterminated
//! arguments and illegal identifiers are reported here and abort
//! compilation.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::text::{leading_whitespace, line_at, line_end};
use crate::walker::{walk, CallMode};

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}#{1,6}!?(?:[ \t]|$)").unwrap());
pub(crate) static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^( {0,3})([-*+]|\d{1,9}[.)])(?:[ \t]+|$)").unwrap());
pub(crate) static LINK_DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^ {0,3}\[([^\]]+)\]:[ \t]*(\S+)(?:[ \t]+"([^"]*)")?[ \t]*$"#).unwrap()
});
static TABLE_DELIMITER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*\|?[ \t]*:?-+:?[ \t]*(?:\|[ \t]*:?-+:?[ \t]*)*\|?[ \t]*$").unwrap()
});
pub(crate) static TABLE_CAPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[ \t]*"(.*)"[ \t]*(?:\{#([^}\s]+)\})?[ \t]*$"#).unwrap());
static BLOCK_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}\.[A-Za-z]").unwrap());

/// Kind of a block-level token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// One or more blank lines
    BlankLines,
    /// `#` to `######`, `#!` for decorative headings
    Heading,
    /// ```` ``` ```` or `~~~` fenced code
    FencedCode,
    /// `$$` display math
    MathBlock,
    /// `>` quoted lines
    BlockQuote,
    /// Consecutive list items with their continuation lines
    List,
    /// Pipe table, with an optional caption line
    Table,
    /// `---`, `***` or `___`
    HorizontalRule,
    /// `<<<`
    PageBreak,
    /// `[label]: url "title"`
    LinkDefinition,
    /// Anything else
    Paragraph,
    /// A call site, with its body if any
    FunctionCall(CallMode),
}

/// A block-level token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte range within the source
    pub span: Range<usize>,
}

impl Token {
    /// The source text of this token
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }
}

/// Cut `source` into block tokens
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut lexer = BlockLexer {
        source,
        pos: 0,
        tokens: Vec::new(),
    };
    while lexer.pos < source.len() {
        lexer.next_block()?;
    }
    Ok(lexer.tokens)
}

struct BlockLexer<'a> {
    source: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl BlockLexer<'_> {
    fn push(&mut self, kind: TokenKind, end: usize) {
        self.tokens.push(Token {
            kind,
            span: self.pos..end,
        });
        self.pos = end;
    }

    fn line(&self, pos: usize) -> &str {
        line_at(self.source, pos)
    }

    fn next_line_start(&self, pos: usize) -> usize {
        line_end(self.source, pos)
    }

    fn next_block(&mut self) -> Result<()> {
        let line = self.line(self.pos);

        if line.trim().is_empty() {
            let mut end = self.next_line_start(self.pos);
            while end < self.source.len() && self.line(end).trim().is_empty() {
                end = self.next_line_start(end);
            }
            self.push(TokenKind::BlankLines, end);
            return Ok(());
        }
        if let Some(fence) = fence_open(line) {
            let end = self.scan_fence(fence);
            self.push(TokenKind::FencedCode, end);
            return Ok(());
        }
        if is_math_open(line) {
            let end = self.scan_math();
            self.push(TokenKind::MathBlock, end);
            return Ok(());
        }
        if HEADING.is_match(line) {
            let end = self.next_line_start(self.pos);
            self.push(TokenKind::Heading, end);
            return Ok(());
        }
        if is_horizontal_rule(line) {
            let end = self.next_line_start(self.pos);
            self.push(TokenKind::HorizontalRule, end);
            return Ok(());
        }
        if line.trim() == "<<<" {
            let end = self.next_line_start(self.pos);
            self.push(TokenKind::PageBreak, end);
            return Ok(());
        }
        if let Some(end) = self.scan_block_call(self.pos)? {
            self.push(TokenKind::FunctionCall(CallMode::Block), end);
            return Ok(());
        }
        if LINK_DEFINITION.is_match(line) {
            let end = self.next_line_start(self.pos);
            self.push(TokenKind::LinkDefinition, end);
            return Ok(());
        }
        if is_block_quote(line) {
            let mut end = self.next_line_start(self.pos);
            while end < self.source.len() && is_block_quote(self.line(end)) {
                end = self.next_line_start(end);
            }
            self.push(TokenKind::BlockQuote, end);
            return Ok(());
        }
        if let Some(ordered) = list_marker(line) {
            let end = self.scan_list(ordered);
            self.push(TokenKind::List, end);
            return Ok(());
        }
        if self.is_table_start(self.pos) {
            let end = self.scan_table();
            self.push(TokenKind::Table, end);
            return Ok(());
        }

        let end = self.scan_paragraph();
        self.push(TokenKind::Paragraph, end);
        Ok(())
    }

    /// End of a block call starting on the line at `pos`, when the call is
    /// alone on its line
    fn scan_block_call(&self, pos: usize) -> Result<Option<usize>> {
        let line = self.line(pos);
        if !BLOCK_CALL.is_match(line) {
            return Ok(None);
        }
        let call_start = pos + leading_whitespace(line);
        let walked = walk(&self.source[call_start..], CallMode::Block)
            .map_err(|err| err.into_error(self.source, call_start))?;
        let call_end = call_start + walked.consumed;
        if walked.call.body.is_none() {
            let rest_end = self.next_line_start(call_end);
            if !self.source[call_end..rest_end].trim().is_empty() {
                return Ok(None);
            }
            return Ok(Some(rest_end));
        }
        Ok(Some(self.next_line_start(call_end)))
    }

    fn scan_fence(&self, (marker, width): (char, usize)) -> usize {
        let mut end = self.next_line_start(self.pos);
        while end < self.source.len() {
            let line = self.line(end);
            let next = self.next_line_start(end);
            if is_fence_close(line, marker, width) {
                return next;
            }
            end = next;
        }
        end
    }

    fn scan_math(&self) -> usize {
        let first = self.line(self.pos).trim();
        if first.len() > 2 && first[2..].contains("$$") {
            return self.next_line_start(self.pos);
        }
        let mut end = self.next_line_start(self.pos);
        while end < self.source.len() {
            let line = self.line(end);
            let next = self.next_line_start(end);
            if line.trim_start().starts_with("$$") {
                return next;
            }
            end = next;
        }
        end
    }

    fn scan_list(&self, ordered: bool) -> usize {
        let mut end = self.next_line_start(self.pos);
        let mut previous_blank = false;
        while end < self.source.len() {
            let line = self.line(end);
            if line.trim().is_empty() {
                let mut lookahead = self.next_line_start(end);
                while lookahead < self.source.len() && self.line(lookahead).trim().is_empty() {
                    lookahead = self.next_line_start(lookahead);
                }
                if lookahead >= self.source.len() {
                    break;
                }
                let next = self.line(lookahead);
                let continues = leading_whitespace(next) >= 2 || list_marker(next) == Some(ordered);
                if !continues {
                    break;
                }
                previous_blank = true;
                end = lookahead;
                continue;
            }
            let same_list = list_marker(line) == Some(ordered) && !is_horizontal_rule(line);
            let continuation = leading_whitespace(line) >= 2;
            let lazy = !previous_blank && !self.interrupts_paragraph(end);
            if !(same_list || continuation || lazy) {
                break;
            }
            previous_blank = false;
            end = self.next_line_start(end);
        }
        end
    }

    fn is_table_start(&self, pos: usize) -> bool {
        let line = self.line(pos);
        let next = self.next_line_start(pos);
        line.trim_start().starts_with('|')
            && next < self.source.len()
            && TABLE_DELIMITER.is_match(self.line(next))
    }

    fn scan_table(&self) -> usize {
        let mut end = self.next_line_start(self.pos);
        while end < self.source.len() && self.line(end).trim_start().starts_with('|') {
            end = self.next_line_start(end);
        }
        if end < self.source.len() && TABLE_CAPTION.is_match(self.line(end)) {
            end = self.next_line_start(end);
        }
        end
    }

    fn scan_paragraph(&self) -> usize {
        let mut end = self.next_line_start(self.pos);
        while end < self.source.len() {
            let line = self.line(end);
            if line.trim().is_empty() || self.interrupts_paragraph(end) {
                break;
            }
            end = self.next_line_start(end);
        }
        end
    }

    /// Whether the line at `pos` starts a new block even without a blank line
    fn interrupts_paragraph(&self, pos: usize) -> bool {
        let line = self.line(pos);
        fence_open(line).is_some()
            || is_math_open(line)
            || HEADING.is_match(line)
            || is_horizontal_rule(line)
            || line.trim() == "<<<"
            || is_block_quote(line)
            || list_marker(line).is_some()
            || self.is_table_start(pos)
            || matches!(self.scan_block_call(pos), Ok(Some(_)))
    }
}

fn fence_open(line: &str) -> Option<(char, usize)> {
    let indent = leading_whitespace(line);
    if indent > 3 {
        return None;
    }
    let trimmed = &line[indent..];
    let marker = trimmed.chars().next()?;
    if marker != '`' && marker != '~' {
        return None;
    }
    let width = trimmed.chars().take_while(|c| *c == marker).count();
    (width >= 3).then_some((marker, width))
}

fn is_fence_close(line: &str, marker: char, width: usize) -> bool {
    let trimmed = line.trim();
    leading_whitespace(line) <= 3
        && trimmed.chars().all(|c| c == marker)
        && trimmed.chars().count() >= width
}

fn is_math_open(line: &str) -> bool {
    leading_whitespace(line) <= 3 && line.trim_start().starts_with("$$")
}

fn is_horizontal_rule(line: &str) -> bool {
    if leading_whitespace(line) > 3 {
        return false;
    }
    let mut marker = None;
    let mut count = 0;
    for c in line.chars().filter(|c| !c.is_whitespace()) {
        match marker {
            None if matches!(c, '-' | '*' | '_') => marker = Some(c),
            Some(m) if m == c => {}
            _ => return false,
        }
        count += 1;
    }
    count >= 3
}

fn is_block_quote(line: &str) -> bool {
    leading_whitespace(line) <= 3 && line.trim_start().starts_with('>')
}

/// `Some(ordered)` when the line starts a list item
fn list_marker(line: &str) -> Option<bool> {
    LIST_MARKER.captures(line).map(|caps| {
        caps.get(2)
            .map(|marker| marker.as_str().ends_with(['.', ')']))
            .unwrap_or(false)
    })
}

/// Kind of an inline token; ranges are relative to the tokenized text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineTokenKind {
    /// Plain text
    Text,
    /// `\` followed by an ASCII punctuation character
    Escape,
    /// `` `code` ``
    CodeSpan { content: Range<usize> },
    /// `$math$`
    Math { content: Range<usize> },
    /// `**strong**` or `__strong__`
    Strong { content: Range<usize> },
    /// `*emphasis*` or `_emphasis_`
    Emphasis { content: Range<usize> },
    /// `~~strikethrough~~`
    Strikethrough { content: Range<usize> },
    /// `[label](destination)`
    Link {
        label: Range<usize>,
        destination: Range<usize>,
    },
    /// `![alt](destination)`
    Image {
        alt: Range<usize>,
        destination: Range<usize>,
    },
    /// `[text][reference]`; an empty reference means the text is the label
    ReferenceLink {
        text: Range<usize>,
        reference: Range<usize>,
    },
    /// Two trailing spaces or a backslash before a newline
    LineBreak,
    /// A call site
    FunctionCall(CallMode),
}

/// An inline token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineToken {
    pub kind: InlineTokenKind,
    pub span: Range<usize>,
}

/// Cut the text of a paragraph-like block into inline tokens
pub fn tokenize_inline(text: &str) -> Result<Vec<InlineToken>> {
    let mut tokens: Vec<InlineToken> = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let token = match scan_inline(text, pos)? {
            Some(token) => token,
            None => {
                let width = text[pos..].chars().next().map_or(1, char::len_utf8);
                InlineToken {
                    kind: InlineTokenKind::Text,
                    span: pos..pos + width,
                }
            }
        };
        pos = token.span.end;
        match tokens.last_mut() {
            Some(last)
                if last.kind == InlineTokenKind::Text && token.kind == InlineTokenKind::Text =>
            {
                last.span.end = token.span.end
            }
            _ => tokens.push(token),
        }
    }
    Ok(tokens)
}

fn scan_inline(text: &str, pos: usize) -> Result<Option<InlineToken>> {
    let rest = &text[pos..];
    let token = |kind, len: usize| {
        Some(InlineToken {
            kind,
            span: pos..pos + len,
        })
    };

    if rest.starts_with("\\\n") {
        return Ok(token(InlineTokenKind::LineBreak, 2));
    }
    if rest.starts_with('\\') {
        if let Some(next) = rest[1..].chars().next() {
            if next.is_ascii_punctuation() {
                return Ok(token(InlineTokenKind::Escape, 2));
            }
        }
        return Ok(None);
    }
    if rest.starts_with("  ") {
        let spaces = rest.len() - rest.trim_start_matches(' ').len();
        if rest[spaces..].starts_with('\n') {
            return Ok(token(InlineTokenKind::LineBreak, spaces + 1));
        }
        return Ok(None);
    }
    if rest.starts_with('`') {
        return Ok(scan_code_span(text, pos));
    }
    if rest.starts_with('$') {
        return Ok(scan_math_span(text, pos));
    }
    if rest.starts_with("**") || rest.starts_with("__") {
        if let Some(token) = scan_delimited(text, pos, &rest[..2], |content| {
            InlineTokenKind::Strong { content }
        }) {
            return Ok(Some(token));
        }
    }
    if rest.starts_with("~~") {
        return Ok(scan_delimited(text, pos, "~~", |content| {
            InlineTokenKind::Strikethrough { content }
        }));
    }
    if rest.starts_with('*') || rest.starts_with('_') {
        let intraword = rest.starts_with('_') && previous_char(text, pos).is_some_and(char::is_alphanumeric);
        if intraword {
            return Ok(None);
        }
        return Ok(scan_delimited(text, pos, &rest[..1], |content| {
            InlineTokenKind::Emphasis { content }
        }));
    }
    if rest.starts_with("![") {
        return Ok(scan_link(text, pos + 1).and_then(|(label, destination, end)| {
            match destination {
                LinkTail::Inline(destination) => Some(InlineToken {
                    kind: InlineTokenKind::Image {
                        alt: label,
                        destination,
                    },
                    span: pos..end,
                }),
                LinkTail::Reference(_) => None,
            }
        }));
    }
    if rest.starts_with('[') {
        return Ok(scan_link(text, pos).map(|(label, tail, end)| {
            let kind = match tail {
                LinkTail::Inline(destination) => InlineTokenKind::Link {
                    label,
                    destination,
                },
                LinkTail::Reference(reference) => InlineTokenKind::ReferenceLink {
                    text: label,
                    reference,
                },
            };
            InlineToken {
                kind,
                span: pos..end,
            }
        }));
    }
    if is_call_site(text, pos) {
        let walked =
            walk(rest, CallMode::Inline).map_err(|err| err.into_error(text, pos))?;
        return Ok(token(
            InlineTokenKind::FunctionCall(CallMode::Inline),
            walked.consumed,
        ));
    }
    Ok(None)
}

fn previous_char(text: &str, pos: usize) -> Option<char> {
    text[..pos].chars().next_back()
}

/// Whether a call starts at `pos`: a prefix followed by a letter, preceded by
/// nothing, whitespace, or a symbol other than `.` and `\`
pub fn is_call_site(text: &str, pos: usize) -> bool {
    let rest = &text[pos..];
    if !rest.starts_with('.') || !rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
        return false;
    }
    match previous_char(text, pos) {
        None => true,
        Some(c) => c.is_whitespace() || !(c.is_alphanumeric() || c == '.' || c == '\\'),
    }
}

/// Locate every call site in `text`, skipping escapes and code spans.
///
/// A call that starts its line is walked as a block call.
pub fn scan_calls(text: &str) -> Result<Vec<(Range<usize>, CallMode)>> {
    let mut calls = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let rest = &text[pos..];
        if rest.starts_with('\\') {
            pos += 1 + rest[1..].chars().next().map_or(0, char::len_utf8);
            continue;
        }
        if rest.starts_with('`') {
            if let Some(code) = scan_code_span(text, pos) {
                pos = code.span.end;
                continue;
            }
        }
        if is_call_site(text, pos) {
            let line_start = text[..pos].rfind('\n').map_or(0, |newline| newline + 1);
            let mode = if text[line_start..pos].trim().is_empty() && pos - line_start <= 3 {
                CallMode::Block
            } else {
                CallMode::Inline
            };
            let walked = walk(rest, mode).map_err(|err| err.into_error(text, pos))?;
            calls.push((pos..pos + walked.consumed, mode));
            pos += walked.consumed.max(1);
            continue;
        }
        pos += rest.chars().next().map_or(1, char::len_utf8);
    }
    Ok(calls)
}

fn scan_code_span(text: &str, pos: usize) -> Option<InlineToken> {
    let rest = &text[pos..];
    let width = rest.len() - rest.trim_start_matches('`').len();
    let mut search = pos + width;
    while let Some(offset) = text[search..].find('`') {
        let start = search + offset;
        let run = text[start..].len() - text[start..].trim_start_matches('`').len();
        if run == width {
            return Some(InlineToken {
                kind: InlineTokenKind::CodeSpan {
                    content: pos + width..start,
                },
                span: pos..start + run,
            });
        }
        search = start + run;
    }
    None
}

fn scan_math_span(text: &str, pos: usize) -> Option<InlineToken> {
    let content_start = pos + 1;
    let first = text[content_start..].chars().next()?;
    if first.is_whitespace() || first == '$' {
        return None;
    }
    let offset = text[content_start..].find('$')?;
    let close = content_start + offset;
    if previous_char(text, close).is_some_and(char::is_whitespace) {
        return None;
    }
    Some(InlineToken {
        kind: InlineTokenKind::Math {
            content: content_start..close,
        },
        span: pos..close + 1,
    })
}

/// Find `delimiter` closing a span opened at `pos`, skipping braces and
/// escapes so call arguments never close markup
fn scan_delimited(
    text: &str,
    pos: usize,
    delimiter: &str,
    kind: impl Fn(Range<usize>) -> InlineTokenKind,
) -> Option<InlineToken> {
    let content_start = pos + delimiter.len();
    if text[content_start..].starts_with(char::is_whitespace) {
        return None;
    }
    let mut depth = 0usize;
    let mut index = content_start;
    while index < text.len() {
        let rest = &text[index..];
        if rest.starts_with('\\') {
            index += 1 + rest[1..].chars().next().map_or(0, char::len_utf8);
            continue;
        }
        match rest.chars().next() {
            Some('{') => depth += 1,
            Some('}') => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0
            && index > content_start
            && rest.starts_with(delimiter)
            && !previous_char(text, index).is_some_and(char::is_whitespace)
        {
            let single_star = delimiter.len() == 1 && rest[1..].starts_with(delimiter);
            if !single_star {
                return Some(InlineToken {
                    kind: kind(content_start..index),
                    span: pos..index + delimiter.len(),
                });
            }
            index += 2;
            continue;
        }
        index += rest.chars().next().map_or(1, char::len_utf8);
    }
    None
}

enum LinkTail {
    Inline(Range<usize>),
    Reference(Range<usize>),
}

/// Scan `[label](destination)` or `[text][reference]` starting at `pos`
fn scan_link(text: &str, pos: usize) -> Option<(Range<usize>, LinkTail, usize)> {
    let label_end = matching_close(text, pos, '[', ']')?;
    let label = pos + 1..label_end;
    let after = label_end + 1;
    match text[after..].chars().next() {
        Some('(') => {
            let close = matching_close(text, after, '(', ')')?;
            Some((label, LinkTail::Inline(after + 1..close), close + 1))
        }
        Some('[') => {
            let close = matching_close(text, after, '[', ']')?;
            Some((label, LinkTail::Reference(after + 1..close), close + 1))
        }
        _ => None,
    }
}

fn matching_close(text: &str, open_pos: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut index = open_pos;
    while index < text.len() {
        let rest = &text[index..];
        let c = rest.chars().next()?;
        if c == '\\' {
            index += 1 + rest[1..].chars().next().map_or(0, char::len_utf8);
            continue;
        }
        if c == '\n' && rest[1..].trim_start_matches([' ', '\t']).starts_with('\n') {
            return None;
        }
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
        index += c.len_utf8();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn assert_covers(source: &str) {
        let tokens = tokenize(source).unwrap();
        let mut expected = 0;
        for token in &tokens {
            assert_eq!(token.span.start, expected, "gap or overlap in {source:?}");
            expected = token.span.end;
        }
        assert_eq!(expected, source.len());
    }

    #[test]
    fn test_blocks() {
        let source = "# Title\n\nSome text\nmore text\n\n- a\n- b\n\n---\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Heading,
                TokenKind::BlankLines,
                TokenKind::Paragraph,
                TokenKind::BlankLines,
                TokenKind::List,
                TokenKind::BlankLines,
                TokenKind::HorizontalRule,
            ]
        );
        assert_covers(source);
    }

    #[test]
    fn test_block_call_with_body() {
        let source = ".center\n  Hello\n\n  World\nAfter\n";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::FunctionCall(CallMode::Block));
        assert_eq!(tokens[0].text(source), ".center\n  Hello\n\n  World\n");
        assert_eq!(tokens[1].kind, TokenKind::Paragraph);
        assert_covers(source);
    }

    #[test]
    fn test_call_followed_by_text_is_a_paragraph() {
        assert_eq!(kinds(".sum {1} {2} is three"), vec![TokenKind::Paragraph]);
    }

    #[test]
    fn test_block_call_interrupts_paragraph() {
        let source = "Text\n.pagebreak\nMore";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Paragraph,
                TokenKind::FunctionCall(CallMode::Block),
                TokenKind::Paragraph,
            ]
        );
        assert_covers(source);
    }

    #[test]
    fn test_unterminated_block_call_is_lexical_error() {
        let err = tokenize(".foo {abc\n").unwrap_err();
        assert!(matches!(err, crate::QuillError::Lexical { .. }));
    }

    #[test]
    fn test_fenced_code_and_math() {
        let source = "```rust\nlet x = 1;\n\nlet y = 2;\n```\n$$\nx^2\n$$\n";
        assert_eq!(kinds(source), vec![TokenKind::FencedCode, TokenKind::MathBlock]);
        assert_covers(source);
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        assert_eq!(kinds("```\ncode\n\nmore"), vec![TokenKind::FencedCode]);
    }

    #[test]
    fn test_table_with_caption() {
        let source = "| a | b |\n|---|:-:|\n| 1 | 2 |\n\"Numbers\" {#tab}\n\nAfter";
        assert_eq!(
            kinds(source),
            vec![TokenKind::Table, TokenKind::BlankLines, TokenKind::Paragraph]
        );
    }

    #[test]
    fn test_list_with_continuation_and_blank_lines() {
        let source = "1. one\n   continued\n\n2. two\n\nparagraph";
        assert_eq!(
            kinds(source),
            vec![TokenKind::List, TokenKind::BlankLines, TokenKind::Paragraph]
        );
    }

    #[test]
    fn test_link_definition_quote_and_page_break() {
        let source = "[home]: https://example.com \"Home\"\n> quoted\n> more\n<<<\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::LinkDefinition,
                TokenKind::BlockQuote,
                TokenKind::PageBreak
            ]
        );
    }

    fn inline_kinds(text: &str) -> Vec<InlineTokenKind> {
        tokenize_inline(text)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_inline_tokens() {
        let text = "a **b** *c* `d` $e$ ~~f~~";
        let tokens = tokenize_inline(text).unwrap();
        let covered: usize = tokens.iter().map(|t| t.span.len()).sum();
        assert_eq!(covered, text.len());
        assert!(matches!(tokens[1].kind, InlineTokenKind::Strong { .. }));
        assert!(matches!(tokens[3].kind, InlineTokenKind::Emphasis { .. }));
        assert!(matches!(tokens[5].kind, InlineTokenKind::CodeSpan { .. }));
        assert!(matches!(tokens[7].kind, InlineTokenKind::Math { .. }));
        assert!(matches!(tokens[9].kind, InlineTokenKind::Strikethrough { .. }));
    }

    #[test]
    fn test_inline_call() {
        let text = "Total: .sum {1} {2}!";
        let tokens = tokenize_inline(text).unwrap();
        assert_eq!(tokens[1].kind, InlineTokenKind::FunctionCall(CallMode::Inline));
        assert_eq!(&text[tokens[1].span.clone()], ".sum {1} {2}");
    }

    #[test]
    fn test_dots_inside_words_are_not_calls() {
        assert_eq!(inline_kinds("e.g. v1.2 and ...more"), vec![InlineTokenKind::Text]);
    }

    #[test]
    fn test_emphasis_ignores_delimiters_inside_arguments() {
        let text = "*.multiply {2} by:{3*4}*";
        let tokens = tokenize_inline(text).unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0].kind, InlineTokenKind::Emphasis { .. }));
    }

    #[test]
    fn test_links_and_images() {
        let text = "[site](https://x.io) ![cat](cat.png \"A cat\") [docs][ref]";
        let kinds = inline_kinds(text);
        assert!(matches!(kinds[0], InlineTokenKind::Link { .. }));
        assert!(matches!(kinds[2], InlineTokenKind::Image { .. }));
        assert!(matches!(kinds[4], InlineTokenKind::ReferenceLink { .. }));
    }

    #[test]
    fn test_escape_and_line_break() {
        let kinds = inline_kinds("a\\*b  \nc");
        assert_eq!(
            kinds,
            vec![
                InlineTokenKind::Text,
                InlineTokenKind::Escape,
                InlineTokenKind::Text,
                InlineTokenKind::LineBreak,
                InlineTokenKind::Text,
            ]
        );
    }

    #[test]
    fn test_scan_calls_modes() {
        let text = "x .a {1}\n.b\n  body";
        let calls = scan_calls(text).unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1, CallMode::Inline);
        assert_eq!(calls[1].1, CallMode::Block);
        assert_eq!(&text[calls[1].0.clone()], ".b\n  body");
    }

    #[test]
    fn test_scan_calls_skips_code() {
        assert!(scan_calls("`.notacall` \\.neither").unwrap().is_empty());
    }
}
