//! Small text helpers shared by the lexer, walker and parser

/// Remove the common leading indentation of all non-blank lines.
///
/// Leading and trailing blank lines are dropped. Tabs count as one column.
pub fn trim_indent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let first = lines.iter().position(|line| !line.trim().is_empty());
    let last = lines.iter().rposition(|line| !line.trim().is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return String::new();
    };
    let lines = &lines[first..=last];

    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| leading_whitespace(line))
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                &line[indent..]
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Byte length of the leading spaces and tabs of `line`
pub fn leading_whitespace(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// Whether a line is indented enough to continue a block call's body
pub fn is_body_indented(line: &str) -> bool {
    line.starts_with("  ") || line.starts_with('\t')
}

/// Byte offset just past the end of the line containing `pos`
/// (after its newline, if any)
pub fn line_end(text: &str, pos: usize) -> usize {
    match text[pos..].find('\n') {
        Some(offset) => pos + offset + 1,
        None => text.len(),
    }
}

/// The line starting at `pos`, without its newline
pub fn line_at(text: &str, pos: usize) -> &str {
    let end = line_end(text, pos);
    text[pos..end].trim_end_matches(['\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_indent() {
        assert_eq!(trim_indent("\n    a\n      b\n    c\n"), "a\n  b\nc");
    }

    #[test]
    fn test_trim_indent_keeps_inner_blank_lines() {
        assert_eq!(trim_indent("  a\n\n  b"), "a\n\nb");
    }

    #[test]
    fn test_trim_indent_blank() {
        assert_eq!(trim_indent("   \n  "), "");
    }

    #[test]
    fn test_line_helpers() {
        let text = "one\ntwo\nthree";
        assert_eq!(line_end(text, 0), 4);
        assert_eq!(line_at(text, 4), "two");
        assert_eq!(line_end(text, 8), text.len());
    }

    #[test]
    fn test_body_indentation() {
        assert!(is_body_indented("  x"));
        assert!(is_body_indented("\tx"));
        assert!(!is_body_indented(" x"));
    }
}
