//! Markup parser
//!
//! Builds owned [`quill_ast::Node`] trees from lexer tokens. Function calls
//! are expanded on the spot through the [`crate::engine`], so the nodes a
//! call produces sit exactly where the call was written.
//!
//! # Supported syntax
//!
//! - headings `#`..`######`, `{#id}` suffix, decorative `#!`
//! - paragraphs, `**strong**`, `*emphasis*`, `~~strike~~`, `` `code` ``,
//!   `$math$`, hard breaks
//! - fenced code ```` ```lang "Caption" {#label} ````
//! - display math `$$ ... $$ {#label}`
//! - block quotes, lists (with `[ ]`/`[x]` tasks), pipe tables with an
//!   optional `"Caption" {#label}` line
//! - `---` rules, `<<<` page breaks
//! - links, images, `[text][label]` references, `[label]: url "title"`
//! - figures: an image alone in a paragraph, optionally with `{#label}`

mod block;
mod inline;

use quill_ast::Node;

use crate::context::Context;
use crate::error::Result;

/// Parse block-level markup
pub fn parse_blocks(ctx: &mut Context, source: &str) -> Result<Vec<Node>> {
    let source = source.replace("\r\n", "\n");
    block::BlockParser::new(ctx, &source).parse()
}

/// Parse inline markup
pub fn parse_inlines(ctx: &mut Context, text: &str) -> Result<Vec<Node>> {
    let text = text.replace("\r\n", "\n");
    inline::parse(ctx, text.trim())
}
