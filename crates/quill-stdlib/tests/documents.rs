//! Whole documents written against the standard library

use quill_ast::{Node, NodeKind};
use quill_core::document::DocumentType;
use quill_core::Context;

fn context() -> Context {
    let mut ctx = Context::default();
    ctx.load_library(&quill_stdlib::library()).unwrap();
    ctx
}

fn text(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(Node::plain_text)
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_metadata_block() {
    let mut ctx = context();
    let source = "\
.docname {Quarterly report}
.doctype {paged}
.doclang {de}
.docauthor {Ada}

# Einleitung
";
    let nodes = ctx.parse_blocks(source).unwrap();
    assert!(ctx.diagnostics().is_empty());
    assert_eq!(ctx.document.doc_type, DocumentType::Paged);
    assert_eq!(ctx.document.name.as_deref(), Some("Quarterly report"));
    assert_eq!(ctx.localize("figure"), Some("Abbildung"));
    assert_eq!(nodes.len(), 1);
}

#[test]
fn test_user_function_with_block_body() {
    let mut ctx = context();
    let source = "\
.function {greet}
  name greeting?:
  .greeting::otherwise {Hello}, .name!

.greet {Ada}

.greet {Grace} greeting:{Hi}
";
    let nodes = ctx.parse_blocks(source).unwrap();
    assert!(ctx.diagnostics().is_empty(), "{:?}", ctx.diagnostics());
    assert_eq!(text(&nodes), "Hello, Ada!\nHi, Grace!");
}

#[test]
fn test_foreach_builds_content() {
    let mut ctx = context();
    let source = "\
.foreach {1..3}
  n:
  Item .n is .if {.iseven {.n}} {even}::otherwise {odd}
";
    let nodes = ctx.parse_blocks(source).unwrap();
    assert!(ctx.diagnostics().is_empty(), "{:?}", ctx.diagnostics());
    assert_eq!(text(&nodes), "Item 1 is oddItem 2 is evenItem 3 is odd");
}

#[test]
fn test_nested_layout() {
    let mut ctx = context();
    let source = "\
.box {Note} type:{tip}
  .row
    First

    Second
";
    let nodes = ctx.parse_blocks(source).unwrap();
    assert!(ctx.diagnostics().is_empty(), "{:?}", ctx.diagnostics());
    let boxed = &nodes[0].children[0];
    assert!(matches!(boxed.kind, NodeKind::Box(_)));
    let output = &boxed.children[0];
    assert!(matches!(output.kind, NodeKind::FunctionCallOutput { .. }));
    assert!(matches!(output.children[0].kind, NodeKind::Stacked(_)));
    assert_eq!(output.children[0].children.len(), 2);
}

#[test]
fn test_failed_call_does_not_stop_the_document() {
    let mut ctx = context();
    let source = "Before .divide {1} by:{0} after\n\n.sum {1}\n\nStill here\n";
    let nodes = ctx.parse_blocks(source).unwrap();
    assert_eq!(ctx.diagnostics().len(), 2);
    assert_eq!(nodes.last().map(Node::plain_text).as_deref(), Some("Still here"));
}
