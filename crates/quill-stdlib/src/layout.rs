//! Layout blocks
//!
//! Every function here wraps its body in a single node; how the node is
//! laid out is up to the renderer.

use quill_ast::{
    Alignment, BoxKind, BoxNode, Container, Figure, Node, NodeKind, StackOrientation, Stacked,
    TableOfContents,
};
use quill_core::function::{Arguments, Function, Parameter};
use quill_core::value::{ParamType, Value};
use quill_core::Result;

const ALIGNMENTS: &[&str] = &["start", "center", "end"];
const BOX_KINDS: &[&str] = &["callout", "tip", "note", "warning", "error"];

/// Depth used by `.tableofcontents` when none is given
const DEFAULT_TOC_DEPTH: f64 = 3.0;

pub(crate) fn functions() -> Vec<Function> {
    vec![
        Function::new("container", |call| {
            let container = Container {
                alignment: call.args.opt_enumeration("alignment").and_then(alignment),
                full_width: call.args.opt_boolean("fullwidth").unwrap_or(false),
                class_name: call.args.opt_string("classname").map(str::to_string),
            };
            let body = call.args.opt_content("body").unwrap_or_default();
            Ok(wrap(NodeKind::Container(container), body))
        })
        .optional("alignment", ParamType::Enum(ALIGNMENTS))
        .optional("fullwidth", ParamType::Boolean)
        .optional("classname", ParamType::String)
        .parameter(Parameter::new("body", ParamType::Content).body().optional()),
        Function::new("align", |call| {
            let alignment = call.args.opt_enumeration("alignment").and_then(alignment);
            aligned(alignment, &call.args)
        })
        .param("alignment", ParamType::Enum(ALIGNMENTS))
        .body("body", ParamType::Content),
        Function::new("center", |call| aligned(Some(Alignment::Center), &call.args))
            .body("body", ParamType::Content),
        stack("row", StackOrientation::Row),
        stack("column", StackOrientation::Column),
        Function::new("box", |call| {
            let kind = match call.args.opt_enumeration("type") {
                Some(name) => box_kind(name),
                None => BoxKind::Callout,
            };
            let node = BoxNode {
                title: call.args.opt_string("title").map(str::to_string),
                kind,
            };
            Ok(wrap(NodeKind::Box(node), call.args.content("body")?))
        })
        .optional("title", ParamType::String)
        .optional("type", ParamType::Enum(BOX_KINDS))
        .body("body", ParamType::Content),
        Function::new("figure", |call| {
            let figure = Figure {
                caption: call.args.opt_string("caption").map(str::to_string),
                label: call.args.opt_string("label").map(str::to_string),
            };
            Ok(wrap(NodeKind::Figure(figure), call.args.content("body")?))
        })
        .optional("caption", ParamType::String)
        .optional("label", ParamType::String)
        .body("body", ParamType::Content),
        Function::new("pagebreak", |_| {
            Ok(Value::Content(vec![Node::new(NodeKind::PageBreak)]))
        }),
        Function::new("tableofcontents", |call| {
            let toc = TableOfContents {
                title: call.args.opt_string("title").map(str::to_string),
                max_depth: call.args.count("maxdepth")?.clamp(1, 6) as u8,
                focus: call.args.opt_string("focus").map(str::to_string),
            };
            Ok(Value::Content(vec![Node::new(NodeKind::TableOfContents(toc))]))
        })
        .optional("title", ParamType::String)
        .defaulted("maxdepth", ParamType::Number, DEFAULT_TOC_DEPTH)
        .optional("focus", ParamType::String),
    ]
}

fn wrap(kind: NodeKind, body: Vec<Node>) -> Value {
    Value::Content(vec![Node::with_children(kind, body)])
}

fn aligned(alignment: Option<Alignment>, args: &Arguments) -> Result<Value> {
    let container = Container {
        alignment,
        full_width: false,
        class_name: None,
    };
    Ok(wrap(NodeKind::Container(container), args.content("body")?))
}

/// `.row` and `.column`
fn stack(name: &str, orientation: StackOrientation) -> Function {
    Function::new(name, move |call| {
        let stacked = Stacked {
            orientation,
            alignment: call.args.opt_enumeration("alignment").and_then(alignment),
            gap: call.args.opt_string("gap").map(str::to_string),
        };
        Ok(wrap(NodeKind::Stacked(stacked), call.args.content("body")?))
    })
    .optional("alignment", ParamType::Enum(ALIGNMENTS))
    .optional("gap", ParamType::String)
    .body("body", ParamType::Content)
}

fn alignment(name: &str) -> Option<Alignment> {
    match name {
        "start" => Some(Alignment::Start),
        "center" => Some(Alignment::Center),
        "end" => Some(Alignment::End),
        _ => None,
    }
}

fn box_kind(name: &str) -> BoxKind {
    match name {
        "tip" => BoxKind::Tip,
        "note" => BoxKind::Note,
        "warning" => BoxKind::Warning,
        "error" => BoxKind::Error,
        _ => BoxKind::Callout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::context;

    fn block(source: &str) -> Node {
        let mut ctx = context();
        let mut nodes = ctx.parse_blocks(source).unwrap();
        assert!(ctx.diagnostics().is_empty(), "{:?}", ctx.diagnostics());
        assert_eq!(nodes.len(), 1);
        // unwrap the call output
        let mut output = nodes.remove(0);
        assert!(matches!(output.kind, NodeKind::FunctionCallOutput { .. }));
        output.children.remove(0)
    }

    #[test]
    fn test_box_with_body() {
        let node = block(".box {Heads up} type:{warning}\n  Mind the **gap**.\n");
        assert_eq!(
            node.kind,
            NodeKind::Box(BoxNode {
                title: Some("Heads up".to_string()),
                kind: BoxKind::Warning,
            })
        );
        assert_eq!(node.children[0].kind, NodeKind::Paragraph);
        assert_eq!(node.plain_text(), "Mind the gap.");
    }

    #[test]
    fn test_center_inline_argument() {
        let node = block(".center {text}\n");
        match node.kind {
            NodeKind::Container(container) => {
                assert_eq!(container.alignment, Some(Alignment::Center));
            }
            other => panic!("expected a container, got {other:?}"),
        }
    }

    #[test]
    fn test_row_and_empty_container() {
        let node = block(".row alignment:{end} gap:{1cm}\n  a\n\n  b\n");
        assert_eq!(
            node.kind,
            NodeKind::Stacked(Stacked {
                orientation: StackOrientation::Row,
                alignment: Some(Alignment::End),
                gap: Some("1cm".to_string()),
            })
        );
        assert_eq!(node.children.len(), 2);

        let node = block(".container fullwidth:{yes} classname:{hero}\n");
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_figure_is_tracked() {
        let node = block(".figure caption:{Results} label:{results}\n  Some content\n");
        assert_eq!(node.kind.label(), Some("results"));
        assert!(node.kind.trackable_kind().is_some());
    }

    #[test]
    fn test_tableofcontents_defaults() {
        let node = block(".tableofcontents\n");
        assert_eq!(
            node.kind,
            NodeKind::TableOfContents(TableOfContents {
                title: None,
                max_depth: 3,
                focus: None,
            })
        );
        let node = block(".tableofcontents {Contents} maxdepth:{9}\n");
        match node.kind {
            NodeKind::TableOfContents(toc) => assert_eq!(toc.max_depth, 6),
            other => panic!("expected a table of contents, got {other:?}"),
        }
    }
}
