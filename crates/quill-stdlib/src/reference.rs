//! Cross-references, citations and the bibliography

use quill_ast::{BibliographyView, Citation, CrossReference, Node, NodeKind};
use quill_core::function::Function;
use quill_core::value::{ParamType, Value};
use tracing::info;

pub(crate) fn functions() -> Vec<Function> {
    vec![
        Function::new("ref", |call| {
            let label = call.args.string("label")?.trim().to_string();
            Ok(inline(NodeKind::CrossReference(CrossReference { label })))
        })
        .param("label", ParamType::String),
        Function::new("cite", |call| {
            let keys = call
                .args
                .string("keys")?
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string)
                .collect();
            Ok(inline(NodeKind::Citation(Citation { keys })))
        })
        .param("keys", ParamType::String),
        Function::new("bibliography", |call| {
            let path = call.args.string("path")?.to_string();
            let source = call.ctx.load_bibliography(&path)?;
            info!(path = %path, source, "bibliography loaded");

            let view = BibliographyView {
                title: call.args.opt_string("title").map(str::to_string),
                source,
            };
            Ok(Value::Content(vec![Node::new(NodeKind::BibliographyView(view))]))
        })
        .param("path", ParamType::String)
        .optional("title", ParamType::String),
    ]
}

fn inline(kind: NodeKind) -> Value {
    Value::Content(vec![Node::new(kind)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{Context, MemoryLoader, QuillError};

    const BIB: &str = "@book{knuth, author = {Donald Knuth}, title = {TAOCP}, year = 1968}";
    const MORE: &str = "@book{wirth, author = {Niklaus Wirth}, title = {AD}}";

    fn context() -> Context {
        let loader = MemoryLoader::new().with("refs.bib", BIB).with("more.bib", MORE);
        let mut ctx = Context::new(loader);
        ctx.load_library(&crate::library()).unwrap();
        ctx
    }

    #[test]
    fn test_ref_and_cite_nodes() {
        let mut ctx = context();
        let nodes = ctx.parse_inlines("See .ref {intro} and .cite {a, b,}.").unwrap();
        let kinds: Vec<&NodeKind> = nodes
            .iter()
            .flat_map(|output| &output.children)
            .map(|n| &n.kind)
            .collect();
        assert!(kinds.contains(&&NodeKind::CrossReference(CrossReference {
            label: "intro".to_string()
        })));
        assert!(kinds.contains(&&NodeKind::Citation(Citation {
            keys: vec!["a".to_string(), "b".to_string()]
        })));
    }

    #[test]
    fn test_bibliography_is_loaded() {
        let mut ctx = context();
        let nodes = ctx.parse_blocks(".bibliography {refs.bib} title:{Sources}\n").unwrap();
        assert_eq!(ctx.bibliography(0).map(|b| b.len()), Some(1));
        assert_eq!(
            nodes[0].children[0].kind,
            NodeKind::BibliographyView(BibliographyView {
                title: Some("Sources".to_string()),
                source: 0,
            })
        );
    }

    #[test]
    fn test_each_view_keeps_its_source() {
        let mut ctx = context();
        let nodes = ctx
            .parse_blocks(".bibliography {refs.bib}\n\n.bibliography {more.bib}\n")
            .unwrap();
        let sources: Vec<usize> = nodes
            .iter()
            .flat_map(|output| &output.children)
            .filter_map(|node| match &node.kind {
                NodeKind::BibliographyView(view) => Some(view.source),
                _ => None,
            })
            .collect();
        assert_eq!(sources, vec![0, 1]);
        assert!(ctx.knows_citation("knuth"));
        assert!(ctx.knows_citation("wirth"));
    }

    #[test]
    fn test_missing_bibliography_aborts() {
        let mut ctx = context();
        assert!(matches!(
            ctx.parse_blocks(".bibliography {missing.bib}\n"),
            Err(QuillError::Resource { .. })
        ));
    }
}
