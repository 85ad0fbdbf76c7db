//! Function execution
//!
//! [`expand`] turns the source of a call token into tree nodes: walk the
//! call, run every link of the chain, then convert the final value into
//! nodes. Failures that only concern the call itself become an error node
//! in the tree and a diagnostic, so the rest of the document still
//! compiles; strict pipelines turn them into hard errors instead.

use quill_ast::{Node, NodeKind};
use tracing::{debug, trace};

use crate::context::Context;
use crate::diagnostics::{codes, Diagnostic};
use crate::error::{Position, QuillError, Result};
use crate::function::binding;
use crate::function::validator;
use crate::function::Invocation;
use crate::value::{unwrap_paragraph, Value};
use crate::walker::{walk, CallMode, WalkedFunctionCall};

/// Execute a walked call chain, feeding each result into the next link
pub fn execute(ctx: &mut Context, call: &WalkedFunctionCall, source: &str) -> Result<Value> {
    let mut piped: Option<Value> = None;
    for link in call.links() {
        ctx.enter_call(&link.name)?;
        let result = invoke(ctx, link, piped.take(), source);
        ctx.exit_call();
        piped = Some(result?);
    }
    Ok(piped.unwrap_or(Value::Void))
}

fn invoke(
    ctx: &mut Context,
    link: &WalkedFunctionCall,
    piped: Option<Value>,
    source: &str,
) -> Result<Value> {
    if let Some(value) = ctx.variable(&link.name) {
        if link.arguments.is_empty() && link.body.is_none() && piped.is_none() {
            trace!(variable = %link.name, "read variable");
            return Ok(value.clone());
        }
        return Err(QuillError::Binding {
            call: link.name.clone(),
            message: "a variable takes no arguments".to_string(),
            candidates: Vec::new(),
        });
    }

    let candidates = ctx.functions(&link.name);
    let binding = binding::select(&candidates, link, piped.is_some())?;
    let args = binding.bind(ctx, piped, source)?;
    let function = binding.function;
    validator::check(&function, &args, ctx)?;

    debug!(function = %link.name, "invoking");
    let mut invocation = Invocation {
        ctx,
        args,
        name: &link.name,
        source,
    };
    function.invoke(&mut invocation)
}

/// Expand a call token into nodes.
///
/// `source` is the text of the token and `offset` its byte position in
/// `document`, used to locate errors.
pub fn expand(
    ctx: &mut Context,
    source: &str,
    mode: CallMode,
    document: &str,
    offset: usize,
) -> Result<Vec<Node>> {
    let walked = walk(source, mode).map_err(|err| err.into_error(document, offset))?;
    let call = walked.call;

    match execute(ctx, &call, source) {
        Ok(value) => {
            let children = output_nodes(ctx, value, mode)?;
            if children.is_empty() {
                return Ok(Vec::new());
            }
            let output = NodeKind::FunctionCallOutput {
                name: call.name.clone(),
                block: mode == CallMode::Block,
            };
            Ok(vec![Node::with_children(output, children)])
        }
        Err(err) if err.is_call_local() && !ctx.options().strict => {
            let code = match err {
                QuillError::Veto { .. } => codes::CALL_VETOED,
                _ => codes::CALL_FAILED,
            };
            let mut diagnostic = Diagnostic::error(err.to_string())
                .with_code(code)
                .with_position(Position::locate(document, offset));
            if let QuillError::Binding { candidates, .. } = &err {
                if !candidates.is_empty() {
                    diagnostic = diagnostic.with_help(format!(
                        "candidates: {}",
                        candidates.join(", ")
                    ));
                }
            }
            ctx.report(diagnostic);
            Ok(vec![Node::new(NodeKind::CallError {
                message: err.to_string(),
                block: mode == CallMode::Block,
            })])
        }
        Err(err) => Err(err),
    }
}

/// Convert a function result into nodes for its position in the tree
pub fn output_nodes(ctx: &mut Context, value: Value, mode: CallMode) -> Result<Vec<Node>> {
    let nodes = match value {
        Value::Void | Value::None => Vec::new(),
        Value::Dynamic(raw) => match mode {
            CallMode::Block => ctx.parse_blocks(&raw)?,
            CallMode::Inline => ctx.parse_inlines(&raw)?,
        },
        Value::Content(nodes) => match mode {
            CallMode::Inline => unwrap_paragraph(nodes),
            CallMode::Block if nodes.iter().all(|node| !node.is_block()) => {
                vec![Node::with_children(NodeKind::Paragraph, nodes)]
            }
            CallMode::Block => nodes,
        },
        Value::Sequence(items) => {
            let mut nodes = Vec::new();
            for item in items {
                nodes.extend(output_nodes(ctx, item, mode)?);
            }
            return Ok(nodes);
        }
        other => {
            let text = Node::text(other.to_text());
            match mode {
                CallMode::Inline => vec![text],
                CallMode::Block => vec![Node::with_children(NodeKind::Paragraph, vec![text])],
            }
        }
    };
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{Function, Library};
    use crate::value::ParamType;

    fn context() -> Context {
        let mut ctx = Context::default();
        let library = Library::new("test")
            .with(
                Function::new("sum", |call| {
                    Ok(Value::Number(call.args.number("a")? + call.args.number("b")?))
                })
                .param("a", ParamType::Number)
                .param("b", ParamType::Number),
            )
            .with(
                Function::new("multiply", |call| {
                    Ok(Value::Number(call.args.number("a")? * call.args.number("by")?))
                })
                .param("a", ParamType::Number)
                .param("by", ParamType::Number),
            )
            .with(Function::new("fail", |_| Err(QuillError::runtime("boom"))))
            .with(Function::new("deep", |call| {
                let walked = walk(".deep", CallMode::Inline)
                    .map_err(|err| QuillError::runtime(err.message))?;
                execute(call.ctx, &walked.call, ".deep")
            }));
        ctx.load_library(&library).unwrap();
        ctx
    }

    fn run(ctx: &mut Context, source: &str) -> Result<Value> {
        let walked = walk(source, CallMode::Inline).unwrap();
        execute(ctx, &walked.call, source)
    }

    #[test]
    fn test_chain_pipes_results() {
        let mut ctx = context();
        assert_eq!(
            run(&mut ctx, ".sum {1} {2}::multiply by:{4}").unwrap(),
            Value::Number(12.0)
        );
    }

    #[test]
    fn test_nested_call_arguments() {
        let mut ctx = context();
        assert_eq!(
            run(&mut ctx, ".sum {.sum {1} {2}} {3}").unwrap(),
            Value::Number(6.0)
        );
    }

    #[test]
    fn test_nested_failure_fails_enclosing_call() {
        let mut ctx = context();
        assert!(run(&mut ctx, ".sum {.fail} {1}").is_err());
    }

    #[test]
    fn test_conversion_failure() {
        let mut ctx = context();
        assert!(matches!(
            run(&mut ctx, ".sum {abc} {1}"),
            Err(QuillError::TypeConversion { .. })
        ));
    }

    #[test]
    fn test_recursion_is_bounded() {
        let mut ctx = context();
        match run(&mut ctx, ".deep") {
            Err(QuillError::Runtime(message)) => assert!(message.contains("depth")),
            other => panic!("expected depth error, got {other:?}"),
        }
    }

    #[test]
    fn test_expand_reports_call_errors() {
        let mut ctx = context();
        let nodes = expand(&mut ctx, ".sum {1}", CallMode::Inline, ".sum {1}", 0).unwrap();
        assert!(matches!(nodes[0].kind, NodeKind::CallError { .. }));
        assert_eq!(ctx.diagnostics()[0].code, Some(codes::CALL_FAILED));
    }

    #[test]
    fn test_expand_wraps_scalar_output() {
        let mut ctx = context();
        let nodes = expand(&mut ctx, ".sum {1} {2}", CallMode::Inline, ".sum {1} {2}", 0).unwrap();
        match &nodes[0].kind {
            NodeKind::FunctionCallOutput { name, block } => {
                assert_eq!(name, "sum");
                assert!(!block);
            }
            other => panic!("unexpected node {other:?}"),
        }
        assert_eq!(nodes[0].children, vec![Node::text("3")]);
    }

    #[test]
    fn test_variables_shadow_functions() {
        let mut ctx = context();
        ctx.define_variable("sum", Value::from("shadowed"));
        assert_eq!(run(&mut ctx, ".sum").unwrap(), Value::from("shadowed"));
        assert!(run(&mut ctx, ".sum {1} {2}").is_err());
    }
}
