//! Argument expressions
//!
//! The raw text of an argument may mix plain text and calls:
//! `{Total: .sum {1} {2}}`. Evaluating it concatenates the parts into one
//! value. Parts that produce tree content cannot be concatenated as text, so
//! such expressions are re-read as markup instead.

use tracing::debug;

use crate::context::Context;
use crate::engine;
use crate::error::{QuillError, Result};
use crate::lexer::scan_calls;
use crate::value::Value;
use crate::walker::{walk, CallMode, WalkedFunctionCall};

/// A call found inside an expression
#[derive(Debug, Clone, PartialEq)]
pub struct CallSite {
    pub call: WalkedFunctionCall,
    pub mode: CallMode,
    /// Source text of the call
    pub source: String,
}

/// One part of a composed expression
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Call(CallSite),
}

/// A parsed argument expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Text without calls
    Literal(Value),
    /// Exactly one call and nothing around it; its value is kept as is
    Call(CallSite),
    /// Text and calls mixed
    Composed(Vec<Segment>),
}

/// Why an expression could not produce a value
#[derive(Debug)]
pub enum EvalError {
    /// Part of the expression is tree content; it must be read as markup
    MustBeMarkup,
    Failed(QuillError),
}

impl From<QuillError> for EvalError {
    fn from(err: QuillError) -> Self {
        EvalError::Failed(err)
    }
}

impl Expression {
    /// Split raw argument text into literal parts and calls
    pub fn parse(raw: &str) -> Result<Self> {
        let calls = scan_calls(raw)?;
        if calls.is_empty() {
            return Ok(Expression::Literal(Value::Dynamic(raw.to_string())));
        }

        let mut segments = Vec::new();
        let mut last = 0;
        for (range, mode) in calls {
            if range.start > last {
                segments.push(Segment::Text(raw[last..range.start].to_string()));
            }
            let source = &raw[range.clone()];
            let walked = walk(source, mode).map_err(|err| err.into_error(raw, range.start))?;
            segments.push(Segment::Call(CallSite {
                call: walked.call,
                mode,
                source: source.to_string(),
            }));
            last = range.end;
        }
        if last < raw.len() {
            segments.push(Segment::Text(raw[last..].to_string()));
        }

        if segments.len() == 1 {
            if let Some(Segment::Call(site)) = segments.pop() {
                return Ok(Expression::Call(site));
            }
        }
        Ok(Expression::Composed(segments))
    }

    /// Evaluate to a single value
    pub fn evaluate(&self, ctx: &mut Context) -> std::result::Result<Value, EvalError> {
        match self {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Call(site) => Ok(engine::execute(ctx, &site.call, &site.source)?),
            Expression::Composed(segments) => {
                let mut result = Value::Void;
                for segment in segments {
                    let value = match segment {
                        Segment::Text(text) => Value::Dynamic(text.clone()),
                        Segment::Call(site) => engine::execute(ctx, &site.call, &site.source)?,
                    };
                    if matches!(value, Value::Content(_)) {
                        return Err(EvalError::MustBeMarkup);
                    }
                    result = append(result, value);
                }
                Ok(result)
            }
        }
    }
}

/// Append one evaluated part to the running result.
///
/// Nothing is appended for void and absent values; sequences extend each
/// other; booleans combine with logical and; anything else becomes text.
pub fn append(acc: Value, next: Value) -> Value {
    match (acc, next) {
        (acc, Value::Void | Value::None) => acc,
        (Value::Void, next) => next,
        (Value::Sequence(mut items), Value::Sequence(more)) => {
            items.extend(more);
            Value::Sequence(items)
        }
        (Value::Sequence(mut items), next) => {
            items.push(next);
            Value::Sequence(items)
        }
        (Value::Boolean(a), Value::Boolean(b)) => Value::Boolean(a && b),
        (acc, next) => Value::Dynamic(format!("{}{}", acc.to_text(), next.to_text())),
    }
}

/// Evaluate raw argument text, falling back to reading it as markup when
/// the expression cannot be folded into one value
pub fn evaluate_safely(ctx: &mut Context, raw: &str) -> Result<Value> {
    let expression = Expression::parse(raw)?;
    match expression.evaluate(ctx) {
        Ok(value) => Ok(value),
        Err(EvalError::MustBeMarkup) => {
            debug!(expression = raw, "expression holds content, reading it as markup");
            Ok(Value::Content(ctx.parse_blocks(raw)?))
        }
        Err(EvalError::Failed(err)) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{Function, Library};
    use crate::value::ParamType;
    use quill_ast::{CrossReference, Node, NodeKind};

    #[test]
    fn test_literal_expression() {
        let expression = Expression::parse("just text").unwrap();
        assert_eq!(
            expression,
            Expression::Literal(Value::Dynamic("just text".to_string()))
        );
    }

    #[test]
    fn test_single_call_expression() {
        match Expression::parse(".sum {1} {2}").unwrap() {
            Expression::Call(site) => assert_eq!(site.call.name, "sum"),
            other => panic!("expected a call, got {other:?}"),
        }
    }

    #[test]
    fn test_composed_expression_segments() {
        match Expression::parse("a .x b").unwrap() {
            Expression::Composed(segments) => {
                assert_eq!(segments.len(), 3);
                assert_eq!(segments[0], Segment::Text("a ".to_string()));
                assert_eq!(segments[2], Segment::Text(" b".to_string()));
            }
            other => panic!("expected a composed expression, got {other:?}"),
        }
    }

    #[test]
    fn test_append_rules() {
        assert_eq!(append(Value::Void, Value::Number(1.0)), Value::Number(1.0));
        assert_eq!(
            append(Value::Number(1.0), Value::Void),
            Value::Number(1.0)
        );
        assert_eq!(
            append(Value::Boolean(true), Value::Boolean(false)),
            Value::Boolean(false)
        );
        assert_eq!(
            append(
                Value::Sequence(vec![Value::Number(1.0)]),
                Value::Sequence(vec![Value::Number(2.0)])
            ),
            Value::Sequence(vec![Value::Number(1.0), Value::Number(2.0)])
        );
        assert_eq!(
            append(Value::Dynamic("a".to_string()), Value::Number(2.0)),
            Value::Dynamic("a2".to_string())
        );
    }

    #[test]
    fn test_composed_evaluation_with_variables() {
        let mut ctx = Context::default();
        ctx.define_variable("name", Value::from("World"));
        let value = evaluate_safely(&mut ctx, "Hello, .name!").unwrap();
        assert_eq!(value, Value::Dynamic("Hello, World!".to_string()));
    }

    fn content_library() -> Library {
        Library::new("content")
            .with(
                Function::new("mark", |call| {
                    let label = call.args.string("label")?.to_string();
                    Ok(Value::Content(vec![Node::new(NodeKind::CrossReference(
                        CrossReference { label },
                    ))]))
                })
                .param("label", ParamType::String),
            )
            .with(
                Function::new("blocks", |call| match call.args.take("content") {
                    Value::Content(nodes) => Ok(Value::Number(nodes.len() as f64)),
                    other => Ok(Value::from(other.to_text())),
                })
                .param("content", ParamType::Content),
            )
    }

    fn content_context() -> Context {
        let mut ctx = Context::default();
        ctx.load_library(&content_library()).unwrap();
        ctx
    }

    fn has_reference(node: &Node) -> bool {
        matches!(node.kind, NodeKind::CrossReference(_)) || node.children.iter().any(has_reference)
    }

    #[test]
    fn test_content_in_composed_expression_must_be_markup() {
        let mut ctx = content_context();
        let expression = Expression::parse("Title .mark {intro}").unwrap();
        assert!(matches!(
            expression.evaluate(&mut ctx),
            Err(EvalError::MustBeMarkup)
        ));

        let single = Expression::parse(".mark {intro}").unwrap();
        assert!(matches!(single.evaluate(&mut ctx), Ok(Value::Content(_))));
    }

    #[test]
    fn test_content_expression_is_read_as_markup() {
        let mut ctx = content_context();
        match evaluate_safely(&mut ctx, "Title .mark {intro}").unwrap() {
            Value::Content(nodes) => {
                assert_eq!(nodes.len(), 1);
                assert_eq!(nodes[0].kind, NodeKind::Paragraph);
                assert!(nodes[0].plain_text().starts_with("Title"));
                assert!(has_reference(&nodes[0]));
            }
            other => panic!("expected content, got {other:?}"),
        }
    }

    #[test]
    fn test_content_parameter_receives_markup() {
        let mut ctx = content_context();
        let expression = Expression::parse(".blocks {Title .mark {intro}}").unwrap();
        assert_eq!(expression.evaluate(&mut ctx).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_unknown_function_fails() {
        let mut ctx = Context::default();
        let err = evaluate_safely(&mut ctx, "a .nosuchfunction b").unwrap_err();
        assert!(err.is_call_local());
    }
}
