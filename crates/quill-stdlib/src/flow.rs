//! Flow control, variables and user-defined functions
//!
//! Bodies are lambdas: they are evaluated only when, and as many times as,
//! the function decides to.

use quill_core::context::Context;
use quill_core::function::{Function, Parameter};
use quill_core::lambda::Lambda;
use quill_core::value::{ParamType, Value, MAX_EXPANSION};
use quill_core::{QuillError, Result};
use tracing::debug;

pub(crate) fn functions() -> Vec<Function> {
    vec![
        conditional("if", true),
        conditional("ifnot", false),
        Function::new("foreach", |call| {
            let items = call.args.sequence("iterable")?.to_vec();
            let body = call.args.lambda("body")?.clone();
            let mut results = Vec::with_capacity(items.len());
            for item in items {
                results.push(apply(&body, call.ctx, vec![item])?);
            }
            Ok(Value::Sequence(results))
        })
        .param("iterable", ParamType::Sequence)
        .body("body", ParamType::Lambda),
        Function::new("repeat", |call| {
            let times = call.args.count("times")?;
            if times > MAX_EXPANSION {
                return Err(QuillError::runtime(format!(
                    "cannot repeat {times} times, at most {MAX_EXPANSION}"
                )));
            }
            let body = call.args.lambda("body")?.clone();
            let mut results = Vec::new();
            for index in 1..=times {
                results.push(apply(&body, call.ctx, vec![Value::Number(index as f64)])?);
            }
            Ok(Value::Sequence(results))
        })
        .param("times", ParamType::Number)
        .body("body", ParamType::Lambda),
        Function::new("function", |call| {
            let name = call.args.string("name")?.to_string();
            let body = call.args.lambda("body")?.clone();
            call.ctx.define_function(user_function(name, body))?;
            Ok(Value::Void)
        })
        .param("name", ParamType::String)
        .body("body", ParamType::Lambda),
        Function::new("var", |call| {
            let name = call.args.string("name")?.to_string();
            let value = call.args.take("value");
            call.ctx.set_variable(&name, value);
            Ok(Value::Void)
        })
        .param("name", ParamType::String)
        .body("value", ParamType::Any),
        Function::new("let", |call| {
            let value = call.args.take("value");
            let body = call.args.lambda("body")?.clone();
            apply(&body, call.ctx, vec![value])
        })
        .param("value", ParamType::Any)
        .body("body", ParamType::Lambda),
        Function::new("equals", |call| {
            let a = call.args.value("a")?.to_text();
            let b = call.args.value("b")?.to_text();
            Ok(Value::Boolean(a == b))
        })
        .param("a", ParamType::Any)
        .param("b", ParamType::Any),
        Function::new("not", |call| Ok(Value::Boolean(!call.args.boolean("value")?)))
            .param("value", ParamType::Boolean),
    ]
}

/// `.if` and `.ifnot`: evaluate the body when the condition equals `expected`
fn conditional(name: &str, expected: bool) -> Function {
    Function::new(name, move |call| {
        if call.args.boolean("condition")? != expected {
            return Ok(Value::Void);
        }
        let body = call.args.lambda("body")?.clone();
        apply(&body, call.ctx, Vec::new())
    })
    .param("condition", ParamType::Boolean)
    .body("body", ParamType::Lambda)
}

/// Invoke a lambda, dropping the arguments it has no parameters for
fn apply(lambda: &Lambda, ctx: &mut Context, mut arguments: Vec<Value>) -> Result<Value> {
    arguments.truncate(lambda.parameters.len());
    lambda.invoke(ctx, arguments)
}

/// A function whose parameters are the lambda's header, all untyped
fn user_function(name: String, body: Lambda) -> Function {
    let declared = if body.explicit {
        body.parameters.clone()
    } else {
        Vec::new()
    };
    debug!(function = %name, parameters = declared.len(), "defining user function");

    let names: Vec<String> = declared.iter().map(|p| p.name.clone()).collect();
    let mut function = Function::new(name, move |call| {
        let arguments = names.iter().map(|name| call.args.take(name)).collect();
        body.invoke(call.ctx, arguments)
    });
    for parameter in declared {
        let mut descriptor = Parameter::new(parameter.name, ParamType::Any);
        if parameter.optional {
            descriptor = descriptor.optional();
        }
        function = function.parameter(descriptor);
    }
    function
}
