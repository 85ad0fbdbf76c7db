//! Arithmetic

use quill_core::error::QuillError;
use quill_core::function::Function;
use quill_core::value::{NumberRange, ParamType, Value};

pub(crate) fn functions() -> Vec<Function> {
    vec![
        binary("sum", "b", |a, b| Ok(a + b)),
        binary("subtract", "b", |a, b| Ok(a - b)),
        binary("multiply", "by", |a, b| Ok(a * b)),
        binary("divide", "by", |a, b| {
            if b == 0.0 {
                return Err(QuillError::runtime("division by zero"));
            }
            Ok(a / b)
        }),
        binary("pow", "to", |a, b| Ok(a.powf(b))),
        Function::new("sumall", |call| {
            let total = call
                .args
                .sequence("values")?
                .iter()
                .map(|item| item.as_number().unwrap_or(0.0))
                .sum::<f64>();
            Ok(Value::Number(total))
        })
        .param("values", ParamType::Sequence),
        Function::new("iseven", |call| {
            Ok(Value::Boolean(call.args.number("n")? % 2.0 == 0.0))
        })
        .param("n", ParamType::Number),
        Function::new("range", |call| {
            let bound = |name: &str| call.args.opt_number(name).map(|n| n as i64);
            Ok(Value::Range(NumberRange {
                start: bound("from"),
                end: bound("to"),
            }))
        })
        .optional("from", ParamType::Number)
        .optional("to", ParamType::Number),
        Function::new("truncate", |call| {
            let n = call.args.number("n")?;
            let decimals = call.args.count("decimals")?;
            let factor = 10f64.powi(decimals.min(15) as i32);
            Ok(Value::Number((n * factor).trunc() / factor))
        })
        .param("n", ParamType::Number)
        .param("decimals", ParamType::Number),
    ]
}

/// `.name {a} second:{b}` over two numbers
fn binary(
    name: &str,
    second: &'static str,
    op: impl Fn(f64, f64) -> quill_core::Result<f64> + 'static,
) -> Function {
    Function::new(name, move |call| {
        let a = call.args.number("a")?;
        let b = call.args.number(second)?;
        op(a, b).map(Value::Number)
    })
    .param("a", ParamType::Number)
    .param(second, ParamType::Number)
}
