//! Collections
//!
//! Sequences come from ranges, markup lists (`- item` lines) or other
//! collection functions. Indices start at 0.

use quill_core::function::Function;
use quill_core::value::{ParamType, Value};

pub(crate) fn functions() -> Vec<Function> {
    vec![
        Function::new("collection", |call| Ok(call.args.take("items")))
            .body("items", ParamType::Sequence),
        Function::new("size", |call| {
            Ok(Value::Number(call.args.sequence("items")?.len() as f64))
        })
        .param("items", ParamType::Sequence),
        Function::new("first", |call| {
            Ok(call.args.sequence("items")?.first().cloned().unwrap_or(Value::None))
        })
        .param("items", ParamType::Sequence),
        Function::new("last", |call| {
            Ok(call.args.sequence("items")?.last().cloned().unwrap_or(Value::None))
        })
        .param("items", ParamType::Sequence),
        Function::new("getat", |call| {
            let index = call.args.count("index")?;
            Ok(call
                .args
                .sequence("items")?
                .get(index)
                .cloned()
                .unwrap_or(Value::None))
        })
        .param("items", ParamType::Sequence)
        .param("index", ParamType::Number),
        Function::new("pair", |call| {
            let first = call.args.take("first");
            let second = call.args.take("second");
            Ok(Value::Pair(Box::new(first), Box::new(second)))
        })
        .param("first", ParamType::Any)
        .param("second", ParamType::Any),
    ]
}
