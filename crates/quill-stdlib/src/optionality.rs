//! Optional values
//!
//! A call that produces nothing, such as an `.if` whose condition does not
//! hold, counts as absent for `.otherwise`.

use quill_core::function::Function;
use quill_core::value::{ParamType, Value};

pub(crate) fn functions() -> Vec<Function> {
    vec![
        Function::new("none", |_| Ok(Value::None)),
        Function::new("isnone", |call| Ok(Value::Boolean(!call.args.has("value"))))
            .optional("value", ParamType::Any),
        Function::new("otherwise", |call| match call.args.take("value") {
            Value::None | Value::Void => Ok(call.args.take("fallback")),
            value => Ok(value),
        })
        .optional("value", ParamType::Any)
        .param("fallback", ParamType::Any),
    ]
}
