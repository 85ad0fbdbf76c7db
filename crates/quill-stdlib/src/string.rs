//! String manipulation

use quill_core::function::Function;
use quill_core::value::{ParamType, Value};

pub(crate) fn functions() -> Vec<Function> {
    vec![
        map("uppercase", str::to_uppercase),
        map("lowercase", str::to_lowercase),
        map("capitalize", |s| {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }),
        Function::new("concatenate", |call| {
            let mut out = call.args.string("s")?.to_string();
            out.push_str(call.args.string("with")?);
            Ok(Value::String(out))
        })
        .param("s", ParamType::String)
        .param("with", ParamType::String),
        Function::new("isempty", |call| {
            let empty = call.args.opt_string("s").map_or(true, str::is_empty);
            Ok(Value::Boolean(empty))
        })
        .optional("s", ParamType::String),
        Function::new("string", |call| {
            Ok(Value::String(call.args.string("value")?.to_string()))
        })
        .param("value", ParamType::String),
    ]
}

fn map(name: &str, op: fn(&str) -> String) -> Function {
    Function::new(name, move |call| Ok(Value::String(op(call.args.string("s")?))))
        .param("s", ParamType::String)
}

#[cfg(test)]
mod tests {
    use crate::testing::eval;

    #[test]
    fn test_case_conversion() {
        assert_eq!(eval(".uppercase {quill}"), "QUILL");
        assert_eq!(eval(".lowercase {QuIlL}"), "quill");
        assert_eq!(eval(".capitalize {élan vital}"), "Élan vital");
    }

    #[test]
    fn test_concatenate_in_chain() {
        assert_eq!(eval(".uppercase {a}::concatenate with:{b}"), "Ab");
    }

    #[test]
    fn test_isempty() {
        assert_eq!(eval(".isempty {}"), "true");
        assert_eq!(eval(".isempty {x}"), "false");
        assert_eq!(eval(".isempty {.none}"), "true");
    }
}
