//! Argument binding and overload selection
//!
//! Binding maps the arguments of one call link onto a function's parameters:
//!
//! 1. named arguments bind to the argument parameter of the same name
//! 2. the body binds to the body parameter
//! 3. the piped value, then positional arguments, fill the remaining
//!    argument parameters in declaration order
//!
//! Unbound optional parameters take their default. Two overloads of the
//! same arity that both bind make the call ambiguous. Otherwise the one with
//! the fewest optional and injected parameters wins, and declaration order
//! breaks what is left.

use std::rc::Rc;

use crate::context::Context;
use crate::error::{QuillError, Result};
use crate::expression::evaluate_safely;
use crate::value::Value;
use crate::walker::WalkedFunctionCall;

use super::{Arguments, Function, ParameterSource};

/// Where a bound parameter takes its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot<'a> {
    Piped,
    Argument(&'a str),
    Body(&'a str),
}

/// A function whose parameters have been matched to a call's arguments
pub struct Binding<'a> {
    pub function: Rc<Function>,
    slots: Vec<Option<Slot<'a>>>,
}

impl std::fmt::Debug for Binding<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("function", &self.function.name)
            .field("slots", &self.slots)
            .finish()
    }
}

/// Pick the overload that binds the call
pub fn select<'a>(
    candidates: &[Rc<Function>],
    call: &'a WalkedFunctionCall,
    piped: bool,
) -> Result<Binding<'a>> {
    let signatures = || candidates.iter().map(|f| f.signature()).collect();
    let failure = |message: String| QuillError::Binding {
        call: call.name.clone(),
        message,
        candidates: signatures(),
    };

    let mut bound = Vec::new();
    let mut reasons = Vec::new();
    for candidate in candidates {
        match plan(candidate, call, piped) {
            Ok(slots) => bound.push(Binding {
                function: Rc::clone(candidate),
                slots,
            }),
            Err(reason) => reasons.push(reason),
        }
    }

    if bound.is_empty() {
        let message = match (candidates.len(), reasons.pop()) {
            (0, _) => "unknown function".to_string(),
            (1, Some(reason)) => reason,
            _ => "no overload accepts these arguments".to_string(),
        };
        return Err(failure(message));
    }

    for (index, binding) in bound.iter().enumerate() {
        let arity = binding.function.arity();
        if bound[index + 1..]
            .iter()
            .any(|other| other.function.arity() == arity)
        {
            return Err(failure(format!(
                "ambiguous call: several overloads with {arity} parameter(s) accept these arguments"
            )));
        }
    }

    let least = bound
        .iter()
        .map(|binding| binding.function.leniency())
        .min()
        .unwrap_or(0);
    let index = bound
        .iter()
        .position(|binding| binding.function.leniency() == least)
        .unwrap_or(0);
    Ok(bound.swap_remove(index))
}

fn plan<'a>(
    function: &Function,
    call: &'a WalkedFunctionCall,
    piped: bool,
) -> std::result::Result<Vec<Option<Slot<'a>>>, String> {
    let parameters = &function.parameters;
    let mut slots: Vec<Option<Slot<'a>>> = vec![None; parameters.len()];

    for argument in &call.arguments {
        let Some(name) = &argument.name else {
            continue;
        };
        let index = parameters
            .iter()
            .position(|p| p.is_argument() && p.name == *name)
            .ok_or_else(|| format!("no parameter named '{name}'"))?;
        if slots[index].is_some() {
            return Err(format!("parameter '{name}' is bound twice"));
        }
        slots[index] = Some(Slot::Argument(&argument.value));
    }

    if let Some(body) = &call.body {
        let index = parameters
            .iter()
            .position(|p| p.body)
            .ok_or_else(|| "this function does not take a body".to_string())?;
        if slots[index].is_some() {
            return Err(format!(
                "parameter '{}' is bound both by name and by the body",
                parameters[index].name
            ));
        }
        slots[index] = Some(Slot::Body(&body.value));
    }

    let free: Vec<usize> = (0..parameters.len())
        .filter(|&i| parameters[i].is_argument() && slots[i].is_none())
        .collect();
    let positional = piped.then_some(Slot::Piped).into_iter().chain(
        call.arguments
            .iter()
            .filter(|argument| argument.name.is_none())
            .map(|argument| Slot::Argument(&argument.value)),
    );
    let mut free = free.into_iter();
    for slot in positional {
        let index = free.next().ok_or_else(|| {
            format!(
                "too many arguments: takes at most {}",
                function.arity()
            )
        })?;
        slots[index] = Some(slot);
    }

    for (parameter, slot) in parameters.iter().zip(&slots) {
        if parameter.is_argument() && !parameter.optional && slot.is_none() {
            return Err(format!("missing argument for '{}'", parameter.name));
        }
    }
    Ok(slots)
}

impl Binding<'_> {
    /// Evaluate and convert the bound arguments.
    ///
    /// Inline arguments are evaluated as expressions unless their parameter
    /// defers evaluation; bodies and piped values are converted as they are.
    pub fn bind(&self, ctx: &mut Context, piped: Option<Value>, source: &str) -> Result<Arguments> {
        let mut piped = piped;
        let mut args = Arguments::new();
        for (parameter, slot) in self.function.parameters.iter().zip(&self.slots) {
            let value = match (parameter.source, slot) {
                (ParameterSource::Injected(injection), _) => ctx.inject(injection, source),
                (_, Some(Slot::Piped)) => {
                    let value = piped.take().unwrap_or(Value::None);
                    parameter.ty.convert(value, ctx)?
                }
                (_, Some(Slot::Argument(raw))) => {
                    let value = if parameter.ty.is_deferred() {
                        Value::Dynamic(raw.to_string())
                    } else {
                        evaluate_safely(ctx, raw)?
                    };
                    parameter.ty.convert(value, ctx)?
                }
                (_, Some(Slot::Body(raw))) => {
                    parameter.ty.convert(Value::Dynamic(raw.to_string()), ctx)?
                }
                (_, None) => parameter.default.clone().unwrap_or(Value::None),
            };
            args.insert(parameter.name.clone(), value);
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Injection;
    use crate::value::ParamType;
    use crate::walker::{walk, CallMode};

    fn noop(name: &str) -> Function {
        Function::new(name, |_| Ok(Value::Void))
    }

    fn call(source: &str) -> WalkedFunctionCall {
        walk(source, CallMode::Block).unwrap().call
    }

    fn names<'a>(binding: &Binding<'a>) -> Vec<Option<Slot<'a>>> {
        binding.slots.clone()
    }

    #[test]
    fn test_named_then_positional() {
        let function = Rc::new(
            noop("f")
                .param("a", ParamType::Number)
                .param("b", ParamType::Number)
                .optional("c", ParamType::Number),
        );
        let walked = call(".f b:{2} {1}");
        let binding = select(&[function], &walked, false).unwrap();
        assert_eq!(
            names(&binding),
            vec![Some(Slot::Argument("1")), Some(Slot::Argument("2")), None]
        );
    }

    #[test]
    fn test_piped_value_binds_first() {
        let function = Rc::new(
            noop("multiply")
                .param("a", ParamType::Number)
                .param("by", ParamType::Number),
        );
        let walked = call(".multiply {3}");
        let binding = select(&[function], &walked, true).unwrap();
        assert_eq!(
            names(&binding),
            vec![Some(Slot::Piped), Some(Slot::Argument("3"))]
        );
    }

    #[test]
    fn test_body_binding() {
        let function = Rc::new(
            noop("box")
                .optional("title", ParamType::InlineContent)
                .body("body", ParamType::Content),
        );
        let walked = call(".box {Title}\n  content");
        let binding = select(&[function], &walked, false).unwrap();
        assert_eq!(
            names(&binding),
            vec![Some(Slot::Argument("Title")), Some(Slot::Body("content"))]
        );
    }

    #[test]
    fn test_positional_fills_body_parameter() {
        let function = Rc::new(noop("center").body("body", ParamType::Content));
        let walked = call(".center {inline}");
        assert!(select(&[function], &walked, false).is_ok());
    }

    #[test]
    fn test_binding_errors() {
        let function = Rc::new(noop("f").param("a", ParamType::Number));
        let cases = [
            (".f", "missing argument"),
            (".f {1} {2}", "too many"),
            (".f b:{1}", "no parameter named"),
            (".f a:{1} a:{2}", "bound twice"),
            (".f {1}\n  body", "does not take a body"),
        ];
        for (source, expected) in cases {
            let walked = call(source);
            match select(&[Rc::clone(&function)], &walked, false) {
                Err(QuillError::Binding { message, .. }) => {
                    assert!(message.contains(expected), "{source}: {message}")
                }
                other => panic!("{source}: expected a binding error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_injected_parameters_are_not_positional() {
        let function = Rc::new(
            noop("f")
                .injected("type", Injection::DocumentType)
                .param("a", ParamType::Number),
        );
        let walked = call(".f {1}");
        let binding = select(&[function], &walked, false).unwrap();
        assert_eq!(names(&binding), vec![None, Some(Slot::Argument("1"))]);
    }

    #[test]
    fn test_overload_prefers_fewest_optional_parameters() {
        let loose = Rc::new(
            noop("f")
                .param("a", ParamType::Number)
                .optional("b", ParamType::Number)
                .optional("c", ParamType::Number),
        );
        let strict = Rc::new(noop("f").param("a", ParamType::Number).param("b", ParamType::Number));
        let walked = call(".f {1} {2}");
        let binding = select(&[loose, Rc::clone(&strict)], &walked, false).unwrap();
        assert!(Rc::ptr_eq(&binding.function, &strict));
    }

    #[test]
    fn test_same_arity_overloads_are_ambiguous() {
        let first = Rc::new(noop("f").param("a", ParamType::Number));
        let second = Rc::new(noop("f").optional("b", ParamType::String));
        let walked = call(".f {1}");
        match select(&[first, second], &walked, false) {
            Err(QuillError::Binding { message, candidates, .. }) => {
                assert!(message.contains("ambiguous"));
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_bind_evaluates_and_converts() {
        let mut ctx = Context::default();
        let function = Rc::new(
            noop("f")
                .param("a", ParamType::Number)
                .defaulted("b", ParamType::Boolean, true)
                .optional("c", ParamType::Lambda),
        );
        let walked = call(".f {2} c:{x: .x}");
        let binding = select(&[function], &walked, false).unwrap();
        let args = binding.bind(&mut ctx, None, ".f").unwrap();
        assert_eq!(args.number("a").unwrap(), 2.0);
        assert!(args.boolean("b").unwrap());
        assert_eq!(args.lambda("c").unwrap().parameters[0].name, "x");
    }
}
