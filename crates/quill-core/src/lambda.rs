//! Lambdas
//!
//! A lambda is an argument whose text is evaluated later, possibly many
//! times, with its parameters bound as variables. The header names the
//! parameters and ends with a colon:
//!
//! ```text
//! item index?: Item .index is .item
//! ```
//!
//! Without a header the lambda takes one implicit parameter named `it`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::Context;
use crate::error::{QuillError, Result};
use crate::expression::evaluate_safely;
use crate::text::trim_indent;
use crate::value::Value;

/// Prefix accepted before an explicit lambda header
pub const LAMBDA_PREFIX: &str = "@lambda";

/// Name of the parameter of a headerless lambda
pub const IMPLICIT_PARAMETER: &str = "it";

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^[ \t]*((?:[A-Za-z][A-Za-z0-9_]*\??[ \t]*)*):(?:[ \t]+|\r?\n|$)(.*)$")
        .unwrap()
});

/// A lambda parameter, optional when written with a trailing `?`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaParameter {
    pub name: String,
    pub optional: bool,
}

/// A deferred, parameterized expression
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub parameters: Vec<LambdaParameter>,
    pub body: String,
    /// Whether the parameters came from a header or are the implicit `it`
    pub explicit: bool,
}

impl Lambda {
    /// Parse the raw text of a lambda argument
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim_start();
        let raw = raw
            .strip_prefix(LAMBDA_PREFIX)
            .filter(|rest| rest.starts_with([' ', '\t', '\n']))
            .unwrap_or(raw);

        if let Some(caps) = HEADER.captures(raw) {
            let header = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let parameters = header
                .split_whitespace()
                .map(|name| match name.strip_suffix('?') {
                    Some(name) => LambdaParameter {
                        name: name.to_string(),
                        optional: true,
                    },
                    None => LambdaParameter {
                        name: name.to_string(),
                        optional: false,
                    },
                })
                .collect();
            return Self {
                parameters,
                body: trim_indent(body),
                explicit: true,
            };
        }

        Self {
            parameters: vec![LambdaParameter {
                name: IMPLICIT_PARAMETER.to_string(),
                optional: true,
            }],
            body: trim_indent(raw),
            explicit: false,
        }
    }

    /// Number of arguments that must be supplied
    pub fn required(&self) -> usize {
        self.parameters.iter().filter(|p| !p.optional).count()
    }

    /// Evaluate the body with `arguments` bound to the parameters.
    ///
    /// Parameters live in a scope of their own that is discarded afterwards,
    /// whatever the outcome.
    pub fn invoke(&self, ctx: &mut Context, arguments: Vec<Value>) -> Result<Value> {
        if arguments.len() > self.parameters.len() {
            return Err(QuillError::runtime(format!(
                "lambda takes at most {} argument(s), got {}",
                self.parameters.len(),
                arguments.len()
            )));
        }
        if arguments.len() < self.required() {
            return Err(QuillError::runtime(format!(
                "lambda requires {} argument(s), got {}",
                self.required(),
                arguments.len()
            )));
        }

        ctx.push_scope();
        let mut arguments = arguments.into_iter();
        for parameter in &self.parameters {
            let value = arguments.next().unwrap_or(Value::None);
            ctx.define_variable(&parameter.name, value);
        }
        let result = evaluate_safely(ctx, &self.body);
        ctx.pop_scope();
        result
    }
}
