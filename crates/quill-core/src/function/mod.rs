//! Function descriptors
//!
//! A [`Function`] describes what a callable accepts (its parameters), which
//! constraints it puts on the call site (its validators) and what it does
//! (its implementation). Functions are grouped into [`Library`] values and
//! registered with a [`Context`].
//!
//! ```
//! use quill_core::function::Function;
//! use quill_core::value::{ParamType, Value};
//!
//! let sum = Function::new("sum", |call| {
//!     Ok(Value::Number(call.args.number("a")? + call.args.number("b")?))
//! })
//! .param("a", ParamType::Number)
//! .param("b", ParamType::Number);
//! assert_eq!(sum.signature(), ".sum {a: number} {b: number}");
//! ```

mod arguments;
pub mod binding;
pub mod validator;

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::context::Context;
use crate::error::{QuillError, Result};
use crate::value::{ParamType, Value};

pub use arguments::Arguments;
pub use validator::{OnlyForDocumentTypes, Validator};

/// What a function does when called
pub type Implementation = Rc<dyn Fn(&mut Invocation<'_>) -> Result<Value>>;

/// Hook run once when a library is loaded
pub type OnLoad = Rc<dyn Fn(&mut Context) -> Result<()>>;

/// Everything an implementation receives
pub struct Invocation<'a> {
    pub ctx: &'a mut Context,
    pub args: Arguments,
    /// Name the function was called by
    pub name: &'a str,
    /// Source text of the call
    pub source: &'a str,
}

/// Values the engine supplies instead of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    /// The document type, as an enum value
    DocumentType,
    /// The document locale tag, or none
    DocumentLocale,
    /// Source text of the call
    CallSite,
}

/// Where a parameter's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterSource {
    Argument,
    Injected(Injection),
}

/// A declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: ParamType,
    pub source: ParameterSource,
    pub optional: bool,
    /// Receives the indented body of a block call
    pub body: bool,
    /// Value used when an optional parameter is left unbound
    pub default: Option<Value>,
}

impl Parameter {
    /// A required argument parameter
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            source: ParameterSource::Argument,
            optional: false,
            body: false,
            default: None,
        }
    }

    /// Make the parameter optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Make the parameter optional with a default value
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.optional = true;
        self.default = Some(value.into());
        self
    }

    /// Mark the parameter as the body parameter
    pub fn body(mut self) -> Self {
        self.body = true;
        self
    }

    /// Whether the caller can supply this parameter
    pub fn is_argument(&self) -> bool {
        self.source == ParameterSource::Argument
    }
}

/// A callable with its descriptor
#[derive(Clone)]
pub struct Function {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub validators: Vec<Rc<dyn Validator>>,
    implementation: Implementation,
}

impl Function {
    /// A function without parameters
    pub fn new<F>(name: impl Into<String>, implementation: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> Result<Value> + 'static,
    {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            validators: Vec::new(),
            implementation: Rc::new(implementation),
        }
    }

    /// Append a parameter
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Append a required parameter
    pub fn param(self, name: impl Into<String>, ty: ParamType) -> Self {
        self.parameter(Parameter::new(name, ty))
    }

    /// Append an optional parameter without default
    pub fn optional(self, name: impl Into<String>, ty: ParamType) -> Self {
        self.parameter(Parameter::new(name, ty).optional())
    }

    /// Append an optional parameter with a default
    pub fn defaulted(self, name: impl Into<String>, ty: ParamType, value: impl Into<Value>) -> Self {
        self.parameter(Parameter::new(name, ty).default_value(value))
    }

    /// Append a required body parameter
    pub fn body(self, name: impl Into<String>, ty: ParamType) -> Self {
        self.parameter(Parameter::new(name, ty).body())
    }

    /// Append a parameter supplied by the engine
    pub fn injected(mut self, name: impl Into<String>, injection: Injection) -> Self {
        let mut parameter = Parameter::new(name, ParamType::Any);
        parameter.source = ParameterSource::Injected(injection);
        self.parameters.push(parameter);
        self
    }

    /// Attach a validator
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Rc::new(validator));
        self
    }

    /// Check the registration rules of the descriptor
    pub fn validate_descriptor(&self) -> Result<()> {
        let invalid = |reason: String| QuillError::InvalidDescriptor {
            function: self.name.clone(),
            reason,
        };

        if self.parameters.iter().filter(|p| p.body).count() > 1 {
            return Err(invalid("more than one body parameter".to_string()));
        }
        let mut names = HashSet::new();
        for parameter in &self.parameters {
            if !names.insert(parameter.name.as_str()) {
                return Err(invalid(format!(
                    "duplicate parameter '{}'",
                    parameter.name
                )));
            }
            if !parameter.is_argument() && (parameter.body || parameter.default.is_some()) {
                return Err(invalid(format!(
                    "injected parameter '{}' cannot be a body or have a default",
                    parameter.name
                )));
            }
        }
        Ok(())
    }

    /// Human-readable signature, used in binding errors
    pub fn signature(&self) -> String {
        let mut out = format!(".{}", self.name);
        for parameter in self.parameters.iter().filter(|p| p.is_argument()) {
            let marker = if parameter.optional { "?" } else { "" };
            let body = if parameter.body { " (body)" } else { "" };
            out.push_str(&format!(
                " {{{}{marker}: {}{body}}}",
                parameter.name,
                parameter.ty.name()
            ));
        }
        out
    }

    /// Number of parameters the caller can supply
    pub fn arity(&self) -> usize {
        self.parameters.iter().filter(|p| p.is_argument()).count()
    }

    /// Parameters the caller does not have to supply
    pub(crate) fn leniency(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| p.optional || !p.is_argument())
            .count()
    }

    /// Run the implementation
    pub fn invoke(&self, invocation: &mut Invocation<'_>) -> Result<Value> {
        (self.implementation)(invocation)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// A named group of functions
#[derive(Clone)]
pub struct Library {
    pub name: String,
    functions: Vec<Function>,
    on_load: Option<OnLoad>,
}

impl Library {
    /// An empty library
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            on_load: None,
        }
    }

    /// Add a function
    pub fn with(mut self, function: Function) -> Self {
        self.functions.push(function);
        self
    }

    /// Add several functions
    pub fn with_functions(mut self, functions: impl IntoIterator<Item = Function>) -> Self {
        self.functions.extend(functions);
        self
    }

    /// Set the hook run when the library is loaded
    pub fn on_load<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context) -> Result<()> + 'static,
    {
        self.on_load = Some(Rc::new(hook));
        self
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn load_hook(&self) -> Option<OnLoad> {
        self.on_load.clone()
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("name", &self.name)
            .field("functions", &self.functions.len())
            .finish()
    }
}
