use quill_ast::Node;

use crate::error::{QuillError, Result};
use crate::lambda::Lambda;
use crate::value::Value;

/// Converted values bound to the parameters of one call, by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    entries: Vec<(String, Value)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value; a second binding of the same name replaces the first
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// The bound value, unless it is missing or absent
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
            .filter(|value| !value.is_none())
    }

    /// Whether a value was bound
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove and return a bound value
    pub fn take(&mut self, name: &str) -> Value {
        match self.entries.iter().position(|(n, _)| n == name) {
            Some(index) => self.entries.remove(index).1,
            None => Value::None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// A required value of any type
    pub fn value(&self, name: &str) -> Result<&Value> {
        self.get(name).ok_or_else(|| missing(name))
    }

    pub fn string(&self, name: &str) -> Result<&str> {
        self.opt_string(name).ok_or_else(|| mismatch(name, "string"))
    }

    pub fn opt_string(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::String(text) | Value::Dynamic(text)) => Some(text),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Result<f64> {
        self.opt_number(name).ok_or_else(|| mismatch(name, "number"))
    }

    pub fn opt_number(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(Value::Number(number)) => Some(*number),
            _ => None,
        }
    }

    /// A number that must be a non-negative integer no larger than `u32::MAX`
    pub fn count(&self, name: &str) -> Result<usize> {
        let number = self.number(name)?;
        if number < 0.0 || number.fract() != 0.0 {
            return Err(QuillError::runtime(format!(
                "'{name}' must be a non-negative integer, got {number}"
            )));
        }
        if number > f64::from(u32::MAX) {
            return Err(QuillError::runtime(format!("'{name}' is too large, got {number}")));
        }
        Ok(number as usize)
    }

    pub fn boolean(&self, name: &str) -> Result<bool> {
        self.opt_boolean(name).ok_or_else(|| mismatch(name, "boolean"))
    }

    pub fn opt_boolean(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(Value::Boolean(value)) => Some(*value),
            _ => None,
        }
    }

    /// The canonical spelling of an enum argument
    pub fn enumeration(&self, name: &str) -> Result<&str> {
        self.opt_enumeration(name)
            .ok_or_else(|| mismatch(name, "enum"))
    }

    pub fn opt_enumeration(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Enum(token)) => Some(token),
            _ => None,
        }
    }

    pub fn content(&self, name: &str) -> Result<Vec<Node>> {
        self.opt_content(name).ok_or_else(|| mismatch(name, "content"))
    }

    pub fn opt_content(&self, name: &str) -> Option<Vec<Node>> {
        match self.get(name) {
            Some(Value::Content(nodes)) => Some(nodes.clone()),
            _ => None,
        }
    }

    pub fn sequence(&self, name: &str) -> Result<&[Value]> {
        match self.get(name) {
            Some(Value::Sequence(items)) => Ok(items),
            _ => Err(mismatch(name, "sequence")),
        }
    }

    pub fn lambda(&self, name: &str) -> Result<&Lambda> {
        self.opt_lambda(name).ok_or_else(|| mismatch(name, "lambda"))
    }

    pub fn opt_lambda(&self, name: &str) -> Option<&Lambda> {
        match self.get(name) {
            Some(Value::Lambda(lambda)) => Some(lambda),
            _ => None,
        }
    }
}

fn missing(name: &str) -> QuillError {
    QuillError::runtime(format!("missing argument '{name}'"))
}

fn mismatch(name: &str, expected: &str) -> QuillError {
    QuillError::runtime(format!("argument '{name}' is not a bound {expected}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_access() {
        let mut args = Arguments::new();
        args.insert("n", Value::Number(3.0));
        args.insert("s", Value::from("text"));
        args.insert("gone", Value::None);

        assert_eq!(args.number("n").unwrap(), 3.0);
        assert_eq!(args.count("n").unwrap(), 3);
        assert_eq!(args.string("s").unwrap(), "text");
        assert!(args.number("s").is_err());
        assert!(!args.has("gone"));
        assert!(args.value("missing").is_err());
    }

    #[test]
    fn test_count_rejects_fractions() {
        let mut args = Arguments::new();
        args.insert("n", Value::Number(1.5));
        assert!(args.count("n").is_err());
        args.insert("n", Value::Number(1e20));
        assert!(matches!(args.count("n"), Err(QuillError::Runtime(_))));
    }

    #[test]
    fn test_take() {
        let mut args = Arguments::new();
        args.insert("a", Value::Boolean(true));
        assert_eq!(args.take("a"), Value::Boolean(true));
        assert_eq!(args.take("a"), Value::None);
    }
}
