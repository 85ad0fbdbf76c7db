//! Call-site validators

use crate::context::Context;
use crate::document::DocumentType;
use crate::error::{QuillError, Result};

use super::{Arguments, Function};

/// A constraint checked after binding and before the implementation runs
pub trait Validator {
    /// Return `Err` with a description of the violated constraint
    fn validate(&self, function: &Function, args: &Arguments, ctx: &Context)
        -> std::result::Result<(), String>;
}

/// Allows a function only in documents of the listed types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlyForDocumentTypes(pub Vec<DocumentType>);

impl Validator for OnlyForDocumentTypes {
    fn validate(
        &self,
        function: &Function,
        _args: &Arguments,
        ctx: &Context,
    ) -> std::result::Result<(), String> {
        let current = ctx.document.doc_type;
        if self.0.contains(&current) {
            return Ok(());
        }
        let allowed: Vec<&str> = self.0.iter().map(|t| t.name()).collect();
        Err(format!(
            ".{} is only available in {} documents, not {}",
            function.name,
            allowed.join(" or "),
            current.name()
        ))
    }
}

/// Run all validators of a function, stopping at the first veto
pub(crate) fn check(function: &Function, args: &Arguments, ctx: &Context) -> Result<()> {
    for validator in &function.validators {
        validator
            .validate(function, args, ctx)
            .map_err(|constraint| QuillError::Veto {
                call: function.name.clone(),
                constraint,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_document_type_veto() {
        let mut ctx = Context::default();
        let function = Function::new("slide", |_| Ok(Value::Void))
            .validator(OnlyForDocumentTypes(vec![DocumentType::Slides]));

        let err = check(&function, &Arguments::new(), &ctx).unwrap_err();
        assert!(matches!(err, QuillError::Veto { .. }));

        ctx.document.doc_type = DocumentType::Slides;
        assert!(check(&function, &Arguments::new(), &ctx).is_ok());
    }
}
