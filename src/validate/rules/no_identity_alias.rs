use super::super::{ValidationContext, ValidationRule};
use crate::{ast::*, error::ErrorType, visit::*};

/// Validates that no field is aliased to an identity field's name.
///
/// A cache identifies entities by the values under their identity keys, so a response key that
/// looks like one but holds another field's value would corrupt it.
///
/// See [`ValidationRule`]
#[derive(Default)]
pub struct NoIdentityAlias;

impl<'a> ValidationRule<'a> for NoIdentityAlias {}

impl<'a> Visitor<'a, ValidationContext<'a>> for NoIdentityAlias {
    fn enter_field(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        field: &'a Field<'a>,
        info: &VisitInfo,
    ) -> VisitFlow {
        if let Some(alias) = field.alias {
            if alias != field.name && ctx.config.is_any_identity_key(alias) {
                let message = format!(
                    "Field {} at {} in {} is aliased to the identity field {alias}",
                    field.name,
                    info.path,
                    ctx.document_name()
                );
                ctx.add_error(message, ErrorType::AliasConflict);
            }
        }
        VisitFlow::Next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn unaliased_identity() {
        let ctx = ASTContext::new();
        let document =
            Document::parse(&ctx, "query Q { user { id id: id name: firstName } }").unwrap();
        NoIdentityAlias::validate(&Config::default(), document).unwrap();
    }

    #[test]
    fn aliased_identity() {
        let ctx = ASTContext::new();
        let document =
            Document::parse(&ctx, "query Q { user { id: name friends { id: email } } }").unwrap();
        let err = NoIdentityAlias::validate(&Config::default(), document).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        assert_eq!(err.errors().len(), 2);
        assert_eq!(err.errors()[0].error_type(), ErrorType::AliasConflict);
        assert_eq!(
            err.errors()[1].message(),
            "Field email at user.friends.id in document is aliased to the identity field id"
        );
    }
}
