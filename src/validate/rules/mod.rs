use crate::visit::ComposedVisitor;

mod connection_parent_id;
mod no_identity_alias;

pub use super::context::ValidationContext;
pub use connection_parent_id::*;
pub use no_identity_alias::*;

/// All rules that documents are checked against before patches are generated, combined into one
/// `ValidationRule`.
///
/// See: [`ComposedVisitor`]
pub type DefaultRules<'a> =
    ComposedVisitor<'a, ValidationContext<'a>, NoIdentityAlias, ConnectionParentId>;

#[cfg(test)]
mod tests {
    use super::super::*;
    use super::*;
    use crate::ast::*;
    use crate::config::Config;

    #[test]
    fn passes() {
        let ctx = ASTContext::new();
        let document = Document::parse(
            &ctx,
            "query A { user { id name } } mutation B { updateUser { ...Friends_insert } }",
        )
        .unwrap();
        DefaultRules::validate(&Config::default(), document).unwrap();
    }

    #[test]
    fn fails() {
        let ctx = ASTContext::new();
        let document = Document::parse(&ctx, "query A { user { id: name } }").unwrap();
        DefaultRules::validate(&Config::default(), document).unwrap_err();
        document.validate::<NoIdentityAlias>(&Config::default()).unwrap_err();
    }
}
