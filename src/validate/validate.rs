use super::context::ValidationContext;
use crate::ast::Document;
use crate::config::Config;
use crate::documents::CollectedDocument;
use crate::error::Result;
use crate::visit::{ComposedVisitor, VisitNode, Visitor};
use std::borrow::Borrow;

/// Trait for a `ValidationRule` that checks GraphQL documents against its rules using a visitor.
///
/// A rule always implements a visitor and accepts the [`ValidationContext`] structure as
/// its passed context.
///
/// Rules implement the `Default` trait, which allows them to be instantiated easily. Everything
/// a rule needs to know beyond the document it visits is carried by the [`ValidationContext`].
pub trait ValidationRule<'a>: Visitor<'a, ValidationContext<'a>> + Default {
    /// Run this `ValidationRule` against the given document and return a result which errors if
    /// the rule fails on the document.
    #[inline]
    fn validate(config: &Config, document: &'a Document<'a>) -> Result<()> {
        let mut validation = ValidationContext::new(config);
        let mut visitor = Self::default();
        document.visit(&mut validation, &mut visitor);
        validation.to_result()
    }

    /// Run this `ValidationRule` against a collected document, adding any errors to the
    /// shared context.
    #[inline]
    fn check(ctx: &mut ValidationContext<'a>, document: &CollectedDocument<'a>) {
        let mut visitor = Self::default();
        ctx.document = Some(*document);
        document.definition.visit(ctx, &mut visitor);
        ctx.document = None;
    }
}

impl<'a, A, B> Default for ComposedVisitor<'a, ValidationContext<'a>, A, B>
where
    A: ValidationRule<'a>,
    B: ValidationRule<'a>,
{
    #[inline]
    fn default() -> Self {
        ComposedVisitor::new(A::default(), B::default())
    }
}

impl<'a, A, B> ValidationRule<'a> for ComposedVisitor<'a, ValidationContext<'a>, A, B>
where
    A: ValidationRule<'a>,
    B: ValidationRule<'a>,
{
}

/// Trait to run a [`ValidationRule`] on a given GraphQL Document node.
pub trait ValidateNode<'a>
where
    Self: Borrow<Document<'a>>,
{
    /// Run the generic validation rule on the document node and return a result which errors if
    /// the validation rule fails on the current document.
    ///
    /// `document.validate::<YourValidationRule>(&config)`
    #[inline]
    fn validate<Rule: ValidationRule<'a>>(&'a self, config: &Config) -> Result<()> {
        Rule::validate(config, self.borrow())
    }
}

impl<'a> ValidateNode<'a> for Document<'a> {}
