//! # Validation Rules for cache patches
//!
//! This module contains logic to run validation rules on GraphQL Query Language documents before
//! any patch is generated for them. Every rule reports all of its findings into a shared
//! [`ValidationContext`], so that a run reports every problem at once.
//!
//! The rules this module comes with are:
//!
//! - [`rules::NoIdentityAlias`]: validates that no field is aliased to an identity field's name
//! - [`rules::ConnectionParentId`]: validates that list operations on connections that aren't
//!   free name the parent entity owning the connection
//!
//! The [visit](crate::visit) module is used to actually execute validation rules.
//! The [`ValidationRule`] trait is simply defined to implement the [Visitor](crate::visit::Visitor) trait
//! and to accept the [`ValidationContext`], which is used to keep track of validation errors.
//!
//! As such, the [`DefaultRules`](rules::DefaultRules) rule is a [`ValidationRule`] itself that's
//! composed using the [`ComposedVisitor`](crate::visit::ComposedVisitor) utility.
//!
//! For example, this is one way to run a validation rule, in this case `DefaultRules`:
//!
//! ```
//! use graphql_cache_patch::{ast::*, config::Config, validate::*};
//!
//! let ctx = ASTContext::new();
//! let document = Document::parse(&ctx, "query Users { users { id name } }").unwrap();
//!
//! DefaultRules::validate(&Config::default(), document).unwrap()
//! ```
//!
//! Another way is to utilize the [`ValidateNode`] trait instead to run validation starting from an
//! AST Node rather from the rule itself:
//!
//! ```
//! use graphql_cache_patch::{ast::*, config::Config, validate::*};
//!
//! let ctx = ASTContext::new();
//! let document = Document::parse(&ctx, "query User { user { id: name } }").unwrap();
//!
//! document.validate::<DefaultRules>(&Config::default()).unwrap_err();
//! ```

#[allow(clippy::module_inception)]
mod validate;

mod context;

pub mod rules;
pub use context::*;
pub use rules::DefaultRules;
pub use validate::*;

use crate::analysis::ConnectionRegistry;
use crate::config::Config;
use crate::documents::DocumentSet;
use crate::error::Error;

/// Checks every user-written document, first for aliased identity fields and then for list
/// operations missing a parent id.
///
/// Findings are appended to `errors`, next to those earlier phases collected, so that the caller
/// reports all of them in one batch.
pub fn validate_documents<'a>(
    config: &Config,
    registry: &ConnectionRegistry<'a>,
    documents: &DocumentSet<'a>,
    errors: &mut Vec<Error>,
) {
    let mut ctx = ValidationContext::with_connections(config, registry);
    let documents: Vec<_> = documents
        .sorted()
        .into_iter()
        .filter(|document| !document.generated)
        .collect();
    for document in documents.iter() {
        rules::NoIdentityAlias::check(&mut ctx, document);
    }
    for document in documents.iter() {
        rules::ConnectionParentId::check(&mut ctx, document);
    }
    tracing::debug!(errors = ctx.errors.len(), "validated documents");
    errors.append(&mut ctx.errors);
}
