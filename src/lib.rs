//! `graphql_cache_patch`
//! =========
//!
//! _Compile what a GraphQL mutation changes into patches for a normalized client cache._
//!
//! A client cache stores query results. Once a mutation returns, some of those results are stale:
//! a renamed user's `name` shows up in every query that selected it, and a newly created entity
//! belongs in some lists. The **`graphql_cache_patch`** library finds all of these places ahead of
//! time by analyzing an application's queries, fragments and mutations against its schema.
//!
//! For each (query, mutation) pair where the mutation affects the query, it produces a patch
//! tree that follows the shape of the mutation's result and names where each returned value goes
//! in the query's data. Lists marked with `@connection` may additionally be inserted into,
//! removed from or have entities deleted out of them by spreading generated fragments.
//!
//! The crate builds on a fast arena-allocated AST:
//!
//! - [`ast`] parses GraphQL documents into an AST living in an [`ASTContext`](ast::ASTContext)
//! - [`schema`] parses the SDL describing the types documents are checked against
//! - [`visit`] walks the AST with composable visitors
//! - [`validate`] runs the rules documents must pass before patches are generated
//!
//! On top of those:
//!
//! - [`documents`] collects the named operations and fragments of an analysis run
//! - [`analysis`] finds connections, mutation impact and the query selections it hits
//! - [`patch`] folds those into patch trees and artifacts
//! - [`analyze`] runs all phases in order
//!
//! [A good place to start learning more about this crate is the `analyze` function...](analyze)

pub mod analysis;
pub mod ast;
pub mod config;
pub mod documents;
pub mod error;
pub mod patch;
pub mod schema;
pub mod validate;
pub mod visit;

mod pipeline;
pub use pipeline::analyze;

pub use bumpalo;

#[cfg(feature = "json")]
pub mod json;
