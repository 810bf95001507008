//! # Using Schema Definitions
//!
//! The `schema` module contains the type information that documents are resolved against. A
//! [Schema] is loaded from schema definition language source text and provides lookups of root
//! types, named types, fields and their arguments, and the possible types of abstract types.
//!
//! ```
//! use graphql_cache_patch::{ast::ASTContext, schema::*};
//!
//! let ctx = ASTContext::new();
//! let schema = Schema::parse(&ctx, "type Query { users: [User] } type User { id: ID! }").unwrap();
//! let users = schema.get_field("Query", "users").unwrap();
//! assert_eq!(users.output_type.named(), "User");
//! ```
//!
//! [More information on the Schema struct.](Schema)

#[allow(clippy::module_inception)]
pub mod schema;
mod sdl;

pub use schema::*;
