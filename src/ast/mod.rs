//! # GraphQL Query Language AST
//!
//! The `ast` module contains the executable GraphQL query language AST that the analysis reads
//! queries, mutations and fragments from. It only implements the client-side query language
//! that clients use to make requests to a GraphQL service.
//! [Reference](https://spec.graphql.org/October2021/#sec-Language)
//!
//! Its two main parts are:
//! - [`ASTContext`], a context containing an arena that defines the lifetime for an AST
//! - [`ParseNode`], a trait using which AST Nodes are parsed from source text
//!
//! ```
//! use graphql_cache_patch::ast::*;
//!
//! // Create an AST Context for a document
//! let ctx = ASTContext::new();
//!
//! // Parse a source text into a Document AST root node
//! let ast = Document::parse(&ctx, "query Users { users { id } }").unwrap();
//! assert_eq!(ast.definitions.len(), 1);
//! ```

#[allow(clippy::module_inception)]
mod ast;

mod ast_kind;
pub(crate) mod lexer;
pub(crate) mod parser;

pub use ast::*;
pub use ast_kind::ASTKind;
pub use parser::ParseNode;
