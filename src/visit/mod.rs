//! # Visiting GraphQL ASTs
//!
//! The `visit` module contains utilities to traverse executable GraphQL documents. The [Visitor]
//! trait can be used to implement a visitor, which is run using the [`VisitNode`] trait that
//! most AST nodes implement. Visitors that accept the same context may be combined with
//! [`Visitor::compose`], which is how validation rules run in a single pass.
//!
//! While traversing, [`VisitInfo::path`] holds the [SelectionPath] of response keys leading to
//! the current field, which is the same path format that patch artifacts use.
//!
//! In this example we'll define a visitor that counts all fields that mark a connection:
//!
//! ```
//! use graphql_cache_patch::{ast::*, visit::*};
//!
//! #[derive(Default)]
//! struct CountConnections {
//!    connections: usize,
//! }
//!
//! impl<'a> Visitor<'a> for CountConnections {
//!     fn enter_field(
//!         &mut self,
//!         _ctx: &mut (),
//!         field: &'a Field<'a>,
//!         _info: &VisitInfo
//!     ) -> VisitFlow {
//!         if field.directives.get("connection").is_some() {
//!             self.connections += 1;
//!         }
//!         VisitFlow::Next
//!     }
//! }
//!
//! let ctx = ASTContext::new();
//! let document = Document::parse(&ctx, r#"{ friends @connection(name: "F") { id } }"#).unwrap();
//! let mut visitor = CountConnections::default();
//! document.visit(&mut (), &mut visitor);
//! assert_eq!(visitor.connections, 1);
//! ```
//!
//! [More information on the Visitor trait](Visitor)

/// Invokes `$callback!` with every node kind that a [Visitor] is called for, along with the names
/// of its `enter_` and `leave_` callbacks.
macro_rules! visited_nodes {
    ($callback:ident) => {
        $callback! {
            Document => enter_document, leave_document;
            OperationDefinition => enter_operation, leave_operation;
            FragmentDefinition => enter_fragment, leave_fragment;
            SelectionSet => enter_selection_set, leave_selection_set;
            FragmentSpread => enter_fragment_spread, leave_fragment_spread;
            InlineFragment => enter_inline_fragment, leave_inline_fragment;
            Field => enter_field, leave_field;
            Directive => enter_directive, leave_directive;
        }
    };
}

mod compose;
mod path;
mod visitor;

pub use compose::ComposedVisitor;
pub use path::*;
pub use visitor::*;
