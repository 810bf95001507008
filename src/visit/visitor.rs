use super::{compose::ComposedVisitor, path::SelectionPath};
use crate::ast::*;

pub(crate) mod private {
    use super::{VisitFlow, VisitInfo, Visitor};

    pub trait VisitNodeWithInfo<'a>: Sized {
        fn visit_with_info<'b, C, V: Visitor<'a, C>>(
            &'a self,
            ctx: &'b mut C,
            visitor: &'b mut V,
            info: &mut VisitInfo,
        ) -> VisitFlow;
    }
}

use private::VisitNodeWithInfo;

/// A visitor signal that is returned from [Visitor] callbacks to alter the flow of traversal.
///
/// The default callbacks all return `VisitFlow::Next`, which continues the depth-first traversal.
/// The other signals may be used to skip over a node in an `enter_` callback or to abort traversal
/// entirely without visiting any more AST Nodes.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum VisitFlow {
    /// Continue visiting nodes as usual.
    Next,
    /// Abort the traversal without performing any subsequent visits.
    Break,
    /// Skip over the current node without performing any deeper traversal.
    /// (Only applies to `enter_` callbacks)
    Skip,
}

impl VisitFlow {
    /// Runs `next` unless the traversal was aborted.
    #[inline]
    fn then(self, next: impl FnOnce() -> VisitFlow) -> VisitFlow {
        match self {
            VisitFlow::Break => VisitFlow::Break,
            VisitFlow::Next | VisitFlow::Skip => next(),
        }
    }
}

/// Information about the position of the currently visited node.
#[derive(Debug, Default)]
pub struct VisitInfo {
    /// The response keys of all fields from the root of the current definition up to and
    /// including the currently visited field.
    pub path: SelectionPath,
}

macro_rules! default_callbacks {
    ($($node:ident => $enter:ident, $leave:ident;)*) => {
        $(
            #[doc = concat!(
                "Called when a [`", stringify!($node), "`] is visited and before its child nodes are visited."
            )]
            #[inline]
            fn $enter(
                &mut self,
                _ctx: &mut Context,
                _node: &'a $node<'a>,
                _info: &VisitInfo,
            ) -> VisitFlow {
                VisitFlow::Next
            }

            #[doc = concat!("Called after a [`", stringify!($node), "`] and its child nodes were visited.")]
            #[inline]
            fn $leave(
                &mut self,
                _ctx: &mut Context,
                _node: &'a $node<'a>,
                _info: &VisitInfo,
            ) -> VisitFlow {
                VisitFlow::Next
            }
        )*
    };
}

/// Trait for a visitor that carries methods that are called as callback while AST nodes
/// implementing the visitor pattern are traversed.
///
/// While the AST is traversed in depth-first order, callbacks that are prefixed with `enter_` are
/// called from top-to-bottom while the traversal is recursing, while callbacks that are prefixed
/// with `leave_` are called from bottom-to-top while the traversal is returning. A `leave_`
/// callback only runs when its `enter_` callback returned `VisitFlow::Next`.
///
/// All callbacks have a default no-op implementation that returns `VisitFlow::Next`.
///
/// Fragment spreads are never followed into the fragment they refer to, hence every definition is
/// visited on its own.
pub trait Visitor<'a, Context = ()>: Sized {
    /// Combines two visitors into one that will run both the original and passed visitor
    /// concurrently.
    ///
    /// Both visitors must accept the same `Context` type.
    #[inline]
    fn compose<V: Visitor<'a, Context>>(self, other: V) -> ComposedVisitor<'a, Context, Self, V> {
        ComposedVisitor::new(self, other)
    }

    visited_nodes!(default_callbacks);
}

/// Trait for visiting AST Nodes of a GraphQL language document in depth-first order using a
/// custom visitor.
///
/// The visitor must implement the [Visitor] trait which may also define a custom context
/// structure that can be passed to the `visit` method.
pub trait VisitNode<'a>: Sized + VisitNodeWithInfo<'a> {
    /// Visit a GraphQL AST node tree recursively in depth-first order with a given visitor.
    fn visit<'b, C, V: Visitor<'a, C>>(&'a self, ctx: &'b mut C, visitor: &'b mut V) -> VisitFlow {
        let mut info = VisitInfo::default();
        self.visit_with_info(ctx, visitor, &mut info)
    }
}

impl<'a, T: VisitNodeWithInfo<'a>> VisitNode<'a> for T {}

/// Calls `enter`, then visits the node's children and calls `leave` unless `enter` skipped the
/// node or any callback aborted the traversal.
#[inline(always)]
fn visit_around<C, V>(
    ctx: &mut C,
    visitor: &mut V,
    info: &mut VisitInfo,
    enter: impl FnOnce(&mut V, &mut C, &VisitInfo) -> VisitFlow,
    children: impl FnOnce(&mut V, &mut C, &mut VisitInfo) -> VisitFlow,
    leave: impl FnOnce(&mut V, &mut C, &VisitInfo) -> VisitFlow,
) -> VisitFlow {
    match enter(visitor, ctx, info) {
        VisitFlow::Next => match children(visitor, ctx, info) {
            VisitFlow::Break => VisitFlow::Break,
            VisitFlow::Next | VisitFlow::Skip => leave(visitor, ctx, info),
        },
        flow => flow,
    }
}

/// Visits each node in order until the traversal is aborted.
#[inline(always)]
fn visit_each<'a, C, V: Visitor<'a, C>, N: VisitNodeWithInfo<'a> + 'a>(
    nodes: impl IntoIterator<Item = &'a N>,
    ctx: &mut C,
    visitor: &mut V,
    info: &mut VisitInfo,
) -> VisitFlow {
    for node in nodes {
        if node.visit_with_info(ctx, visitor, info) == VisitFlow::Break {
            return VisitFlow::Break;
        }
    }
    VisitFlow::Next
}

impl<'a> VisitNodeWithInfo<'a> for Directive<'a> {
    #[inline]
    fn visit_with_info<'b, C, V: Visitor<'a, C>>(
        &'a self,
        ctx: &'b mut C,
        visitor: &'b mut V,
        info: &mut VisitInfo,
    ) -> VisitFlow {
        visit_around(
            ctx,
            visitor,
            info,
            |visitor, ctx, info| visitor.enter_directive(ctx, self, info),
            |_, _, _| VisitFlow::Next,
            |visitor, ctx, info| visitor.leave_directive(ctx, self, info),
        )
    }
}

impl<'a> VisitNodeWithInfo<'a> for Directives<'a> {
    #[inline]
    fn visit_with_info<'b, C, V: Visitor<'a, C>>(
        &'a self,
        ctx: &'b mut C,
        visitor: &'b mut V,
        info: &mut VisitInfo,
    ) -> VisitFlow {
        visit_each(self.children.iter(), ctx, visitor, info)
    }
}

impl<'a> VisitNodeWithInfo<'a> for Field<'a> {
    #[inline]
    fn visit_with_info<'b, C, V: Visitor<'a, C>>(
        &'a self,
        ctx: &'b mut C,
        visitor: &'b mut V,
        info: &mut VisitInfo,
    ) -> VisitFlow {
        info.path.push(self.alias_or_name());
        let flow = visit_around(
            ctx,
            visitor,
            info,
            |visitor, ctx, info| visitor.enter_field(ctx, self, info),
            |visitor, ctx, info| {
                self.directives
                    .visit_with_info(ctx, visitor, info)
                    .then(|| self.selection_set.visit_with_info(ctx, visitor, info))
            },
            |visitor, ctx, info| visitor.leave_field(ctx, self, info),
        );
        info.path.pop();
        flow
    }
}

impl<'a> VisitNodeWithInfo<'a> for FragmentSpread<'a> {
    #[inline]
    fn visit_with_info<'b, C, V: Visitor<'a, C>>(
        &'a self,
        ctx: &'b mut C,
        visitor: &'b mut V,
        info: &mut VisitInfo,
    ) -> VisitFlow {
        visit_around(
            ctx,
            visitor,
            info,
            |visitor, ctx, info| visitor.enter_fragment_spread(ctx, self, info),
            |visitor, ctx, info| self.directives.visit_with_info(ctx, visitor, info),
            |visitor, ctx, info| visitor.leave_fragment_spread(ctx, self, info),
        )
    }
}

impl<'a> VisitNodeWithInfo<'a> for InlineFragment<'a> {
    #[inline]
    fn visit_with_info<'b, C, V: Visitor<'a, C>>(
        &'a self,
        ctx: &'b mut C,
        visitor: &'b mut V,
        info: &mut VisitInfo,
    ) -> VisitFlow {
        visit_around(
            ctx,
            visitor,
            info,
            |visitor, ctx, info| visitor.enter_inline_fragment(ctx, self, info),
            |visitor, ctx, info| {
                self.directives
                    .visit_with_info(ctx, visitor, info)
                    .then(|| self.selection_set.visit_with_info(ctx, visitor, info))
            },
            |visitor, ctx, info| visitor.leave_inline_fragment(ctx, self, info),
        )
    }
}

impl<'a> VisitNodeWithInfo<'a> for Selection<'a> {
    #[inline]
    fn visit_with_info<'b, C, V: Visitor<'a, C>>(
        &'a self,
        ctx: &'b mut C,
        visitor: &'b mut V,
        info: &mut VisitInfo,
    ) -> VisitFlow {
        match self {
            Selection::Field(field) => field.visit_with_info(ctx, visitor, info),
            Selection::FragmentSpread(spread) => spread.visit_with_info(ctx, visitor, info),
            Selection::InlineFragment(fragment) => fragment.visit_with_info(ctx, visitor, info),
        }
    }
}

impl<'a> VisitNodeWithInfo<'a> for SelectionSet<'a> {
    #[inline]
    fn visit_with_info<'b, C, V: Visitor<'a, C>>(
        &'a self,
        ctx: &'b mut C,
        visitor: &'b mut V,
        info: &mut VisitInfo,
    ) -> VisitFlow {
        visit_around(
            ctx,
            visitor,
            info,
            |visitor, ctx, info| visitor.enter_selection_set(ctx, self, info),
            |visitor, ctx, info| visit_each(self.selections.iter(), ctx, visitor, info),
            |visitor, ctx, info| visitor.leave_selection_set(ctx, self, info),
        )
    }
}

impl<'a> VisitNodeWithInfo<'a> for FragmentDefinition<'a> {
    #[inline]
    fn visit_with_info<'b, C, V: Visitor<'a, C>>(
        &'a self,
        ctx: &'b mut C,
        visitor: &'b mut V,
        info: &mut VisitInfo,
    ) -> VisitFlow {
        visit_around(
            ctx,
            visitor,
            info,
            |visitor, ctx, info| visitor.enter_fragment(ctx, self, info),
            |visitor, ctx, info| {
                self.directives
                    .visit_with_info(ctx, visitor, info)
                    .then(|| self.selection_set.visit_with_info(ctx, visitor, info))
            },
            |visitor, ctx, info| visitor.leave_fragment(ctx, self, info),
        )
    }
}

impl<'a> VisitNodeWithInfo<'a> for OperationDefinition<'a> {
    #[inline]
    fn visit_with_info<'b, C, V: Visitor<'a, C>>(
        &'a self,
        ctx: &'b mut C,
        visitor: &'b mut V,
        info: &mut VisitInfo,
    ) -> VisitFlow {
        visit_around(
            ctx,
            visitor,
            info,
            |visitor, ctx, info| visitor.enter_operation(ctx, self, info),
            |visitor, ctx, info| {
                self.directives
                    .visit_with_info(ctx, visitor, info)
                    .then(|| self.selection_set.visit_with_info(ctx, visitor, info))
            },
            |visitor, ctx, info| visitor.leave_operation(ctx, self, info),
        )
    }
}

impl<'a> VisitNodeWithInfo<'a> for Definition<'a> {
    #[inline]
    fn visit_with_info<'b, C, V: Visitor<'a, C>>(
        &'a self,
        ctx: &'b mut C,
        visitor: &'b mut V,
        info: &mut VisitInfo,
    ) -> VisitFlow {
        match self {
            Definition::Operation(operation) => operation.visit_with_info(ctx, visitor, info),
            Definition::Fragment(fragment) => fragment.visit_with_info(ctx, visitor, info),
        }
    }
}

impl<'a> VisitNodeWithInfo<'a> for Document<'a> {
    #[inline]
    fn visit_with_info<'b, C, V: Visitor<'a, C>>(
        &'a self,
        ctx: &'b mut C,
        visitor: &'b mut V,
        info: &mut VisitInfo,
    ) -> VisitFlow {
        visit_around(
            ctx,
            visitor,
            info,
            |visitor, ctx, info| visitor.enter_document(ctx, self, info),
            |visitor, ctx, info| visit_each(self.definitions.iter(), ctx, visitor, info),
            |visitor, ctx, info| visitor.leave_document(ctx, self, info),
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Counts how often each kind of node is entered and left.
    #[derive(Debug, PartialEq, Default)]
    pub(crate) struct CountVisitor {
        pub(crate) entered: BTreeMap<&'static str, usize>,
        pub(crate) left: BTreeMap<&'static str, usize>,
    }

    impl CountVisitor {
        pub(crate) fn entered(&self, node: &str) -> usize {
            self.entered.get(node).copied().unwrap_or_default()
        }

        pub(crate) fn left(&self, node: &str) -> usize {
            self.left.get(node).copied().unwrap_or_default()
        }
    }

    macro_rules! count_callbacks {
        ($($node:ident => $enter:ident, $leave:ident;)*) => {
            $(
                fn $enter(&mut self, _: &mut (), _: &'a $node<'a>, _: &VisitInfo) -> VisitFlow {
                    *self.entered.entry(stringify!($node)).or_default() += 1;
                    VisitFlow::Next
                }

                fn $leave(&mut self, _: &mut (), _: &'a $node<'a>, _: &VisitInfo) -> VisitFlow {
                    *self.left.entry(stringify!($node)).or_default() += 1;
                    VisitFlow::Next
                }
            )*
        };
    }

    impl<'a> Visitor<'a> for CountVisitor {
        visited_nodes!(count_callbacks);
    }

    pub(crate) const DOCUMENT: &str = r#"
        query Friends {
          user {
            friendList: friends @connection(name: "Friends") {
              id
              ...FriendFields
              ... on User { name }
            }
          }
        }

        fragment FriendFields on User {
          name @include(if: true)
        }
    "#;

    #[test]
    fn counts_nodes() {
        let ctx = ASTContext::new();
        let document = Document::parse(&ctx, DOCUMENT).unwrap();
        let mut visitor = CountVisitor::default();
        document.visit(&mut (), &mut visitor);
        let expected: BTreeMap<_, _> = [
            ("Document", 1),
            ("OperationDefinition", 1),
            ("FragmentDefinition", 1),
            ("SelectionSet", 8),
            ("FragmentSpread", 1),
            ("InlineFragment", 1),
            ("Field", 5),
            ("Directive", 2),
        ]
        .into_iter()
        .collect();
        assert_eq!(visitor.entered, expected);
        assert_eq!(visitor.left, expected);
    }

    #[derive(Default)]
    struct CollectPaths {
        paths: Vec<String>,
    }

    impl<'a> Visitor<'a> for CollectPaths {
        fn enter_field(&mut self, _: &mut (), _: &'a Field<'a>, info: &VisitInfo) -> VisitFlow {
            self.paths.push(info.path.to_string());
            VisitFlow::Next
        }
    }

    #[test]
    fn tracks_response_key_paths() {
        let ctx = ASTContext::new();
        let document = Document::parse(&ctx, DOCUMENT).unwrap();
        let mut visitor = CollectPaths::default();
        document.visit(&mut (), &mut visitor);
        assert_eq!(
            visitor.paths,
            [
                "user",
                "user.friendList",
                "user.friendList.id",
                "user.friendList.name",
                "name"
            ]
        );
    }

    /// Skips the selections of fields marked as connections.
    #[derive(Default)]
    struct SkipConnections {
        fields: Vec<&'static str>,
    }

    impl<'a> Visitor<'a> for SkipConnections {
        fn enter_field(&mut self, _: &mut (), field: &'a Field<'a>, _: &VisitInfo) -> VisitFlow {
            if field.directives.get("connection").is_some() {
                VisitFlow::Skip
            } else {
                VisitFlow::Next
            }
        }

        fn leave_field(&mut self, _: &mut (), field: &'a Field<'a>, _: &VisitInfo) -> VisitFlow {
            self.fields.push(if field.name == "user" { "user" } else { "other" });
            VisitFlow::Next
        }
    }

    #[test]
    fn skips_children() {
        let ctx = ASTContext::new();
        let document = Document::parse(&ctx, DOCUMENT).unwrap();
        let mut visitor = SkipConnections::default();
        document.visit(&mut (), &mut visitor);
        assert_eq!(visitor.fields, ["user", "other"]);
    }
}
