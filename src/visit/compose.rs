use super::visitor::*;
use crate::ast::*;

/// Where one of the visitors of a [`ComposedVisitor`] stands in the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lane {
    Active,
    /// The visitor skipped the node at this depth and sits out until it's left.
    Skipped(usize),
    Stopped,
}

impl Lane {
    #[inline(always)]
    fn enter(&mut self, depth: usize, callback: impl FnOnce() -> VisitFlow) -> VisitFlow {
        match *self {
            Lane::Active => {
                let flow = callback();
                *self = match flow {
                    VisitFlow::Next => Lane::Active,
                    VisitFlow::Skip => Lane::Skipped(depth),
                    VisitFlow::Break => Lane::Stopped,
                };
                flow
            }
            Lane::Skipped(_) => VisitFlow::Skip,
            Lane::Stopped => VisitFlow::Break,
        }
    }

    #[inline(always)]
    fn leave(&mut self, depth: usize, callback: impl FnOnce() -> VisitFlow) {
        match *self {
            Lane::Active => {
                if callback() == VisitFlow::Break {
                    *self = Lane::Stopped;
                }
            }
            Lane::Skipped(at) if at == depth => *self = Lane::Active,
            Lane::Skipped(_) | Lane::Stopped => {}
        }
    }

    /// Resumes a visitor that skipped the node at `depth` when the node isn't descended into.
    #[inline(always)]
    fn resume(&mut self, depth: usize) {
        if *self == Lane::Skipped(depth) {
            *self = Lane::Active;
        }
    }
}

type Callback<'a, V, C, Node> = fn(&mut V, &mut C, &'a Node, &VisitInfo) -> VisitFlow;

/// This structure implements the `Visitor` trait and runs two child Visitors side by side,
/// calling the callbacks of both.
///
/// A visitor that skips a node sits out the node's children while the other one continues, and a
/// visitor that breaks isn't called again. The traversal itself only skips a node once neither
/// visitor descends into it and stops once both have broken off.
///
/// Visitors may be composed indefinitely since a Composed Visitor can be passed into another
/// Composed Visitor, as long as all visitors accept the same `Context` type.
pub struct ComposedVisitor<'a, Context, A: Visitor<'a, Context>, B: Visitor<'a, Context>> {
    _marker: std::marker::PhantomData<&'a Context>,
    depth: usize,
    lane_a: Lane,
    lane_b: Lane,
    pub a: A,
    pub b: B,
}

impl<'a, C, A: Visitor<'a, C>, B: Visitor<'a, C>> ComposedVisitor<'a, C, A, B> {
    /// Composes two input visitors into one Composed Visitor.
    #[inline]
    pub fn new(a: A, b: B) -> ComposedVisitor<'a, C, A, B> {
        ComposedVisitor {
            _marker: std::marker::PhantomData,
            depth: 0,
            lane_a: Lane::Active,
            lane_b: Lane::Active,
            a,
            b,
        }
    }

    #[inline(always)]
    fn enter_both<Node: 'a>(
        &mut self,
        ctx: &mut C,
        node: &'a Node,
        info: &VisitInfo,
        enter_a: Callback<'a, A, C, Node>,
        enter_b: Callback<'a, B, C, Node>,
    ) -> VisitFlow {
        let depth = self.depth;
        let flow_a = self
            .lane_a
            .enter(depth, || enter_a(&mut self.a, ctx, node, info));
        let flow_b = self
            .lane_b
            .enter(depth, || enter_b(&mut self.b, ctx, node, info));
        match (flow_a, flow_b) {
            (VisitFlow::Next, _) | (_, VisitFlow::Next) => {
                self.depth += 1;
                VisitFlow::Next
            }
            (VisitFlow::Break, VisitFlow::Break) => VisitFlow::Break,
            _ => {
                self.lane_a.resume(depth);
                self.lane_b.resume(depth);
                VisitFlow::Skip
            }
        }
    }

    #[inline(always)]
    fn leave_both<Node: 'a>(
        &mut self,
        ctx: &mut C,
        node: &'a Node,
        info: &VisitInfo,
        leave_a: Callback<'a, A, C, Node>,
        leave_b: Callback<'a, B, C, Node>,
    ) -> VisitFlow {
        self.depth -= 1;
        let depth = self.depth;
        self.lane_a
            .leave(depth, || leave_a(&mut self.a, ctx, node, info));
        self.lane_b
            .leave(depth, || leave_b(&mut self.b, ctx, node, info));
        if self.lane_a == Lane::Stopped && self.lane_b == Lane::Stopped {
            VisitFlow::Break
        } else {
            VisitFlow::Next
        }
    }
}

macro_rules! compose_callbacks {
    ($($node:ident => $enter:ident, $leave:ident;)*) => {
        $(
            #[inline]
            fn $enter(&mut self, ctx: &mut C, node: &'a $node<'a>, info: &VisitInfo) -> VisitFlow {
                self.enter_both(ctx, node, info, A::$enter, B::$enter)
            }

            #[inline]
            fn $leave(&mut self, ctx: &mut C, node: &'a $node<'a>, info: &VisitInfo) -> VisitFlow {
                self.leave_both(ctx, node, info, A::$leave, B::$leave)
            }
        )*
    };
}

impl<'a, C, A: Visitor<'a, C>, B: Visitor<'a, C>> Visitor<'a, C> for ComposedVisitor<'a, C, A, B> {
    visited_nodes!(compose_callbacks);
}

#[cfg(test)]
mod tests {
    use super::super::visitor::tests::*;
    use super::*;

    /// Skips every field and counts what it still sees.
    #[derive(Debug, PartialEq, Default)]
    struct SkipFields {
        selection_sets: usize,
        fields: usize,
        directives: usize,
    }

    impl<'a> Visitor<'a> for SkipFields {
        fn enter_selection_set(
            &mut self,
            _: &mut (),
            _: &'a SelectionSet<'a>,
            _: &VisitInfo,
        ) -> VisitFlow {
            self.selection_sets += 1;
            VisitFlow::Next
        }

        fn enter_field(&mut self, _: &mut (), _: &'a Field<'a>, _: &VisitInfo) -> VisitFlow {
            self.fields += 1;
            VisitFlow::Skip
        }

        fn enter_directive(&mut self, _: &mut (), _: &'a Directive<'a>, _: &VisitInfo) -> VisitFlow {
            self.directives += 1;
            VisitFlow::Next
        }
    }

    /// Stops at the first field.
    #[derive(Default)]
    struct FirstField {
        fields: usize,
    }

    impl<'a> Visitor<'a> for FirstField {
        fn enter_field(&mut self, _: &mut (), _: &'a Field<'a>, _: &VisitInfo) -> VisitFlow {
            self.fields += 1;
            VisitFlow::Break
        }
    }

    #[test]
    fn skipping_visitor_sits_out_children() {
        let ctx = ASTContext::new();
        let document = Document::parse(&ctx, DOCUMENT).unwrap();
        let mut visitor = CountVisitor::default().compose(SkipFields::default());
        document.visit(&mut (), &mut visitor);

        assert_eq!(visitor.a.entered("Field"), 5);
        assert_eq!(visitor.a.left("Field"), 5);
        assert_eq!(visitor.a.entered("Directive"), 2);
        assert_eq!(visitor.a.entered("SelectionSet"), 8);
        assert_eq!(
            visitor.b,
            SkipFields {
                selection_sets: 2,
                fields: 2,
                directives: 0,
            }
        );
    }

    #[test]
    fn breaking_visitor_stops_alone() {
        let ctx = ASTContext::new();
        let document = Document::parse(&ctx, DOCUMENT).unwrap();
        let mut visitor = FirstField::default().compose(CountVisitor::default());
        document.visit(&mut (), &mut visitor);
        assert_eq!(visitor.a.fields, 1);
        assert_eq!(visitor.b.entered("Field"), 5);
        assert_eq!(visitor.b.left("Document"), 1);

        let mut visitor = FirstField::default().compose(FirstField::default());
        let flow = document.visit(&mut (), &mut visitor);
        assert_eq!(flow, VisitFlow::Break);
        assert_eq!((visitor.a.fields, visitor.b.fields), (1, 1));
    }
}
