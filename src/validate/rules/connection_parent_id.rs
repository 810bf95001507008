use super::super::{ValidationContext, ValidationRule};
use crate::{ast::*, error::ErrorType, visit::*};

/// Validates that every spread of a connection's insert or remove fragment names the parent
/// entity owning the connection, unless the connection is free.
///
/// The parent's id is given by the `parentID` argument of `@prepend` or `@append`, or by a
/// standalone `@parentID(value:)` directive.
///
/// See [`ValidationRule`]
#[derive(Default)]
pub struct ConnectionParentId;

impl<'a> ValidationRule<'a> for ConnectionParentId {}

impl<'a> Visitor<'a, ValidationContext<'a>> for ConnectionParentId {
    fn enter_fragment_spread(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        fragment_spread: &'a FragmentSpread<'a>,
        _info: &VisitInfo,
    ) -> VisitFlow {
        let Some(usage) = ctx.connection(fragment_spread.name.name) else {
            return VisitFlow::Skip;
        };
        if usage.free {
            return VisitFlow::Skip;
        }
        let config = &ctx.config;
        let directives = &fragment_spread.directives;
        let has_parent_id = [&config.prepend_directive, &config.append_directive]
            .into_iter()
            .filter_map(|name| directives.get(name))
            .any(|directive| directive.arguments.get(&config.parent_id_arg).is_some())
            || directives
                .get(&config.parent_id_directive)
                .map_or(false, |directive| {
                    directive.arguments.get(&config.parent_id_value_arg).is_some()
                });
        if !has_parent_id {
            let message = format!(
                "Connection {} needs a parent id where {} spreads {}",
                usage.connection,
                ctx.document_name(),
                fragment_spread.name.name
            );
            ctx.add_error(message, ErrorType::Policy);
        }
        VisitFlow::Skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ConnectionRegistry;
    use crate::config::Config;
    use crate::documents::DocumentSet;
    use crate::schema::Schema;
    use indoc::indoc;

    fn check(source: &str) -> Vec<String> {
        let ctx = ASTContext::new();
        let schema = Schema::parse(
            &ctx,
            indoc! {"
                type Query { viewer: User, users: [User!]! }
                type Mutation { addFriend: User }
                type User { id: ID!, friends: [User!]!, name: String }
            "},
        )
        .unwrap();
        let config = Config::default();
        let mut documents = DocumentSet::new();
        documents.add_source(&ctx, "test.graphql", source).unwrap();
        let mut errors = Vec::new();
        let registry = ConnectionRegistry::collect(schema, &config, &documents, &mut errors);
        assert!(errors.is_empty(), "{errors:?}");
        let mut validation = ValidationContext::with_connections(&config, &registry);
        for document in documents.sorted() {
            ConnectionParentId::check(&mut validation, document);
        }
        validation
            .errors
            .iter()
            .map(|err| err.message().to_string())
            .collect()
    }

    #[test]
    fn free_connections_need_no_parent() {
        let errors = check(indoc! {r#"
            query Viewer { viewer { friends @connection(name: "Friends") { id } } }
            mutation Add { addFriend { ...Friends_insert ...Friends_remove } }
        "#});
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn connections_under_lists_need_a_parent() {
        // `users` is a non-null list, which counts like any other list
        let errors = check(indoc! {r#"
            query Users { users { friends @connection(name: "Friends") { id } } }
            mutation A { addFriend { ...Friends_insert } }
            mutation B { addFriend { ...Friends_insert @append(parentID: "1") } }
            mutation C { addFriend { ...Friends_remove @parentID(value: $id) } }
            mutation D { addFriend { ...Friends_remove @prepend } }
        "#});
        assert_eq!(
            errors,
            [
                "Connection Friends needs a parent id where A spreads Friends_insert",
                "Connection Friends needs a parent id where D spreads Friends_remove",
            ]
        );
    }

    #[test]
    fn fragment_connections_need_a_parent() {
        let errors = check(indoc! {r#"
            fragment UserFriends on User { friends @connection(name: "Friends") { id } }
            mutation Add { addFriend { ...Friends_insert } }
        "#});
        assert_eq!(
            errors,
            ["Connection Friends needs a parent id where Add spreads Friends_insert"]
        );
    }
}
