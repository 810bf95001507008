use crate::ast::*;
use crate::config::Config;
use crate::documents::{CollectedDocument, DocumentKind, DocumentSet};
use crate::error::{Error, ErrorType, Result};
use crate::schema::{Schema, TypeRef, TYPENAME_TYPE};
use hashbrown::HashMap;
use std::collections::VecDeque;

/// A fragment spread as it was applied, kept so that its directives stay visible after the
/// fragment's selections were merged into the spreading selection set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedSpread<'a> {
    pub name: &'a str,
    pub directives: &'a Directives<'a>,
}

impl<'a> AppliedSpread<'a> {
    #[inline]
    pub fn directive(&self, name: &str) -> Option<&'a Directive<'a>> {
        self.directives.get(name)
    }
}

/// A field with its schema type, merged from every selection sharing its response key.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatField<'a> {
    pub response_key: &'a str,
    pub name: &'a str,
    /// The type the field was selected on.
    pub parent_type: &'a str,
    pub field_type: &'a TypeRef<'a>,
    /// Arguments of the first selection of this field.
    pub arguments: &'a Arguments<'a>,
    pub directives: Vec<&'a Directive<'a>>,
    /// The merged sub-selections of a composite field.
    pub selections: Option<FlatSelectionSet<'a>>,
}

impl<'a> FlatField<'a> {
    pub fn directive(&self, name: &str) -> Option<&'a Directive<'a>> {
        self.directives
            .iter()
            .find(|directive| directive.name == name)
            .copied()
    }
}

/// Selections that only apply when a value is of another type than the enclosing selection set.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeBranch<'a> {
    pub selections: FlatSelectionSet<'a>,
}

impl<'a> TypeBranch<'a> {
    #[inline]
    pub fn type_name(&self) -> &'a str {
        self.selections.type_name
    }
}

/// A selection set with all fragments resolved.
///
/// Fields selected on the set's own type are listed in `fields`, in the order of their first
/// selection. Selections on other types, from inline fragments or fragment spreads with a
/// differing type condition, are grouped into one [TypeBranch] per type.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatSelectionSet<'a> {
    pub type_name: &'a str,
    pub fields: Vec<FlatField<'a>>,
    pub branches: Vec<TypeBranch<'a>>,
    pub spreads: Vec<AppliedSpread<'a>>,
}

impl<'a> FlatSelectionSet<'a> {
    pub fn new(type_name: &'a str) -> Self {
        FlatSelectionSet {
            type_name,
            fields: Vec::new(),
            branches: Vec::new(),
            spreads: Vec::new(),
        }
    }

    pub fn field(&self, response_key: &str) -> Option<&FlatField<'a>> {
        self.fields
            .iter()
            .find(|field| field.response_key == response_key)
    }

    /// Checks whether every identity key of this set's type is selected, which marks the set as
    /// an addressable entity whose fields can be patched.
    pub fn has_identity(&self, config: &Config) -> bool {
        let keys = config.keys_for(self.type_name);
        !keys.is_empty()
            && keys
                .iter()
                .all(|key| self.fields.iter().any(|field| field.name == key))
    }

    fn add_field(&mut self, field: FlatField<'a>) {
        match self
            .fields
            .iter_mut()
            .find(|existing| existing.response_key == field.response_key)
        {
            Some(existing) => {
                existing.directives.extend(field.directives);
                if let Some(other) = field.selections {
                    match existing.selections.as_mut() {
                        Some(selections) => selections.merge(other),
                        None => existing.selections = Some(other),
                    }
                }
            }
            None => self.fields.push(field),
        }
    }

    fn add_branch(&mut self, branch: FlatSelectionSet<'a>) {
        if branch.type_name == self.type_name {
            self.merge(branch);
        } else if let Some(existing) = self
            .branches
            .iter_mut()
            .find(|existing| existing.type_name() == branch.type_name)
        {
            existing.selections.merge(branch);
        } else {
            self.branches.push(TypeBranch { selections: branch });
        }
    }

    fn merge(&mut self, other: FlatSelectionSet<'a>) {
        for field in other.fields {
            self.add_field(field);
        }
        for branch in other.branches {
            self.add_branch(branch.selections);
        }
        self.spreads.extend(other.spreads);
    }
}

/// Flattened selection sets of every document in a [DocumentSet].
#[derive(Debug, Default)]
pub struct FlatDocuments<'a> {
    sets: HashMap<(DocumentKind, &'a str), FlatSelectionSet<'a>>,
}

impl<'a> FlatDocuments<'a> {
    pub fn get(&self, document: &CollectedDocument<'a>) -> Option<&FlatSelectionSet<'a>> {
        self.sets.get(&(document.kind, document.name))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Resolves the selection sets of all documents against the schema.
///
/// Fragments are flattened first, each exactly once and only after every fragment it spreads,
/// so that operations and other fragments merge memoized results.
pub struct Flattener<'a, 'b> {
    schema: &'a Schema<'a>,
    documents: &'b DocumentSet<'a>,
    fragments: HashMap<&'a str, FlatSelectionSet<'a>>,
}

impl<'a, 'b> Flattener<'a, 'b> {
    pub fn new(schema: &'a Schema<'a>, documents: &'b DocumentSet<'a>) -> Self {
        Flattener {
            schema,
            documents,
            fragments: HashMap::new(),
        }
    }

    pub fn run(mut self) -> Result<FlatDocuments<'a>> {
        self.flatten_fragments()?;
        let mut sets = HashMap::new();
        for document in self.documents.sorted() {
            let flat = match document.kind {
                DocumentKind::Fragment => match self.fragments.get(document.name) {
                    Some(flat) => flat.clone(),
                    None => continue,
                },
                _ => {
                    let root_type = document.root_type(self.schema)?;
                    self.flatten_selection_set(document.selection_set(), root_type)?
                }
            };
            sets.insert((document.kind, document.name), flat);
        }
        tracing::debug!(documents = sets.len(), "flattened selection sets");
        Ok(FlatDocuments { sets })
    }

    fn flatten_fragments(&mut self) -> Result<()> {
        let fragments = self.documents.of_kind(DocumentKind::Fragment);
        let mut pending: HashMap<&'a str, usize> = HashMap::new();
        let mut dependents: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
        let mut queue = VecDeque::new();
        for document in fragments.iter() {
            let mut spreads = Vec::new();
            collect_spreads(document.selection_set(), &mut spreads);
            spreads.sort_unstable();
            spreads.dedup();
            for spread in spreads.iter() {
                if self.documents.fragment(spread).is_none() {
                    return Err(unknown_fragment(spread, document));
                }
                dependents.entry(*spread).or_default().push(document.name);
            }
            if spreads.is_empty() {
                queue.push_back(document.name);
            }
            pending.insert(document.name, spreads.len());
        }

        while let Some(name) = queue.pop_front() {
            let Some(document) = self.documents.fragment(name) else {
                continue;
            };
            let Some(fragment) = document.fragment() else {
                continue;
            };
            self.check_composite(fragment.type_condition.name, document.name)?;
            let flat = self.flatten_selection_set(
                &fragment.selection_set,
                fragment.type_condition.name,
            )?;
            tracing::trace!(fragment = name, "flattened fragment");
            self.fragments.insert(name, flat);
            for dependent in dependents.get(name).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(*dependent);
                    }
                }
            }
        }

        if self.fragments.len() < fragments.len() {
            let cyclic: Vec<&str> = fragments
                .iter()
                .map(|document| document.name)
                .filter(|name| !self.fragments.contains_key(name))
                .collect();
            return Err(Error::new(
                format!("Fragments {} spread each other in a cycle", cyclic.join(", ")),
                ErrorType::Structural,
            ));
        }
        Ok(())
    }

    fn check_composite(&self, type_name: &str, document: &str) -> Result<()> {
        match self.schema.get_type(type_name) {
            Some(schema_type) if schema_type.is_composite() => Ok(()),
            Some(_) => Err(Error::new(
                format!("Type {type_name} in {document} can't have a selection set"),
                ErrorType::Structural,
            )),
            None => Err(Error::new(
                format!("Unknown type {type_name} in {document}"),
                ErrorType::Structural,
            )),
        }
    }

    fn flatten_selection_set(
        &self,
        selection_set: &'a SelectionSet<'a>,
        type_name: &'a str,
    ) -> Result<FlatSelectionSet<'a>> {
        let mut flat = FlatSelectionSet::new(type_name);
        self.collect(&mut flat, selection_set)?;
        Ok(flat)
    }

    fn collect(
        &self,
        flat: &mut FlatSelectionSet<'a>,
        selection_set: &'a SelectionSet<'a>,
    ) -> Result<()> {
        for selection in selection_set.selections.iter() {
            match selection {
                Selection::Field(field) => {
                    let field = self.flatten_field(flat.type_name, field)?;
                    flat.add_field(field);
                }
                Selection::InlineFragment(fragment) => match fragment.type_condition {
                    Some(condition) if condition.name != flat.type_name => {
                        self.check_composite(condition.name, flat.type_name)?;
                        let branch =
                            self.flatten_selection_set(&fragment.selection_set, condition.name)?;
                        flat.add_branch(branch);
                    }
                    _ => self.collect(flat, &fragment.selection_set)?,
                },
                Selection::FragmentSpread(spread) => {
                    let fragment = self.fragments.get(spread.name.name).ok_or_else(|| {
                        Error::new(
                            format!("Unknown fragment {}", spread.name.name),
                            ErrorType::Reference,
                        )
                    })?;
                    flat.spreads.push(AppliedSpread {
                        name: spread.name.name,
                        directives: &spread.directives,
                    });
                    flat.add_branch(fragment.clone());
                }
            }
        }
        Ok(())
    }

    fn flatten_field(&self, parent_type: &'a str, field: &'a Field<'a>) -> Result<FlatField<'a>> {
        let field_type: &'a TypeRef<'a> = if field.name == "__typename" {
            &TYPENAME_TYPE
        } else {
            self.schema
                .get_field(parent_type, field.name)
                .ok_or_else(|| {
                    Error::new(
                        format!("Unknown field {}.{}", parent_type, field.name),
                        ErrorType::Structural,
                    )
                })?
                .output_type
        };
        let selections = if field.selection_set.is_empty() {
            None
        } else {
            let type_name = field_type.named();
            self.check_composite(type_name, parent_type)?;
            Some(self.flatten_selection_set(&field.selection_set, type_name)?)
        };
        Ok(FlatField {
            response_key: field.alias_or_name(),
            name: field.name,
            parent_type,
            field_type,
            arguments: &field.arguments,
            directives: field.directives.children.iter().collect(),
            selections,
        })
    }
}

fn collect_spreads<'a>(selection_set: &'a SelectionSet<'a>, spreads: &mut Vec<&'a str>) {
    for selection in selection_set.selections.iter() {
        match selection {
            Selection::Field(field) => collect_spreads(&field.selection_set, spreads),
            Selection::InlineFragment(fragment) => {
                collect_spreads(&fragment.selection_set, spreads)
            }
            Selection::FragmentSpread(spread) => spreads.push(spread.name.name),
        }
    }
}

fn unknown_fragment(name: &str, document: &CollectedDocument) -> Error {
    Error::new(
        format!("Unknown fragment {name} spread in {}", document.name),
        ErrorType::Reference,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const SCHEMA: &str = indoc! {"
        type Query { user: User, node: Node, search: [SearchResult] }
        interface Node { id: ID! }
        type User implements Node { id: ID!, name: String, friends: [User!]! }
        type Post implements Node { id: ID!, title: String }
        union SearchResult = User | Post
    "};

    fn flatten<'a>(
        ctx: &'a ASTContext,
        source: &str,
    ) -> Result<(DocumentSet<'a>, FlatDocuments<'a>)> {
        let schema = Schema::parse(ctx, SCHEMA)?;
        let mut documents = DocumentSet::new();
        documents.add_source(ctx, "test.graphql", source)?;
        let flat = Flattener::new(schema, &documents).run()?;
        Ok((documents, flat))
    }

    #[test]
    fn merges_fields_and_fragments() {
        let ctx = ASTContext::new();
        let (documents, flat) = flatten(
            &ctx,
            indoc! {"
                query Q { user { id ...UserName friends { id } friends { name } } }
                fragment UserName on User { name __typename }
            "},
        )
        .unwrap();
        let query = flat.get(documents.get(DocumentKind::Query, "Q").unwrap()).unwrap();
        let user = query.field("user").unwrap().selections.as_ref().unwrap();
        let keys: Vec<_> = user.fields.iter().map(|field| field.response_key).collect();
        assert_eq!(keys, ["id", "name", "__typename", "friends"]);
        assert_eq!(user.spreads[0].name, "UserName");
        assert!(user.branches.is_empty());
        let friends = user.field("friends").unwrap();
        assert!(friends.field_type.is_list());
        assert_eq!(friends.selections.as_ref().unwrap().fields.len(), 2);
        assert!(user.has_identity(&Config::default()));
        assert!(!query.has_identity(&Config::default()));
    }

    #[test]
    fn groups_type_branches() {
        let ctx = ASTContext::new();
        let (documents, flat) = flatten(
            &ctx,
            indoc! {"
                query Q {
                    node { id ... on User { name } ... on Post { title } ... on User { id } }
                    search { ...PostTitle }
                }
                fragment PostTitle on Post { id title }
            "},
        )
        .unwrap();
        let query = flat.get(documents.get(DocumentKind::Query, "Q").unwrap()).unwrap();
        let node = query.field("node").unwrap().selections.as_ref().unwrap();
        assert_eq!(node.branches.len(), 2);
        assert_eq!(node.branches[0].type_name(), "User");
        assert_eq!(node.branches[0].selections.fields.len(), 2);
        let search = query.field("search").unwrap().selections.as_ref().unwrap();
        assert_eq!(search.branches[0].type_name(), "Post");
        assert_eq!(search.spreads[0].name, "PostTitle");
    }

    #[test]
    fn resolves_fragment_chains_in_any_order() {
        let ctx = ASTContext::new();
        let (documents, flat) = flatten(
            &ctx,
            indoc! {"
                fragment A on User { ...B }
                fragment B on User { ...C name }
                fragment C on User { id }
            "},
        )
        .unwrap();
        let a = flat.get(documents.fragment("A").unwrap()).unwrap();
        let keys: Vec<_> = a.fields.iter().map(|field| field.response_key).collect();
        assert_eq!(keys, ["id", "name"]);
        let spreads: Vec<_> = a.spreads.iter().map(|spread| spread.name).collect();
        assert_eq!(spreads, ["B", "C"]);
    }

    #[test]
    fn errors() {
        let ctx = ASTContext::new();
        let err = flatten(&ctx, "fragment A on User { ...B } fragment B on User { ...A }")
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Structural);
        assert_eq!(err.message(), "Fragments A, B spread each other in a cycle");

        let err = flatten(&ctx, "query Q { user { ...Missing } }").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Reference);

        let err = flatten(&ctx, "fragment A on User { ...Missing }").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Reference);

        let err = flatten(&ctx, "query Q { user { age } }").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Structural);
        assert_eq!(err.message(), "Unknown field User.age");

        let err = flatten(&ctx, "query Q { user { name { length } } }").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Structural);
    }
}
