use super::flatten::{FlatDocuments, FlatSelectionSet};
use super::impact::MutationImpact;
use crate::ast::Value;
use crate::config::Config;
use crate::documents::DocumentSet;
use crate::patch::{ConnectionOperation, ListOperation};
use crate::schema::Schema;
use crate::visit::SelectionPath;
use hashbrown::HashSet;

/// What a [PatchAtom] does to the query's data.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomKind {
    /// Copy the mutation's value of a scalar field into the query.
    Field,
    /// Apply a list operation to a connection in the query.
    Connection(ConnectionOperation),
}

/// A single interaction between a mutation and a query or fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchAtom {
    pub mutation: String,
    /// Where the mutation returns the data.
    pub mutation_path: SelectionPath,
    pub query: String,
    /// Where the query holds the data that's affected.
    pub query_path: SelectionPath,
    pub kind: AtomKind,
}

/// Finds every place in the user's queries and fragments that a mutation's result affects.
///
/// Each query and fragment is walked once, in name order, and duplicate interactions collapse
/// into a single atom.
pub fn intersect<'a>(
    schema: &'a Schema<'a>,
    config: &Config,
    impact: &MutationImpact,
    documents: &DocumentSet<'a>,
    flat: &FlatDocuments<'a>,
) -> Vec<PatchAtom> {
    let mut walker = Walker {
        schema,
        config,
        impact,
        atoms: Vec::new(),
        seen: HashSet::new(),
        seen_operations: HashSet::new(),
    };
    let mut visited = HashSet::new();
    for document in documents.sorted() {
        let patched = document.kind.is_patched() && !document.generated;
        if !patched || !visited.insert((document.kind, document.name)) {
            continue;
        }
        if let Some(selections) = flat.get(document) {
            walker.walk(document.name, selections, &SelectionPath::new(), false);
        }
    }
    tracing::debug!(atoms = walker.atoms.len(), "intersected documents");
    walker.atoms
}

struct Walker<'a, 'w> {
    schema: &'a Schema<'a>,
    config: &'w Config,
    impact: &'w MutationImpact,
    atoms: Vec<PatchAtom>,
    seen: HashSet<(String, SelectionPath, String, SelectionPath)>,
    /// Keyed by element type, mutation and index into the impact's operations.
    seen_operations: HashSet<(String, String, usize, String, SelectionPath)>,
}

impl<'a, 'w> Walker<'a, 'w> {
    fn walk(
        &mut self,
        query: &str,
        selections: &FlatSelectionSet<'a>,
        path: &SelectionPath,
        inherited_gate: bool,
    ) {
        let gate = inherited_gate || selections.has_identity(self.config);
        for field in selections.fields.iter() {
            let field_path = path.child(field.response_key);
            if let Some(directive) = field.directive(&self.config.connection_directive) {
                let name = directive
                    .arguments
                    .get(&self.config.connection_name_arg)
                    .and_then(Value::as_str);
                if let Some(name) = name {
                    self.connection_atoms(query, name, field.field_type.named(), &field_path);
                }
            }
            if let Some(nested) = &field.selections {
                self.walk(query, nested, &field_path, false);
            } else if gate && !self.config.is_identity_key(selections.type_name, field.name) {
                self.field_atoms(query, selections.type_name, field.name, &field_path);
            }
        }
        for branch in selections.branches.iter() {
            self.walk(query, &branch.selections, path, gate);
        }
    }

    fn field_atoms(&mut self, query: &str, type_name: &str, field_name: &str, path: &SelectionPath) {
        let impact = self.impact;
        for related in self.schema.related_types(type_name) {
            let Some(mutations) = impact.fields.get(related, field_name) else {
                continue;
            };
            for (mutation, mutation_paths) in mutations.iter() {
                for mutation_path in mutation_paths.iter() {
                    let key = (
                        mutation.clone(),
                        mutation_path.clone(),
                        query.to_string(),
                        path.clone(),
                    );
                    if self.seen.insert(key) {
                        self.atoms.push(PatchAtom {
                            mutation: mutation.clone(),
                            mutation_path: mutation_path.clone(),
                            query: query.to_string(),
                            query_path: path.clone(),
                            kind: AtomKind::Field,
                        });
                    }
                }
            }
        }
    }

    fn connection_atoms(
        &mut self,
        query: &str,
        connection: &str,
        element_type: &str,
        path: &SelectionPath,
    ) {
        let impact = self.impact;
        for related in self.schema.related_types(element_type) {
            let Some(mutations) = impact.operations(related) else {
                continue;
            };
            for (mutation, operations) in mutations.iter() {
                let matching = operations.iter().enumerate().filter(|(_, operation)| {
                    operation.operation == ListOperation::Delete
                        || operation.connection.as_deref() == Some(connection)
                });
                for (index, operation) in matching {
                    let key = (
                        related.to_string(),
                        mutation.clone(),
                        index,
                        query.to_string(),
                        path.clone(),
                    );
                    if self.seen_operations.insert(key) {
                        self.atoms.push(PatchAtom {
                            mutation: mutation.clone(),
                            mutation_path: operation.path.clone(),
                            query: query.to_string(),
                            query_path: path.clone(),
                            kind: AtomKind::Connection(operation.clone()),
                        });
                    }
                }
            }
        }
    }
}
