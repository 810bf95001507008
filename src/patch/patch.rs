use super::operation::{ListOperation, PatchOperation};
use crate::analysis::{AtomKind, PatchAtom};
use crate::error::{Error, ErrorType, Result};
use crate::visit::SelectionPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The list operations applied to a list in a mutation's result.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperations {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<PatchOperation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<PatchOperation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delete: Vec<PatchOperation>,
}

impl PatchOperations {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty() && self.delete.is_empty()
    }

    pub fn get(&self, operation: ListOperation) -> &[PatchOperation] {
        match operation {
            ListOperation::Add => &self.add,
            ListOperation::Remove => &self.remove,
            ListOperation::Delete => &self.delete,
        }
    }

    fn get_mut(&mut self, operation: ListOperation) -> &mut Vec<PatchOperation> {
        match operation {
            ListOperation::Add => &mut self.add,
            ListOperation::Remove => &mut self.remove,
            ListOperation::Delete => &mut self.delete,
        }
    }
}

/// A tree following the shape of a mutation's result that tells a cache how to update one query.
///
/// At each level `fields` maps a response key of the mutation to the query paths its value is
/// copied to, `edges` descends into nested results, and `operations` lists what to do with the
/// entity at this level for the query's lists. Empty parts are left out when serialized.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchNode {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Vec<SelectionPath>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub edges: BTreeMap<String, PatchNode>,
    #[serde(default, skip_serializing_if = "PatchOperations::is_empty")]
    pub operations: PatchOperations,
}

impl PatchNode {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.edges.is_empty() && self.operations.is_empty()
    }

    /// Follows a path of response keys through this tree's edges.
    pub fn edge(&self, path: &SelectionPath) -> Option<&PatchNode> {
        path.iter().try_fold(self, |node, segment| node.edges.get(segment))
    }

    /// Folds an atom into the tree along its mutation path.
    pub fn insert(&mut self, atom: &PatchAtom) -> Result<()> {
        let Some((last, parents)) = atom.mutation_path.segments.split_last() else {
            return Err(Error::new(
                format!(
                    "Patch of {} by {} has an empty mutation path",
                    atom.query, atom.mutation
                ),
                ErrorType::Assertion,
            ));
        };
        let mut node = self;
        for segment in parents {
            node = node.edges.entry(segment.clone()).or_default();
        }
        match &atom.kind {
            AtomKind::Field => {
                let paths = node.fields.entry(last.clone()).or_default();
                if !paths.contains(&atom.query_path) {
                    paths.push(atom.query_path.clone());
                }
            }
            AtomKind::Connection(operation) => {
                let needs_parent = operation.operation != ListOperation::Delete;
                if needs_parent && operation.parent_id.is_none() {
                    return Err(Error::new(
                        format!(
                            "The {} operation of {} on {} reached a patch without a parent id",
                            operation.operation,
                            atom.mutation,
                            operation.connection.as_deref().unwrap_or(&operation.type_name)
                        ),
                        ErrorType::Assertion,
                    ));
                }
                let patch_operation = PatchOperation::new(operation, atom.query_path.clone());
                let operations = node
                    .edges
                    .entry(last.clone())
                    .or_default()
                    .operations
                    .get_mut(operation.operation);
                if !operations.contains(&patch_operation) {
                    operations.push(patch_operation);
                }
            }
        }
        Ok(())
    }
}

/// Groups atoms by their (query, mutation) pair and folds each group into a tree.
pub fn build_patches(atoms: &[PatchAtom]) -> Result<BTreeMap<(String, String), PatchNode>> {
    let mut patches: BTreeMap<(String, String), PatchNode> = BTreeMap::new();
    for atom in atoms {
        patches
            .entry((atom.query.clone(), atom.mutation.clone()))
            .or_default()
            .insert(atom)?;
    }
    tracing::debug!(patches = patches.len(), "built patch trees");
    Ok(patches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{ConnectionOperation, ParentId, Position};
    use serde_json::json;

    fn field_atom(mutation_path: &str, query_path: &str) -> PatchAtom {
        PatchAtom {
            mutation: "M".into(),
            mutation_path: SelectionPath::from(mutation_path),
            query: "Q".into(),
            query_path: SelectionPath::from(query_path),
            kind: AtomKind::Field,
        }
    }

    fn add_atom(parent_id: Option<ParentId>) -> PatchAtom {
        PatchAtom {
            mutation: "M".into(),
            mutation_path: SelectionPath::from("addFriend.friend"),
            query: "Q".into(),
            query_path: SelectionPath::from("user.friends"),
            kind: AtomKind::Connection(ConnectionOperation {
                operation: ListOperation::Add,
                connection: Some("Friends".into()),
                type_name: "User".into(),
                path: SelectionPath::from("addFriend.friend"),
                position: Some(Position::End),
                parent_id,
                conditions: None,
            }),
        }
    }

    #[test]
    fn folds_atoms() {
        let atoms = [
            field_atom("updateUser.name", "user.name"),
            field_atom("updateUser.name", "viewer.name"),
            field_atom("updateUser.name", "user.name"),
            field_atom("updateUser.best.name", "user.best.name"),
            add_atom(Some(ParentId::String("1234".into()))),
        ];
        let patches = build_patches(&atoms).unwrap();
        assert_eq!(patches.len(), 1);
        let patch = &patches[&("Q".to_string(), "M".to_string())];
        assert_eq!(
            serde_json::to_value(patch).unwrap(),
            json!({
                "edges": {
                    "updateUser": {
                        "fields": { "name": [["user", "name"], ["viewer", "name"]] },
                        "edges": {
                            "best": { "fields": { "name": [["user", "best", "name"]] } }
                        }
                    },
                    "addFriend": {
                        "edges": {
                            "friend": {
                                "operations": {
                                    "add": [{
                                        "parentID": { "kind": "String", "value": "1234" },
                                        "position": "end",
                                        "path": ["user", "friends"],
                                        "connectionName": "Friends"
                                    }]
                                }
                            }
                        }
                    }
                }
            })
        );
        let friend = patch.edge(&SelectionPath::from("addFriend.friend")).unwrap();
        assert_eq!(friend.operations.get(ListOperation::Add).len(), 1);
    }

    #[test]
    fn round_trips() {
        let atoms = [
            field_atom("updateUser.name", "user.name"),
            add_atom(Some(ParentId::Variable("id".into()))),
        ];
        let patches = build_patches(&atoms).unwrap();
        let patch = patches.values().next().unwrap();
        let json = serde_json::to_string(patch).unwrap();
        let parsed: PatchNode = serde_json::from_str(&json).unwrap();
        assert_eq!(&parsed, patch);
        assert!(!parsed.is_empty());
        assert!(PatchNode::default().is_empty());
        assert_eq!(serde_json::to_value(PatchNode::default()).unwrap(), json!({}));
    }

    #[test]
    fn assertions() {
        let err = build_patches(&[add_atom(None)]).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Assertion);

        let err = build_patches(&[field_atom("", "user.name")]).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Assertion);
    }
}
