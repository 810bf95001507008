use crate::visit::SelectionPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The kind of change a mutation's result applies to a list.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListOperation {
    /// Insert the returned entity into a connection.
    Add,
    /// Remove the returned entity from a connection.
    Remove,
    /// Delete the entity identified by the returned id from every list holding it.
    Delete,
}

impl fmt::Display for ListOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListOperation::Add => f.write_str("add"),
            ListOperation::Remove => f.write_str("remove"),
            ListOperation::Delete => f.write_str("delete"),
        }
    }
}

/// Where an added entity is placed within a connection.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Start,
    #[default]
    End,
}

/// Identifies which parent entity owns the connection a list operation applies to.
///
/// Serialized as `{ "kind": "Root" }`, `{ "kind": "String", "value": "1" }` or
/// `{ "kind": "Variable", "value": "userID" }`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum ParentId {
    /// The connection hangs off the root type and needs no parent.
    Root,
    /// A literal id of the parent entity.
    String(String),
    /// The name of an operation variable holding the parent entity's id.
    Variable(String),
}

/// A literal value a connection's argument is compared against.
#[derive(Debug, PartialEq, PartialOrd, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Filters which instances of a connection an operation applies to, by their arguments.
///
/// An operation applies when every `must` argument equals its value and no `must_not`
/// argument does.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Conditions {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub must: BTreeMap<String, ConditionValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub must_not: BTreeMap<String, ConditionValue>,
}

impl Conditions {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty()
    }
}

/// A list operation registered by a mutation, before it's matched against queries.
#[derive(Debug, PartialEq, Clone)]
pub struct ConnectionOperation {
    pub operation: ListOperation,
    /// The connection this operation applies to; `None` for deletes, which apply to every list
    /// of the entity's type.
    pub connection: Option<String>,
    /// The element type of the list operated on.
    pub type_name: String,
    /// The mutation's response path to the field holding the entity.
    pub path: SelectionPath,
    /// Only set for additions.
    pub position: Option<Position>,
    pub parent_id: Option<ParentId>,
    pub conditions: Option<Conditions>,
}

/// A list operation as it's written into a patch, addressing the query's list by its path.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOperation {
    #[serde(rename = "parentID", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ParentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// The query's path to the list.
    pub path: SelectionPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Conditions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_name: Option<String>,
    /// The entity type a delete applies to.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

impl PatchOperation {
    /// Addresses a registered connection operation at a query's list.
    pub fn new(operation: &ConnectionOperation, query_path: SelectionPath) -> Self {
        let type_name = match operation.operation {
            ListOperation::Delete => Some(operation.type_name.clone()),
            ListOperation::Add | ListOperation::Remove => None,
        };
        PatchOperation {
            parent_id: operation.parent_id.clone(),
            position: operation.position,
            path: query_path,
            when: operation.conditions.clone().filter(|when| !when.is_empty()),
            connection_name: operation.connection.clone(),
            type_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parent_id_shape() {
        assert_eq!(
            serde_json::to_value(ParentId::Root).unwrap(),
            json!({ "kind": "Root" })
        );
        assert_eq!(
            serde_json::to_value(ParentId::Variable("userID".into())).unwrap(),
            json!({ "kind": "Variable", "value": "userID" })
        );
        assert_eq!(
            serde_json::from_value::<ParentId>(json!({ "kind": "String", "value": "1" })).unwrap(),
            ParentId::String("1".into())
        );
    }

    #[test]
    fn operation_shape() {
        let mut must = BTreeMap::new();
        must.insert("status".to_string(), ConditionValue::String("ACTIVE".into()));
        let operation = ConnectionOperation {
            operation: ListOperation::Add,
            connection: Some("Friends".into()),
            type_name: "User".into(),
            path: SelectionPath::from("addFriend.friend"),
            position: Some(Position::Start),
            parent_id: Some(ParentId::Root),
            conditions: Some(Conditions {
                must,
                must_not: BTreeMap::new(),
            }),
        };
        let patch = PatchOperation::new(&operation, SelectionPath::from("user.friends"));
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({
                "parentID": { "kind": "Root" },
                "position": "start",
                "path": ["user", "friends"],
                "when": { "must": { "status": "ACTIVE" } },
                "connectionName": "Friends"
            })
        );
    }

    #[test]
    fn delete_carries_type() {
        let operation = ConnectionOperation {
            operation: ListOperation::Delete,
            connection: None,
            type_name: "User".into(),
            path: SelectionPath::from("deleteUser.userID"),
            position: None,
            parent_id: None,
            conditions: None,
        };
        let patch = PatchOperation::new(&operation, SelectionPath::from("users"));
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "path": ["users"], "type": "User" })
        );
    }
}
