use super::connections::{ConnectionDescriptor, ConnectionRegistry};
use super::flatten::{AppliedSpread, FlatDocuments, FlatSelectionSet};
use crate::ast::{Directive, Value};
use crate::config::Config;
use crate::documents::{DocumentKind, DocumentSet};
use crate::error::{Error, ErrorType, Result};
use crate::patch::{
    ConditionValue, Conditions, ConnectionOperation, ListOperation, ParentId, Position,
};
use crate::schema::{Schema, SchemaType};
use crate::visit::SelectionPath;
use std::collections::BTreeMap;

/// Type name → field name → mutation name → every path at which the mutation returns the field.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MutationFieldMap {
    types: BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<SelectionPath>>>>,
}

impl MutationFieldMap {
    pub fn register(&mut self, type_name: &str, field_name: &str, mutation: &str, path: SelectionPath) {
        let paths = self
            .types
            .entry(type_name.to_string())
            .or_default()
            .entry(field_name.to_string())
            .or_default()
            .entry(mutation.to_string())
            .or_default();
        if !paths.contains(&path) {
            tracing::trace!(type_name, field_name, mutation, path = %path, "registered field update");
            paths.push(path);
        }
    }

    /// Returns the mutations updating a field, with the paths they return it at.
    pub fn get(
        &self,
        type_name: &str,
        field_name: &str,
    ) -> Option<&BTreeMap<String, Vec<SelectionPath>>> {
        self.types.get(type_name)?.get(field_name)
    }

    pub fn contains_field(&self, field_name: &str) -> bool {
        self.types.values().any(|fields| fields.contains_key(field_name))
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over `(type, field, mutation, paths)` entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str, &[SelectionPath])> {
        self.types.iter().flat_map(|(type_name, fields)| {
            fields.iter().flat_map(move |(field_name, mutations)| {
                mutations.iter().map(move |(mutation, paths)| {
                    (
                        type_name.as_str(),
                        field_name.as_str(),
                        mutation.as_str(),
                        paths.as_slice(),
                    )
                })
            })
        })
    }
}

/// The result of mapping every mutation: the fields they update and the list operations they
/// perform, keyed by the element type of the lists operated on.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MutationImpact {
    pub fields: MutationFieldMap,
    operations: BTreeMap<String, BTreeMap<String, Vec<ConnectionOperation>>>,
}

impl MutationImpact {
    /// Maps every mutation in the document set.
    ///
    /// Returns a fatal error for a mutation whose root field's response key is an identity key,
    /// while misused list directives are reported into `errors`.
    pub fn build<'a>(
        schema: &'a Schema<'a>,
        config: &Config,
        registry: &ConnectionRegistry<'a>,
        documents: &DocumentSet<'a>,
        flat: &FlatDocuments<'a>,
        errors: &mut Vec<Error>,
    ) -> Result<Self> {
        let mut mapper = ImpactMapper {
            schema,
            config,
            registry,
            impact: MutationImpact::default(),
            errors,
        };
        for document in documents.of_kind(DocumentKind::Mutation) {
            let Some(selections) = flat.get(document) else {
                continue;
            };
            for field in selections.fields.iter() {
                if config.is_any_identity_key(field.response_key) {
                    return Err(Error::new(
                        format!(
                            "Mutation {} selects {} as a root field, which is reserved for identity fields",
                            document.name, field.response_key
                        ),
                        ErrorType::Structural,
                    ));
                }
            }
            mapper.walk(document.name, selections, &SelectionPath::new(), false);
        }
        let impact = mapper.impact;
        tracing::debug!(
            operations = impact.operation_count(),
            "mapped mutation impact"
        );
        Ok(impact)
    }

    fn add_operation(&mut self, mutation: &str, operation: ConnectionOperation) {
        tracing::trace!(
            mutation,
            operation = %operation.operation,
            type_name = %operation.type_name,
            path = %operation.path,
            "registered list operation"
        );
        let operations = self
            .operations
            .entry(operation.type_name.clone())
            .or_default()
            .entry(mutation.to_string())
            .or_default();
        if !operations.contains(&operation) {
            operations.push(operation);
        }
    }

    /// Returns the list operations performed on lists of the given element type, per mutation.
    pub fn operations(&self, type_name: &str) -> Option<&BTreeMap<String, Vec<ConnectionOperation>>> {
        self.operations.get(type_name)
    }

    /// Returns whether any mutation operates on the named connection.
    pub fn targets_connection(&self, connection: &str) -> bool {
        self.operations
            .values()
            .flat_map(BTreeMap::values)
            .flatten()
            .any(|operation| operation.connection.as_deref() == Some(connection))
    }

    pub fn operation_count(&self) -> usize {
        self.operations
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }
}

struct ImpactMapper<'a, 'r> {
    schema: &'a Schema<'a>,
    config: &'r Config,
    registry: &'r ConnectionRegistry<'a>,
    impact: MutationImpact,
    errors: &'r mut Vec<Error>,
}

impl<'a, 'r> ImpactMapper<'a, 'r> {
    fn walk(
        &mut self,
        mutation: &str,
        selections: &FlatSelectionSet<'a>,
        path: &SelectionPath,
        inherited_gate: bool,
    ) {
        let gate = inherited_gate || selections.has_identity(self.config);
        let registry = self.registry;
        if !path.is_empty() {
            for spread in selections.spreads.iter() {
                if let Some((descriptor, operation)) = registry.lookup(spread.name) {
                    let operation = self.list_operation(mutation, descriptor, operation, spread, path);
                    if let Some(operation) = operation {
                        self.impact.add_operation(mutation, operation);
                    }
                }
            }
        }

        for field in selections.fields.iter() {
            let field_path = path.child(field.response_key);
            if let Some(nested) = &field.selections {
                self.walk(mutation, nested, &field_path, false);
                continue;
            }
            for directive in field.directives.iter() {
                if let Some(type_name) = self.config.deleted_type(directive.name) {
                    self.delete_operation(mutation, type_name, &field_path);
                }
            }
            if gate && !self.config.is_identity_key(selections.type_name, field.name) {
                self.impact
                    .fields
                    .register(selections.type_name, field.name, mutation, field_path);
            }
        }

        for branch in selections.branches.iter() {
            self.walk(mutation, &branch.selections, path, gate);
        }
    }

    fn delete_operation(&mut self, mutation: &str, type_name: &str, path: &SelectionPath) {
        if self.schema.get_type(type_name).is_none() {
            self.errors.push(Error::new(
                format!(
                    "@{} in {mutation} deletes unknown type {type_name}",
                    self.config.delete_directive(type_name)
                ),
                ErrorType::Policy,
            ));
            return;
        }
        let operation = ConnectionOperation {
            operation: ListOperation::Delete,
            connection: None,
            type_name: type_name.to_string(),
            path: path.clone(),
            position: None,
            parent_id: None,
            conditions: None,
        };
        self.impact.add_operation(mutation, operation);
    }

    fn list_operation(
        &mut self,
        mutation: &str,
        descriptor: &ConnectionDescriptor<'a>,
        operation: ListOperation,
        spread: &AppliedSpread<'a>,
        path: &SelectionPath,
    ) -> Option<ConnectionOperation> {
        let config = self.config;
        let prepend = spread.directive(&config.prepend_directive);
        let append = spread.directive(&config.append_directive);
        let list_directive = prepend.or(append);

        let position = match operation {
            ListOperation::Add if prepend.is_some() => Some(Position::Start),
            ListOperation::Add if append.is_some() => Some(Position::End),
            ListOperation::Add => Some(config.default_position),
            ListOperation::Remove | ListOperation::Delete => None,
        };

        let parent_value = list_directive
            .and_then(|directive| directive.arguments.get(&config.parent_id_arg))
            .or_else(|| {
                spread
                    .directive(&config.parent_id_directive)
                    .and_then(|directive| directive.arguments.get(&config.parent_id_value_arg))
            });
        let parent_id = match parent_value {
            Some(value) => Some(self.parent_id(mutation, descriptor, value)?),
            None if descriptor.free => Some(ParentId::Root),
            None => None,
        };

        let mut conditions = Conditions::default();
        if let Some(directive) = list_directive {
            if let Some(value) = directive.arguments.get(&config.when_directive) {
                self.conditions_from_object(mutation, descriptor, value, &mut conditions.must)?;
            }
            if let Some(value) = directive.arguments.get(&config.when_not_directive) {
                self.conditions_from_object(mutation, descriptor, value, &mut conditions.must_not)?;
            }
        }
        if let Some(directive) = spread.directive(&config.when_directive) {
            self.conditions_from_directive(mutation, descriptor, directive, &mut conditions.must)?;
        }
        if let Some(directive) = spread.directive(&config.when_not_directive) {
            self.conditions_from_directive(
                mutation,
                descriptor,
                directive,
                &mut conditions.must_not,
            )?;
        }

        Some(ConnectionOperation {
            operation,
            connection: Some(descriptor.name.to_string()),
            type_name: descriptor.element_type.to_string(),
            path: path.clone(),
            position,
            parent_id,
            conditions: Some(conditions).filter(|conditions| !conditions.is_empty()),
        })
    }

    fn parent_id(
        &mut self,
        mutation: &str,
        descriptor: &ConnectionDescriptor<'a>,
        value: &Value<'a>,
    ) -> Option<ParentId> {
        match value {
            Value::String(string) => Some(ParentId::String(string.value.to_string())),
            Value::Int(int) => Some(ParentId::String(int.value.to_string())),
            Value::Variable(variable) => Some(ParentId::Variable(variable.name.to_string())),
            _ => {
                self.errors.push(Error::new(
                    format!(
                        "Parent id of connection {} in {mutation} must be a string or a variable",
                        descriptor.name
                    ),
                    ErrorType::Policy,
                ));
                None
            }
        }
    }

    fn conditions_from_object(
        &mut self,
        mutation: &str,
        descriptor: &ConnectionDescriptor<'a>,
        value: &Value<'a>,
        target: &mut BTreeMap<String, ConditionValue>,
    ) -> Option<()> {
        let Value::Object(object) = value else {
            self.errors.push(Error::new(
                format!(
                    "Conditions on connection {} in {mutation} must be an object",
                    descriptor.name
                ),
                ErrorType::Policy,
            ));
            return None;
        };
        for field in object.children.iter() {
            let value = self.condition_value(mutation, descriptor, field.name, &field.value)?;
            target.insert(field.name.to_string(), value);
        }
        Some(())
    }

    fn conditions_from_directive(
        &mut self,
        mutation: &str,
        descriptor: &ConnectionDescriptor<'a>,
        directive: &Directive<'a>,
        target: &mut BTreeMap<String, ConditionValue>,
    ) -> Option<()> {
        for argument in directive.arguments.children.iter() {
            let value = self.condition_value(mutation, descriptor, argument.name, &argument.value)?;
            target.insert(argument.name.to_string(), value);
        }
        Some(())
    }

    /// Types a condition's literal against the declared type of the connection field's argument.
    fn condition_value(
        &mut self,
        mutation: &str,
        descriptor: &ConnectionDescriptor<'a>,
        argument: &str,
        value: &Value<'a>,
    ) -> Option<ConditionValue> {
        let argument_type = self
            .schema
            .get_field(descriptor.parent_type, descriptor.field_name)
            .and_then(|field| field.get_argument(argument))
            .map(|argument| argument.input_type.named());
        let Some(type_name) = argument_type else {
            self.errors.push(Error::new(
                format!(
                    "Connection {} in {mutation} is filtered by unknown argument {}.{}({argument})",
                    descriptor.name, descriptor.parent_type, descriptor.field_name
                ),
                ErrorType::Policy,
            ));
            return None;
        };

        let typed = match (type_name, value) {
            ("Boolean", Value::Boolean(boolean)) => Some(ConditionValue::Boolean(boolean.value)),
            ("Int", Value::Int(int)) => lexical_core::parse::<i64>(int.value.as_bytes())
                .ok()
                .map(ConditionValue::Int),
            ("Float", Value::Float(float)) => lexical_core::parse::<f64>(float.value.as_bytes())
                .ok()
                .map(ConditionValue::Float),
            ("Float", Value::Int(int)) => lexical_core::parse::<f64>(int.value.as_bytes())
                .ok()
                .map(ConditionValue::Float),
            ("String" | "ID", Value::String(string)) => {
                Some(ConditionValue::String(string.value.to_string()))
            }
            ("ID", Value::Int(int)) => Some(ConditionValue::String(int.value.to_string())),
            (_, Value::Enum(value)) => match self.schema.get_type(type_name) {
                Some(SchemaType::Enum(schema_enum)) if schema_enum.values.contains(value.value) => {
                    Some(ConditionValue::String(value.value.to_string()))
                }
                _ => None,
            },
            _ => None,
        };
        if typed.is_none() {
            self.errors.push(Error::new(
                format!(
                    "Condition {argument} on connection {} in {mutation} doesn't match its type {type_name}",
                    descriptor.name
                ),
                ErrorType::Policy,
            ));
        }
        typed
    }
}
