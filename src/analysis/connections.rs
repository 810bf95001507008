use crate::ast::*;
use crate::config::Config;
use crate::documents::{CollectedDocument, DocumentKind, DocumentSet};
use crate::error::{Error, ErrorType};
use crate::patch::ListOperation;
use crate::schema::{Schema, TypeRef};
use crate::visit::{SelectionPath, VisitFlow, VisitInfo, VisitNode, Visitor};
use bumpalo::collections::Vec as BumpVec;
use hashbrown::HashMap;
use std::collections::BTreeMap;

/// A list field marked as a connection, which mutations may add entities to or remove them from.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionDescriptor<'a> {
    pub name: &'a str,
    /// The list's element type, unwrapped from list and non-null wrappers.
    pub element_type: &'a str,
    /// The type the connection field is selected on.
    pub parent_type: &'a str,
    pub field_name: &'a str,
    pub document: &'a str,
    pub filename: &'a str,
    pub declared_in_fragment: bool,
    /// Set when the connection is reached from an operation's root through singular fields only,
    /// which means there's exactly one instance of it and list operations need no parent id.
    pub free: bool,
    /// The response path of the connection field within its declaring document.
    pub path: SelectionPath,
    pub(crate) field: &'a Field<'a>,
}

/// Every connection declared in a set of documents, keyed by their unique names.
#[derive(Debug, Default)]
pub struct ConnectionRegistry<'a> {
    connections: BTreeMap<&'a str, ConnectionDescriptor<'a>>,
    fragments: HashMap<String, (&'a str, ListOperation)>,
}

impl<'a> ConnectionRegistry<'a> {
    /// Scans the user-written documents for connections.
    ///
    /// Misused connection directives are reported into `errors`, after which the scan continues
    /// so that every problem is reported in one run.
    pub fn collect(
        schema: &'a Schema<'a>,
        config: &Config,
        documents: &DocumentSet<'a>,
        errors: &mut Vec<Error>,
    ) -> Self {
        let mut registry = ConnectionRegistry::default();
        for document in documents.sorted() {
            if document.generated {
                continue;
            }
            // A missing root type is reported once the document is flattened
            let Ok(root_type) = document.root_type(schema) else {
                continue;
            };
            let mut scan = ConnectionScan::new(schema, config, *document, root_type);
            document.definition.visit(&mut (), &mut scan);
            errors.append(&mut scan.errors);
            for descriptor in scan.found {
                registry.add(config, descriptor, errors);
            }
        }
        tracing::debug!(connections = registry.len(), "collected connections");
        registry
    }

    fn add(&mut self, config: &Config, descriptor: ConnectionDescriptor<'a>, errors: &mut Vec<Error>) {
        if let Some(existing) = self.connections.get(descriptor.name) {
            errors.push(Error::new(
                format!(
                    "Connection name {} is declared in both {} ({}) and {} ({})",
                    descriptor.name,
                    existing.document,
                    existing.filename,
                    descriptor.document,
                    descriptor.filename
                ),
                ErrorType::Policy,
            ));
            return;
        }
        tracing::trace!(
            connection = descriptor.name,
            element_type = descriptor.element_type,
            free = descriptor.free,
            "registered connection"
        );
        self.fragments.insert(
            config.insert_fragment_name(descriptor.name),
            (descriptor.name, ListOperation::Add),
        );
        self.fragments.insert(
            config.remove_fragment_name(descriptor.name),
            (descriptor.name, ListOperation::Remove),
        );
        self.connections.insert(descriptor.name, descriptor);
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&ConnectionDescriptor<'a>> {
        self.connections.get(name)
    }

    /// Answers which connection and which list operation a spread of the named fragment means.
    pub fn lookup(&self, fragment_name: &str) -> Option<(&ConnectionDescriptor<'a>, ListOperation)> {
        let (name, operation) = self.fragments.get(fragment_name)?;
        Some((self.connections.get(name)?, *operation))
    }

    /// Iterates over all connections sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &ConnectionDescriptor<'a>> {
        self.connections.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Creates the insert and remove fragments of every connection.
    ///
    /// An insert fragment selects what the connection field selects plus any missing identity
    /// fields, while a remove fragment only selects the identity fields.
    pub fn synthesize(&self, ctx: &'a ASTContext, config: &Config) -> Vec<CollectedDocument<'a>> {
        let mut documents = Vec::with_capacity(self.connections.len() * 2);
        for descriptor in self.connections.values() {
            let keys = config.keys_for(descriptor.element_type);
            let selection_set = &descriptor.field.selection_set;

            let mut insert = BumpVec::new_in(&ctx.arena);
            insert.extend(selection_set.selections.iter().cloned());
            for key in keys.iter().filter(|key| !selects_field(selection_set, key)) {
                insert.push(Selection::Field(Field::new_leaf(ctx, ctx.alloc_str(key))));
            }
            let mut remove = BumpVec::new_in(&ctx.arena);
            for key in keys.iter() {
                remove.push(Selection::Field(Field::new_leaf(ctx, ctx.alloc_str(key))));
            }

            let name = config.insert_fragment_name(descriptor.name);
            documents.push(fragment_document(ctx, descriptor, name, insert));
            let name = config.remove_fragment_name(descriptor.name);
            documents.push(fragment_document(ctx, descriptor, name, remove));
        }
        documents
    }
}

fn fragment_document<'a>(
    ctx: &'a ASTContext,
    descriptor: &ConnectionDescriptor<'a>,
    name: String,
    selections: BumpVec<'a, Selection<'a>>,
) -> CollectedDocument<'a> {
    let name = ctx.alloc_string(name);
    let definition = ctx.alloc(Definition::Fragment(FragmentDefinition {
        name: NamedType { name },
        type_condition: NamedType {
            name: descriptor.element_type,
        },
        directives: Directives::default_in(&ctx.arena),
        selection_set: SelectionSet { selections },
    }));
    CollectedDocument {
        name,
        kind: DocumentKind::Fragment,
        definition,
        filename: descriptor.filename,
        generated: true,
    }
}

fn selects_field(selection_set: &SelectionSet, name: &str) -> bool {
    selection_set
        .selections
        .iter()
        .filter_map(Selection::field)
        .any(|field| field.name == name)
}

struct Scope<'a> {
    type_name: Option<&'a str>,
    list: bool,
}

/// Finds connection directives in a single document, tracking the type of each selection set.
struct ConnectionScan<'a, 'c> {
    schema: &'a Schema<'a>,
    config: &'c Config,
    document: CollectedDocument<'a>,
    scopes: Vec<Scope<'a>>,
    /// The number of enclosing list fields.
    lists: usize,
    found: Vec<ConnectionDescriptor<'a>>,
    errors: Vec<Error>,
}

impl<'a, 'c> ConnectionScan<'a, 'c> {
    fn new(
        schema: &'a Schema<'a>,
        config: &'c Config,
        document: CollectedDocument<'a>,
        root_type: &'a str,
    ) -> Self {
        ConnectionScan {
            schema,
            config,
            document,
            scopes: vec![Scope {
                type_name: Some(root_type),
                list: false,
            }],
            lists: 0,
            found: Vec::new(),
            errors: Vec::new(),
        }
    }

    #[inline]
    fn current_type(&self) -> Option<&'a str> {
        self.scopes.last().and_then(|scope| scope.type_name)
    }

    fn register(
        &mut self,
        parent_type: &'a str,
        field: &'a Field<'a>,
        field_type: &'a TypeRef<'a>,
        directive: &'a Directive<'a>,
        path: &SelectionPath,
    ) {
        let name = match directive
            .arguments
            .get(&self.config.connection_name_arg)
            .and_then(Value::as_str)
        {
            Some(name) => name,
            None => {
                self.errors.push(Error::new(
                    format!(
                        "@{} on {} in {} needs a string `{}` argument",
                        self.config.connection_directive,
                        path,
                        self.document.name,
                        self.config.connection_name_arg
                    ),
                    ErrorType::Policy,
                ));
                return;
            }
        };

        let element_type = field_type.named();
        let keys = self.config.keys_for(element_type);
        let selected = keys
            .iter()
            .all(|key| selects_field(&field.selection_set, key));
        let exposed = keys
            .iter()
            .all(|key| self.schema.get_field(element_type, key).is_some());
        if keys.is_empty() || (!selected && !exposed) {
            self.errors.push(Error::new(
                format!(
                    "Connection {name} in {} lists {element_type}, which has no identity field {}",
                    self.document.name,
                    keys.join(", ")
                ),
                ErrorType::Policy,
            ));
            return;
        }

        self.found.push(ConnectionDescriptor {
            name,
            element_type,
            parent_type,
            field_name: field.name,
            document: self.document.name,
            filename: self.document.filename,
            declared_in_fragment: self.document.is_fragment(),
            free: !self.document.is_fragment() && self.lists == 0,
            path: path.clone(),
            field,
        });
    }
}

impl<'a, 'c> Visitor<'a> for ConnectionScan<'a, 'c> {
    fn enter_field(&mut self, _ctx: &mut (), field: &'a Field<'a>, info: &VisitInfo) -> VisitFlow {
        let parent_type = self.current_type();
        let field_type = parent_type
            .filter(|_| field.name != "__typename")
            .and_then(|parent_type| self.schema.get_field(parent_type, field.name))
            .map(|schema_field| schema_field.output_type);
        if let (Some(parent_type), Some(field_type)) = (parent_type, field_type) {
            if let Some(directive) = field.directives.get(&self.config.connection_directive) {
                self.register(parent_type, field, field_type, directive, &info.path);
            }
        }
        let list = field_type.map_or(false, TypeRef::is_list);
        if list {
            self.lists += 1;
        }
        self.scopes.push(Scope {
            type_name: field_type.map(TypeRef::named),
            list,
        });
        VisitFlow::Next
    }

    fn leave_field(&mut self, _ctx: &mut (), _field: &'a Field<'a>, _info: &VisitInfo) -> VisitFlow {
        if let Some(Scope { list: true, .. }) = self.scopes.pop() {
            self.lists -= 1;
        }
        VisitFlow::Next
    }

    fn enter_inline_fragment(
        &mut self,
        _ctx: &mut (),
        inline_fragment: &'a InlineFragment<'a>,
        _info: &VisitInfo,
    ) -> VisitFlow {
        let type_name = match inline_fragment.type_condition {
            Some(condition) => Some(condition.name),
            None => self.current_type(),
        };
        self.scopes.push(Scope {
            type_name,
            list: false,
        });
        VisitFlow::Next
    }

    fn leave_inline_fragment(
        &mut self,
        _ctx: &mut (),
        _inline_fragment: &'a InlineFragment<'a>,
        _info: &VisitInfo,
    ) -> VisitFlow {
        self.scopes.pop();
        VisitFlow::Next
    }
}
