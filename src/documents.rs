//! # Collecting documents for an analysis run
//!
//! A [DocumentSet] holds every named operation and fragment definition of a project, each as a
//! [`CollectedDocument`] remembering the file it was declared in. Names are unique per
//! [`DocumentKind`] and anonymous operations are rejected, since artifacts are addressed by
//! document names. Queries and fragments are both patched, so they share one namespace.

use crate::ast::*;
use crate::error::{Error, ErrorType, Result};
use crate::schema::Schema;
use std::fmt;

/// The kind of a collected document.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum DocumentKind {
    Query,
    Mutation,
    Subscription,
    Fragment,
}

impl From<OperationKind> for DocumentKind {
    #[inline]
    fn from(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Query => DocumentKind::Query,
            OperationKind::Mutation => DocumentKind::Mutation,
            OperationKind::Subscription => DocumentKind::Subscription,
        }
    }
}

impl DocumentKind {
    /// Whether patch artifacts are generated for documents of this kind.
    #[inline]
    pub fn is_patched(self) -> bool {
        matches!(self, DocumentKind::Query | DocumentKind::Fragment)
    }

    /// Whether names of the two kinds may collide.
    #[inline]
    fn shares_names_with(self, other: DocumentKind) -> bool {
        self == other || (self.is_patched() && other.is_patched())
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Query => f.write_str("query"),
            DocumentKind::Mutation => f.write_str("mutation"),
            DocumentKind::Subscription => f.write_str("subscription"),
            DocumentKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// A named definition collected from a project's source files.
#[derive(Debug, Clone, Copy)]
pub struct CollectedDocument<'a> {
    pub name: &'a str,
    pub kind: DocumentKind,
    pub definition: &'a Definition<'a>,
    pub filename: &'a str,
    /// Set for fragments synthesized from a connection rather than written by a user.
    pub generated: bool,
}

impl<'a> CollectedDocument<'a> {
    /// Wraps a definition, failing for anonymous operations.
    pub fn new(filename: &'a str, definition: &'a Definition<'a>) -> Result<Self> {
        let (name, kind) = match definition {
            Definition::Operation(operation) => match operation.name {
                Some(name) => (name.name, operation.operation.into()),
                None => {
                    return Err(Error::new(
                        format!("Anonymous {} in {filename} can't be analyzed", DocumentKind::from(operation.operation)),
                        ErrorType::Structural,
                    ))
                }
            },
            Definition::Fragment(fragment) => (fragment.name.name, DocumentKind::Fragment),
        };
        Ok(CollectedDocument {
            name,
            kind,
            definition,
            filename,
            generated: false,
        })
    }

    #[inline]
    pub fn selection_set(&self) -> &'a SelectionSet<'a> {
        match self.definition {
            Definition::Operation(operation) => &operation.selection_set,
            Definition::Fragment(fragment) => &fragment.selection_set,
        }
    }

    #[inline]
    pub fn fragment(&self) -> Option<&'a FragmentDefinition<'a>> {
        match self.definition {
            Definition::Fragment(fragment) => Some(fragment),
            Definition::Operation(_) => None,
        }
    }

    #[inline]
    pub fn is_fragment(&self) -> bool {
        self.kind == DocumentKind::Fragment
    }

    /// Returns the name of the type this document's selection set is resolved against: the
    /// operation's root type or the fragment's type condition.
    pub fn root_type(&self, schema: &'a Schema<'a>) -> Result<&'a str> {
        match self.definition {
            Definition::Fragment(fragment) => Ok(fragment.type_condition.name),
            Definition::Operation(operation) => schema
                .get_root_type(operation.operation)
                .map(|object| object.name)
                .ok_or_else(|| {
                    Error::new(
                        format!(
                            "Schema has no {} root type needed by {}",
                            self.kind, self.name
                        ),
                        ErrorType::Structural,
                    )
                }),
        }
    }
}

/// The documents of an analysis run, in the order they were added.
#[derive(Debug, Default, Clone)]
pub struct DocumentSet<'a> {
    documents: Vec<CollectedDocument<'a>>,
}

impl<'a> DocumentSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a source file and collects each of its definitions.
    pub fn add_source<S: ToString>(
        &mut self,
        ctx: &'a ASTContext,
        filename: &str,
        source: S,
    ) -> Result<()> {
        let document = Document::parse(ctx, source)?;
        self.add_document(ctx.alloc_str(filename), document)
    }

    /// Collects each definition of an already parsed document.
    pub fn add_document(&mut self, filename: &'a str, document: &'a Document<'a>) -> Result<()> {
        for definition in document.definitions.iter() {
            self.add(CollectedDocument::new(filename, definition)?)?;
        }
        Ok(())
    }

    /// Collects a single document, failing when its name is taken by another of the same kind,
    /// or by a query or fragment when it's a query or fragment itself.
    pub fn add(&mut self, document: CollectedDocument<'a>) -> Result<()> {
        let existing = self.documents.iter().find(|existing| {
            existing.name == document.name && existing.kind.shares_names_with(document.kind)
        });
        match existing {
            Some(existing) if existing.kind == document.kind => Err(Error::new(
                format!(
                    "Duplicate {} name {} in {} and {}",
                    document.kind, document.name, existing.filename, document.filename
                ),
                ErrorType::Structural,
            )),
            Some(existing) => Err(Error::new(
                format!(
                    "The {} {} in {} and the {} {} in {} would share patch artifacts",
                    existing.kind,
                    existing.name,
                    existing.filename,
                    document.kind,
                    document.name,
                    document.filename
                ),
                ErrorType::Structural,
            )),
            None => {
                self.documents.push(document);
                Ok(())
            }
        }
    }

    pub fn get(&self, kind: DocumentKind, name: &str) -> Option<&CollectedDocument<'a>> {
        self.documents
            .iter()
            .find(|document| document.kind == kind && document.name == name)
    }

    #[inline]
    pub fn fragment(&self, name: &str) -> Option<&CollectedDocument<'a>> {
        self.get(DocumentKind::Fragment, name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectedDocument<'a>> {
        self.documents.iter()
    }

    /// Returns the documents of one kind sorted by name.
    pub fn of_kind(&self, kind: DocumentKind) -> Vec<&CollectedDocument<'a>> {
        let mut documents: Vec<_> = self
            .documents
            .iter()
            .filter(|document| document.kind == kind)
            .collect();
        documents.sort_by_key(|document| document.name);
        documents
    }

    /// Returns all documents sorted by kind and then by name.
    pub fn sorted(&self) -> Vec<&CollectedDocument<'a>> {
        let mut documents: Vec<_> = self.documents.iter().collect();
        documents.sort_by_key(|document| (document.kind, document.name));
        documents
    }
}
