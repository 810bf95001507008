//! # Analysis pipeline
//!
//! [`analyze`] runs every phase over a set of documents, one after another, and turns the
//! documents into the patch and link artifacts a cache applies after mutations.
//!
//! Each phase only starts once the previous one finished. Findings that don't prevent the next
//! phase from running are collected so that a run reports all of them at once, but no artifact
//! is produced while any of them exist.

use crate::analysis::{intersect, ConnectionRegistry, Flattener, MutationImpact};
use crate::ast::ASTContext;
use crate::config::Config;
use crate::documents::DocumentSet;
use crate::error::{Error, Result};
use crate::patch::{build_patches, ArtifactSet};
use crate::schema::Schema;
use crate::validate::validate_documents;
use tracing::{debug, warn};

/// Analyzes which parts of each query a mutation's response updates and compiles the result
/// into cache patches.
///
/// The insert and remove fragments of every connection are allocated on `ctx`, next to the
/// documents, and are analyzed along with them.
///
/// ```
/// use graphql_cache_patch::{analyze, ast::ASTContext, config::Config};
/// use graphql_cache_patch::{documents::DocumentSet, schema::Schema};
///
/// let ctx = ASTContext::new();
/// let schema = Schema::parse(&ctx, "
///     type Query { user: User }
///     type Mutation { updateUser: User }
///     type User { id: ID!, name: String }
/// ").unwrap();
///
/// let mut documents = DocumentSet::new();
/// documents.add_source(&ctx, "user.graphql", "query User { user { id name } }").unwrap();
/// documents.add_source(&ctx, "rename.graphql", "mutation Rename { updateUser { id name } }").unwrap();
///
/// let artifacts = analyze(&ctx, schema, &documents, &Config::default()).unwrap();
/// assert_eq!(artifacts.patches[0].path, "patches/User_Rename.json");
/// ```
pub fn analyze<'a>(
    ctx: &'a ASTContext,
    schema: &'a Schema<'a>,
    documents: &DocumentSet<'a>,
    config: &Config,
) -> Result<ArtifactSet> {
    debug!(documents = documents.len(), "starting analysis");

    let mut errors = Vec::new();
    let registry = ConnectionRegistry::collect(schema, config, documents, &mut errors);

    let mut documents = documents.clone();
    for fragment in registry.synthesize(ctx, config) {
        documents.add(fragment)?;
    }

    let flat = match Flattener::new(schema, &documents).run() {
        Ok(flat) => flat,
        // Rejected connections have no fragments, so spreading them fails here
        Err(_) if !errors.is_empty() => return Err(Error::batch(errors)),
        Err(err) => return Err(err),
    };

    validate_documents(config, &registry, &documents, &mut errors);
    let impact = MutationImpact::build(schema, config, &registry, &documents, &flat, &mut errors)?;
    if !errors.is_empty() {
        return Err(Error::batch(errors));
    }
    for connection in registry.iter() {
        if !impact.targets_connection(connection.name) {
            warn!(
                connection = connection.name,
                document = connection.document,
                "connection isn't targeted by any mutation"
            );
        }
    }

    let atoms = intersect(schema, config, &impact, &documents, &flat);
    let patches = build_patches(&atoms)?;
    let artifacts = ArtifactSet::new(config, patches);
    debug!(
        patches = artifacts.patches.len(),
        links = artifacts.links.len(),
        "built artifacts"
    );
    Ok(artifacts)
}
