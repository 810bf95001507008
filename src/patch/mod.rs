//! # Patch trees and artifacts
//!
//! The `patch` module turns the [`PatchAtom`](crate::analysis::PatchAtom)s of an analysis into
//! one [`PatchNode`] tree per (query, mutation) pair and lays those trees out as
//! [`PatchArtifact`]s, along with one [`LinkArtifact`] per mutation indexing its patches.
//!
//! A patch tree follows the shape of the mutation's result:
//!
//! ```json
//! { "edges": { "updateUser": { "fields": { "name": [["user", "name"]] } } } }
//! ```
//!
//! Here the `name` that `updateUser` returns is copied to `user.name` in the query's data.

mod artifacts;
mod operation;
#[allow(clippy::module_inception)]
mod patch;

pub use artifacts::*;
pub use operation::*;
pub use patch::*;
