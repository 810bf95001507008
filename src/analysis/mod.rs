//! # Mutation impact analysis
//!
//! The `analysis` module finds out which cached queries and fragments a mutation's result affects.
//! It runs in phases, each reading the previous phases' results:
//!
//! - [`ConnectionRegistry`] collects every list field marked as a connection and synthesizes the
//!   fragments that mutations spread to insert into or remove from it
//! - [`Flattener`] resolves all fragment spreads and inline fragments into [`FlatSelectionSet`]s
//! - [`MutationImpact`] maps every field and list that a mutation returns data for
//! - [`intersect`] matches that map against every query and fragment and produces [`PatchAtom`]s
//!
//! A selection set only takes part when it selects its type's identity fields, since only then
//! can a cache tell which entity a result belongs to. Identity fields themselves are never
//! patched.

mod connections;
mod flatten;
mod impact;
mod intersect;

pub use connections::*;
pub use flatten::*;
pub use impact::*;
pub use intersect::*;
