//! # JSON Conversion
//!
//! The `graphql_cache_patch::json` module renders artifacts to the JSON that caches load at
//! runtime and parses patches back from it.
//!
//! The [ToJson] trait allows conversion to `serde_json` values using a `to_json` method on any
//! artifact. A [`PatchArtifact`] renders as its patch tree and a [`LinkArtifact`] as its map from
//! query and fragment names to patch locations.
//!
//! ```
//! use graphql_cache_patch::{json::*, patch::PatchNode};
//!
//! let patch = patch_from_json(r#"{ "fields": { "name": [["user", "name"]] } }"#).unwrap();
//! assert_eq!(patch.to_json_string().unwrap(), r#"{"fields":{"name":[["user","name"]]}}"#);
//! assert!(PatchNode::default().to_json().unwrap().as_object().unwrap().is_empty());
//! ```

use crate::error::{Error, ErrorType, Result};
use crate::patch::{ArtifactSet, LinkArtifact, PatchArtifact, PatchNode};
use serde::Serialize;
use serde_json::Value as JSValue;

/// Trait for artifacts that are written out as JSON.
pub trait ToJson {
    fn to_json(&self) -> Result<JSValue>;

    /// Renders the artifact as compact JSON text.
    fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&self.to_json()?).map_err(serialization_error)
    }

    /// Renders the artifact as indented JSON text.
    fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_json()?).map_err(serialization_error)
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<JSValue> {
    serde_json::to_value(value).map_err(serialization_error)
}

fn serialization_error(err: serde_json::Error) -> Error {
    Error::new(
        format!("Artifact could not be serialized: {err}"),
        ErrorType::Assertion,
    )
}

impl ToJson for PatchNode {
    #[inline]
    fn to_json(&self) -> Result<JSValue> {
        to_value(self)
    }
}

impl ToJson for PatchArtifact {
    #[inline]
    fn to_json(&self) -> Result<JSValue> {
        self.patch.to_json()
    }
}

impl ToJson for LinkArtifact {
    #[inline]
    fn to_json(&self) -> Result<JSValue> {
        to_value(&self.links)
    }
}

/// Parses a patch tree from the JSON of a patch artifact.
pub fn patch_from_json(source: &str) -> Result<PatchNode> {
    serde_json::from_str(source).map_err(|err| {
        Error::new(
            format!("Invalid patch: {err}"),
            ErrorType::Syntax,
        )
    })
}

/// Renders every artifact to its path and indented JSON text, patches first.
pub fn render_artifacts(artifacts: &ArtifactSet) -> Result<Vec<(String, String)>> {
    let patches = artifacts
        .patches
        .iter()
        .map(|artifact| Ok((artifact.path.clone(), artifact.to_json_pretty()?)));
    let links = artifacts
        .links
        .iter()
        .map(|artifact| Ok((artifact.path.clone(), artifact.to_json_pretty()?)));
    patches.chain(links).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::visit::SelectionPath;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn renders_artifacts() {
        let mut patch = PatchNode::default();
        patch
            .edges
            .entry("updateUser".into())
            .or_default()
            .fields
            .insert("name".into(), vec![SelectionPath::from("user.name")]);
        let mut patches = BTreeMap::new();
        patches.insert(("Q".to_string(), "M".to_string()), patch);
        let artifacts = ArtifactSet::new(&Config::default(), patches);

        assert_eq!(
            artifacts.patches[0].to_json().unwrap(),
            json!({ "edges": { "updateUser": { "fields": { "name": [["user", "name"]] } } } })
        );
        assert_eq!(
            artifacts.links[0].to_json().unwrap(),
            json!({ "Q": "../patches/Q_M.json" })
        );

        let rendered = render_artifacts(&artifacts).unwrap();
        let paths: Vec<_> = rendered.iter().map(|(path, _)| path.as_str()).collect();
        assert_eq!(paths, ["patches/Q_M.json", "links/M.json"]);
        let parsed = patch_from_json(&rendered[0].1).unwrap();
        assert_eq!(parsed, artifacts.patches[0].patch);
    }

    #[test]
    fn invalid_patch() {
        let err = patch_from_json(r#"{ "fields": { "name": "user" } }"#).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Syntax);
    }
}
