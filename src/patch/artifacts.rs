use super::patch::PatchNode;
use crate::config::Config;
use serde::Serialize;
use std::collections::BTreeMap;

/// The patch of one (query, mutation) pair, addressed by a path relative to the output root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchArtifact {
    pub query: String,
    pub mutation: String,
    pub path: String,
    pub patch: PatchNode,
}

/// The index of a mutation's patches, mapping each affected query or fragment to the location of
/// its patch relative to the link artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkArtifact {
    pub mutation: String,
    pub path: String,
    pub links: BTreeMap<String, String>,
}

/// Everything an analysis run produces, sorted by name.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ArtifactSet {
    /// Sorted by query and then by mutation.
    pub patches: Vec<PatchArtifact>,
    /// Sorted by mutation.
    pub links: Vec<LinkArtifact>,
}

impl ArtifactSet {
    /// Lays out patch trees keyed by (query, mutation) as artifacts.
    pub fn new(config: &Config, patches: BTreeMap<(String, String), PatchNode>) -> Self {
        let mut links: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        let patches: Vec<PatchArtifact> = patches
            .into_iter()
            .filter(|(_, patch)| !patch.is_empty())
            .map(|((query, mutation), patch)| {
                links
                    .entry(mutation.clone())
                    .or_default()
                    .insert(query.clone(), config.patch_link(&query, &mutation));
                PatchArtifact {
                    path: config.patch_path(&query, &mutation),
                    query,
                    mutation,
                    patch,
                }
            })
            .collect();
        let links = links
            .into_iter()
            .map(|(mutation, links)| LinkArtifact {
                path: config.link_path(&mutation),
                mutation,
                links,
            })
            .collect();
        ArtifactSet { patches, links }
    }

    pub fn patch(&self, query: &str, mutation: &str) -> Option<&PatchArtifact> {
        self.patches
            .iter()
            .find(|artifact| artifact.query == query && artifact.mutation == mutation)
    }

    /// Returns the patch tree of a pair, which is empty when the mutation doesn't affect the query.
    pub fn patch_tree(&self, query: &str, mutation: &str) -> PatchNode {
        self.patch(query, mutation)
            .map(|artifact| artifact.patch.clone())
            .unwrap_or_default()
    }

    pub fn link(&self, mutation: &str) -> Option<&LinkArtifact> {
        self.links.iter().find(|artifact| artifact.mutation == mutation)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty() && self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visit::SelectionPath;

    fn patch(field: &str) -> PatchNode {
        let mut patch = PatchNode::default();
        patch
            .fields
            .insert(field.into(), vec![SelectionPath::from("user.name")]);
        patch
    }

    #[test]
    fn lays_out_artifacts() {
        let mut patches = BTreeMap::new();
        patches.insert(("B".to_string(), "M".to_string()), patch("name"));
        patches.insert(("A".to_string(), "M".to_string()), patch("name"));
        patches.insert(("A".to_string(), "N".to_string()), patch("age"));
        patches.insert(("C".to_string(), "N".to_string()), PatchNode::default());
        let artifacts = ArtifactSet::new(&Config::default(), patches);

        let pairs: Vec<_> = artifacts
            .patches
            .iter()
            .map(|artifact| (artifact.query.as_str(), artifact.mutation.as_str()))
            .collect();
        assert_eq!(pairs, [("A", "M"), ("A", "N"), ("B", "M")]);
        assert_eq!(artifacts.patch("B", "M").unwrap().path, "patches/B_M.json");
        assert!(artifacts.patch("C", "N").is_none());
        assert!(artifacts.patch_tree("C", "N").is_empty());

        let link = artifacts.link("M").unwrap();
        assert_eq!(link.path, "links/M.json");
        assert_eq!(link.links["A"], "../patches/A_M.json");
        assert_eq!(link.links.len(), 2);
        assert_eq!(artifacts.link("N").unwrap().links.len(), 1);
    }
}
