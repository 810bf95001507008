//! # Configuration of an analysis run
//!
//! [Config] holds every directive and argument name the analysis looks for, the identity keys of
//! entity types, and the naming conventions for synthesized fragments and artifact paths.
//! Every field has a default, so a partial configuration only needs to list what it overrides.

use crate::patch::Position;
use serde::Deserialize;
use std::collections::BTreeMap;

#[cfg(feature = "json")]
use crate::error::{Error, ErrorType, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Directive marking a list field as a connection, `@connection` by default.
    pub connection_directive: String,
    /// Argument of the connection directive holding its name.
    pub connection_name_arg: String,
    pub prepend_directive: String,
    pub append_directive: String,
    /// Argument of `@prepend`/`@append` holding the parent's id.
    pub parent_id_arg: String,
    /// Standalone directive supplying a parent's id, `@parentID(value: ...)` by default.
    pub parent_id_directive: String,
    pub parent_id_value_arg: String,
    pub when_directive: String,
    pub when_not_directive: String,
    /// Suffix appended to a connection's name to name its insert fragment.
    pub insert_suffix: String,
    /// Suffix appended to a connection's name to name its remove fragment.
    pub remove_suffix: String,
    /// Suffix appended to a type's name to form the directive that deletes an entity of that type.
    pub delete_suffix: String,
    /// Fields identifying an entity of any type not listed in `type_keys`.
    pub identity_keys: Vec<String>,
    /// Per-type overrides of `identity_keys`.
    pub type_keys: BTreeMap<String, Vec<String>>,
    pub patch_directory: String,
    pub link_directory: String,
    /// File extension of artifacts, without a leading dot.
    pub extension: String,
    /// Position of added entities when neither `@prepend` nor `@append` is given.
    pub default_position: Position,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            connection_directive: "connection".into(),
            connection_name_arg: "name".into(),
            prepend_directive: "prepend".into(),
            append_directive: "append".into(),
            parent_id_arg: "parentID".into(),
            parent_id_directive: "parentID".into(),
            parent_id_value_arg: "value".into(),
            when_directive: "when".into(),
            when_not_directive: "when_not".into(),
            insert_suffix: "_insert".into(),
            remove_suffix: "_remove".into(),
            delete_suffix: "_delete".into(),
            identity_keys: vec!["id".into()],
            type_keys: BTreeMap::new(),
            patch_directory: "patches".into(),
            link_directory: "links".into(),
            extension: "json".into(),
            default_position: Position::End,
        }
    }
}

impl Config {
    /// Parses a configuration from JSON, with missing keys falling back to their defaults.
    #[cfg(feature = "json")]
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|err| {
            Error::new(
                format!("Invalid configuration: {err}"),
                ErrorType::Structural,
            )
        })
    }

    /// Returns the identity keys of the given type.
    pub fn keys_for(&self, type_name: &str) -> &[String] {
        self.type_keys
            .get(type_name)
            .unwrap_or(&self.identity_keys)
    }

    #[inline]
    pub fn is_identity_key(&self, type_name: &str, field_name: &str) -> bool {
        self.keys_for(type_name).iter().any(|key| key == field_name)
    }

    /// Returns whether the field name is an identity key of any type.
    pub fn is_any_identity_key(&self, field_name: &str) -> bool {
        self.identity_keys.iter().any(|key| key == field_name)
            || self
                .type_keys
                .values()
                .flatten()
                .any(|key| key == field_name)
    }

    #[inline]
    pub fn insert_fragment_name(&self, connection: &str) -> String {
        format!("{connection}{}", self.insert_suffix)
    }

    #[inline]
    pub fn remove_fragment_name(&self, connection: &str) -> String {
        format!("{connection}{}", self.remove_suffix)
    }

    /// Returns the name of the directive deleting an entity of the given type, e.g. `User_delete`.
    #[inline]
    pub fn delete_directive(&self, type_name: &str) -> String {
        format!("{type_name}{}", self.delete_suffix)
    }

    /// Returns the type a delete directive's name refers to, if it is one.
    pub fn deleted_type<'n>(&self, directive_name: &'n str) -> Option<&'n str> {
        directive_name
            .strip_suffix(self.delete_suffix.as_str())
            .filter(|type_name| !type_name.is_empty())
    }

    /// Path of the patch artifact for a (query, mutation) pair.
    pub fn patch_path(&self, query: &str, mutation: &str) -> String {
        format!(
            "{}/{query}_{mutation}.{}",
            self.patch_directory, self.extension
        )
    }

    /// Path of the link artifact of a mutation.
    pub fn link_path(&self, mutation: &str) -> String {
        format!("{}/{mutation}.{}", self.link_directory, self.extension)
    }

    /// Location of a patch artifact relative to the link directory.
    pub fn patch_link(&self, query: &str, mutation: &str) -> String {
        relative_path(&self.link_directory, &self.patch_path(query, mutation))
    }
}

/// Computes the path of `to` relative to the directory `from`, both relative to the same root.
fn relative_path(from: &str, to: &str) -> String {
    let from: Vec<&str> = from.split('/').filter(|s| !s.is_empty() && *s != ".").collect();
    let to: Vec<&str> = to.split('/').filter(|s| !s.is_empty() && *s != ".").collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut segments: Vec<&str> = Vec::with_capacity(from.len() + to.len() - 2 * common);
    segments.extend(std::iter::repeat("..").take(from.len() - common));
    segments.extend(&to[common..]);
    segments.join("/")
}
