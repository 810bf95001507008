use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered list of response keys leading from an operation's or fragment's root to a field.
///
/// Response keys are a field's alias when it has one and its name otherwise, so a path addresses
/// the location of a value in a response rather than a location in a document's source text.
/// A path serializes as a JSON array of strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionPath {
    pub segments: Vec<String>,
}

impl SelectionPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<S: Into<String>>(&mut self, segment: S) {
        self.segments.push(segment.into())
    }

    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    /// Returns a copy of this path with another segment appended.
    pub fn child<S: Into<String>>(&self, segment: S) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SelectionPath {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        SelectionPath {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<&str> for SelectionPath {
    /// Splits a dotted path, e.g. `"user.friends"`, into its segments.
    fn from(value: &str) -> Self {
        value.split('.').filter(|segment| !segment.is_empty()).collect()
    }
}

impl fmt::Display for SelectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}
