//! Affected artifacts and vulnerability aliases.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An artifact (package) a vulnerability does or does not affect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifact {
    /// Package URL (purl) of the artifact.
    pub id: String,
    /// Why the artifact is (not) affected.
    #[serde(default)]
    pub reason: String,
    /// Whether the artifact is affected.
    #[serde(default)]
    pub affected: bool,
}

impl Artifact {
    /// Create a new artifact record.
    pub fn new(id: impl Into<String>, affected: bool, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
            affected,
        }
    }
}

/// Alternative identifier of a vulnerability (e.g. a tracker bug id).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alias(String);

impl Alias {
    /// Create an alias.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The alias value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Alias {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Alias {
    fn from(value: String) -> Self {
        Self(value)
    }
}
