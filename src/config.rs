//! Merge configuration: which policy, which sources.
//!
//! The configuration is plain data (`serde::Deserialize`) so it can be read
//! from whatever file the caller uses. [`MergeConfig::validate`] is the
//! only place where a configuration is judged; it never fills in a default
//! policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No policy was named.
    #[error("No merge policy specified; expected one of none, strict, soft, smart, interactive")]
    PolicyMissing,
    /// The policy name is not known.
    #[error("Unknown merge policy: {0}")]
    UnknownPolicy(String),
    /// There is nothing to merge.
    #[error("No sources specified")]
    NoSources,
    /// A source has no repository URL.
    #[error("Source #{0} has an empty repository URL")]
    InvalidSourceUrl(usize),
    /// The interactive policy was selected without an operator.
    #[error("The interactive policy requires an operator")]
    OperatorRequired,
}

/// Name of a reconciliation policy, as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", rename_all = "lowercase")]
pub enum PolicyKind {
    /// The null policy.
    None,
    /// The strict policy.
    Strict,
    /// The soft policy.
    Soft,
    /// The smart policy.
    Smart,
    /// The interactive policy.
    Interactive,
}

impl PolicyKind {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Strict => "strict",
            Self::Soft => "soft",
            Self::Smart => "smart",
            Self::Interactive => "interactive",
        }
    }
}

impl FromStr for PolicyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "strict" => Ok(Self::Strict),
            "soft" => Ok(Self::Soft),
            "smart" => Ok(Self::Smart),
            "interactive" => Ok(Self::Interactive),
            "" => Err(ConfigError::PolicyMissing),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

impl TryFrom<String> for PolicyKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_branch() -> String {
    "master".to_string()
}

/// A knowledge-base source: where statements come from and how much to
/// trust them. Lower rank means more trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Repository URL.
    pub repo: String,
    /// Branch the statements were read from.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Trust rank.
    #[serde(default)]
    pub rank: i32,
    /// Whether the source claims signed commits. Recorded, not verified.
    #[serde(default)]
    pub signed: bool,
}

impl SourceConfig {
    /// Create a source on the `master` branch.
    pub fn new(repo: impl Into<String>, rank: i32) -> Self {
        Self {
            repo: repo.into(),
            branch: default_branch(),
            rank,
            signed: false,
        }
    }

    /// Set the branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }
}

/// Configuration of one merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Policy to apply. Required.
    #[serde(default)]
    pub policy: Option<PolicyKind>,
    /// Sources, in ingestion order.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl MergeConfig {
    /// Check the configuration and return the selected policy.
    pub fn validate(&self) -> Result<PolicyKind, ConfigError> {
        let policy = self.policy.ok_or(ConfigError::PolicyMissing)?;

        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        if let Some(i) = self.sources.iter().position(|s| s.repo.trim().is_empty()) {
            return Err(ConfigError::InvalidSourceUrl(i));
        }

        Ok(policy)
    }
}
