//! Extension metadata and load-request types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable metadata describing a registered extension.
///
/// `id` is the unique key under which the extension lives in the registry;
/// the manager rejects a second registration for the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionInfo {
    /// Unique extension id (lowercase, dots and hyphens allowed)
    pub id: String,

    /// Semantic version of the extension itself
    pub version: String,

    /// Author name(s)
    #[serde(default)]
    pub author: AuthorSpec,

    /// Icon asset reference
    #[serde(default)]
    pub icon: Option<String>,

    /// Inset icon asset reference (shown inside block headers)
    #[serde(default)]
    pub inset_icon: Option<String>,

    /// API level the extension targets
    pub api: u32,

    /// When true, failures to satisfy this extension as a dependency of
    /// another are non-fatal: the dependant loads without it.
    #[serde(default)]
    pub optional: bool,

    /// Required extension id → version requirement (and optionality)
    #[serde(default)]
    pub dependency: HashMap<String, DependencySpec>,
}

impl ExtensionInfo {
    /// Create metadata with no dependencies
    pub fn new(id: impl Into<String>, version: impl Into<String>, api: u32) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            author: AuthorSpec::default(),
            icon: None,
            inset_icon: None,
            api,
            optional: false,
            dependency: HashMap::new(),
        }
    }

    /// Add a required dependency with a version requirement
    pub fn with_dependency(
        mut self,
        id: impl Into<String>,
        requirement: impl Into<String>,
    ) -> Self {
        self.dependency
            .insert(id.into(), DependencySpec::Requirement(requirement.into()));
        self
    }

    /// Add an optional dependency: skipped without error when absent
    pub fn with_optional_dependency(
        mut self,
        id: impl Into<String>,
        requirement: impl Into<String>,
    ) -> Self {
        self.dependency.insert(
            id.into(),
            DependencySpec::Detailed {
                version: requirement.into(),
                optional: true,
            },
        );
        self
    }

    /// Mark the extension as optional for its dependants
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// One edge of the dependency map.
///
/// A bare string is a required dependency with a version requirement
/// (`"*"` or the empty string accept any version). The detailed form adds a
/// per-edge `optional` flag declared by the dependant: an optional dependency
/// that is absent or version-incompatible is skipped rather than fatal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DependencySpec {
    Requirement(String),
    Detailed {
        version: String,
        #[serde(default)]
        optional: bool,
    },
}

impl DependencySpec {
    /// The semver requirement string
    pub fn requirement(&self) -> &str {
        match self {
            DependencySpec::Requirement(version) | DependencySpec::Detailed { version, .. } => {
                version
            }
        }
    }

    /// Whether the dependant declared this edge optional
    pub fn is_optional(&self) -> bool {
        matches!(self, DependencySpec::Detailed { optional: true, .. })
    }
}

/// One author or several
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AuthorSpec {
    Single(String),
    Many(Vec<String>),
}

impl Default for AuthorSpec {
    fn default() -> Self {
        Self::Single(String::new())
    }
}

impl From<&str> for AuthorSpec {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

/// How an extension entered (or leaves) the loaded set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Request to tear the extension down
    Unload = 0,

    /// Explicitly requested by the caller
    InitiativeLoad = 1,

    /// Present only to satisfy another extension's dependency; may be
    /// deactivated once no longer needed
    PassiveLoad = 2,
}

impl std::fmt::Display for LoadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadMode::Unload => write!(f, "unload"),
            LoadMode::InitiativeLoad => write!(f, "initiative_load"),
            LoadMode::PassiveLoad => write!(f, "passive_load"),
        }
    }
}

/// A single entry of a load request or resolved load plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionLoadInfo {
    /// Extension id
    pub id: String,

    /// Requested or resolved load mode
    pub mode: LoadMode,
}

impl ExtensionLoadInfo {
    /// Create an explicitly requested entry
    pub fn initiative(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mode: LoadMode::InitiativeLoad,
        }
    }

    /// Create a dependency-only entry
    pub fn passive(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mode: LoadMode::PassiveLoad,
        }
    }
}
