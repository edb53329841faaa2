//! Error types for mosaic-core

use thiserror::Error;

/// Result type alias using mosaic-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Stable numeric code for a required dependency that is missing or
/// version-incompatible. Callers may branch on this at the host boundary.
pub const ERROR_UNAVAILABLE_EXTENSION: u8 = 0x90;

/// Stable numeric code for a circular requirement among extensions.
pub const ERROR_CIRCULAR_REQUIREMENT: u8 = 0x91;

/// Core error types for the Mosaic extension host
#[derive(Error, Debug)]
pub enum Error {
    /// An extension id is already registered
    #[error("Extension already registered: {id}")]
    DuplicateExtension { id: String },

    /// Unknown extension id, global function name, or setting key
    #[error("Not found: {id}")]
    NotFound { id: String },

    /// Required, non-optional dependency missing or version-incompatible
    #[error("Unavailable extension: {id} (required: {requirement})")]
    UnavailableExtension { id: String, requirement: String },

    /// Circular requirement among extensions
    #[error("Circular requirement detected: {cycle}")]
    CircularRequirement { cycle: String },

    /// No chain of migration scripts connects the two versions
    #[error("No migration path from {from} to {to}")]
    NoMigrationPath { from: String, to: String },

    /// Invalid semver version string
    #[error("Invalid version format: {version}")]
    InvalidVersion { version: String },

    /// Settings value rejected by the extension's settings schema
    #[error("Invalid setting for {id}: {message}")]
    Settings { id: String, message: String },

    /// An extension lifecycle hook failed
    #[error("Extension {id} hook {hook} failed: {message}")]
    Hook {
        id: String,
        hook: String,
        message: String,
    },

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Error {
    /// Create a duplicate extension error
    pub fn duplicate_extension(id: impl Into<String>) -> Self {
        Self::DuplicateExtension { id: id.into() }
    }

    /// Create a not found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an unavailable extension error
    pub fn unavailable_extension(id: impl Into<String>, requirement: impl Into<String>) -> Self {
        Self::UnavailableExtension {
            id: id.into(),
            requirement: requirement.into(),
        }
    }

    /// Create a circular requirement error from the ids on the cycle
    pub fn circular_requirement(cycle: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let cycle: Vec<String> = cycle.into_iter().map(Into::into).collect();
        Self::CircularRequirement {
            cycle: cycle.join(" -> "),
        }
    }

    /// Create a no migration path error
    pub fn no_migration_path(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::NoMigrationPath {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create an invalid version error
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }

    /// Create a settings validation error
    pub fn settings(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Settings {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create a hook failure error
    pub fn hook(
        id: impl Into<String>,
        hook: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Hook {
            id: id.into(),
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Stable numeric identifier for errors surfaced at the host boundary.
    ///
    /// Only unavailable-extension and circular-requirement conditions carry
    /// codes; everything else is identified by variant alone.
    pub fn code(&self) -> Option<u8> {
        match self {
            Self::UnavailableExtension { .. } => Some(ERROR_UNAVAILABLE_EXTENSION),
            Self::CircularRequirement { .. } => Some(ERROR_CIRCULAR_REQUIREMENT),
            _ => None,
        }
    }
}
