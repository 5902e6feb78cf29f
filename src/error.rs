use std::fmt;

use thiserror::Error;

/// Top-level error type for geometry construction, flattening and export.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GeometryError {
    /// Returns `true` if this is a name collision on creation.
    ///
    /// Deterministic re-derivations (flattening, daughter subtraction) treat
    /// this as "already computed" when the existing entry is the same object.
    #[must_use]
    pub fn is_duplicate_name(&self) -> bool {
        matches!(self, Self::Registry(RegistryError::DuplicateName { .. }))
    }
}

/// The kinds of named objects a [`Registry`](crate::registry::Registry) stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Solid,
    Material,
    Volume,
    Placement,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Solid => "solid",
            Self::Material => "material",
            Self::Volume => "volume",
            Self::Placement => "physical volume",
        };
        f.write_str(label)
    }
}

/// Errors raised by the name-keyed object store.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{kind} '{name}' already exists in this registry")]
    DuplicateName { kind: EntityKind, name: String },

    #[error("{kind} '{name}' not found in registry")]
    NotFound { kind: EntityKind, name: String },

    #[error("{kind} '{name}' not found in registry, similar names found: {}", candidates.join(", "))]
    AmbiguousName {
        kind: EntityKind,
        name: String,
        candidates: Vec<String>,
    },

    #[error("{kind} handle does not belong to this registry")]
    UnknownReference { kind: EntityKind },

    #[error("no world volume has been set")]
    NoWorld,
}

/// Errors related to the volume hierarchy.
#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("volume '{0}' is not a logical volume")]
    NotLogical(String),

    #[error("parameter {parameter} = {value} must be positive and finite")]
    InvalidDimension { parameter: &'static str, value: f64 },

    #[error("placement cycle detected: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },
}

/// Errors raised while serializing a registry.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write geometry file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to emit xml: {0}")]
    Xml(String),
}

/// Errors raised while loading a build configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Convenience type alias for results using [`GeometryError`].
pub type Result<T> = std::result::Result<T, GeometryError>;
