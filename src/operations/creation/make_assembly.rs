use crate::error::Result;
use crate::registry::{Registry, Volume, VolumeId};

/// Creates an empty assembly: a grouping node without solid or material.
pub struct MakeAssembly {
    name: String,
}

impl MakeAssembly {
    /// Creates a new `MakeAssembly` operation.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken.
    pub fn execute(&self, registry: &mut Registry) -> Result<VolumeId> {
        Ok(registry.add_volume(Volume::assembly(self.name.clone()))?)
    }
}
