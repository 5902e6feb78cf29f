use crate::error::Result;
use crate::registry::{MaterialId, Registry, SolidId, Volume, VolumeId};

/// Pairs a solid with a material as a placeable logical volume.
pub struct MakeLogicalVolume {
    name: String,
    solid: SolidId,
    material: MaterialId,
}

impl MakeLogicalVolume {
    /// Creates a new `MakeLogicalVolume` operation.
    #[must_use]
    pub fn new(name: impl Into<String>, solid: SolidId, material: MaterialId) -> Self {
        Self {
            name: name.into(),
            solid,
            material,
        }
    }

    /// Executes the operation, registering the volume with no children.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the solid or material does
    /// not belong to `registry`.
    pub fn execute(&self, registry: &mut Registry) -> Result<VolumeId> {
        Ok(registry.add_volume(Volume::logical(
            self.name.clone(),
            self.solid,
            self.material,
        ))?)
    }
}
