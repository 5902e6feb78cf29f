use crate::math::Transform;

use super::volume::VolumeId;
use super::Named;

slotmap::new_key_type! {
    /// Unique identifier for a physical volume (placement) in a registry.
    pub struct PlacementId;
}

/// A daughter volume instanced inside a mother at a transform relative to
/// the mother's local frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalVolume {
    pub name: String,
    pub daughter: VolumeId,
    pub mother: VolumeId,
    pub transform: Transform,
}

impl Named for PhysicalVolume {
    fn name(&self) -> &str {
        &self.name
    }
}
