use crate::error::Result;
use crate::math::{Point3, Transform};
use crate::operations::boolean::{Intersect, Subtract, Union};
use crate::operations::creation::{MakeAssembly, MakeBox, MakeLogicalVolume, MakeTube, PlaceVolume};
use crate::registry::{PlacementId, Registry, SolidId, VolumeId};

/// Frame of a part as drawn: rotations about the fixed x, y and z axes in
/// radians, then a position in mm.
pub(crate) fn frame(angles: [f64; 3], position: [f64; 3]) -> Transform {
    Transform::from_extrinsic(angles, position)
}

/// Pure translation.
pub(crate) fn at(x: f64, y: f64, z: f64) -> Transform {
    Transform::from_translation(x, y, z)
}

/// A part turned rigidly about `anchor`: `offset` is the part centre seen
/// from the anchor before turning.
pub(crate) fn pivot(angles: [f64; 3], anchor: [f64; 3], offset: [f64; 3]) -> Transform {
    let turned = frame(angles, [0.0; 3]).apply(&Point3::from(offset));
    frame(
        angles,
        [anchor[0] + turned.x, anchor[1] + turned.y, anchor[2] + turned.z],
    )
}

/// Registry wrapper taking full lengths, so the builders read like the
/// drawings they come from.
pub(crate) struct Parts<'r> {
    registry: &'r mut Registry,
}

impl<'r> Parts<'r> {
    pub(crate) fn new(registry: &'r mut Registry) -> Self {
        Self { registry }
    }

    /// Box of full side lengths `[x, y, z]`.
    pub(crate) fn cuboid(&mut self, name: &str, size: [f64; 3]) -> Result<SolidId> {
        let [x, y, z] = size;
        MakeBox::new(name, x / 2.0, y / 2.0, z / 2.0).execute(self.registry)
    }

    /// Full-turn tube of full `length` along z.
    pub(crate) fn tube(&mut self, name: &str, r_min: f64, r_max: f64, length: f64) -> Result<SolidId> {
        MakeTube::new(name, r_min, r_max, length / 2.0).execute(self.registry)
    }

    /// Tube section sweeping `delta` radians from `start`.
    pub(crate) fn tube_section(
        &mut self,
        name: &str,
        r_min: f64,
        r_max: f64,
        length: f64,
        start: f64,
        delta: f64,
    ) -> Result<SolidId> {
        MakeTube::new(name, r_min, r_max, length / 2.0)
            .with_phi(start, delta)
            .execute(self.registry)
    }

    pub(crate) fn union(&mut self, name: &str, first: SolidId, second: SolidId, at: Transform) -> Result<SolidId> {
        Union::new(name, first, second, at).execute(self.registry)
    }

    pub(crate) fn subtract(&mut self, name: &str, first: SolidId, second: SolidId, at: Transform) -> Result<SolidId> {
        Subtract::new(name, first, second, at).execute(self.registry)
    }

    pub(crate) fn intersect(&mut self, name: &str, first: SolidId, second: SolidId, at: Transform) -> Result<SolidId> {
        Intersect::new(name, first, second, at).execute(self.registry)
    }

    /// Logical volume made of a predefined material.
    pub(crate) fn logical(&mut self, name: &str, solid: SolidId, material: &str) -> Result<VolumeId> {
        let material = self.registry.nist_material(material);
        MakeLogicalVolume::new(name, solid, material).execute(self.registry)
    }

    pub(crate) fn assembly(&mut self, name: &str) -> Result<VolumeId> {
        MakeAssembly::new(name).execute(self.registry)
    }

    pub(crate) fn place(
        &mut self,
        name: &str,
        daughter: VolumeId,
        mother: VolumeId,
        at: Transform,
    ) -> Result<PlacementId> {
        PlaceVolume::new(name, daughter, mother, at).execute(self.registry)
    }
}
