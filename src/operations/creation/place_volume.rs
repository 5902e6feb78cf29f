use crate::error::Result;
use crate::math::Transform;
use crate::registry::{PhysicalVolume, PlacementId, Registry, VolumeId};

/// Places a daughter volume inside a mother at a transform relative to the
/// mother's local frame.
///
/// The placement is appended to the mother's child list. No cycle check is
/// made here; [`Validate`](crate::operations::query::Validate) and the
/// flattening pass detect cycles.
pub struct PlaceVolume {
    name: String,
    daughter: VolumeId,
    mother: VolumeId,
    transform: Transform,
}

impl PlaceVolume {
    /// Creates a new `PlaceVolume` operation.
    #[must_use]
    pub fn new(name: impl Into<String>, daughter: VolumeId, mother: VolumeId, transform: Transform) -> Self {
        Self {
            name: name.into(),
            daughter,
            mother,
            transform,
        }
    }

    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or either volume does not belong
    /// to `registry`.
    pub fn execute(&self, registry: &mut Registry) -> Result<PlacementId> {
        Ok(registry.add_placement(PhysicalVolume {
            name: self.name.clone(),
            daughter: self.daughter,
            mother: self.mother,
            transform: self.transform,
        })?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{EntityKind, GeometryError, RegistryError};
    use crate::operations::creation::{MakeAssembly, MakeBox, MakeLogicalVolume};

    #[test]
    fn placement_grows_child_list_in_order() {
        let mut reg = Registry::new();
        let solid = MakeBox::new("s", 5.0, 5.0, 5.0).execute(&mut reg).unwrap();
        let air = reg.nist_material("G4_AIR");
        let mother = MakeLogicalVolume::new("m", solid, air).execute(&mut reg).unwrap();
        let group = MakeAssembly::new("g").execute(&mut reg).unwrap();

        let first = PlaceVolume::new("g1", group, mother, Transform::from_translation(1.0, 0.0, 0.0))
            .execute(&mut reg)
            .unwrap();
        let second = PlaceVolume::new("g2", group, mother, Transform::from_translation(-1.0, 0.0, 0.0))
            .execute(&mut reg)
            .unwrap();

        assert_eq!(reg.volume(mother).unwrap().children(), &[first, second]);
        assert!(reg.volume(group).unwrap().is_leaf());
    }

    #[test]
    fn duplicate_placement_leaves_mother_unchanged() {
        let mut reg = Registry::new();
        let solid = MakeBox::new("s", 5.0, 5.0, 5.0).execute(&mut reg).unwrap();
        let air = reg.nist_material("G4_AIR");
        let mother = MakeLogicalVolume::new("m", solid, air).execute(&mut reg).unwrap();
        let group = MakeAssembly::new("g").execute(&mut reg).unwrap();
        PlaceVolume::new("p", group, mother, Transform::identity())
            .execute(&mut reg)
            .unwrap();
        let err = PlaceVolume::new("p", group, mother, Transform::identity())
            .execute(&mut reg)
            .unwrap_err();
        assert!(matches!(
            err,
            GeometryError::Registry(RegistryError::DuplicateName {
                kind: EntityKind::Placement,
                ..
            })
        ));
        assert_eq!(reg.volume(mother).unwrap().children().len(), 1);
    }

    #[test]
    fn unknown_mother_fails() {
        let mut reg = Registry::new();
        let group = MakeAssembly::new("g").execute(&mut reg).unwrap();
        let result = PlaceVolume::new("p", group, VolumeId::default(), Transform::identity())
            .execute(&mut reg);
        assert!(result.is_err());
    }
}
