use crate::error::Result;
use crate::math::LengthUnit;
use crate::registry::{Registry, Shape, SolidData, SolidId};

use super::positive;

/// Creates an axis-aligned box solid centred at the origin.
pub struct MakeBox {
    name: String,
    half_extents: [f64; 3],
    unit: LengthUnit,
}

impl MakeBox {
    /// Creates a new `MakeBox` operation from half-extents along x, y and z.
    #[must_use]
    pub fn new(name: impl Into<String>, half_x: f64, half_y: f64, half_z: f64) -> Self {
        Self {
            name: name.into(),
            half_extents: [half_x, half_y, half_z],
            unit: LengthUnit::default(),
        }
    }

    /// Interprets the half-extents in `unit` instead of millimetres.
    #[must_use]
    pub fn with_unit(mut self, unit: LengthUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Executes the operation, registering the box.
    ///
    /// # Errors
    ///
    /// Returns an error if a half-extent is not positive or the name is taken.
    pub fn execute(&self, registry: &mut Registry) -> Result<SolidId> {
        let [x, y, z] = self.half_extents.map(|v| self.unit.to_mm(v));
        let shape = Shape::Box {
            half_x: positive("half_x", x)?,
            half_y: positive("half_y", y)?,
            half_z: positive("half_z", z)?,
        };
        Ok(registry.add_solid(SolidData::new(self.name.clone(), shape))?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{GeometryError, HierarchyError, RegistryError};

    #[test]
    fn box_converts_units() {
        let mut reg = Registry::new();
        let id = MakeBox::new("b", 1.0, 2.0, 0.5)
            .with_unit(LengthUnit::Centimeter)
            .execute(&mut reg)
            .unwrap();
        assert_eq!(
            reg.solid(id).unwrap().shape,
            Shape::Box {
                half_x: 10.0,
                half_y: 20.0,
                half_z: 5.0
            }
        );
    }

    #[test]
    fn zero_extent_fails() {
        let mut reg = Registry::new();
        let err = MakeBox::new("b", 1.0, 0.0, 1.0).execute(&mut reg).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::Hierarchy(HierarchyError::InvalidDimension {
                parameter: "half_y",
                ..
            })
        ));
        assert!(reg.solids().is_empty());
    }

    #[test]
    fn duplicate_box_fails() {
        let mut reg = Registry::new();
        MakeBox::new("b", 1.0, 1.0, 1.0).execute(&mut reg).unwrap();
        let err = MakeBox::new("b", 2.0, 2.0, 2.0).execute(&mut reg).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::Registry(RegistryError::DuplicateName { .. })
        ));
    }
}
