use std::f64::consts::TAU;

use crate::error::{HierarchyError, Result};
use crate::math::{AngleUnit, LengthUnit};
use crate::registry::{Registry, Shape, SolidData, SolidId};

use super::positive;

/// Creates a cylindrical shell section along z, centred at the origin.
///
/// Defaults to a full turn (`start_phi = 0`, `delta_phi = 2π`).
pub struct MakeTube {
    name: String,
    r_min: f64,
    r_max: f64,
    half_z: f64,
    start_phi: f64,
    delta_phi: f64,
    length_unit: LengthUnit,
    angle_unit: AngleUnit,
}

impl MakeTube {
    /// Creates a new `MakeTube` operation.
    #[must_use]
    pub fn new(name: impl Into<String>, r_min: f64, r_max: f64, half_z: f64) -> Self {
        Self {
            name: name.into(),
            r_min,
            r_max,
            half_z,
            start_phi: 0.0,
            delta_phi: TAU,
            length_unit: LengthUnit::default(),
            angle_unit: AngleUnit::default(),
        }
    }

    /// Restricts the tube to the angular section `[start, start + delta]`.
    #[must_use]
    pub fn with_phi(mut self, start: f64, delta: f64) -> Self {
        self.start_phi = start;
        self.delta_phi = delta;
        self
    }

    #[must_use]
    pub fn with_length_unit(mut self, unit: LengthUnit) -> Self {
        self.length_unit = unit;
        self
    }

    #[must_use]
    pub fn with_angle_unit(mut self, unit: AngleUnit) -> Self {
        self.angle_unit = unit;
        self
    }

    /// Executes the operation, registering the tube.
    ///
    /// # Errors
    ///
    /// Returns an error if `r_min` is negative, `r_max <= r_min`, `half_z` or
    /// the sweep is not positive, or the name is taken.
    pub fn execute(&self, registry: &mut Registry) -> Result<SolidId> {
        let r_min = self.length_unit.to_mm(self.r_min);
        let r_max = self.length_unit.to_mm(self.r_max);
        if !r_min.is_finite() || r_min < 0.0 {
            return Err(HierarchyError::InvalidDimension {
                parameter: "r_min",
                value: r_min,
            }
            .into());
        }
        positive("r_max - r_min", r_max - r_min)?;
        let shape = Shape::Tube {
            r_min,
            r_max,
            half_z: positive("half_z", self.length_unit.to_mm(self.half_z))?,
            start_phi: self.angle_unit.to_rad(self.start_phi),
            delta_phi: positive("delta_phi", self.angle_unit.to_rad(self.delta_phi))?,
        };
        Ok(registry.add_solid(SolidData::new(self.name.clone(), shape))?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn full_turn_by_default() {
        let mut reg = Registry::new();
        let id = MakeTube::new("t", 1.0, 2.0, 3.0).execute(&mut reg).unwrap();
        let Shape::Tube {
            start_phi,
            delta_phi,
            ..
        } = reg.solid(id).unwrap().shape
        else {
            panic!("expected tube");
        };
        assert_relative_eq!(start_phi, 0.0);
        assert_relative_eq!(delta_phi, TAU);
    }

    #[test]
    fn degree_section() {
        let mut reg = Registry::new();
        let id = MakeTube::new("t", 0.0, 2.0, 3.0)
            .with_phi(90.0, 180.0)
            .with_angle_unit(AngleUnit::Degree)
            .execute(&mut reg)
            .unwrap();
        let Shape::Tube {
            start_phi,
            delta_phi,
            ..
        } = reg.solid(id).unwrap().shape
        else {
            panic!("expected tube");
        };
        assert_relative_eq!(start_phi, std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(delta_phi, std::f64::consts::PI);
    }

    #[test]
    fn inverted_radii_fail() {
        let mut reg = Registry::new();
        assert!(MakeTube::new("t", 3.0, 2.0, 1.0).execute(&mut reg).is_err());
        assert!(MakeTube::new("t", -1.0, 2.0, 1.0).execute(&mut reg).is_err());
        assert!(reg.solids().is_empty());
    }
}
