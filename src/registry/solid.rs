use crate::math::Transform;

use super::Named;

slotmap::new_key_type! {
    /// Unique identifier for a solid in a registry.
    pub struct SolidId;
}

/// The kind of boolean combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Subtraction,
    Intersection,
}

/// Geometry of a solid. Lengths in mm, angles in radians.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Axis-aligned box centred at the origin.
    Box { half_x: f64, half_y: f64, half_z: f64 },
    /// Cylindrical shell section along z, centred at the origin.
    Tube {
        r_min: f64,
        r_max: f64,
        half_z: f64,
        start_phi: f64,
        delta_phi: f64,
    },
    /// `first <op> second`, with `second` moved by `transform` first.
    Boolean {
        op: BooleanOp,
        first: SolidId,
        second: SolidId,
        transform: Transform,
    },
}

/// A named, immutable shape.
///
/// Boolean solids reference their operands by id, so solids form a DAG in
/// which one operand may be shared by many combinations.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidData {
    pub name: String,
    pub shape: Shape,
}

impl SolidData {
    #[must_use]
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    /// Operand ids of a boolean solid, empty for primitives.
    #[must_use]
    pub fn operands(&self) -> Vec<SolidId> {
        match self.shape {
            Shape::Boolean { first, second, .. } => vec![first, second],
            _ => Vec::new(),
        }
    }
}

impl Named for SolidData {
    fn name(&self) -> &str {
        &self.name
    }
}
