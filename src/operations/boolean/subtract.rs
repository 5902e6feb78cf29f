use crate::error::Result;
use crate::math::Transform;
use crate::registry::{Registry, SolidId};

use super::{combine, BooleanOp};

/// Computes the boolean subtraction of one solid from another.
pub struct Subtract {
    name: String,
    first: SolidId,
    second: SolidId,
    transform: Transform,
}

impl Subtract {
    /// Creates a new `Subtract` operation (`first - second`), with `second` placed at
    /// `transform` in the frame of `first`.
    #[must_use]
    pub fn new(name: impl Into<String>, first: SolidId, second: SolidId, transform: Transform) -> Self {
        Self {
            name: name.into(),
            first,
            second,
            transform,
        }
    }

    /// Executes the operation, registering the result solid.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or an operand does not belong to
    /// `registry`.
    pub fn execute(&self, registry: &mut Registry) -> Result<SolidId> {
        combine(
            registry,
            &self.name,
            BooleanOp::Subtraction,
            self.first,
            self.second,
            self.transform,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeBox;
    use crate::registry::Shape;

    #[test]
    fn subtraction_records_operands_and_transform() {
        let mut reg = Registry::new();
        let m = MakeBox::new("M", 10.0, 10.0, 10.0).execute(&mut reg).unwrap();
        let d = MakeBox::new("D", 2.0, 2.0, 2.0).execute(&mut reg).unwrap();
        let t = Transform::from_translation(0.0, 0.0, 5.0);
        let id = Subtract::new("M_minus_D", m, d, t).execute(&mut reg).unwrap();
        assert_eq!(
            reg.solid(id).unwrap().shape,
            Shape::Boolean {
                op: BooleanOp::Subtraction,
                first: m,
                second: d,
                transform: t,
            }
        );
    }

    #[test]
    fn foreign_operand_fails() {
        let mut reg = Registry::new();
        let m = MakeBox::new("M", 10.0, 10.0, 10.0).execute(&mut reg).unwrap();
        let result = Subtract::new("x", m, SolidId::default(), Transform::identity()).execute(&mut reg);
        assert!(result.is_err());
        assert_eq!(reg.solids().len(), 1);
    }
}
