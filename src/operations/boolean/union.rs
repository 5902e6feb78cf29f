use crate::error::Result;
use crate::math::Transform;
use crate::registry::{Registry, SolidId};

use super::{combine, BooleanOp};

/// Computes the union of two solids.
pub struct Union {
    name: String,
    first: SolidId,
    second: SolidId,
    transform: Transform,
}

impl Union {
    /// Creates a new `Union` operation (`first ∪ second`), with `second` placed at
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
            BooleanOp::Union,
            self.first,
            self.second,
            self.transform,
        )
    }
}
