mod make_assembly;
mod make_box;
mod make_logical_volume;
mod make_tube;
mod place_volume;

pub use make_assembly::MakeAssembly;
pub use make_box::MakeBox;
pub use make_logical_volume::MakeLogicalVolume;
pub use make_tube::MakeTube;
pub use place_volume::PlaceVolume;

use crate::error::HierarchyError;

/// Rejects sizes that are not strictly positive and finite.
fn positive(parameter: &'static str, value: f64) -> Result<f64, HierarchyError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(HierarchyError::InvalidDimension { parameter, value })
    }
}
