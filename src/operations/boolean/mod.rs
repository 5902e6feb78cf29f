mod intersect_op;
mod subtract;
mod union;

pub use crate::registry::BooleanOp;
pub use intersect_op::Intersect;
pub use subtract::Subtract;
pub use union::Union;

use crate::error::Result;
use crate::math::Transform;
use crate::registry::{Registry, Shape, SolidData, SolidId};

/// Registers `first <op> second` with `second` moved by `transform`.
///
/// The kernel evaluating the combination is external; only the tree is
/// recorded.
fn combine(
    registry: &mut Registry,
    name: &str,
    op: BooleanOp,
    first: SolidId,
    second: SolidId,
    transform: Transform,
) -> Result<SolidId> {
    let shape = Shape::Boolean {
        op,
        first,
        second,
        transform,
    };
    Ok(registry.add_solid(SolidData::new(name, shape))?)
}
