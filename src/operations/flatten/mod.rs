mod flatten;
mod subtract_daughters;

pub use flatten::{Flatten, FlattenReport};
pub use subtract_daughters::{SubtractDaughters, Subtraction};

use tracing::debug;

use crate::error::{EntityKind, Result};
use crate::math::{Transform, TOLERANCE};
use crate::registry::{MaterialId, PlacementId, Registry, SolidId, Volume, VolumeId};

/// Default bound on placement nesting before a hierarchy is deemed cyclic.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default separator appended between placement names in derived names.
pub const DEFAULT_SEPARATOR: &str = "_";

/// Resolves a deterministic creation: a name collision with an entry that
/// `matches` accepts means the object was derived already, so the existing
/// entry is returned and recorded in `reused`. A collision with a different
/// object keeps its `DuplicateName` error, as does any other failure.
fn created_or_reused<K: Copy>(
    created: Result<K>,
    kind: EntityKind,
    name: &str,
    existing: Option<K>,
    matches: impl FnOnce(K) -> bool,
    reused: &mut Vec<String>,
) -> Result<K> {
    match created {
        Ok(id) => Ok(id),
        Err(err) if err.is_duplicate_name() => match existing {
            Some(id) if matches(id) => {
                debug!(%kind, name, "already derived, reusing");
                reused.push(name.to_owned());
                Ok(id)
            }
            _ => Err(err),
        },
        Err(err) => Err(err),
    }
}

/// Whether `id` is a logical volume made of `solid` and `material`.
fn same_logical(registry: &Registry, id: VolumeId, solid: Option<SolidId>, material: Option<MaterialId>) -> bool {
    registry
        .volume(id)
        .ok()
        .and_then(Volume::as_logical)
        .is_some_and(|lv| Some(lv.solid) == solid && Some(lv.material) == material)
}

/// Whether `id` places `daughter` in `mother` at `transform`.
fn same_placement(
    registry: &Registry,
    id: PlacementId,
    daughter: VolumeId,
    mother: VolumeId,
    transform: &Transform,
) -> bool {
    registry.placement(id).is_ok_and(|pv| {
        pv.daughter == daughter && pv.mother == mother && pv.transform.approx_eq(transform, TOLERANCE)
    })
}
