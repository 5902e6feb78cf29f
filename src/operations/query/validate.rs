use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::error::{HierarchyError, Result};
use crate::registry::{Named, Registry, Shape, VolumeId};

/// Facts gathered while validating a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationSummary {
    /// Volumes reachable from the world, the world included.
    pub reachable_volumes: usize,
    /// Longest chain of placements below the world.
    pub depth: usize,
}

/// Checks that a registry is ready for serialization: a logical world is
/// set, every stored handle resolves, and no volume contains itself.
#[derive(Debug, Default)]
pub struct Validate;

impl Validate {
    /// Creates a new `Validate` query.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the validation.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: no world, a world that is an
    /// assembly, a dangling handle, or a placement cycle.
    #[instrument(skip_all)]
    pub fn execute(&self, registry: &Registry) -> Result<ValidationSummary> {
        registry.world_volume()?;

        for (_, solid) in registry.solids().iter() {
            if let Shape::Boolean { first, second, .. } = solid.shape {
                registry.solid(first)?;
                registry.solid(second)?;
            }
        }
        for (_, volume) in registry.volumes().iter() {
            if let Some(lv) = volume.as_logical() {
                registry.solid(lv.solid)?;
                registry.material(lv.material)?;
            }
            for &pid in volume.children() {
                registry.placement(pid)?;
            }
        }
        for (_, placement) in registry.placements().iter() {
            registry.volume(placement.daughter)?;
            registry.volume(placement.mother)?;
        }

        let mut done = HashMap::new();
        let mut stack = Vec::new();
        for (id, _) in registry.volumes().iter() {
            depth_below(registry, id, &mut stack, &mut done)?;
        }

        let world = registry.world()?;
        let mut reachable = HashSet::new();
        collect_reachable(registry, world, &mut reachable)?;
        let depth = done.get(&world).copied().unwrap_or_default();

        debug!(reachable = reachable.len(), depth, "registry valid");
        Ok(ValidationSummary {
            reachable_volumes: reachable.len(),
            depth,
        })
    }
}

/// Depth-first walk returning the longest placement chain below `id`.
/// `stack` holds the current path; revisiting a volume on it is a cycle.
/// Finished volumes are memoized in `done`.
fn depth_below(
    registry: &Registry,
    id: VolumeId,
    stack: &mut Vec<VolumeId>,
    done: &mut HashMap<VolumeId, usize>,
) -> Result<usize> {
    if let Some(&depth) = done.get(&id) {
        return Ok(depth);
    }
    if stack.contains(&id) {
        let mut path = stack
            .iter()
            .map(|v| registry.volume(*v).map(|v| v.name().to_owned()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        path.push(registry.volume(id)?.name().to_owned());
        return Err(HierarchyError::CycleDetected { path }.into());
    }
    stack.push(id);
    let mut deepest = 0;
    for &pid in registry.volume(id)?.children() {
        let daughter = registry.placement(pid)?.daughter;
        deepest = deepest.max(depth_below(registry, daughter, stack, done)? + 1);
    }
    stack.pop();
    done.insert(id, deepest);
    Ok(deepest)
}

fn collect_reachable(registry: &Registry, id: VolumeId, seen: &mut HashSet<VolumeId>) -> Result<()> {
    if !seen.insert(id) {
        return Ok(());
    }
    for &pid in registry.volume(id)?.children() {
        collect_reachable(registry, registry.placement(pid)?.daughter, seen)?;
    }
    Ok(())
}
