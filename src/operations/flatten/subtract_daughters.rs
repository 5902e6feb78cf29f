use tracing::trace;

use crate::error::{EntityKind, HierarchyError, Result};
use crate::math::{Transform, TOLERANCE};
use crate::operations::boolean::Subtract;
use crate::registry::{BooleanOp, Named, Registry, Shape, SolidId, Volume, VolumeId};

use super::{created_or_reused, DEFAULT_MAX_DEPTH};

/// Result of [`SubtractDaughters`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtraction {
    /// The mother's solid with every daughter solid removed.
    pub solid: SolidId,
    /// Number of daughter solids removed.
    pub subtracted: usize,
    /// Names of derived solids that already existed and were reused.
    pub reused: Vec<String>,
}

/// Builds, in a destination registry, the solid of a logical volume with
/// all of its daughters carved out.
///
/// Every logical daughter's solid is subtracted at its placement transform
/// in the mother's local frame. Assemblies contribute no solid of their own:
/// their children are subtracted directly from the mother's accumulator at
/// the composed transform `T_assembly * T_child`. Daughters of daughters are
/// not visited; they lie inside their parent's solid already.
///
/// Intermediate solids are named `{prefix}{mother}_minus{i}_{daughter_solid}`
/// with `i` counting removed solids from zero, so a repeated request yields
/// the same names and reuses the existing solids.
pub struct SubtractDaughters<'a> {
    source: &'a Registry,
    mother: VolumeId,
    prefix: String,
    max_depth: usize,
}

impl<'a> SubtractDaughters<'a> {
    /// Creates a new `SubtractDaughters` operation for `mother` in `source`.
    #[must_use]
    pub fn new(source: &'a Registry, mother: VolumeId) -> Self {
        Self {
            source,
            mother,
            prefix: String::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Prefixes every derived solid name.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Bounds the assembly nesting followed below the mother.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Executes the operation, writing the derived solids into `dest`.
    ///
    /// With no daughters the result is the mother's own solid, transferred
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::NotLogical`] if the mother is an assembly,
    /// [`HierarchyError::CycleDetected`] if assemblies nest deeper than the
    /// bound, or any registry error other than a name collision.
    pub fn execute(&self, dest: &mut Registry) -> Result<Subtraction> {
        let volume = self.source.volume(self.mother)?;
        let mother = volume
            .as_logical()
            .ok_or_else(|| HierarchyError::NotLogical(volume.name().to_owned()))?;

        let mut state = Accumulator {
            solid: dest.import_solid(self.source, mother.solid)?,
            base_name: format!("{}{}_minus", self.prefix, mother.name),
            subtracted: 0,
            reused: Vec::new(),
            path: vec![mother.name.clone()],
        };
        self.subtract_children(dest, volume, &Transform::identity(), &mut state)?;

        Ok(Subtraction {
            solid: state.solid,
            subtracted: state.subtracted,
            reused: state.reused,
        })
    }

    fn subtract_children(
        &self,
        dest: &mut Registry,
        volume: &Volume,
        frame: &Transform,
        state: &mut Accumulator,
    ) -> Result<()> {
        for &pid in volume.children() {
            let placement = self.source.placement(pid)?;
            let local = frame * &placement.transform;
            let daughter = self.source.volume(placement.daughter)?;
            match daughter {
                Volume::Assembly(assembly) => {
                    if state.path.len() > self.max_depth || state.path.contains(&assembly.name) {
                        let mut path = state.path.clone();
                        path.push(assembly.name.clone());
                        return Err(HierarchyError::CycleDetected { path }.into());
                    }
                    trace!(assembly = %assembly.name, "subtracting through assembly");
                    state.path.push(assembly.name.clone());
                    self.subtract_children(dest, daughter, &local, state)?;
                    state.path.pop();
                }
                Volume::Logical(lv) => {
                    let cutter = dest.import_solid(self.source, lv.solid)?;
                    let cutter_name = &self.source.solid(lv.solid)?.name;
                    let name = format!("{}{}_{}", state.base_name, state.subtracted, cutter_name);
                    let created = Subtract::new(name.as_str(), state.solid, cutter, local).execute(dest);
                    let minuend = state.solid;
                    let dest = &*dest;
                    state.solid = created_or_reused(
                        created,
                        EntityKind::Solid,
                        &name,
                        dest.solid_id(&name),
                        |id| same_subtraction(dest, id, minuend, cutter, &local),
                        &mut state.reused,
                    )?;
                    state.subtracted += 1;
                }
            }
        }
        Ok(())
    }
}

/// Whether `id` is `first` minus `second` placed at `transform`.
fn same_subtraction(dest: &Registry, id: SolidId, first: SolidId, second: SolidId, transform: &Transform) -> bool {
    dest.solid(id).is_ok_and(|data| {
        matches!(
            &data.shape,
            Shape::Boolean { op: BooleanOp::Subtraction, first: a, second: b, transform: t }
                if *a == first && *b == second && t.approx_eq(transform, TOLERANCE)
        )
    })
}

struct Accumulator {
    solid: SolidId,
    base_name: String,
    subtracted: usize,
    reused: Vec<String>,
    path: Vec<String>,
}
