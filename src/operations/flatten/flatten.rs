use tracing::{info, instrument, trace};

use crate::error::{EntityKind, HierarchyError, Result};
use crate::math::Transform;
use crate::operations::creation::{MakeLogicalVolume, PlaceVolume};
use crate::registry::{MaterialId, Named, Registry, Volume, VolumeId};

use super::{
    created_or_reused, same_logical, same_placement, SubtractDaughters, DEFAULT_MAX_DEPTH, DEFAULT_SEPARATOR,
};

/// What a flattening run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenReport {
    /// `*_childless_LV` volumes standing in for volumes that had children.
    pub childless: Vec<String>,
    /// Placements of leaf volumes re-created under the new world.
    pub leaves: Vec<String>,
    /// Empty assemblies that were dropped.
    pub skipped: Vec<String>,
    /// Derived names that already existed in the destination and were reused.
    pub reused: Vec<String>,
}

/// Rebuilds the world of `source` in a destination registry as a one-level
/// hierarchy with no nested placements.
///
/// Every volume below the world that has children becomes a single
/// `{base}{name}_childless_LV` whose solid is its own solid minus its direct
/// daughters (see [`SubtractDaughters`]), placed directly in the new world at
/// its composed world transform. Leaf volumes are transferred and placed the
/// same way. `base` is the chain of placement names leading to the volume,
/// each followed by the separator, so names stay unique across the run.
///
/// A name collision in the destination with an identical object (same
/// solid and material, or same daughter and transform) is treated as
/// already derived and reused, so flattening into a registry that holds a
/// previous run is harmless. A collision with a different object fails with
/// `DuplicateName`.
pub struct Flatten<'a> {
    source: &'a Registry,
    max_depth: usize,
    separator: String,
}

impl<'a> Flatten<'a> {
    /// Creates a new `Flatten` operation over the world of `source`.
    #[must_use]
    pub fn new(source: &'a Registry) -> Self {
        Self {
            source,
            max_depth: DEFAULT_MAX_DEPTH,
            separator: DEFAULT_SEPARATOR.to_owned(),
        }
    }

    /// Nesting depth beyond which the hierarchy is reported as cyclic.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Executes the flattening into `dest` and designates the copied world
    /// there.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoWorld`](crate::error::RegistryError::NoWorld)
    /// if `source` has no world, [`HierarchyError::CycleDetected`] if a volume
    /// contains itself or nesting exceeds the depth bound,
    /// [`RegistryError::DuplicateName`](crate::error::RegistryError::DuplicateName)
    /// if two different objects derive the same name, and any other registry
    /// error.
    #[instrument(skip_all, fields(max_depth = self.max_depth))]
    pub fn execute(&self, dest: &mut Registry) -> Result<FlattenReport> {
        let root = self.source.world()?;
        let mut report = FlattenReport::default();

        let world_name = self.source.volume(root)?.name().to_owned();
        let dest_world = transfer_or_reuse(self.source, dest, root, &mut report.reused)?;
        dest.set_world_id(dest_world)?;

        let mut walk = Walk {
            source: self.source,
            dest,
            root,
            dest_world,
            max_depth: self.max_depth,
            separator: &self.separator,
            path: Vec::new(),
            report,
        };
        walk.visit(root, &Transform::identity(), "", 0)?;
        let report = walk.report;

        info!(
            world = %world_name,
            childless = report.childless.len(),
            leaves = report.leaves.len(),
            skipped = report.skipped.len(),
            reused = report.reused.len(),
            "flattening complete"
        );
        Ok(report)
    }
}

struct Walk<'s, 'd> {
    source: &'s Registry,
    dest: &'d mut Registry,
    root: VolumeId,
    dest_world: VolumeId,
    max_depth: usize,
    separator: &'s str,
    path: Vec<VolumeId>,
    report: FlattenReport,
}

impl Walk<'_, '_> {
    fn visit(&mut self, id: VolumeId, frame: &Transform, base: &str, depth: usize) -> Result<()> {
        let source = self.source;
        let volume = source.volume(id)?;
        if depth > self.max_depth || self.path.contains(&id) {
            let mut path = self
                .path
                .iter()
                .map(|v| source.volume(*v).map(|v| v.name().to_owned()))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            path.push(volume.name().to_owned());
            return Err(HierarchyError::CycleDetected { path }.into());
        }
        self.path.push(id);

        if id != self.root && !volume.is_leaf() {
            if let Volume::Logical(lv) = volume {
                self.place_childless(id, &lv.name, lv.material, frame, base)?;
            }
        }

        for &pid in volume.children() {
            let placement = source.placement(pid)?;
            let composed = frame * &placement.transform;
            let daughter = source.volume(placement.daughter)?;
            let name = format!("{base}{}", placement.name);
            match daughter {
                Volume::Logical(_) if daughter.is_leaf() => {
                    self.place_leaf(placement.daughter, &name, composed)?;
                }
                Volume::Assembly(assembly) if daughter.is_leaf() => {
                    trace!(assembly = %assembly.name, "skipping empty assembly");
                    self.report.skipped.push(name);
                }
                _ => {
                    let nested = format!("{name}{}", self.separator);
                    self.visit(placement.daughter, &composed, &nested, depth + 1)?;
                }
            }
        }

        self.path.pop();
        Ok(())
    }

    fn place_childless(
        &mut self,
        id: VolumeId,
        name: &str,
        material: MaterialId,
        frame: &Transform,
        base: &str,
    ) -> Result<()> {
        let subtraction = SubtractDaughters::new(self.source, id)
            .with_prefix(base)
            .with_max_depth(self.max_depth)
            .execute(self.dest)?;
        self.report.reused.extend(subtraction.reused);

        let lv_name = format!("{base}{name}_childless_LV");
        let material = self.dest.import_material(self.source, material)?;
        let created = MakeLogicalVolume::new(lv_name.as_str(), subtraction.solid, material).execute(self.dest);
        let dest = &*self.dest;
        let lv = created_or_reused(
            created,
            EntityKind::Volume,
            &lv_name,
            dest.volume_id(&lv_name),
            |id| same_logical(dest, id, Some(subtraction.solid), Some(material)),
            &mut self.report.reused,
        )?;

        let pv_name = format!("{base}{name}_childless_PV");
        self.place(&pv_name, lv, *frame)?;

        trace!(volume = %lv_name, subtracted = subtraction.subtracted, "childless volume placed");
        self.report.childless.push(lv_name);
        Ok(())
    }

    fn place_leaf(&mut self, daughter: VolumeId, name: &str, transform: Transform) -> Result<()> {
        let lv = transfer_or_reuse(self.source, self.dest, daughter, &mut self.report.reused)?;
        self.place(name, lv, transform)?;

        trace!(placement = name, "leaf placed");
        self.report.leaves.push(name.to_owned());
        Ok(())
    }

    /// Places `lv` in the new world, reusing an identical earlier placement.
    fn place(&mut self, name: &str, lv: VolumeId, transform: Transform) -> Result<()> {
        let world = self.dest_world;
        let created = PlaceVolume::new(name, lv, world, transform).execute(self.dest);
        let dest = &*self.dest;
        created_or_reused(
            created,
            EntityKind::Placement,
            name,
            dest.placement_id(name),
            |id| same_placement(dest, id, lv, world, &transform),
            &mut self.report.reused,
        )?;
        Ok(())
    }
}

/// Transfers the logical volume `id`, or reuses the one already in `dest`
/// when it is built from the same solid and material.
fn transfer_or_reuse(source: &Registry, dest: &mut Registry, id: VolumeId, reused: &mut Vec<String>) -> Result<VolumeId> {
    let created = dest.transfer_logical_volume(source, id);
    let volume = source.volume(id)?;
    let Some(lv) = volume.as_logical() else {
        return created;
    };
    let solid = dest.solid_id(&source.solid(lv.solid)?.name);
    let material = dest.material_id(&source.material(lv.material)?.name);
    created_or_reused(
        created,
        EntityKind::Volume,
        &lv.name,
        dest.volume_id(&lv.name),
        |existing| same_logical(dest, existing, solid, material),
        reused,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;
    use crate::error::GeometryError;
    use crate::operations::creation::{MakeAssembly, MakeBox};
    use crate::registry::{BooleanOp, Shape, SolidId};

    const EPS: f64 = 1e-9;

    fn world(reg: &mut Registry) -> VolumeId {
        let solid = MakeBox::new("worldSolid", 1000.0, 1000.0, 1000.0).execute(reg).unwrap();
        let vacuum = reg.nist_material("G4_Galactic");
        let id = MakeLogicalVolume::new("world_LV", solid, vacuum).execute(reg).unwrap();
        reg.set_world_id(id).unwrap();
        id
    }

    fn cube(reg: &mut Registry, name: &str, half: f64, material: &str) -> VolumeId {
        let solid = MakeBox::new(name, half, half, half).execute(reg).unwrap();
        let material = reg.nist_material(material);
        MakeLogicalVolume::new(format!("{name}_LV"), solid, material)
            .execute(reg)
            .unwrap()
    }

    fn place(reg: &mut Registry, name: &str, daughter: VolumeId, mother: VolumeId, t: Transform) {
        PlaceVolume::new(name, daughter, mother, t).execute(reg).unwrap();
    }

    /// Second operands along a subtraction chain, innermost first.
    fn removed(reg: &Registry, mut id: SolidId) -> Vec<(String, Transform)> {
        let mut out = Vec::new();
        while let Shape::Boolean {
            op: BooleanOp::Subtraction,
            first,
            second,
            transform,
        } = reg.solid(id).unwrap().shape
        {
            out.push((reg.solid(second).unwrap().name.clone(), transform));
            id = first;
        }
        out.reverse();
        out
    }

    fn solid_of(reg: &Registry, volume: &str) -> SolidId {
        let id = reg.volume_id(volume).unwrap();
        reg.volume(id).unwrap().as_logical().unwrap().solid
    }

    /// World -> M (box 10) -> D (box 2) at (0, 0, 5).
    fn mother_with_daughter() -> Registry {
        let mut reg = Registry::new();
        let w = world(&mut reg);
        let m = cube(&mut reg, "M", 10.0, "G4_Cu");
        let d = cube(&mut reg, "D", 2.0, "G4_Pb");
        place(&mut reg, "M_PV", m, w, Transform::from_translation(100.0, 0.0, 0.0));
        place(&mut reg, "D_PV", d, m, Transform::from_translation(0.0, 0.0, 5.0));
        reg
    }

    #[test]
    fn daughter_is_absorbed_into_mother() {
        let source = mother_with_daughter();
        let mut dest = Registry::new();
        let report = Flatten::new(&source).execute(&mut dest).unwrap();

        assert_eq!(report.childless, vec!["M_PV_M_LV_childless_LV".to_string()]);
        assert_eq!(report.leaves, vec!["M_PV_D_PV".to_string()]);
        assert!(report.reused.is_empty());

        let solid = solid_of(&dest, "M_PV_M_LV_childless_LV");
        let data = dest.solid(solid).unwrap();
        assert_eq!(data.name, "M_PV_M_LV_minus0_D");
        let Shape::Boolean {
            op,
            first,
            second,
            transform,
        } = data.shape
        else {
            panic!("expected boolean");
        };
        assert_eq!(op, BooleanOp::Subtraction);
        assert_eq!(dest.solid(first).unwrap().name, "M");
        assert_eq!(dest.solid(second).unwrap().name, "D");
        assert!(transform.approx_eq(&Transform::from_translation(0.0, 0.0, 5.0), EPS));

        let childless = dest.volume_id("M_PV_M_LV_childless_LV").unwrap();
        assert!(dest.volume(childless).unwrap().is_leaf());
        let lv = dest.volume(childless).unwrap().as_logical().unwrap();
        assert_eq!(dest.material(lv.material).unwrap().name, "G4_Cu");

        let world = dest.world().unwrap();
        assert_eq!(dest.volume(world).unwrap().children().len(), 2);
        let leaf = dest.placement(dest.placement_id("M_PV_D_PV").unwrap()).unwrap();
        assert_eq!(leaf.mother, world);
        assert!(leaf
            .transform
            .approx_eq(&Transform::from_translation(100.0, 0.0, 5.0), EPS));
    }

    #[test]
    fn assembly_children_use_composed_transform() {
        let mut source = Registry::new();
        let w = world(&mut source);
        let m = cube(&mut source, "M", 50.0, "G4_Cu");
        let grp = MakeAssembly::new("Grp").execute(&mut source).unwrap();
        let d = cube(&mut source, "D", 2.0, "G4_Cu");
        let t1 = Transform::from_angles([0.0, 0.0, FRAC_PI_2], [1.0, 0.0, 0.0]);
        let t2 = Transform::from_translation(2.0, 0.0, 0.0);
        place(&mut source, "M_PV", m, w, Transform::identity());
        place(&mut source, "Grp_PV", grp, m, t1);
        place(&mut source, "D_PV", d, grp, t2);

        let mut dest = Registry::new();
        Flatten::new(&source).execute(&mut dest).unwrap();

        let cuts = removed(&dest, solid_of(&dest, "M_PV_M_LV_childless_LV"));
        assert_eq!(cuts.len(), 1);
        let (name, transform) = &cuts[0];
        assert_eq!(name, "D");
        assert!(transform.approx_eq(&(t1 * t2), EPS));
        assert!(!transform.approx_eq(&t2, EPS));
        let [x, y, z] = transform.position();
        assert_relative_eq!(x, 1.0, epsilon = EPS);
        assert_relative_eq!(y, 2.0, epsilon = EPS);
        assert_relative_eq!(z, 0.0, epsilon = EPS);

        let leaf = dest
            .placement(dest.placement_id("M_PV_Grp_PV_D_PV").unwrap())
            .unwrap();
        assert!(leaf.transform.approx_eq(&(t1 * t2), EPS));
    }

    #[test]
    fn subtraction_happens_at_direct_parent_only() {
        let mut source = Registry::new();
        let w = world(&mut source);
        let a = cube(&mut source, "A", 100.0, "G4_AIR");
        let x = cube(&mut source, "X", 20.0, "G4_Cu");
        let y = cube(&mut source, "Y", 20.0, "G4_Cu");
        let z = cube(&mut source, "Z", 5.0, "G4_Pb");
        place(&mut source, "A_PV", a, w, Transform::identity());
        place(&mut source, "X_PV", x, a, Transform::from_translation(-50.0, 0.0, 0.0));
        place(&mut source, "Y_PV", y, a, Transform::from_translation(50.0, 0.0, 0.0));
        place(&mut source, "Z_PV", z, x, Transform::from_translation(0.0, 10.0, 0.0));

        let mut dest = Registry::new();
        let report = Flatten::new(&source).execute(&mut dest).unwrap();

        let a_cuts: Vec<String> = removed(&dest, solid_of(&dest, "A_PV_A_LV_childless_LV"))
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(a_cuts, vec!["X".to_string(), "Y".to_string()]);

        let x_cuts = removed(&dest, solid_of(&dest, "A_PV_X_PV_X_LV_childless_LV"));
        assert_eq!(x_cuts.len(), 1);
        assert_eq!(x_cuts[0].0, "Z");
        assert!(x_cuts[0]
            .1
            .approx_eq(&Transform::from_translation(0.0, 10.0, 0.0), EPS));

        let mut leaves = report.leaves.clone();
        leaves.sort();
        assert_eq!(leaves, vec!["A_PV_X_PV_Z_PV".to_string(), "A_PV_Y_PV".to_string()]);
        let z_pv = dest
            .placement(dest.placement_id("A_PV_X_PV_Z_PV").unwrap())
            .unwrap();
        assert!(z_pv
            .transform
            .approx_eq(&Transform::from_translation(-50.0, 10.0, 0.0), EPS));
    }

    #[test]
    fn flattening_is_idempotent_across_registries() {
        let source = mother_with_daughter();
        let mut first = Registry::new();
        let mut second = Registry::new();
        Flatten::new(&source).execute(&mut first).unwrap();
        Flatten::new(&source).execute(&mut second).unwrap();

        let names = |reg: &Registry| reg.solids().names().into_iter().collect::<BTreeSet<_>>();
        assert_eq!(names(&first), names(&second));

        for (_, pv) in first.placements().iter() {
            let other = second.placement(second.placement_id(&pv.name).unwrap()).unwrap();
            assert!(pv.transform.approx_eq(&other.transform, EPS));
        }
        for (_, volume) in first.volumes().iter() {
            let lv = volume.as_logical().unwrap();
            let other = second.volume(second.volume_id(&lv.name).unwrap()).unwrap();
            let other = other.as_logical().unwrap();
            assert_eq!(
                first.material(lv.material).unwrap(),
                second.material(other.material).unwrap()
            );
        }
    }

    #[test]
    fn second_run_into_same_registry_reuses_everything() {
        let source = mother_with_daughter();
        let mut dest = Registry::new();
        Flatten::new(&source).execute(&mut dest).unwrap();
        let counts = (dest.solids().len(), dest.volumes().len(), dest.placements().len());

        let report = Flatten::new(&source).execute(&mut dest).unwrap();

        assert_eq!(
            (dest.solids().len(), dest.volumes().len(), dest.placements().len()),
            counts
        );
        assert!(report.reused.contains(&"M_PV_M_LV_minus0_D".to_string()));
        assert!(report.reused.contains(&"world_LV".to_string()));
        assert!(report.reused.contains(&"M_PV_D_PV".to_string()));
    }

    #[test]
    fn colliding_derived_names_of_different_placements_fail() {
        let mut source = Registry::new();
        let w = world(&mut source);
        let a = MakeAssembly::new("A").execute(&mut source).unwrap();
        let ab = MakeAssembly::new("AB").execute(&mut source).unwrap();
        let l1 = cube(&mut source, "L1", 1.0, "G4_Cu");
        let l2 = cube(&mut source, "L2", 1.0, "G4_Pb");
        place(&mut source, "a", a, w, Transform::identity());
        place(&mut source, "b_c", l1, a, Transform::from_translation(100.0, 0.0, 0.0));
        place(&mut source, "a_b", ab, w, Transform::identity());
        place(&mut source, "c", l2, ab, Transform::from_translation(-100.0, 0.0, 0.0));

        let mut dest = Registry::new();
        let err = Flatten::new(&source).execute(&mut dest).unwrap_err();
        assert!(err.is_duplicate_name());

        let mut dest = Registry::new();
        let report = Flatten::new(&source)
            .with_separator("/")
            .execute(&mut dest)
            .unwrap();
        assert_eq!(report.leaves, vec!["a/b_c".to_string(), "a_b/c".to_string()]);
    }

    #[test]
    fn existing_volume_with_other_solid_is_not_reused() {
        let mut source = Registry::new();
        let w = world(&mut source);
        let l = cube(&mut source, "L", 3.0, "G4_Cu");
        place(&mut source, "L_PV", l, w, Transform::identity());

        let mut dest = Registry::new();
        let other = MakeBox::new("X", 1.0, 1.0, 1.0).execute(&mut dest).unwrap();
        let copper = dest.nist_material("G4_Cu");
        MakeLogicalVolume::new("L_LV", other, copper).execute(&mut dest).unwrap();

        let err = Flatten::new(&source).execute(&mut dest).unwrap_err();
        assert!(err.is_duplicate_name());
        assert_eq!(solid_of(&dest, "L_LV"), other);
    }

    #[test]
    fn leaf_keeps_its_solid() {
        let mut source = Registry::new();
        let w = world(&mut source);
        let l = cube(&mut source, "L", 3.0, "G4_Cu");
        place(&mut source, "L_PV", l, w, Transform::from_translation(0.0, 7.0, 0.0));

        let mut dest = Registry::new();
        let report = Flatten::new(&source).execute(&mut dest).unwrap();

        assert!(report.childless.is_empty());
        let original = source.solid(solid_of(&source, "L_LV")).unwrap();
        let copied = dest.solid(solid_of(&dest, "L_LV")).unwrap();
        assert_eq!(original, copied);
        assert!(!dest.solids().names().iter().any(|n| n.contains("minus")));
    }

    #[test]
    fn world_without_children_is_copied() {
        let mut source = Registry::new();
        world(&mut source);
        let mut dest = Registry::new();
        let report = Flatten::new(&source).execute(&mut dest).unwrap();
        assert_eq!(report, FlattenReport::default());
        assert_eq!(dest.world_volume().unwrap().name, "world_LV");
    }

    #[test]
    fn empty_assembly_is_skipped() {
        let mut source = Registry::new();
        let w = world(&mut source);
        let grp = MakeAssembly::new("empty").execute(&mut source).unwrap();
        place(&mut source, "empty_PV", grp, w, Transform::identity());

        let mut dest = Registry::new();
        let report = Flatten::new(&source).execute(&mut dest).unwrap();
        assert_eq!(report.skipped, vec!["empty_PV".to_string()]);
        assert!(dest.volume_id("empty").is_none());
    }

    #[test]
    fn cycle_is_reported_with_path() {
        let mut source = Registry::new();
        let w = world(&mut source);
        let a = cube(&mut source, "A", 10.0, "G4_Cu");
        let b = cube(&mut source, "B", 5.0, "G4_Cu");
        place(&mut source, "A_PV", a, w, Transform::identity());
        place(&mut source, "B_PV", b, a, Transform::identity());
        place(&mut source, "A_again_PV", a, b, Transform::identity());

        let mut dest = Registry::new();
        let err = Flatten::new(&source).execute(&mut dest).unwrap_err();
        match err {
            GeometryError::Hierarchy(HierarchyError::CycleDetected { path }) => {
                assert_eq!(path, vec!["world_LV", "A_LV", "B_LV", "A_LV"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn depth_bound_stops_deep_nesting() {
        let mut source = Registry::new();
        let mut mother = world(&mut source);
        for level in 0..4 {
            let name = format!("L{level}");
            let v = cube(&mut source, &name, 100.0 - f64::from(level), "G4_Cu");
            place(&mut source, &format!("{name}_PV"), v, mother, Transform::identity());
            mother = v;
        }

        let mut dest = Registry::new();
        assert!(Flatten::new(&source).with_max_depth(2).execute(&mut dest).is_err());

        let mut dest = Registry::new();
        assert!(Flatten::new(&source).with_max_depth(8).execute(&mut dest).is_ok());
    }

    #[test]
    fn no_world_fails() {
        let source = Registry::new();
        let mut dest = Registry::new();
        assert!(Flatten::new(&source).execute(&mut dest).is_err());
    }
}
