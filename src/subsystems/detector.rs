use std::f64::consts::PI;

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::math::LengthUnit;
use crate::registry::{Registry, VolumeId};

use super::fieldcage::{CathodeKind, FieldCageAssembly};
use super::gem::{self, GemAssembly};
use super::micromegas::{self, MicromegasAssembly};
use super::parts::{at, frame, Parts};
use super::shielding::{self, ShieldingAssembly, ShieldingLayout};
use super::vessel::{self, CalibrationPort, VesselAssembly};
use super::GALACTIC;

/// Side of the cubic world, in metres.
const WORLD_SIZE_M: f64 = 5.0;

/// Height of the separators between the vessel cap and the readout plane.
const TAP_SEPARATOR_HEIGHT: f64 = 84.2;

/// One independently buildable part of the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Subsystem {
    Shielding,
    Vessel,
    FieldCage,
    Gem,
    Micromegas,
}

impl Subsystem {
    pub const ALL: [Subsystem; 5] = [
        Subsystem::Shielding,
        Subsystem::Vessel,
        Subsystem::FieldCage,
        Subsystem::Gem,
        Subsystem::Micromegas,
    ];
}

/// Builds the whole detector under a vacuum world `wl` and makes it the
/// registry world.
///
/// The vessel goes into the shielding's outer gas; the field cage, both
/// GEMs and both readout planes go into the vessel gas. A part whose host is
/// not built goes straight into the world. The readout planes sit at both
/// ends of the vessel, the left copies turned half a turn about x.
#[derive(Debug, Clone)]
pub struct Detector {
    subsystems: Vec<Subsystem>,
    shielding_layout: ShieldingLayout,
    left_port: CalibrationPort,
    right_port: CalibrationPort,
    cathode: CathodeKind,
    simple: bool,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector {
    /// Every subsystem, left calibration port open, right one closed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subsystems: Subsystem::ALL.to_vec(),
            shielding_layout: ShieldingLayout::default(),
            left_port: CalibrationPort::Open,
            right_port: CalibrationPort::Closed,
            cathode: CathodeKind::default(),
            simple: false,
        }
    }

    #[must_use]
    pub fn with_subsystems(mut self, subsystems: impl IntoIterator<Item = Subsystem>) -> Self {
        self.subsystems = subsystems.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_shielding_layout(mut self, layout: ShieldingLayout) -> Self {
        self.shielding_layout = layout;
        self
    }

    #[must_use]
    pub fn with_ports(mut self, left: CalibrationPort, right: CalibrationPort) -> Self {
        self.left_port = left;
        self.right_port = right;
        self
    }

    #[must_use]
    pub fn with_cathode(mut self, cathode: CathodeKind) -> Self {
        self.cathode = cathode;
        self
    }

    /// Builds the micromegas without cap supports and flat cables.
    #[must_use]
    pub fn with_simple_geometry(mut self, simple: bool) -> Self {
        self.simple = simple;
        self
    }

    fn builds(&self, subsystem: Subsystem) -> bool {
        self.subsystems.contains(&subsystem)
    }

    /// Registers the detector and returns the world volume.
    ///
    /// # Errors
    ///
    /// Returns an error if any name is already taken in `registry`.
    #[instrument(skip(self, registry), fields(subsystems = ?self.subsystems))]
    pub fn execute(&self, registry: &mut Registry) -> Result<VolumeId> {
        let world = {
            let mut parts = Parts::new(registry);
            let size = LengthUnit::Meter.to_mm(WORLD_SIZE_M);
            let solid = parts.cuboid("ws", [size, size, size])?;
            parts.logical("wl", solid, GALACTIC)?
        };
        registry.set_world_id(world)?;

        if self.builds(Subsystem::Shielding) {
            let shielding = ShieldingAssembly::new()
                .with_layout(self.shielding_layout)
                .execute(registry)?;
            Parts::new(registry).place("shielding_PV", shielding, world, at(0.0, 0.0, 0.0))?;
        }
        let outer_gas = host(registry, shielding::OUTER_GAS, world);

        if self.builds(Subsystem::Vessel) {
            let vessel = VesselAssembly::new()
                .with_ports(self.left_port, self.right_port)
                .execute(registry)?;
            Parts::new(registry).place("vesselassembly_PV", vessel, outer_gas, at(0.0, 0.0, 0.0))?;
        }
        let gas = host(registry, vessel::INNER_GAS, world);

        if self.builds(Subsystem::FieldCage) {
            let field_cage = FieldCageAssembly::new().with_cathode(self.cathode).execute(registry)?;
            Parts::new(registry).place("fieldcage_PV", field_cage, gas, at(0.0, 0.0, 0.0))?;
        }

        let end = vessel::VESSEL_LENGTH / 2.0 - TAP_SEPARATOR_HEIGHT;
        if self.builds(Subsystem::Gem) {
            let stack = GemAssembly::new().execute(registry)?;
            let z = end - micromegas::BASE_THICKNESS - gem::SEPARATOR_THICKNESS - gem::KAPTON_FOIL_THICKNESS;
            place_both_ends(registry, "gem", stack, gas, z)?;
        }
        if self.builds(Subsystem::Micromegas) {
            let readout = MicromegasAssembly::new()
                .with_simple_geometry(self.simple)
                .execute(registry)?;
            let z = end - micromegas::BASE_THICKNESS / 2.0;
            place_both_ends(registry, "micromegas", readout, gas, z)?;
        }

        info!(
            solids = registry.solids().len(),
            volumes = registry.volumes().len(),
            placements = registry.placements().len(),
            "detector built"
        );
        Ok(world)
    }
}

/// The volume called `name` if its subsystem was built, the world otherwise.
fn host(registry: &Registry, name: &str, world: VolumeId) -> VolumeId {
    registry.volume_id(name).unwrap_or_else(|| {
        debug!(host = name, "not built, placing in the world");
        world
    })
}

/// Places the right copy at `-z` and the left one, turned about x, at `+z`.
fn place_both_ends(registry: &mut Registry, name: &str, assembly: VolumeId, mother: VolumeId, z: f64) -> Result<()> {
    let mut parts = Parts::new(registry);
    parts.place(&format!("{name}Right_PV"), assembly, mother, at(0.0, 0.0, -z))?;
    parts.place(
        &format!("{name}Left_PV"),
        assembly,
        mother,
        frame([PI, 0.0, 0.0], [0.0, 0.0, z]),
    )?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::gdml::GdmlWriter;
    use crate::math::Point3;
    use crate::operations::flatten::Flatten;
    use crate::operations::query::Validate;
    use crate::registry::Named;

    fn mother_of(reg: &Registry, placement: &str) -> String {
        let pv = reg.placement(reg.placement_id(placement).unwrap()).unwrap();
        reg.volume(pv.mother).unwrap().name().to_owned()
    }

    #[test]
    fn full_detector_nests_in_hosts() {
        let mut reg = Registry::new();
        let world = Detector::new().execute(&mut reg).unwrap();
        assert_eq!(reg.world().unwrap(), world);

        assert_eq!(mother_of(&reg, "shielding_PV"), "wl");
        assert_eq!(mother_of(&reg, "vesselassembly_PV"), shielding::OUTER_GAS);
        for name in ["fieldcage_PV", "gemRight_PV", "gemLeft_PV", "micromegasRight_PV", "micromegasLeft_PV"] {
            assert_eq!(mother_of(&reg, name), vessel::INNER_GAS);
        }
        let summary = Validate::new().execute(&reg).unwrap();
        assert!(summary.depth >= 6);
    }

    #[test]
    fn readout_planes_mirror_about_the_cathode() {
        let mut reg = Registry::new();
        Detector::new().execute(&mut reg).unwrap();

        let placement = |name: &str| reg.placement(reg.placement_id(name).unwrap()).unwrap().transform;
        let right = placement("micromegasRight_PV");
        let left = placement("micromegasLeft_PV");
        assert_relative_eq!(right.position()[2], -178.8, epsilon = 1e-9);
        assert_relative_eq!(left.position()[2], 178.8, epsilon = 1e-9);

        // the readout face (+z of the assembly) looks at the cathode from both ends
        let face = Point3::new(0.0, 0.0, 1.0);
        assert!(right.apply(&face).z > right.position()[2]);
        assert!(left.apply(&face).z < left.position()[2]);

        let gem = placement("gemRight_PV").position()[2];
        assert!(gem > right.position()[2]);
    }

    #[test]
    fn missing_host_falls_back_to_world() {
        let mut reg = Registry::new();
        Detector::new()
            .with_subsystems([Subsystem::Vessel, Subsystem::Gem])
            .execute(&mut reg)
            .unwrap();
        assert_eq!(mother_of(&reg, "vesselassembly_PV"), "wl");
        assert_eq!(mother_of(&reg, "gemLeft_PV"), vessel::INNER_GAS);
        assert!(reg.volume_id(shielding::OUTER_GAS).is_none());

        let mut reg = Registry::new();
        Detector::new()
            .with_subsystems([Subsystem::Micromegas])
            .with_simple_geometry(true)
            .execute(&mut reg)
            .unwrap();
        assert_eq!(mother_of(&reg, "micromegasRight_PV"), "wl");
    }

    #[test]
    fn full_detector_writes_gdml() {
        let mut reg = Registry::new();
        Detector::new()
            .with_cathode(CathodeKind::Unified)
            .with_shielding_layout(ShieldingLayout::ByParts)
            .execute(&mut reg)
            .unwrap();
        let gdml = GdmlWriter::new(&reg).to_gdml_string().unwrap();
        assert!(gdml.contains("<world ref=\"wl\"/>"));
        assert!(gdml.contains("name=\"limandeA\""));
        assert!(gdml.contains("name=\"mMBoardCopper_LV\""));
    }

    #[test]
    fn full_detector_flattens_to_one_level() {
        let mut reg = Registry::new();
        Detector::new().execute(&mut reg).unwrap();

        let mut flat = Registry::new();
        let report = Flatten::new(&reg).execute(&mut flat).unwrap();
        let world = flat.world().unwrap();
        // leaves placed more than once are transferred once
        assert!(report.reused.iter().any(|name| name == "mMTeflonSpacerPad_LV"));
        assert!(!report.childless.is_empty());
        assert!(report.childless.iter().any(|name| name.ends_with("gas_LV_childless_LV")));

        for (_, pv) in flat.placements().iter() {
            assert_eq!(pv.mother, world, "{} is nested", pv.name);
            assert!(flat.volume(pv.daughter).unwrap().is_leaf());
        }
        assert_eq!(
            flat.volume(world).unwrap().children().len(),
            report.childless.len() + report.leaves.len()
        );
        Validate::new().execute(&flat).unwrap();
    }

    #[test]
    fn each_subsystem_flattens_alone() {
        for subsystem in Subsystem::ALL {
            let mut reg = Registry::new();
            Detector::new().with_subsystems([subsystem]).execute(&mut reg).unwrap();
            let mut flat = Registry::new();
            let report = Flatten::new(&reg).execute(&mut flat).unwrap();
            assert!(!report.leaves.is_empty(), "{subsystem:?} left no leaves");
            let summary = Validate::new().execute(&flat).unwrap();
            assert_eq!(summary.depth, 1, "{subsystem:?} is not flat");
        }
    }
}
