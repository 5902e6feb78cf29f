use std::f64::consts::FRAC_PI_2;

use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::Result;
use crate::registry::{Registry, SolidId, VolumeId};

use super::parts::{at, frame, Parts};
use super::{COPPER, CUT_OVERSIZE, FINE_CUT_OVERSIZE, KAPTON, TEFLON};

const CATHODE_LENGTH: f64 = 206.0;
const CATHODE_COPPER_THICKNESS: f64 = 0.002;
const CATHODE_KAPTON_THICKNESS: f64 = 0.0125;

const CATHODE_FRAME_LENGTH: f64 = 236.0;
const CATHODE_FRAME_INNER_LENGTH: f64 = 206.0;
const CATHODE_FRAME_THICKNESS: f64 = 10.0;

const FEEDTHROUGH_HEIGHT: f64 = 65.0;
const FEEDTHROUGH_WIDTH: f64 = 12.0;
const FEEDTHROUGH_THICKNESS: f64 = 10.0;
const FEEDTHROUGH_TO_FRAME: f64 = 2.0;

const SIDE_FRAME_LENGTH: f64 = 264.0;
const SIDE_FRAME_INNER_LENGTH: f64 = 252.0;
const SIDE_FRAME_THICKNESS: f64 = 5.0;

const SEPARATOR_LENGTH: f64 = SIDE_FRAME_LENGTH;
const SEPARATOR_INNER_LENGTH: f64 = 248.0;
const SEPARATOR_THICKNESS: f64 = 15.0;
const SEPARATOR_SLOT_HEIGHT: f64 = 65.0;
const SEPARATOR_WIDTH: f64 = (SEPARATOR_LENGTH - SEPARATOR_INNER_LENGTH) / 2.0;

const CORNERS_LENGTH: f64 = SIDE_FRAME_LENGTH;
const CORNERS_INNER_LENGTH: f64 = SIDE_FRAME_INNER_LENGTH;
const CORNERS_THICKNESS: f64 = 144.0;
const CORNERS_WIDTH: f64 = (CORNERS_LENGTH - CORNERS_INNER_LENGTH) / 2.0;
const CORNERS_SLOT_HEIGHT: f64 = 184.0;

const CLOSER_FRAME_LENGTH: f64 = 266.0;
const CLOSER_FRAME_INNER_LENGTH: f64 = SEPARATOR_INNER_LENGTH;
const CLOSER_FRAME_THICKNESS: f64 = 10.0;

/// How the cathode foil is modelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CathodeKind {
    /// Kapton foil with a copper film on each face.
    #[default]
    Layered,
    /// One copper foil as thick as the whole sandwich.
    Unified,
}

/// Builds the field cage around the central cathode, in
/// `fieldcage_assembly`.
///
/// Everything is stacked along z, symmetric about the cathode plane.
pub struct FieldCageAssembly {
    name: String,
    cathode: CathodeKind,
}

impl Default for FieldCageAssembly {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldCageAssembly {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "fieldcage_assembly".to_owned(),
            cathode: CathodeKind::default(),
        }
    }

    #[must_use]
    pub fn with_cathode(mut self, cathode: CathodeKind) -> Self {
        self.cathode = cathode;
        self
    }

    /// Registers the field cage and returns its assembly.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the field cage names is already taken.
    #[instrument(skip(self, registry), fields(cathode = ?self.cathode))]
    pub fn execute(&self, registry: &mut Registry) -> Result<VolumeId> {
        let mut parts = Parts::new(registry);
        let assembly = parts.assembly(&self.name)?;

        self.cathode(&mut parts, assembly)?;

        let frame_solid = hollow_square(
            &mut parts,
            "cathodeFrame",
            CATHODE_FRAME_LENGTH,
            CATHODE_FRAME_INNER_LENGTH,
            CATHODE_FRAME_THICKNESS,
        )?;
        let side_frame = hollow_square(
            &mut parts,
            "cathodeSideFrame",
            SIDE_FRAME_LENGTH,
            SIDE_FRAME_INNER_LENGTH,
            SIDE_FRAME_THICKNESS,
        )?;
        let feedthrough = parts.cuboid(
            "cathodeFeedthrough",
            [FEEDTHROUGH_WIDTH, FEEDTHROUGH_HEIGHT, FEEDTHROUGH_THICKNESS],
        )?;
        let separator = side_separator(&mut parts)?;
        let corners = corners(&mut parts)?;
        let closer = hollow_square(
            &mut parts,
            "closerFrame",
            CLOSER_FRAME_LENGTH,
            CLOSER_FRAME_INNER_LENGTH,
            CLOSER_FRAME_THICKNESS,
        )?;

        let frame_lv = parts.logical("cathodeFrame_LV", frame_solid, COPPER)?;
        let feedthrough_lv = parts.logical("cathodeFeedthrough_LV", feedthrough, COPPER)?;
        let side_frame_lv = parts.logical("cathodeSideFrame_LV", side_frame, COPPER)?;
        let separator_lv = parts.logical("sideSeparator_LV", separator, TEFLON)?;
        let corners_lv = parts.logical("corners_LV", corners, TEFLON)?;
        let closer_lv = parts.logical("closerFrame_LV", closer, TEFLON)?;

        parts.place("cathodeFrame_PV", frame_lv, assembly, at(0.0, 0.0, 0.0))?;
        let feedthrough_x = -(FEEDTHROUGH_WIDTH / 2.0 + FEEDTHROUGH_TO_FRAME + CATHODE_FRAME_LENGTH / 2.0);
        parts.place("cathodeFeedthrough_PV", feedthrough_lv, assembly, at(feedthrough_x, 0.0, 0.0))?;
        parts.place("sideSeparator_PV", separator_lv, assembly, at(0.0, 0.0, 0.0))?;

        let side_z = SEPARATOR_THICKNESS / 2.0 + SIDE_FRAME_THICKNESS / 2.0;
        let corners_z = SEPARATOR_THICKNESS / 2.0 + SIDE_FRAME_THICKNESS + CORNERS_THICKNESS / 2.0;
        let closer_z =
            SEPARATOR_THICKNESS / 2.0 + SIDE_FRAME_THICKNESS + CORNERS_THICKNESS + CLOSER_FRAME_THICKNESS / 2.0;
        for (side, sign) in [("Left", -1.0), ("Right", 1.0)] {
            let name = format!("cathodeSideFrame{side}_PV");
            parts.place(&name, side_frame_lv, assembly, at(0.0, 0.0, sign * side_z))?;
            let name = format!("corners{side}_PV");
            parts.place(&name, corners_lv, assembly, at(0.0, 0.0, sign * corners_z))?;
            let name = format!("closerFrame{side}_PV");
            parts.place(&name, closer_lv, assembly, at(0.0, 0.0, sign * closer_z))?;
        }

        info!(assembly = %self.name, "field cage built");
        Ok(assembly)
    }

    fn cathode(&self, parts: &mut Parts<'_>, assembly: VolumeId) -> Result<()> {
        match self.cathode {
            CathodeKind::Layered => {
                let copper = parts.cuboid(
                    "cathodeFoilCu",
                    [CATHODE_LENGTH, CATHODE_LENGTH, CATHODE_COPPER_THICKNESS],
                )?;
                let kapton = parts.cuboid(
                    "cathodeFoilKapton",
                    [CATHODE_LENGTH, CATHODE_LENGTH, CATHODE_KAPTON_THICKNESS],
                )?;
                let copper_lv = parts.logical("cathodeFoilCu_LV", copper, COPPER)?;
                let kapton_lv = parts.logical("cathodeFoilKapton_LV", kapton, KAPTON)?;
                parts.place("cathodeFoilKapton_PV", kapton_lv, assembly, at(0.0, 0.0, 0.0))?;
                // films lie on the kapton faces
                let film_z = CATHODE_KAPTON_THICKNESS / 2.0 + CATHODE_COPPER_THICKNESS / 2.0;
                parts.place("cathodeFoilCuLeft_PV", copper_lv, assembly, at(0.0, 0.0, -film_z))?;
                parts.place("cathodeFoilCuRight_PV", copper_lv, assembly, at(0.0, 0.0, film_z))?;
            }
            CathodeKind::Unified => {
                let thickness = CATHODE_KAPTON_THICKNESS + 2.0 * CATHODE_COPPER_THICKNESS;
                let foil = parts.cuboid("cathodeFoil", [CATHODE_LENGTH, CATHODE_LENGTH, thickness])?;
                let foil_lv = parts.logical("cathodeFoil_LV", foil, COPPER)?;
                parts.place("cathodeFoil_PV", foil_lv, assembly, at(0.0, 0.0, 0.0))?;
            }
        }
        Ok(())
    }
}

/// Square plate of side `outer` with a square hole of side `inner`.
fn hollow_square(parts: &mut Parts<'_>, name: &str, outer: f64, inner: f64, thickness: f64) -> Result<SolidId> {
    let plate = parts.cuboid(&format!("{name}0"), [outer, outer, thickness])?;
    let hole = parts.cuboid(&format!("{name}Cut"), [inner, inner, thickness + CUT_OVERSIZE])?;
    parts.subtract(name, plate, hole, at(0.0, 0.0, 0.0))
}

/// Separator ring with the feedthrough slot on the `-x` wall.
fn side_separator(parts: &mut Parts<'_>) -> Result<SolidId> {
    let ring = hollow_square(
        parts,
        "sideSeparatorNoSlot",
        SEPARATOR_LENGTH,
        SEPARATOR_INNER_LENGTH,
        SEPARATOR_THICKNESS,
    )?;
    let slot = parts.cuboid(
        "sideSeparatorSlot",
        [SEPARATOR_WIDTH, SEPARATOR_SLOT_HEIGHT, SEPARATOR_THICKNESS + CUT_OVERSIZE],
    )?;
    let slot_x = -(SEPARATOR_INNER_LENGTH / 2.0 + SEPARATOR_WIDTH / 2.0);
    parts.subtract("sideSeparator", ring, slot, at(slot_x, 0.0, 0.0))
}

/// Square tube with a window through the middle of each wall, leaving only
/// the four corner posts.
fn corners(parts: &mut Parts<'_>) -> Result<SolidId> {
    let ring = hollow_square(
        parts,
        "cornersBase",
        CORNERS_LENGTH,
        CORNERS_INNER_LENGTH,
        CORNERS_THICKNESS,
    )?;
    // deep enough along z to cut through either way after turning
    let depth = CORNERS_THICKNESS.max(CORNERS_SLOT_HEIGHT);
    let window = parts.cuboid(
        "cornersWallCut",
        [CORNERS_WIDTH + FINE_CUT_OVERSIZE, CORNERS_SLOT_HEIGHT, depth],
    )?;
    let wall = CORNERS_INNER_LENGTH / 2.0 + CORNERS_WIDTH / 2.0;
    let quarter = [0.0, 0.0, FRAC_PI_2];
    let solid = parts.subtract("corners1", ring, window, at(-wall, 0.0, 0.0))?;
    let solid = parts.subtract("corners2", solid, window, at(wall, 0.0, 0.0))?;
    let solid = parts.subtract("corners3", solid, window, frame(quarter, [0.0, -wall, 0.0]))?;
    parts.subtract("corners4", solid, window, frame(quarter, [0.0, wall, 0.0]))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::registry::Shape;

    fn z_of(reg: &Registry, placement: &str) -> f64 {
        reg.placement(reg.placement_id(placement).unwrap())
            .unwrap()
            .transform
            .position()[2]
    }

    #[test]
    fn layered_cathode_films_touch_kapton() {
        let mut reg = Registry::new();
        FieldCageAssembly::new().execute(&mut reg).unwrap();
        let film = z_of(&reg, "cathodeFoilCuRight_PV");
        assert_relative_eq!(film - CATHODE_COPPER_THICKNESS / 2.0, CATHODE_KAPTON_THICKNESS / 2.0);
        assert_relative_eq!(z_of(&reg, "cathodeFoilCuLeft_PV"), -film);
    }

    #[test]
    fn unified_cathode_is_single_copper_foil() {
        let mut reg = Registry::new();
        let assembly = FieldCageAssembly::new()
            .with_cathode(CathodeKind::Unified)
            .execute(&mut reg)
            .unwrap();
        assert!(reg.volume_id("cathodeFoilKapton_LV").is_none());
        let foil = reg.volume(reg.volume_id("cathodeFoil_LV").unwrap()).unwrap();
        let foil = foil.as_logical().unwrap();
        assert_eq!(reg.material(foil.material).unwrap().name, COPPER);
        // foil, frame, feedthrough, separator and two of each side part
        assert_eq!(reg.volume(assembly).unwrap().children().len(), 10);
    }

    #[test]
    fn stack_is_contiguous_along_z() {
        let mut reg = Registry::new();
        FieldCageAssembly::new().execute(&mut reg).unwrap();
        let corners = z_of(&reg, "cornersRight_PV");
        let closer = z_of(&reg, "closerFrameRight_PV");
        assert_relative_eq!(
            corners + CORNERS_THICKNESS / 2.0,
            closer - CLOSER_FRAME_THICKNESS / 2.0
        );
        assert_relative_eq!(z_of(&reg, "closerFrameLeft_PV"), -closer);
    }

    #[test]
    fn wall_windows_are_oversized() {
        let mut reg = Registry::new();
        FieldCageAssembly::new().execute(&mut reg).unwrap();
        let Shape::Box { half_x, half_z, .. } = reg.solid(reg.solid_id("cornersWallCut").unwrap()).unwrap().shape
        else {
            panic!("window is not a box");
        };
        assert!(2.0 * half_x > CORNERS_WIDTH);
        assert_relative_eq!(2.0 * half_z, CORNERS_SLOT_HEIGHT);
    }
}
