use std::f64::consts::PI;

use tracing::{info, instrument};

use crate::error::Result;
use crate::registry::{Registry, SolidId, VolumeId};

use super::micromegas::{BASE_RADIUS, BASE_THICKNESS};
use super::parts::{at, frame, Parts};
use super::{Side, COPPER, KAPTON, TEFLON};

const KAPTON_FOIL_LENGTH: f64 = 280.0;
pub(crate) const KAPTON_FOIL_THICKNESS: f64 = 0.05;
const KAPTON_FEEDTHROUGH_LENGTH: f64 = 15.81;
const KAPTON_FEEDTHROUGH_WIDTH: f64 = 12.0;

const COPPER_FOIL_LENGTH: f64 = 245.0;
const COPPER_FOIL_THICKNESS: f64 = 0.005;
const COPPER_FEEDTHROUGH_LENGTH: f64 = 22.41;
const COPPER_FEEDTHROUGH_WIDTH: f64 = 2.0;
const COPPER_FEEDTHROUGH_INNER_RADIUS: f64 = 4.0;
const COPPER_FEEDTHROUGH_OUTER_RADIUS: f64 = 5.0;

/// Between the facing edges of the two kapton feedthroughs.
const FEEDTHROUGH_GAP: f64 = 34.0;
/// Feedthrough centre line, off the foil axis.
const FEEDTHROUGH_Y: f64 = FEEDTHROUGH_GAP / 2.0 + KAPTON_FEEDTHROUGH_WIDTH / 2.0;

const FRAME_LENGTH: f64 = 280.0;
const FRAME_WIDTH: f64 = 12.5;
const FRAME_THICKNESS: f64 = 4.0;
const FRAME_INDENTATION_LENGTH: f64 = 14.0;
const FRAME_INDENTATION_DEPTH: f64 = 0.5;

const SEPARATOR_LENGTH: f64 = 242.5;
const SEPARATOR_WIDTH: f64 = 16.0;
/// The tensioning lip, 2 mm more, is left out.
pub(crate) const SEPARATOR_THICKNESS: f64 = 5.5;
const SEPARATOR_EXTENSION_LENGTH: f64 = 16.0;
const SEPARATOR_EXTENSION_WIDTH: f64 = 10.0;
/// Between the facing edges of the two extensions.
const SEPARATOR_EXTENSION_GAP: f64 = 128.0;
/// Between the facing edges of the two separators.
const SEPARATOR_GAP: f64 = 248.0;

const FIXER_LENGTH: f64 = 151.2;
const FIXER_WIDTH: f64 = 12.25;
const FIXER_THICKNESS: f64 = 3.0;
const FIXER_TO_SEPARATOR: f64 = 3.64;

/// Builds the GEM foil with its copper electrodes, frame and the separators
/// towards the micromegas, in `gem_assembly`.
///
/// The foil lies in the z = 0 plane; the frame sits on the side facing the
/// cathode and the separators on the side facing the readout.
pub struct GemAssembly {
    name: String,
    side: Side,
}

impl Default for GemAssembly {
    fn default() -> Self {
        Self::new()
    }
}

impl GemAssembly {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "gem_assembly".to_owned(),
            side: Side::default(),
        }
    }

    /// Mirrors the stack along z for the left end.
    #[must_use]
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Registers the GEM and returns its assembly.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the GEM names is already taken.
    #[instrument(skip(self, registry), fields(side = ?self.side))]
    pub fn execute(&self, registry: &mut Registry) -> Result<VolumeId> {
        let mut parts = Parts::new(registry);
        let corners_cut = parts.tube("mMBaseCornersCutForGem", 0.0, BASE_RADIUS, BASE_THICKNESS)?;

        let kapton = kapton_foil(&mut parts, corners_cut)?;
        let (top, bottom) = copper_foils(&mut parts)?;
        let frame_solid = foil_frame(&mut parts, corners_cut)?;
        let (separator, fixer) = separator(&mut parts)?;

        let assembly = parts.assembly(&self.name)?;
        let kapton_lv = parts.logical("gemKaptonFoil_LV", kapton, KAPTON)?;
        let top_lv = parts.logical("gemTop_LV", top, COPPER)?;
        let bottom_lv = parts.logical("gemBottom_LV", bottom, COPPER)?;
        let frame_lv = parts.logical("gemFrame_LV", frame_solid, COPPER)?;
        let fixer_lv = parts.logical("gemmMSeparatorFixer_LV", fixer, COPPER)?;
        let separator_lv = parts.logical("gemmMSeparator_LV", separator, TEFLON)?;

        let dir = self.side.sign();
        let electrode_z = COPPER_FOIL_THICKNESS / 2.0 + KAPTON_FOIL_THICKNESS / 2.0;
        parts.place("gemKaptonFoil_PV", kapton_lv, assembly, at(0.0, 0.0, 0.0))?;
        parts.place("gemTop_PV", top_lv, assembly, at(0.0, 0.0, dir * electrode_z))?;
        parts.place("gemBottom_PV", bottom_lv, assembly, at(0.0, 0.0, -dir * electrode_z))?;
        let frame_z = KAPTON_FOIL_THICKNESS + FRAME_THICKNESS / 2.0;
        parts.place("gemFrame_PV", frame_lv, assembly, at(0.0, 0.0, dir * frame_z))?;

        let separator_y = SEPARATOR_GAP / 2.0 + SEPARATOR_WIDTH / 2.0;
        let separator_z = -dir * (SEPARATOR_THICKNESS / 2.0 + KAPTON_FOIL_THICKNESS);
        let fixer_dy = FIXER_TO_SEPARATOR + SEPARATOR_WIDTH / 2.0 + FIXER_WIDTH / 2.0;
        let fixer_dz = dir * (SEPARATOR_THICKNESS / 2.0 + FIXER_THICKNESS / 2.0);
        // second separator turned so its extensions also point inward
        for (index, sign, turn) in [(1, 1.0, 0.0), (2, -1.0, PI)] {
            let y = sign * separator_y;
            parts.place(
                &format!("gemmMSeparator{index}_PV"),
                separator_lv,
                assembly,
                frame([0.0, 0.0, turn], [0.0, y, separator_z]),
            )?;
            parts.place(
                &format!("gemmMSeparatorFixer{index}_PV"),
                fixer_lv,
                assembly,
                at(0.0, y + sign * fixer_dy, separator_z + fixer_dz),
            )?;
        }

        info!(assembly = %self.name, "GEM built");
        Ok(assembly)
    }
}

/// Kapton square rounded to the base radius, with two tabs carrying the
/// feedthrough holes on the `+x` edge.
fn kapton_foil(parts: &mut Parts<'_>, corners_cut: SolidId) -> Result<SolidId> {
    let square = parts.cuboid(
        "gemKaptonFoilSquare",
        [KAPTON_FOIL_LENGTH, KAPTON_FOIL_LENGTH, KAPTON_FOIL_THICKNESS],
    )?;
    let rounded = parts.intersect("gemKaptonFoilSquareCutted", square, corners_cut, at(0.0, 0.0, 0.0))?;

    let tab = parts.cuboid(
        "gemKaptonFoilFeedthrough0",
        [KAPTON_FEEDTHROUGH_LENGTH, KAPTON_FEEDTHROUGH_WIDTH, KAPTON_FOIL_THICKNESS],
    )?;
    let hole = parts.tube(
        "gemKaptonFoilFeedthroughCut",
        0.0,
        COPPER_FEEDTHROUGH_INNER_RADIUS,
        KAPTON_FOIL_THICKNESS,
    )?;
    let hole_x = KAPTON_FEEDTHROUGH_LENGTH / 2.0 - COPPER_FEEDTHROUGH_OUTER_RADIUS - 1.0;
    let tab = parts.subtract("gemKaptonFoilFeedthrough", tab, hole, at(hole_x, 0.0, 0.0))?;

    let tab_x = KAPTON_FOIL_LENGTH / 2.0 + KAPTON_FEEDTHROUGH_LENGTH / 2.0;
    let foil = parts.union("gemKaptonFoil0", rounded, tab, at(tab_x, FEEDTHROUGH_Y, 0.0))?;
    parts.union("gemKaptonFoil", foil, tab, at(tab_x, -FEEDTHROUGH_Y, 0.0))
}

/// Top and bottom electrodes; each has one strip and ring on its own
/// feedthrough.
fn copper_foils(parts: &mut Parts<'_>) -> Result<(SolidId, SolidId)> {
    let ring = parts.tube(
        "gemCopperFeedthroughRing",
        COPPER_FEEDTHROUGH_INNER_RADIUS,
        COPPER_FEEDTHROUGH_OUTER_RADIUS,
        COPPER_FOIL_THICKNESS,
    )?;
    let strip = parts.cuboid(
        "gemCopperFeedThroughBox",
        [COPPER_FEEDTHROUGH_LENGTH, COPPER_FEEDTHROUGH_WIDTH, COPPER_FOIL_THICKNESS],
    )?;
    let ring_x = COPPER_FEEDTHROUGH_LENGTH / 2.0 + COPPER_FEEDTHROUGH_OUTER_RADIUS;
    let lead = parts.union("gemCopperFeedThrough", strip, ring, at(ring_x, 0.0, 0.0))?;

    let foil = parts.cuboid(
        "gemCopperFoil",
        [COPPER_FOIL_LENGTH, COPPER_FOIL_LENGTH, COPPER_FOIL_THICKNESS],
    )?;
    let lead_x = COPPER_FOIL_LENGTH / 2.0 + COPPER_FEEDTHROUGH_LENGTH / 2.0;
    let top = parts.union("gemTop", foil, lead, at(lead_x, -FEEDTHROUGH_Y, 0.0))?;
    let bottom = parts.union("gemBottom", foil, lead, at(lead_x, FEEDTHROUGH_Y, 0.0))?;
    Ok((top, bottom))
}

/// Square frame with rounded outer corners and a shallow indentation under
/// each feedthrough.
fn foil_frame(parts: &mut Parts<'_>, corners_cut: SolidId) -> Result<SolidId> {
    let outer = parts.cuboid("gemFrameOuterSquare", [FRAME_LENGTH, FRAME_LENGTH, FRAME_THICKNESS])?;
    let inner_length = FRAME_LENGTH - 2.0 * FRAME_WIDTH;
    let inner = parts.cuboid("gemFrameInnerSquare", [inner_length, inner_length, FRAME_THICKNESS])?;
    let outer = parts.intersect("gemFrameOuterWithoutCorners", outer, corners_cut, at(0.0, 0.0, 0.0))?;
    let frame_solid = parts.subtract("gemFrame0", outer, inner, at(0.0, 0.0, 0.0))?;

    let indentation = parts.cuboid(
        "gemFrameFeedthroughIndentation",
        [FRAME_WIDTH, FRAME_INDENTATION_LENGTH, FRAME_INDENTATION_DEPTH],
    )?;
    let x = FRAME_LENGTH / 2.0 - FRAME_WIDTH / 2.0;
    let z = -FRAME_THICKNESS / 2.0 + FRAME_INDENTATION_DEPTH / 2.0;
    let frame_solid = parts.subtract("gemFrame1", frame_solid, indentation, at(x, FEEDTHROUGH_Y, z))?;
    parts.subtract("gemFrame", frame_solid, indentation, at(x, -FEEDTHROUGH_Y, z))
}

/// Separator bar with its two extensions, and the fixer holding it.
fn separator(parts: &mut Parts<'_>) -> Result<(SolidId, SolidId)> {
    let extension = parts.cuboid(
        "gemmMSeparatorExtension",
        [SEPARATOR_EXTENSION_WIDTH, SEPARATOR_EXTENSION_LENGTH, SEPARATOR_THICKNESS],
    )?;
    let bar = parts.cuboid(
        "gemmMSeparator0",
        [SEPARATOR_LENGTH, SEPARATOR_WIDTH, SEPARATOR_THICKNESS],
    )?;
    let x = SEPARATOR_EXTENSION_GAP / 2.0 + SEPARATOR_EXTENSION_WIDTH / 2.0;
    let y = SEPARATOR_WIDTH / 2.0 + SEPARATOR_EXTENSION_LENGTH / 2.0;
    let bar = parts.union("gemmMSeparator1", bar, extension, at(x, y, 0.0))?;
    let separator = parts.union("gemmMSeparator", bar, extension, at(-x, y, 0.0))?;
    let fixer = parts.cuboid(
        "gemmMSeparatorFixer",
        [FIXER_LENGTH, FIXER_WIDTH, FIXER_THICKNESS],
    )?;
    Ok((separator, fixer))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn position(reg: &Registry, placement: &str) -> [f64; 3] {
        reg.placement(reg.placement_id(placement).unwrap())
            .unwrap()
            .transform
            .position()
    }

    #[test]
    fn frame_and_separators_on_opposite_faces() {
        let mut reg = Registry::new();
        let assembly = GemAssembly::new().execute(&mut reg).unwrap();
        assert_eq!(reg.volume(assembly).unwrap().children().len(), 8);

        let frame_z = position(&reg, "gemFrame_PV")[2];
        let separator_z = position(&reg, "gemmMSeparator1_PV")[2];
        assert!(frame_z > 0.0);
        assert!(separator_z < 0.0);
        assert_relative_eq!(separator_z + SEPARATOR_THICKNESS / 2.0, -KAPTON_FOIL_THICKNESS);
    }

    #[test]
    fn left_side_mirrors_along_z() {
        let mut right = Registry::new();
        GemAssembly::new().execute(&mut right).unwrap();
        let mut left = Registry::new();
        GemAssembly::new().with_side(Side::Left).execute(&mut left).unwrap();

        for name in ["gemTop_PV", "gemFrame_PV", "gemmMSeparatorFixer2_PV"] {
            let [rx, ry, rz] = position(&right, name);
            let [lx, ly, lz] = position(&left, name);
            assert_relative_eq!(rx, lx);
            assert_relative_eq!(ry, ly);
            assert_relative_eq!(rz, -lz);
        }
    }

    #[test]
    fn fixers_sit_outside_separators() {
        let mut reg = Registry::new();
        GemAssembly::new().execute(&mut reg).unwrap();
        let [_, sep_y, _] = position(&reg, "gemmMSeparator2_PV");
        let [_, fixer_y, _] = position(&reg, "gemmMSeparatorFixer2_PV");
        assert!(fixer_y < sep_y);
        assert_relative_eq!(
            sep_y - fixer_y,
            FIXER_TO_SEPARATOR + SEPARATOR_WIDTH / 2.0 + FIXER_WIDTH / 2.0
        );
    }
}
