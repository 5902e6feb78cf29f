use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::registry::{Registry, SolidId, VolumeId};

use super::parts::{at, frame, Parts};
use super::{Side, COPPER, KAPTON, TEFLON};

mod board;
mod limande;
mod support;

use limande::{BRACKET_SIDE_WIDTH, LIMANDE_BELOW, LIMANDE_CORE_THICKNESS, LIMANDE_THICKNESS};

const BASE_LENGTH: f64 = 324.0;
pub(crate) const BASE_RADIUS: f64 = 187.0;
pub(crate) const BASE_THICKNESS: f64 = 4.0;
const RECESS_LENGTH: f64 = 180.0;
const RECESS_THICKNESS: f64 = 2.5;

const BRACKET_LENGTH: f64 = 210.0;
const BRACKET_WIDTH: f64 = 37.0;
const BRACKET_THICKNESS: f64 = 7.8;
/// From the base edge to the outer side of a bracket.
const END_TO_BRACKET: f64 = 15.6;

const PAD_SIZE: [f64; 3] = [202.0, 18.0, PAD_THICKNESS];
const PAD_THICKNESS: f64 = 8.4;

const ROLLER_RADIUS: f64 = 5.0;
const ROLLER_LENGTH: f64 = 164.0;
const ROLLER_LIFT: f64 = 1.0;

/// Supports stand on the diagonal, this far apart.
const SUPPORT_SEPARATION: f64 = 220.79;

const ACTIVE_LENGTH: f64 = 250.0;
const COPPER_THICKNESS: f64 = 0.017;
const KAPTON_THICKNESS: f64 = 0.05;
const KAPTON_CORE_THICKNESS: f64 = 0.15;
/// Four copper layers, two kapton sheets and the kapton core.
const BOARD_THICKNESS: f64 = 4.0 * COPPER_THICKNESS + 2.0 * KAPTON_THICKNESS + KAPTON_CORE_THICKNESS;
/// Kapton board inside the outer copper skins.
const BOARD_CORE_THICKNESS: f64 = BOARD_THICKNESS - 2.0 * COPPER_THICKNESS;

/// The board folds around the base, its bracket and its pad.
const FOLD_INNER_RADIUS: f64 = BASE_THICKNESS / 2.0 + BRACKET_THICKNESS / 2.0 + PAD_THICKNESS / 2.0;

/// Builds the micromegas readout plane in `micromegas_assembly`: copper base
/// with brackets, the layered readout board folding under it, and the flat
/// cables and cap supports behind.
///
/// The readout faces `+z` on the right end, `-z` on the left one.
pub struct MicromegasAssembly {
    name: String,
    side: Side,
    simple: bool,
}

impl Default for MicromegasAssembly {
    fn default() -> Self {
        Self::new()
    }
}

impl MicromegasAssembly {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "micromegas_assembly".to_owned(),
            side: Side::default(),
            simple: false,
        }
    }

    #[must_use]
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Leaves out the cap supports and the flat cables.
    #[must_use]
    pub fn with_simple_geometry(mut self, simple: bool) -> Self {
        self.simple = simple;
        self
    }

    /// Registers the micromegas and returns its assembly.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the micromegas names is already taken.
    #[instrument(skip(self, registry), fields(side = ?self.side, simple = self.simple))]
    pub fn execute(&self, registry: &mut Registry) -> Result<VolumeId> {
        let mut parts = Parts::new(registry);
        // z direction away from the readout
        let back = -self.side.sign();
        let turned = match self.side {
            Side::Right => [0.0; 3],
            Side::Left => [PI, 0.0, 0.0],
        };
        let and_turned = |angles: [f64; 3]| [angles[0] + turned[0], angles[1] + turned[1], angles[2] + turned[2]];

        let base = base(&mut parts)?;
        let bracket = parts.cuboid(
            "mMBaseClosingBracket",
            [BRACKET_LENGTH, BRACKET_WIDTH, BRACKET_THICKNESS],
        )?;
        let pad = parts.cuboid("mMTeflonSpacerPad", PAD_SIZE)?;
        let roller = support::roller(&mut parts)?;
        let copper_board = board::board(&mut parts, "mMBoardCopper", "Copper", BOARD_THICKNESS, 0.0)?;
        let kapton_board = board::board(
            &mut parts,
            "mMBoardKapton",
            "Kapton",
            BOARD_CORE_THICKNESS,
            COPPER_THICKNESS,
        )?;
        let foil = parts.cuboid("mMCopperFoil", [ACTIVE_LENGTH, ACTIVE_LENGTH, COPPER_THICKNESS])?;

        let assembly = parts.assembly(&self.name)?;
        let base_lv = parts.logical("mMBase_LV", base, COPPER)?;
        let bracket_lv = parts.logical("mMBaseClosingBracket_LV", bracket, COPPER)?;
        let pad_lv = parts.logical("mMTeflonSpacerPad_LV", pad, TEFLON)?;
        let roller_lv = parts.logical("roller_LV", roller, TEFLON)?;
        let copper_board_lv = parts.logical("mMBoardCopper_LV", copper_board, COPPER)?;
        let kapton_board_lv = parts.logical("mMBoardKapton_LV", kapton_board, KAPTON)?;
        let foil_lv = parts.logical("mMCopperFoil_LV", foil, COPPER)?;

        parts.place("mMBase", base_lv, assembly, frame(turned, [0.0; 3]))?;

        let edge = BASE_LENGTH / 2.0;
        let bracket_xy = edge - BRACKET_WIDTH / 2.0 - END_TO_BRACKET;
        let pad_z = BASE_THICKNESS / 2.0 + BRACKET_THICKNESS + PAD_THICKNESS / 2.0;
        let closing_z = pad_z + PAD_THICKNESS / 2.0 + BRACKET_THICKNESS / 2.0 + BOARD_THICKNESS + LIMANDE_THICKNESS;
        for (index, turn, [x, y]) in on_edges(bracket_xy) {
            parts.place(
                &format!("mMTeflonSpacerPad{index}"),
                pad_lv,
                assembly,
                frame([0.0, 0.0, turn], [x, y, back * pad_z]),
            )?;
            parts.place(
                &format!("mMBaseClosingBracket{index}"),
                bracket_lv,
                assembly,
                frame([0.0, 0.0, turn], [x, y, back * closing_z]),
            )?;
        }

        let roller_z = back * (BASE_THICKNESS / 2.0 + ROLLER_LIFT);
        parts.place(
            "mMBaseTeflonRoller1",
            roller_lv,
            assembly,
            frame(and_turned([FRAC_PI_2, 0.0, 0.0]), [-edge, 0.0, roller_z]),
        )?;
        parts.place(
            "mMBaseTeflonRoller2",
            roller_lv,
            assembly,
            frame(and_turned([-FRAC_PI_2, 0.0, PI]), [edge, 0.0, roller_z]),
        )?;

        let half_board = BOARD_THICKNESS / 2.0;
        let second_layer = half_board - KAPTON_THICKNESS - COPPER_THICKNESS - KAPTON_THICKNESS - COPPER_THICKNESS / 2.0;
        let third_layer =
            half_board - KAPTON_THICKNESS - 2.0 * COPPER_THICKNESS - 2.0 * KAPTON_THICKNESS - COPPER_THICKNESS / 2.0;
        parts.place("mMCopperFoilLayer2", foil_lv, kapton_board_lv, at(0.0, 0.0, second_layer))?;
        parts.place("mMCopperFoilLayer3", foil_lv, kapton_board_lv, at(0.0, 0.0, third_layer))?;
        parts.place("mMBoardKapton", kapton_board_lv, copper_board_lv, at(0.0, 0.0, 0.0))?;
        parts.place(
            "mMBoardCopper",
            copper_board_lv,
            assembly,
            frame(turned, [0.0, 0.0, -back * (BASE_THICKNESS / 2.0 + half_board)]),
        )?;

        if self.simple {
            debug!("supports and flat cables left out");
        } else {
            self.supports(&mut parts, assembly, back, &and_turned)?;
            Self::flat_cables(&mut parts, assembly, back)?;
        }

        info!(assembly = %self.name, "micromegas built");
        Ok(assembly)
    }

    fn supports(
        &self,
        parts: &mut Parts<'_>,
        assembly: VolumeId,
        back: f64,
        and_turned: &dyn Fn([f64; 3]) -> [f64; 3],
    ) -> Result<()> {
        let solid = support::cap_support(parts)?;
        let support_lv = parts.logical("mMSupport_LV", solid, COPPER)?;
        let d = SUPPORT_SEPARATION / 2.0;
        let z = BASE_THICKNESS / 2.0 + support::CAP_SUPPORT_HEIGHT - support::BASE_HEIGHT / 2.0;
        debug!(side = ?self.side, z = back * z, "placing cap supports");
        parts.place(
            "mMSupport1",
            support_lv,
            assembly,
            frame(and_turned([0.0, 0.0, back * FRAC_PI_4]), [-back * d, back * d, back * z]),
        )?;
        parts.place(
            "mMSupport2",
            support_lv,
            assembly,
            frame(and_turned([0.0, 0.0, -back * 3.0 * FRAC_PI_4]), [back * d, -back * d, back * z]),
        )?;
        Ok(())
    }

    /// Copper flat cables with their kapton core, one on each bracket.
    fn flat_cables(parts: &mut Parts<'_>, assembly: VolumeId, back: f64) -> Result<()> {
        let (outer_a, outer_b) = limande::limandes(parts, "limande", "Copper", LIMANDE_THICKNESS, 0.0, back)?;
        let (inner_a, inner_b) = limande::limandes(
            parts,
            "limandeInner",
            "Kapton",
            LIMANDE_CORE_THICKNESS,
            LIMANDE_BELOW,
            back,
        )?;
        let outer_a = parts.logical("limandeA_LV", outer_a, COPPER)?;
        let outer_b = parts.logical("limandeB_LV", outer_b, COPPER)?;
        let inner_a = parts.logical("limandeInnerA_LV", inner_a, KAPTON)?;
        let inner_b = parts.logical("limandeInnerB_LV", inner_b, KAPTON)?;
        parts.place("limandeInnerA", inner_a, outer_a, at(0.0, 0.0, 0.0))?;
        parts.place("limandeInnerB", inner_b, outer_b, at(0.0, 0.0, 0.0))?;

        let z = back * (BASE_THICKNESS / 2.0 + BRACKET_THICKNESS + PAD_THICKNESS + BOARD_THICKNESS + LIMANDE_THICKNESS / 2.0);
        let xy = BASE_LENGTH / 2.0 - END_TO_BRACKET - BRACKET_SIDE_WIDTH / 2.0;
        let cables = [
            (outer_a, 0.0, [0.0, -xy]),
            (outer_a, PI, [0.0, xy]),
            (outer_b, -FRAC_PI_2, [xy, 0.0]),
            (outer_b, FRAC_PI_2, [-xy, 0.0]),
        ];
        for (index, (cable, turn, [x, y])) in cables.into_iter().enumerate() {
            parts.place(
                &format!("limande{}", index + 1),
                cable,
                assembly,
                frame([0.0, 0.0, turn], [x, y, z]),
            )?;
        }
        Ok(())
    }
}

/// Index, turn about z and `(x, y)` of one item on each bracket: two along
/// the y edges, two turned onto the x edges.
fn on_edges(offset: f64) -> [(usize, f64, [f64; 2]); 4] {
    [
        (1, 0.0, [0.0, offset]),
        (2, 0.0, [0.0, -offset]),
        (3, FRAC_PI_2, [offset, 0.0]),
        (4, FRAC_PI_2, [-offset, 0.0]),
    ]
}

/// Rounded square with a bracket under each edge and a shallow recess on
/// the readout face.
fn base(parts: &mut Parts<'_>) -> Result<SolidId> {
    let square = parts.cuboid("mMBaseSquare0", [BASE_LENGTH, BASE_LENGTH, BASE_THICKNESS])?;
    let corners = parts.tube("mMBaseCornersCut", 0.0, BASE_RADIUS, BASE_THICKNESS)?;
    let bracket = parts.cuboid("mMBaseBracket", [BRACKET_LENGTH, BRACKET_WIDTH, BRACKET_THICKNESS])?;
    let mut base = parts.intersect("mMBaseSquareCutted", square, corners, at(0.0, 0.0, 0.0))?;

    let bracket_xy = BASE_LENGTH / 2.0 - BRACKET_WIDTH / 2.0 - END_TO_BRACKET;
    let bracket_z = -(BASE_THICKNESS / 2.0 + BRACKET_THICKNESS / 2.0);
    for (index, turn, [x, y]) in on_edges(bracket_xy) {
        base = parts.union(
            &format!("mMBaseSquare{index}"),
            base,
            bracket,
            frame([0.0, 0.0, turn], [x, y, bracket_z]),
        )?;
    }

    let recess = parts.cuboid("mMBaseRecess", [RECESS_LENGTH, RECESS_LENGTH, RECESS_THICKNESS])?;
    parts.subtract(
        "mMBase",
        base,
        recess,
        at(0.0, 0.0, -BASE_THICKNESS / 2.0 + RECESS_THICKNESS / 2.0),
    )
}
