use std::f64::consts::FRAC_PI_4;

use crate::error::Result;
use crate::registry::SolidId;

use super::super::parts::{at, frame, Parts};
use super::super::FINE_CUT_OVERSIZE;
use super::{ROLLER_LENGTH, ROLLER_RADIUS};

const TRIANGLE_THICKNESS: f64 = 15.0;
const TRIANGLE_SQUARE: f64 = 40.0;

const BASE_LENGTH: f64 = 90.0;
const BASE_WIDTH: f64 = 37.0;
pub(super) const BASE_HEIGHT: f64 = 10.0;
const BASE_CUT_LENGTH: f64 = 28.0;
const BASE_CUT_WIDTH: f64 = 15.0;

const COLUMN_A: [f64; 3] = [34.0, 15.0, 45.0];
const COLUMN_B: [f64; 3] = [18.0, 12.0, 57.2];
const COLUMN_C_RADIUS: f64 = 6.0;
const COLUMN_C_HEIGHT: f64 = 3.0;

/// Column B stands out of column A by this much.
const PROTRUSION_A_TO_B: f64 = 2.5;
/// Negative: column B sinks into the base.
const COLUMN_B_TO_BASE: f64 = -2.0;
/// Horizontal offset from column C to the triangle.
const COLUMN_C_TO_TRIANGLE: f64 = 5.45 + 5.05;

/// From the bottom of the base to the top of the triangle.
pub(super) const CAP_SUPPORT_HEIGHT: f64 =
    BASE_HEIGHT + COLUMN_B[2] + COLUMN_B_TO_BASE + COLUMN_C_HEIGHT + TRIANGLE_THICKNESS;

const ROLLER_CUT_SHIFT: f64 = 1.0;

/// Support holding the cap of the readout plane: a notched base, two stacked
/// columns and a pin, topped by a right triangle.
pub(super) fn cap_support(parts: &mut Parts<'_>) -> Result<SolidId> {
    let square = parts.cuboid(
        "mMCapTriangularSupport0",
        [TRIANGLE_SQUARE, TRIANGLE_SQUARE, TRIANGLE_THICKNESS],
    )?;
    let diagonal = TRIANGLE_SQUARE * std::f64::consts::SQRT_2;
    let cut = parts.cuboid(
        "mMCapTriangularSupportCut",
        [diagonal, diagonal, TRIANGLE_THICKNESS + FINE_CUT_OVERSIZE],
    )?;
    let half = TRIANGLE_SQUARE / 2.0;
    let triangle = parts.subtract(
        "mMCapTriangularSupport",
        square,
        cut,
        frame([0.0, 0.0, FRAC_PI_4], [half, half, 0.0]),
    )?;

    let base = parts.cuboid("mMCapSupportBase0", [BASE_LENGTH, BASE_WIDTH, BASE_HEIGHT])?;
    let notch = parts.cuboid("mMCapSupportBaseCut", [BASE_CUT_LENGTH, BASE_CUT_WIDTH, BASE_HEIGHT])?;
    let edge = BASE_WIDTH / 2.0;
    let base = parts.subtract(
        "mMCapSupportBase",
        base,
        notch,
        at(0.0, edge - BASE_CUT_WIDTH / 2.0, 0.0),
    )?;

    let column_a = parts.cuboid("mMCapSupportColumnA", COLUMN_A)?;
    let column_b = parts.cuboid("mMCapSupportColumnB", COLUMN_B)?;
    let column_c = parts.tube("mMCapSupportColumnC", 0.0, COLUMN_C_RADIUS, COLUMN_C_HEIGHT)?;

    let base = parts.union(
        "mMCapSupportBaseA",
        base,
        column_a,
        at(0.0, -edge + COLUMN_A[1] / 2.0, BASE_HEIGHT / 2.0 + COLUMN_A[2] / 2.0),
    )?;
    let column_y = -edge + COLUMN_B[1] / 2.0 - PROTRUSION_A_TO_B;
    let base = parts.subtract(
        "mMCapSupportBaseACutted",
        base,
        column_b,
        at(0.0, column_y, -BASE_HEIGHT / 2.0 + COLUMN_B[2] / 2.0),
    )?;
    let column = parts.union(
        "mMCapSupportColumnBC",
        column_b,
        column_c,
        at(0.0, 0.0, COLUMN_B[2] / 2.0 + COLUMN_C_HEIGHT / 2.0),
    )?;
    let base = parts.union(
        "mMCapSupportBaseColumn",
        base,
        column,
        at(0.0, column_y, BASE_HEIGHT / 2.0 + COLUMN_B[2] / 2.0 + COLUMN_B_TO_BASE),
    )?;

    let top = BASE_HEIGHT / 2.0 + COLUMN_B[2] + COLUMN_C_HEIGHT + COLUMN_B_TO_BASE + TRIANGLE_THICKNESS / 2.0;
    parts.union(
        "mMSupport",
        base,
        triangle,
        frame(
            [0.0, 0.0, -3.0 * FRAC_PI_4],
            [0.0, -COLUMN_C_TO_TRIANGLE + column_y, top],
        ),
    )
}

/// Roller the board folds around, with a quarter notch along its length.
pub(super) fn roller(parts: &mut Parts<'_>) -> Result<SolidId> {
    let tube = parts.tube("mMBaseTeflonRoller0", 0.0, ROLLER_RADIUS, ROLLER_LENGTH)?;
    let notch = parts.cuboid("mMBaseTeflonRollerCut", [ROLLER_RADIUS, ROLLER_RADIUS, ROLLER_LENGTH])?;
    parts.subtract(
        "mMBaseTeflonRoller",
        tube,
        notch,
        at(ROLLER_RADIUS / 2.0, -(ROLLER_RADIUS / 2.0 + ROLLER_CUT_SHIFT), 0.0),
    )
}
