use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::Result;
use crate::registry::SolidId;

use super::super::parts::{at, frame, pivot, Parts};
use super::super::CUT_OVERSIZE;
use super::{BASE_LENGTH, BRACKET_LENGTH, BRACKET_WIDTH, END_TO_BRACKET, FOLD_INNER_RADIUS, ROLLER_LENGTH};

/// Rounded off inside the base corners.
pub(super) const BOARD_RADIUS: f64 = 182.0;

/// The connector spans the bracket and the strip left past it.
const CONNECTOR_WIDTH: f64 = BRACKET_WIDTH + END_TO_BRACKET;
/// The connector tapers from the bracket length down to the fold length.
const CONNECTOR_TAPER: f64 = (BRACKET_LENGTH - ROLLER_LENGTH) / 2.0;

/// Flexible board folding under the base on its four edges: a rounded square,
/// a half tube around each edge, and a tapered connector back under the base.
///
/// `below` is how far under the outer skin this layer lies; the inner layer
/// folds on a larger radius.
pub(super) fn board(parts: &mut Parts<'_>, name: &str, layer: &str, thickness: f64, below: f64) -> Result<SolidId> {
    let inner = FOLD_INNER_RADIUS + below;

    let square = parts.cuboid(&format!("mMBoardSquare{layer}"), [BASE_LENGTH, BASE_LENGTH, thickness])?;
    let corners = parts.tube(&format!("mMBoardCornersCut{layer}"), 0.0, BOARD_RADIUS, thickness)?;
    let mut board = parts.intersect(&format!("mMBoard0{layer}"), square, corners, at(0.0, 0.0, 0.0))?;

    let fold = parts.tube_section(
        &format!("mMBoardFold{layer}"),
        inner,
        inner + thickness,
        ROLLER_LENGTH,
        0.0,
        PI,
    )?;
    let connector = connector(parts, layer, thickness)?;

    let edge = BASE_LENGTH / 2.0;
    let fold_z = -(inner + thickness / 2.0);
    let folds = [
        ([FRAC_PI_2, -FRAC_PI_2, 0.0], [-edge, 0.0, fold_z]),
        ([FRAC_PI_2, FRAC_PI_2, 0.0], [edge, 0.0, fold_z]),
        ([0.0, FRAC_PI_2, PI], [0.0, -edge, fold_z]),
        ([0.0, FRAC_PI_2, 0.0], [0.0, edge, fold_z]),
    ];
    let folds_last = folds.len() - 1;
    for (index, (angles, position)) in folds.into_iter().enumerate() {
        board = parts.union(
            &if index == folds_last {
                format!("mMBoardWithFold{layer}")
            } else {
                format!("mMBoardWithFold{}{layer}", index + 1)
            },
            board,
            fold,
            frame(angles, position),
        )?;
    }

    let reach = edge - CONNECTOR_WIDTH / 2.0;
    let connector_z = -(2.0 * inner + thickness);
    let connectors = [
        (0.0, [0.0, reach, connector_z]),
        (PI, [0.0, -reach, connector_z]),
        (-FRAC_PI_2, [reach, 0.0, connector_z]),
        (FRAC_PI_2, [-reach, 0.0, connector_z]),
    ];
    let last = connectors.len() - 1;
    for (index, (turn, position)) in connectors.into_iter().enumerate() {
        let solid_name = if index == last {
            name.to_owned()
        } else {
            format!("mMBoardWithFoldAndConnector{index}{layer}")
        };
        board = parts.union(&solid_name, board, connector, frame([0.0, 0.0, turn], position))?;
    }
    Ok(board)
}

/// Connector strip with both outer corners cut on the fold side (`+y`).
fn connector(parts: &mut Parts<'_>, layer: &str, thickness: f64) -> Result<SolidId> {
    let strip = parts.cuboid(
        &format!("mMBoardConnectorBox{layer}"),
        [BRACKET_LENGTH, CONNECTOR_WIDTH, thickness],
    )?;
    let side = END_TO_BRACKET.hypot(CONNECTOR_TAPER);
    let angle = (END_TO_BRACKET / side).asin();
    let cut = parts.cuboid(
        &format!("mMBoardConnectorCut{layer}"),
        [side, side, thickness + CUT_OVERSIZE],
    )?;

    let corner_y = CONNECTOR_WIDTH / 2.0 - END_TO_BRACKET;
    let half_end = BRACKET_LENGTH / 2.0;
    let strip = parts.subtract(
        &format!("mMBoardConnector0{layer}"),
        strip,
        cut,
        pivot([0.0, 0.0, angle], [-half_end, corner_y, 0.0], [side / 2.0, side / 2.0, 0.0]),
    )?;
    parts.subtract(
        &format!("mMBoardConnector{layer}"),
        strip,
        cut,
        pivot([0.0, 0.0, -angle], [half_end, corner_y, 0.0], [-side / 2.0, side / 2.0, 0.0]),
    )
}
