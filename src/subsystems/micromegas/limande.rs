use std::f64::consts::PI;

use crate::error::Result;
use crate::registry::SolidId;

use super::super::parts::{at, frame, pivot, Parts};
use super::super::COARSE_CUT_OVERSIZE;
use super::support::CAP_SUPPORT_HEIGHT;
use super::{BOARD_THICKNESS, BRACKET_LENGTH, BRACKET_THICKNESS, PAD_THICKNESS};

const COPPER_THICKNESS: f64 = 0.017;
/// Two copper layers on each face around the core.
pub(super) const LIMANDE_THICKNESS: f64 = 4.0 * COPPER_THICKNESS + 0.7 + 0.05;
/// Kapton core under the outer copper.
pub(super) const LIMANDE_CORE_THICKNESS: f64 = LIMANDE_THICKNESS - 2.0 * COPPER_THICKNESS;
pub(super) const LIMANDE_BELOW: f64 = COPPER_THICKNESS;

pub(super) const BRACKET_SIDE_WIDTH: f64 = 40.0;
const HALF_TRIANGLE_HEIGHT: f64 = 77.95;
const FOLD_DISTANCE: f64 = 20.0;
const TRAPEZOID_LENGTH: f64 = 40.4;
const TRAPEZOID_WIDTH: f64 = 60.0;
/// Runs up to the level of the cap supports.
const STRAIGHT_LENGTH: f64 = CAP_SUPPORT_HEIGHT
    - BRACKET_THICKNESS
    - PAD_THICKNESS
    - BOARD_THICKNESS
    - 2.0 * LIMANDE_THICKNESS
    - FOLD_DISTANCE;

/// Flat cable leaving the readout from one bracket, as two mirror variants
/// `{name}A` and `{name}B`.
///
/// The base lies on the bracket and narrows into a triangle; its slanted
/// edge folds away from the readout (`towards` is the z direction of that
/// fold), turns into a trapezoid, and ends in a straight strip.
pub(super) fn limandes(
    parts: &mut Parts<'_>,
    name: &str,
    layer: &str,
    thickness: f64,
    below: f64,
    towards: f64,
) -> Result<(SolidId, SolidId)> {
    let fold_distance = FOLD_DISTANCE + 2.0 * below;
    let straight_length = STRAIGHT_LENGTH + below;

    let half_length = BRACKET_LENGTH / 2.0;
    let hyp = HALF_TRIANGLE_HEIGHT.hypot(half_length);
    let slant = (HALF_TRIANGLE_HEIGHT / hyp).asin();

    let base = base(parts, layer, thickness, hyp, slant)?;

    let fold = parts.cuboid(&format!("limandeFold{layer}"), [hyp, thickness, fold_distance])?;
    let triangle_y = BRACKET_SIDE_WIDTH / 2.0 + HALF_TRIANGLE_HEIGHT / 2.0;
    let hinge = |x: f64, z: f64| [x, triangle_y, z];
    let fold_z = towards * (thickness / 2.0 + fold_distance / 2.0);
    let under_hinge = [0.0, -thickness / 2.0 - below, 0.0];
    let a = parts.union(
        &format!("limandeBaseAndFoldA{layer}"),
        base,
        fold,
        pivot([0.0, 0.0, slant], hinge(-half_length / 2.0, fold_z), under_hinge),
    )?;
    let b = parts.union(
        &format!("limandeBaseAndFoldB{layer}"),
        base,
        fold,
        pivot([0.0, 0.0, -slant], hinge(half_length / 2.0, fold_z), under_hinge),
    )?;

    let trapezoid = trapezoid(parts, layer, thickness, below, hyp)?;
    let top_z = towards * (thickness + fold_distance);
    let long_side = [0.0, -TRAPEZOID_LENGTH / 2.0, 0.0];
    let a = parts.union(
        &format!("limandeBaseFoldTrapezoidA{layer}"),
        a,
        trapezoid,
        pivot([0.0, 0.0, slant], hinge(-half_length / 2.0, top_z), long_side),
    )?;
    let b = parts.union(
        &format!("limandeBaseFoldTrapezoidB{layer}"),
        b,
        trapezoid,
        pivot([0.0, PI, -slant], hinge(half_length / 2.0, top_z), long_side),
    )?;

    let straight = parts.cuboid(
        &format!("limandeStraight{layer}"),
        [TRAPEZOID_WIDTH, thickness, straight_length],
    )?;
    let short_side = |x: f64| {
        [
            x,
            -TRAPEZOID_LENGTH + thickness / 2.0 + below,
            towards * (straight_length / 2.0 + thickness / 2.0),
        ]
    };
    let short_x = hyp / 2.0 - TRAPEZOID_WIDTH / 2.0;
    let a = parts.union(
        &format!("{name}A"),
        a,
        straight,
        pivot([0.0, 0.0, slant], hinge(-half_length / 2.0, top_z), short_side(short_x)),
    )?;
    let b = parts.union(
        &format!("{name}B"),
        b,
        straight,
        pivot([0.0, 0.0, -slant], hinge(half_length / 2.0, top_z), short_side(-short_x)),
    )?;
    Ok((a, b))
}

/// Bracket strip with a right triangle on each half, meeting at the apex.
fn base(parts: &mut Parts<'_>, layer: &str, thickness: f64, hyp: f64, slant: f64) -> Result<SolidId> {
    let half_length = BRACKET_LENGTH / 2.0;
    let half_height = HALF_TRIANGLE_HEIGHT / 2.0;

    let strip = parts.cuboid(
        &format!("limandeBracketSide{layer}"),
        [BRACKET_LENGTH, BRACKET_SIDE_WIDTH, thickness],
    )?;
    let block = parts.cuboid(
        &format!("limandeHalfTriangleBox{layer}"),
        [half_length, HALF_TRIANGLE_HEIGHT, thickness],
    )?;
    let cut = parts.cuboid(
        &format!("limandeHalfTriangleCut{layer}"),
        [hyp, HALF_TRIANGLE_HEIGHT, thickness + COARSE_CUT_OVERSIZE],
    )?;
    // the cut hangs from the top left corner down to the bottom right one
    let triangle = parts.subtract(
        &format!("limandeHalfTriangle{layer}"),
        block,
        cut,
        pivot(
            [0.0, 0.0, -slant],
            [-half_length / 2.0, half_height, 0.0],
            [hyp / 2.0, half_height, 0.0],
        ),
    )?;

    let y = BRACKET_SIDE_WIDTH / 2.0 + half_height;
    let base = parts.union(
        &format!("limandeBase0{layer}"),
        strip,
        triangle,
        at(half_length / 2.0, y, 0.0),
    )?;
    parts.union(
        &format!("limandeBase{layer}"),
        base,
        triangle,
        frame([0.0, PI, 0.0], [-half_length / 2.0, y, 0.0]),
    )
}

/// Strip as long as the fold, narrowing to the straight part's width.
fn trapezoid(parts: &mut Parts<'_>, layer: &str, thickness: f64, below: f64, hyp: f64) -> Result<SolidId> {
    let block = parts.cuboid(
        &format!("limandeTrapezoidBox{layer}"),
        [hyp, TRAPEZOID_LENGTH, thickness],
    )?;
    let cut_length = (hyp - TRAPEZOID_WIDTH).hypot(TRAPEZOID_LENGTH);
    let cut = parts.cuboid(
        &format!("limandeTrapezoidCut{layer}"),
        [hyp, cut_length, thickness + COARSE_CUT_OVERSIZE],
    )?;
    let turn = (TRAPEZOID_LENGTH / cut_length).acos();
    parts.subtract(
        &format!("limandeTrapezoid{layer}"),
        block,
        cut,
        pivot(
            [0.0, 0.0, turn],
            [-hyp / 2.0, TRAPEZOID_LENGTH / 2.0 - thickness - 2.0 * below, 0.0],
            [-hyp / 2.0, -cut_length / 2.0, 0.0],
        ),
    )
}
