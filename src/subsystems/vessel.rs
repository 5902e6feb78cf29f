use std::f64::consts::FRAC_PI_2;

use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::Result;
use crate::registry::{Registry, SolidId, VolumeId};

use super::parts::{at, frame, pivot, Parts};
use super::{AIR, COARSE_CUT_OVERSIZE, COPPER};

pub(crate) const VESSEL_RADIUS: f64 = 192.5;
pub(crate) const VESSEL_LENGTH: f64 = 530.0;
const VESSEL_THICKNESS: f64 = 60.0;

/// The two calibration holes sit at `±CALIBRATION_HOLE_Z`, left at `+z`.
const CALIBRATION_HOLE_Z: f64 = 80.0;

const SHIELDING_RADIUS: f64 = 25.0;
const SHIELDING_LENGTH: f64 = 30.0;
const SHIELDING_CUT_LENGTH: f64 = SHIELDING_LENGTH + COARSE_CUT_OVERSIZE;
const SHIELDING_CUT_HEIGHT: f64 = 24.0;
const SHIELDING_CUT_THICKNESS: f64 = 3.0;
const SHIELDING_CUT_SEPARATION: f64 = 22.0;

/// Shift of an open shielding, turned away from the hole.
const OPEN_SHIFT_Y: f64 = -9.15;
const OPEN_SHIFT_Z: f64 = 15.68;

const CLOSED_TURN: f64 = -66.6 * std::f64::consts::PI / 180.0;
const OPEN_TURN: f64 = 6.59 * std::f64::consts::PI / 180.0;

const EXTERNAL_TAP_LENGTH: f64 = 10.0;
const EXTERNAL_TAP_RADIUS: f64 = 40.0;
/// Negative: the tap sinks into the vessel wall.
const EXTERNAL_TAP_TO_VESSEL: f64 = -2.0;

const INTERNAL_TAP_LENGTH: f64 = 5.0;
const INTERNAL_TAP_RADIUS: f64 = 25.0;

/// Name of the gas volume inside the vessel, where the readout and the field
/// cage go.
pub const INNER_GAS: &str = "gas_LV";

/// State of the rotating shielding in front of a calibration hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationPort {
    Open,
    Closed,
}

/// Builds the copper vessel with its calibration ports and the inner gas, in
/// `vessel_assembly`.
///
/// The vessel axis is z. The gas is the inner cylinder minus everything of
/// the vessel that reaches into it.
pub struct VesselAssembly {
    name: String,
    left: CalibrationPort,
    right: CalibrationPort,
}

impl Default for VesselAssembly {
    fn default() -> Self {
        Self::new()
    }
}

impl VesselAssembly {
    /// Left port open, right port closed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "vessel_assembly".to_owned(),
            left: CalibrationPort::Open,
            right: CalibrationPort::Closed,
        }
    }

    #[must_use]
    pub fn with_ports(mut self, left: CalibrationPort, right: CalibrationPort) -> Self {
        self.left = left;
        self.right = right;
        self
    }

    /// Registers the vessel and returns its assembly.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the vessel names is already taken.
    #[instrument(skip(self, registry), fields(left = ?self.left, right = ?self.right))]
    pub fn execute(&self, registry: &mut Registry) -> Result<VolumeId> {
        let mut parts = Parts::new(registry);
        let outer = VESSEL_RADIUS + VESSEL_THICKNESS;

        let tube = parts.tube("copperVesselTubeSolid", VESSEL_RADIUS, outer, VESSEL_LENGTH)?;
        let cap = parts.tube("copperVesselEndCapSolid", 0.0, outer, VESSEL_THICKNESS)?;
        let cap_z = VESSEL_LENGTH / 2.0 + VESSEL_THICKNESS / 2.0;
        let body = parts.union("copperVesselSolid0", tube, cap, at(0.0, 0.0, -cap_z))?;
        let body = parts.union("copperVesselSolid", body, cap, at(0.0, 0.0, cap_z))?;

        let body = Self::calibration_taps(&mut parts, body)?;
        let body = self.calibration_shielding(&mut parts, body)?;

        let gas_tube = parts.tube("gasTube", 0.0, VESSEL_RADIUS, VESSEL_LENGTH)?;
        let gas = parts.subtract("gasSolid", gas_tube, body, at(0.0, 0.0, 0.0))?;

        let assembly = parts.assembly(&self.name)?;
        let vessel_lv = parts.logical("vessel_LV", body, COPPER)?;
        let gas_lv = parts.logical(INNER_GAS, gas, AIR)?;
        parts.place("vessel_PV", vessel_lv, assembly, at(0.0, 0.0, 0.0))?;
        parts.place("gas_PV", gas_lv, assembly, at(0.0, 0.0, 0.0))?;

        info!(assembly = %self.name, "vessel built");
        Ok(assembly)
    }

    /// Caps on both calibration holes, outside and inside the wall.
    fn calibration_taps(parts: &mut Parts<'_>, body: SolidId) -> Result<SolidId> {
        let external = parts.tube("calibrationExternalTap", 0.0, EXTERNAL_TAP_RADIUS, EXTERNAL_TAP_LENGTH)?;
        let internal = parts.tube("calibrationInternalTap", 0.0, INTERNAL_TAP_RADIUS, INTERNAL_TAP_LENGTH)?;

        let along_x = [0.0, FRAC_PI_2, 0.0];
        let external_x =
            VESSEL_RADIUS + VESSEL_THICKNESS + EXTERNAL_TAP_LENGTH / 2.0 + EXTERNAL_TAP_TO_VESSEL;
        let internal_x = VESSEL_RADIUS - INTERNAL_TAP_LENGTH / 2.0;
        let z = CALIBRATION_HOLE_Z;

        let body = parts.union("copperVesselSolid_LE", body, external, frame(along_x, [external_x, 0.0, z]))?;
        let body = parts.union("copperVesselSolid_LERE", body, external, frame(along_x, [external_x, 0.0, -z]))?;
        let body = parts.union("copperVesselSolid_LERE_LI", body, internal, frame(along_x, [internal_x, 0.0, z]))?;
        parts.union(
            "copperVesselSolid_LERE_LIRI",
            body,
            internal,
            frame(along_x, [internal_x, 0.0, -z]),
        )
    }

    /// Half-cut shielding cylinders in front of each hole, inside the vessel.
    fn calibration_shielding(&self, parts: &mut Parts<'_>, body: SolidId) -> Result<SolidId> {
        let base = parts.tube("calibrationShielding_base", 0.0, SHIELDING_RADIUS, SHIELDING_LENGTH)?;
        let cut = parts.cuboid(
            "calibrationShieldingCutBox",
            [SHIELDING_CUT_THICKNESS, SHIELDING_CUT_HEIGHT, SHIELDING_CUT_LENGTH],
        )?;
        // only the half of the cylinder facing the hole is cut
        let cut_offset = [
            SHIELDING_CUT_SEPARATION + SHIELDING_CUT_THICKNESS / 2.0,
            0.0,
            -SHIELDING_LENGTH / 2.0,
        ];
        let closed = parts.subtract(
            "calibrationShieldingCloseSolid",
            base,
            cut,
            pivot([0.0, 0.0, CLOSED_TURN], [0.0; 3], cut_offset),
        )?;
        let open = parts.subtract(
            "calibrationShieldingOpenSolid",
            base,
            cut,
            pivot([0.0, 0.0, OPEN_TURN], [0.0; 3], cut_offset),
        )?;

        let x = VESSEL_RADIUS - INTERNAL_TAP_LENGTH - SHIELDING_CUT_LENGTH / 2.0;
        let facing_wall = [0.0, -FRAC_PI_2, 0.0];
        let (solid, y, dz) = shielding_state(self.left, open, closed, -1.0);
        let body = parts.union(
            "vesselSolid_2",
            body,
            solid,
            frame(facing_wall, [x, y, CALIBRATION_HOLE_Z + dz]),
        )?;
        let (solid, y, dz) = shielding_state(self.right, open, closed, 1.0);
        parts.union(
            "vesselSolid",
            body,
            solid,
            frame(facing_wall, [x, y, -CALIBRATION_HOLE_Z + dz]),
        )
    }
}

/// Solid and `(y, z)` shift of one shielding; an open one moves toward the
/// vessel centre along z, so `toward_centre` is the sign of that move.
fn shielding_state(port: CalibrationPort, open: SolidId, closed: SolidId, toward_centre: f64) -> (SolidId, f64, f64) {
    match port {
        CalibrationPort::Open => (open, OPEN_SHIFT_Y, toward_centre * OPEN_SHIFT_Z),
        CalibrationPort::Closed => (closed, 0.0, 0.0),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::registry::{BooleanOp, Shape};

    fn last_union(reg: &Registry) -> (String, [f64; 3]) {
        let shape = &reg.solid(reg.solid_id("vesselSolid").unwrap()).unwrap().shape;
        let Shape::Boolean {
            op: BooleanOp::Union,
            second,
            transform,
            ..
        } = shape
        else {
            panic!("vesselSolid is not a union");
        };
        (reg.solid(*second).unwrap().name.clone(), transform.position())
    }

    #[test]
    fn default_ports_open_left_close_right() {
        let mut reg = Registry::new();
        VesselAssembly::new().execute(&mut reg).unwrap();

        let (right, [_, y, z]) = last_union(&reg);
        assert_eq!(right, "calibrationShieldingCloseSolid");
        assert_relative_eq!(y, 0.0);
        assert_relative_eq!(z, -CALIBRATION_HOLE_Z);

        let left = &reg.solid(reg.solid_id("vesselSolid_2").unwrap()).unwrap().shape;
        let Shape::Boolean { second, transform, .. } = left else {
            panic!("vesselSolid_2 is not boolean");
        };
        assert_eq!(reg.solid(*second).unwrap().name, "calibrationShieldingOpenSolid");
        assert_relative_eq!(transform.position()[2], CALIBRATION_HOLE_Z - OPEN_SHIFT_Z);
    }

    #[test]
    fn open_right_port_uses_open_solid() {
        let mut reg = Registry::new();
        VesselAssembly::new()
            .with_ports(CalibrationPort::Closed, CalibrationPort::Open)
            .execute(&mut reg)
            .unwrap();
        let (right, [_, y, z]) = last_union(&reg);
        assert_eq!(right, "calibrationShieldingOpenSolid");
        assert_relative_eq!(y, OPEN_SHIFT_Y);
        assert_relative_eq!(z, -CALIBRATION_HOLE_Z + OPEN_SHIFT_Z);
    }

    #[test]
    fn gas_is_inner_cylinder_minus_vessel() {
        let mut reg = Registry::new();
        let assembly = VesselAssembly::new().execute(&mut reg).unwrap();
        assert_eq!(reg.volume(assembly).unwrap().children().len(), 2);

        let gas = reg.volume(reg.volume_id(INNER_GAS).unwrap()).unwrap();
        let gas_solid = reg.solid(gas.as_logical().unwrap().solid).unwrap();
        assert_eq!(gas_solid.name, "gasSolid");
        let [tube, vessel]: [SolidId; 2] = gas_solid.operands().try_into().unwrap();
        assert_eq!(reg.solid(tube).unwrap().name, "gasTube");
        assert_eq!(reg.solid(vessel).unwrap().name, "vesselSolid");
    }
}
