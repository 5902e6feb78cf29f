use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::Result;
use crate::registry::{Registry, VolumeId};

use super::parts::{at, Parts};
use super::{AIR, COPPER, LEAD};

const COPPER_TOP_THICKNESS: f64 = 50.0;

const COPPER_CAGE_THICKNESS: f64 = 50.0;
const COPPER_CAGE_SIZE: [f64; 3] = [700.0, 750.0, 900.0];

/// Open at the top, where the copper top closes it.
const OUTER_GAS_SIZE: [f64; 3] = [
    COPPER_CAGE_SIZE[0] - 2.0 * COPPER_CAGE_THICKNESS,
    COPPER_CAGE_SIZE[1] - COPPER_CAGE_THICKNESS,
    COPPER_CAGE_SIZE[2] - 2.0 * COPPER_CAGE_THICKNESS,
];

const LEAD_THICKNESS: f64 = 200.0;
const LEAD_SIZE: [f64; 3] = [
    2.0 * LEAD_THICKNESS + COPPER_CAGE_SIZE[0],
    LEAD_THICKNESS + COPPER_CAGE_SIZE[1],
    2.0 * LEAD_THICKNESS + COPPER_CAGE_SIZE[2],
];

const CASTLE_SIZE: [f64; 3] = [
    LEAD_SIZE[0],
    LEAD_SIZE[1] + COPPER_TOP_THICKNESS + LEAD_THICKNESS,
    LEAD_SIZE[2],
];

const COPPER_TOP_SIZE: [f64; 3] = [LEAD_SIZE[0], COPPER_TOP_THICKNESS, LEAD_SIZE[2]];

/// Name of the air volume enclosed by the copper cage, where the vessel goes.
pub const OUTER_GAS: &str = "outerGas_LV";

/// How the castle is broken into volumes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ShieldingLayout {
    /// Lead block containing the copper cage and top; the cage contains the
    /// outer gas.
    #[default]
    Nested,
    /// Hollowed parts placed side by side in the assembly.
    ByParts,
}

/// Builds the lead castle with its copper cage, in `shielding_assembly`.
///
/// The castle is centred on the origin with y pointing up; the copper top
/// lies on the cage and the extra lead sits above it.
pub struct ShieldingAssembly {
    name: String,
    layout: ShieldingLayout,
}

impl Default for ShieldingAssembly {
    fn default() -> Self {
        Self::new()
    }
}

impl ShieldingAssembly {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "shielding_assembly".to_owned(),
            layout: ShieldingLayout::default(),
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: ShieldingLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Registers the shielding and returns its assembly.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the shielding names is already taken.
    #[instrument(skip(self, registry), fields(layout = ?self.layout))]
    pub fn execute(&self, registry: &mut Registry) -> Result<VolumeId> {
        let mut parts = Parts::new(registry);
        let assembly = match self.layout {
            ShieldingLayout::Nested => self.nested(&mut parts)?,
            ShieldingLayout::ByParts => self.by_parts(&mut parts)?,
        };
        info!(assembly = %self.name, "shielding built");
        Ok(assembly)
    }

    fn nested(&self, parts: &mut Parts<'_>) -> Result<VolumeId> {
        let copper_cage = parts.cuboid("copperCage", COPPER_CAGE_SIZE)?;
        let outer_gas = parts.cuboid("outerGas", OUTER_GAS_SIZE)?;
        let copper_top = parts.cuboid("copperTop", COPPER_TOP_SIZE)?;
        let castle = parts.cuboid("castleBox", CASTLE_SIZE)?;

        let assembly = parts.assembly(&self.name)?;
        let outer_gas_lv = parts.logical(OUTER_GAS, outer_gas, AIR)?;
        let copper_cage_lv = parts.logical("copperCage_LV", copper_cage, COPPER)?;
        let copper_top_lv = parts.logical("copperTop_LV", copper_top, COPPER)?;
        let lead_lv = parts.logical("leadShielding_LV", castle, LEAD)?;

        let half_cage = COPPER_CAGE_THICKNESS / 2.0;
        parts.place("copperCage_PV", copper_cage_lv, lead_lv, at(0.0, half_cage, 0.0))?;
        let top_y = COPPER_CAGE_SIZE[1] / 2.0 + half_cage + COPPER_TOP_THICKNESS / 2.0;
        parts.place("copperTop_PV", copper_top_lv, lead_lv, at(0.0, top_y, 0.0))?;
        parts.place("outerGas_PV", outer_gas_lv, copper_cage_lv, at(0.0, half_cage, 0.0))?;
        parts.place("leadShielding_PV", lead_lv, assembly, at(0.0, 0.0, 0.0))?;
        Ok(assembly)
    }

    fn by_parts(&self, parts: &mut Parts<'_>) -> Result<VolumeId> {
        let lead_block = parts.cuboid("leadCage0", LEAD_SIZE)?;
        let cage_block = parts.cuboid("copperCage0", COPPER_CAGE_SIZE)?;
        let outer_gas = parts.cuboid("outerGasBox", OUTER_GAS_SIZE)?;

        let cage_in_lead = -LEAD_SIZE[1] / 2.0 + LEAD_THICKNESS + COPPER_CAGE_SIZE[1] / 2.0;
        let lead_cage = parts.subtract("leadCage", lead_block, cage_block, at(0.0, cage_in_lead, 0.0))?;
        let gas_in_cage = COPPER_CAGE_SIZE[1] / 2.0 - OUTER_GAS_SIZE[1] / 2.0;
        let copper_cage = parts.subtract("copperCage", cage_block, outer_gas, at(0.0, gas_in_cage, 0.0))?;
        let copper_top = parts.cuboid("copperTop", COPPER_TOP_SIZE)?;
        let lead_top = parts.cuboid("leadTop", [LEAD_SIZE[0], LEAD_THICKNESS, LEAD_SIZE[2]])?;

        let assembly = parts.assembly(&self.name)?;
        let lead_cage_lv = parts.logical("leadCage_LV", lead_cage, LEAD)?;
        let copper_cage_lv = parts.logical("copperCage_LV", copper_cage, COPPER)?;
        let outer_gas_lv = parts.logical(OUTER_GAS, outer_gas, AIR)?;
        let copper_top_lv = parts.logical("copperTop_LV", copper_top, COPPER)?;
        let lead_top_lv = parts.logical("leadTop_LV", lead_top, LEAD)?;

        let bottom = -CASTLE_SIZE[1] / 2.0;
        let top = CASTLE_SIZE[1] / 2.0;
        let cage_y = bottom + LEAD_THICKNESS + COPPER_CAGE_SIZE[1] / 2.0;
        parts.place("leadCage_PV", lead_cage_lv, assembly, at(0.0, bottom + LEAD_SIZE[1] / 2.0, 0.0))?;
        parts.place("copperCage_PV", copper_cage_lv, assembly, at(0.0, cage_y, 0.0))?;
        let gas_y = top - LEAD_THICKNESS - COPPER_TOP_THICKNESS - OUTER_GAS_SIZE[1] / 2.0;
        parts.place("outerGas_PV", outer_gas_lv, assembly, at(0.0, gas_y, 0.0))?;
        let top_y = bottom + LEAD_THICKNESS + COPPER_CAGE_SIZE[1] + COPPER_TOP_THICKNESS / 2.0;
        parts.place("copperTop_PV", copper_top_lv, assembly, at(0.0, top_y, 0.0))?;
        parts.place("leadTop_PV", lead_top_lv, assembly, at(0.0, top - LEAD_THICKNESS / 2.0, 0.0))?;
        Ok(assembly)
    }
}
