//! Builders for the parts of the TREX-DM detector.
//!
//! Each builder registers the solids, logical volumes and placements of one
//! subsystem and returns the assembly (or world) that groups them. Dimensions
//! are full lengths in millimetres, as in the mechanical drawings.

mod detector;
mod fieldcage;
mod gem;
mod micromegas;
mod parts;
mod shielding;
mod vessel;

pub use detector::{Detector, Subsystem};
pub use fieldcage::{CathodeKind, FieldCageAssembly};
pub use gem::GemAssembly;
pub use micromegas::MicromegasAssembly;
pub use shielding::{ShieldingAssembly, ShieldingLayout};
pub use vessel::{CalibrationPort, VesselAssembly};

/// Oversize added to cutting solids so the cut never shares a face with the
/// solid it cuts.
pub const CUT_OVERSIZE: f64 = 0.01;

/// Oversize for cuts through thin walls.
pub const FINE_CUT_OVERSIZE: f64 = 0.001;

/// Oversize for long cuts through round solids.
pub const COARSE_CUT_OVERSIZE: f64 = 0.1;

pub const COPPER: &str = "G4_Cu";
pub const LEAD: &str = "G4_Pb";
pub const TEFLON: &str = "G4_TEFLON";
pub const KAPTON: &str = "G4_KAPTON";
pub const AIR: &str = "G4_AIR";
pub const GALACTIC: &str = "G4_Galactic";

/// End of the detector a readout plane sits at.
///
/// Both ends are built from the same right-hand assembly; the left copy is
/// turned half a turn about x when placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Side {
    #[default]
    Right,
    Left,
}

impl Side {
    /// `+1` for the right end, `-1` for the left.
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Side::Right => 1.0,
            Side::Left => -1.0,
        }
    }
}
