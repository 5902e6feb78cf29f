//! Build settings loaded from a TOML file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::operations::flatten::{DEFAULT_MAX_DEPTH, DEFAULT_SEPARATOR};
use crate::subsystems::{CalibrationPort, CathodeKind, Detector, ShieldingLayout, Subsystem};

/// What to build and where to write it. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// GDML file to write.
    pub output: PathBuf,
    /// Also write the flattened detector next to `output`.
    pub childless: bool,
    /// Subsystems to build.
    pub subsystems: Vec<Subsystem>,
    pub left_calibration: CalibrationPort,
    pub right_calibration: CalibrationPort,
    pub cathode: CathodeKind,
    pub shielding_layout: ShieldingLayout,
    /// Micromegas without cap supports and flat cables.
    pub simple_geometry: bool,
    /// Nesting depth beyond which flattening reports a cycle.
    pub max_depth: usize,
    /// Joins placement names in flattened names.
    pub separator: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("trexdm.gdml"),
            childless: false,
            subsystems: Subsystem::ALL.to_vec(),
            left_calibration: CalibrationPort::Open,
            right_calibration: CalibrationPort::Closed,
            cathode: CathodeKind::default(),
            shielding_layout: ShieldingLayout::default(),
            simple_geometry: false,
            max_depth: DEFAULT_MAX_DEPTH,
            separator: DEFAULT_SEPARATOR.to_owned(),
        }
    }
}

impl BuildConfig {
    /// Reads the settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parses the settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML, unknown keys or
    /// unknown values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// The detector these settings describe.
    #[must_use]
    pub fn detector(&self) -> Detector {
        Detector::new()
            .with_subsystems(self.subsystems.iter().copied())
            .with_shielding_layout(self.shielding_layout)
            .with_ports(self.left_calibration, self.right_calibration)
            .with_cathode(self.cathode)
            .with_simple_geometry(self.simple_geometry)
    }

    /// `<stem>_noDaughters.gdml` beside the main output.
    #[must_use]
    pub fn childless_output(&self) -> PathBuf {
        let stem = self
            .output
            .file_stem()
            .map_or_else(|| "trexdm".into(), |stem| stem.to_string_lossy());
        self.output.with_file_name(format!("{stem}_noDaughters.gdml"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(BuildConfig::from_toml_str("").unwrap(), BuildConfig::default());
    }

    #[test]
    fn parses_every_key() {
        let config = BuildConfig::from_toml_str(
            r#"
            output = "out/detector.gdml"
            childless = true
            subsystems = ["vessel", "field-cage"]
            left_calibration = "closed"
            right_calibration = "open"
            cathode = "unified"
            shielding_layout = "by-parts"
            simple_geometry = true
            max_depth = 8
            separator = "."
            "#,
        )
        .unwrap();
        assert_eq!(config.subsystems, [Subsystem::Vessel, Subsystem::FieldCage]);
        assert_eq!(config.left_calibration, CalibrationPort::Closed);
        assert_eq!(config.cathode, CathodeKind::Unified);
        assert_eq!(config.shielding_layout, ShieldingLayout::ByParts);
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.separator, ".");
        assert_eq!(
            config.childless_output(),
            PathBuf::from("out/detector_noDaughters.gdml")
        );
    }

    #[test]
    fn rejects_unknown_values() {
        let err = BuildConfig::from_toml_str("cathode = \"paper\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let err = BuildConfig::from_toml_str("colour = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = BuildConfig::load(Path::new("/nonexistent/trexdm.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
