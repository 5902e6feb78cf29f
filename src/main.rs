//! trexdm-geometry: writes the TREX-DM detector as GDML.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use trexdm_geometry::config::BuildConfig;
use trexdm_geometry::gdml::GdmlWriter;
use trexdm_geometry::operations::flatten::Flatten;
use trexdm_geometry::registry::Registry;
use trexdm_geometry::subsystems::{CalibrationPort, CathodeKind, ShieldingLayout, Subsystem};

#[derive(Parser)]
#[command(name = "trexdm-geometry")]
#[command(about = "Build the TREX-DM detector geometry and write it as GDML", long_about = None)]
struct Cli {
    /// TOML file with build settings; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GDML file to write
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the flattened detector as `<stem>_noDaughters.gdml`
    #[arg(long)]
    childless: bool,

    /// Build only these subsystems
    #[arg(long, value_enum, value_delimiter = ',')]
    only: Vec<Subsystem>,

    #[arg(long, value_enum)]
    left_calibration: Option<CalibrationPort>,

    #[arg(long, value_enum)]
    right_calibration: Option<CalibrationPort>,

    #[arg(long, value_enum)]
    cathode: Option<CathodeKind>,

    #[arg(long, value_enum)]
    shielding_layout: Option<ShieldingLayout>,

    /// Leave out the micromegas cap supports and flat cables
    #[arg(long)]
    simple: bool,
}

impl Cli {
    fn into_config(self) -> Result<BuildConfig> {
        let mut config = match &self.config {
            Some(path) => BuildConfig::load(path)
                .with_context(|| format!("reading configuration {}", path.display()))?,
            None => BuildConfig::default(),
        };
        if let Some(output) = self.output {
            config.output = output;
        }
        config.childless |= self.childless;
        if !self.only.is_empty() {
            config.subsystems = self.only;
        }
        if let Some(port) = self.left_calibration {
            config.left_calibration = port;
        }
        if let Some(port) = self.right_calibration {
            config.right_calibration = port;
        }
        if let Some(cathode) = self.cathode {
            config.cathode = cathode;
        }
        if let Some(layout) = self.shielding_layout {
            config.shielding_layout = layout;
        }
        config.simple_geometry |= self.simple;
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Default: WARN for everything, INFO for this crate.
    // Override with RUST_LOG (e.g. RUST_LOG=trexdm_geometry=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("trexdm_geometry=info".parse()?);
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Cli::parse().into_config()?;

    let mut registry = Registry::new();
    config.detector().execute(&mut registry)?;
    GdmlWriter::new(&registry)
        .write_file(&config.output)
        .with_context(|| format!("writing {}", config.output.display()))?;

    if config.childless {
        let mut flat = Registry::new();
        let report = Flatten::new(&registry)
            .with_max_depth(config.max_depth)
            .with_separator(config.separator.as_str())
            .execute(&mut flat)?;
        let output = config.childless_output();
        GdmlWriter::new(&flat)
            .write_file(&output)
            .with_context(|| format!("writing {}", output.display()))?;
        info!(
            output = %output.display(),
            childless = report.childless.len(),
            leaves = report.leaves.len(),
            "flattened geometry written"
        );
    }
    Ok(())
}
