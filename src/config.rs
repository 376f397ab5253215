use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

/// Runtime settings, layered: defaults, then `ehf.toml` (optional), then `EHF_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: PathBuf,
    pub output_dir: PathBuf,
    /// How many leading pages are scanned for flow-property tables.
    pub flux_scan_pages: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            db_path: PathBuf::from("data/ehf.sqlite"),
            output_dir: PathBuf::from("formalites_json"),
            flux_scan_pages: 5,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from("ehf")
    }

    pub fn load_from(file_stem: &str) -> Result<Self> {
        let defaults = Settings::default();
        let settings = Config::builder()
            .set_default("db_path", defaults.db_path.to_string_lossy().to_string())?
            .set_default("output_dir", defaults.output_dir.to_string_lossy().to_string())?
            .set_default("flux_scan_pages", defaults.flux_scan_pages as u64)?
            .add_source(File::with_name(file_stem).required(false))
            .add_source(Environment::with_prefix("EHF"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
