//! Report settings and the business-rule constants they default to.
//!
//! Settings come from an optional TOML file layered with `DAC_*` environment
//! variables. Every field has a default, so an empty or missing file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Years at or below this have unreliable voided flags upstream.
pub const VOIDED_CUTOFF_YEAR: i32 = 2010;

/// Rows kept by the storage ranking.
pub const STORAGE_TOP_N: usize = 10;

/// Yearly visit total above which a facility counts as high volume.
pub const HIGH_VOLUME_THRESHOLD: u64 = 50_000;

pub const MILLION: u64 = 1_000_000;
pub const THOUSAND: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// CSV export of the visit query.
    pub visits_path: PathBuf,
    /// CSV export of the schema size query.
    pub storage_path: PathBuf,
    /// Directory receiving report CSV and JSON files.
    pub output_dir: PathBuf,
    pub voided_cutoff_year: i32,
    pub storage_top_n: usize,
    pub high_volume_threshold: u64,
    /// Rows shown in console previews.
    pub preview_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            visits_path: PathBuf::from("visits.csv"),
            storage_path: PathBuf::from("db_stats.csv"),
            output_dir: PathBuf::from("."),
            voided_cutoff_year: VOIDED_CUTOFF_YEAR,
            storage_top_n: STORAGE_TOP_N,
            high_volume_threshold: HIGH_VOLUME_THRESHOLD,
            preview_rows: 5,
        }
    }
}

impl ReportConfig {
    /// Load settings from `path` (may be absent) and `DAC_*` env vars.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()).required(false))
            .add_source(config::Environment::with_prefix("DAC").try_parsing(true))
            .build()?;
        let cfg: ReportConfig = settings.try_deserialize()?;
        tracing::debug!(?cfg, path = %path.display(), "loaded report config");
        Ok(cfg)
    }

    /// Whether headline metrics may be computed for `year`.
    pub fn voided_split_available(&self, year: i32) -> bool {
        year > self.voided_cutoff_year
    }
}
