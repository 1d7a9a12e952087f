//! On-disk TOML schema.
//!
//! These structs mirror the files byte for byte. Cascades and defaults are
//! resolved in [`super::model`], not here.

use std::path::PathBuf;

use serde::Deserialize;

/// System configuration file.
#[derive(Debug, Deserialize)]
pub struct SystemConfigFile {
    /// Message tags the listener subscribes to.
    pub listener_tags: Vec<String>,
    /// Path of the production configuration file.
    pub product_config_path: PathBuf,
}

/// Production configuration file.
#[derive(Debug, Deserialize)]
pub struct ProductConfigFile {
    pub common: CommonTable,
    #[serde(default)]
    pub areas: Vec<AreaTable>,
}

/// `[common]` table with the top of every cascade.
#[derive(Debug, Deserialize)]
pub struct CommonTable {
    pub output_dir: PathBuf,
    pub filename_pattern: String,
    /// Enables global archival when present.
    pub archive_pattern: Option<String>,
}

/// One `[[areas]]` entry.
#[derive(Debug, Deserialize)]
pub struct AreaTable {
    pub name: String,
    /// Area-definition name resolved through the area registry.
    pub definition: String,
    pub output_dir: Option<PathBuf>,
    pub filename_pattern: Option<String>,
    /// Enables archival of the reprojected scene when present.
    pub archive_pattern: Option<String>,
    pub valid_satellites: Option<Vec<String>>,
    pub invalid_satellites: Option<Vec<String>>,
    #[serde(default)]
    pub products: Vec<ProductTable>,
}

/// One `[[areas.products]]` entry.
#[derive(Debug, Deserialize)]
pub struct ProductTable {
    pub name: String,
    /// Composite identifier resolved through the composite registry.
    pub composite: String,
    pub output_dir: Option<PathBuf>,
    pub filename_pattern: Option<String>,
    /// Highest acceptable sun zenith angle at the area midpoint, degrees.
    pub sunzen_day_maximum: Option<f64>,
    /// Lowest acceptable sun zenith angle at the area midpoint, degrees.
    pub sunzen_night_minimum: Option<f64>,
    pub valid_satellites: Option<Vec<String>>,
    pub invalid_satellites: Option<Vec<String>>,
}
