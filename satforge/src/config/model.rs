//! Resolved runtime configuration.
//!
//! Loading collapses the file-level cascades once, so the render path never
//! consults fallback chains. Every product carries its effective output
//! naming and every area carries its effective archive naming, if any.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::error::ConfigError;
use crate::config::schema::{ProductConfigFile, SystemConfigFile};
use crate::provider::CompositeRegistry;

/// Where an artifact goes: a directory and a filename pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    pub directory: PathBuf,
    pub pattern: String,
}

/// One product with all cascades applied.
#[derive(Debug, Clone)]
pub struct ProductSpec {
    pub name: String,
    pub composite: String,
    pub output: OutputNaming,
    pub sunzen_day_maximum: Option<f64>,
    pub sunzen_night_minimum: Option<f64>,
    pub valid_satellites: Option<Vec<String>>,
    pub invalid_satellites: Option<Vec<String>>,
}

impl ProductSpec {
    /// True when either solar elevation limit is configured.
    pub fn has_sunzen_limits(&self) -> bool {
        self.sunzen_day_maximum.is_some() || self.sunzen_night_minimum.is_some()
    }
}

/// One target area with all cascades applied.
#[derive(Debug, Clone)]
pub struct AreaConfig {
    pub name: String,
    pub definition: String,
    /// Archival of the reprojected scene, when configured for this area.
    pub archive: Option<OutputNaming>,
    pub valid_satellites: Option<Vec<String>>,
    pub invalid_satellites: Option<Vec<String>>,
    pub products: Vec<ProductSpec>,
}

/// Resolved production configuration.
#[derive(Debug, Clone)]
pub struct ProductConfig {
    /// Archival of the unprojected scene, when configured.
    pub global_archive: Option<OutputNaming>,
    pub areas: Vec<AreaConfig>,
}

impl ProductConfig {
    /// Loads and resolves a production configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ProductConfigFile =
            toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::resolve(file))
    }

    fn resolve(file: ProductConfigFile) -> Self {
        let common = file.common;

        let global_archive = common.archive_pattern.as_ref().map(|pattern| OutputNaming {
            directory: common.output_dir.clone(),
            pattern: pattern.clone(),
        });

        let areas = file
            .areas
            .into_iter()
            .map(|area| {
                let area_dir = area
                    .output_dir
                    .clone()
                    .unwrap_or_else(|| common.output_dir.clone());
                let area_pattern = area
                    .filename_pattern
                    .clone()
                    .unwrap_or_else(|| common.filename_pattern.clone());

                let archive = area.archive_pattern.as_ref().map(|pattern| OutputNaming {
                    directory: area_dir.clone(),
                    pattern: pattern.clone(),
                });

                let products = area
                    .products
                    .into_iter()
                    .map(|product| {
                        let output = OutputNaming {
                            directory: product.output_dir.unwrap_or_else(|| area_dir.clone()),
                            pattern: product
                                .filename_pattern
                                .unwrap_or_else(|| area_pattern.clone()),
                        };
                        ProductSpec {
                            name: product.name,
                            composite: product.composite,
                            output,
                            sunzen_day_maximum: product.sunzen_day_maximum,
                            sunzen_night_minimum: product.sunzen_night_minimum,
                            valid_satellites: product.valid_satellites,
                            invalid_satellites: product.invalid_satellites,
                        }
                    })
                    .collect();

                AreaConfig {
                    name: area.name,
                    definition: area.definition,
                    archive,
                    valid_satellites: area.valid_satellites,
                    invalid_satellites: area.invalid_satellites,
                    products,
                }
            })
            .collect();

        Self {
            global_archive,
            areas,
        }
    }

    /// Composite identifiers referenced by products but absent from the
    /// registry, in first-reference order.
    pub fn unknown_composites(&self, registry: &CompositeRegistry) -> Vec<String> {
        let mut unknown: Vec<String> = Vec::new();
        for area in &self.areas {
            for product in &area.products {
                if !registry.contains(&product.composite)
                    && !unknown.iter().any(|c| c == &product.composite)
                {
                    unknown.push(product.composite.clone());
                }
            }
        }
        unknown
    }

    /// Total number of configured products across all areas.
    pub fn product_count(&self) -> usize {
        self.areas.iter().map(|area| area.products.len()).sum()
    }
}

/// Resolved system configuration.
#[derive(Debug, Clone)]
pub struct SystemConfig {
    pub listener_tags: Vec<String>,
    pub product_config_path: PathBuf,
}

impl SystemConfig {
    /// Loads a system configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: SystemConfigFile =
            toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            listener_tags: file.listener_tags,
            product_config_path: file.product_config_path,
        })
    }
}
