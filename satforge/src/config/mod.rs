//! Configuration loading and resolution.
//!
//! Two files drive a controller. The system configuration names the
//! listener subscription and points at the production configuration, which
//! in turn declares areas, products and their output naming. The raw TOML
//! schema lives in [`schema`]; [`model`] holds the resolved form with all
//! cascades applied.

mod error;
pub mod schema;

mod model;

pub use error::ConfigError;
pub use model::{AreaConfig, OutputNaming, ProductConfig, ProductSpec, SystemConfig};
