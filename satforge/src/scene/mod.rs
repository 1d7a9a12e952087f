//! Domain value types for satellite scenes.
//!
//! These are the plain data types the production pipeline is written in
//! terms of: acquisition times, platform identities, spectral channels
//! and the small grid/extent values crossing the collaborator seams.
//! Scene handles themselves live behind the traits in [`crate::provider`].

mod channel;
mod fields;
mod grid;
mod satellite;
mod time_slot;

use std::fmt;

pub use channel::{Channel, WavelengthRange};
pub use fields::FieldError;
pub use grid::{Extent, Grid};
pub use satellite::SatelliteId;
pub use time_slot::TimeSlot;

/// Resampling strategy for reprojection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResampleMode {
    /// Nearest-neighbour resampling, the production default.
    #[default]
    Nearest,
    /// Bilinear resampling.
    Bilinear,
}

/// On-disk format for archived full-resolution scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// NetCDF version 4.
    NetCdf4,
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::NetCdf4 => write!(f, "netcdf4"),
        }
    }
}
