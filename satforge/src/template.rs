//! Output naming.
//!
//! Filename patterns mix time tokens (`%Y`, `%m`, `%d`, `%H`, `%M`) with
//! named tokens (`%(areaname)`, `%(composite)`, `%(satellite)`,
//! `%(orbit)`, `%(instrument)`, `%(ending)`). Substitution runs over the
//! filename pattern only; the directory is joined afterwards. Tokens the
//! context cannot fill stay literal, so an archive pattern written for a
//! product context degrades visibly instead of silently.

use std::path::PathBuf;

use crate::config::OutputNaming;
use crate::scene::{SatelliteId, TimeSlot};

/// File ending of rendered images.
pub const IMAGE_ENDING: &str = "png";

/// Everything a pattern can draw on.
#[derive(Debug, Clone, Copy)]
pub struct NameContext<'a> {
    pub time_slot: TimeSlot,
    pub satellite: &'a SatelliteId,
    pub area: Option<&'a str>,
    pub product: Option<&'a str>,
}

impl<'a> NameContext<'a> {
    /// Context for a global artifact.
    pub fn new(time_slot: TimeSlot, satellite: &'a SatelliteId) -> Self {
        Self {
            time_slot,
            satellite,
            area: None,
            product: None,
        }
    }

    /// Adds the area name.
    pub fn with_area(mut self, area: &'a str) -> Self {
        self.area = Some(area);
        self
    }

    /// Adds the product name.
    pub fn with_product(mut self, product: &'a str) -> Self {
        self.product = Some(product);
        self
    }
}

/// Expands a filename pattern against a context.
pub fn substitute(pattern: &str, ctx: &NameContext) -> String {
    let mut out = pattern.to_string();

    if let Some(area) = ctx.area {
        out = out.replace("%(areaname)", area);
    }
    if let Some(product) = ctx.product {
        out = out.replace("%(composite)", product);
    }
    out = out.replace("%(satellite)", &ctx.satellite.identity());
    out = out.replace("%(orbit)", ctx.satellite.orbit_str());
    out = out.replace("%(instrument)", &ctx.satellite.instrument);
    out = out.replace("%(ending)", IMAGE_ENDING);

    out = out.replace("%Y", &format!("{:04}", ctx.time_slot.year()));
    out = out.replace("%m", &format!("{:02}", ctx.time_slot.month()));
    out = out.replace("%d", &format!("{:02}", ctx.time_slot.day()));
    out = out.replace("%H", &format!("{:02}", ctx.time_slot.hour()));
    out = out.replace("%M", &format!("{:02}", ctx.time_slot.minute()));

    out
}

/// Full output path: the naming's directory joined with the expanded
/// filename.
pub fn output_path(naming: &OutputNaming, ctx: &NameContext) -> PathBuf {
    naming.directory.join(substitute(&naming.pattern, ctx))
}
