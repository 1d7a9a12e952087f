//! Production gating predicates.
//!
//! Areas and products can restrict which satellites they apply to, and
//! products can demand the sun above or below a configured zenith angle at
//! the area midpoint. Solar geometry is cached per area pass so several
//! products share one computation.

use tracing::{info, warn};

use crate::config::{AreaConfig, ProductSpec};
use crate::provider::{AreaDefinition, Astronomy};
use crate::scene::{Grid, TimeSlot};

// =============================================================================
// Satellite gating
// =============================================================================

/// Anything that carries satellite allow and deny lists.
pub trait SatelliteSelector {
    fn valid_satellites(&self) -> Option<&[String]>;
    fn invalid_satellites(&self) -> Option<&[String]>;
}

impl SatelliteSelector for AreaConfig {
    fn valid_satellites(&self) -> Option<&[String]> {
        self.valid_satellites.as_deref()
    }

    fn invalid_satellites(&self) -> Option<&[String]> {
        self.invalid_satellites.as_deref()
    }
}

impl SatelliteSelector for ProductSpec {
    fn valid_satellites(&self) -> Option<&[String]> {
        self.valid_satellites.as_deref()
    }

    fn invalid_satellites(&self) -> Option<&[String]> {
        self.invalid_satellites.as_deref()
    }
}

/// True when a satellite identity passes the selector's lists.
///
/// Lists name identities, satellite name and number concatenated. An allow
/// list, when present, is checked before the deny list. An empty allow
/// list therefore rejects every satellite.
pub fn check_satellite(selector: &dyn SatelliteSelector, identity: &str) -> bool {
    if let Some(valid) = selector.valid_satellites() {
        if !valid.iter().any(|name| name == identity) {
            return false;
        }
    }
    if let Some(invalid) = selector.invalid_satellites() {
        if invalid.iter().any(|name| name == identity) {
            return false;
        }
    }
    true
}

// =============================================================================
// Solar elevation gating
// =============================================================================

/// Cached solar geometry for one area pass.
///
/// Coordinates and the zenith grid are computed at most once and shared by
/// every product checked against the same area and time slot.
#[derive(Default)]
pub struct SolarCache {
    lonlats: Option<(Grid, Grid)>,
    zenith: Option<Grid>,
}

impl SolarCache {
    /// Sun zenith angle at the area midpoint, in degrees.
    pub fn zenith_midpoint(
        &mut self,
        area: &dyn AreaDefinition,
        time_slot: &TimeSlot,
        astronomy: &dyn Astronomy,
    ) -> Option<f64> {
        if self.lonlats.is_none() {
            match area.lonlats() {
                Ok(grids) => self.lonlats = Some(grids),
                Err(err) => {
                    warn!(area = area.name(), error = %err, "No coordinates for solar geometry");
                    return None;
                }
            }
        }
        if self.zenith.is_none() {
            if let Some((lons, lats)) = &self.lonlats {
                self.zenith = Some(astronomy.sun_zenith_angle(time_slot, lons, lats));
            }
        }
        self.zenith.as_ref().and_then(Grid::midpoint)
    }
}

/// True when the sun satisfies the product's zenith limits.
///
/// Day products reject once the sun sinks below `sunzen_day_maximum`,
/// night products reject while it is still above `sunzen_night_minimum`.
/// Products without limits always pass.
pub fn check_sun_zenith(
    product: &ProductSpec,
    area: &dyn AreaDefinition,
    cache: &mut SolarCache,
    time_slot: &TimeSlot,
    astronomy: &dyn Astronomy,
) -> bool {
    if !product.has_sunzen_limits() {
        return true;
    }

    let angle = match cache.zenith_midpoint(area, time_slot, astronomy) {
        Some(angle) => angle,
        None => {
            warn!(
                product = %product.name,
                "Cannot verify solar elevation, skipping product"
            );
            return false;
        }
    };

    if let Some(day_maximum) = product.sunzen_day_maximum {
        if angle > day_maximum {
            info!(
                product = %product.name,
                zenith = angle,
                limit = day_maximum,
                "Sun too low for day-time product, skipping"
            );
            return false;
        }
    }
    if let Some(night_minimum) = product.sunzen_night_minimum {
        if angle < night_minimum {
            info!(
                product = %product.name,
                zenith = angle,
                limit = night_minimum,
                "Sun too high for night-time product, skipping"
            );
            return false;
        }
    }
    true
}
