//! Production run outcomes.
//!
//! Every product and area reaches exactly one outcome per run. Reports are
//! plain data so the controller can aggregate them and callers can assert
//! on them without scraping logs.

use std::fmt;
use std::path::PathBuf;

use crate::scene::TimeSlot;

/// What happened to one configured product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductOutcome {
    /// The product was rendered and saved.
    Rendered { product: String, path: PathBuf },
    /// The satellite failed the product's allow or deny list.
    SkippedSatellite { product: String },
    /// The sun violated the product's zenith limits.
    SkippedSunZenith { product: String },
    /// The configured composite is not in the registry.
    CompositeNotFound { product: String, composite: String },
    /// Rendering or saving failed.
    Failed { product: String, reason: String },
}

impl ProductOutcome {
    /// The product this outcome belongs to.
    pub fn product(&self) -> &str {
        match self {
            ProductOutcome::Rendered { product, .. }
            | ProductOutcome::SkippedSatellite { product }
            | ProductOutcome::SkippedSunZenith { product }
            | ProductOutcome::CompositeNotFound { product, .. }
            | ProductOutcome::Failed { product, .. } => product,
        }
    }

    /// True when an artifact was written.
    pub fn is_rendered(&self) -> bool {
        matches!(self, ProductOutcome::Rendered { .. })
    }

    /// True when the product went wrong rather than being filtered out.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ProductOutcome::CompositeNotFound { .. } | ProductOutcome::Failed { .. }
        )
    }
}

/// What happened to one configured area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaReport {
    /// The satellite failed the area's allow or deny list.
    SkippedBySatellite { area: String },
    /// The area could not be prepared; none of its products ran.
    Failed { area: String, reason: String },
    /// The area ran; one outcome per configured product.
    Processed {
        area: String,
        outcomes: Vec<ProductOutcome>,
    },
}

impl AreaReport {
    /// The area this report belongs to.
    pub fn area(&self) -> &str {
        match self {
            AreaReport::SkippedBySatellite { area }
            | AreaReport::Failed { area, .. }
            | AreaReport::Processed { area, .. } => area,
        }
    }

    /// Artifacts written for this area.
    pub fn artifact_count(&self) -> usize {
        match self {
            AreaReport::Processed { outcomes, .. } => {
                outcomes.iter().filter(|o| o.is_rendered()).count()
            }
            _ => 0,
        }
    }

    /// Product failures in this area. A failed area counts as one failure.
    pub fn failure_count(&self) -> usize {
        match self {
            AreaReport::Failed { .. } => 1,
            AreaReport::Processed { outcomes, .. } => {
                outcomes.iter().filter(|o| o.is_failure()).count()
            }
            AreaReport::SkippedBySatellite { .. } => 0,
        }
    }
}

/// Complete account of one production run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub time_slot: TimeSlot,
    /// Satellite identity, name and number concatenated.
    pub satellite: String,
    pub areas: Vec<AreaReport>,
}

impl RunReport {
    /// Artifacts written across all areas.
    pub fn artifact_count(&self) -> usize {
        self.areas.iter().map(AreaReport::artifact_count).sum()
    }

    /// Failures across all areas.
    pub fn failure_count(&self) -> usize {
        self.areas.iter().map(AreaReport::failure_count).sum()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}: {} artifacts, {} failures across {} areas",
            self.satellite,
            self.time_slot,
            self.artifact_count(),
            self.failure_count(),
            self.areas.len()
        )
    }
}
