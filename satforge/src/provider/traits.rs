//! Capability traits for the scientific collaborators.
//!
//! The production controller decides what to compute; the science itself
//! lives behind these seams. All traits are object-safe and thread-safe so
//! implementations can be swapped without touching the pipeline.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::scene::{
    ArchiveFormat, Channel, Extent, Grid, ResampleMode, SatelliteId, TimeSlot,
};

// =============================================================================
// Errors
// =============================================================================

/// Errors raised by scene factories and scene handles.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The backing data for the requested platform and time slot could not
    /// be opened.
    #[error("cannot open scene for {identity} at {time_slot}: {reason}")]
    Unavailable {
        /// Platform identity.
        identity: String,
        /// Acquisition time.
        time_slot: String,
        /// Backend reason.
        reason: String,
    },

    /// A named channel does not exist in the scene's inventory.
    #[error("unknown channel '{0}'")]
    UnknownChannel(String),

    /// Reading channel data failed.
    #[error("channel load failed: {0}")]
    Load(String),

    /// Reprojection onto the target area failed.
    #[error("projection onto '{area}' failed: {reason}")]
    Projection {
        /// Target area name.
        area: String,
        /// Backend reason.
        reason: String,
    },

    /// Persisting the scene failed.
    #[error("scene save failed: {0}")]
    Save(#[from] std::io::Error),
}

/// Errors raised while synthesising or writing a composite image.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A channel the composite reads is not resident in the scene.
    #[error("channel '{0}' is not loaded")]
    ChannelNotLoaded(String),

    /// The composite algorithm failed.
    #[error("composite failed: {0}")]
    Composite(String),

    /// Writing the rendered image failed.
    #[error("image save failed: {0}")]
    Save(#[from] std::io::Error),
}

/// Errors raised by coordinate lookups on an area definition.
#[derive(Debug, Error)]
pub enum AreaError {
    /// The definition carries no coordinate source.
    #[error("area '{0}' has no coordinate source")]
    NoCoordinates(String),
}

// =============================================================================
// Scene seams
// =============================================================================

/// Factory for scene handles. One per scientific backend.
pub trait SceneSource: Send + Sync {
    /// Opens a scene for the given platform and acquisition time.
    ///
    /// The returned handle carries no identity of its own; the caller
    /// attaches it via [`Scene::set_identity`].
    fn create_scene(
        &self,
        satellite: &SatelliteId,
        time_slot: &TimeSlot,
    ) -> Result<Box<dyn Scene>, SceneError>;
}

/// A handle onto one satellite scene, full-resolution or area-projected.
///
/// Implementations own channel state: loading and unloading mutate the
/// handle in place, and projection produces a new handle for the target
/// area. Handles are dropped when the run that created them finishes.
pub trait Scene: Send {
    /// Platform identity attached to this handle, if any.
    fn identity(&self) -> Option<&SatelliteId>;

    /// Acquisition time of the scene.
    fn time_slot(&self) -> TimeSlot;

    /// Channel inventory in instrument order, with loaded flags.
    fn channels(&self) -> Vec<Channel>;

    /// Reads the named channels into memory. An extent restricts reading
    /// to a sub-region when the backend supports it.
    fn load(&mut self, names: &[String], extent: Option<Extent>) -> Result<(), SceneError>;

    /// Releases the named channels.
    fn unload(&mut self, names: &[String]) -> Result<(), SceneError>;

    /// Reprojects the scene onto the target area.
    fn project(
        &self,
        area: &dyn AreaDefinition,
        mode: ResampleMode,
    ) -> Result<Box<dyn Scene>, SceneError>;

    /// Persists the scene to disk in the given archive format.
    fn save(&self, path: &Path, format: ArchiveFormat) -> Result<(), SceneError>;

    /// Attaches platform identity to the handle.
    fn set_identity(&mut self, satellite: &SatelliteId);
}

// =============================================================================
// Composite seams
// =============================================================================

/// One composite recipe: the channel prerequisites it reads and the
/// rendering step that turns a projected scene into an image.
pub trait CompositeOp: Send + Sync {
    /// Reference wavelengths in micrometres of the channels this
    /// composite reads.
    fn prerequisites(&self) -> &[f64];

    /// Renders the composite from a projected scene.
    fn render(&self, scene: &dyn Scene) -> Result<Box<dyn Renderable>, RenderError>;
}

/// A rendered image ready for serialisation.
pub trait Renderable: Send {
    /// Writes the image to the given path.
    fn save(&self, path: &Path) -> Result<(), RenderError>;
}

// =============================================================================
// Geography and astronomy seams
// =============================================================================

/// Resolves area-definition names to definitions.
pub trait AreaRegistry: Send + Sync {
    /// Looks up a definition by name. `None` when the name is unknown.
    fn get(&self, name: &str) -> Option<Arc<dyn AreaDefinition>>;
}

/// One target grid: a named projection with pixel dimensions and a
/// geographic coordinate source.
pub trait AreaDefinition: Send + Sync {
    /// Definition name.
    fn name(&self) -> &str;

    /// Grid width in pixels.
    fn x_size(&self) -> usize;

    /// Grid height in pixels.
    fn y_size(&self) -> usize;

    /// Longitude and latitude grids covering every pixel.
    fn lonlats(&self) -> Result<(Grid, Grid), AreaError>;
}

/// Solar geometry collaborator.
pub trait Astronomy: Send + Sync {
    /// Sun zenith angles in degrees for the given time over the given
    /// coordinate grids.
    fn sun_zenith_angle(&self, time_slot: &TimeSlot, lons: &Grid, lats: &Grid) -> Grid;
}
