//! Deterministic in-memory backend.
//!
//! Implements every collaborator seam without a scientific stack. Channel
//! state is tracked faithfully, projections carry the inventory onto the
//! target area, and rendered products and archives are written to disk as
//! small text artifacts so persistence can be asserted in tests and
//! exercised from the command line.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use super::registry::CompositeRegistry;
use super::traits::{
    AreaDefinition, AreaError, AreaRegistry, Astronomy, CompositeOp, RenderError, Renderable,
    Scene, SceneError, SceneSource,
};
use super::Collaborators;
use crate::scene::{ArchiveFormat, Channel, Extent, Grid, ResampleMode, SatelliteId, TimeSlot};

/// Default constant sun zenith angle of the synthetic sky, in degrees.
pub const DEFAULT_SUN_ZENITH: f64 = 45.0;

// =============================================================================
// Channels and composites
// =============================================================================

/// SEVIRI-like channel inventory in instrument order.
pub fn seviri_channels() -> Vec<Channel> {
    vec![
        Channel::new("VIS006", 0.56, 0.71),
        Channel::new("VIS008", 0.74, 0.88),
        Channel::new("IR_016", 1.50, 1.78),
        Channel::new("IR_039", 3.48, 4.36),
        Channel::new("WV_062", 5.35, 7.15),
        Channel::new("WV_073", 6.85, 7.85),
        Channel::new("IR_087", 8.30, 9.10),
        Channel::new("IR_097", 9.38, 9.94),
        Channel::new("IR_108", 9.80, 11.80),
        Channel::new("IR_120", 11.00, 13.00),
        Channel::new("IR_134", 12.40, 14.40),
        Channel::new("HRV", 0.50, 0.90),
    ]
}

/// Composite table of the synthetic backend.
pub fn standard_composites() -> CompositeRegistry {
    let mut registry = CompositeRegistry::new();
    registry.register(
        "overview",
        Arc::new(SimComposite::new("overview", vec![0.635, 0.85, 10.8])),
    );
    registry.register(
        "natural",
        Arc::new(SimComposite::new("natural", vec![1.63, 0.85, 0.635])),
    );
    registry.register(
        "airmass",
        Arc::new(SimComposite::new("airmass", vec![6.2, 7.3, 9.7])),
    );
    registry.register(
        "night_fog",
        Arc::new(SimComposite::new("night_fog", vec![12.0, 10.8, 8.7])),
    );
    registry
}

/// Synthetic composite recipe.
///
/// Rendering checks that the channel covering each prerequisite wavelength
/// is resident, mirroring how a real composite fails on missing data.
pub struct SimComposite {
    id: String,
    prerequisites: Vec<f64>,
    fail: bool,
}

impl SimComposite {
    /// Recipe with the given prerequisite wavelengths.
    pub fn new(id: impl Into<String>, prerequisites: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            prerequisites,
            fail: false,
        }
    }

    /// Recipe whose render step always fails.
    pub fn failing(id: impl Into<String>, prerequisites: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            prerequisites,
            fail: true,
        }
    }
}

impl CompositeOp for SimComposite {
    fn prerequisites(&self) -> &[f64] {
        &self.prerequisites
    }

    fn render(&self, scene: &dyn Scene) -> Result<Box<dyn Renderable>, RenderError> {
        if self.fail {
            return Err(RenderError::Composite(format!(
                "injected failure in '{}'",
                self.id
            )));
        }

        let channels = scene.channels();
        let mut used = Vec::new();
        for &wavelength in &self.prerequisites {
            if let Some(channel) = channels.iter().find(|c| c.wavelength.contains(wavelength)) {
                if !channel.loaded {
                    return Err(RenderError::ChannelNotLoaded(channel.name.clone()));
                }
                used.push(channel.name.clone());
            }
        }

        let identity = scene
            .identity()
            .map(|id| id.identity())
            .unwrap_or_else(|| "unknown".to_string());
        let content = format!(
            "composite {} from {} at {} using [{}]\n",
            self.id,
            identity,
            scene.time_slot(),
            used.join(", ")
        );
        Ok(Box::new(SimRenderable { content }))
    }
}

/// Rendered image of the synthetic backend, persisted as a text artifact.
pub struct SimRenderable {
    content: String,
}

impl Renderable for SimRenderable {
    fn save(&self, path: &Path) -> Result<(), RenderError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &self.content)?;
        Ok(())
    }
}

// =============================================================================
// Scenes
// =============================================================================

/// Scene factory of the synthetic backend.
pub struct SimSceneSource {
    channels: Vec<Channel>,
    failure: Option<String>,
}

impl SimSceneSource {
    /// Factory producing scenes with the given channel inventory.
    pub fn new(channels: Vec<Channel>) -> Self {
        Self {
            channels,
            failure: None,
        }
    }

    /// Factory that refuses every scene with the given reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            channels: Vec::new(),
            failure: Some(reason.into()),
        }
    }
}

impl SceneSource for SimSceneSource {
    fn create_scene(
        &self,
        satellite: &SatelliteId,
        time_slot: &TimeSlot,
    ) -> Result<Box<dyn Scene>, SceneError> {
        if let Some(reason) = &self.failure {
            return Err(SceneError::Unavailable {
                identity: satellite.identity(),
                time_slot: time_slot.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(Box::new(SimScene {
            identity: None,
            time_slot: *time_slot,
            channels: self.channels.clone(),
            area: None,
        }))
    }
}

struct SimScene {
    identity: Option<SatelliteId>,
    time_slot: TimeSlot,
    channels: Vec<Channel>,
    area: Option<String>,
}

impl Scene for SimScene {
    fn identity(&self) -> Option<&SatelliteId> {
        self.identity.as_ref()
    }

    fn time_slot(&self) -> TimeSlot {
        self.time_slot
    }

    fn channels(&self) -> Vec<Channel> {
        self.channels.clone()
    }

    fn load(&mut self, names: &[String], _extent: Option<Extent>) -> Result<(), SceneError> {
        for name in names {
            match self.channels.iter_mut().find(|c| &c.name == name) {
                Some(channel) => channel.loaded = true,
                None => return Err(SceneError::UnknownChannel(name.clone())),
            }
        }
        Ok(())
    }

    fn unload(&mut self, names: &[String]) -> Result<(), SceneError> {
        for name in names {
            match self.channels.iter_mut().find(|c| &c.name == name) {
                Some(channel) => channel.loaded = false,
                None => return Err(SceneError::UnknownChannel(name.clone())),
            }
        }
        Ok(())
    }

    fn project(
        &self,
        area: &dyn AreaDefinition,
        _mode: ResampleMode,
    ) -> Result<Box<dyn Scene>, SceneError> {
        // The projected handle keeps the full inventory: only resident
        // channels carry data, but more can be loaded afterwards.
        Ok(Box::new(SimScene {
            identity: self.identity.clone(),
            time_slot: self.time_slot,
            channels: self.channels.clone(),
            area: Some(area.name().to_string()),
        }))
    }

    fn save(&self, path: &Path, format: ArchiveFormat) -> Result<(), SceneError> {
        let loaded: Vec<&str> = self
            .channels
            .iter()
            .filter(|c| c.loaded)
            .map(|c| c.name.as_str())
            .collect();
        let identity = self
            .identity
            .as_ref()
            .map(|id| id.identity())
            .unwrap_or_else(|| "unknown".to_string());
        let area = self.area.as_deref().unwrap_or("fulldisc");
        let content = format!(
            "{} archive of {} over {} at {}: [{}]\n",
            format,
            identity,
            area,
            self.time_slot,
            loaded.join(", ")
        );
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    fn set_identity(&mut self, satellite: &SatelliteId) {
        self.identity = Some(satellite.clone());
    }
}

// =============================================================================
// Areas and astronomy
// =============================================================================

/// Synthetic area definition with generated coordinates.
pub struct SimArea {
    name: String,
    x_size: usize,
    y_size: usize,
    has_coords: bool,
}

impl SimArea {
    /// Definition with generated European-sector coordinates.
    pub fn new(name: impl Into<String>, x_size: usize, y_size: usize) -> Self {
        Self {
            name: name.into(),
            x_size,
            y_size,
            has_coords: true,
        }
    }

    /// Definition whose coordinate source is missing.
    pub fn without_coords(name: impl Into<String>, x_size: usize, y_size: usize) -> Self {
        Self {
            name: name.into(),
            x_size,
            y_size,
            has_coords: false,
        }
    }
}

impl AreaDefinition for SimArea {
    fn name(&self) -> &str {
        &self.name
    }

    fn x_size(&self) -> usize {
        self.x_size
    }

    fn y_size(&self) -> usize {
        self.y_size
    }

    fn lonlats(&self) -> Result<(Grid, Grid), AreaError> {
        if !self.has_coords {
            return Err(AreaError::NoCoordinates(self.name.clone()));
        }
        let width = self.x_size;
        let height = self.y_size;
        let lons = Grid::from_fn(width, height, move |x, _| {
            -30.0 + 60.0 * (x as f64 + 0.5) / width as f64
        });
        let lats = Grid::from_fn(width, height, move |_, y| {
            70.0 - 40.0 * (y as f64 + 0.5) / height as f64
        });
        Ok((lons, lats))
    }
}

/// Area-definition lookup of the synthetic backend.
pub struct SimAreaRegistry {
    areas: Mutex<HashMap<String, Arc<dyn AreaDefinition>>>,
    permissive: bool,
}

impl SimAreaRegistry {
    /// Registry that only resolves explicitly registered definitions.
    pub fn strict() -> Self {
        Self {
            areas: Mutex::new(HashMap::new()),
            permissive: false,
        }
    }

    /// Registry that synthesises a definition for any name.
    pub fn permissive() -> Self {
        Self {
            areas: Mutex::new(HashMap::new()),
            permissive: true,
        }
    }

    /// Registers a definition under its own name.
    pub fn insert(&self, area: Arc<dyn AreaDefinition>) {
        self.areas.lock().insert(area.name().to_string(), area);
    }
}

impl AreaRegistry for SimAreaRegistry {
    fn get(&self, name: &str) -> Option<Arc<dyn AreaDefinition>> {
        let mut areas = self.areas.lock();
        if let Some(area) = areas.get(name) {
            return Some(area.clone());
        }
        if self.permissive {
            let area: Arc<dyn AreaDefinition> = Arc::new(SimArea::new(name, 64, 64));
            areas.insert(name.to_string(), area.clone());
            return Some(area);
        }
        None
    }
}

/// Solar geometry with a constant zenith angle over the whole grid.
pub struct FixedAstronomy {
    zenith_degrees: f64,
}

impl FixedAstronomy {
    /// Sky with the sun at the given zenith angle everywhere.
    pub fn new(zenith_degrees: f64) -> Self {
        Self { zenith_degrees }
    }
}

impl Astronomy for FixedAstronomy {
    fn sun_zenith_angle(&self, _time_slot: &TimeSlot, lons: &Grid, _lats: &Grid) -> Grid {
        Grid::filled(lons.width(), lons.height(), self.zenith_degrees)
    }
}

// =============================================================================
// Bundle builder
// =============================================================================

/// Builder for a complete synthetic collaborator set.
pub struct SimBackend {
    sun_zenith: f64,
    permissive_areas: bool,
}

impl SimBackend {
    /// Backend with the SEVIRI-like inventory, the standard composites and
    /// permissive area lookup.
    pub fn new() -> Self {
        Self {
            sun_zenith: DEFAULT_SUN_ZENITH,
            permissive_areas: true,
        }
    }

    /// Sets the constant sun zenith angle in degrees.
    pub fn with_sun_zenith(mut self, degrees: f64) -> Self {
        self.sun_zenith = degrees;
        self
    }

    /// Restricts area lookup to explicitly registered definitions.
    pub fn with_strict_areas(mut self) -> Self {
        self.permissive_areas = false;
        self
    }

    /// Assembles the collaborator set.
    pub fn build(self) -> Collaborators {
        let areas: Arc<dyn AreaRegistry> = if self.permissive_areas {
            Arc::new(SimAreaRegistry::permissive())
        } else {
            Arc::new(SimAreaRegistry::strict())
        };
        Collaborators {
            scenes: Arc::new(SimSceneSource::new(seviri_channels())),
            composites: standard_composites(),
            areas,
            astronomy: Arc::new(FixedAstronomy::new(self.sun_zenith)),
        }
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
