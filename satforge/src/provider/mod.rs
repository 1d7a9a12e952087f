//! Collaborator seams for scenes, composites, areas and solar geometry.
//!
//! The controller drives production through these traits rather than a
//! concrete scientific stack. [`sim`] ships a deterministic in-memory
//! implementation used by the command line and the test suite.

mod registry;
pub mod sim;
mod traits;

pub use registry::CompositeRegistry;
pub use traits::{
    AreaDefinition, AreaError, AreaRegistry, Astronomy, CompositeOp, RenderError, Renderable,
    Scene, SceneError, SceneSource,
};

use std::sync::Arc;

/// Bundle of collaborators a controller works against.
#[derive(Clone)]
pub struct Collaborators {
    /// Factory for global scenes.
    pub scenes: Arc<dyn SceneSource>,
    /// Composite lookup by identifier.
    pub composites: CompositeRegistry,
    /// Area-definition lookup by name.
    pub areas: Arc<dyn AreaRegistry>,
    /// Solar geometry provider.
    pub astronomy: Arc<dyn Astronomy>,
}
