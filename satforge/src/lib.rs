//! Satforge - Event-driven satellite imagery production
//!
//! This library contains the production controller and its supporting
//! components: configuration loading, notification classification, channel
//! requirement resolution, filter predicates, output naming and the
//! rendering pass. Scene access, composites, area definitions and solar
//! geometry sit behind the collaborator traits in [`provider`], which also
//! ships a deterministic in-memory backend for the command line and tests.

pub mod config;
pub mod controller;
pub mod filters;
pub mod listener;
pub mod logging;
pub mod message;
pub mod provider;
pub mod render;
pub mod report;
pub mod resolver;
pub mod scene;
pub mod template;

pub use controller::{Controller, ControllerError, ControllerState, SessionStats};
pub use listener::{ChannelListener, ListenerHandle};
pub use message::{MessageKind, Notification, Payload};
pub use provider::Collaborators;
pub use report::{AreaReport, ProductOutcome, RunReport};

/// Library version from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
