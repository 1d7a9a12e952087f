//! Production controller.
//!
//! The [`Controller`] is the long-running service at the top of the crate:
//! it receives notifications from the listener, reloads configuration on
//! demand and drives one full scene-processing run per file arrival.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Controller                            │
//! │                                                              │
//! │  Notification ──► classify subject                           │
//! │                      │                                       │
//! │        ┌─────────────┼──────────────┬────────────┐           │
//! │        ▼             ▼              ▼            ▼           │
//! │      Stop      reload configs   file arrival   ignore        │
//! │                                     │                        │
//! │                                     ▼                        │
//! │                          create scene ──► global archive     │
//! │                                     │                        │
//! │                 per area: filter ──► resolve channels        │
//! │                          ──► project ──► archive ──► render  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Notifications are handled strictly one at a time, so a run is never
//! interleaved with a reload and a stop request arriving mid-run takes
//! effect once the run finishes.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{AreaConfig, ConfigError, ProductConfig, SystemConfig};
use crate::filters::check_satellite;
use crate::listener::{ListenerControl, ListenerError, ListenerHandle};
use crate::message::{MessageKind, Notification};
use crate::provider::{Collaborators, Scene, SceneError};
use crate::render::{archive_scene, render_area};
use crate::report::{AreaReport, RunReport};
use crate::resolver;
use crate::scene::{FieldError, ResampleMode, SatelliteId, TimeSlot};
use crate::template::NameContext;

// =============================================================================
// States and results
// =============================================================================

/// Lifecycle phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Blocked on the notification queue.
    AwaitingMessage,
    /// Applying a configuration reload.
    ReloadingConfig,
    /// Driving one scene-processing run.
    ProcessingRun,
    /// Terminal; the loop exits.
    ShuttingDown,
}

impl ControllerState {
    /// True for the terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ControllerState::ShuttingDown)
    }
}

/// Counters accumulated over the controller's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Completed scene-processing runs.
    pub runs: usize,
    /// Runs aborted before a scene was created.
    pub aborted_runs: usize,
    /// Artifacts written across all runs.
    pub artifacts: usize,
    /// Contained area and product failures across all runs.
    pub failures: usize,
    /// Configuration reloads applied.
    pub config_reloads: usize,
    /// Notifications with unrecognized subjects.
    pub ignored_messages: usize,
}

/// Errors that prevent a controller from starting.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Errors that abort a single scene-processing run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The payload was not a metadata field mapping.
    #[error("file arrival payload is not a field mapping")]
    PayloadNotFields,

    /// A required metadata field is missing or unusable.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] FieldError),

    /// The scene factory refused to produce a scene.
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Whether the message loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Scene handles and identity for one run.
///
/// Dropping the context releases the global handle; local handles live
/// only inside their area pass. Nothing here survives the run.
struct RunContext {
    scene: Box<dyn Scene>,
    time_slot: TimeSlot,
    satellite: SatelliteId,
    identity: String,
}

// =============================================================================
// Controller
// =============================================================================

/// Event-driven satellite imagery production controller.
pub struct Controller {
    system: SystemConfig,
    products: ProductConfig,
    collaborators: Collaborators,
    control: Arc<dyn ListenerControl>,
    receiver: mpsc::Receiver<Notification>,
    state: ControllerState,
    stats: SessionStats,
}

impl Controller {
    /// Builds a controller from a system configuration file.
    ///
    /// Loads both configuration layers, subscribes the listener to the
    /// configured tags and verifies the product composites against the
    /// registry. Unknown composites are reported here and again at render
    /// time, but do not prevent startup.
    pub fn new(
        config_path: &Path,
        collaborators: Collaborators,
        listener: ListenerHandle,
    ) -> Result<Self, ControllerError> {
        let system = SystemConfig::from_file(config_path)?;
        listener.control.restart(&system.listener_tags)?;

        let products = ProductConfig::from_file(&system.product_config_path)?;
        warn_unknown_composites(&products, &collaborators);
        info!(
            tags = ?system.listener_tags,
            areas = products.areas.len(),
            products = products.product_count(),
            "Production controller initialized"
        );

        Ok(Self {
            system,
            products,
            collaborators,
            control: listener.control,
            receiver: listener.receiver,
            state: ControllerState::AwaitingMessage,
            stats: SessionStats::default(),
        })
    }

    /// Current lifecycle phase.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Runs the controller until a stop notification, queue closure or
    /// shutdown signal.
    pub async fn run(mut self, shutdown: CancellationToken) -> SessionStats {
        info!("Production controller starting");

        loop {
            self.set_state(ControllerState::AwaitingMessage);

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, stopping controller");
                    self.enter_shutdown();
                    break;
                }

                maybe = self.receiver.recv() => {
                    match maybe {
                        Some(notification) => {
                            if self.handle_notification(notification) == Flow::Stop {
                                break;
                            }
                        }
                        None => {
                            info!("Notification queue closed, stopping controller");
                            self.enter_shutdown();
                            break;
                        }
                    }
                }
            }
        }

        info!("Production controller stopped");
        self.stats
    }

    fn set_state(&mut self, next: ControllerState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "Controller state change");
            self.state = next;
        }
    }

    /// Scene handles never outlive a run, so only the listener needs
    /// releasing.
    fn enter_shutdown(&mut self) {
        self.set_state(ControllerState::ShuttingDown);
        self.control.stop();
    }

    fn handle_notification(&mut self, notification: Notification) -> Flow {
        let kind = MessageKind::classify(&notification.subject);
        debug!(subject = %notification.subject, kind = ?kind, "Received notification");

        match kind {
            MessageKind::Stop => {
                info!("Stop requested");
                self.enter_shutdown();
                Flow::Stop
            }
            MessageKind::ReloadSystemConfig => {
                self.set_state(ControllerState::ReloadingConfig);
                self.reload_system_config(&notification);
                Flow::Continue
            }
            MessageKind::ReloadProductConfig => {
                self.set_state(ControllerState::ReloadingConfig);
                self.reload_product_config(&notification);
                Flow::Continue
            }
            MessageKind::FileArrived => {
                self.set_state(ControllerState::ProcessingRun);
                self.process_file_arrival(&notification);
                Flow::Continue
            }
            MessageKind::Other => {
                debug!(subject = %notification.subject, "Ignoring notification");
                self.stats.ignored_messages += 1;
                Flow::Continue
            }
        }
    }

    // =========================================================================
    // Configuration reloads
    // =========================================================================

    fn reload_system_config(&mut self, notification: &Notification) {
        let path = match notification.payload.as_path() {
            Some(path) => path.to_path_buf(),
            None => {
                warn!("System config reload without a file path, keeping previous configuration");
                return;
            }
        };

        let system = match SystemConfig::from_file(&path) {
            Ok(system) => system,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to reload system config, keeping previous configuration"
                );
                return;
            }
        };

        if let Err(err) = self.control.restart(&system.listener_tags) {
            error!(error = %err, "Failed to restart listener with new tags");
        }
        info!(tags = ?system.listener_tags, "System configuration reloaded");

        let product_path = system.product_config_path.clone();
        self.system = system;
        self.stats.config_reloads += 1;
        self.load_products(&product_path);
    }

    fn reload_product_config(&mut self, notification: &Notification) {
        let path = match notification.payload.as_path() {
            Some(path) => path.to_path_buf(),
            None => {
                warn!("Product config reload without a file path, keeping previous configuration");
                return;
            }
        };

        if self.load_products(&path) {
            // Later system reloads cascade from the new location.
            self.system.product_config_path = path;
            self.stats.config_reloads += 1;
        }
    }

    fn load_products(&mut self, path: &Path) -> bool {
        match ProductConfig::from_file(path) {
            Ok(products) => {
                warn_unknown_composites(&products, &self.collaborators);
                info!(
                    path = %path.display(),
                    areas = products.areas.len(),
                    products = products.product_count(),
                    "Production configuration loaded"
                );
                self.products = products;
                true
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to load production config, keeping previous configuration"
                );
                false
            }
        }
    }

    // =========================================================================
    // Scene-processing runs
    // =========================================================================

    fn process_file_arrival(&mut self, notification: &Notification) {
        let started = Instant::now();
        match self.execute_run(notification) {
            Ok(report) => {
                self.stats.runs += 1;
                self.stats.artifacts += report.artifact_count();
                self.stats.failures += report.failure_count();
                info!(
                    satellite = %report.satellite,
                    time_slot = %report.time_slot,
                    artifacts = report.artifact_count(),
                    failures = report.failure_count(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Scene run finished"
                );
            }
            Err(err) => {
                self.stats.aborted_runs += 1;
                error!(error = %err, "Scene run aborted");
            }
        }
    }

    fn execute_run(&self, notification: &Notification) -> Result<RunReport, RunError> {
        let fields = notification
            .payload
            .as_fields()
            .ok_or(RunError::PayloadNotFields)?;
        let time_slot = TimeSlot::from_fields(fields)?;
        let satellite = SatelliteId::from_fields(fields)?;
        let identity = satellite.identity();
        info!(satellite = %identity, time_slot = %time_slot, "Starting scene run");

        let mut scene = self
            .collaborators
            .scenes
            .create_scene(&satellite, &time_slot)?;
        scene.set_identity(&satellite);

        let mut ctx = RunContext {
            scene,
            time_slot,
            satellite,
            identity,
        };

        if let Some(naming) = &self.products.global_archive {
            let name_ctx = NameContext::new(ctx.time_slot, &ctx.satellite);
            if let Err(err) = archive_scene(ctx.scene.as_mut(), naming, &name_ctx, false) {
                warn!(error = %err, "Failed to archive global scene");
            }
        }

        let mut areas = Vec::with_capacity(self.products.areas.len());
        for area in &self.products.areas {
            areas.push(self.process_area(&mut ctx, area));
        }

        // Both handles are gone once ctx drops here.
        Ok(RunReport {
            time_slot: ctx.time_slot,
            satellite: ctx.identity,
            areas,
        })
    }

    fn process_area(&self, ctx: &mut RunContext, area: &AreaConfig) -> AreaReport {
        let started = Instant::now();

        if !check_satellite(area, &ctx.identity) {
            info!(
                area = %area.name,
                satellite = %ctx.identity,
                "Satellite filtered out, skipping area"
            );
            return AreaReport::SkippedBySatellite {
                area: area.name.clone(),
            };
        }

        // Channel residency is planned over the area's whole product list;
        // per-product filters come later and do not shrink the plan.
        let mut wavelengths = Vec::new();
        for product in &area.products {
            if let Some(op) = self.collaborators.composites.get(&product.composite) {
                wavelengths.extend_from_slice(op.prerequisites());
            }
        }
        let plan = resolver::resolve(&ctx.scene.channels(), &wavelengths);
        debug!(
            area = %area.name,
            required = ?plan.required,
            to_load = ?plan.to_load,
            to_unload = ?plan.to_unload,
            "Resolved channel requirements"
        );

        if !plan.to_unload.is_empty() {
            if let Err(err) = ctx.scene.unload(&plan.to_unload) {
                error!(area = %area.name, error = %err, "Failed to unload channels");
                return AreaReport::Failed {
                    area: area.name.clone(),
                    reason: err.to_string(),
                };
            }
        }
        if !plan.to_load.is_empty() {
            if let Err(err) = ctx.scene.load(&plan.to_load, None) {
                error!(area = %area.name, error = %err, "Failed to load channels");
                return AreaReport::Failed {
                    area: area.name.clone(),
                    reason: err.to_string(),
                };
            }
        }

        let area_def = match self.collaborators.areas.get(&area.definition) {
            Some(def) => def,
            None => {
                error!(
                    area = %area.name,
                    definition = %area.definition,
                    "Unknown area definition"
                );
                return AreaReport::Failed {
                    area: area.name.clone(),
                    reason: format!("unknown area definition '{}'", area.definition),
                };
            }
        };

        let mut local = match ctx.scene.project(area_def.as_ref(), ResampleMode::Nearest) {
            Ok(local) => local,
            Err(err) => {
                error!(area = %area.name, error = %err, "Failed to reproject scene");
                return AreaReport::Failed {
                    area: area.name.clone(),
                    reason: err.to_string(),
                };
            }
        };

        if let Some(naming) = &area.archive {
            let name_ctx = NameContext::new(ctx.time_slot, &ctx.satellite).with_area(&area.name);
            if let Err(err) = archive_scene(local.as_mut(), naming, &name_ctx, false) {
                warn!(area = %area.name, error = %err, "Failed to archive reprojected scene");
            }
        }

        let outcomes = render_area(
            local.as_ref(),
            area_def.as_ref(),
            area,
            &self.collaborators.composites,
            self.collaborators.astronomy.as_ref(),
            ctx.time_slot,
            &ctx.satellite,
        );

        debug!(
            area = %area.name,
            products = outcomes.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Area processed"
        );
        AreaReport::Processed {
            area: area.name.clone(),
            outcomes,
        }
    }
}

fn warn_unknown_composites(products: &ProductConfig, collaborators: &Collaborators) {
    let unknown = products.unknown_composites(&collaborators.composites);
    if !unknown.is_empty() {
        warn!(composites = ?unknown, "Configured composites missing from registry");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::ChannelListener;
    use crate::message::Payload;
    use crate::provider::sim::SimBackend;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        listener: Arc<ChannelListener>,
        controller: Controller,
    }

    fn products_toml(dir: &TempDir) -> String {
        format!(
            r#"
[common]
output_dir = {:?}
filename_pattern = "%(areaname)_%Y%m%d_%H%M_%(composite).%(ending)"

[[areas]]
name = "Europe"
definition = "euro4"

[[areas.products]]
name = "overview"
composite = "overview"
"#,
            dir.path().join("out")
        )
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let products_path = dir.path().join("products.toml");
        fs::write(&products_path, products_toml(&dir)).unwrap();
        let system_path = dir.path().join("system.toml");
        fs::write(
            &system_path,
            format!(
                "listener_tags = [\"/juhu\"]\nproduct_config_path = {:?}\n",
                products_path
            ),
        )
        .unwrap();

        let (listener, _sender, handle) = ChannelListener::new();
        let controller =
            Controller::new(&system_path, SimBackend::new().build(), handle).unwrap();
        Fixture {
            dir,
            listener,
            controller,
        }
    }

    fn file_arrival(fields: &[(&str, &str)]) -> Notification {
        let map: HashMap<String, String> = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Notification {
            subject: "/oper/NewFileArrived".to_string(),
            payload: Payload::Fields(map),
        }
    }

    fn full_arrival() -> Notification {
        file_arrival(&[
            ("year", "2014"),
            ("month", "3"),
            ("day", "21"),
            ("hour", "10"),
            ("minute", "15"),
            ("satellite", "meteosat"),
            ("satnumber", "9"),
            ("instrument", "seviri"),
            ("orbit", ""),
        ])
    }

    #[test]
    fn test_startup_subscribes_listener() {
        let f = fixture();
        assert_eq!(f.listener.active_tags(), vec!["/juhu"]);
        assert_eq!(f.controller.state(), ControllerState::AwaitingMessage);
    }

    #[test]
    fn test_startup_fails_without_config() {
        let (_listener, _sender, handle) = ChannelListener::new();
        let err = Controller::new(
            Path::new("/no/such/system.toml"),
            SimBackend::new().build(),
            handle,
        )
        .err()
        .unwrap();
        assert!(matches!(err, ControllerError::Config(_)));
    }

    #[test]
    fn test_stop_is_terminal_and_releases_listener() {
        let mut f = fixture();
        let flow = f.controller.handle_notification(Notification {
            subject: "/admin/StopTrollduction".to_string(),
            payload: Payload::Path(PathBuf::from("unused")),
        });
        assert_eq!(flow, Flow::Stop);
        assert!(f.controller.state().is_terminal());
        assert!(f.listener.is_stopped());
    }

    #[test]
    fn test_unknown_subject_ignored() {
        let mut f = fixture();
        let flow = f.controller.handle_notification(Notification {
            subject: "Heartbeat".to_string(),
            payload: Payload::Path(PathBuf::from("unused")),
        });
        assert_eq!(flow, Flow::Continue);
        assert_eq!(f.controller.stats.ignored_messages, 1);
        assert_eq!(f.controller.state(), ControllerState::AwaitingMessage);
    }

    #[test]
    fn test_run_renders_product() {
        let mut f = fixture();
        f.controller.handle_notification(full_arrival());

        assert_eq!(f.controller.stats.runs, 1);
        assert_eq!(f.controller.stats.artifacts, 1);
        assert_eq!(f.controller.stats.failures, 0);
        assert!(f
            .dir
            .path()
            .join("out")
            .join("Europe_20140321_1015_overview.png")
            .exists());
    }

    #[test]
    fn test_malformed_payload_aborts_run_only() {
        let mut f = fixture();
        f.controller
            .handle_notification(file_arrival(&[("satellite", "meteosat")]));
        assert_eq!(f.controller.stats.aborted_runs, 1);
        assert_eq!(f.controller.stats.runs, 0);

        // The controller keeps going; the next good arrival runs.
        f.controller.handle_notification(full_arrival());
        assert_eq!(f.controller.stats.runs, 1);
    }

    #[test]
    fn test_product_reload_failure_keeps_previous() {
        let mut f = fixture();
        let before = f.controller.system.product_config_path.clone();

        f.controller.handle_notification(Notification {
            subject: "/oper/NewProductConfig".to_string(),
            payload: Payload::Path(f.dir.path().join("missing.toml")),
        });

        assert_eq!(f.controller.stats.config_reloads, 0);
        assert_eq!(f.controller.system.product_config_path, before);
        assert_eq!(f.controller.products.areas.len(), 1);
    }

    #[test]
    fn test_product_reload_missing_key_keeps_previous() {
        let mut f = fixture();
        let before = f.controller.system.product_config_path.clone();

        // Syntactically valid TOML, but [common] lacks filename_pattern.
        let broken = f.dir.path().join("broken.toml");
        fs::write(
            &broken,
            format!("[common]\noutput_dir = {:?}\n", f.dir.path().join("out")),
        )
        .unwrap();

        f.controller.handle_notification(Notification {
            subject: "/oper/NewProductConfig".to_string(),
            payload: Payload::Path(broken),
        });

        assert_eq!(f.controller.stats.config_reloads, 0);
        assert_eq!(f.controller.system.product_config_path, before);

        // The previous configuration still drives production.
        f.controller.handle_notification(full_arrival());
        assert_eq!(f.controller.stats.runs, 1);
        assert!(f
            .dir
            .path()
            .join("out")
            .join("Europe_20140321_1015_overview.png")
            .exists());
    }

    #[test]
    fn test_product_reload_moves_cascade_pointer() {
        let mut f = fixture();
        let new_path = f.dir.path().join("other.toml");
        fs::write(
            &new_path,
            format!(
                "[common]\noutput_dir = {:?}\nfilename_pattern = \"x.%(ending)\"\n",
                f.dir.path().join("out")
            ),
        )
        .unwrap();

        f.controller.handle_notification(Notification {
            subject: "/oper/NewProductConfig".to_string(),
            payload: Payload::Path(new_path.clone()),
        });

        assert_eq!(f.controller.stats.config_reloads, 1);
        assert_eq!(f.controller.system.product_config_path, new_path);
        assert!(f.controller.products.areas.is_empty());
    }

    #[test]
    fn test_system_reload_restarts_listener_and_cascades() {
        let mut f = fixture();

        let new_products = f.dir.path().join("products2.toml");
        fs::write(
            &new_products,
            format!(
                r#"
[common]
output_dir = {:?}
filename_pattern = "%(composite).%(ending)"

[[areas]]
name = "Europe"
definition = "euro4"

[[areas.products]]
name = "overview"
composite = "overview"

[[areas.products]]
name = "natural"
composite = "natural"
"#,
                f.dir.path().join("out")
            ),
        )
        .unwrap();
        let new_system = f.dir.path().join("system2.toml");
        fs::write(
            &new_system,
            format!(
                "listener_tags = [\"/new-tag\"]\nproduct_config_path = {:?}\n",
                new_products
            ),
        )
        .unwrap();

        f.controller.handle_notification(Notification {
            subject: "/oper/NewTrollductionConfig".to_string(),
            payload: Payload::Path(new_system),
        });

        assert_eq!(f.listener.active_tags(), vec!["/new-tag"]);
        assert_eq!(f.controller.stats.config_reloads, 1);
        assert_eq!(f.controller.system.product_config_path, new_products);
        assert_eq!(f.controller.products.product_count(), 2);
    }

    #[test]
    fn test_system_reload_failure_keeps_previous() {
        let mut f = fixture();
        f.controller.handle_notification(Notification {
            subject: "/oper/NewTrollductionConfig".to_string(),
            payload: Payload::Path(f.dir.path().join("missing.toml")),
        });

        assert_eq!(f.controller.stats.config_reloads, 0);
        assert_eq!(f.listener.active_tags(), vec!["/juhu"]);
    }

    #[test]
    fn test_listener_restart_failure_adopts_config() {
        let mut f = fixture();
        let products_path = f.controller.system.product_config_path.clone();
        let new_system = f.dir.path().join("system3.toml");
        fs::write(
            &new_system,
            format!(
                "listener_tags = [\"/new-tag\"]\nproduct_config_path = {:?}\n",
                products_path
            ),
        )
        .unwrap();

        f.listener.fail_next_restart("socket in use");
        f.controller.handle_notification(Notification {
            subject: "/oper/NewTrollductionConfig".to_string(),
            payload: Payload::Path(new_system),
        });

        // The subscription kept its old tags but the configuration moved on.
        assert_eq!(f.listener.active_tags(), vec!["/juhu"]);
        assert_eq!(f.controller.stats.config_reloads, 1);
        assert_eq!(f.controller.system.listener_tags, vec!["/new-tag"]);
    }
}
