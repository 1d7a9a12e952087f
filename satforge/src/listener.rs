//! Message listener seam.
//!
//! The controller consumes notifications from a queue and steers the
//! subscription through [`ListenerControl`], keeping the transport behind
//! the seam. [`ChannelListener`] is the in-process implementation: the
//! command line feeds it from standard input and tests feed it directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::message::Notification;

/// Queue capacity between the transport and the controller.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Errors raised by listener control operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The subscription could not be re-established.
    #[error("failed to restart listener: {0}")]
    Restart(String),
}

/// Control surface of a running listener.
pub trait ListenerControl: Send + Sync {
    /// Re-subscribes with the given message tags.
    fn restart(&self, tags: &[String]) -> Result<(), ListenerError>;

    /// Tears the subscription down.
    fn stop(&self);
}

/// A listener as handed to the controller.
pub struct ListenerHandle {
    pub control: Arc<dyn ListenerControl>,
    pub receiver: mpsc::Receiver<Notification>,
}

/// In-process listener backed by a bounded channel.
pub struct ChannelListener {
    tags: Mutex<Vec<String>>,
    restart_failure: Mutex<Option<String>>,
    stopped: AtomicBool,
}

impl ChannelListener {
    /// Creates a listener, the sender that feeds it and the handle the
    /// controller consumes.
    pub fn new() -> (Arc<Self>, mpsc::Sender<Notification>, ListenerHandle) {
        let (sender, receiver) = mpsc::channel(DEFAULT_QUEUE_CAPACITY);
        let listener = Arc::new(Self {
            tags: Mutex::new(Vec::new()),
            restart_failure: Mutex::new(None),
            stopped: AtomicBool::new(false),
        });
        let handle = ListenerHandle {
            control: listener.clone(),
            receiver,
        };
        (listener, sender, handle)
    }

    /// Tags of the current subscription.
    pub fn active_tags(&self) -> Vec<String> {
        self.tags.lock().clone()
    }

    /// Makes the next restart fail with the given reason.
    pub fn fail_next_restart(&self, reason: impl Into<String>) {
        *self.restart_failure.lock() = Some(reason.into());
    }

    /// True once the controller has stopped the listener.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl ListenerControl for ChannelListener {
    fn restart(&self, tags: &[String]) -> Result<(), ListenerError> {
        if let Some(reason) = self.restart_failure.lock().take() {
            return Err(ListenerError::Restart(reason));
        }
        *self.tags.lock() = tags.to_vec();
        Ok(())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}
