//! Notification messages and subject classification.
//!
//! Notifications arrive from the listener as subject plus payload. The
//! subject is matched by substring so routed subjects such as
//! `/oper/polar/NewFileArrived` still classify, with more specific kinds
//! checked first. The markers keep their leading slash, so a bare token
//! embedded in an unrelated subject does not classify.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Subject suffix requesting shutdown.
pub const SUBJECT_STOP: &str = "/StopTrollduction";
/// Subject suffix requesting a system configuration reload.
pub const SUBJECT_SYSTEM_CONFIG: &str = "/NewTrollductionConfig";
/// Subject suffix requesting a production configuration reload.
pub const SUBJECT_PRODUCT_CONFIG: &str = "/NewProductConfig";
/// Subject suffix announcing new input data.
pub const SUBJECT_FILE_ARRIVED: &str = "/NewFileArrived";

/// One message from the listener.
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub subject: String,
    pub payload: Payload,
}

/// Payload of a notification.
///
/// Configuration reloads carry a file path, data announcements carry the
/// metadata fields of the new granule.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Path(PathBuf),
    Fields(HashMap<String, String>),
}

impl Payload {
    /// The payload as a path, if it is one.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Payload::Path(path) => Some(path),
            Payload::Fields(_) => None,
        }
    }

    /// The payload as metadata fields, if it is one.
    pub fn as_fields(&self) -> Option<&HashMap<String, String>> {
        match self {
            Payload::Path(_) => None,
            Payload::Fields(fields) => Some(fields),
        }
    }
}

/// What a notification asks the controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Shut the controller down.
    Stop,
    /// Reload the system configuration from the payload path.
    ReloadSystemConfig,
    /// Reload the production configuration from the payload path.
    ReloadProductConfig,
    /// Run production for the granule described by the payload fields.
    FileArrived,
    /// Anything else; ignored.
    Other,
}

impl MessageKind {
    /// Classifies a subject by substring match, most specific first.
    pub fn classify(subject: &str) -> Self {
        if subject.contains(SUBJECT_STOP) {
            MessageKind::Stop
        } else if subject.contains(SUBJECT_SYSTEM_CONFIG) {
            MessageKind::ReloadSystemConfig
        } else if subject.contains(SUBJECT_PRODUCT_CONFIG) {
            MessageKind::ReloadProductConfig
        } else if subject.contains(SUBJECT_FILE_ARRIVED) {
            MessageKind::FileArrived
        } else {
            MessageKind::Other
        }
    }
}
