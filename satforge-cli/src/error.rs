//! Command-line error type.

use std::fmt;

use satforge::ControllerError;

/// Errors surfaced to the command line.
#[derive(Debug)]
pub enum CliError {
    /// Configuration or environment problem.
    Config(String),
    /// The controller could not be started.
    Controller(ControllerError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "{msg}"),
            CliError::Controller(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::Controller(err) => Some(err),
        }
    }
}

impl From<ControllerError> for CliError {
    fn from(err: ControllerError) -> Self {
        CliError::Controller(err)
    }
}
