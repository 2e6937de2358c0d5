//! Error types for projagg-core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using projagg-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for reconciliation runs
#[derive(Error, Debug)]
pub enum Error {
    // Input errors
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    #[error("Unknown host version: {0} (expected vs2013 or vs2015)")]
    InvalidHostVersion(String),

    #[error("An aggregation run is already in progress")]
    AlreadyRunning,

    // Automation surface errors
    #[error("Automation host not found: {0}")]
    HostNotFound(String),

    #[error("Automation error: {0}")]
    Automation(String),

    #[error("Automation session is closed")]
    SessionClosed,

    // Command execution errors
    #[error("Command failed: {cmd}\n{stderr}")]
    CommandFailed { cmd: String, stderr: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an error from a command failure
    pub fn command_failed(cmd: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            cmd: cmd.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether the error came from the automation surface rather than local input.
    pub fn is_automation_failure(&self) -> bool {
        matches!(
            self,
            Self::Automation(_) | Self::CommandFailed { .. } | Self::SessionClosed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_display() {
        let err = Error::command_failed("dotnet sln add", "boom");
        assert_eq!(err.to_string(), "Command failed: dotnet sln add\nboom");
        assert!(err.is_automation_failure());
    }

    #[test]
    fn test_path_not_found_is_not_automation_failure() {
        let err = Error::PathNotFound(PathBuf::from("/nope"));
        assert_eq!(err.to_string(), "Path not found: /nope");
        assert!(!err.is_automation_failure());
    }
}
