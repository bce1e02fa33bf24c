//! Error types for the wslports-core library.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for wslports operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while enumerating, scanning, or writing configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to spawn or talk to a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// The command ran but exited unsuccessfully.
    #[error("exit {}: {stderr}", exit_label(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },

    /// The command did not finish within the allotted time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A forwarder configuration failed structural validation.
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero_exit_display() {
        let err = Error::NonZeroExit {
            code: Some(1),
            stderr: "There is no distribution with the supplied name.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "exit 1: There is no distribution with the supplied name."
        );

        let killed = Error::NonZeroExit {
            code: None,
            stderr: String::new(),
        };
        assert_eq!(killed.to_string(), "exit signal: ");
    }

    #[test]
    fn test_from_conversions() {
        let io: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(io, Error::Io(_)));

        let json: Error = serde_json::from_str::<u16>("x").unwrap_err().into();
        assert!(matches!(json, Error::Json(_)));
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "timed out after 30s");

        let short = Error::Timeout(Duration::from_millis(200));
        assert_eq!(short.to_string(), "timed out after 200ms");
    }
}
