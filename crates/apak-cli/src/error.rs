//! Error types for the command-line tool.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Input file or archive does not exist
    #[error("Path not found: {}", .0.display())]
    MissingPath(PathBuf),

    /// Output location cannot be used
    #[error("Invalid output '{}': {reason}", path.display())]
    InvalidOutput {
        /// The rejected output path
        path: PathBuf,
        /// Reason for rejection
        reason: String,
    },

    /// Log filter directive could not be parsed
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidLogFilter {
        /// The directive as given
        filter: String,
        /// Parser message
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::MissingPath(PathBuf::from("missing.apak"));
        assert_eq!(err.to_string(), "Path not found: missing.apak");

        let err = ConfigError::InvalidOutput {
            path: PathBuf::from("out"),
            reason: "is a directory".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid output 'out': is a directory");
    }
}
