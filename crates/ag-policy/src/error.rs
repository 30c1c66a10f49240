// error.rs - Error types for the policy subsystem.
//
// Errors only arise while building configuration. Evaluating an
// invocation or classifying a capability set never fails.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    /// A blocked pattern is not a valid regular expression.
    #[error("invalid blocked pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A security level name outside low/medium/high/maximum.
    #[error("unknown security level '{0}' (expected low, medium, high or maximum)")]
    UnknownLevel(String),

    /// A policy document could not be parsed.
    #[error("invalid policy document: {0}")]
    Document(#[from] serde_yaml::Error),

    /// A policy file could not be read.
    #[error("failed to read policy file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
