//! Settings loading errors
//!
//! The simulation core itself never fails; only reading a configuration
//! snapshot from disk or text can.

use thiserror::Error;

/// Errors raised while loading a [`Settings`](crate::Settings) snapshot.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings from {path}: {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings text was not valid JSON for the snapshot schema.
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
