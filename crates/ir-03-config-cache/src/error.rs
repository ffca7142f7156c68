//! Error types for the config cache

use thiserror::Error;

/// Config loading errors.
///
/// `Clone` because a single load result is handed to every caller that
/// coalesced onto it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Config source unavailable for tenant {tenant}: {reason}")]
    SourceUnavailable { tenant: String, reason: String },

    #[error("Could not create default config for tenant {tenant}: {reason}")]
    DefaultCreationFailed { tenant: String, reason: String },

    #[error("Config source panicked while loading tenant {tenant}")]
    SourcePanicked { tenant: String },

    #[error("Stored config for tenant {tenant} is invalid: {reason}")]
    Invalid { tenant: String, reason: String },
}
