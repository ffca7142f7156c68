//! # Router Configuration
//!
//! Runtime settings read from the environment.
//!
//! ## Security Requirements
//!
//! - `IR_SIGNING_SECRET` MUST be set and at least 16 bytes; the router
//!   refuses to start otherwise
//! - A `hex:` prefix marks a hex-encoded secret
//! - Every other setting has a default; unparsable values fall back to it
//!   with a warning

use ir_05_dispatcher::{DispatcherConfig, SetupError};
use router_telemetry::TelemetryConfig;
use shared_types::{SecretError, SigningSecret};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum RuntimeConfigError {
    #[error("IR_SIGNING_SECRET is not set. Refusing to issue unsigned components.")]
    MissingSigningSecret,

    #[error("IR_SIGNING_SECRET is too short: {len} bytes (minimum {min})")]
    InsecureSigningSecret { len: usize, min: usize },

    #[error("IR_SIGNING_SECRET has a hex: prefix but is not valid hex")]
    InvalidHexSecret,

    #[error(transparent)]
    Dispatcher(#[from] SetupError),
}

/// Complete router configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub secret: SigningSecret,
    pub dispatcher: DispatcherConfig,
    pub telemetry: TelemetryConfig,
}

impl RouterConfig {
    /// Load from process environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `IR_SIGNING_SECRET`: signing key (required)
    /// - `IR_MAX_TOKEN_LENGTH`: identifier cap (default: 100)
    /// - `IR_CLOCK_SKEW_SECS`: expiry tolerance (default: 30)
    /// - `IR_STRICT_CHANNEL`: reject channel drift (default: false)
    /// - `IR_REPLAY_MAX_ENTRIES`: replay table size trigger (default: 10000)
    /// - `IR_REPLAY_SWEEP_SECS`: replay sweep interval (default: 60)
    /// - `IR_CONFIG_CACHE_TTL_SECS`: tenant config TTL (default: 300)
    /// - `IR_ACK_WINDOW_MS`: late-acknowledgement warning threshold (default: 3000)
    pub fn from_env() -> Result<Self, RuntimeConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, RuntimeConfigError> {
        let secret = load_secret(lookup("IR_SIGNING_SECRET"))?;

        let mut dispatcher = DispatcherConfig::default();
        let codec = &mut dispatcher.codec;
        codec.max_token_length = parse_or(&lookup, "IR_MAX_TOKEN_LENGTH", codec.max_token_length);
        codec.clock_skew_secs = parse_or(&lookup, "IR_CLOCK_SKEW_SECS", codec.clock_skew_secs);
        codec.strict_channel = lookup("IR_STRICT_CHANNEL")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(codec.strict_channel);

        dispatcher.replay.max_entries =
            parse_or(&lookup, "IR_REPLAY_MAX_ENTRIES", dispatcher.replay.max_entries);
        dispatcher.replay.sweep_interval = Duration::from_secs(parse_or(
            &lookup,
            "IR_REPLAY_SWEEP_SECS",
            dispatcher.replay.sweep_interval.as_secs(),
        ));
        dispatcher.config_cache_ttl = Duration::from_secs(parse_or(
            &lookup,
            "IR_CONFIG_CACHE_TTL_SECS",
            dispatcher.config_cache_ttl.as_secs(),
        ));
        dispatcher.ack_window = Duration::from_millis(parse_or(
            &lookup,
            "IR_ACK_WINDOW_MS",
            dispatcher.ack_window.as_millis() as u64,
        ));

        dispatcher.validate()?;

        Ok(Self {
            secret,
            dispatcher,
            telemetry: TelemetryConfig::from_lookup(&lookup),
        })
    }
}

fn load_secret(raw: Option<String>) -> Result<SigningSecret, RuntimeConfigError> {
    let raw = raw.ok_or(RuntimeConfigError::MissingSigningSecret)?;
    let bytes = match raw.strip_prefix("hex:") {
        Some(encoded) => hex::decode(encoded).map_err(|_| RuntimeConfigError::InvalidHexSecret)?,
        None => raw.into_bytes(),
    };

    SigningSecret::new(bytes).map_err(|e| match e {
        SecretError::Missing => RuntimeConfigError::MissingSigningSecret,
        SecretError::TooShort { len, min } => {
            RuntimeConfigError::InsecureSigningSecret { len, min }
        }
    })
}

fn parse_or<T: FromStr + Copy>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key = key, value = %raw, "Unparsable setting, using default");
            default
        }),
    }
}
