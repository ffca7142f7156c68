//! Dispatcher configuration

use ir_01_token_codec::TokenCodecConfig;
use ir_02_replay_guard::ReplayGuardConfig;
use ir_03_config_cache::DEFAULT_CONFIG_TTL;
use std::time::Duration;

use crate::domain::SetupError;

/// Platform deadline for the first acknowledgement of an event.
pub const DEFAULT_ACK_WINDOW: Duration = Duration::from_secs(3);

/// Settings for every component the dispatcher owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub codec: TokenCodecConfig,
    pub replay: ReplayGuardConfig,
    pub config_cache_ttl: Duration,
    /// Acknowledgements later than this after delivery are logged.
    pub ack_window: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            codec: TokenCodecConfig::default(),
            replay: ReplayGuardConfig::default(),
            config_cache_ttl: DEFAULT_CONFIG_TTL,
            ack_window: DEFAULT_ACK_WINDOW,
        }
    }
}

impl DispatcherConfig {
    pub fn validate(&self) -> Result<(), SetupError> {
        self.codec.validate()?;
        self.replay.validate().map_err(SetupError::Replay)?;
        if self.config_cache_ttl.is_zero() {
            return Err(SetupError::CacheTtl);
        }
        Ok(())
    }
}
