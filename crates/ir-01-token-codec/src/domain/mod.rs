//! Domain layer: codec configuration and the wire encoding.

pub mod config;
pub mod wire;

pub use config::{TokenCodecConfig, DEFAULT_CLOCK_SKEW_SECS, DEFAULT_MAX_TOKEN_LENGTH};
pub use wire::NONCE_LEN;
