//! # IR-01 Token Codec
//!
//! Issues and verifies the signed identifiers embedded in transient UI
//! components.
//!
//! ## Wire Format
//!
//! ```text
//! namespace:action:version:base64url(json payload):signature
//! ```
//!
//! The signature is the first 12 base64url characters of
//! `HMAC-SHA256(secret, "namespace:action:version:payload")`. The whole
//! string must fit the platform's identifier cap; a token that does not fit
//! is rejected when it is built, never when it is parsed.
//!
//! ## Verification Steps (in order)
//!
//! 1. **Shape**: at least five `:`-separated segments
//! 2. **Signature**: recomputed over the first four segments (covers both
//!    tampering and a rotated signing secret)
//! 3. **Payload**: base64url + JSON decode, numeric version
//! 4. **Expiry**: `expiry == 0` never expires, otherwise
//!    `now <= expiry + clock_skew`
//! 5. **Context** (optional): tenant must match, actor must match unless the
//!    caller is elevated, channel drift is only logged
//!
//! ## Usage
//!
//! ```rust,ignore
//! let codec = TokenCodec::new(secret, TokenCodecConfig::default())?;
//! let ctx = InteractionContext::new("42", Some("7".into()), "9");
//! let token = codec.build("poll", "vote", 1, &ctx, json!({"option": "yes"}), 60)?;
//!
//! let parsed = codec.parse(&token, None)?;
//! assert_eq!(parsed.custom()["option"], "yes");
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod error;
pub mod service;

pub use domain::{TokenCodecConfig, DEFAULT_CLOCK_SKEW_SECS, DEFAULT_MAX_TOKEN_LENGTH, NONCE_LEN};
pub use error::{TokenError, TokenRejection};
pub use service::TokenCodec;
