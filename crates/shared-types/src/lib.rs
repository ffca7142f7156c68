//! # Shared Types Crate
//!
//! Domain entities and security primitives shared by every component of the
//! interaction router.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identifiers, the token payload shape and the
//!   inbound `Interaction` are defined once, here.
//! - **Token Authority**: once a token has been verified, its payload is the
//!   authoritative record of who issued the component and where.
//! - **Injected Time**: every time-dependent component reads a [`Clock`] so
//!   expiry and replay windows can be exercised without sleeping.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clock;
pub mod entities;
pub mod security;

pub use clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use entities::*;
pub use security::*;
