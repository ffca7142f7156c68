//! # IR-02 Replay Guard
//!
//! Marks component tokens as consumed so a captured or double-clicked
//! identifier cannot run its action twice.
//!
//! ## Design
//!
//! - A `key -> expiry` table behind a mutex: the check-and-insert is atomic,
//!   so exactly one of several concurrent callers wins
//! - Expired entries count as fresh; a key becomes usable again once its
//!   TTL window has passed
//! - Garbage collection is opportunistic (on `check`), triggered by table
//!   size or elapsed time, and a sweep stops as soon as the table is back
//!   under half its cap
//!
//! ## Scopes
//!
//! See [`replay_key`]: the same token yields different keys depending on
//! whether it is single-use per instance, per user or per channel.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod guard;
pub mod key;

pub use guard::{ReplayGuard, ReplayGuardConfig, ReplayStats};
pub use key::replay_key;
