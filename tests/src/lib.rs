//! # Interaction Router Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks (codec, replay guard)
//! └── src/integration/  # Cross-crate scenarios
//!     ├── token_lifecycle.rs
//!     ├── replay.rs
//!     ├── routing.rs
//!     ├── tenant_config.rs
//!     └── runtime.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ir-tests
//! cargo test -p ir-tests integration::replay
//! cargo bench -p ir-tests
//! ```

pub mod integration;
