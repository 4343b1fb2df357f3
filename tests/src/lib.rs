//! # PoET Consensus Test Suite
//!
//! Cross-crate tests that drive several simulated validators over one chain.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks for the hot paths
//! └── src/integration/  # Multi-validator flows
//!     ├── network.rs        # Shared chain + per-node harness
//!     ├── signup_flows.rs   # Registration, attestation, timeouts
//!     └── election_rounds.rs# Leader election and verification rounds
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p poet-tests
//! cargo test -p poet-tests integration::election_rounds
//! cargo bench -p poet-tests
//! ```

pub mod integration;
