//! # poet-consensus
//!
//! Proof of Elapsed Time consensus: per-block statistics, population
//! estimates and the admission policies that decide whether a validator may
//! claim a block.
//!
//! ## Architecture
//!
//! ```text
//!            candidate block (wait certificate in header.consensus)
//!                       │
//!                       ▼
//!              PoetBlockVerifier::verify_block
//!                       │
//!     ┌─────────────────┼──────────────────────────┐
//!     ▼                 ▼                          ▼
//! registry view   consensus_state_for_block_id   CertificateValidator
//! (StateView)       │ walk back to a stored       (chain link, local
//!                   │ state, replay oldest first   mean, signature)
//!                   ▼
//!            ConsensusState ──→ ValidatorPolicyEngine
//!                                 signup freshness → C → K → Z
//!                                                      │
//!                                        PopulationEstimateCache
//! ```
//!
//! The publishing side ([`PoetBlockPublisher`]) runs the same checks before
//! arming a wait timer, registers new PoET keys through the
//! [`RegistrationSubmitter`] port, and writes the certificate envelope into
//! the block header once the timer expires.
//!
//! ## Error kinds
//!
//! Every [`ConsensusError`] maps to an [`ErrorKind`]: `NotFound` for missing
//! blocks, validators and state roots, `PolicyRejected` for blocks that
//! fail a check, `MalformedInput` for undecodable data and `Internal` for
//! sequencing or storage faults.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod estimate_cache;
pub mod metrics;
pub mod policy;
pub mod ports;
pub mod service;
pub mod store;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use adapters::{
    InMemoryBlockStore, InMemoryKeyValueStore, InMemoryRegistrationSubmitter, InMemoryStateView,
    InMemoryStateViewFactory,
};
pub use config::PoetSettings;
pub use domain::{
    block_id_is_genesis, block_id_to_nonce, Block, BlockHeader, ConsensusError, ConsensusResult,
    ConsensusState, ErrorKind, PoetKeyState, PolicyViolation, PopulationSample, SignupInfo,
    ValidatorInfo, ValidatorState, NULL_BLOCK_IDENTIFIER,
};
pub use estimate_cache::{EstimateInfo, PopulationEstimateCache};
pub use policy::{z_test, Claim, ValidatorPolicyEngine, ZTestOutcome};
pub use ports::{
    BlockCache, BlockPublisher, BlockStore, BlockVerifier, KeyValueStore, RegistrationSubmitter,
    StateView, StateViewFactory, ValidatorRegistryView,
};
pub use service::{
    consensus_state_for_block_id, ConsensusDependencies, PoetBlockPublisher, PoetBlockVerifier,
};
pub use store::{ConsensusStateStore, PoetKeyStateStore};
pub use validation::CertificateValidator;
