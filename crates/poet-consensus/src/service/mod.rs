//! Consensus services
//!
//! [`consensus_state_for_block_id`] rebuilds statistics from block history;
//! [`PoetBlockVerifier`] and [`PoetBlockPublisher`] drive the validation and
//! publishing paths on top of it.

mod publisher;
mod state_builder;
mod verifier;


pub use publisher::PoetBlockPublisher;
pub use state_builder::consensus_state_for_block_id;
pub use verifier::PoetBlockVerifier;

use crate::estimate_cache::PopulationEstimateCache;
use crate::ports::{BlockCache, BlockStore, StateViewFactory};
use crate::store::ConsensusStateStore;
use poet_enclave::PoetEnclave;
use std::sync::Arc;

/// Collaborators shared by the verifier and the publisher.
#[derive(Clone)]
pub struct ConsensusDependencies {
    pub block_cache: Arc<dyn BlockCache>,
    pub block_store: Arc<dyn BlockStore>,
    pub state_view_factory: Arc<dyn StateViewFactory>,
    pub consensus_state_store: Arc<ConsensusStateStore>,
    pub population_cache: Arc<PopulationEstimateCache>,
    pub enclave: Arc<dyn PoetEnclave>,
}
