//! Driven ports: collaborators consensus reads from or writes to.
//!
//! All calls are synchronous. Implementations may block on storage; errors
//! are propagated unchanged and no timeout is imposed here.

use crate::domain::{Block, ConsensusResult, SignupInfo, ValidatorInfo};
use std::sync::Arc;

/// Recently committed blocks, keyed by block id.
pub trait BlockCache: Send + Sync {
    /// Fails with `BlockNotFound` on a miss.
    fn get_block(&self, block_id: &str) -> ConsensusResult<Block>;
}

/// Durable block storage with a transaction index.
pub trait BlockStore: Send + Sync {
    /// The block that committed `transaction_id`.
    ///
    /// Fails with `TransactionNotFound` on a miss.
    fn get_block_by_transaction_id(&self, transaction_id: &str) -> ConsensusResult<Block>;
}

/// Validator registry as of one state root.
pub trait ValidatorRegistryView: Send + Sync {
    /// Fails with `ValidatorNotFound` on a miss.
    fn get_validator_info(&self, validator_id: &str) -> ConsensusResult<ValidatorInfo>;

    /// Number of registered validators.
    fn validator_count(&self) -> usize;
}

/// Settings and registry as of one state root.
pub trait StateView: Send + Sync {
    /// Raw value of an on-chain setting, if set.
    fn get_setting(&self, key: &str) -> Option<String>;

    fn validator_registry(&self) -> &dyn ValidatorRegistryView;
}

/// Opens state views at a given state root.
pub trait StateViewFactory: Send + Sync {
    /// Fails with `StateRootNotFound` when the root is unknown.
    fn create_view(&self, state_root_hash: &str) -> ConsensusResult<Arc<dyn StateView>>;
}

/// Byte map backing the consensus state store.
///
/// Single-key writes must be atomic.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> ConsensusResult<Option<Vec<u8>>>;
    fn put(&self, key: &str, value: Vec<u8>) -> ConsensusResult<()>;
    fn contains(&self, key: &str) -> ConsensusResult<bool>;
}

/// Submits validator registry transactions.
pub trait RegistrationSubmitter: Send + Sync {
    fn submit_registration(&self, validator_id: &str, signup_info: &SignupInfo)
        -> ConsensusResult<()>;
}
