//! In-memory collaborators
//!
//! Back the outbound ports with plain maps. Used by tests and by embedders
//! that keep a short chain in memory.

use crate::domain::{Block, ConsensusError, ConsensusResult, SignupInfo, ValidatorInfo};
use crate::ports::{
    BlockCache, BlockStore, KeyValueStore, RegistrationSubmitter, StateView, StateViewFactory,
    ValidatorRegistryView,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Block cache and block store over one map.
#[derive(Default)]
pub struct InMemoryBlockStore {
    blocks: RwLock<HashMap<String, Block>>,
    /// transaction id -> committing block id
    transactions: RwLock<HashMap<String, String>>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block and index the transactions it commits.
    pub fn insert(&self, block: Block, transaction_ids: &[&str]) {
        let mut transactions = self.transactions.write();
        for transaction_id in transaction_ids {
            transactions.insert(transaction_id.to_string(), block.block_id.clone());
        }
        drop(transactions);
        self.blocks.write().insert(block.block_id.clone(), block);
    }

    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }
}

impl BlockCache for InMemoryBlockStore {
    fn get_block(&self, block_id: &str) -> ConsensusResult<Block> {
        self.blocks
            .read()
            .get(block_id)
            .cloned()
            .ok_or_else(|| ConsensusError::BlockNotFound(block_id.to_string()))
    }
}

impl BlockStore for InMemoryBlockStore {
    fn get_block_by_transaction_id(&self, transaction_id: &str) -> ConsensusResult<Block> {
        let block_id = self
            .transactions
            .read()
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| ConsensusError::TransactionNotFound(transaction_id.to_string()))?;
        self.get_block(&block_id)
    }
}

/// Settings and validator registry snapshot.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStateView {
    settings: HashMap<String, String>,
    validators: HashMap<String, ValidatorInfo>,
}

impl InMemoryStateView {
    pub fn with_setting(mut self, key: &str, value: &str) -> Self {
        self.settings.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_validator(mut self, validator_info: ValidatorInfo) -> Self {
        self.validators
            .insert(validator_info.id.clone(), validator_info);
        self
    }
}

impl ValidatorRegistryView for InMemoryStateView {
    fn get_validator_info(&self, validator_id: &str) -> ConsensusResult<ValidatorInfo> {
        self.validators
            .get(validator_id)
            .cloned()
            .ok_or_else(|| ConsensusError::ValidatorNotFound(validator_id.to_string()))
    }

    fn validator_count(&self) -> usize {
        self.validators.len()
    }
}

impl StateView for InMemoryStateView {
    fn get_setting(&self, key: &str) -> Option<String> {
        self.settings.get(key).cloned()
    }

    fn validator_registry(&self) -> &dyn ValidatorRegistryView {
        self
    }
}

/// State views keyed by state root.
#[derive(Default)]
pub struct InMemoryStateViewFactory {
    views: RwLock<HashMap<String, Arc<dyn StateView>>>,
}

impl InMemoryStateViewFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, state_root_hash: &str, view: impl StateView + 'static) {
        self.views
            .write()
            .insert(state_root_hash.to_string(), Arc::new(view));
    }
}

impl StateViewFactory for InMemoryStateViewFactory {
    fn create_view(&self, state_root_hash: &str) -> ConsensusResult<Arc<dyn StateView>> {
        self.views
            .read()
            .get(state_root_hash)
            .cloned()
            .ok_or_else(|| ConsensusError::StateRootNotFound(state_root_hash.to_string()))
    }
}

/// Byte map.
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> ConsensusResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> ConsensusResult<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn contains(&self, key: &str) -> ConsensusResult<bool> {
        Ok(self.entries.read().contains_key(key))
    }
}

/// Records submitted registrations instead of broadcasting them.
#[derive(Default)]
pub struct InMemoryRegistrationSubmitter {
    submitted: Mutex<Vec<(String, SignupInfo)>>,
}

impl InMemoryRegistrationSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrations in submission order.
    pub fn submitted(&self) -> Vec<(String, SignupInfo)> {
        self.submitted.lock().clone()
    }

    /// Remove and return everything submitted so far.
    pub fn drain(&self) -> Vec<(String, SignupInfo)> {
        std::mem::take(&mut *self.submitted.lock())
    }
}

impl RegistrationSubmitter for InMemoryRegistrationSubmitter {
    fn submit_registration(
        &self,
        validator_id: &str,
        signup_info: &SignupInfo,
    ) -> ConsensusResult<()> {
        debug!(validator_id, nonce = %signup_info.nonce, "Registration submitted");
        self.submitted
            .lock()
            .push((validator_id.to_string(), signup_info.clone()));
        Ok(())
    }
}
