//! Consensus state and PoET key stores

use crate::domain::{ConsensusError, ConsensusResult, ConsensusState, PoetKeyState};
use crate::ports::KeyValueStore;
use base64::{engine::general_purpose::STANDARD, Engine};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Memoized consensus state per block id.
///
/// Entries are write-once. A stored blob that fails validation is reported
/// and treated as absent so the chain walk rebuilds it.
pub struct ConsensusStateStore {
    store: Arc<dyn KeyValueStore>,
}

impl ConsensusStateStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, block_id: &str) -> ConsensusResult<Option<ConsensusState>> {
        let Some(bytes) = self.store.get(block_id)? else {
            return Ok(None);
        };
        match ConsensusState::from_bytes(&bytes) {
            Ok(state) => Ok(Some(state)),
            Err(err) => {
                warn!(block_id, error = %err, "Discarding unreadable consensus state");
                Ok(None)
            }
        }
    }

    /// Store `state` for `block_id` unless an entry already exists.
    pub fn put(&self, block_id: &str, state: &ConsensusState) -> ConsensusResult<()> {
        if self.store.contains(block_id)? {
            return Ok(());
        }
        self.store.put(block_id, state.to_bytes()?)?;
        debug!(block_id, %state, "Stored consensus state");
        Ok(())
    }

    pub fn contains(&self, block_id: &str) -> ConsensusResult<bool> {
        self.store.contains(block_id)
    }
}

#[derive(Default)]
struct KeyStateInner {
    key_states: HashMap<String, PoetKeyState>,
    active_key: Option<String>,
}

/// PoET key states held by the local publisher, keyed by PoET public key.
#[derive(Default)]
pub struct PoetKeyStateStore {
    inner: RwLock<KeyStateInner>,
}

impl PoetKeyStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_key_state(key_state: &PoetKeyState) -> ConsensusResult<()> {
        if key_state.sealed_signup_data.is_empty() {
            return Err(ConsensusError::InvalidKeyState(
                "sealed_signup_data must not be empty".to_string(),
            ));
        }
        STANDARD
            .decode(&key_state.sealed_signup_data)
            .map_err(|e| {
                ConsensusError::InvalidKeyState(format!("sealed_signup_data is not base64: {e}"))
            })?;
        Ok(())
    }

    pub fn insert(&self, poet_public_key: &str, key_state: PoetKeyState) -> ConsensusResult<()> {
        Self::check_key_state(&key_state)?;
        self.inner
            .write()
            .key_states
            .insert(poet_public_key.to_string(), key_state);
        Ok(())
    }

    pub fn get(&self, poet_public_key: &str) -> Option<PoetKeyState> {
        self.inner.read().key_states.get(poet_public_key).cloned()
    }

    pub fn contains(&self, poet_public_key: &str) -> bool {
        self.inner.read().key_states.contains_key(poet_public_key)
    }

    /// Drop a key; clears the active key if it was this one.
    pub fn remove(&self, poet_public_key: &str) -> Option<PoetKeyState> {
        let mut inner = self.inner.write();
        if inner.active_key.as_deref() == Some(poet_public_key) {
            inner.active_key = None;
        }
        inner.key_states.remove(poet_public_key)
    }

    pub fn active_key(&self) -> Option<String> {
        self.inner.read().active_key.clone()
    }

    /// Fails unless the key has a stored state.
    pub fn set_active_key(&self, poet_public_key: &str) -> ConsensusResult<()> {
        let mut inner = self.inner.write();
        if !inner.key_states.contains_key(poet_public_key) {
            return Err(ConsensusError::InvalidKeyState(format!(
                "no key state for {poet_public_key}"
            )));
        }
        inner.active_key = Some(poet_public_key.to_string());
        Ok(())
    }

    pub fn clear_active_key(&self) {
        self.inner.write().active_key = None;
    }

    pub fn poet_public_keys(&self) -> Vec<String> {
        self.inner.read().key_states.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().key_states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().key_states.is_empty()
    }
}
