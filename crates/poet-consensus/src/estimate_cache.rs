//! Population estimates per block, shared across chain walks.

use crate::config::PoetSettings;
use crate::domain::{block_id_is_genesis, ConsensusError, ConsensusResult};
use crate::ports::BlockCache;
use crate::validation::CertificateValidator;
use parking_lot::Mutex;
use std::collections::HashMap;

/// What the Z-test needs from one claimed block.
#[derive(Clone, Debug, PartialEq)]
pub struct EstimateInfo {
    pub population_estimate: f64,
    pub previous_block_id: String,
    /// Validator that claimed the block.
    pub validator_id: String,
}

/// Block id -> [`EstimateInfo`], write-once.
///
/// The lock is held for a whole backward walk so that concurrent walks over
/// overlapping history fill each entry exactly once.
#[derive(Default)]
pub struct PopulationEstimateCache {
    entries: Mutex<HashMap<String, EstimateInfo>>,
}

impl PopulationEstimateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, block_id: &str) -> Option<EstimateInfo> {
        self.entries.lock().get(block_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Estimates for up to `count` blocks walking back from `block_id`,
    /// most recent first. Stops early at genesis.
    ///
    /// Every visited block must carry a wait certificate.
    pub fn build_estimate_list(
        &self,
        block_id: &str,
        count: usize,
        settings: &PoetSettings,
        block_cache: &dyn BlockCache,
    ) -> ConsensusResult<Vec<EstimateInfo>> {
        let mut estimates = Vec::with_capacity(count);
        let mut entries = self.entries.lock();
        let mut current_id = block_id.to_string();

        for _ in 0..count {
            if block_id_is_genesis(&current_id) {
                break;
            }
            let entry = match entries.get(&current_id) {
                Some(entry) => entry.clone(),
                None => {
                    let block = block_cache.get_block(&current_id)?;
                    let certificate = CertificateValidator::deserialize(&block).ok_or_else(|| {
                        ConsensusError::MalformedInput(format!(
                            "block {current_id} has no wait certificate"
                        ))
                    })?;
                    let entry = EstimateInfo {
                        population_estimate: certificate
                            .population_estimate(settings.target_wait_time),
                        previous_block_id: block.header.previous_block_id.clone(),
                        validator_id: block.header.signer_public_key.clone(),
                    };
                    entries.insert(current_id.clone(), entry.clone());
                    entry
                }
            };
            current_id = entry.previous_block_id.clone();
            estimates.push(entry);
        }

        Ok(estimates)
    }
}
