//! Validator registry records and per-validator claim statistics.

use super::error::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};

/// Registered signup information for a validator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupInfo {
    pub poet_public_key: String,
    pub proof_data: String,
    pub anti_sybil_id: String,
    /// Nonce (block id suffix) of the chain head the signup was created on.
    pub nonce: String,
}

/// Validator registry entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorInfo {
    /// Validator id (the validator's block-signing public key).
    pub id: String,
    pub name: String,
    /// Registry transaction that committed the current signup.
    pub transaction_id: String,
    pub signup_info: SignupInfo,
}

impl ValidatorInfo {
    pub fn poet_public_key(&self) -> &str {
        &self.signup_info.poet_public_key
    }

    /// Abbreviated id for log lines.
    pub fn short_id(&self) -> String {
        if self.id.len() <= 16 {
            return self.id.clone();
        }
        let head = self.id.get(..8).unwrap_or_default();
        let tail = self.id.get(self.id.len() - 8..).unwrap_or_default();
        format!("{head}...{tail}")
    }
}

/// Claim statistics for one validator.
///
/// Invariant: `key_block_claim_count <= total_block_claim_count` and the
/// PoET public key is non-empty. Enforced at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorState {
    key_block_claim_count: u64,
    poet_public_key: String,
    total_block_claim_count: u64,
}

impl ValidatorState {
    pub fn new(
        key_block_claim_count: u64,
        poet_public_key: impl Into<String>,
        total_block_claim_count: u64,
    ) -> ConsensusResult<Self> {
        let poet_public_key = poet_public_key.into();
        if poet_public_key.is_empty() {
            return Err(ConsensusError::InvalidValidatorState(
                "poet_public_key is empty".to_string(),
            ));
        }
        if key_block_claim_count > total_block_claim_count {
            return Err(ConsensusError::InvalidValidatorState(format!(
                "total_block_claim_count ({total_block_claim_count}) is less than \
                 key_block_claim_count ({key_block_claim_count})"
            )));
        }
        Ok(Self {
            key_block_claim_count,
            poet_public_key,
            total_block_claim_count,
        })
    }

    /// Blocks claimed with the current PoET key.
    pub fn key_block_claim_count(&self) -> u64 {
        self.key_block_claim_count
    }

    pub fn poet_public_key(&self) -> &str {
        &self.poet_public_key
    }

    /// Blocks claimed with any key.
    pub fn total_block_claim_count(&self) -> u64 {
        self.total_block_claim_count
    }

    /// State after claiming one more block with `poet_public_key`.
    ///
    /// A different key than the one on file restarts the key count at one.
    pub fn after_claim(&self, poet_public_key: &str) -> ConsensusResult<Self> {
        let key_block_claim_count = if poet_public_key == self.poet_public_key {
            self.key_block_claim_count + 1
        } else {
            1
        };
        Self::new(
            key_block_claim_count,
            poet_public_key,
            self.total_block_claim_count + 1,
        )
    }
}
