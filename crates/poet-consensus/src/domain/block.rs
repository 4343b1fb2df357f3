//! Block entities as seen by consensus.

use poet_enclave::NULL_IDENTIFIER;
use serde::{Deserialize, Serialize};

/// Predecessor id of the genesis block.
pub const NULL_BLOCK_IDENTIFIER: &str = NULL_IDENTIFIER;

/// Number of trailing block-id characters used as a signup nonce.
pub const NONCE_LENGTH: usize = 16;

/// True if `block_id` is the sentinel that precedes genesis.
///
/// Genesis is recognised by this exact comparison only, never by height.
pub fn block_id_is_genesis(block_id: &str) -> bool {
    block_id == NULL_BLOCK_IDENTIFIER
}

/// Nonce a signup carries to prove which chain head it was created on.
pub fn block_id_to_nonce(block_id: &str) -> &str {
    let start = block_id.len().saturating_sub(NONCE_LENGTH);
    block_id.get(start..).unwrap_or(block_id)
}

/// Header fields consensus reads or writes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub block_num: u64,
    pub previous_block_id: String,
    /// Public key of the validator that claimed the block; its validator id.
    pub signer_public_key: String,
    pub state_root_hash: String,
    pub batch_ids: Vec<String>,
    /// Opaque consensus payload; a wait-certificate envelope for PoET blocks.
    pub consensus: Vec<u8>,
}

/// A committed block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub block_id: String,
    pub header: BlockHeader,
}

impl Block {
    pub fn new(block_id: impl Into<String>, header: BlockHeader) -> Self {
        Self {
            block_id: block_id.into(),
            header,
        }
    }

    pub fn previous_block_id(&self) -> &str {
        &self.header.previous_block_id
    }

    pub fn block_num(&self) -> u64 {
        self.header.block_num
    }

    pub fn signer_public_key(&self) -> &str {
        &self.header.signer_public_key
    }

    pub fn state_root_hash(&self) -> &str {
        &self.header.state_root_hash
    }

    pub fn is_genesis(&self) -> bool {
        block_id_is_genesis(&self.header.previous_block_id)
    }
}
