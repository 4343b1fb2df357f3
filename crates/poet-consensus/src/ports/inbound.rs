//! Driving ports (Inbound API)

use crate::domain::{Block, BlockHeader, ConsensusResult};

/// Block validation path.
pub trait BlockVerifier: Send + Sync {
    /// Accept or reject a candidate block claimed with a wait certificate.
    ///
    /// Rejections carry `ErrorKind::PolicyRejected`; missing registry or
    /// block data carry `ErrorKind::NotFound`.
    fn verify_block(&self, block: &Block) -> ConsensusResult<()>;
}

/// Local block-publishing path.
pub trait BlockPublisher: Send + Sync {
    /// Prepare to claim a block on top of `header.previous_block_id`.
    ///
    /// Returns `true` once a wait timer is armed for the candidate.
    fn initialize_block(&self, header: &BlockHeader) -> ConsensusResult<bool>;

    /// True when the armed wait timer has expired.
    fn check_publish_block(&self, header: &BlockHeader) -> bool;

    /// Redeem the armed timer and write the certificate envelope into
    /// `header.consensus`.
    fn finalize_block(&self, header: &mut BlockHeader) -> ConsensusResult<bool>;
}
