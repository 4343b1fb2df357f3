//! Stateless wait certificate checks.

use crate::config::PoetSettings;
use crate::domain::{
    block_id_is_genesis, Block, ConsensusError, ConsensusResult, ConsensusState,
    NULL_BLOCK_IDENTIFIER,
};
use crate::ports::BlockCache;
use poet_enclave::{CertificateEnvelope, PoetEnclave, WaitCertificate};
use tracing::debug;

/// Tolerance when comparing a certificate's local mean to the recomputed one.
pub const LOCAL_MEAN_TOLERANCE: f64 = 0.001;

/// Wait certificate extraction and validation.
pub struct CertificateValidator;

impl CertificateValidator {
    /// The block's wait certificate, or `None` for a non-PoET block.
    pub fn deserialize(block: &Block) -> Option<WaitCertificate> {
        if block.header.consensus.is_empty() {
            return None;
        }
        let envelope = CertificateEnvelope::from_bytes(&block.header.consensus).ok()?;
        match WaitCertificate::from_envelope(&envelope) {
            Ok(certificate) => Some(certificate),
            Err(err) => {
                debug!(block_id = %block.block_id, error = %err, "Consensus field is not a wait certificate");
                None
            }
        }
    }

    /// Certificate id a timer built on `previous_block_id` must chain to.
    ///
    /// The null identifier when the predecessor is genesis or non-PoET.
    pub fn previous_certificate_id(
        previous_block_id: &str,
        block_cache: &dyn BlockCache,
    ) -> ConsensusResult<String> {
        if block_id_is_genesis(previous_block_id) {
            return Ok(NULL_BLOCK_IDENTIFIER.to_string());
        }
        let previous_block = block_cache.get_block(previous_block_id)?;
        Ok(Self::deserialize(&previous_block)
            .map(|certificate| certificate.identifier())
            .unwrap_or_else(|| NULL_BLOCK_IDENTIFIER.to_string()))
    }

    /// Check a certificate against the chain it claims to extend.
    ///
    /// `consensus_state` is the state as of the predecessor block.
    pub fn check_valid(
        certificate: &WaitCertificate,
        previous_certificate_id: &str,
        poet_public_key: &str,
        consensus_state: &ConsensusState,
        settings: &PoetSettings,
        enclave: &dyn PoetEnclave,
    ) -> ConsensusResult<()> {
        if certificate.duration < settings.minimum_wait_time {
            return Err(ConsensusError::InvalidCertificate(format!(
                "duration ({}) is less than minimum wait time ({})",
                certificate.duration, settings.minimum_wait_time
            )));
        }

        let expected_mean = consensus_state.compute_local_mean(settings);
        if (certificate.local_mean - expected_mean).abs() > LOCAL_MEAN_TOLERANCE {
            return Err(ConsensusError::InvalidCertificate(format!(
                "local mean ({}) does not match expected ({expected_mean})",
                certificate.local_mean
            )));
        }

        if certificate.previous_certificate_id != previous_certificate_id {
            return Err(ConsensusError::InvalidCertificate(format!(
                "previous certificate id ({}) does not match chain ({previous_certificate_id})",
                certificate.previous_certificate_id
            )));
        }

        enclave.verify_wait_certificate(certificate, poet_public_key)?;
        Ok(())
    }
}
