//! Block validation path.

use super::{consensus_state_for_block_id, ConsensusDependencies};
use crate::config::PoetSettings;
use crate::domain::{
    block_id_is_genesis, Block, ConsensusError, ConsensusResult, ErrorKind,
};
use crate::metrics;
use crate::policy::{Claim, ValidatorPolicyEngine};
use crate::ports::BlockVerifier;
use crate::validation::CertificateValidator;
use tracing::{debug, info, warn};

/// Accepts or rejects blocks claimed by other validators.
pub struct PoetBlockVerifier {
    deps: ConsensusDependencies,
}

impl PoetBlockVerifier {
    pub fn new(deps: ConsensusDependencies) -> Self {
        Self { deps }
    }

    fn check_block(&self, block: &Block) -> ConsensusResult<()> {
        let deps = &self.deps;
        let certificate = CertificateValidator::deserialize(block).ok_or_else(|| {
            ConsensusError::MalformedInput(format!(
                "block {} does not carry a wait certificate",
                block.block_id
            ))
        })?;

        let previous_block_id = block.previous_block_id();
        let state_root = if block_id_is_genesis(previous_block_id) {
            block.state_root_hash().to_string()
        } else {
            deps.block_cache
                .get_block(previous_block_id)?
                .header
                .state_root_hash
        };
        let view = deps.state_view_factory.create_view(&state_root)?;
        let settings = PoetSettings::from_state_view(view.as_ref());
        let registry = view.validator_registry();
        let validator_info = registry.get_validator_info(block.signer_public_key())?;

        let consensus_state = consensus_state_for_block_id(
            previous_block_id,
            deps.block_cache.as_ref(),
            deps.state_view_factory.as_ref(),
            &deps.consensus_state_store,
        )?;

        let previous_certificate_id =
            CertificateValidator::previous_certificate_id(previous_block_id, deps.block_cache.as_ref())?;
        CertificateValidator::check_valid(
            &certificate,
            &previous_certificate_id,
            validator_info.poet_public_key(),
            &consensus_state,
            &settings,
            deps.enclave.as_ref(),
        )?;

        let claim = Claim {
            validator_info: &validator_info,
            block_number: block.block_num(),
            previous_block_id,
            population_estimate: certificate.population_estimate(settings.target_wait_time),
            validator_count: registry.validator_count(),
        };
        ValidatorPolicyEngine::new(&consensus_state, &settings).evaluate(
            &claim,
            deps.block_cache.as_ref(),
            deps.block_store.as_ref(),
            &deps.population_cache,
        )?;

        debug!(
            validator = %validator_info.short_id(),
            %consensus_state,
            "Block passed admission policies"
        );
        Ok(())
    }
}

impl BlockVerifier for PoetBlockVerifier {
    #[tracing::instrument(skip(self, block), fields(block_id = %block.block_id, block_num = block.block_num()))]
    fn verify_block(&self, block: &Block) -> ConsensusResult<()> {
        match self.check_block(block) {
            Ok(()) => {
                metrics::record_block_verified();
                info!("Block verified");
                Ok(())
            }
            Err(err) => {
                metrics::record_block_rejected(err.reason());
                if err.kind() == ErrorKind::Internal {
                    warn!(error = %err, "Block verification failed");
                } else {
                    info!(error = %err, reason = err.reason(), "Block rejected");
                }
                Err(err)
            }
        }
    }
}
