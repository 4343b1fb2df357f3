//! Chain walk that rebuilds consensus state.

use crate::config::PoetSettings;
use crate::domain::{
    block_id_is_genesis, ConsensusResult, ConsensusState, ErrorKind, ValidatorInfo,
};
use crate::ports::{BlockCache, StateViewFactory};
use crate::store::ConsensusStateStore;
use crate::validation::CertificateValidator;
use poet_enclave::WaitCertificate;
use tracing::{debug, warn};

enum WalkEntry {
    Claim {
        block_id: String,
        certificate: WaitCertificate,
        validator_info: ValidatorInfo,
        settings: PoetSettings,
    },
    /// A non-PoET block: statistics restart from zero.
    Reset,
}

/// Consensus state as of `block_id`.
///
/// Walks back until genesis, a missing block, or a block whose state is
/// already stored, then replays the visited blocks oldest first, storing
/// the state reached at every PoET block.
#[tracing::instrument(skip(block_cache, state_view_factory, consensus_state_store))]
pub fn consensus_state_for_block_id(
    block_id: &str,
    block_cache: &dyn BlockCache,
    state_view_factory: &dyn StateViewFactory,
    consensus_state_store: &ConsensusStateStore,
) -> ConsensusResult<ConsensusState> {
    let mut entries = Vec::new();
    let mut stored_state = None;
    let mut newer_block_was_poet = false;
    let mut current_id = block_id.to_string();

    while !block_id_is_genesis(&current_id) {
        let block = match block_cache.get_block(&current_id) {
            Ok(block) => block,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(block_id = %current_id, "Chain walk stopped at missing block");
                break;
            }
            Err(err) => return Err(err),
        };

        if let Some(state) = consensus_state_store.get(&current_id)? {
            stored_state = Some(state);
            break;
        }

        match CertificateValidator::deserialize(&block) {
            Some(certificate) => {
                let view = state_view_factory.create_view(block.state_root_hash())?;
                let validator_info = view
                    .validator_registry()
                    .get_validator_info(block.signer_public_key())?;
                debug!(block_id = %current_id, "Consensus state needed for block");
                entries.push(WalkEntry::Claim {
                    block_id: current_id.clone(),
                    certificate,
                    validator_info,
                    settings: PoetSettings::from_state_view(view.as_ref()),
                });
                newer_block_was_poet = true;
            }
            None => {
                if entries.is_empty() || newer_block_was_poet {
                    entries.push(WalkEntry::Reset);
                }
                newer_block_was_poet = false;
            }
        }

        current_id = block.header.previous_block_id;
    }

    let mut state = stored_state.unwrap_or_default();
    for entry in entries.into_iter().rev() {
        match entry {
            WalkEntry::Reset => state = ConsensusState::new(),
            WalkEntry::Claim {
                block_id,
                certificate,
                validator_info,
                settings,
            } => {
                state.validator_did_claim_block(&validator_info, &certificate, &settings)?;
                consensus_state_store.put(&block_id, &state)?;
                debug!(block_id = %block_id, %state, "Created consensus state");
            }
        }
    }

    Ok(state)
}
