//! Validator admission policies
//!
//! | Check | Rejects when |
//! |-------|--------------|
//! | signup freshness | the registration was committed too many blocks after the head it names |
//! | C (claim delay) | fewer than `block_claim_delay` blocks since the registration committed |
//! | K (claim limit) | the current PoET key has claimed `key_block_claim_limit` blocks |
//! | Z (claim frequency) | a prefix of recent history shows more wins than the estimates allow |
//!
//! Every check is read-only over the consensus state.

use crate::config::PoetSettings;
use crate::domain::{
    block_id_is_genesis, block_id_to_nonce, ConsensusResult, ConsensusState, ErrorKind,
    PolicyViolation, ValidatorInfo,
};
use crate::estimate_cache::{EstimateInfo, PopulationEstimateCache};
use crate::ports::{BlockCache, BlockStore};
use tracing::{debug, info, warn};

/// Result of the progressive Z-test.
#[derive(Clone, Debug, PartialEq)]
pub enum ZTestOutcome {
    Passed {
        depth: usize,
        expected_wins: f64,
        observed_wins: u64,
    },
    Failed {
        depth: usize,
        z_score: f64,
        expected_wins: f64,
        observed_wins: u64,
    },
}

impl ZTestOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ZTestOutcome::Failed { .. })
    }
}

/// One-sample Z-test of `validator_id`'s wins over `estimates`, evaluated at
/// every prefix (most recent block first).
pub fn z_test(estimates: &[EstimateInfo], validator_id: &str, settings: &PoetSettings) -> ZTestOutcome {
    let mut observed_wins = 0u64;
    let mut expected_wins = 0.0;
    let mut depth = 0usize;

    for estimate in estimates {
        depth += 1;
        expected_wins += 1.0 / estimate.population_estimate;

        if estimate.validator_id != validator_id {
            continue;
        }
        observed_wins += 1;

        let observed = observed_wins as f64;
        if observed_wins > settings.ztest_minimum_win_count && observed > expected_wins {
            let probability = expected_wins / depth as f64;
            let standard_deviation = (depth as f64 * probability * (1.0 - probability)).sqrt();
            let z_score = (observed - expected_wins) / standard_deviation;
            if z_score > settings.ztest_maximum_win_deviation {
                return ZTestOutcome::Failed {
                    depth,
                    z_score,
                    expected_wins,
                    observed_wins,
                };
            }
        }
    }

    ZTestOutcome::Passed {
        depth,
        expected_wins,
        observed_wins,
    }
}

/// A validator's attempt to claim a block on top of `previous_block_id`.
#[derive(Clone, Debug)]
pub struct Claim<'a> {
    pub validator_info: &'a ValidatorInfo,
    pub block_number: u64,
    pub previous_block_id: &'a str,
    /// Population estimate of the candidate's own wait certificate or timer.
    pub population_estimate: f64,
    /// Registered validators as of the predecessor.
    pub validator_count: usize,
}

/// Admission checks over the consensus state as of the predecessor block.
pub struct ValidatorPolicyEngine<'a> {
    state: &'a ConsensusState,
    settings: &'a PoetSettings,
}

impl<'a> ValidatorPolicyEngine<'a> {
    pub fn new(state: &'a ConsensusState, settings: &'a PoetSettings) -> Self {
        Self { state, settings }
    }

    /// Run signup freshness, C, K and Z in order, stopping at the first
    /// violation.
    pub fn evaluate(
        &self,
        claim: &Claim<'_>,
        block_cache: &dyn BlockCache,
        block_store: &dyn BlockStore,
        estimate_cache: &PopulationEstimateCache,
    ) -> ConsensusResult<()> {
        let validator_info = claim.validator_info;

        if self.validator_signup_was_committed_too_late(validator_info, block_cache, block_store)? {
            return Err(PolicyViolation::SignupCommittedTooLate.into());
        }
        if self.validator_is_claiming_too_early(
            validator_info,
            claim.block_number,
            claim.validator_count,
            block_store,
        )? {
            return Err(PolicyViolation::ClaimingTooEarly.into());
        }
        if self.validator_has_claimed_block_limit(validator_info)? {
            return Err(PolicyViolation::ClaimLimitReached.into());
        }
        if self.validator_is_claiming_too_frequently(
            validator_info,
            claim.previous_block_id,
            claim.population_estimate,
            estimate_cache,
            block_cache,
        )? {
            return Err(PolicyViolation::ClaimingTooFrequently.into());
        }
        Ok(())
    }

    /// True if the registration was committed more than
    /// `signup_commit_maximum_delay` blocks after the head its nonce names.
    ///
    /// A registration whose committing block cannot be found is not judged.
    pub fn validator_signup_was_committed_too_late(
        &self,
        validator_info: &ValidatorInfo,
        block_cache: &dyn BlockCache,
        block_store: &dyn BlockStore,
    ) -> ConsensusResult<bool> {
        let mut block = match block_store.get_block_by_transaction_id(&validator_info.transaction_id)
        {
            Ok(block) => block,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(
                    validator = %validator_info.short_id(),
                    transaction_id = %validator_info.transaction_id,
                    "Signup transaction not found in any block"
                );
                return Ok(false);
            }
            Err(err) => return Err(err),
        };
        let commit_block_id = block.block_id.clone();
        let signup_nonce = validator_info.signup_info.nonce.as_str();

        for _ in 0..=self.settings.signup_commit_maximum_delay {
            let previous_block_id = block.header.previous_block_id.clone();
            if block_id_to_nonce(&previous_block_id) == signup_nonce {
                debug!(
                    validator = %validator_info.short_id(),
                    commit_block = %commit_block_id,
                    chain_head = %previous_block_id,
                    "Signup committed in time"
                );
                return Ok(false);
            }
            if block_id_is_genesis(&previous_block_id) {
                info!(
                    validator = %validator_info.short_id(),
                    commit_block = %commit_block_id,
                    signup_nonce,
                    "Hit start of chain looking for signup nonce"
                );
                return Ok(true);
            }
            block = block_cache.get_block(&previous_block_id)?;
        }

        info!(
            validator = %validator_info.short_id(),
            commit_block = %commit_block_id,
            signup_nonce,
            window = self.settings.signup_commit_maximum_delay + 1,
            "Signup nonce not found within commit window"
        );
        Ok(true)
    }

    /// True if a pending registration with `signup_nonce` can no longer
    /// commit in time on the chain ending at `chain_head_id`.
    pub fn signup_attempt_timed_out(
        &self,
        signup_nonce: &str,
        chain_head_id: &str,
        block_cache: &dyn BlockCache,
    ) -> ConsensusResult<bool> {
        let mut current_id = chain_head_id.to_string();
        for _ in 0..=self.settings.signup_commit_maximum_delay {
            if block_id_is_genesis(&current_id) {
                return Ok(false);
            }
            if block_id_to_nonce(&current_id) == signup_nonce {
                return Ok(false);
            }
            current_id = block_cache.get_block(&current_id)?.header.previous_block_id;
        }
        Ok(true)
    }

    /// C policy.
    pub fn validator_is_claiming_too_early(
        &self,
        validator_info: &ValidatorInfo,
        block_number: u64,
        validator_count: usize,
        block_store: &dyn BlockStore,
    ) -> ConsensusResult<bool> {
        let block_claim_delay = self
            .settings
            .block_claim_delay
            .min((validator_count as u64).saturating_sub(1));

        if self.state.total_block_claim_count() <= block_claim_delay {
            debug!(
                total_block_claim_count = self.state.total_block_claim_count(),
                block_claim_delay,
                validator_count,
                "Skipping block claim delay check"
            );
            return Ok(false);
        }

        let commit_block = block_store.get_block_by_transaction_id(&validator_info.transaction_id)?;
        let commit_block_num = commit_block.block_num();
        let blocks_claimed_since_registration = block_number.checked_sub(commit_block_num + 1);

        match blocks_claimed_since_registration {
            Some(since) if since >= block_claim_delay => {
                debug!(
                    validator = %validator_info.short_id(),
                    commit_block_num,
                    block_number,
                    "Claim delay satisfied"
                );
                Ok(false)
            }
            _ => {
                info!(
                    validator = %validator_info.short_id(),
                    commit_block_num,
                    block_number,
                    wait_until = commit_block_num + block_claim_delay + 1,
                    "Validator is claiming too early"
                );
                Ok(true)
            }
        }
    }

    /// K policy. A rotated key is always eligible.
    pub fn validator_has_claimed_block_limit(
        &self,
        validator_info: &ValidatorInfo,
    ) -> ConsensusResult<bool> {
        let limit = self.settings.key_block_claim_limit;
        let validator_state = self.state.get_validator_state(validator_info)?;

        if validator_state.poet_public_key() != validator_info.poet_public_key() {
            debug!(validator = %validator_info.short_id(), limit, "New PoET key, 0 blocks claimed");
            return Ok(false);
        }
        if validator_state.key_block_claim_count() >= limit {
            info!(
                validator = %validator_info.short_id(),
                claimed = validator_state.key_block_claim_count(),
                limit,
                "Reached block claim limit for PoET key"
            );
            return Ok(true);
        }
        Ok(false)
    }

    /// Z policy.
    pub fn validator_is_claiming_too_frequently(
        &self,
        validator_info: &ValidatorInfo,
        previous_block_id: &str,
        population_estimate: f64,
        estimate_cache: &PopulationEstimateCache,
        block_cache: &dyn BlockCache,
    ) -> ConsensusResult<bool> {
        let total = self.state.total_block_claim_count();
        let sample_size = self.settings.population_estimate_sample_size as u64;
        if total < sample_size {
            return Ok(false);
        }

        let history = estimate_cache.build_estimate_list(
            previous_block_id,
            (total - sample_size) as usize,
            self.settings,
            block_cache,
        )?;

        let mut estimates = Vec::with_capacity(history.len() + 1);
        estimates.push(EstimateInfo {
            population_estimate,
            previous_block_id: previous_block_id.to_string(),
            validator_id: validator_info.id.clone(),
        });
        estimates.extend(history);

        match z_test(&estimates, &validator_info.id, self.settings) {
            ZTestOutcome::Failed {
                depth,
                z_score,
                expected_wins,
                observed_wins,
            } => {
                info!(
                    validator = %validator_info.short_id(),
                    depth,
                    z_score,
                    expected_wins,
                    observed_wins,
                    "zTest failed"
                );
                Ok(true)
            }
            ZTestOutcome::Passed {
                depth,
                expected_wins,
                observed_wins,
            } => {
                debug!(
                    validator = %validator_info.short_id(),
                    depth,
                    expected_wins,
                    observed_wins,
                    "zTest succeeded"
                );
                Ok(false)
            }
        }
    }
}
