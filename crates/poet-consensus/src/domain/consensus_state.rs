//! Consensus statistics as of one committed block.

use super::error::{ConsensusError, ConsensusResult};
use super::validator::{ValidatorInfo, ValidatorState};
use crate::config::PoetSettings;
use poet_enclave::WaitCertificate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use tracing::debug;

/// Duration and local mean of one claimed block's wait certificate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PopulationSample {
    duration: f64,
    local_mean: f64,
}

impl PopulationSample {
    pub fn new(duration: f64, local_mean: f64) -> ConsensusResult<Self> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(ConsensusError::MalformedInput(format!(
                "sample duration ({duration}) is invalid"
            )));
        }
        if !local_mean.is_finite() || local_mean < 0.0 {
            return Err(ConsensusError::MalformedInput(format!(
                "sample local_mean ({local_mean}) is invalid"
            )));
        }
        Ok(Self {
            duration,
            local_mean,
        })
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn local_mean(&self) -> f64 {
        self.local_mean
    }
}

/// Aggregate statistics for the PoET blocks since the last non-PoET block.
///
/// A fresh (all zero) state marks a reset point. Stored states are never
/// mutated; callers clone before applying the next claim.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConsensusState {
    aggregate_local_mean: f64,
    population_samples: VecDeque<PopulationSample>,
    total_block_claim_count: u64,
    validators: BTreeMap<String, ValidatorState>,
}

impl ConsensusState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of the local means of every claim since the last reset.
    pub fn aggregate_local_mean(&self) -> f64 {
        self.aggregate_local_mean
    }

    pub fn total_block_claim_count(&self) -> u64 {
        self.total_block_claim_count
    }

    /// Oldest first.
    pub fn population_samples(&self) -> impl Iterator<Item = &PopulationSample> {
        self.population_samples.iter()
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Stored state for the validator, or a zero state carrying its
    /// current PoET key.
    pub fn get_validator_state(
        &self,
        validator_info: &ValidatorInfo,
    ) -> ConsensusResult<ValidatorState> {
        match self.validators.get(&validator_info.id) {
            Some(state) => Ok(state.clone()),
            None => ValidatorState::new(0, validator_info.poet_public_key(), 0),
        }
    }

    /// Expected wait for the next timer.
    ///
    /// During bootstrap (fewer samples than the window) the mean slides from
    /// `target_wait_time` toward `initial_wait_time` quadratically. After
    /// that it is `target_wait_time` scaled by the population estimate.
    pub fn compute_local_mean(&self, settings: &PoetSettings) -> f64 {
        let sample_size = settings.population_estimate_sample_size;
        let count = self.population_samples.len();

        if count < sample_size {
            let ratio = count as f64 / sample_size as f64;
            let ratio_squared = ratio * ratio;
            return settings.target_wait_time * (1.0 - ratio_squared)
                + settings.initial_wait_time * ratio_squared;
        }

        match self.compute_population_estimate(settings) {
            Some(estimate) => settings.target_wait_time * estimate,
            None => settings.target_wait_time,
        }
    }

    /// Ratio of the summed local means to the summed waits above the floor
    /// over the most recent window of samples.
    fn compute_population_estimate(&self, settings: &PoetSettings) -> Option<f64> {
        let skip = self
            .population_samples
            .len()
            .saturating_sub(settings.population_estimate_sample_size);

        let (sum_waits, sum_means) = self
            .population_samples
            .iter()
            .skip(skip)
            .fold((0.0, 0.0), |(waits, means), sample| {
                (
                    waits + (sample.duration - settings.minimum_wait_time),
                    means + sample.local_mean,
                )
            });

        if sum_waits <= 0.0 || !sum_waits.is_finite() {
            return None;
        }
        Some(sum_means / sum_waits)
    }

    /// Apply one claimed block to the running statistics.
    ///
    /// Either every field is updated or, on error, none is.
    pub fn validator_did_claim_block(
        &mut self,
        validator_info: &ValidatorInfo,
        wait_certificate: &WaitCertificate,
        settings: &PoetSettings,
    ) -> ConsensusResult<()> {
        let sample = PopulationSample::new(wait_certificate.duration, wait_certificate.local_mean)?;
        let validator_state = self
            .get_validator_state(validator_info)?
            .after_claim(validator_info.poet_public_key())?;

        self.aggregate_local_mean += wait_certificate.local_mean;
        self.total_block_claim_count += 1;

        self.population_samples.push_back(sample);
        while self.population_samples.len() > settings.population_estimate_sample_size {
            self.population_samples.pop_front();
        }

        debug!(
            validator = %validator_info.short_id(),
            name = %validator_info.name,
            kbcc = validator_state.key_block_claim_count(),
            tbcc = validator_state.total_block_claim_count(),
            "Update validator state"
        );

        self.validators
            .insert(validator_info.id.clone(), validator_state);
        Ok(())
    }

    /// Binary form for the consensus state store.
    pub fn to_bytes(&self) -> ConsensusResult<Vec<u8>> {
        bincode::serialize(&PersistedConsensusState::from(self))
            .map_err(|e| ConsensusError::Storage(e.to_string()))
    }

    /// Parse and validate a stored state. Any violation fails as a whole.
    pub fn from_bytes(bytes: &[u8]) -> ConsensusResult<Self> {
        let persisted: PersistedConsensusState =
            bincode::deserialize(bytes).map_err(|e| ConsensusError::StateParse(e.to_string()))?;
        Self::try_from(persisted)
    }
}

impl fmt::Display for ConsensusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ALM={:.4}, TBCC={}, validators={}",
            self.aggregate_local_mean,
            self.total_block_claim_count,
            self.validators.len()
        )
    }
}

/// Wire layout of a stored state. Counts are signed so that corrupt
/// negative values are caught by validation instead of the decoder.
#[derive(Serialize, Deserialize)]
struct PersistedConsensusState {
    aggregate_local_mean: f64,
    population_samples: Vec<(f64, f64)>,
    total_block_claim_count: i64,
    validators: BTreeMap<String, PersistedValidatorState>,
}

#[derive(Serialize, Deserialize)]
struct PersistedValidatorState {
    key_block_claim_count: i64,
    poet_public_key: String,
    total_block_claim_count: i64,
}

impl From<&ConsensusState> for PersistedConsensusState {
    fn from(state: &ConsensusState) -> Self {
        Self {
            aggregate_local_mean: state.aggregate_local_mean,
            population_samples: state
                .population_samples
                .iter()
                .map(|sample| (sample.duration, sample.local_mean))
                .collect(),
            total_block_claim_count: state.total_block_claim_count as i64,
            validators: state
                .validators
                .iter()
                .map(|(id, validator)| {
                    (
                        id.clone(),
                        PersistedValidatorState {
                            key_block_claim_count: validator.key_block_claim_count() as i64,
                            poet_public_key: validator.poet_public_key().to_string(),
                            total_block_claim_count: validator.total_block_claim_count() as i64,
                        },
                    )
                })
                .collect(),
        }
    }
}

fn non_negative(value: i64, field: &str) -> ConsensusResult<u64> {
    u64::try_from(value)
        .map_err(|_| ConsensusError::StateParse(format!("{field} ({value}) is invalid")))
}

impl TryFrom<PersistedConsensusState> for ConsensusState {
    type Error = ConsensusError;

    fn try_from(persisted: PersistedConsensusState) -> ConsensusResult<Self> {
        let aggregate_local_mean = persisted.aggregate_local_mean;
        if !aggregate_local_mean.is_finite() || aggregate_local_mean < 0.0 {
            return Err(ConsensusError::StateParse(format!(
                "aggregate_local_mean ({aggregate_local_mean}) is invalid"
            )));
        }

        let total_block_claim_count =
            non_negative(persisted.total_block_claim_count, "total_block_claim_count")?;

        let population_samples = persisted
            .population_samples
            .into_iter()
            .map(|(duration, local_mean)| PopulationSample::new(duration, local_mean))
            .collect::<ConsensusResult<VecDeque<_>>>()
            .map_err(|e| ConsensusError::StateParse(e.to_string()))?;

        let mut validators = BTreeMap::new();
        for (id, validator) in persisted.validators {
            let state = ValidatorState::new(
                non_negative(validator.key_block_claim_count, "key_block_claim_count")?,
                validator.poet_public_key,
                non_negative(validator.total_block_claim_count, "total_block_claim_count")?,
            )
            .map_err(|e| ConsensusError::StateParse(e.to_string()))?;
            validators.insert(id, state);
        }

        Ok(Self {
            aggregate_local_mean,
            population_samples,
            total_block_claim_count,
            validators,
        })
    }
}
