//! Local block-publishing path.

use super::{consensus_state_for_block_id, ConsensusDependencies};
use crate::config::PoetSettings;
use crate::domain::{
    block_id_to_nonce, BlockHeader, ConsensusResult, ErrorKind, PoetKeyState, SignupInfo,
};
use crate::metrics;
use crate::policy::ValidatorPolicyEngine;
use crate::ports::{BlockPublisher, RegistrationSubmitter, StateView};
use crate::store::PoetKeyStateStore;
use crate::validation::CertificateValidator;
use base64::{engine::general_purpose::STANDARD, Engine};
use parking_lot::Mutex;
use poet_enclave::{SystemTimeSource, TimeSource, WaitTimer};
use shared_crypto::{sha256_hex, Sha256Hasher};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Sealed data recorded for a registered key this node no longer holds.
const UNKNOWN_SEALED_SIGNUP_DATA: &[u8] = b"No sealed signup data";

#[derive(Default)]
struct PublisherState {
    /// Predecessor of the candidate last seen by `initialize_block`.
    previous_block_id: Option<String>,
    wait_timer: Option<WaitTimer>,
}

/// Claims blocks for the local validator.
pub struct PoetBlockPublisher {
    deps: ConsensusDependencies,
    key_state_store: Arc<PoetKeyStateStore>,
    submitter: Arc<dyn RegistrationSubmitter>,
    state: Mutex<PublisherState>,
    time_source: Box<dyn TimeSource>,
}

impl PoetBlockPublisher {
    pub fn new(
        deps: ConsensusDependencies,
        key_state_store: Arc<PoetKeyStateStore>,
        submitter: Arc<dyn RegistrationSubmitter>,
    ) -> Self {
        Self {
            deps,
            key_state_store,
            submitter,
            state: Mutex::new(PublisherState::default()),
            time_source: Box::new(SystemTimeSource),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    /// The wait timer armed for the current candidate, if any.
    pub fn wait_timer(&self) -> Option<WaitTimer> {
        self.state.lock().wait_timer.clone()
    }

    fn chain_head_view(&self, header: &BlockHeader) -> ConsensusResult<Arc<dyn StateView>> {
        let chain_head = self.deps.block_cache.get_block(&header.previous_block_id)?;
        self.deps
            .state_view_factory
            .create_view(chain_head.state_root_hash())
    }

    /// Create a new PoET key and submit it to the validator registry.
    fn register_signup_information(&self, header: &BlockHeader) -> ConsensusResult<()> {
        let public_key_hash = sha256_hex(header.signer_public_key.as_bytes());
        let nonce = block_id_to_nonce(&header.previous_block_id).to_string();

        let signup = self
            .deps
            .enclave
            .create_signup_info(&public_key_hash, &nonce)?;

        self.submitter.submit_registration(
            &header.signer_public_key,
            &SignupInfo {
                poet_public_key: signup.poet_public_key.clone(),
                proof_data: signup.proof_data.clone(),
                anti_sybil_id: signup.anti_sybil_id.clone(),
                nonce: nonce.clone(),
            },
        )?;
        info!(
            validator_id = %header.signer_public_key,
            poet_public_key = %signup.poet_public_key,
            nonce = %nonce,
            "Registered validator signup information"
        );

        self.key_state_store.insert(
            &signup.poet_public_key,
            PoetKeyState {
                sealed_signup_data: signup.sealed_signup_data.clone(),
                has_been_refreshed: false,
                signup_nonce: nonce,
            },
        )?;
        self.key_state_store.set_active_key(&signup.poet_public_key)
    }

    /// Abandon a pending registration that can no longer commit in time.
    fn handle_registration_timeout(
        &self,
        header: &BlockHeader,
        settings: &PoetSettings,
        poet_public_key: &str,
    ) -> ConsensusResult<()> {
        let Some(key_state) = self.key_state_store.get(poet_public_key) else {
            warn!(poet_public_key, "Active PoET key has no key state, clearing it");
            self.key_state_store.clear_active_key();
            return Ok(());
        };

        let consensus_state = consensus_state_for_block_id(
            &header.previous_block_id,
            self.deps.block_cache.as_ref(),
            self.deps.state_view_factory.as_ref(),
            &self.deps.consensus_state_store,
        )?;
        let engine = ValidatorPolicyEngine::new(&consensus_state, settings);
        if engine.signup_attempt_timed_out(
            &key_state.signup_nonce,
            &header.previous_block_id,
            self.deps.block_cache.as_ref(),
        )? {
            error!(
                poet_public_key,
                chain_head = %header.previous_block_id,
                "Registration not committed in time, registering again"
            );
            self.key_state_store.remove(poet_public_key);
            self.register_signup_information(header)?;
        }
        Ok(())
    }

    fn compute_block_hash(header: &BlockHeader) -> String {
        let mut hasher = Sha256Hasher::new();
        hasher.update(header.previous_block_id.as_bytes());
        for batch_id in &header.batch_ids {
            hasher.update(batch_id.as_bytes());
        }
        hasher.finalize_hex()
    }
}

impl BlockPublisher for PoetBlockPublisher {
    #[tracing::instrument(skip(self, header), fields(previous_block_id = %header.previous_block_id))]
    fn initialize_block(&self, header: &BlockHeader) -> ConsensusResult<bool> {
        {
            let mut state = self.state.lock();
            if state.previous_block_id.as_deref() == Some(header.previous_block_id.as_str()) {
                return Ok(false);
            }
            state.previous_block_id = Some(header.previous_block_id.clone());
        }

        let view = self.chain_head_view(header)?;
        let settings = PoetSettings::from_state_view(view.as_ref());
        let registry = view.validator_registry();

        let validator_info = match registry.get_validator_info(&header.signer_public_key) {
            Ok(info) => Some(info),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => return Err(err),
        };
        let active_key = self.key_state_store.active_key();

        let Some(validator_info) = validator_info else {
            match active_key {
                None => {
                    debug!("No PoET key registered, signing up");
                    self.register_signup_information(header)?;
                }
                Some(key) => self.handle_registration_timeout(header, &settings, &key)?,
            }
            return Ok(false);
        };
        let poet_public_key = validator_info.poet_public_key().to_string();

        let Some(key_state) = self.key_state_store.get(&poet_public_key) else {
            debug!(%poet_public_key, "Registered PoET key not held locally, signing up again");
            self.register_signup_information(header)?;
            self.key_state_store.insert(
                &poet_public_key,
                PoetKeyState {
                    sealed_signup_data: STANDARD.encode(UNKNOWN_SEALED_SIGNUP_DATA),
                    has_been_refreshed: true,
                    signup_nonce: "unknown".to_string(),
                },
            )?;
            return Ok(false);
        };

        if key_state.has_been_refreshed {
            debug!(%poet_public_key, "PoET key refreshed, waiting for new key in registry");
            if let Some(pending) = active_key.filter(|key| *key != poet_public_key) {
                self.handle_registration_timeout(header, &settings, &pending)?;
            }
            return Ok(false);
        }

        if active_key.as_deref() != Some(poet_public_key.as_str()) {
            self.key_state_store.set_active_key(&poet_public_key)?;
        }

        match self
            .deps
            .enclave
            .unseal_signup_data(&key_state.sealed_signup_data)
        {
            Ok(unsealed) if unsealed == poet_public_key => {}
            Ok(unsealed) => {
                error!(%poet_public_key, %unsealed, "Sealed signup data holds a different key");
                self.key_state_store.clear_active_key();
                return Ok(false);
            }
            Err(err) => {
                error!(%poet_public_key, error = %err, "Could not unseal signup data");
                self.key_state_store.clear_active_key();
                return Ok(false);
            }
        }

        let consensus_state = consensus_state_for_block_id(
            &header.previous_block_id,
            self.deps.block_cache.as_ref(),
            self.deps.state_view_factory.as_ref(),
            &self.deps.consensus_state_store,
        )?;
        let engine = ValidatorPolicyEngine::new(&consensus_state, &settings);
        let block_cache = self.deps.block_cache.as_ref();
        let block_store = self.deps.block_store.as_ref();

        if engine.validator_signup_was_committed_too_late(&validator_info, block_cache, block_store)? {
            info!("Not building: signup information not committed in a timely manner");
            self.register_signup_information(header)?;
            return Ok(false);
        }

        if engine.validator_is_claiming_too_early(
            &validator_info,
            header.block_num,
            registry.validator_count(),
            block_store,
        )? {
            info!("Not building: not enough blocks since registration");
            return Ok(false);
        }

        if engine.validator_has_claimed_block_limit(&validator_info)? {
            info!(%poet_public_key, "Not building: block claim limit reached for PoET key");
            self.key_state_store.insert(
                &poet_public_key,
                PoetKeyState {
                    has_been_refreshed: true,
                    ..key_state.clone()
                },
            )?;
            self.deps
                .enclave
                .release_signup_data(&key_state.sealed_signup_data)?;
            self.register_signup_information(header)?;
            return Ok(false);
        }

        let previous_certificate_id =
            CertificateValidator::previous_certificate_id(&header.previous_block_id, block_cache)?;
        let wait_timer = self.deps.enclave.create_wait_timer(
            &header.signer_public_key,
            &previous_certificate_id,
            consensus_state.compute_local_mean(&settings),
            settings.minimum_wait_time,
        )?;

        if engine.validator_is_claiming_too_frequently(
            &validator_info,
            &header.previous_block_id,
            wait_timer.population_estimate(settings.target_wait_time),
            &self.deps.population_cache,
            block_cache,
        )? {
            info!("Not building: validator is claiming blocks too frequently");
            return Ok(false);
        }

        debug!(
            duration = wait_timer.duration,
            local_mean = wait_timer.local_mean,
            "Armed wait timer"
        );
        metrics::record_timer_armed();
        let mut state = self.state.lock();
        state.wait_timer = Some(wait_timer);
        state.previous_block_id = None;
        Ok(true)
    }

    fn check_publish_block(&self, _header: &BlockHeader) -> bool {
        let now = self.time_source.now();
        self.state
            .lock()
            .wait_timer
            .as_ref()
            .is_some_and(|timer| timer.has_expired(now))
    }

    #[tracing::instrument(skip(self, header), fields(previous_block_id = %header.previous_block_id))]
    fn finalize_block(&self, header: &mut BlockHeader) -> ConsensusResult<bool> {
        let mut state = self.state.lock();
        let Some(wait_timer) = state.wait_timer.as_ref() else {
            warn!("No wait timer armed for candidate block");
            return Ok(false);
        };

        let block_hash = Self::compute_block_hash(header);
        let certificate = match self
            .deps
            .enclave
            .create_wait_certificate(wait_timer, &block_hash)
        {
            Ok(certificate) => certificate,
            Err(err) => {
                error!(error = %err, "Failed to create wait certificate");
                return Ok(false);
            }
        };

        header.consensus = certificate.dump()?.to_bytes()?;
        state.wait_timer = None;
        metrics::record_certificate_created();
        debug!(id = %certificate.identifier(), %block_hash, "Created wait certificate");
        Ok(true)
    }
}
