//! In-process stand-in for a trusted PoET enclave.
//!
//! Holds three keys:
//!
//! - a sealing keypair, fixed for the life of the process, whose
//!   deterministic signatures over previous certificate ids supply the
//!   randomness for wait durations;
//! - a report-signing keypair standing in for the attestation service;
//! - the validator's current PoET keypair, replaced on every signup.
//!
//! The PoET keypair and the single active wait timer live behind one mutex.

use crate::config::{EnclaveConfig, SIMULATOR_BASENAME, SIMULATOR_ENCLAVE_MEASUREMENT};
use crate::domain::{
    uniform_variate, wait_duration, EnclaveError, EnclaveResult, EnclaveSignupInfo,
    EvidencePayload, ProofData, SealedSignupData, VerificationReport, WaitCertificate, WaitTimer,
    NULL_IDENTIFIER,
};
use crate::ports::{PoetEnclave, SystemTimeSource, TimeSource};
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use parking_lot::Mutex;
use poet_attestation::{Basename, Measurement, Quote, ReportBody, ReportData, SgxStruct};
use serde_json::Value;
use shared_crypto::{
    sha256, sha256_hex, Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature, Sha256Hasher,
};
use tracing::{debug, info, warn};

const REPORT_KEY_LABEL: &[u8] = b"poet simulator verification report signing key";

#[derive(Default)]
struct EnclaveState {
    poet_keypair: Option<Secp256k1KeyPair>,
    active_timer: Option<WaitTimer>,
}

/// Simulated PoET enclave.
pub struct EnclaveSimulator {
    config: EnclaveConfig,
    sealing_keypair: Secp256k1KeyPair,
    report_keypair: Secp256k1KeyPair,
    state: Mutex<EnclaveState>,
    time_source: Box<dyn TimeSource>,
}

/// `SHA256(upper(originator_public_key_hash) || upper(poet_public_key))`,
/// zero-padded to the report data width.
pub fn expected_report_data(originator_public_key_hash: &str, poet_public_key: &str) -> ReportData {
    let mut hasher = Sha256Hasher::new();
    hasher
        .update(originator_public_key_hash.to_uppercase().as_bytes())
        .update(poet_public_key.to_uppercase().as_bytes());
    let mut d = [0u8; 64];
    d[..32].copy_from_slice(&hasher.finalize());
    ReportData::new(d)
}

fn report_field<'a>(report: &'a Value, key: &str) -> EnclaveResult<&'a str> {
    report.get(key).and_then(Value::as_str).ok_or_else(|| {
        EnclaveError::InvalidSignupInfo(format!("verification report does not contain {key}"))
    })
}

impl EnclaveSimulator {
    /// Create a simulator with a fresh (or configured) sealing key.
    pub fn new(config: EnclaveConfig) -> EnclaveResult<Self> {
        config.validate()?;

        let sealing_keypair = match &config.sealing_key {
            Some(secret) => Secp256k1KeyPair::from_hex(secret)?,
            None => Secp256k1KeyPair::generate(),
        };
        let report_keypair = Secp256k1KeyPair::from_bytes(sha256(REPORT_KEY_LABEL))?;

        Ok(Self {
            config,
            sealing_keypair,
            report_keypair,
            state: Mutex::new(EnclaveState::default()),
            time_source: Box::new(SystemTimeSource),
        })
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    /// Hex public key of the loaded PoET keypair, if any.
    pub fn poet_public_key(&self) -> Option<String> {
        self.state
            .lock()
            .poet_keypair
            .as_ref()
            .map(|keypair| keypair.public_key().to_hex())
    }

    /// The timer a certificate can currently be created from.
    pub fn active_timer(&self) -> Option<WaitTimer> {
        self.state.lock().active_timer.clone()
    }

    fn timestamp(&self, now: f64) -> String {
        let secs = now.trunc() as i64;
        let nanos = (now.fract() * 1e9) as u32;
        chrono::DateTime::from_timestamp(secs, nanos)
            .unwrap_or_default()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string()
    }

    fn build_quote(&self, report_data: ReportData) -> Quote {
        Quote {
            basename: Basename::new(SIMULATOR_BASENAME),
            report_body: ReportBody::with_report_data(
                Measurement::new(SIMULATOR_ENCLAVE_MEASUREMENT),
                report_data,
            ),
            ..Quote::default()
        }
    }
}

impl PoetEnclave for EnclaveSimulator {
    #[tracing::instrument(skip(self, most_recent_wait_certificate_id))]
    fn create_signup_info(
        &self,
        originator_public_key_hash: &str,
        most_recent_wait_certificate_id: &str,
    ) -> EnclaveResult<EnclaveSignupInfo> {
        let mut state = self.state.lock();

        let poet_keypair = Secp256k1KeyPair::generate();
        let poet_public_key = poet_keypair.public_key().to_hex();

        let quote = self.build_quote(expected_report_data(
            originator_public_key_hash,
            &poet_public_key,
        ));

        // The manifest is opaque to us; derive a stable one per originator
        let pse_manifest = sha256(originator_public_key_hash.as_bytes());
        let now = self.time_source.now();
        let timestamp = self.timestamp(now);

        let report = VerificationReport {
            epid_pseudonym: originator_public_key_hash.to_string(),
            id: sha256_hex(timestamp.as_bytes()),
            isv_enclave_quote_status: "OK".to_string(),
            isv_enclave_quote_body: quote.serialize_to_base64(),
            pse_manifest_status: "OK".to_string(),
            pse_manifest_hash: B64.encode(sha256(&pse_manifest)),
            nonce: most_recent_wait_certificate_id.to_string(),
            timestamp,
        };
        let verification_report = serde_json::to_string(&report)?;
        let signature = B64.encode(
            self.report_keypair
                .sign(verification_report.as_bytes())
                .as_bytes(),
        );

        let proof_data = serde_json::to_string(&ProofData {
            evidence_payload: EvidencePayload {
                pse_manifest: B64.encode(pse_manifest),
            },
            verification_report,
            signature,
        })?;

        let sealed_signup_data = SealedSignupData {
            poet_public_key: poet_public_key.clone(),
            poet_private_key: poet_keypair.to_hex(),
        }
        .seal()?;

        state.poet_keypair = Some(poet_keypair);
        state.active_timer = None;

        info!(poet_public_key = %poet_public_key, "created signup information");

        Ok(EnclaveSignupInfo {
            poet_public_key,
            proof_data,
            anti_sybil_id: originator_public_key_hash.to_string(),
            sealed_signup_data,
        })
    }

    fn unseal_signup_data(&self, sealed_signup_data: &str) -> EnclaveResult<String> {
        let mut state = self.state.lock();

        let sealed = SealedSignupData::unseal(sealed_signup_data)?;
        let keypair = Secp256k1KeyPair::from_hex(&sealed.poet_private_key)?;
        let public_key = keypair.public_key().to_hex();
        if public_key != sealed.poet_public_key {
            return Err(EnclaveError::Malformed(
                "sealed PoET public key does not match private key".to_string(),
            ));
        }

        state.poet_keypair = Some(keypair);
        state.active_timer = None;

        debug!(poet_public_key = %public_key, "unsealed signup data");
        Ok(public_key)
    }

    fn release_signup_data(&self, sealed_signup_data: &str) -> EnclaveResult<()> {
        let mut state = self.state.lock();

        let sealed = SealedSignupData::unseal(sealed_signup_data)?;
        let loaded = state
            .poet_keypair
            .as_ref()
            .map(|keypair| keypair.public_key().to_hex());
        if loaded.as_deref() == Some(sealed.poet_public_key.as_str()) {
            state.poet_keypair = None;
            state.active_timer = None;
            debug!(poet_public_key = %sealed.poet_public_key, "released signup data");
        }
        Ok(())
    }

    fn verify_signup_info(
        &self,
        signup_info: &EnclaveSignupInfo,
        originator_public_key_hash: &str,
        most_recent_wait_certificate_id: &str,
    ) -> EnclaveResult<()> {
        let proof = signup_info.proof()?;

        let signature_bytes: [u8; 64] = B64
            .decode(&proof.signature)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| {
                EnclaveError::InvalidSignupInfo("malformed report signature".to_string())
            })?;
        self.report_keypair
            .public_key()
            .verify(
                proof.verification_report.as_bytes(),
                &Secp256k1Signature::from_bytes(signature_bytes),
            )
            .map_err(|_| {
                EnclaveError::InvalidSignupInfo(
                    "verification report signature does not verify".to_string(),
                )
            })?;

        let report: Value = serde_json::from_str(&proof.verification_report).map_err(|e| {
            EnclaveError::InvalidSignupInfo(format!("verification report is not JSON: {e}"))
        })?;

        report_field(&report, "id")?;

        let epid_pseudonym = report_field(&report, "epidPseudonym")?;
        if epid_pseudonym != signup_info.anti_sybil_id {
            return Err(EnclaveError::InvalidSignupInfo(format!(
                "anti-Sybil ID ({}) does not match verification report EPID pseudonym ({epid_pseudonym})",
                signup_info.anti_sybil_id
            )));
        }

        let manifest_status = report_field(&report, "pseManifestStatus")?;
        if !manifest_status.eq_ignore_ascii_case("OK") {
            return Err(EnclaveError::InvalidSignupInfo(format!(
                "PSE manifest status is {manifest_status} (i.e., not OK)"
            )));
        }

        let manifest = B64.decode(&proof.evidence_payload.pse_manifest)?;
        let expected_manifest_hash = B64.encode(sha256(&manifest));
        let manifest_hash = report_field(&report, "pseManifestHash")?;
        if manifest_hash != expected_manifest_hash {
            return Err(EnclaveError::InvalidSignupInfo(format!(
                "PSE manifest hash {manifest_hash} does not match {expected_manifest_hash}"
            )));
        }

        let quote_status = report_field(&report, "isvEnclaveQuoteStatus")?;
        if !quote_status.eq_ignore_ascii_case("OK") {
            return Err(EnclaveError::InvalidSignupInfo(format!(
                "enclave quote status is {quote_status} (i.e., not OK)"
            )));
        }

        let quote_body = report.get("isvEnclaveQuoteBody").ok_or_else(|| {
            EnclaveError::InvalidSignupInfo(
                "verification report does not contain enclave quote body".to_string(),
            )
        })?;
        let quote = Quote::parse_from_json(quote_body)?;

        let expected = expected_report_data(originator_public_key_hash, &signup_info.poet_public_key);
        if quote.report_body.report_data != expected {
            return Err(EnclaveError::InvalidSignupInfo(
                "enclave quote report data does not match originator and PoET public key"
                    .to_string(),
            ));
        }

        // Registry transactions cannot see the most recent certificate id,
        // so a stale nonce is only reported.
        let nonce = report.get("nonce").and_then(Value::as_str).unwrap_or_default();
        if nonce != most_recent_wait_certificate_id {
            debug!(
                nonce,
                most_recent_wait_certificate_id, "verification report nonce is not the most recent certificate id"
            );
        }

        Ok(())
    }

    fn create_wait_timer(
        &self,
        validator_address: &str,
        previous_certificate_id: &str,
        local_mean: f64,
        minimum_wait_time: f64,
    ) -> EnclaveResult<WaitTimer> {
        let mut state = self.state.lock();

        let poet_keypair = state.poet_keypair.as_ref().ok_or(EnclaveError::NoPoetKey)?;

        if !local_mean.is_finite() || local_mean <= 0.0 {
            return Err(EnclaveError::InvalidTimerParameter(format!(
                "local mean ({local_mean}) must be a positive number"
            )));
        }
        if !minimum_wait_time.is_finite() || minimum_wait_time < 0.0 {
            return Err(EnclaveError::InvalidTimerParameter(format!(
                "minimum wait time ({minimum_wait_time}) must be a non-negative number"
            )));
        }

        let variate_signature = self.sealing_keypair.sign(previous_certificate_id.as_bytes());
        let duration = wait_duration(
            uniform_variate(&variate_signature),
            local_mean,
            minimum_wait_time,
        );

        let mut timer = WaitTimer {
            validator_address: validator_address.to_string(),
            request_time: self.time_source.now(),
            duration,
            previous_certificate_id: previous_certificate_id.to_string(),
            local_mean,
            signature: String::new(),
        };
        timer.signature = poet_keypair.sign(timer.serialize()?.as_bytes()).to_hex();

        debug!(
            previous_certificate_id,
            duration, local_mean, "created wait timer"
        );

        state.active_timer = Some(timer.clone());
        Ok(timer)
    }

    fn create_wait_certificate(
        &self,
        wait_timer: &WaitTimer,
        block_hash: &str,
    ) -> EnclaveResult<WaitCertificate> {
        let mut state = self.state.lock();

        let poet_keypair = state.poet_keypair.as_ref().ok_or(EnclaveError::NoPoetKey)?;
        let active_timer = state.active_timer.as_ref().ok_or(EnclaveError::NoActiveTimer)?;

        let resigned = poet_keypair.sign(wait_timer.serialize()?.as_bytes()).to_hex();
        if resigned != active_timer.signature {
            return Err(EnclaveError::TimerMismatch);
        }

        let now = self.time_source.now();
        let expires_at = active_timer.expires_at();
        if active_timer.previous_certificate_id != NULL_IDENTIFIER {
            if now < expires_at {
                return Err(EnclaveError::TimerNotExpired {
                    remaining: expires_at - now,
                });
            }
            let deadline = expires_at + self.config.grace_period;
            if now > deadline {
                warn!(overdue = now - deadline, "wait timer timed out");
                return Err(EnclaveError::TimerTimedOut {
                    overdue: now - deadline,
                });
            }
        }

        let mut hasher = Sha256Hasher::new();
        hasher
            .update(active_timer.signature.as_bytes())
            .update(now.to_string().as_bytes());

        let mut certificate = WaitCertificate {
            previous_certificate_id: active_timer.previous_certificate_id.clone(),
            local_mean: active_timer.local_mean,
            request_time: active_timer.request_time,
            duration: active_timer.duration,
            validator_address: active_timer.validator_address.clone(),
            nonce: hasher.finalize_hex(),
            block_hash: block_hash.to_string(),
            signature: String::new(),
        };
        certificate.signature = poet_keypair
            .sign(certificate.serialize()?.as_bytes())
            .to_hex();

        state.active_timer = None;

        debug!(block_hash, id = %certificate.identifier(), "created wait certificate");
        Ok(certificate)
    }

    fn verify_wait_certificate(
        &self,
        certificate: &WaitCertificate,
        poet_public_key: &str,
    ) -> EnclaveResult<()> {
        let public_key = Secp256k1PublicKey::from_hex(poet_public_key)?;
        let signature = Secp256k1Signature::from_hex(&certificate.signature)
            .map_err(|_| EnclaveError::InvalidCertificateSignature)?;
        public_key
            .verify(certificate.serialize()?.as_bytes(), &signature)
            .map_err(|_| EnclaveError::InvalidCertificateSignature)
    }

    fn report_public_key(&self) -> String {
        self.report_keypair.public_key().to_hex()
    }
}
