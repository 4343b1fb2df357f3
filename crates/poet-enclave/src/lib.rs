//! # poet-enclave
//!
//! Simulated trusted timer source for Proof of Elapsed Time.
//!
//! ## Architecture
//!
//! ```text
//! create_signup_info ──→ EnclaveSignupInfo (registered on chain)
//!
//! create_wait_timer(previous_certificate_id, local_mean)
//!        │  duration = minimum_wait_time - local_mean * ln(u)
//!        ▼
//!   WaitTimer (single active timer per enclave)
//!        │  wait until request_time + duration
//!        ▼
//! create_wait_certificate(timer, block_hash)
//!        │  consumes the active timer
//!        ▼
//!   WaitCertificate ──→ block header consensus field
//! ```
//!
//! The [`PoetEnclave`] port is what consensus code programs against;
//! [`EnclaveSimulator`] is the only implementation here. It seals keys by
//! base64-encoding them and signs verification reports with a well-known
//! key, so it provides no security and exists for development networks and
//! tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use poet_enclave::{EnclaveConfig, EnclaveSimulator, PoetEnclave, NULL_IDENTIFIER};
//!
//! let enclave = EnclaveSimulator::new(EnclaveConfig::default())?;
//! let signup = enclave.create_signup_info(&originator_hash, NULL_IDENTIFIER)?;
//! let timer = enclave.create_wait_timer(&validator_id, NULL_IDENTIFIER, 20.0, 1.0)?;
//! // ... poll timer.has_expired(now) ...
//! let certificate = enclave.create_wait_certificate(&timer, &block_hash)?;
//! enclave.verify_wait_certificate(&certificate, &signup.poet_public_key)?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod simulator;

pub use adapters::ManualTimeSource;
pub use config::EnclaveConfig;
pub use domain::{
    uniform_variate, wait_duration, CertificateEnvelope, EnclaveError, EnclaveResult,
    EnclaveSignupInfo, EvidencePayload, ProofData, VerificationReport, WaitCertificate, WaitTimer,
    NULL_IDENTIFIER,
};
pub use ports::{PoetEnclave, SystemTimeSource, TimeSource};
pub use simulator::{expected_report_data, EnclaveSimulator};
