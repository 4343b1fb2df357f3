//! Driving port: the PoET enclave API.

use crate::domain::{EnclaveResult, EnclaveSignupInfo, WaitCertificate, WaitTimer};

/// Trusted timer source.
///
/// Operations that touch the PoET keypair or the active timer are mutually
/// exclusive. The `verify_*` operations only read public keys and never
/// contend with them.
pub trait PoetEnclave: Send + Sync {
    /// Generate a fresh PoET keypair and the attestation evidence binding it
    /// to `originator_public_key_hash`.
    ///
    /// Replaces the current PoET keypair and discards any active timer.
    fn create_signup_info(
        &self,
        originator_public_key_hash: &str,
        most_recent_wait_certificate_id: &str,
    ) -> EnclaveResult<EnclaveSignupInfo>;

    /// Restore a keypair sealed by `create_signup_info`, returning its
    /// public key. Discards any active timer.
    fn unseal_signup_data(&self, sealed_signup_data: &str) -> EnclaveResult<String>;

    /// Forget the loaded keypair if it is the one sealed in the blob.
    fn release_signup_data(&self, sealed_signup_data: &str) -> EnclaveResult<()>;

    /// Check the attestation evidence in `signup_info`.
    fn verify_signup_info(
        &self,
        signup_info: &EnclaveSignupInfo,
        originator_public_key_hash: &str,
        most_recent_wait_certificate_id: &str,
    ) -> EnclaveResult<()>;

    /// Draw a new wait timer. Replaces the active timer.
    fn create_wait_timer(
        &self,
        validator_address: &str,
        previous_certificate_id: &str,
        local_mean: f64,
        minimum_wait_time: f64,
    ) -> EnclaveResult<WaitTimer>;

    /// Redeem the active timer for a certificate over `block_hash`.
    ///
    /// On failure the active timer is left in place.
    fn create_wait_certificate(
        &self,
        wait_timer: &WaitTimer,
        block_hash: &str,
    ) -> EnclaveResult<WaitCertificate>;

    /// Verify a certificate's signature against a PoET public key.
    fn verify_wait_certificate(
        &self,
        certificate: &WaitCertificate,
        poet_public_key: &str,
    ) -> EnclaveResult<()>;

    /// Hex public key that signs verification reports.
    fn report_public_key(&self) -> String;
}
