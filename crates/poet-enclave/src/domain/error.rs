//! Error types for the enclave simulator

use poet_attestation::AttestationError;
use shared_crypto::CryptoError;

/// Enclave error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnclaveError {
    #[error("Enclave must be initialized with a PoET key pair first")]
    NoPoetKey,

    #[error("There is not a current enclave active wait timer")]
    NoActiveTimer,

    #[error("Validator is not using the current wait timer")]
    TimerMismatch,

    #[error("Cannot create wait certificate because timer has not expired ({remaining:.3}s remaining)")]
    TimerNotExpired { remaining: f64 },

    #[error("Wait timer has timed out ({overdue:.3}s past the grace period)")]
    TimerTimedOut { overdue: f64 },

    #[error("Invalid wait timer parameter: {0}")]
    InvalidTimerParameter(String),

    #[error("Signup info failed verification: {0}")]
    InvalidSignupInfo(String),

    #[error("Wait certificate signature does not verify")]
    InvalidCertificateSignature,

    #[error("Malformed input: {0}")]
    Malformed(String),

    #[error("Attestation error: {0}")]
    Attestation(#[from] AttestationError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl EnclaveError {
    /// True for sequencing/misuse errors that retrying cannot fix.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            EnclaveError::NoPoetKey | EnclaveError::NoActiveTimer | EnclaveError::TimerMismatch
        )
    }
}

impl From<serde_json::Error> for EnclaveError {
    fn from(err: serde_json::Error) -> Self {
        EnclaveError::Malformed(err.to_string())
    }
}

impl From<base64::DecodeError> for EnclaveError {
    fn from(err: base64::DecodeError) -> Self {
        EnclaveError::Malformed(format!("invalid base64: {err}"))
    }
}

/// Result type for enclave operations
pub type EnclaveResult<T> = Result<T, EnclaveError>;
