//! Error types for PoET consensus

use poet_enclave::EnclaveError;
use std::fmt;

/// Admission policy a validator failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyViolation {
    /// Registration was committed too many blocks after it was submitted.
    SignupCommittedTooLate,
    /// Fewer than `block_claim_delay` blocks since registration (C policy).
    ClaimingTooEarly,
    /// The current PoET key has claimed `key_block_claim_limit` blocks (K policy).
    ClaimLimitReached,
    /// Winning more often than the population estimate predicts (Z policy).
    ClaimingTooFrequently,
}

impl PolicyViolation {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            PolicyViolation::SignupCommittedTooLate => "signup_committed_too_late",
            PolicyViolation::ClaimingTooEarly => "claiming_too_early",
            PolicyViolation::ClaimLimitReached => "claim_limit_reached",
            PolicyViolation::ClaimingTooFrequently => "claiming_too_frequently",
        }
    }
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            PolicyViolation::SignupCommittedTooLate => {
                "validator signup information not committed in a timely manner"
            }
            PolicyViolation::ClaimingTooEarly => {
                "validator has not waited long enough since registering"
            }
            PolicyViolation::ClaimLimitReached => {
                "validator has reached the maximum number of blocks with its key pair"
            }
            PolicyViolation::ClaimingTooFrequently => "validator is claiming blocks too frequently",
        };
        f.write_str(message)
    }
}

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A collaborator did not have the requested block, validator or state.
    NotFound,
    /// The candidate block or claim is not acceptable.
    PolicyRejected,
    /// Bytes, JSON or encodings could not be decoded.
    MalformedInput,
    /// Sequencing or storage failure on our side.
    Internal,
}

/// Consensus error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsensusError {
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("No block contains transaction: {0}")]
    TransactionNotFound(String),

    #[error("Validator not found in registry: {0}")]
    ValidatorNotFound(String),

    #[error("State root not found: {0}")]
    StateRootNotFound(String),

    #[error("Block rejected: {0}")]
    PolicyRejected(PolicyViolation),

    #[error("Invalid wait certificate: {0}")]
    InvalidCertificate(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Error parsing ConsensusState buffer: {0}")]
    StateParse(String),

    #[error("Invalid validator state: {0}")]
    InvalidValidatorState(String),

    #[error("Invalid PoET key state: {0}")]
    InvalidKeyState(String),

    #[error("Enclave error: {0}")]
    Enclave(#[from] EnclaveError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ConsensusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConsensusError::BlockNotFound(_)
            | ConsensusError::TransactionNotFound(_)
            | ConsensusError::ValidatorNotFound(_)
            | ConsensusError::StateRootNotFound(_) => ErrorKind::NotFound,
            ConsensusError::PolicyRejected(_) | ConsensusError::InvalidCertificate(_) => {
                ErrorKind::PolicyRejected
            }
            ConsensusError::MalformedInput(_)
            | ConsensusError::StateParse(_)
            | ConsensusError::InvalidValidatorState(_)
            | ConsensusError::InvalidKeyState(_) => ErrorKind::MalformedInput,
            ConsensusError::Enclave(err) => match err {
                EnclaveError::TimerNotExpired { .. }
                | EnclaveError::TimerTimedOut { .. }
                | EnclaveError::InvalidCertificateSignature => ErrorKind::PolicyRejected,
                EnclaveError::NoPoetKey
                | EnclaveError::NoActiveTimer
                | EnclaveError::TimerMismatch
                | EnclaveError::InvalidTimerParameter(_) => ErrorKind::Internal,
                _ => ErrorKind::MalformedInput,
            },
            ConsensusError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Label used when counting rejected blocks.
    pub fn reason(&self) -> &'static str {
        match self {
            ConsensusError::PolicyRejected(violation) => violation.reason(),
            ConsensusError::InvalidCertificate(_) => "invalid_certificate",
            other => match other.kind() {
                ErrorKind::NotFound => "not_found",
                ErrorKind::MalformedInput => "malformed",
                ErrorKind::PolicyRejected => "enclave_rejected",
                ErrorKind::Internal => "internal",
            },
        }
    }
}

impl From<PolicyViolation> for ConsensusError {
    fn from(violation: PolicyViolation) -> Self {
        ConsensusError::PolicyRejected(violation)
    }
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_distinct() {
        assert_eq!(
            ConsensusError::BlockNotFound("b".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ConsensusError::from(PolicyViolation::ClaimLimitReached).kind(),
            ErrorKind::PolicyRejected
        );
        assert_eq!(
            ConsensusError::StateParse("x".into()).kind(),
            ErrorKind::MalformedInput
        );
        assert_eq!(
            ConsensusError::from(EnclaveError::NoActiveTimer).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            ConsensusError::from(EnclaveError::TimerTimedOut { overdue: 1.0 }).kind(),
            ErrorKind::PolicyRejected
        );
    }

    #[test]
    fn test_state_parse_message() {
        let err = ConsensusError::StateParse("bad".into());
        assert_eq!(err.to_string(), "Error parsing ConsensusState buffer: bad");
    }

    #[test]
    fn test_rejection_reasons() {
        assert_eq!(
            ConsensusError::from(PolicyViolation::ClaimingTooFrequently).reason(),
            "claiming_too_frequently"
        );
        assert_eq!(
            ConsensusError::ValidatorNotFound("v".into()).reason(),
            "not_found"
        );
    }
}
