//! Domain layer for the enclave simulator

mod error;
mod sampling;
mod signup;
mod wait_certificate;
mod wait_timer;

pub use error::*;
pub use sampling::*;
pub use signup::{EnclaveSignupInfo, EvidencePayload, ProofData, VerificationReport};
pub(crate) use signup::SealedSignupData;
pub use wait_certificate::*;
pub use wait_timer::*;
