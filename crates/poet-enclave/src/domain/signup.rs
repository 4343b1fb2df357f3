//! Signup evidence produced when a validator registers a PoET key.

use super::error::{EnclaveError, EnclaveResult};
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Everything a validator registry needs to admit a new PoET key.
///
/// Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnclaveSignupInfo {
    /// Hex-encoded compressed PoET public key.
    pub poet_public_key: String,
    /// JSON-encoded [`ProofData`].
    pub proof_data: String,
    pub anti_sybil_id: String,
    /// Opaque blob restoring the PoET keypair inside the enclave.
    pub sealed_signup_data: String,
}

impl EnclaveSignupInfo {
    pub fn to_json(&self) -> EnclaveResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(serialized: &str) -> EnclaveResult<Self> {
        Ok(serde_json::from_str(serialized)?)
    }

    pub fn proof(&self) -> EnclaveResult<ProofData> {
        serde_json::from_str(&self.proof_data)
            .map_err(|e| EnclaveError::InvalidSignupInfo(format!("proof data is not valid JSON: {e}")))
    }
}

/// Attestation proof: the signed verification report plus evidence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofData {
    pub evidence_payload: EvidencePayload,
    /// JSON-encoded [`VerificationReport`]; signed byte-for-byte.
    pub verification_report: String,
    /// Base64 signature over `verification_report`.
    pub signature: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidencePayload {
    /// Base64 platform services manifest.
    pub pse_manifest: String,
}

/// Attestation verification report as issued by the attestation service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub epid_pseudonym: String,
    pub id: String,
    pub isv_enclave_quote_status: String,
    /// Base64 quote.
    pub isv_enclave_quote_body: String,
    pub pse_manifest_status: String,
    pub pse_manifest_hash: String,
    pub nonce: String,
    pub timestamp: String,
}

/// Stand-in for hardware sealing: the keypair, JSON-encoded then base64.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub(crate) struct SealedSignupData {
    pub poet_public_key: String,
    pub poet_private_key: String,
}

impl SealedSignupData {
    pub(crate) fn seal(&self) -> EnclaveResult<String> {
        Ok(B64.encode(serde_json::to_vec(self)?))
    }

    pub(crate) fn unseal(sealed: &str) -> EnclaveResult<Self> {
        let decoded = B64.decode(sealed)?;
        Ok(serde_json::from_slice(&decoded)?)
    }
}
