//! Wait certificates and their block-header envelope.

use super::error::{EnclaveError, EnclaveResult};
use serde::{Deserialize, Serialize};
use shared_crypto::sha256_hex;

/// Previous-certificate id used by the first PoET block after genesis.
pub const NULL_IDENTIFIER: &str = "0000000000000000";

/// Proof that a wait timer ran to completion.
#[derive(Clone, Debug, PartialEq)]
pub struct WaitCertificate {
    pub previous_certificate_id: String,
    pub local_mean: f64,
    pub request_time: f64,
    pub duration: f64,
    pub validator_address: String,
    pub nonce: String,
    pub block_hash: String,
    /// Hex signature by the PoET key over [`WaitCertificate::serialize`].
    pub signature: String,
}

/// Field order fixes the serialized form.
#[derive(Serialize, Deserialize)]
struct SignedFields {
    previous_certificate_id: String,
    local_mean: f64,
    request_time: f64,
    duration: f64,
    validator_address: String,
    nonce: String,
    block_hash: String,
}

impl WaitCertificate {
    /// Canonical JSON of every field except the signature.
    pub fn serialize(&self) -> EnclaveResult<String> {
        Ok(serde_json::to_string(&SignedFields {
            previous_certificate_id: self.previous_certificate_id.clone(),
            local_mean: self.local_mean,
            request_time: self.request_time,
            duration: self.duration,
            validator_address: self.validator_address.clone(),
            nonce: self.nonce.clone(),
            block_hash: self.block_hash.clone(),
        })?)
    }

    /// Rebuild a certificate from its serialized form and signature.
    ///
    /// The signature is attached but not checked; see
    /// `PoetEnclave::verify_wait_certificate`.
    pub fn deserialize(serialized: &str, signature: &str) -> EnclaveResult<Self> {
        let fields: SignedFields = serde_json::from_str(serialized)?;
        for (name, value) in [
            ("local_mean", fields.local_mean),
            ("request_time", fields.request_time),
            ("duration", fields.duration),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EnclaveError::Malformed(format!(
                    "wait certificate {name} ({value}) is invalid"
                )));
            }
        }
        if signature.is_empty() {
            return Err(EnclaveError::Malformed(
                "wait certificate signature is empty".to_string(),
            ));
        }

        Ok(Self {
            previous_certificate_id: fields.previous_certificate_id,
            local_mean: fields.local_mean,
            request_time: fields.request_time,
            duration: fields.duration,
            validator_address: fields.validator_address,
            nonce: fields.nonce,
            block_hash: fields.block_hash,
            signature: signature.to_string(),
        })
    }

    /// Short id chained into the next timer as `previous_certificate_id`.
    pub fn identifier(&self) -> String {
        let mut digest = sha256_hex(self.signature.as_bytes());
        digest.truncate(16);
        digest
    }

    pub fn population_estimate(&self, target_wait_time: f64) -> f64 {
        self.local_mean / target_wait_time
    }

    /// Wrap into the JSON object stored in a block's consensus field.
    pub fn dump(&self) -> EnclaveResult<CertificateEnvelope> {
        Ok(CertificateEnvelope {
            serialized_certificate: self.serialize()?,
            signature: self.signature.clone(),
        })
    }

    /// Inverse of [`WaitCertificate::dump`].
    pub fn from_envelope(envelope: &CertificateEnvelope) -> EnclaveResult<Self> {
        Self::deserialize(&envelope.serialized_certificate, &envelope.signature)
    }
}

/// Consensus-field encoding of a wait certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateEnvelope {
    #[serde(rename = "SerializedCertificate")]
    pub serialized_certificate: String,
    #[serde(rename = "Signature")]
    pub signature: String,
}

impl CertificateEnvelope {
    pub fn to_bytes(&self) -> EnclaveResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> EnclaveResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
