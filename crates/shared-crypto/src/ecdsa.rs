//! # ECDSA Signatures (secp256k1)
//!
//! ECDSA over secp256k1, with SHA-256 as the message digest.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization
//! - Constant-time operations
//!
//! ## Use Cases
//!
//! - PoET keypairs signing wait timers and wait certificates
//! - Enclave sealing key used as a deterministic randomness source
//! - Attestation verification report signing

use crate::CryptoError;
use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use zeroize::Zeroize;

fn decode_hex<const N: usize>(encoded: &str) -> Result<[u8; N], CryptoError> {
    let bytes = hex::decode(encoded).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKeyLength {
            expected: N,
            actual,
        })
}

/// Compressed secp256k1 public key (33 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Secp256k1PublicKey([u8; 33]);

impl Secp256k1PublicKey {
    /// Create from compressed bytes (33 bytes, starting with 0x02 or 0x03).
    pub fn from_bytes(bytes: [u8; 33]) -> Result<Self, CryptoError> {
        VerifyingKey::from_sec1_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Parse from a hex-encoded compressed key.
    pub fn from_hex(encoded: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(decode_hex::<33>(encoded)?)
    }

    /// Get raw compressed bytes.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    /// Lowercase hex encoding of the compressed key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Verify a signature.
    pub fn verify(
        &self,
        message: &[u8],
        signature: &Secp256k1Signature,
    ) -> Result<(), CryptoError> {
        let verifying_key =
            VerifyingKey::from_sec1_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;

        let sig = Signature::from_slice(&signature.0).map_err(|_| CryptoError::InvalidSignature)?;

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// ECDSA signature (64 bytes, r||s format).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secp256k1Signature([u8; 64]);

impl Secp256k1Signature {
    /// Create from bytes (64 bytes).
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Parse from a 128-character hex string.
    pub fn from_hex(encoded: &str) -> Result<Self, CryptoError> {
        decode_hex::<64>(encoded)
            .map(Self)
            .map_err(|_| CryptoError::InvalidSignature)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// secp256k1 ECDSA keypair.
#[derive(Clone)]
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Restore from a hex-encoded secret scalar.
    pub fn from_hex(encoded: &str) -> Result<Self, CryptoError> {
        let mut bytes = decode_hex::<32>(encoded).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let keypair = Self::from_bytes(bytes);
        bytes.zeroize();
        keypair
    }

    /// Get public key (compressed, 33 bytes).
    pub fn public_key(&self) -> Secp256k1PublicKey {
        let verifying_key = self.signing_key.verifying_key();
        let sec1_bytes = verifying_key.to_sec1_bytes();
        // SEC1 compressed public keys are always 33 bytes
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(&sec1_bytes[..33]);
        Secp256k1PublicKey(bytes)
    }

    /// Sign a message (deterministic RFC 6979).
    pub fn sign(&self, message: &[u8]) -> Secp256k1Signature {
        let sig: Signature = self.signing_key.sign(message);
        let bytes: [u8; 64] = sig.to_bytes().into();
        Secp256k1Signature(bytes)
    }

    /// Get secret key bytes (for serialization).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }

    /// Hex encoding of the secret scalar.
    pub fn to_hex(&self) -> String {
        let mut bytes = self.to_bytes();
        let encoded = hex::encode(bytes);
        bytes.zeroize();
        encoded
    }
}

impl std::fmt::Debug for Secp256k1KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secp256k1KeyPair")
            .field("public_key", &self.public_key().to_hex())
            .finish_non_exhaustive()
    }
}

impl Drop for Secp256k1KeyPair {
    fn drop(&mut self) {
        // Zeroize secret key material
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sign_verify() {
        let keypair = Secp256k1KeyPair::generate();
        let message = b"Hello, secp256k1!";

        let signature = keypair.sign(message);
        let result = keypair.public_key().verify(message, &signature);

        assert!(result.is_ok());
    }

    #[test]
    fn test_wrong_message_fails() {
        let keypair = Secp256k1KeyPair::generate();

        let signature = keypair.sign(b"message1");
        let result = keypair.public_key().verify(b"message2", &signature);

        assert_eq!(result, Err(CryptoError::SignatureVerificationFailed));
    }

    #[test]
    fn test_deterministic_signatures() {
        let keypair = Secp256k1KeyPair::from_bytes([0xABu8; 32]).unwrap();
        let message = b"deterministic test";

        let sig1 = keypair.sign(message);
        let sig2 = keypair.sign(message);

        assert_eq!(sig1.as_bytes(), sig2.as_bytes());
    }

    #[test]
    fn test_roundtrip_hex() {
        let original = Secp256k1KeyPair::generate();
        let restored = Secp256k1KeyPair::from_hex(&original.to_hex()).unwrap();
        assert_eq!(original.public_key(), restored.public_key());

        let public_key = Secp256k1PublicKey::from_hex(&original.public_key().to_hex()).unwrap();
        assert_eq!(public_key, original.public_key());
        assert_eq!(public_key.to_hex().len(), 66);
    }

    #[test]
    fn test_malformed_hex_rejected() {
        assert!(matches!(
            Secp256k1PublicKey::from_hex("zz"),
            Err(CryptoError::InvalidHex(_))
        ));
        assert!(matches!(
            Secp256k1PublicKey::from_hex("02ab"),
            Err(CryptoError::InvalidKeyLength {
                expected: 33,
                actual: 2
            })
        ));
        assert_eq!(
            Secp256k1Signature::from_hex("00"),
            Err(CryptoError::InvalidSignature)
        );
        assert!(Secp256k1KeyPair::from_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_signature_from_other_key_fails() {
        let signer = Secp256k1KeyPair::generate();
        let other = Secp256k1KeyPair::generate();
        let signature = signer.sign(b"payload");
        assert!(other.public_key().verify(b"payload", &signature).is_err());
    }

    proptest! {
        #[test]
        fn prop_signature_hex_roundtrip(message in proptest::collection::vec(any::<u8>(), 0..128)) {
            let keypair = Secp256k1KeyPair::from_bytes([0x42u8; 32]).unwrap();
            let signature = keypair.sign(&message);
            let decoded = Secp256k1Signature::from_hex(&signature.to_hex()).unwrap();
            prop_assert!(keypair.public_key().verify(&message, &decoded).is_ok());
        }
    }
}
