//! Attestation codec errors.

use thiserror::Error;

/// Errors raised while decoding attestation evidence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttestationError {
    /// The buffer length does not match the structure layout.
    #[error("{structure}: buffer size mismatch, expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Name of the structure being parsed
        structure: &'static str,
        /// Size required by the layout
        expected: usize,
        /// Size of the supplied buffer
        actual: usize,
    },

    /// The input was not a byte sequence (or an encoding of one).
    #[error("{structure}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Name of the structure being parsed
        structure: &'static str,
        /// What the codec accepts
        expected: &'static str,
        /// What was supplied
        found: String,
    },

    /// Base64 text could not be decoded.
    #[error("{structure}: invalid base64 encoding: {reason}")]
    InvalidEncoding {
        /// Name of the structure being parsed
        structure: &'static str,
        /// Decoder message
        reason: String,
    },
}

/// Result alias for the codec.
pub type AttestationResult<T> = Result<T, AttestationError>;
