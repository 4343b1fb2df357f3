//! # Shared Crypto - Signing and Hashing Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Report data, nonces, certificate identifiers |
//! | `ecdsa` | secp256k1 | PoET keys, sealing key, report signing key |
//!
//! ## Encodings
//!
//! Keys and signatures cross crate boundaries as lowercase hex strings:
//! compressed SEC1 public keys (66 hex chars), raw 32-byte secret scalars
//! (64 hex chars) and compact `r || s` signatures (128 hex chars).
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, so signing the same
//!   message with the same key always yields the same signature. The enclave
//!   simulator depends on this to derive reproducible randomness.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature};
pub use errors::CryptoError;
pub use hashing::{sha256, sha256_hex, Hash, Sha256Hasher};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
