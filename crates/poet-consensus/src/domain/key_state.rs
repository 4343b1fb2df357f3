//! Locally held PoET key material.

use serde::{Deserialize, Serialize};

/// What the publisher remembers about one of its PoET keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoetKeyState {
    /// Enclave-sealed keypair (base64).
    pub sealed_signup_data: String,
    /// Set once the key hit its claim limit and a new registration was sent.
    pub has_been_refreshed: bool,
    /// Nonce the signup was created with.
    pub signup_nonce: String,
}
