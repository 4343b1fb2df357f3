//! Inverse-transform sampling of wait durations.
//!
//! A wait duration is `minimum_wait_time - local_mean * ln(u)` with `u`
//! uniform on `(0, 1]`, i.e. an exponential variate with mean `local_mean`
//! shifted by the minimum wait. The uniform variate comes from the sealing
//! key's signature over the previous certificate id, so it is reproducible
//! for the enclave but unpredictable to anyone without the key.

use shared_crypto::Secp256k1Signature;

/// Map the low 64 bits of a signature onto `(0, 1]`.
pub fn uniform_variate(signature: &Secp256k1Signature) -> f64 {
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&signature.as_bytes()[56..64]);
    let raw = u64::from_le_bytes(tail);
    (raw as f64 / u64::MAX as f64).max(f64::MIN_POSITIVE)
}

/// Exponential wait duration floored at `minimum_wait_time`.
pub fn wait_duration(uniform: f64, local_mean: f64, minimum_wait_time: f64) -> f64 {
    minimum_wait_time - local_mean * uniform.ln()
}
