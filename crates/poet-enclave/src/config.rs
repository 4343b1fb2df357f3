//! Configuration types for the enclave simulator

use crate::domain::{EnclaveError, EnclaveResult};
use serde::Deserialize;

/// Default window after expiry during which a timer can still be redeemed.
pub const DEFAULT_GRACE_PERIOD_SECS: f64 = 3.0;

/// Enclave measurement reported in simulated quotes.
pub const SIMULATOR_ENCLAVE_MEASUREMENT: [u8; 32] = [
    0xc9, 0x9f, 0x21, 0x95, 0x5e, 0x38, 0xdb, 0xb0, 0x3d, 0x2c, 0xa8, 0x38, 0xd3, 0xaf, 0x64, 0x15,
    0x44, 0x25, 0xd7, 0xdb, 0x82, 0x95, 0x84, 0x66, 0xa6, 0xc4, 0xdf, 0x1d, 0x43, 0x7a, 0xd5, 0x45,
];

/// Basename reported in simulated quotes.
pub const SIMULATOR_BASENAME: [u8; 32] = [
    0xb7, 0x85, 0xc5, 0x8b, 0x77, 0x15, 0x2c, 0xbe, 0x7f, 0xd5, 0x5e, 0xe3, 0x85, 0x1c, 0x49, 0x90,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Runtime configuration for the enclave simulator
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EnclaveConfig {
    /// Seconds after expiry a timer may still be redeemed (default: 3.0)
    pub grace_period: f64,

    /// Hex secret for the sealing key. Random per process when unset; set it
    /// only for reproducible simulations.
    pub sealing_key: Option<String>,
}

impl Default for EnclaveConfig {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD_SECS,
            sealing_key: None,
        }
    }
}

impl EnclaveConfig {
    pub fn validate(&self) -> EnclaveResult<()> {
        if !self.grace_period.is_finite() || self.grace_period < 0.0 {
            return Err(EnclaveError::Malformed(format!(
                "grace_period ({}) must be finite and non-negative",
                self.grace_period
            )));
        }
        Ok(())
    }
}
