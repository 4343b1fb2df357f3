//! Wait timers: the lottery ticket a validator holds while waiting to claim
//! a block.

use super::error::EnclaveResult;
use serde::{Deserialize, Serialize};

/// A signed commitment to wait `duration` seconds from `request_time`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaitTimer {
    pub validator_address: String,
    pub request_time: f64,
    pub duration: f64,
    pub previous_certificate_id: String,
    pub local_mean: f64,
    /// Hex signature by the PoET key over [`WaitTimer::serialize`].
    pub signature: String,
}

/// Signed portion of a timer. Field order fixes the serialized form.
#[derive(Serialize)]
struct SignedFields<'a> {
    validator_address: &'a str,
    request_time: f64,
    duration: f64,
    previous_certificate_id: &'a str,
    local_mean: f64,
}

impl WaitTimer {
    /// Canonical JSON of every field except the signature.
    pub fn serialize(&self) -> EnclaveResult<String> {
        Ok(serde_json::to_string(&SignedFields {
            validator_address: &self.validator_address,
            request_time: self.request_time,
            duration: self.duration,
            previous_certificate_id: &self.previous_certificate_id,
            local_mean: self.local_mean,
        })?)
    }

    /// Estimated number of competing validators.
    pub fn population_estimate(&self, target_wait_time: f64) -> f64 {
        self.local_mean / target_wait_time
    }

    /// Wall-clock time at which the timer may be redeemed.
    pub fn expires_at(&self) -> f64 {
        self.request_time + self.duration
    }

    pub fn has_expired(&self, now: f64) -> bool {
        now >= self.expires_at()
    }
}
