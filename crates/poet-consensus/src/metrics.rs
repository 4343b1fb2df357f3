//! # PoET Consensus Metrics
//!
//! Enable with the `metrics` feature:
//! ```toml
//! poet-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `poet_blocks_verified_total` - Blocks accepted by the verifier
//! - `poet_blocks_rejected_total` - Blocks rejected, by reason
//! - `poet_wait_certificates_created_total` - Certificates written by the publisher
//! - `poet_wait_timers_armed_total` - Wait timers armed by the publisher

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref BLOCKS_VERIFIED: IntCounter = register_int_counter!(
        "poet_blocks_verified_total",
        "Total number of PoET blocks accepted"
    )
    .expect("Failed to create BLOCKS_VERIFIED metric");

    pub static ref BLOCKS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "poet_blocks_rejected_total",
        "Total number of PoET blocks rejected",
        &["reason"]
    )
    .expect("Failed to create BLOCKS_REJECTED metric");

    pub static ref CERTIFICATES_CREATED: IntCounter = register_int_counter!(
        "poet_wait_certificates_created_total",
        "Total number of wait certificates created"
    )
    .expect("Failed to create CERTIFICATES_CREATED metric");

    pub static ref TIMERS_ARMED: IntCounter = register_int_counter!(
        "poet_wait_timers_armed_total",
        "Total number of wait timers armed for a candidate block"
    )
    .expect("Failed to create TIMERS_ARMED metric");
}

#[cfg(feature = "metrics")]
pub fn record_block_verified() {
    BLOCKS_VERIFIED.inc();
}

/// Record a rejected block with reason
#[cfg(feature = "metrics")]
pub fn record_block_rejected(reason: &str) {
    BLOCKS_REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_certificate_created() {
    CERTIFICATES_CREATED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_timer_armed() {
    TIMERS_ARMED.inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_block_verified() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_certificate_created() {}

#[cfg(not(feature = "metrics"))]
pub fn record_timer_armed() {}
