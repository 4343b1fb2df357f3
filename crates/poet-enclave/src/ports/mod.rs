//! Ports for the enclave simulator
//!
//! - `inbound`: the enclave API consumed by consensus
//! - `outbound`: clock dependency

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
