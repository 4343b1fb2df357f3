//! Integration flows across the attestation, enclave and consensus crates.

#[cfg(test)]
mod network;

pub mod election_rounds;
pub mod signup_flows;
