//! Adapters for the enclave ports

mod manual_clock;

pub use manual_clock::ManualTimeSource;
