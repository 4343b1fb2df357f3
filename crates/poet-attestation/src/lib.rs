//! # poet-attestation
//!
//! Codec for the fixed-layout attestation evidence carried in PoET signup
//! information.
//!
//! ## Structures
//!
//! | Type | Size |
//! |------|------|
//! | [`CpuSvn`] | 16 |
//! | [`Attributes`] | 16 |
//! | [`Measurement`] | 32 |
//! | [`ReportData`] | 64 |
//! | [`KeyId`] | 32 |
//! | [`Basename`] | 32 |
//! | [`ReportBody`] | 384 |
//! | [`Report`] | 432 |
//! | [`Quote`] | 436 + `signature_len` |
//!
//! All integers are little-endian. The codec is pure: it never allocates
//! global state, never logs, and rejects any buffer whose length disagrees
//! with the layout instead of truncating it. Quotes travel base64-encoded
//! inside the JSON verification report, so every structure can also be
//! decoded from base64 text or a JSON string value.
//!
//! ## Usage
//!
//! ```rust
//! use poet_attestation::{Quote, SgxStruct};
//!
//! let quote = Quote::default();
//! let encoded = quote.serialize_to_base64();
//! assert_eq!(Quote::parse_from_base64(&encoded).unwrap(), quote);
//! ```

pub mod codec;
pub mod error;
pub mod primitives;
pub mod quote;
pub mod report;

pub use codec::SgxStruct;
pub use error::{AttestationError, AttestationResult};
pub use primitives::{Attributes, Basename, CpuSvn, KeyId, Measurement, ReportData};
pub use quote::Quote;
pub use report::{Report, ReportBody};
