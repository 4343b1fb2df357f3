//! Quote layout.
//!
//! ```text
//!   0   version                 u16
//!   2   sign_type               u16
//!   4   epid_group_id           4
//!   8   qe_svn                  u16
//!   10  pce_svn                 u16
//!   12  extended_epid_group_id  u32
//!   16  basename                32
//!   48  report_body             384
//!   432 signature_len           u32
//!   436 signature               signature_len
//! ```

use crate::codec::{check_size, ByteReader, SgxStruct};
use crate::error::{AttestationError, AttestationResult};
use crate::primitives::Basename;
use crate::report::ReportBody;

/// Attestation quote over an enclave report body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Quote {
    pub version: u16,
    pub sign_type: u16,
    pub epid_group_id: [u8; 4],
    pub qe_svn: u16,
    pub pce_svn: u16,
    pub extended_epid_group_id: u32,
    pub basename: Basename,
    pub report_body: ReportBody,
    /// Quote signature; its length is written as `signature_len`.
    ///
    /// The wire length is a `u32`, so at most `u32::MAX` bytes are encoded.
    pub signature: Vec<u8>,
}

impl Quote {
    /// Size of everything before `signature_len`.
    pub const FIXED_PREFIX_SIZE: usize = 48 + ReportBody::SIZE;

    /// Size of an unsigned quote.
    pub const MIN_SIZE: usize = Self::FIXED_PREFIX_SIZE + 4;

    /// Declared signature length.
    pub fn signature_len(&self) -> usize {
        self.signature.len()
    }
}

impl SgxStruct for Quote {
    const NAME: &'static str = "Quote";

    fn parse_from_bytes(buffer: &[u8]) -> AttestationResult<Self> {
        if buffer.len() < Self::MIN_SIZE {
            return Err(AttestationError::SizeMismatch {
                structure: Self::NAME,
                expected: Self::MIN_SIZE,
                actual: buffer.len(),
            });
        }

        let mut reader = ByteReader::new(buffer);
        let version = reader.u16();
        let sign_type = reader.u16();
        let epid_group_id = reader.array();
        let qe_svn = reader.u16();
        let pce_svn = reader.u16();
        let extended_epid_group_id = reader.u32();
        let basename = Basename::new(reader.array());
        let report_body = ReportBody::parse_from_bytes(reader.bytes(ReportBody::SIZE))?;
        let signature_len = reader.u32() as usize;

        let expected = Self::MIN_SIZE
            .checked_add(signature_len)
            .ok_or(AttestationError::SizeMismatch {
                structure: Self::NAME,
                expected: usize::MAX,
                actual: buffer.len(),
            })?;
        check_size(Self::NAME, expected, buffer)?;

        Ok(Self {
            version,
            sign_type,
            epid_group_id,
            qe_svn,
            pce_svn,
            extended_epid_group_id,
            basename,
            report_body,
            signature: reader.bytes(signature_len).to_vec(),
        })
    }

    fn serialize_to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::MIN_SIZE + self.signature.len());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.sign_type.to_le_bytes());
        out.extend_from_slice(&self.epid_group_id);
        out.extend_from_slice(&self.qe_svn.to_le_bytes());
        out.extend_from_slice(&self.pce_svn.to_le_bytes());
        out.extend_from_slice(&self.extended_epid_group_id.to_le_bytes());
        out.extend_from_slice(&self.basename.name);
        out.extend_from_slice(&self.report_body.serialize_to_bytes());
        let signature_len = encoded_signature_len(self.signature.len());
        out.extend_from_slice(&signature_len.to_le_bytes());
        out.extend_from_slice(&self.signature[..signature_len as usize]);
        out
    }
}

/// Length written for a signature of `len` bytes, capped at `u32::MAX`.
fn encoded_signature_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
