//! Report body and report layouts.
//!
//! ```text
//! ReportBody (384 bytes)
//!   0   cpu_svn        16
//!   16  misc_select    u32
//!   20  reserved       28
//!   48  attributes     16
//!   64  mr_enclave     32
//!   96  reserved       32
//!   128 mr_signer      32
//!   160 reserved       96
//!   256 isv_prod_id    u16
//!   258 isv_svn        u16
//!   260 reserved       60
//!   320 report_data    64
//!
//! Report (432 bytes) = ReportBody || key_id (32) || mac (16)
//! ```

use crate::codec::{check_size, ByteReader, SgxStruct};
use crate::error::AttestationResult;
use crate::primitives::{Attributes, CpuSvn, KeyId, Measurement, ReportData};

const RESERVED1: usize = 28;
const RESERVED2: usize = 32;
const RESERVED3: usize = 96;
const RESERVED4: usize = 60;

/// Body of an enclave report.
///
/// The reserved gaps are kept so that a parsed buffer serializes back to
/// the identical bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportBody {
    pub cpu_svn: CpuSvn,
    pub misc_select: u32,
    pub(crate) reserved1: [u8; RESERVED1],
    pub attributes: Attributes,
    pub mr_enclave: Measurement,
    pub(crate) reserved2: [u8; RESERVED2],
    pub mr_signer: Measurement,
    pub(crate) reserved3: [u8; RESERVED3],
    pub isv_prod_id: u16,
    pub isv_svn: u16,
    pub(crate) reserved4: [u8; RESERVED4],
    pub report_data: ReportData,
}

impl ReportBody {
    /// Encoded size in bytes.
    pub const SIZE: usize = 384;

    /// Zeroed body carrying only an enclave measurement and report data.
    pub fn with_report_data(mr_enclave: Measurement, report_data: ReportData) -> Self {
        Self {
            mr_enclave,
            report_data,
            ..Self::default()
        }
    }

    /// Raw reserved bytes, in layout order.
    pub fn reserved(&self) -> [&[u8]; 4] {
        [
            &self.reserved1,
            &self.reserved2,
            &self.reserved3,
            &self.reserved4,
        ]
    }
}

impl Default for ReportBody {
    fn default() -> Self {
        Self {
            cpu_svn: CpuSvn::default(),
            misc_select: 0,
            reserved1: [0u8; RESERVED1],
            attributes: Attributes::default(),
            mr_enclave: Measurement::default(),
            reserved2: [0u8; RESERVED2],
            mr_signer: Measurement::default(),
            reserved3: [0u8; RESERVED3],
            isv_prod_id: 0,
            isv_svn: 0,
            reserved4: [0u8; RESERVED4],
            report_data: ReportData::default(),
        }
    }
}

impl SgxStruct for ReportBody {
    const NAME: &'static str = "ReportBody";

    fn parse_from_bytes(buffer: &[u8]) -> AttestationResult<Self> {
        check_size(Self::NAME, Self::SIZE, buffer)?;
        let mut reader = ByteReader::new(buffer);
        Ok(Self {
            cpu_svn: CpuSvn::new(reader.array()),
            misc_select: reader.u32(),
            reserved1: reader.array(),
            attributes: Attributes::parse_from_bytes(reader.bytes(Attributes::SIZE))?,
            mr_enclave: Measurement::new(reader.array()),
            reserved2: reader.array(),
            mr_signer: Measurement::new(reader.array()),
            reserved3: reader.array(),
            isv_prod_id: reader.u16(),
            isv_svn: reader.u16(),
            reserved4: reader.array(),
            report_data: ReportData::new(reader.array()),
        })
    }

    fn serialize_to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.extend_from_slice(&self.cpu_svn.svn);
        out.extend_from_slice(&self.misc_select.to_le_bytes());
        out.extend_from_slice(&self.reserved1);
        out.extend_from_slice(&self.attributes.serialize_to_bytes());
        out.extend_from_slice(&self.mr_enclave.m);
        out.extend_from_slice(&self.reserved2);
        out.extend_from_slice(&self.mr_signer.m);
        out.extend_from_slice(&self.reserved3);
        out.extend_from_slice(&self.isv_prod_id.to_le_bytes());
        out.extend_from_slice(&self.isv_svn.to_le_bytes());
        out.extend_from_slice(&self.reserved4);
        out.extend_from_slice(&self.report_data.d);
        out
    }
}

/// Enclave report: body plus the MAC over it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub body: ReportBody,
    pub key_id: KeyId,
    pub mac: [u8; 16],
}

impl Report {
    /// Encoded size in bytes.
    pub const SIZE: usize = ReportBody::SIZE + KeyId::SIZE + 16;
}

impl SgxStruct for Report {
    const NAME: &'static str = "Report";

    fn parse_from_bytes(buffer: &[u8]) -> AttestationResult<Self> {
        check_size(Self::NAME, Self::SIZE, buffer)?;
        let mut reader = ByteReader::new(buffer);
        Ok(Self {
            body: ReportBody::parse_from_bytes(reader.bytes(ReportBody::SIZE))?,
            key_id: KeyId::new(reader.array()),
            mac: reader.array(),
        })
    }

    fn serialize_to_bytes(&self) -> Vec<u8> {
        let mut out = self.body.serialize_to_bytes();
        out.extend_from_slice(&self.key_id.id);
        out.extend_from_slice(&self.mac);
        out
    }
}
