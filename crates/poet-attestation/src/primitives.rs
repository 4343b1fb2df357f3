//! Leaf attestation fields: SVNs, measurements, key ids, basenames.

use crate::codec::{check_size, ByteReader, SgxStruct};
use crate::error::AttestationResult;

macro_rules! byte_array_struct {
    ($(#[$meta:meta])* $name:ident, $field:ident, $size:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name {
            pub $field: [u8; $size],
        }

        impl $name {
            /// Encoded size in bytes.
            pub const SIZE: usize = $size;

            /// Wrap raw bytes.
            pub fn new($field: [u8; $size]) -> Self {
                Self { $field }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self { $field: [0u8; $size] }
            }
        }

        impl SgxStruct for $name {
            const NAME: &'static str = stringify!($name);

            fn parse_from_bytes(buffer: &[u8]) -> AttestationResult<Self> {
                check_size(Self::NAME, Self::SIZE, buffer)?;
                Ok(Self {
                    $field: ByteReader::new(buffer).array(),
                })
            }

            fn serialize_to_bytes(&self) -> Vec<u8> {
                self.$field.to_vec()
            }
        }
    };
}

byte_array_struct!(
    /// Security version of the CPU.
    CpuSvn, svn, 16
);
byte_array_struct!(
    /// Enclave or signer measurement (SHA-256).
    Measurement, m, 32
);
byte_array_struct!(
    /// Caller-supplied data bound into a report.
    ReportData, d, 64
);
byte_array_struct!(
    /// Identifier of the key used to MAC a report.
    KeyId, id, 32
);
byte_array_struct!(
    /// Basename used for quote linkability.
    Basename, name, 32
);

/// Enclave attribute flags and XSAVE feature mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    pub flags: u64,
    pub xfrm: u64,
}

impl Attributes {
    /// Encoded size in bytes.
    pub const SIZE: usize = 16;
}

impl SgxStruct for Attributes {
    const NAME: &'static str = "Attributes";

    fn parse_from_bytes(buffer: &[u8]) -> AttestationResult<Self> {
        check_size(Self::NAME, Self::SIZE, buffer)?;
        let mut reader = ByteReader::new(buffer);
        Ok(Self {
            flags: reader.u64(),
            xfrm: reader.u64(),
        })
    }

    fn serialize_to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.xfrm.to_le_bytes());
        out
    }
}
