//! Shared codec plumbing: the `SgxStruct` trait and little-endian cursors.

use crate::error::{AttestationError, AttestationResult};
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use serde_json::Value;

/// A byte-exact attestation structure.
///
/// `parse_from_bytes(&x.serialize_to_bytes()) == Ok(x)` holds for every
/// implementor. Parsing never truncates or pads: a buffer of the wrong size
/// is rejected.
pub trait SgxStruct: Sized {
    /// Structure name used in error messages.
    const NAME: &'static str;

    /// Decode from raw little-endian bytes.
    fn parse_from_bytes(buffer: &[u8]) -> AttestationResult<Self>;

    /// Encode to raw little-endian bytes.
    fn serialize_to_bytes(&self) -> Vec<u8>;

    /// Decode from standard base64.
    fn parse_from_base64(encoded: &str) -> AttestationResult<Self> {
        let buffer = B64
            .decode(encoded)
            .map_err(|e| AttestationError::InvalidEncoding {
                structure: Self::NAME,
                reason: e.to_string(),
            })?;
        Self::parse_from_bytes(&buffer)
    }

    /// Encode to standard base64.
    fn serialize_to_base64(&self) -> String {
        B64.encode(self.serialize_to_bytes())
    }

    /// Decode from a JSON value holding a base64 string, as found in
    /// verification reports.
    fn parse_from_json(value: &Value) -> AttestationResult<Self> {
        match value {
            Value::String(encoded) => Self::parse_from_base64(encoded),
            other => Err(AttestationError::TypeMismatch {
                structure: Self::NAME,
                expected: "base64 string",
                found: json_type_name(other).to_string(),
            }),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fail with `SizeMismatch` unless `buffer` is exactly `expected` bytes.
pub(crate) fn check_size(
    structure: &'static str,
    expected: usize,
    buffer: &[u8],
) -> AttestationResult<()> {
    if buffer.len() != expected {
        return Err(AttestationError::SizeMismatch {
            structure,
            expected,
            actual: buffer.len(),
        });
    }
    Ok(())
}

/// Forward-only reader over a buffer whose length was already checked.
pub(crate) struct ByteReader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    pub(crate) fn bytes(&mut self, len: usize) -> &'a [u8] {
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        slice
    }

    pub(crate) fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N));
        out
    }

    pub(crate) fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.array())
    }

    pub(crate) fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.array())
    }

    pub(crate) fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.array())
    }
}
