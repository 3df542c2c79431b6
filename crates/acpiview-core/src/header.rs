//! The standard ACPI description header.
//!
//! Every table starts with the same 36 bytes. [`HEADER_FIELDS`] describes
//! them for the record parser and captures the signature, length and
//! revision; table-specific descriptor lists extend it with
//! [`with_header_fields!`](crate::with_header_fields).

use crate::context::ParseContext;
use crate::error::{Error, Result};
use crate::field::{dump_chars, CaptureSlot, Captures, FieldDescriptor};
use crate::parser::parse_record;
use byteorder::{ByteOrder, LittleEndian};

/// Size of the standard description header
pub const HEADER_LENGTH: usize = 36;

/// Capture slot holding the 4-byte signature
pub const SIGNATURE: CaptureSlot = CaptureSlot::new(0);
/// Capture slot holding the declared table length
pub const LENGTH: CaptureSlot = CaptureSlot::new(1);
/// Capture slot holding the table revision
pub const REVISION: CaptureSlot = CaptureSlot::new(2);

/// Builds a descriptor array that starts with the standard header fields,
/// followed by any table-specific fields.
#[macro_export]
macro_rules! with_header_fields {
    ($($extra:expr),* $(,)?) => {
        [
            $crate::field::FieldDescriptor::new("Signature", 4, 0)
                .formatter($crate::field::dump_chars)
                .capture($crate::header::SIGNATURE),
            $crate::field::FieldDescriptor::new("Length", 4, 4)
                .format($crate::field::PrintFormat::Decimal)
                .capture($crate::header::LENGTH),
            $crate::field::FieldDescriptor::new("Revision", 1, 8)
                .format($crate::field::PrintFormat::Decimal)
                .capture($crate::header::REVISION),
            $crate::field::FieldDescriptor::new("Checksum", 1, 9),
            $crate::field::FieldDescriptor::new("Oem ID", 6, 10).formatter($crate::field::dump_chars),
            $crate::field::FieldDescriptor::new("Oem Table ID", 8, 16)
                .formatter($crate::field::dump_chars),
            $crate::field::FieldDescriptor::new("Oem Revision", 4, 24),
            $crate::field::FieldDescriptor::new("Creator ID", 4, 28)
                .formatter($crate::field::dump_chars),
            $crate::field::FieldDescriptor::new("Creator Revision", 4, 32)
            $(, $extra)*
        ]
    };
}

/// Descriptor list of the bare standard header
pub const HEADER_FIELDS: &[FieldDescriptor] = &with_header_fields![];

/// Decoded copy of a standard header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHeader {
    /// Table signature, e.g. `APIC`
    pub signature: [u8; 4],
    /// Declared length of the whole table
    pub length: u32,
    /// Table revision
    pub revision: u8,
    /// Byte that makes the table sum to zero
    pub checksum: u8,
    /// OEM identifier
    pub oem_id: [u8; 6],
    /// OEM table identifier
    pub oem_table_id: [u8; 8],
    /// OEM revision
    pub oem_revision: u32,
    /// Vendor ID of the table's creator
    pub creator_id: [u8; 4],
    /// Revision of the creator utility
    pub creator_revision: u32,
}

impl TableHeader {
    /// Decode the header at the start of `bytes`
    pub fn read(bytes: &[u8]) -> Result<Self> {
        let header = bytes.get(..HEADER_LENGTH).ok_or(Error::TableTooShort {
            len: bytes.len(),
            required: HEADER_LENGTH,
        })?;

        Ok(Self {
            signature: copy_array(&header[0..4]),
            length: LittleEndian::read_u32(&header[4..8]),
            revision: header[8],
            checksum: header[9],
            oem_id: copy_array(&header[10..16]),
            oem_table_id: copy_array(&header[16..24]),
            oem_revision: LittleEndian::read_u32(&header[24..28]),
            creator_id: copy_array(&header[28..32]),
            creator_revision: LittleEndian::read_u32(&header[32..36]),
        })
    }

    /// The signature as printable text
    pub fn signature_str(&self) -> String {
        signature_str(&self.signature)
    }
}

fn copy_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

/// Render signature bytes as text, replacing non-printable bytes with `.`
pub fn signature_str(signature: &[u8]) -> String {
    let mut out = String::with_capacity(signature.len());
    // Writing to a String cannot fail
    let _ = dump_chars(&mut out, signature);
    out
}

/// Parse a 4-character table signature such as `APIC`
pub fn parse_signature(input: &str) -> Result<[u8; 4]> {
    let bytes = input.as_bytes();
    if !bytes.iter().all(|b| b.is_ascii_graphic()) {
        return Err(Error::invalid_signature(input));
    }
    bytes
        .try_into()
        .map_err(|_| Error::invalid_signature(input))
}

/// Wrapping byte sum; a well-formed table sums to zero
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// Dump the header of a table that has no dedicated parser
pub fn parse_table(
    ctx: &mut ParseContext<'_>,
    trace: bool,
    buffer: &[u8],
    declared_length: u32,
    _revision: u8,
) {
    let mut captures = Captures::new();
    let max_length = (declared_length as usize).min(buffer.len());
    let label = buffer
        .get(..4)
        .map(signature_str)
        .unwrap_or_else(|| "Table".to_string());
    parse_record(
        ctx.console(),
        trace,
        Some(&label),
        buffer,
        max_length,
        HEADER_FIELDS,
        &mut captures,
    );
    if trace {
        ctx.console()
            .print(&format!("  Parser not implemented for {}", label));
    }
}
