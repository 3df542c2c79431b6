//! Declarative field descriptors.
//!
//! A [`FieldDescriptor`] says where a field lives inside a record and how
//! it should be shown; an ordered slice of them (a descriptor list)
//! describes one fixed-layout record type. Lists are plain `const` data:
//!
//! ```
//! use acpiview_core::field::{CaptureSlot, FieldDescriptor, PrintFormat};
//!
//! const KIND: CaptureSlot = CaptureSlot::new(0);
//!
//! const ENTRY_FIELDS: &[FieldDescriptor] = &[
//!     FieldDescriptor::new("Type", 1, 0).capture(KIND),
//!     FieldDescriptor::new("Length", 1, 1).format(PrintFormat::Decimal),
//!     FieldDescriptor::new("Base Address", 8, 4),
//! ];
//! # assert_eq!(ENTRY_FIELDS[2].end(), 12);
//! ```

use crate::console::Console;
use byteorder::{ByteOrder, LittleEndian};
use std::fmt::{self, Write as FmtWrite};

/// Maximum number of capture slots available to a single descriptor list
pub const MAX_CAPTURE_SLOTS: usize = 8;

/// Widest field the scalar formats can decode
pub const MAX_SCALAR_LENGTH: usize = 8;

/// Custom renderer for fields that are not plain integers
pub type FieldFormatter = fn(&mut dyn FmtWrite, &[u8]) -> fmt::Result;

/// Cross-field check run on the raw field bytes after they are read
pub type FieldValidator = fn(&[u8], &mut dyn Console);

/// How a scalar field is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintFormat {
    /// `0x1f`
    #[default]
    Hex,
    /// `31`
    Decimal,
}

impl PrintFormat {
    /// Render a decoded value
    pub fn render(self, value: u64) -> String {
        match self {
            PrintFormat::Hex => format!("0x{:x}", value),
            PrintFormat::Decimal => value.to_string(),
        }
    }
}

/// Index into a [`Captures`] table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSlot(usize);

impl CaptureSlot {
    /// Creates a slot; panics at compile time when used in a `const` with an
    /// out-of-range index.
    pub const fn new(index: usize) -> Self {
        assert!(index < MAX_CAPTURE_SLOTS, "capture slot out of range");
        Self(index)
    }

    /// Returns the slot index
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Describes how to read one field of a record
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Display label; `None` means the field is captured but never printed
    pub name: Option<&'static str>,
    /// Width in bytes
    pub length: usize,
    /// Offset from the start of the record
    pub offset: usize,
    /// Scalar format used when no formatter is set
    pub format: PrintFormat,
    /// Custom renderer for byte arrays
    pub formatter: Option<FieldFormatter>,
    /// Where to store the field's bytes
    pub capture: Option<CaptureSlot>,
    /// Check run after the field is read
    pub validator: Option<FieldValidator>,
}

impl FieldDescriptor {
    /// A named field, rendered as hex by default
    pub const fn new(name: &'static str, length: usize, offset: usize) -> Self {
        Self {
            name: Some(name),
            length,
            offset,
            format: PrintFormat::Hex,
            formatter: None,
            capture: None,
            validator: None,
        }
    }

    /// A field that is read but never printed
    pub const fn hidden(length: usize, offset: usize) -> Self {
        Self {
            name: None,
            length,
            offset,
            format: PrintFormat::Hex,
            formatter: None,
            capture: None,
            validator: None,
        }
    }

    /// Sets the scalar print format
    pub const fn format(mut self, format: PrintFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom renderer
    pub const fn formatter(mut self, formatter: FieldFormatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Stores the field bytes in `slot` when parsed
    pub const fn capture(mut self, slot: CaptureSlot) -> Self {
        self.capture = Some(slot);
        self
    }

    /// Runs `validator` on the field bytes when parsed
    pub const fn validator(mut self, validator: FieldValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// One past the last byte of the field
    pub const fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Render the field's value from its raw bytes
    pub fn render(&self, bytes: &[u8]) -> String {
        if let Some(formatter) = self.formatter {
            let mut out = String::new();
            if formatter(&mut out, bytes).is_ok() {
                return out;
            }
        }
        if bytes.len() > MAX_SCALAR_LENGTH {
            let mut out = String::new();
            // Writing to a String cannot fail
            let _ = dump_bytes(&mut out, bytes);
            return out;
        }
        self.format.render(read_le(bytes))
    }
}

/// Decode an unsigned little-endian integer of up to 8 bytes.
///
/// Bytes past the eighth are ignored.
pub fn read_le(bytes: &[u8]) -> u64 {
    let len = bytes.len().min(MAX_SCALAR_LENGTH);
    if len == 0 {
        return 0;
    }
    LittleEndian::read_uint(bytes, len)
}

/// Render bytes as ASCII characters, e.g. a table signature or OEM ID
pub fn dump_chars(out: &mut dyn FmtWrite, bytes: &[u8]) -> fmt::Result {
    for &b in bytes {
        let c = if b.is_ascii_graphic() || b == b' ' {
            b as char
        } else {
            '.'
        };
        out.write_char(c)?;
    }
    Ok(())
}

/// Render bytes as space-separated hex values, e.g. reserved padding
pub fn dump_bytes(out: &mut dyn FmtWrite, bytes: &[u8]) -> fmt::Result {
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.write_char(' ')?;
        }
        write!(out, "{:x}", b)?;
    }
    Ok(())
}

/// Field bytes captured during one [`parse_record`](crate::parser::parse_record) call.
///
/// Entries borrow from the parsed buffer, so they cannot outlive it. Use
/// the typed accessors to copy a value out before handing the buffer to a
/// nested parse.
#[derive(Debug, Default, Clone)]
pub struct Captures<'a> {
    slots: [Option<&'a [u8]>; MAX_CAPTURE_SLOTS],
}

impl<'a> Captures<'a> {
    /// Creates an empty capture table
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw bytes captured in `slot`
    pub fn get(&self, slot: CaptureSlot) -> Option<&'a [u8]> {
        self.slots[slot.index()]
    }

    pub(crate) fn set(&mut self, slot: CaptureSlot, bytes: Option<&'a [u8]>) {
        self.slots[slot.index()] = bytes;
    }

    /// Returns the first captured byte
    pub fn u8(&self, slot: CaptureSlot) -> Option<u8> {
        self.get(slot)?.first().copied()
    }

    /// Returns the captured field as a 32-bit value
    pub fn u32(&self, slot: CaptureSlot) -> Option<u32> {
        let bytes = self.get(slot)?;
        u32::try_from(read_le(bytes)).ok()
    }

    /// Returns the captured field as a 64-bit value
    pub fn u64(&self, slot: CaptureSlot) -> Option<u64> {
        self.get(slot).map(read_le)
    }

    /// Returns a captured 4-byte signature
    pub fn signature(&self, slot: CaptureSlot) -> Option<[u8; 4]> {
        self.get(slot)?.try_into().ok()
    }
}
