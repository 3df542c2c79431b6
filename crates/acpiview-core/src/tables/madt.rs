//! Multiple APIC Description Table (signature `APIC`).
//!
//! After the standard header and two fixed fields, the MADT is a packed
//! sequence of interrupt controller structures. Each one starts with a
//! type byte and a length byte, so the table is walked by peeking at that
//! prefix, checking the length, and then decoding the structure with the
//! descriptor list for its type.

use crate::console::Console;
use crate::context::ParseContext;
use crate::field::{dump_bytes, read_le, CaptureSlot, Captures, FieldDescriptor, PrintFormat};
use crate::parser::parse_record;
use tracing::{debug, trace};

/// Table signature
pub const SIGNATURE: [u8; 4] = *b"APIC";

/// Shortest valid interrupt controller structure: type, length, reserved
pub const MIN_STRUCTURE_LENGTH: usize = 4;

/// Header plus the two fixed MADT fields
const FIXED_LENGTH: usize = 44;

/// Bytes of the structure prefix read before the length is trusted
const STRUCTURE_PEEK_LENGTH: usize = 2;

const STRUCTURE_TYPE: CaptureSlot = CaptureSlot::new(0);
const STRUCTURE_LENGTH: CaptureSlot = CaptureSlot::new(1);

/// Standard header plus the MADT's fixed fields
pub const MADT_FIELDS: &[FieldDescriptor] = &crate::with_header_fields![
    FieldDescriptor::new("Local Interrupt Controller Address", 4, 36),
    FieldDescriptor::new("Flags", 4, 40),
];

/// Prefix shared by every interrupt controller structure
const STRUCTURE_HEADER_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::hidden(1, 0).capture(STRUCTURE_TYPE),
    FieldDescriptor::new("Length", 1, 1).capture(STRUCTURE_LENGTH),
    FieldDescriptor::new("Reserved", 2, 2),
];

/// GIC CPU Interface (GICC)
pub const GICC_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0),
    FieldDescriptor::new("Length", 1, 1).format(PrintFormat::Decimal),
    FieldDescriptor::new("Reserved", 2, 2),
    FieldDescriptor::new("CPU Interface Number", 4, 4),
    FieldDescriptor::new("ACPI Processor UID", 4, 8),
    FieldDescriptor::new("Flags", 4, 12),
    FieldDescriptor::new("Parking Protocol Version", 4, 16),
    FieldDescriptor::new("Performance Interrupt GSIV", 4, 20),
    FieldDescriptor::new("Parked Address", 8, 24),
    FieldDescriptor::new("Physical Base Address", 8, 32),
    FieldDescriptor::new("GICV", 8, 40),
    FieldDescriptor::new("GICH", 8, 48),
    FieldDescriptor::new("VGIC Maintenance interrupt", 4, 56),
    FieldDescriptor::new("GICR Base Address", 8, 60),
    FieldDescriptor::new("MPIDR", 8, 68),
    FieldDescriptor::new("Processor Power Efficiency Class", 1, 76),
    FieldDescriptor::new("Reserved", 3, 77).formatter(dump_bytes),
];

/// GIC Distributor (GICD)
pub const GICD_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0),
    FieldDescriptor::new("Length", 1, 1).format(PrintFormat::Decimal),
    FieldDescriptor::new("Reserved", 2, 2),
    FieldDescriptor::new("GIC ID", 4, 4),
    FieldDescriptor::new("Physical Base Address", 8, 8),
    FieldDescriptor::new("System Vector Base", 4, 16).validator(validate_system_vector_base),
    FieldDescriptor::new("GIC Version", 1, 20).format(PrintFormat::Decimal),
    FieldDescriptor::new("Reserved", 3, 21).formatter(dump_bytes),
];

/// GIC MSI Frame
pub const GIC_MSI_FRAME_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0),
    FieldDescriptor::new("Length", 1, 1).format(PrintFormat::Decimal),
    FieldDescriptor::new("Reserved", 2, 2),
    FieldDescriptor::new("MSI Frame ID", 4, 4),
    FieldDescriptor::new("Physical Base Address", 8, 8),
    FieldDescriptor::new("Flags", 4, 16),
    FieldDescriptor::new("SPI Count", 2, 20).format(PrintFormat::Decimal),
    FieldDescriptor::new("SPI Base", 2, 22),
];

/// GIC Redistributor (GICR)
pub const GICR_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0),
    FieldDescriptor::new("Length", 1, 1).format(PrintFormat::Decimal),
    FieldDescriptor::new("Reserved", 2, 2),
    FieldDescriptor::new("Discovery Range Base Address", 8, 4),
    FieldDescriptor::new("Discovery Range Length", 4, 12),
];

/// GIC Interrupt Translation Service (ITS)
pub const GIC_ITS_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0),
    FieldDescriptor::new("Length", 1, 1).format(PrintFormat::Decimal),
    FieldDescriptor::new("Reserved", 2, 2),
    FieldDescriptor::new("GIC ITS ID", 4, 4),
    FieldDescriptor::new("Physical Base Address", 8, 8),
    FieldDescriptor::new("Reserved", 4, 20),
];

fn validate_system_vector_base(bytes: &[u8], console: &mut dyn Console) {
    let value = read_le(bytes);
    if value != 0 {
        console.report_error(&format!(
            "System Vector Base must be zero, found 0x{:x}",
            value
        ));
    }
}

/// Interrupt controller structures this parser decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InterruptControllerType {
    /// GIC CPU Interface
    Gicc = 0x0B,
    /// GIC Distributor
    Gicd = 0x0C,
    /// GIC MSI Frame
    GicMsiFrame = 0x0D,
    /// GIC Redistributor
    Gicr = 0x0E,
    /// GIC Interrupt Translation Service
    GicIts = 0x0F,
}

impl TryFrom<u8> for InterruptControllerType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x0B => Ok(Self::Gicc),
            0x0C => Ok(Self::Gicd),
            0x0D => Ok(Self::GicMsiFrame),
            0x0E => Ok(Self::Gicr),
            0x0F => Ok(Self::GicIts),
            other => Err(other),
        }
    }
}

impl InterruptControllerType {
    /// Short name used as the trace label
    pub fn name(self) -> &'static str {
        match self {
            Self::Gicc => "GICC",
            Self::Gicd => "GICD",
            Self::GicMsiFrame => "GIC MSI Frame",
            Self::Gicr => "GICR",
            Self::GicIts => "GIC ITS",
        }
    }

    /// Field layout of the structure
    pub fn fields(self) -> &'static [FieldDescriptor] {
        match self {
            Self::Gicc => GICC_FIELDS,
            Self::Gicd => GICD_FIELDS,
            Self::GicMsiFrame => GIC_MSI_FRAME_FIELDS,
            Self::Gicr => GICR_FIELDS,
            Self::GicIts => GIC_ITS_FIELDS,
        }
    }
}

/// Parse the MADT and every interrupt controller structure in it.
///
/// A structure whose length is too short or runs past the end of the
/// table stops the walk: nothing after it can be located reliably. An
/// unrecognized structure type with a sound length is reported and
/// skipped. A declared length that overruns the buffer or cannot hold
/// the fixed fields is reported as well.
pub fn parse_table(
    ctx: &mut ParseContext<'_>,
    trace: bool,
    buffer: &[u8],
    declared_length: u32,
    _revision: u8,
) {
    let table_length = (declared_length as usize).min(buffer.len());
    let table = &buffer[..table_length];

    let mut captures = Captures::new();
    let mut offset = parse_record(
        ctx.console(),
        trace,
        Some("MADT"),
        table,
        table_length,
        MADT_FIELDS,
        &mut captures,
    );

    if declared_length as usize > buffer.len() {
        ctx.console().report_error(&format!(
            "MADT length {} exceeds the {} bytes available",
            declared_length,
            buffer.len()
        ));
    }
    if table_length < FIXED_LENGTH {
        ctx.console().report_error(&format!(
            "MADT length {} is shorter than its fixed fields ({} bytes)",
            table_length, FIXED_LENGTH
        ));
        return;
    }

    ctx.console().indent();
    while offset < table_length {
        let structure = &table[offset..];

        let mut prefix = Captures::new();
        parse_record(
            ctx.console(),
            false,
            None,
            structure,
            STRUCTURE_PEEK_LENGTH,
            STRUCTURE_HEADER_FIELDS,
            &mut prefix,
        );

        let (Some(kind), Some(length)) = (prefix.u8(STRUCTURE_TYPE), prefix.u8(STRUCTURE_LENGTH))
        else {
            ctx.console().report_error(&format!(
                "Truncated Interrupt Controller Structure at offset {}, {} bytes left",
                offset,
                structure.len()
            ));
            break;
        };

        let length = usize::from(length);
        if offset + length > table_length || length < MIN_STRUCTURE_LENGTH {
            ctx.console().report_error(&format!(
                "Invalid Interrupt Controller Length, Type = {}, Length = {}",
                kind, length
            ));
            break;
        }

        match InterruptControllerType::try_from(kind) {
            Ok(structure_type) => {
                trace!("{} at offset {}", structure_type.name(), offset);
                parse_record(
                    ctx.console(),
                    trace,
                    Some(structure_type.name()),
                    &structure[..length],
                    length,
                    structure_type.fields(),
                    &mut Captures::new(),
                );
            }
            Err(kind) => {
                debug!("Skipping unknown structure type {} at offset {}", kind, offset);
                ctx.console().report_error(&format!(
                    "Unknown Interrupt Controller Structure, Type = {}, Length = {}",
                    kind, length
                ));
            }
        }

        offset += length;
    }
    ctx.console().dedent();
}
