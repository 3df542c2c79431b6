//! Extended System Description Table (signature `XSDT`).
//!
//! The XSDT body is a packed array of 64-bit table addresses. The same
//! walk serves the RSDT with 32-bit entries, see
//! [`parse_pointer_table`].

use crate::context::ParseContext;
use crate::field::{read_le, Captures};
use crate::header::{self, signature_str, HEADER_FIELDS};
use crate::memory::AddressSpace;
use crate::parser::parse_record;
use tracing::debug;

/// Table signature
pub const SIGNATURE: [u8; 4] = *b"XSDT";

/// Size of one table pointer
pub const ENTRY_SIZE: usize = 8;

/// Parse the XSDT and process every table it points to
pub fn parse_table(
    ctx: &mut ParseContext<'_>,
    trace: bool,
    buffer: &[u8],
    _declared_length: u32,
    _revision: u8,
) {
    parse_pointer_table(ctx, trace, "XSDT", buffer, ENTRY_SIZE);
}

/// Walk a table whose body is an array of `entry_size`-byte pointers.
///
/// The declared length comes from the table's own header. Entries are
/// listed first when tracing, and null entries are reported whether or
/// not tracing is on. Each non-null entry is then dispatched in order,
/// so entry `i` and everything nested under it is done before entry
/// `i + 1` starts. A trailing partial entry is ignored.
pub fn parse_pointer_table(
    ctx: &mut ParseContext<'_>,
    trace: bool,
    label: &str,
    buffer: &[u8],
    entry_size: usize,
) {
    let mut captures = Captures::new();
    let table_offset = parse_record(
        ctx.console(),
        trace,
        Some(label),
        buffer,
        buffer.len(),
        HEADER_FIELDS,
        &mut captures,
    );

    let Some(length) = captures.u32(header::LENGTH) else {
        ctx.console()
            .report_error(&format!("{} header is truncated", label));
        return;
    };
    let length = (length as usize).min(buffer.len());
    let entries = buffer.get(table_offset..length).unwrap_or_default();

    let base = ctx.current_table().unwrap_or(0);
    let memory = ctx.memory();
    for (index, entry) in entries.chunks_exact(entry_size).enumerate() {
        let pointer = read_le(entry);
        if trace {
            let name = entry_name(memory, index, pointer);
            ctx.console()
                .print_field(&name, &format!("0x{:x}", pointer));
        }
        if pointer == 0 {
            let entry_address = base.wrapping_add((table_offset + index * entry_size) as u64);
            ctx.console().report_error(&format!(
                "Invalid table entry at 0x{:x}, table address is 0x{:x}",
                entry_address, pointer
            ));
        }
    }

    for entry in entries.chunks_exact(entry_size) {
        let pointer = read_le(entry);
        if pointer != 0 {
            debug!("{} entry -> {:#x}", label, pointer);
            ctx.dispatch(pointer);
        }
    }
}

/// `Entry[i] - SIG` when the pointee's signature can be read
fn entry_name(memory: &dyn AddressSpace, index: usize, pointer: u64) -> String {
    if pointer == 0 {
        return format!("Entry[{}]", index);
    }
    match memory.read(pointer, 4) {
        Some(signature) => format!("Entry[{}] - {}", index, signature_str(signature)),
        None => format!("Entry[{}]", index),
    }
}
