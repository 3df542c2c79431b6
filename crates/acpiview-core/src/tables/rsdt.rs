//! Root System Description Table (signature `RSDT`), the 32-bit
//! predecessor of the XSDT.

use crate::context::ParseContext;
use crate::tables::xsdt::parse_pointer_table;

/// Table signature
pub const SIGNATURE: [u8; 4] = *b"RSDT";

/// Size of one table pointer
pub const ENTRY_SIZE: usize = 4;

/// Parse the RSDT and process every table it points to
pub fn parse_table(
    ctx: &mut ParseContext<'_>,
    trace: bool,
    buffer: &[u8],
    _declared_length: u32,
    _revision: u8,
) {
    parse_pointer_table(ctx, trace, "RSDT", buffer, ENTRY_SIZE);
}
