//! The record parser: applies a descriptor list to a byte buffer.

use crate::console::Console;
use crate::field::{Captures, FieldDescriptor};
use tracing::trace;

/// Parse one record described by `fields`.
///
/// Descriptors are processed in list order. Each field's bytes are stored
/// in its capture slot and handed to its validator whether or not
/// `trace` is set; `trace` only controls printing. A field is printed
/// when it has a name and lies entirely within `max_length`.
///
/// Fields may deliberately reach past `max_length` to peek at a fixed
/// prefix before the record's real size is known. A field that reaches
/// past the end of `buffer` itself cannot be read: its capture slot is
/// cleared and it is neither printed nor validated.
///
/// Returns the largest `offset + length` over all descriptors.
pub fn parse_record<'a>(
    console: &mut dyn Console,
    trace: bool,
    label: Option<&str>,
    buffer: &'a [u8],
    max_length: usize,
    fields: &[FieldDescriptor],
    captures: &mut Captures<'a>,
) -> usize {
    if trace {
        if let Some(label) = label {
            console.print_heading(label);
        }
    }

    let mut consumed = 0;
    for field in fields {
        let end = field.end();
        consumed = consumed.max(end);

        let Some(bytes) = buffer.get(field.offset..end) else {
            trace!(
                "Field {:?} at {}..{} is outside the {}-byte buffer",
                field.name,
                field.offset,
                end,
                buffer.len()
            );
            if let Some(slot) = field.capture {
                captures.set(slot, None);
            }
            continue;
        };

        if let Some(slot) = field.capture {
            captures.set(slot, Some(bytes));
        }

        if trace && end <= max_length {
            if let Some(name) = field.name {
                console.print_field(name, &field.render(bytes));
            }
        }

        if let Some(validate) = field.validator {
            validate(bytes, console);
        }
    }

    consumed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::BufferConsole;
    use crate::field::{dump_chars, CaptureSlot, PrintFormat};

    const KIND: CaptureSlot = CaptureSlot::new(0);
    const LENGTH: CaptureSlot = CaptureSlot::new(1);
    const NAME: CaptureSlot = CaptureSlot::new(2);

    fn reject_nonzero(bytes: &[u8], console: &mut dyn Console) {
        if bytes.iter().any(|&b| b != 0) {
            console.report_error("value must be zero");
        }
    }

    // Display order deliberately differs from offset order.
    const FIELDS: &[FieldDescriptor] = &[
        FieldDescriptor::new("Name", 4, 8).formatter(dump_chars).capture(NAME),
        FieldDescriptor::hidden(1, 0).capture(KIND),
        FieldDescriptor::new("Length", 2, 1)
            .format(PrintFormat::Decimal)
            .capture(LENGTH),
        FieldDescriptor::new("Must Be Zero", 1, 3).validator(reject_nonzero),
    ];

    fn sample() -> Vec<u8> {
        let mut data = vec![0x0B, 12, 0, 0, 0xAA, 0xBB, 0xCC, 0xDD];
        data.extend_from_slice(b"GICC");
        data
    }

    #[test]
    fn test_consumed_is_max_end_not_sum() {
        let data = sample();
        let mut console = BufferConsole::new();
        let mut captures = Captures::new();
        let consumed = parse_record(
            &mut console,
            false,
            None,
            &data,
            data.len(),
            FIELDS,
            &mut captures,
        );
        assert_eq!(consumed, 12);
    }

    #[test]
    fn test_captures_point_into_buffer() {
        let data = sample();
        let mut console = BufferConsole::new();
        let mut captures = Captures::new();
        parse_record(&mut console, false, None, &data, data.len(), FIELDS, &mut captures);

        let name = captures.get(NAME).unwrap();
        assert_eq!(name.as_ptr(), data[8..].as_ptr());
        assert_eq!(name, b"GICC");
        assert_eq!(captures.u8(KIND), Some(0x0B));
        assert_eq!(captures.u32(LENGTH), Some(12));
    }

    #[test]
    fn test_trace_prints_in_list_order() {
        let data = sample();
        let mut console = BufferConsole::new();
        let mut captures = Captures::new();
        parse_record(
            &mut console,
            true,
            Some("Entry"),
            &data,
            data.len(),
            FIELDS,
            &mut captures,
        );

        assert_eq!(console.lines.len(), 4);
        assert!(console.lines[0].starts_with("Entry"));
        assert!(console.lines[1].contains("Name") && console.lines[1].ends_with(": GICC"));
        assert!(console.lines[2].contains("Length") && console.lines[2].ends_with(": 12"));
        assert!(console.lines[3].contains("Must Be Zero"));
    }

    #[test]
    fn test_trace_does_not_change_side_effects() {
        let mut data = sample();
        data[3] = 1;

        let mut quiet = BufferConsole::new();
        let mut quiet_captures = Captures::new();
        let quiet_consumed = parse_record(
            &mut quiet,
            false,
            Some("Entry"),
            &data,
            data.len(),
            FIELDS,
            &mut quiet_captures,
        );

        let mut loud = BufferConsole::new();
        let mut loud_captures = Captures::new();
        let loud_consumed = parse_record(
            &mut loud,
            true,
            Some("Entry"),
            &data,
            data.len(),
            FIELDS,
            &mut loud_captures,
        );

        assert_eq!(quiet_consumed, loud_consumed);
        assert_eq!(quiet.error_count(), 1);
        assert_eq!(loud.error_count(), 1);
        assert_eq!(quiet.lines, vec!["ERROR: value must be zero"]);
        assert_eq!(quiet_captures.get(NAME), loud_captures.get(NAME));
        assert_eq!(quiet_captures.u32(LENGTH), loud_captures.u32(LENGTH));
    }

    #[test]
    fn test_max_length_gates_printing_only() {
        let data = sample();
        let mut console = BufferConsole::new();
        let mut captures = Captures::new();
        // Peek with a 3-byte budget: only Length fits.
        parse_record(&mut console, true, None, &data, 3, FIELDS, &mut captures);

        assert_eq!(console.lines.len(), 1);
        assert!(console.lines[0].contains("Length"));
        assert_eq!(captures.get(NAME), Some(&b"GICC"[..]));
    }

    #[test]
    fn test_field_past_buffer_is_cleared() {
        let data = sample();
        let mut console = BufferConsole::new();
        let mut captures = Captures::new();
        parse_record(&mut console, false, None, &data, data.len(), FIELDS, &mut captures);
        assert!(captures.get(NAME).is_some());

        let short = &data[..4];
        let consumed = parse_record(&mut console, true, None, short, 12, FIELDS, &mut captures);
        assert_eq!(consumed, 12);
        assert_eq!(captures.get(NAME), None);
        assert_eq!(captures.u8(KIND), Some(0x0B));
        assert_eq!(console.count_lines("Name"), 0);
    }
}
