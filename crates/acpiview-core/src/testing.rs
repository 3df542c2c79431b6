//! Builders for synthetic tables used across the unit tests.

use crate::console::Console;
use crate::context::{ParseContext, TableProcessor};
use crate::header::HEADER_LENGTH;
use crate::memory::MemoryMap;
use std::cell::RefCell;

/// Assembles a table with a valid header and checksum
pub(crate) struct TableBuilder {
    signature: [u8; 4],
    revision: u8,
    body: Vec<u8>,
    length: Option<u32>,
    corrupt_checksum: bool,
}

impl TableBuilder {
    pub(crate) fn new(signature: [u8; 4]) -> Self {
        Self {
            signature,
            revision: 1,
            body: Vec::new(),
            length: None,
            corrupt_checksum: false,
        }
    }

    pub(crate) fn revision(mut self, revision: u8) -> Self {
        self.revision = revision;
        self
    }

    pub(crate) fn body(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    pub(crate) fn pointers(mut self, pointers: &[u64]) -> Self {
        for p in pointers {
            self.body.extend_from_slice(&p.to_le_bytes());
        }
        self
    }

    /// Overrides the length written into the header
    pub(crate) fn declared_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub(crate) fn corrupt_checksum(mut self) -> Self {
        self.corrupt_checksum = true;
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let total = HEADER_LENGTH + self.body.len();
        let length = self.length.unwrap_or(total as u32);

        let mut table = Vec::with_capacity(total);
        table.extend_from_slice(&self.signature);
        table.extend_from_slice(&length.to_le_bytes());
        table.push(self.revision);
        table.push(0);
        table.extend_from_slice(b"ACPIVW");
        table.extend_from_slice(b"TESTTBL ");
        table.extend_from_slice(&1u32.to_le_bytes());
        table.extend_from_slice(b"ACVW");
        table.extend_from_slice(&0x2017_0101u32.to_le_bytes());
        table.extend_from_slice(&self.body);

        let sum = crate::header::checksum(&table);
        table[9] = 0u8.wrapping_sub(sum);
        if self.corrupt_checksum {
            table[9] = table[9].wrapping_add(1);
        }
        table
    }
}

/// An interrupt controller structure of `length` bytes
pub(crate) fn structure(kind: u8, length: u8) -> Vec<u8> {
    let mut bytes = vec![0u8; usize::from(length.max(2))];
    bytes[0] = kind;
    bytes[1] = length;
    bytes
}

/// Records every address it is asked to process
#[derive(Default)]
pub(crate) struct RecordingProcessor {
    pub(crate) calls: RefCell<Vec<u64>>,
}

impl TableProcessor for RecordingProcessor {
    fn process_table(&self, _ctx: &mut ParseContext<'_>, address: u64) {
        self.calls.borrow_mut().push(address);
    }
}

/// Runs `f` against a context with no mapped memory and a processor that
/// does nothing
pub(crate) fn with_context(console: &mut dyn Console, f: impl FnOnce(&mut ParseContext<'_>)) {
    let memory = MemoryMap::new();
    let processor = RecordingProcessor::default();
    let mut ctx = ParseContext::new(console, &memory, &processor);
    f(&mut ctx);
}
