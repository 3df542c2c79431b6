//! Signature registry: picks a parser for each table it is handed.
//!
//! [`TableRegistry`] is the [`TableProcessor`] used for real runs. For
//! each address it resolves the table, checks that the declared length is
//! sane and that the checksum holds, decides whether the table should be
//! traced, and hands it to the parser registered for its signature.

use crate::context::{ParseContext, TableProcessor};
use crate::header::{self, checksum, TableHeader, HEADER_LENGTH};
use crate::tables::{madt, rsdt, xsdt};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Signature shared by every table parser
pub type TableParser = fn(&mut ParseContext<'_>, bool, &[u8], u32, u8);

/// Configuration for the registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Trace table contents at all
    pub trace: bool,
    /// When set, only the table with this signature is traced; all others
    /// are still validated
    pub select: Option<[u8; 4]>,
    /// Report tables whose bytes do not sum to zero
    pub verify_checksum: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            trace: true,
            select: None,
            verify_checksum: true,
        }
    }
}

impl RegistryConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether table contents are traced
    pub fn trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Restricts tracing to one signature
    pub fn select(mut self, signature: Option<[u8; 4]>) -> Self {
        self.select = signature;
        self
    }

    /// Sets whether checksums are verified
    pub fn verify_checksum(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }
}

/// Maps table signatures to parsers
#[derive(Debug, Clone)]
pub struct TableRegistry {
    parsers: HashMap<[u8; 4], TableParser>,
    config: RegistryConfig,
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRegistry {
    /// Creates a registry with the built-in parsers
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(xsdt::SIGNATURE, xsdt::parse_table);
        registry.register(rsdt::SIGNATURE, rsdt::parse_table);
        registry.register(madt::SIGNATURE, madt::parse_table);
        registry
    }

    /// Creates a registry with no parsers; every table gets a header dump
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
            config: RegistryConfig::default(),
        }
    }

    /// Replaces the configuration
    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers `parser` for `signature`, replacing any previous one
    pub fn register(&mut self, signature: [u8; 4], parser: TableParser) {
        self.parsers.insert(signature, parser);
    }

    /// The parser for `signature`, falling back to a header dump
    pub fn parser_for(&self, signature: &[u8; 4]) -> TableParser {
        self.parsers
            .get(signature)
            .copied()
            .unwrap_or(header::parse_table)
    }

    /// Whether a table with `signature` should be traced
    pub fn should_trace(&self, signature: &[u8; 4]) -> bool {
        self.config.trace && self.config.select.map_or(true, |s| &s == signature)
    }
}

impl TableProcessor for TableRegistry {
    fn process_table(&self, ctx: &mut ParseContext<'_>, address: u64) {
        let Some(region) = ctx.memory().region(address) else {
            ctx.console().report_error(&format!(
                "Table address 0x{:x} is not mapped",
                address
            ));
            return;
        };

        let header = match TableHeader::read(region) {
            Ok(header) => header,
            Err(e) => {
                ctx.console()
                    .report_error(&format!("Table at 0x{:x}: {}", address, e));
                return;
            }
        };

        let length = header.length as usize;
        if length < HEADER_LENGTH || length > region.len() {
            ctx.console().report_error(&format!(
                "Invalid length {} for {} table at 0x{:x}, {} bytes available",
                header.length,
                header.signature_str(),
                address,
                region.len()
            ));
            return;
        }
        let table = &region[..length];

        if self.config.verify_checksum {
            let sum = checksum(table);
            if sum != 0 {
                ctx.console().report_error(&format!(
                    "Checksum failed for {} table at 0x{:x} (sum 0x{:02x})",
                    header.signature_str(),
                    address,
                    sum
                ));
            }
        }

        let trace = self.should_trace(&header.signature);
        debug!(
            "Processing {} at {:#x} ({} bytes, revision {}, trace {})",
            header.signature_str(),
            address,
            header.length,
            header.revision,
            trace
        );
        if trace {
            ctx.console().print("");
        }

        let parser = self.parser_for(&header.signature);
        parser(ctx, trace, table, header.length, header.revision);
        trace!("Finished {} at {:#x}", header.signature_str(), address);
    }
}
