//! Per-run parsing state.
//!
//! A [`ParseContext`] bundles what every table parser needs beyond its own
//! buffer: the console, the address space that pointer tables resolve
//! against, the [`TableProcessor`] that re-enters the engine for nested
//! tables, and the stack of tables currently being processed.

use crate::console::Console;
use crate::memory::AddressSpace;
use tracing::{debug, warn};

/// Default limit on nested table processing
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Processes the table found at an absolute address.
///
/// Implemented by the signature registry; pointer tables call it for every
/// entry, which makes parsing recursive.
pub trait TableProcessor {
    /// Parse and validate the table at `address`
    fn process_table(&self, ctx: &mut ParseContext<'_>, address: u64);
}

/// Configuration for a parse run
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Maximum number of tables on the processing stack at once
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParserConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// State shared by all parsers during one run
pub struct ParseContext<'a> {
    console: &'a mut dyn Console,
    memory: &'a dyn AddressSpace,
    processor: &'a dyn TableProcessor,
    config: ParserConfig,
    active: Vec<u64>,
}

impl<'a> ParseContext<'a> {
    /// Creates a context with default configuration
    pub fn new(
        console: &'a mut dyn Console,
        memory: &'a dyn AddressSpace,
        processor: &'a dyn TableProcessor,
    ) -> Self {
        Self {
            console,
            memory,
            processor,
            config: ParserConfig::default(),
            active: Vec::new(),
        }
    }

    /// Replaces the configuration
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// The console receiving output and error counts
    pub fn console(&mut self) -> &mut dyn Console {
        &mut *self.console
    }

    /// The address space pointers resolve against
    pub fn memory(&self) -> &'a dyn AddressSpace {
        self.memory
    }

    /// Address of the table currently being processed
    pub fn current_table(&self) -> Option<u64> {
        self.active.last().copied()
    }

    /// Number of tables currently being processed
    pub fn depth(&self) -> usize {
        self.active.len()
    }

    /// Hand the table at `address` to the processor.
    ///
    /// Refuses, and reports an error, when the address is already on the
    /// processing stack or the stack is at its depth limit. Returns whether
    /// the table was processed.
    pub fn dispatch(&mut self, address: u64) -> bool {
        if self.active.contains(&address) {
            warn!("Table cycle through {:#x}", address);
            self.console.report_error(&format!(
                "Table at 0x{:x} references itself through a pointer cycle",
                address
            ));
            return false;
        }
        if self.active.len() >= self.config.max_depth {
            warn!("Depth limit {} reached at {:#x}", self.config.max_depth, address);
            self.console.report_error(&format!(
                "Table at 0x{:x} exceeds the nesting limit of {}",
                address, self.config.max_depth
            ));
            return false;
        }

        debug!("Dispatching table at {:#x} (depth {})", address, self.active.len());
        let processor = self.processor;
        self.active.push(address);
        processor.process_table(self, address);
        self.active.pop();
        true
    }
}
