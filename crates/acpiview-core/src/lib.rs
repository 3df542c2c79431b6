//! # acpiview-core
//!
//! A declarative engine for decoding and validating ACPI firmware tables.
//!
//! Tables are described as ordered lists of [`FieldDescriptor`]s. The
//! record parser applies a list to an untrusted byte buffer, printing
//! fields, capturing the ones later logic depends on, and running
//! validators. Table parsers build on it:
//!
//! - [`tables::madt`]: walks the variable-length interrupt controller
//!   structures of the MADT
//! - [`tables::xsdt`] and [`tables::rsdt`]: walk arrays of table pointers
//!   and hand every target back to the [`TableProcessor`]
//! - [`registry`]: selects a parser by signature and checks lengths and
//!   checksums
//!
//! Malformed input never aborts a run. Every problem is counted on the
//! [`Console`] and reported as an `ERROR:` line.
//!
//! ## Example
//!
//! ```no_run
//! use acpiview_core::{BufferConsole, Console, MemoryMap, ParseContext, TableRegistry};
//!
//! let mut memory = MemoryMap::new();
//! memory.insert(0x7fe0_0000, std::fs::read("XSDT.bin")?)?;
//!
//! let registry = TableRegistry::new();
//! let mut console = BufferConsole::new();
//! let mut ctx = ParseContext::new(&mut console, &memory, &registry);
//! ctx.dispatch(0x7fe0_0000);
//! drop(ctx);
//!
//! println!("{}", console.output());
//! println!("{} errors", console.error_count());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod console;
pub mod context;
pub mod error;
pub mod field;
pub mod header;
pub mod memory;
pub mod parser;
pub mod registry;
pub mod tables;

#[cfg(test)]
mod testing;

// Re-export primary types for convenience
pub use console::{BufferConsole, Console, StdoutConsole};
pub use context::{ParseContext, ParserConfig, TableProcessor};
pub use error::{Error, Result};
pub use field::{CaptureSlot, Captures, FieldDescriptor, PrintFormat};
pub use header::{TableHeader, HEADER_LENGTH};
pub use memory::{AddressSpace, MemoryMap};
pub use parser::parse_record;
pub use registry::{RegistryConfig, TableParser, TableRegistry};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
