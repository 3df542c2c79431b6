//! Error types for the acpiview-core library.
//!
//! Problems found *inside* a table (bad lengths, unknown structures, null
//! pointers) are not errors in this sense: they are reported through the
//! [`Console`](crate::console::Console) error counter so that parsing can
//! continue. The variants here cover the setup around the engine, such as
//! loading table dumps and building the address space.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for acpiview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all acpiview setup operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A memory region would overlap one that is already mapped
    #[error("region at {base:#x} ({len} bytes) overlaps region at {existing:#x}")]
    OverlappingRegion {
        /// Base address of the rejected region
        base: u64,
        /// Length of the rejected region
        len: usize,
        /// Base address of the region already mapped
        existing: u64,
    },

    /// A memory region is empty or wraps the address space
    #[error("invalid region at {base:#x}: {details}")]
    InvalidRegion {
        /// Base address of the rejected region
        base: u64,
        /// Detailed description of the issue
        details: String,
    },

    /// A buffer is too short to hold a standard table header
    #[error("table too short: {len} bytes, header needs {required}")]
    TableTooShort {
        /// Length of the buffer
        len: usize,
        /// Minimum length required
        required: usize,
    },

    /// Could not parse an address from user input
    #[error("invalid address '{input}'")]
    InvalidAddress {
        /// The text that failed to parse
        input: String,
    },

    /// Could not parse a table signature from user input
    #[error("invalid table signature '{input}': expected 4 ASCII characters")]
    InvalidSignature {
        /// The text that failed to parse
        input: String,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new overlapping region error
    pub fn overlapping_region(base: u64, len: usize, existing: u64) -> Self {
        Self::OverlappingRegion {
            base,
            len,
            existing,
        }
    }

    /// Creates a new invalid region error
    pub fn invalid_region(base: u64, details: impl Into<String>) -> Self {
        Self::InvalidRegion {
            base,
            details: details.into(),
        }
    }

    /// Creates a new invalid address error
    pub fn invalid_address(input: impl Into<String>) -> Self {
        Self::InvalidAddress {
            input: input.into(),
        }
    }

    /// Creates a new invalid signature error
    pub fn invalid_signature(input: impl Into<String>) -> Self {
        Self::InvalidSignature {
            input: input.into(),
        }
    }

    /// Returns true if processing can move on to the next input
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FileRead { .. } | Self::TableTooShort { .. } | Self::OverlappingRegion { .. }
        )
    }
}
