//! Address spaces for resolving table pointers.
//!
//! Pointer tables hold absolute addresses. Instead of dereferencing them,
//! the engine asks an [`AddressSpace`] for the bytes mapped there, which
//! turns a wild pointer into a `None`.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Maps absolute addresses to borrowed bytes
pub trait AddressSpace {
    /// Bytes from `address` to the end of the region containing it
    fn region(&self, address: u64) -> Option<&[u8]>;

    /// Exactly `len` bytes at `address`, if they are all mapped
    fn read(&self, address: u64, len: usize) -> Option<&[u8]> {
        self.region(address)?.get(..len)
    }
}

/// A set of non-overlapping memory regions
#[derive(Debug, Default, Clone)]
pub struct MemoryMap {
    regions: BTreeMap<u64, Vec<u8>>,
}

impl MemoryMap {
    /// Creates an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `data` at `base`
    pub fn insert(&mut self, base: u64, data: Vec<u8>) -> Result<()> {
        if data.is_empty() {
            return Err(Error::invalid_region(base, "region is empty"));
        }
        let Some(end) = region_end(base, data.len()) else {
            return Err(Error::invalid_region(base, "region wraps the address space"));
        };

        if let Some((&prev, prev_data)) = self.regions.range(..=base).next_back() {
            if region_end(prev, prev_data.len()).map_or(true, |prev_end| prev_end > base) {
                return Err(Error::overlapping_region(base, data.len(), prev));
            }
        }
        if let Some((&next, _)) = self.regions.range(base..).next() {
            if next < end {
                return Err(Error::overlapping_region(base, data.len(), next));
            }
        }

        debug!("Mapped {} bytes at {:#x}", data.len(), base);
        self.regions.insert(base, data);
        Ok(())
    }

    /// Number of mapped regions
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns true if nothing is mapped
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Regions in ascending address order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[u8])> {
        self.regions.iter().map(|(&base, data)| (base, data.as_slice()))
    }

    /// First address at or above `floor`, aligned to `align`, past every
    /// mapped region
    pub fn next_free_address(&self, floor: u64, align: u64) -> Option<u64> {
        let align = align.max(1);
        let top = self
            .regions
            .iter()
            .filter_map(|(&base, data)| region_end(base, data.len()))
            .max()
            .unwrap_or(0)
            .max(floor);
        top.checked_add(align - 1).map(|v| v / align * align)
    }
}

impl AddressSpace for MemoryMap {
    fn region(&self, address: u64) -> Option<&[u8]> {
        let (&base, data) = self.regions.range(..=address).next_back()?;
        let offset = usize::try_from(address - base).ok()?;
        match data.get(offset..) {
            Some(bytes) if !bytes.is_empty() => Some(bytes),
            _ => None,
        }
    }
}

fn region_end(base: u64, len: usize) -> Option<u64> {
    base.checked_add(u64::try_from(len).ok()?)
}

/// Parse an address given as `0x`-prefixed hex or plain decimal
pub fn parse_address(input: &str) -> Result<u64> {
    let trimmed = input.trim().replace('_', "");
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse(),
    };
    parsed.map_err(|_| Error::invalid_address(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_lookup() {
        let mut map = MemoryMap::new();
        map.insert(0x1000, vec![1, 2, 3, 4]).unwrap();
        map.insert(0x2000, vec![5, 6]).unwrap();

        assert_eq!(map.region(0x1000), Some(&[1, 2, 3, 4][..]));
        assert_eq!(map.region(0x1002), Some(&[3, 4][..]));
        assert_eq!(map.region(0x1004), None);
        assert_eq!(map.region(0x0fff), None);
        assert_eq!(map.region(0x2001), Some(&[6][..]));
        assert_eq!(map.read(0x1001, 2), Some(&[2, 3][..]));
        assert_eq!(map.read(0x1003, 2), None);
    }

    #[test]
    fn test_overlap_rejected() {
        let mut map = MemoryMap::new();
        map.insert(0x1000, vec![0; 16]).unwrap();

        assert!(map.insert(0x100f, vec![0; 4]).is_err());
        assert!(map.insert(0x0ffc, vec![0; 8]).is_err());
        assert!(map.insert(0x1000, vec![0; 1]).is_err());
        assert!(map.insert(0x1010, vec![0; 4]).is_ok());
        assert!(map.insert(0x0ff0, vec![0; 16]).is_ok());
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_invalid_regions() {
        let mut map = MemoryMap::new();
        assert!(map.insert(0x1000, Vec::new()).is_err());
        assert!(map.insert(u64::MAX, vec![0; 2]).is_err());
        assert!(map.is_empty());
    }

    #[test]
    fn test_next_free_address() {
        let mut map = MemoryMap::new();
        assert_eq!(map.next_free_address(0x1000, 0x1000), Some(0x1000));

        map.insert(0x4000, vec![0; 0x10]).unwrap();
        assert_eq!(map.next_free_address(0x1000, 0x1000), Some(0x5000));
        assert_eq!(map.next_free_address(0x9000, 0x1000), Some(0x9000));
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x7fe0_0000").unwrap(), 0x7fe0_0000);
        assert_eq!(parse_address("4096").unwrap(), 4096);
        assert!(parse_address("0xzz").is_err());
        assert!(parse_address("").is_err());
    }
}
