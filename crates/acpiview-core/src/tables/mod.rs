//! Parsers for individual table types.
//!
//! Every parser has the [`TableParser`](crate::registry::TableParser)
//! signature so the registry can select it by table signature.

pub mod madt;
pub mod rsdt;
pub mod xsdt;
