//! # Foras Core
//!
//! Shared foundation for the foras content-addressable storage toolkit:
//! error types, bit-level readers, and common value types consumed by the
//! codec crates.
//!
//! Foras is named after the 31st spirit of the Ars Goetia, who teaches the
//! finding of things lost and hidden - fitting for a toolkit that stores
//! content by what it is rather than where it lives.

pub mod bits;
pub mod error;
pub mod types;

pub use bits::BitReader;
pub use error::{Error, Result};
pub use types::CompressionRatio;
