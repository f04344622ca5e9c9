//! # crypto-utils
//!
//! Content digests, memory-safe key buffers and secure random generation
//! shared by the relay client crates.

pub mod digest;
pub mod error;
pub mod random;
pub mod zeroizing;

pub use error::CryptoError;
