//! Owned buffers for key material that are wiped when they go out of scope.
//!
//! Key files are read into a [`ZeroizingString`], parsed into
//! [`ZeroizingBytes`], and both are zeroed on every exit path (including
//! early `?` returns) because zeroing happens in `Drop`.

use std::ops::Deref;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// A `Vec<u8>` wrapper that is zeroed when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ZeroizingBytes(Vec<u8>);

impl ZeroizingBytes {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    /// An empty buffer that can take `capacity` bytes without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Append one byte. Fails instead of growing once the buffer is full, so
    /// no stale copy of the contents is left behind by a reallocation.
    pub fn push_within_capacity(&mut self, byte: u8) -> Result<(), CryptoError> {
        if self.0.len() == self.0.capacity() {
            return Err(CryptoError::InvalidKeyLength {
                expected: self.0.capacity(),
                actual: self.0.len() + 1,
            });
        }
        self.0.push(byte);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fail unless the buffer holds exactly `expected` bytes.
    pub fn ensure_len(&self, expected: usize) -> Result<(), CryptoError> {
        if self.0.len() != expected {
            return Err(CryptoError::InvalidKeyLength {
                expected,
                actual: self.0.len(),
            });
        }
        Ok(())
    }
}

impl Deref for ZeroizingBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for ZeroizingBytes {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

/// Never prints the contents.
impl std::fmt::Debug for ZeroizingBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ZeroizingBytes([REDACTED; {}])", self.0.len())
    }
}

/// A `String` wrapper that is zeroed when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ZeroizingString(String);

impl ZeroizingString {
    pub fn new(data: String) -> Self {
        Self(data)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for ZeroizingString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<String> for ZeroizingString {
    fn from(data: String) -> Self {
        Self::new(data)
    }
}

impl std::fmt::Debug for ZeroizingString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ZeroizingString([REDACTED])")
    }
}
