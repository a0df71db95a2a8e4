//! In-memory medium
//!
//! A plain byte array, e.g. battery-backed RAM or a test double.

use crate::error::{FlatError, Result};

use super::Medium;

/// Medium backed by an owned byte vector
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    bytes: Vec<u8>,
    commits: usize,
}

impl MemoryMedium {
    /// Create a zero-filled medium (which reads as an empty store)
    pub fn new(size: usize) -> Self {
        Self::from_bytes(vec![0; size])
    }

    /// Mount an existing image
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes, commits: 0 }
    }

    /// Raw contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Raw contents, mutable (for seeding images and injecting faults)
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Number of `commit()` notifications received
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }

    fn out_of_range(&self, addr: usize) -> FlatError {
        FlatError::AddressOutOfRange {
            addr,
            capacity: self.bytes.len(),
        }
    }
}

impl Medium for MemoryMedium {
    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    fn fetch(&mut self, addr: usize) -> Result<u8> {
        self.bytes
            .get(addr)
            .copied()
            .ok_or_else(|| self.out_of_range(addr))
    }

    fn store(&mut self, addr: usize, value: u8) -> Result<()> {
        if addr >= self.bytes.len() {
            return Err(self.out_of_range(addr));
        }
        self.bytes[addr] = value;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }
}
