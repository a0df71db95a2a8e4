//! Address adapters
//!
//! Translate logical store offsets into physical medium addresses.
//!
//! - `Window`: `physical = start + logical`
//! - `Inverted`: `physical = (capacity - 1) - logical` of the wrapped medium
//!
//! `Inverted<Window<M>>` therefore maps to `start + (S - 1) - logical`.

use crate::error::{FlatError, Result};

use super::Medium;

/// A sub-range `[start, start + size)` of a larger medium
#[derive(Debug)]
pub struct Window<M> {
    inner: M,
    start: usize,
    size: usize,
}

impl<M: Medium> Window<M> {
    /// Wrap `inner`, exposing `size` bytes starting at physical `start`
    pub fn new(inner: M, start: usize, size: usize) -> Result<Self> {
        let fits = start
            .checked_add(size)
            .is_some_and(|end| end <= inner.capacity());
        if !fits {
            return Err(FlatError::Config(format!(
                "window {}+{} does not fit medium of {} bytes",
                start,
                size,
                inner.capacity()
            )));
        }

        Ok(Self { inner, start, size })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn get_ref(&self) -> &M {
        &self.inner
    }

    pub fn into_inner(self) -> M {
        self.inner
    }

    fn translate(&self, addr: usize) -> Result<usize> {
        if addr >= self.size {
            return Err(FlatError::AddressOutOfRange {
                addr,
                capacity: self.size,
            });
        }
        Ok(self.start + addr)
    }
}

impl<M: Medium> Medium for Window<M> {
    fn capacity(&self) -> usize {
        self.size
    }

    fn fetch(&mut self, addr: usize) -> Result<u8> {
        let physical = self.translate(addr)?;
        self.inner.fetch(physical)
    }

    fn store(&mut self, addr: usize, value: u8) -> Result<()> {
        let physical = self.translate(addr)?;
        self.inner.store(physical, value)
    }

    fn commit(&mut self) -> Result<()> {
        self.inner.commit()
    }
}

/// Mirror image of a medium: logical 0 is its last byte
#[derive(Debug)]
pub struct Inverted<M> {
    inner: M,
}

impl<M: Medium> Inverted<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &M {
        &self.inner
    }

    pub fn into_inner(self) -> M {
        self.inner
    }

    fn translate(&self, addr: usize) -> Result<usize> {
        let capacity = self.inner.capacity();
        if addr >= capacity {
            return Err(FlatError::AddressOutOfRange { addr, capacity });
        }
        Ok(capacity - 1 - addr)
    }
}

impl<M: Medium> Medium for Inverted<M> {
    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn fetch(&mut self, addr: usize) -> Result<u8> {
        let physical = self.translate(addr)?;
        self.inner.fetch(physical)
    }

    fn store(&mut self, addr: usize, value: u8) -> Result<()> {
        let physical = self.translate(addr)?;
        self.inner.store(physical, value)
    }

    fn commit(&mut self) -> Result<()> {
        self.inner.commit()
    }
}
