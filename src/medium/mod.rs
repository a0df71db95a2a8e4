//! Storage Medium Module
//!
//! Byte-level access to the backing region.
//!
//! ## Responsibilities
//! - Single-byte fetch/store at an address
//! - Optional commit notification after a mutating sequence
//! - Address translation via composable adapters
//!
//! ## Composition
//! ```text
//!  Store ──logical──► Inverted ──► Window ──physical──► MemoryMedium / FileMedium
//!                    (optional)   (start offset)
//! ```
//!
//! Every adapter is a straight pass-through: one call on the wrapped
//! medium per byte, no buffering.

mod file;
mod memory;
mod window;

pub use file::FileMedium;
pub use memory::MemoryMedium;
pub use window::{Inverted, Window};

use crate::config::Config;
use crate::error::Result;

/// A byte-addressable storage region
pub trait Medium {
    /// Number of addressable bytes
    fn capacity(&self) -> usize;

    /// Read the byte at `addr`
    fn fetch(&mut self, addr: usize) -> Result<u8>;

    /// Write `value` at `addr`
    fn store(&mut self, addr: usize, value: u8) -> Result<()>;

    /// Flush notification, called once after each completed mutation
    fn commit(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<M: Medium + ?Sized> Medium for &mut M {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn fetch(&mut self, addr: usize) -> Result<u8> {
        (**self).fetch(addr)
    }

    fn store(&mut self, addr: usize, value: u8) -> Result<()> {
        (**self).store(addr, value)
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }
}

impl<M: Medium + ?Sized> Medium for Box<M> {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn fetch(&mut self, addr: usize) -> Result<u8> {
        (**self).fetch(addr)
    }

    fn store(&mut self, addr: usize, value: u8) -> Result<()> {
        (**self).store(addr, value)
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }
}

/// Validate `config` against `medium` and compose the address adapters
///
/// The result speaks logical offsets in `[0, config.capacity)`.
pub fn mount<'a, M: Medium + 'a>(medium: M, config: &Config) -> Result<Box<dyn Medium + 'a>> {
    config.validate(medium.capacity())?;

    let window = Window::new(medium, config.start_addr, config.capacity)?;
    if config.invert_storage {
        Ok(Box::new(Inverted::new(window)))
    } else {
        Ok(Box::new(window))
    }
}
