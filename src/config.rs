//! Configuration for FlatKV
//!
//! Describes where a store lives on its medium.

use crate::codec::TERMINATOR_SIZE;
use crate::error::{FlatError, Result};

/// Placement of a store on a physical medium
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Logical size of the store in bytes (the last two are always
    /// reserved for the terminator)
    pub capacity: usize,

    /// First physical address of the store's window on the medium
    pub start_addr: usize,

    /// Map logical offset 0 to the high end of the window
    ///
    /// Lets two stores share one region by growing from opposite ends.
    pub invert_storage: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 1024,
            start_addr: 0,
            invert_storage: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the config against a medium of `medium_capacity` bytes
    pub fn validate(&self, medium_capacity: usize) -> Result<()> {
        if self.capacity < TERMINATOR_SIZE {
            return Err(FlatError::Config(format!(
                "capacity {} is smaller than the {}-byte terminator",
                self.capacity, TERMINATOR_SIZE
            )));
        }

        let end = self.start_addr.checked_add(self.capacity).ok_or_else(|| {
            FlatError::Config(format!(
                "window {}+{} overflows the address space",
                self.start_addr, self.capacity
            ))
        })?;

        if end > medium_capacity {
            return Err(FlatError::Config(format!(
                "window [{}, {}) exceeds medium capacity {}",
                self.start_addr, end, medium_capacity
            )));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the logical store size (in bytes)
    pub fn capacity(mut self, bytes: usize) -> Self {
        self.config.capacity = bytes;
        self
    }

    /// Set the first physical address of the window
    pub fn start_addr(mut self, addr: usize) -> Self {
        self.config.start_addr = addr;
        self
    }

    /// Grow the store from the high end of the window
    pub fn invert_storage(mut self, invert: bool) -> Self {
        self.config.invert_storage = invert;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
