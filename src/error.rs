//! Error types for FlatKV
//!
//! Provides a unified error type for all operations.
//!
//! Lookups that miss are not errors: `find`/`get` return `Ok(None)` and
//! `delete` returns `Ok(false)`.

use thiserror::Error;

/// Result type alias using FlatError
pub type Result<T> = std::result::Result<T, FlatError>;

/// Unified error type for FlatKV operations
#[derive(Debug, Error)]
pub enum FlatError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Argument Errors
    // -------------------------------------------------------------------------
    #[error("Key must not be empty")]
    EmptyKey,

    #[error("Key too long: {len} bytes (max {})", u16::MAX)]
    KeyTooLong { len: usize },

    #[error("Value too long: {len} bytes (max {})", u16::MAX)]
    ValueTooLong { len: usize },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Not enough free space: need {needed} bytes, {available} available")]
    CapacityExceeded { needed: usize, available: usize },

    #[error("Value length mismatch: expected {expected} bytes, stored value has {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// The store has already been wiped to empty when this is returned.
    #[error("Store corrupted at offset {offset}, reset to empty")]
    Corrupted { offset: usize },

    #[error("Reset already in progress")]
    ResetInProgress,

    // -------------------------------------------------------------------------
    // Medium Errors
    // -------------------------------------------------------------------------
    #[error("Address {addr} out of range (medium capacity {capacity})")]
    AddressOutOfRange { addr: usize, capacity: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
