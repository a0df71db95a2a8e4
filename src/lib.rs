//! # FlatKV
//!
//! A minimal key-value store for raw, fixed-size, byte-addressable storage
//! (battery-backed RAM, EEPROM, a window of flash) with:
//! - No filesystem, allocator or header on the medium
//! - Variable-length binary keys and values packed back to back
//! - Free space recovered by in-place compaction, fused with lookup
//! - Reset-to-empty as the recovery from any corrupt length field
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                               │
//! │        (get / set / delete / find / reset / stats)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ one or more passes
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Scan-Compact Engine                         │
//! │   KeyLen → Key → ValueLen → Value  (lookup + shift-left)     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ logical offsets [0, S)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │               Medium adapters (Window / Inverted)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ physical addresses
//!                       ▼
//!               MemoryMedium / FileMedium / your own
//! ```
//!
//! ## Example
//!
//! ```
//! use flatkv::{MemoryMedium, Store};
//!
//! let mut store = Store::new(MemoryMedium::new(64)).unwrap();
//! store.reset().unwrap();
//!
//! store.set("answer", [42u8]).unwrap();
//! assert_eq!(store.get("answer", 1).unwrap(), Some(vec![42]));
//! assert!(store.delete("answer").unwrap());
//! assert_eq!(store.used_bytes().unwrap(), 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod medium;
pub mod engine;
pub mod store;
pub mod shared;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FlatError, Result};
pub use config::Config;
pub use engine::{RecordInfo, Stats};
pub use medium::{FileMedium, Inverted, Medium, MemoryMedium, Window};
pub use store::Store;
pub use shared::SharedStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of FlatKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
