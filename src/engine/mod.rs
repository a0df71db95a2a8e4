//! Engine Module
//!
//! The scan-compact engine: one linear pass over the store that looks up,
//! counts and compacts at the same time.
//!
//! ## Responsibilities
//! - Lookup by exact key or by ordinal
//! - Statistics (used bytes, key count)
//! - In-place value overwrite
//! - Removal of one record with a left shift of everything behind it
//! - Tail append of a new record plus terminator
//!
//! ## Traversal
//! ```text
//!        ┌──────────┐    ┌─────┐    ┌────────────┐    ┌───────┐
//!  ───►  │  KeyLen  │ ─► │ Key │ ─► │  ValueLen  │ ─► │ Value │ ──┐
//!        └────┬─────┘    └─────┘    └────────────┘    └───────┘   │
//!             │ ▲                                                 │
//!             │ └─────────────────────────────────────────────────┘
//!             ▼
//!       terminator / end of region ──► finish (append, terminator, commit)
//! ```
//!
//! Once a record is chosen for removal the engine knows its size, the
//! *delete offset*. Every byte read after that point is written back
//! `delete_offset` bytes earlier, so the gap closes during the same pass
//! and no byte is visited twice.

mod scanner;

pub use scanner::{Scanner, Step};

use crate::codec::TERMINATOR_SIZE;
use crate::error::Result;
use crate::medium::Medium;

/// Where the cursor sits inside the record being examined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// At the 2-byte key length (or the terminator)
    KeyLen,
    /// At the first key byte
    Key,
    /// At the 2-byte value length
    ValueLen,
    /// At the first value byte
    Value,
}

/// What a pass is for
#[derive(Debug, Clone, Copy)]
pub enum Mode<'k> {
    /// Count keys and measure used bytes
    Trace,

    /// Stop at the record whose running count equals this ordinal
    /// (1 is the first record, 0 never matches)
    FindIndex(usize),

    /// Stop at the first record whose key equals this one
    FindKey(&'k [u8]),

    /// Overwrite the first matching record in place when the value length
    /// is unchanged, otherwise remove it (if present) and append at the tail
    Set { key: &'k [u8], value: &'k [u8] },

    /// Remove the first matching record
    Delete(&'k [u8]),

    /// Collect the location of every record
    Walk,
}

impl<'k> Mode<'k> {
    /// Key compared against each record, if this mode matches by key
    pub fn target_key(&self) -> Option<&'k [u8]> {
        match *self {
            Mode::FindKey(key) | Mode::Delete(key) | Mode::Set { key, .. } => Some(key),
            Mode::Trace | Mode::FindIndex(_) | Mode::Walk => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Trace => "trace",
            Mode::FindIndex(_) => "find_index",
            Mode::FindKey(_) => "find_key",
            Mode::Set { .. } => "set",
            Mode::Delete(_) => "delete",
            Mode::Walk => "walk",
        }
    }
}

/// Location and lengths of one record, in logical offsets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordInfo {
    /// Offset of the key length field
    pub offset: usize,
    pub key_len: usize,
    /// Offset of the first key byte
    pub key_pos: usize,
    pub value_len: usize,
    /// Offset of the first value byte
    pub value_pos: usize,
}

impl RecordInfo {
    /// Total bytes occupied, length fields included
    pub fn size(&self) -> usize {
        self.value_pos + self.value_len - self.offset
    }
}

/// Aggregate statistics from a full trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub capacity: usize,
    /// Offset of the terminator plus its two bytes
    pub used_bytes: usize,
    pub num_keys: usize,
}

impl Stats {
    /// Statistics of a freshly reset store
    pub fn empty(capacity: usize) -> Self {
        Self {
            capacity,
            used_bytes: TERMINATOR_SIZE,
            num_keys: 0,
        }
    }

    pub fn free_bytes(&self) -> usize {
        self.capacity.saturating_sub(self.used_bytes)
    }
}

/// Result of a completed pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `Trace` finished
    Traced(Stats),
    /// `FindIndex` / `FindKey` hit
    Found(RecordInfo),
    /// No record matched (lookups and `Delete`)
    NotFound,
    /// `Set` rewrote the value bytes where they were
    Overwritten,
    /// `Set` wrote a new record at the tail
    Appended,
    /// `Delete` removed a record and closed the gap
    Deleted,
    /// `Walk` finished
    Walked(Vec<RecordInfo>),
}

/// Run one complete pass of `mode` over `medium`
pub fn scan<M: Medium + ?Sized>(medium: &mut M, mode: Mode<'_>) -> Result<Outcome> {
    Scanner::new(medium, mode).run()
}
