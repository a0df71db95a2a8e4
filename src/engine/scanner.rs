//! Scanner
//!
//! Cursor over the store. `step()` performs exactly one transition out of
//! the current `Position`; `run()` steps until the pass ends and then
//! finishes the mode.

use crate::codec::{self, LEN_FIELD_SIZE, TERMINATOR_SIZE};
use crate::error::{FlatError, Result};
use crate::medium::Medium;

use super::{Mode, Outcome, Position, RecordInfo, Stats};

/// Smallest span from a key length field to the end of the region:
/// KeyLen + ValueLen + terminator
const KEY_LEN_OVERHEAD: usize = LEN_FIELD_SIZE + LEN_FIELD_SIZE + TERMINATOR_SIZE;

/// Smallest span from a value length field to the end of the region:
/// ValueLen + terminator
const VALUE_LEN_OVERHEAD: usize = LEN_FIELD_SIZE + TERMINATOR_SIZE;

/// Result of a single transition
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// Moved to the next position
    Continue,
    /// Reached the terminator (or the end of the region)
    End,
    /// The mode finished early
    Done(Outcome),
}

/// One pass over a store
pub struct Scanner<'m, 'k, M: Medium + ?Sized> {
    medium: &'m mut M,
    mode: Mode<'k>,
    capacity: usize,

    /// Read cursor
    offset: usize,
    position: Position,

    /// Records seen so far, the current one included
    num_keys: usize,

    /// Size of the removed record, 0 until one is chosen
    delete_offset: usize,

    /// Record under the cursor
    record: RecordInfo,
    matched: bool,

    walked: Vec<RecordInfo>,
}

impl<'m, 'k, M: Medium + ?Sized> Scanner<'m, 'k, M> {
    /// Start a pass at offset 0
    pub fn new(medium: &'m mut M, mode: Mode<'k>) -> Self {
        let capacity = medium.capacity();
        Self {
            medium,
            mode,
            capacity,
            offset: 0,
            position: Position::KeyLen,
            num_keys: 0,
            delete_offset: 0,
            record: RecordInfo::default(),
            matched: false,
            walked: Vec::new(),
        }
    }

    // =========================================================================
    // Driving
    // =========================================================================

    /// Step to the end of the pass and finish the mode
    pub fn run(mut self) -> Result<Outcome> {
        let mode = self.mode.name();
        let outcome = loop {
            match self.step()? {
                Step::Continue => {}
                Step::Done(outcome) => break outcome,
                Step::End => break self.finish()?,
            }
        };

        tracing::trace!(mode, offset = self.offset, keys = self.num_keys, ?outcome, "Scan complete");
        Ok(outcome)
    }

    /// Perform one transition
    pub fn step(&mut self) -> Result<Step> {
        match self.position {
            Position::KeyLen => self.at_key_len(),
            Position::Key => self.at_key(),
            Position::ValueLen => self.at_value_len(),
            Position::Value => self.at_value(),
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    fn at_key_len(&mut self) -> Result<Step> {
        let at = self.offset;

        // A record ending at S-2 leaves only the terminator behind it.
        if at + TERMINATOR_SIZE >= self.capacity {
            return Ok(Step::End);
        }

        let key_len = codec::read_len(&mut *self.medium, at)? as usize;
        if key_len == 0 {
            return Ok(Step::End);
        }
        if key_len + KEY_LEN_OVERHEAD > self.capacity - at {
            return Err(FlatError::Corrupted { offset: at });
        }

        self.num_keys += 1;
        self.matched = false;
        self.record = RecordInfo {
            offset: at,
            key_len,
            key_pos: at + LEN_FIELD_SIZE,
            value_len: 0,
            value_pos: 0,
        };

        self.relocate(at, LEN_FIELD_SIZE)?;
        self.offset = at + LEN_FIELD_SIZE;
        self.position = Position::Key;
        Ok(Step::Continue)
    }

    fn at_key(&mut self) -> Result<Step> {
        let key_len = self.record.key_len;

        if self.delete_offset > 0 {
            self.relocate(self.offset, key_len)?;
        } else if let Some(target) = self.mode.target_key() {
            self.matched = self.key_equals(target)?;
        }

        self.offset += key_len;
        self.position = Position::ValueLen;
        Ok(Step::Continue)
    }

    fn at_value_len(&mut self) -> Result<Step> {
        let at = self.offset;

        let value_len = codec::read_len(&mut *self.medium, at)? as usize;
        if value_len + VALUE_LEN_OVERHEAD > self.capacity - at {
            return Err(FlatError::Corrupted { offset: at });
        }

        self.record.value_len = value_len;
        self.record.value_pos = at + LEN_FIELD_SIZE;

        self.relocate(at, LEN_FIELD_SIZE)?;
        self.offset = at + LEN_FIELD_SIZE;
        self.position = Position::Value;
        Ok(Step::Continue)
    }

    fn at_value(&mut self) -> Result<Step> {
        let record = self.record;
        self.relocate(record.value_pos, record.value_len)?;

        match self.mode {
            Mode::FindIndex(ordinal) if self.num_keys == ordinal => {
                return Ok(Step::Done(Outcome::Found(record)));
            }
            Mode::Walk => self.walked.push(record),
            Mode::FindKey(_) if self.matched => {
                return Ok(Step::Done(Outcome::Found(record)));
            }
            Mode::Set { value, .. } if self.matched && value.len() == record.value_len => {
                self.write_bytes(record.value_pos, value)?;
                self.medium.commit()?;
                return Ok(Step::Done(Outcome::Overwritten));
            }
            Mode::Set { .. } | Mode::Delete(_) if self.matched => {
                self.delete_offset = record.size();
                tracing::debug!(
                    offset = record.offset,
                    delete_offset = self.delete_offset,
                    "Removing record, compacting remainder"
                );
            }
            _ => {}
        }

        self.matched = false;
        self.offset = record.value_pos + record.value_len;
        self.position = Position::KeyLen;
        Ok(Step::Continue)
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Finish the mode once the terminator has been reached
    fn finish(&mut self) -> Result<Outcome> {
        let tail = self.offset - self.delete_offset;

        match self.mode {
            Mode::Trace => Ok(Outcome::Traced(Stats {
                capacity: self.capacity,
                used_bytes: self.offset + TERMINATOR_SIZE,
                num_keys: self.num_keys,
            })),
            Mode::FindIndex(_) | Mode::FindKey(_) => Ok(Outcome::NotFound),
            Mode::Walk => Ok(Outcome::Walked(std::mem::take(&mut self.walked))),
            Mode::Set { key, value } => {
                debug_assert!(
                    tail + codec::record_size(key.len(), value.len()) + TERMINATOR_SIZE
                        <= self.capacity,
                    "set admitted without enough free space"
                );

                let mut at = tail;
                codec::write_len(&mut *self.medium, at, key.len() as u16)?;
                at += LEN_FIELD_SIZE;
                self.write_bytes(at, key)?;
                at += key.len();
                codec::write_len(&mut *self.medium, at, value.len() as u16)?;
                at += LEN_FIELD_SIZE;
                self.write_bytes(at, value)?;
                at += value.len();
                codec::write_terminator(&mut *self.medium, at)?;

                tracing::debug!(tail, end = at, "Appended record");
                self.offset = at;
                self.medium.commit()?;
                Ok(Outcome::Appended)
            }
            Mode::Delete(_) if self.delete_offset > 0 => {
                codec::write_terminator(&mut *self.medium, tail)?;
                self.offset = tail;
                self.medium.commit()?;
                Ok(Outcome::Deleted)
            }
            Mode::Delete(_) => Ok(Outcome::NotFound),
        }
    }

    // =========================================================================
    // Byte Helpers
    // =========================================================================

    /// Copy `len` bytes at `from` to `from - delete_offset`, if shifting
    fn relocate(&mut self, from: usize, len: usize) -> Result<()> {
        if self.delete_offset == 0 {
            return Ok(());
        }
        for i in from..from + len {
            let byte = self.medium.fetch(i)?;
            self.medium.store(i - self.delete_offset, byte)?;
        }
        Ok(())
    }

    fn key_equals(&mut self, target: &[u8]) -> Result<bool> {
        if target.len() != self.record.key_len {
            return Ok(false);
        }
        for (i, &expected) in target.iter().enumerate() {
            if self.medium.fetch(self.record.key_pos + i)? != expected {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn write_bytes(&mut self, at: usize, bytes: &[u8]) -> Result<()> {
        for (i, &byte) in bytes.iter().enumerate() {
            self.medium.store(at + i, byte)?;
        }
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Current read offset
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Records seen so far
    pub fn num_keys(&self) -> usize {
        self.num_keys
    }

    /// Shift distance, 0 while nothing is being removed
    pub fn delete_offset(&self) -> usize {
        self.delete_offset
    }

    /// Record under the cursor
    pub fn record(&self) -> &RecordInfo {
        &self.record
    }
}
