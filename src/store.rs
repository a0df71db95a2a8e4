//! Store Module
//!
//! Public operations on top of the scan-compact engine.
//!
//! ## Responsibilities
//! - Validate keys and values at the API boundary
//! - Choose the `set` path: overwrite in place, relocate, or append
//! - Admit growth only when the free space is known to be sufficient
//! - Wipe the store to empty when a pass finds corruption

use crate::codec::{self, MAX_FIELD_LEN, TERMINATOR_SIZE};
use crate::config::Config;
use crate::engine::{self, Mode, Outcome, RecordInfo, Stats};
use crate::error::{FlatError, Result};
use crate::medium::{self, Medium};

/// A key-value store living on a raw medium
///
/// ## Concurrency
/// Single caller only. All methods take `&mut self`; wrap the store in a
/// [`SharedStore`](crate::shared::SharedStore) or another lock to use it
/// from several threads.
pub struct Store<M: Medium> {
    /// Logical medium (addressing already applied)
    medium: M,

    /// Logical size `S`
    capacity: usize,

    /// Guards `reset` against re-entry
    resetting: bool,

    /// Counters from the most recent trace or reset
    last_stats: Stats,
}

impl<'a> Store<Box<dyn Medium + 'a>> {
    /// Mount a store on a window of `medium` described by `config`
    pub fn open<P: Medium + 'a>(medium: P, config: &Config) -> Result<Self> {
        let logical = medium::mount(medium, config)?;
        tracing::debug!(
            capacity = config.capacity,
            start_addr = config.start_addr,
            inverted = config.invert_storage,
            "Mounting store"
        );
        Store::new(logical)
    }
}

impl<M: Medium> Store<M> {
    /// Use the whole of `medium` as the store
    ///
    /// The existing contents are taken as they are; call `reset()` to
    /// start from empty or `check()` to validate them.
    pub fn new(medium: M) -> Result<Self> {
        let capacity = medium.capacity();
        if capacity < TERMINATOR_SIZE {
            return Err(FlatError::Config(format!(
                "capacity {} is smaller than the {}-byte terminator",
                capacity, TERMINATOR_SIZE
            )));
        }

        Ok(Self {
            medium,
            capacity,
            resetting: false,
            last_stats: Stats::empty(capacity),
        })
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Wipe the store: terminator at offset 0, zero keys
    pub fn reset(&mut self) -> Result<()> {
        if self.resetting {
            return Err(FlatError::ResetInProgress);
        }

        self.resetting = true;
        let result = self.write_empty();
        self.resetting = false;

        if result.is_ok() {
            tracing::debug!(capacity = self.capacity, "Store reset");
        }
        result
    }

    fn write_empty(&mut self) -> Result<()> {
        codec::write_terminator(&mut self.medium, 0)?;
        self.last_stats = Stats::empty(self.capacity);
        self.medium.commit()
    }

    /// Validate the layout with a full trace
    ///
    /// Returns `false` if corruption was found, in which case the store
    /// has been reset to empty.
    pub fn check(&mut self) -> Result<bool> {
        match self.trace() {
            Ok(_) => Ok(true),
            Err(FlatError::Corrupted { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Locate a key
    pub fn find(&mut self, key: impl AsRef<[u8]>) -> Result<Option<RecordInfo>> {
        let key = key.as_ref();
        validate_key(key)?;

        match self.scan(Mode::FindKey(key))? {
            Outcome::Found(record) => Ok(Some(record)),
            _ => Ok(None),
        }
    }

    /// Locate the record with a one-based ordinal in append order
    ///
    /// Ordinal 1 is the oldest record; ordinal 0 never matches.
    pub fn find_index(&mut self, index: usize) -> Result<Option<RecordInfo>> {
        match self.scan(Mode::FindIndex(index))? {
            Outcome::Found(record) => Ok(Some(record)),
            _ => Ok(None),
        }
    }

    /// Fetch a value whose length the caller already knows
    ///
    /// A stored value of any other length is a `LengthMismatch`, even
    /// though the key exists.
    pub fn get(&mut self, key: impl AsRef<[u8]>, expected_len: usize) -> Result<Option<Vec<u8>>> {
        let Some(record) = self.find(key)? else {
            return Ok(None);
        };

        if record.value_len != expected_len {
            return Err(FlatError::LengthMismatch {
                expected: expected_len,
                actual: record.value_len,
            });
        }

        let mut value = vec![0; record.value_len];
        self.read_bytes(record.value_pos, &mut value)?;
        Ok(Some(value))
    }

    /// Fetch a value into `buf`, which must be exactly the value's length
    ///
    /// Returns `false` if the key is absent. `buf` is untouched unless the
    /// whole value is copied.
    pub fn get_into(&mut self, key: impl AsRef<[u8]>, buf: &mut [u8]) -> Result<bool> {
        let Some(record) = self.find(key)? else {
            return Ok(false);
        };

        if record.value_len != buf.len() {
            return Err(FlatError::LengthMismatch {
                expected: buf.len(),
                actual: record.value_len,
            });
        }

        self.read_bytes(record.value_pos, buf)?;
        Ok(true)
    }

    /// All keys, in append order
    pub fn keys(&mut self) -> Result<Vec<Vec<u8>>> {
        let records = self.walk()?;
        let mut keys = Vec::with_capacity(records.len());
        for record in records {
            let mut key = vec![0; record.key_len];
            self.read_bytes(record.key_pos, &mut key)?;
            keys.push(key);
        }
        Ok(keys)
    }

    /// All key-value pairs, in append order
    pub fn entries(&mut self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let records = self.walk()?;
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let mut key = vec![0; record.key_len];
            let mut value = vec![0; record.value_len];
            self.read_bytes(record.key_pos, &mut key)?;
            self.read_bytes(record.value_pos, &mut value)?;
            entries.push((key, value));
        }
        Ok(entries)
    }

    fn walk(&mut self) -> Result<Vec<RecordInfo>> {
        match self.scan(Mode::Walk)? {
            Outcome::Walked(records) => Ok(records),
            _ => Ok(Vec::new()),
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert or replace a value
    ///
    /// Same length: overwritten in place. Otherwise the old record (if
    /// any) is removed and the new one appended at the tail. Growth is
    /// refused with `CapacityExceeded` before anything is written.
    pub fn set(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let (key, value) = (key.as_ref(), value.as_ref());
        validate_key(key)?;
        if value.len() > MAX_FIELD_LEN {
            return Err(FlatError::ValueTooLong { len: value.len() });
        }

        match self.find(key)? {
            Some(existing) if value.len() == existing.value_len => {
                tracing::debug!(key_len = key.len(), "Overwriting value in place");
            }
            Some(existing) if value.len() < existing.value_len => {
                tracing::debug!(
                    key_len = key.len(),
                    from = existing.value_len,
                    to = value.len(),
                    "Shrinking value, relocating record"
                );
            }
            Some(existing) => {
                self.admit(value.len() - existing.value_len)?;
                tracing::debug!(
                    key_len = key.len(),
                    from = existing.value_len,
                    to = value.len(),
                    "Growing value, relocating record"
                );
            }
            None => {
                self.admit(codec::record_size(key.len(), value.len()))?;
                tracing::debug!(key_len = key.len(), value_len = value.len(), "Appending record");
            }
        }

        self.scan(Mode::Set { key, value })?;
        Ok(())
    }

    /// Remove a key
    ///
    /// Returns whether a record was found and removed.
    pub fn delete(&mut self, key: impl AsRef<[u8]>) -> Result<bool> {
        let key = key.as_ref();
        validate_key(key)?;

        let deleted = matches!(self.scan(Mode::Delete(key))?, Outcome::Deleted);
        if deleted {
            tracing::debug!(key_len = key.len(), "Deleted record");
        }
        Ok(deleted)
    }

    fn admit(&mut self, needed: usize) -> Result<()> {
        let available = self.free_bytes()?;
        if available < needed {
            return Err(FlatError::CapacityExceeded { needed, available });
        }
        Ok(())
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Fresh statistics from a full trace
    pub fn stats(&mut self) -> Result<Stats> {
        self.trace()
    }

    /// Bytes in use, terminator included
    pub fn used_bytes(&mut self) -> Result<usize> {
        Ok(self.trace()?.used_bytes)
    }

    pub fn free_bytes(&mut self) -> Result<usize> {
        Ok(self.trace()?.free_bytes())
    }

    pub fn num_keys(&mut self) -> Result<usize> {
        Ok(self.trace()?.num_keys)
    }

    /// Counters from the most recent trace or reset, without scanning
    pub fn last_stats(&self) -> Stats {
        self.last_stats
    }

    fn trace(&mut self) -> Result<Stats> {
        match self.scan(Mode::Trace)? {
            Outcome::Traced(stats) => {
                self.last_stats = stats;
                Ok(stats)
            }
            _ => Ok(self.last_stats),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Run one engine pass, resetting the store if it turns out corrupt
    fn scan(&mut self, mode: Mode<'_>) -> Result<Outcome> {
        match engine::scan(&mut self.medium, mode) {
            Err(FlatError::Corrupted { offset }) => {
                tracing::warn!(offset, mode = mode.name(), "Corrupt length field, resetting store");
                self.reset()?;
                Err(FlatError::Corrupted { offset })
            }
            result => result,
        }
    }

    fn read_bytes(&mut self, at: usize, buf: &mut [u8]) -> Result<()> {
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = self.medium.fetch(at + i)?;
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Logical size `S`
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// Direct access to the medium, bypassing the store
    pub fn medium_mut(&mut self) -> &mut M {
        &mut self.medium
    }

    pub fn into_medium(self) -> M {
        self.medium
    }
}

fn validate_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(FlatError::EmptyKey);
    }
    if key.len() > MAX_FIELD_LEN {
        return Err(FlatError::KeyTooLong { len: key.len() });
    }
    Ok(())
}
