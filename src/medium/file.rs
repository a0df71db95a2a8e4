//! File-backed medium
//!
//! Emulates a non-volatile part with a raw image file: the whole image is
//! held in memory and written back on every commit.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{FlatError, Result};

use super::{Medium, MemoryMedium};

/// Medium persisted to a raw image file
#[derive(Debug)]
pub struct FileMedium {
    path: PathBuf,
    file: File,
    image: MemoryMedium,
    dirty: bool,
}

impl FileMedium {
    /// Open an image of exactly `size` bytes, creating a zero-filled one
    /// if `path` does not exist
    pub fn open(path: &Path, size: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)?;

        let existing = file.metadata()?.len();
        let image = if existing == 0 {
            let bytes = vec![0; size];
            file.write_all(&bytes)?;
            file.sync_all()?;
            tracing::debug!("Created {}-byte image at {}", size, path.display());
            MemoryMedium::from_bytes(bytes)
        } else if existing == size as u64 {
            let mut bytes = Vec::with_capacity(size);
            file.read_to_end(&mut bytes)?;
            MemoryMedium::from_bytes(bytes)
        } else {
            return Err(FlatError::Config(format!(
                "image {} is {} bytes, expected {}",
                path.display(),
                existing,
                size
            )));
        };

        Ok(Self {
            path: path.to_path_buf(),
            file,
            image,
            dirty: false,
        })
    }

    /// Get the image path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// In-memory copy of the image
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_bytes()
    }

    /// Whether stores have happened since the last commit
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl Medium for FileMedium {
    fn capacity(&self) -> usize {
        self.image.capacity()
    }

    fn fetch(&mut self, addr: usize) -> Result<u8> {
        self.image.fetch(addr)
    }

    fn store(&mut self, addr: usize, value: u8) -> Result<()> {
        self.image.store(addr, value)?;
        self.dirty = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(self.image.as_bytes())?;
        self.file.sync_all()?;
        self.dirty = false;
        Ok(())
    }
}
