//! Builder for configuring a Map call.

use std::fs::File;

use crate::errors::{MmapError, Result};
use crate::region::MappedRegion;

/// Options for mapping a file, in the style of `OpenOptions`.
///
/// ```no_run
/// use std::fs::File;
/// use mmap_region::MapOptions;
///
/// let file = File::open("data.bin")?;
/// // Map the whole file read-only.
/// // SAFETY: data.bin is not modified or truncated while `region` lives.
/// let region = unsafe { MapOptions::new().map(&file)? };
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MapOptions {
    writable: bool,
    len: Option<u64>,
}

impl MapOptions {
    /// Read-only, whole-file mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map read-write. The file must have been opened with write access.
    #[must_use]
    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Map exactly `len` bytes from the start of the file. Defaults to the file's
    /// current length.
    #[must_use]
    pub fn len(mut self, len: u64) -> Self {
        self.len = Some(len);
        self
    }

    /// Establish the mapping.
    ///
    /// # Errors
    ///
    /// Returns `MmapError::MapFailed` under the conditions of [`MappedRegion::map`].
    ///
    /// # Safety
    ///
    /// Same contract as [`MappedRegion::map`]: nothing outside the returned region may
    /// modify or truncate the mapped bytes while its slices are borrowed.
    pub unsafe fn map(&self, file: &File) -> Result<MappedRegion> {
        let len = match self.len {
            Some(len) => len,
            None => file.metadata().map_err(MmapError::MapFailed)?.len(),
        };
        // SAFETY: the caller upholds the contract of `MappedRegion::map`.
        unsafe { MappedRegion::map(file, self.writable, len) }
    }
}
