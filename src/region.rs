//! The mapped region handle: a unique, non-cloneable owner of one OS mapping.

use std::fs::File;
use std::io;

use crate::errors::{invalid_input, MmapError, Result};
use crate::os::{self, FileId, Platform, RawMapping};
use crate::utils::{page_span, slice_range};

// Error message constants
const ERR_ZERO_LENGTH: &str = "mapping length must be greater than zero";
const ERR_TOO_LARGE: &str = "mapping length exceeds the addressable limit";
const ERR_PAST_EOF: &str = "mapping length exceeds the file size; extend the file first";
const ERR_NOT_MAPPED: &str = "region is not mapped";

/// A contiguous byte view over a shared, file-backed mapping.
///
/// A region owns exactly one OS mapping. It cannot be cloned, its length is fixed at
/// creation, and it never closes the file it was created from.
///
/// Reads borrow the region immutably and writes, like [`unmap`](Self::unmap), borrow
/// it mutably. No slice obtained from the region can therefore outlive the mapping;
/// after `unmap` every accessor reports an error instead of touching memory.
///
/// Exclusivity holds within one region only. Another region, another process, or a
/// plain `write` to the file can change the same bytes, which is why mapping is
/// `unsafe` (see [`MappedRegion::map`]).
///
/// # Examples
///
/// ```no_run
/// use std::fs::OpenOptions;
/// use mmap_region::MapOptions;
///
/// let file = OpenOptions::new().read(true).write(true).open("data.bin")?;
/// file.set_len(4096)?;
///
/// // SAFETY: nothing else maps, writes or truncates data.bin while `region` lives.
/// let mut region = unsafe { MapOptions::new().writable(true).len(4096).map(&file)? };
/// region.update_region(0, b"hello")?;
/// region.sync()?;
/// region.unmap()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct MappedRegion {
    raw: Option<Platform>,
    len: u64,
    writable: bool,
    file_id: FileId,
}

impl std::fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("len", &self.len)
            .field("writable", &self.writable)
            .field("mapped", &self.is_mapped())
            .field("file_id", &self.file_id)
            .finish()
    }
}

impl MappedRegion {
    /// Map the first `len` bytes of `file`.
    ///
    /// # Errors
    ///
    /// Returns `MmapError::MapFailed` if `len` is zero, exceeds the file size or the
    /// address space, or if the OS refuses the mapping.
    ///
    /// # Safety
    ///
    /// The returned slices are only sound while no one else modifies the mapped bytes
    /// behind them. For as long as the region is mapped the caller must ensure that:
    ///
    /// - no other region (in this or another process) writes the same file range
    ///   while a slice of this region is borrowed, and no other region reads it
    ///   while this region hands out a mutable slice;
    /// - the file is not written through a descriptor or truncated below `len`.
    ///   Truncation makes accesses fault (`SIGBUS` on Unix).
    #[allow(clippy::cast_possible_truncation)]
    pub unsafe fn map(file: &File, writable: bool, len: u64) -> Result<Self> {
        if len == 0 {
            return Err(MmapError::MapFailed(invalid_input(ERR_ZERO_LENGTH)));
        }
        if len > isize::MAX as u64 {
            return Err(MmapError::MapFailed(invalid_input(ERR_TOO_LARGE)));
        }
        let file_len = file.metadata().map_err(MmapError::MapFailed)?.len();
        if len > file_len {
            return Err(MmapError::MapFailed(invalid_input(ERR_PAST_EOF)));
        }
        let file_id = os::file_id(file).map_err(MmapError::MapFailed)?;
        // len <= isize::MAX was checked above
        let raw = Platform::map(file, writable, len as usize).map_err(MmapError::MapFailed)?;
        log::debug!("mapped {len} bytes (writable={writable}) of file {file_id:?}");
        Ok(Self {
            raw: Some(raw),
            len,
            writable,
            file_id,
        })
    }

    /// Length of the region in bytes. Fixed for the lifetime of the region.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Always false for a region produced by `map`; kept for slice-like ergonomics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the region was mapped read-write.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Whether the region is still backed by a live mapping.
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        self.raw.is_some()
    }

    /// Identity of the backing file.
    #[must_use]
    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub(crate) fn raw(&self) -> Option<&Platform> {
        self.raw.as_ref()
    }

    /// The whole region as a read-only byte slice.
    ///
    /// # Errors
    ///
    /// Returns `MmapError::InvalidMode` if the region has been unmapped.
    pub fn as_slice(&self) -> Result<&[u8]> {
        let raw = self
            .raw
            .as_ref()
            .ok_or(MmapError::InvalidMode("read from an unmapped region"))?;
        // SAFETY: the mapping is live and `len` bytes long; the returned borrow of
        // `self` keeps `unmap` (which needs `&mut self`) from running while it exists.
        // Writers outside this region are excluded by the contract of `map`.
        Ok(unsafe { std::slice::from_raw_parts(raw.as_ptr(), raw.len()) })
    }

    /// The whole region as a mutable byte slice.
    ///
    /// # Errors
    ///
    /// Returns `MmapError::InvalidMode` if the region is read-only or has been unmapped.
    pub fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        if !self.writable {
            return Err(MmapError::InvalidMode("mutable access on read-only region"));
        }
        let raw = self
            .raw
            .as_ref()
            .ok_or(MmapError::InvalidMode("write to an unmapped region"))?;
        // SAFETY: as in `as_slice`, plus the mapping is PROT_WRITE and `&mut self`
        // rules out other slices of this region. Aliasing through other mappings of
        // the file is excluded by the contract of `map`.
        Ok(unsafe { std::slice::from_raw_parts_mut(raw.as_ptr(), raw.len()) })
    }

    /// Copy bytes starting at `offset` into `buf`. Length is `buf.len()`.
    ///
    /// # Errors
    ///
    /// Returns `MmapError::OutOfBounds` if the range exceeds the region.
    /// Returns `MmapError::InvalidMode` if the region has been unmapped.
    pub fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let (start, end) = slice_range(offset, buf.len() as u64, self.len)?;
        buf.copy_from_slice(&self.as_slice()?[start..end]);
        Ok(())
    }

    /// Copy `data` into the region at `offset`. Empty `data` is still checked
    /// against the region's mode and state.
    ///
    /// # Errors
    ///
    /// Returns `MmapError::InvalidMode` if the region is read-only or unmapped.
    /// Returns `MmapError::OutOfBounds` if the range exceeds the region.
    pub fn update_region(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let (start, end) = slice_range(offset, data.len() as u64, self.len)?;
        let view = self.as_mut_slice()?;
        view[start..end].copy_from_slice(data);
        Ok(())
    }

    /// Release the mapping.
    ///
    /// The region stays in an unmapped state afterwards; calling `unmap` again fails
    /// rather than silently succeeding.
    ///
    /// # Errors
    ///
    /// Returns `MmapError::UnmapFailed` if the region is already unmapped or the OS
    /// rejects the release.
    pub fn unmap(&mut self) -> Result<()> {
        let raw = self
            .raw
            .take()
            .ok_or_else(|| MmapError::UnmapFailed(invalid_input(ERR_NOT_MAPPED)))?;
        raw.unmap().map_err(MmapError::UnmapFailed)?;
        log::debug!("unmapped {} bytes of file {:?}", self.len, self.file_id);
        Ok(())
    }

    /// Block until every dirty page of the region is on stable storage.
    ///
    /// # Errors
    ///
    /// Returns `MmapError::SyncFailed` if the region is read-only or unmapped, or if
    /// the storage write fails. A failure here means earlier writes may not be durable.
    pub fn sync(&self) -> Result<()> {
        self.sync_range(0, self.len)
    }

    /// Like [`sync`](Self::sync) but only for `[offset, offset + len)`. The start is
    /// widened down to a page boundary.
    ///
    /// # Errors
    ///
    /// Returns `MmapError::SyncFailed` as `sync` does.
    /// Returns `MmapError::OutOfBounds` if the range exceeds the region.
    pub fn sync_range(&self, offset: u64, len: u64) -> Result<()> {
        let raw = self.writable_raw()?;
        let (start, end) = slice_range(offset, len, self.len)?;
        if start == end {
            return Ok(());
        }
        let (start, span) = page_span(start, end);
        raw.sync(start, span).map_err(MmapError::SyncFailed)?;
        log::debug!("synced {span} bytes at offset {start} of file {:?}", self.file_id);
        Ok(())
    }

    fn writable_raw(&self) -> Result<&Platform> {
        let raw = self
            .raw
            .as_ref()
            .ok_or_else(|| MmapError::SyncFailed(invalid_input(ERR_NOT_MAPPED)))?;
        if !self.writable {
            return Err(MmapError::SyncFailed(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "sync requires a writable region",
            )));
        }
        Ok(raw)
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            if let Err(e) = raw.unmap() {
                log::warn!("failed to unmap region of file {:?} on drop: {e}", self.file_id);
            }
        }
    }
}
