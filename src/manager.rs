//! Free-function façade over [`MappedRegion`].
//!
//! Mirrors the four operations one to one for callers that prefer functions to methods.

use std::fs::File;

use crate::errors::Result;
use crate::region::MappedRegion;

/// Map the first `len` bytes of `file`, read-only or read-write.
///
/// # Errors
///
/// Returns errors from `MappedRegion::map`.
///
/// # Safety
///
/// See [`MappedRegion::map`]: the mapped bytes must not be modified or truncated from
/// outside the returned region while its slices are borrowed.
pub unsafe fn map(file: &File, writable: bool, len: u64) -> Result<MappedRegion> {
    // SAFETY: the caller upholds the contract of `MappedRegion::map`.
    unsafe { MappedRegion::map(file, writable, len) }
}

/// Release a region's mapping.
///
/// # Errors
///
/// Returns errors from `MappedRegion::unmap`.
pub fn unmap(region: &mut MappedRegion) -> Result<()> {
    region.unmap()
}

/// Hint the expected access pattern for a region.
///
/// # Errors
///
/// Returns errors from `MappedRegion::advise`.
#[cfg(feature = "advise")]
pub fn advise(region: &MappedRegion, readahead: bool) -> Result<()> {
    region.advise(readahead)
}

/// Flush a writable region's dirty pages to storage.
///
/// # Errors
///
/// Returns errors from `MappedRegion::sync`.
pub fn sync(region: &MappedRegion) -> Result<()> {
    region.sync()
}
