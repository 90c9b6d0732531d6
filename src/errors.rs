//! Crate-specific error types for mmap-region.

use std::io;
use thiserror::Error;

/// Result alias for mmap-region operations.
pub type Result<T> = std::result::Result<T, MmapError>;

/// Error type covering the four mapping operations plus view access.
///
/// The OS-facing variants keep the underlying [`io::Error`] untouched so callers
/// can inspect `raw_os_error()` for platform-specific diagnostics.
#[derive(Debug, Error)]
pub enum MmapError {
    /// The OS declined to establish the mapping, or the request was invalid.
    #[error("map failed: {0}")]
    MapFailed(#[source] io::Error),

    /// The region was not an active mapping (double unmap) or the OS rejected the release.
    #[error("unmap failed: {0}")]
    UnmapFailed(#[source] io::Error),

    /// The platform rejected an access-pattern hint.
    #[error("advise failed: {0}")]
    AdviseFailed(#[source] io::Error),

    /// Dirty pages could not be written to stable storage.
    #[error("sync failed: {0}")]
    SyncFailed(#[source] io::Error),

    /// Error returned when attempting an operation in an incompatible mode.
    #[error("invalid access mode: {0}")]
    InvalidMode(&'static str),

    /// Error when a requested offset/length pair is out of bounds.
    #[error("range out of bounds: offset={offset}, len={len}, total={total}")]
    OutOfBounds {
        /// Requested offset.
        offset: u64,
        /// Requested length.
        len: u64,
        /// Total size of the mapped region.
        total: u64,
    },
}

impl MmapError {
    /// The wrapped OS error, if this is one of the four operation failures.
    #[must_use]
    pub fn os_error(&self) -> Option<&io::Error> {
        match self {
            MmapError::MapFailed(e)
            | MmapError::UnmapFailed(e)
            | MmapError::AdviseFailed(e)
            | MmapError::SyncFailed(e) => Some(e),
            MmapError::InvalidMode(_) | MmapError::OutOfBounds { .. } => None,
        }
    }
}

pub(crate) fn invalid_input(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}
