//! Platform backends behind one mapping contract.
//!
//! Each supported OS provides a [`RawMapping`] implementation; [`Platform`] names the
//! one compiled for the current target. Nothing here branches on the platform at runtime.

use std::fs::File;
use std::io;

#[cfg(feature = "advise")]
use crate::advise::AccessPattern;

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        pub(crate) use self::unix::{file_id, UnixMapping as Platform};
    } else if #[cfg(windows)] {
        mod windows;
        pub(crate) use self::windows::{file_id, WindowsMapping as Platform};
    } else {
        compile_error!("mmap-region supports only unix and windows targets");
    }
}

/// Identity of the file backing a mapping: device/volume plus inode/file index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    pub(crate) volume: u64,
    pub(crate) index: u64,
}

impl FileId {
    /// Device (Unix) or volume serial number (Windows).
    #[must_use]
    pub fn volume(&self) -> u64 {
        self.volume
    }

    /// Inode (Unix) or file index (Windows).
    #[must_use]
    pub fn index(&self) -> u64 {
        self.index
    }
}

/// One live OS mapping. Offsets handed to `advise`/`sync` are already page aligned
/// and within `len()`.
pub(crate) trait RawMapping: Sized + Send + Sync {
    /// Establish a shared mapping of the first `len` bytes of `file`.
    fn map(file: &File, writable: bool, len: usize) -> io::Result<Self>;

    /// Release the address range. Consumes the mapping so it cannot be released twice.
    fn unmap(self) -> io::Result<()>;

    #[cfg(feature = "advise")]
    fn advise(&self, offset: usize, len: usize, pattern: AccessPattern) -> io::Result<()>;

    /// Write dirty pages in `[offset, offset + len)` to storage, blocking until done.
    fn sync(&self, offset: usize, len: usize) -> io::Result<()>;

    fn as_ptr(&self) -> *mut u8;

    fn len(&self) -> usize;
}
