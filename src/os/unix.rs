//! Unix backend: `mmap`/`munmap`/`madvise`/`msync` through libc.

use std::fs::File;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::os::unix::io::AsRawFd;
use std::ptr;

#[cfg(feature = "advise")]
use crate::advise::AccessPattern;

use super::{FileId, RawMapping};

pub(crate) struct UnixMapping {
    ptr: *mut u8,
    len: usize,
}

// SAFETY: the mapping is plain shared memory with no thread affinity; aliasing of
// the bytes is governed by the borrows handed out by `MappedRegion`.
unsafe impl Send for UnixMapping {}
unsafe impl Sync for UnixMapping {}

impl RawMapping for UnixMapping {
    fn map(file: &File, writable: bool, len: usize) -> io::Result<Self> {
        let prot = if writable {
            libc::PROT_READ | libc::PROT_WRITE
        } else {
            libc::PROT_READ
        };
        // SAFETY: a null hint lets the kernel choose the address; the descriptor is
        // borrowed for the call only and the result is checked against MAP_FAILED.
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                prot,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            ptr: ptr.cast::<u8>(),
            len,
        })
    }

    fn unmap(self) -> io::Result<()> {
        // SAFETY: ptr/len describe a mapping created by `map`; `self` is consumed so
        // the range is never released twice through this value.
        let result = unsafe { libc::munmap(self.ptr.cast::<libc::c_void>(), self.len) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(feature = "advise")]
    fn advise(&self, offset: usize, len: usize, pattern: AccessPattern) -> io::Result<()> {
        let flag = match pattern {
            AccessPattern::Sequential => libc::MADV_SEQUENTIAL,
            AccessPattern::Random => libc::MADV_RANDOM,
        };
        // SAFETY: the caller keeps [offset, offset+len) inside the mapping.
        let result = unsafe { libc::madvise(self.ptr.add(offset).cast::<libc::c_void>(), len, flag) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn sync(&self, offset: usize, len: usize) -> io::Result<()> {
        // SAFETY: the caller keeps [offset, offset+len) inside the mapping.
        let result =
            unsafe { libc::msync(self.ptr.add(offset).cast::<libc::c_void>(), len, libc::MS_SYNC) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn as_ptr(&self) -> *mut u8 {
        self.ptr
    }

    fn len(&self) -> usize {
        self.len
    }
}

pub(crate) fn file_id(file: &File) -> io::Result<FileId> {
    let meta = file.metadata()?;
    Ok(FileId {
        volume: meta.dev(),
        index: meta.ino(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn raw_map_sees_file_bytes() {
        let mut file = tempfile::tempfile().expect("tempfile");
        file.write_all(b"raw unix mapping").expect("write");

        let m = UnixMapping::map(&file, false, 16).expect("map");
        // SAFETY: the mapping is live and 16 bytes long.
        let bytes = unsafe { std::slice::from_raw_parts(m.as_ptr(), m.len()) };
        assert_eq!(bytes, b"raw unix mapping");
        m.unmap().expect("unmap");
    }

    #[test]
    fn writable_map_of_read_only_descriptor_is_refused() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(&[0u8; 64]).expect("write");
        let ro = File::open(file.path()).expect("open ro");

        let err = UnixMapping::map(&ro, true, 64).err().expect("must fail");
        assert_eq!(err.raw_os_error(), Some(libc::EACCES));
    }

    #[test]
    fn file_id_matches_for_same_file() {
        let file = tempfile::NamedTempFile::new().expect("tempfile");
        let a = File::open(file.path()).expect("open a");
        let b = File::open(file.path()).expect("open b");
        assert_eq!(file_id(&a).expect("id a"), file_id(&b).expect("id b"));
    }
}
