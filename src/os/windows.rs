//! Windows backend: file-mapping sections and views through kernel32.

use std::ffi::c_void;
use std::fs::File;
use std::io;
use std::mem::MaybeUninit;
use std::os::windows::io::AsRawHandle;
use std::ptr;

#[cfg(feature = "advise")]
use crate::advise::AccessPattern;

use super::{FileId, RawMapping};

type Handle = *mut c_void;

const PAGE_READONLY: u32 = 0x02;
const PAGE_READWRITE: u32 = 0x04;
const FILE_MAP_WRITE: u32 = 0x0002;
const FILE_MAP_READ: u32 = 0x0004;
const DUPLICATE_SAME_ACCESS: u32 = 0x0002;

#[allow(non_snake_case)]
#[repr(C)]
struct FILETIME {
    dwLowDateTime: u32,
    dwHighDateTime: u32,
}

#[allow(non_snake_case)]
#[repr(C)]
struct BY_HANDLE_FILE_INFORMATION {
    dwFileAttributes: u32,
    ftCreationTime: FILETIME,
    ftLastAccessTime: FILETIME,
    ftLastWriteTime: FILETIME,
    dwVolumeSerialNumber: u32,
    nFileSizeHigh: u32,
    nFileSizeLow: u32,
    nNumberOfLinks: u32,
    nFileIndexHigh: u32,
    nFileIndexLow: u32,
}

#[cfg(feature = "advise")]
#[allow(non_snake_case)]
#[repr(C)]
struct WIN32_MEMORY_RANGE_ENTRY {
    VirtualAddress: *mut c_void,
    NumberOfBytes: usize,
}

extern "system" {
    fn CreateFileMappingW(
        hFile: Handle,
        lpFileMappingAttributes: *mut c_void,
        flProtect: u32,
        dwMaximumSizeHigh: u32,
        dwMaximumSizeLow: u32,
        lpName: *const u16,
    ) -> Handle;

    fn MapViewOfFile(
        hFileMappingObject: Handle,
        dwDesiredAccess: u32,
        dwFileOffsetHigh: u32,
        dwFileOffsetLow: u32,
        dwNumberOfBytesToMap: usize,
    ) -> *mut c_void;

    fn UnmapViewOfFile(lpBaseAddress: *const c_void) -> i32;

    fn FlushViewOfFile(lpBaseAddress: *const c_void, dwNumberOfBytesToFlush: usize) -> i32;

    fn FlushFileBuffers(hFile: Handle) -> i32;

    fn CloseHandle(hObject: Handle) -> i32;

    fn DuplicateHandle(
        hSourceProcessHandle: Handle,
        hSourceHandle: Handle,
        hTargetProcessHandle: Handle,
        lpTargetHandle: *mut Handle,
        dwDesiredAccess: u32,
        bInheritHandle: i32,
        dwOptions: u32,
    ) -> i32;

    fn GetCurrentProcess() -> Handle;

    fn GetFileInformationByHandle(
        hFile: Handle,
        lpFileInformation: *mut BY_HANDLE_FILE_INFORMATION,
    ) -> i32;

    #[cfg(feature = "advise")]
    fn PrefetchVirtualMemory(
        hProcess: Handle,
        NumberOfEntries: usize,
        VirtualAddresses: *const WIN32_MEMORY_RANGE_ENTRY,
        Flags: u32,
    ) -> i32;
}

pub(crate) struct WindowsMapping {
    ptr: *mut u8,
    len: usize,
    // Our own duplicate of the caller's handle, used by FlushFileBuffers. Only
    // writable mappings carry one.
    flush_handle: Option<Handle>,
}

// SAFETY: view addresses and kernel handles are process-wide; aliasing of the bytes
// is governed by the borrows handed out by `MappedRegion`.
unsafe impl Send for WindowsMapping {}
unsafe impl Sync for WindowsMapping {}

fn duplicate(handle: Handle) -> io::Result<Handle> {
    let mut out: Handle = ptr::null_mut();
    // SAFETY: both process handles are the current-process pseudo handle and `out`
    // is a valid place to write the duplicate.
    let ok = unsafe {
        let process = GetCurrentProcess();
        DuplicateHandle(process, handle, process, &mut out, 0, 0, DUPLICATE_SAME_ACCESS)
    };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(out)
}

impl RawMapping for WindowsMapping {
    #[allow(clippy::cast_possible_truncation)]
    fn map(file: &File, writable: bool, len: usize) -> io::Result<Self> {
        let (protect, access) = if writable {
            (PAGE_READWRITE, FILE_MAP_WRITE)
        } else {
            (PAGE_READONLY, FILE_MAP_READ)
        };
        let handle = file.as_raw_handle() as Handle;
        let size = len as u64;

        // SAFETY: the file handle is borrowed for the call; a null return is checked.
        let section = unsafe {
            CreateFileMappingW(
                handle,
                ptr::null_mut(),
                protect,
                (size >> 32) as u32,
                (size & 0xFFFF_FFFF) as u32,
                ptr::null(),
            )
        };
        if section.is_null() {
            return Err(io::Error::last_os_error());
        }

        // SAFETY: `section` is a valid mapping object created above.
        let view = unsafe { MapViewOfFile(section, access, 0, 0, len) };
        let view_err = view.is_null().then(io::Error::last_os_error);
        // The view keeps the section alive on its own.
        // SAFETY: `section` is owned here and closed exactly once.
        unsafe { CloseHandle(section) };
        if let Some(err) = view_err {
            return Err(err);
        }

        let flush_handle = if writable {
            match duplicate(handle) {
                Ok(h) => Some(h),
                Err(err) => {
                    // SAFETY: `view` was returned by MapViewOfFile above.
                    unsafe { UnmapViewOfFile(view) };
                    return Err(err);
                }
            }
        } else {
            None
        };

        Ok(Self {
            ptr: view.cast::<u8>(),
            len,
            flush_handle,
        })
    }

    fn unmap(self) -> io::Result<()> {
        // SAFETY: `ptr` is the base of a view from `map`; `self` is consumed.
        let unmapped = unsafe { UnmapViewOfFile(self.ptr.cast::<c_void>()) };
        let result = if unmapped == 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        };
        if let Some(h) = self.flush_handle {
            // SAFETY: the duplicate is owned by this mapping and closed exactly once.
            unsafe { CloseHandle(h) };
        }
        result
    }

    #[cfg(feature = "advise")]
    fn advise(&self, offset: usize, len: usize, pattern: AccessPattern) -> io::Result<()> {
        // Windows has no hint to suppress readahead; random access is accepted as-is.
        if pattern == AccessPattern::Random {
            return Ok(());
        }
        let entry = WIN32_MEMORY_RANGE_ENTRY {
            // SAFETY: the caller keeps [offset, offset+len) inside the view.
            VirtualAddress: unsafe { self.ptr.add(offset) }.cast::<c_void>(),
            NumberOfBytes: len,
        };
        // SAFETY: one entry describing memory inside a live view.
        let ok = unsafe { PrefetchVirtualMemory(GetCurrentProcess(), 1, &entry, 0) };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn sync(&self, offset: usize, len: usize) -> io::Result<()> {
        // SAFETY: the caller keeps [offset, offset+len) inside the view.
        let ok = unsafe { FlushViewOfFile(self.ptr.add(offset).cast::<c_void>(), len) };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        // FlushViewOfFile only queues the writes; FlushFileBuffers waits for the device.
        let handle = self.flush_handle.ok_or_else(|| {
            io::Error::new(io::ErrorKind::PermissionDenied, "mapping is read-only")
        })?;
        // SAFETY: `handle` is our live duplicate of the file handle.
        if unsafe { FlushFileBuffers(handle) } == 0 {
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
    let mut info = MaybeUninit::<BY_HANDLE_FILE_INFORMATION>::uninit();
    // SAFETY: the handle is borrowed for the call and `info` is written on success.
    let ok = unsafe { GetFileInformationByHandle(file.as_raw_handle() as Handle, info.as_mut_ptr()) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: the call succeeded, so the struct is initialised.
    let info = unsafe { info.assume_init() };
    Ok(FileId {
        volume: u64::from(info.dwVolumeSerialNumber),
        index: (u64::from(info.nFileIndexHigh) << 32) | u64::from(info.nFileIndexLow),
    })
}
