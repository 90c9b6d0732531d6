//! Map requests the OS must never see: zero, past EOF, oversized, non-files.

use mmap_region::{map, MapOptions, MappedRegion, MmapError};
use std::fs::File;
use std::io::{ErrorKind, Write};

fn map_file(file: &File, writable: bool, len: u64) -> Result<MappedRegion, MmapError> {
    // SAFETY: every test owns its file; regions of one file are never borrowed
    // while another region of it writes, and nothing truncates the file.
    unsafe { map(file, writable, len) }
}

fn seeded(len: usize) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("tempfile");
    f.write_all(&vec![0u8; len]).expect("seed");
    f
}

#[test]
fn zero_length_fails() {
    let f = seeded(4096);
    let file = f.reopen().expect("reopen");
    for writable in [false, true] {
        match map_file(&file, writable, 0) {
            Err(MmapError::MapFailed(e)) => assert_eq!(e.kind(), ErrorKind::InvalidInput),
            other => panic!("expected MapFailed, got {other:?}"),
        }
    }
}

#[test]
fn empty_file_whole_map_fails() {
    let f = seeded(0);
    let file = f.reopen().expect("reopen");
    // SAFETY: nothing is mapped; the call must fail before mapping.
    // SAFETY: the file is empty, so the call fails before anything is mapped.
    assert!(matches!(
        unsafe { MapOptions::new().map(&file) },
        Err(MmapError::MapFailed(_))
    ));
}

#[test]
fn length_past_eof_fails() {
    let f = seeded(100);
    let file = f.reopen().expect("reopen");
    assert!(map_file(&file, false, 100).is_ok());
    match map_file(&file, false, 101) {
        Err(MmapError::MapFailed(e)) => assert_eq!(e.kind(), ErrorKind::InvalidInput),
        other => panic!("expected MapFailed, got {other:?}"),
    }
    assert!(matches!(map_file(&file, true, 4096), Err(MmapError::MapFailed(_))));
}

#[test]
fn oversized_length_fails() {
    let f = seeded(16);
    let file = f.reopen().expect("reopen");
    assert!(matches!(map_file(&file, false, u64::MAX), Err(MmapError::MapFailed(_))));
}

#[test]
fn writable_map_needs_writable_handle() {
    let f = seeded(4096);
    let ro = File::open(f.path()).expect("open ro");
    let err = map_file(&ro, true, 4096).expect_err("must fail");
    assert!(matches!(err, MmapError::MapFailed(_)));
    assert!(err.os_error().and_then(std::io::Error::raw_os_error).is_some());
}

#[cfg(unix)]
#[test]
fn pipe_cannot_be_mapped() {
    use std::os::unix::io::FromRawFd;

    let mut fds = [0i32; 2];
    // SAFETY: fds has room for the two descriptors pipe writes.
    assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
    // SAFETY: both descriptors were just created and are owned by these Files.
    let (reader, _writer) = unsafe { (File::from_raw_fd(fds[0]), File::from_raw_fd(fds[1])) };

    assert!(matches!(map_file(&reader, false, 4096), Err(MmapError::MapFailed(_))));
}
