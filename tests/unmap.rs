//! Unmap contract: exactly one successful release per region.

use mmap_region::{map, unmap, MappedRegion, MmapError};
use parking_lot::Mutex;
use std::fs::File;
use std::io::Write;
use std::sync::Arc;

fn map_file(file: &File, writable: bool, len: u64) -> Result<MappedRegion, MmapError> {
    // SAFETY: every test owns its file; regions of one file are never borrowed
    // while another region of it writes, and nothing truncates the file.
    unsafe { map(file, writable, len) }
}

fn seeded(len: usize) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("tempfile");
    f.write_all(&vec![0x5A; len]).expect("seed");
    f
}

#[test]
fn second_unmap_fails() {
    let f = seeded(4096);
    let file = f.reopen().expect("reopen");
    let mut region = map_file(&file, false, 4096).expect("map");

    unmap(&mut region).expect("first unmap");
    match unmap(&mut region) {
        Err(MmapError::UnmapFailed(e)) => {
            assert_eq!(e.kind(), std::io::ErrorKind::InvalidInput);
        }
        other => panic!("expected UnmapFailed, got {other:?}"),
    }
}

#[test]
fn concurrent_unmap_has_one_winner() {
    let f = seeded(8192);
    let file = f.reopen().expect("reopen");
    let region = Arc::new(Mutex::new(map_file(&file, true, 8192).expect("map")));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let region = Arc::clone(&region);
            std::thread::spawn(move || region.lock().unmap())
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("join"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(MmapError::UnmapFailed(_)))));
    assert!(!region.lock().is_mapped());
}

#[test]
fn dropping_mapped_region_releases_it() {
    let f = seeded(4096);
    let file = f.reopen().expect("reopen");
    for _ in 0..64 {
        let region = map_file(&file, true, 4096).expect("map");
        assert!(region.is_mapped());
    }
}
