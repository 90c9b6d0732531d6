//! Access-pattern hints for the kernel's readahead heuristics.

use crate::errors::{invalid_input, MmapError, Result};
use crate::os::RawMapping;
use crate::region::MappedRegion;
use crate::utils::{page_span, slice_range};

/// Expected access pattern for a mapped region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPattern {
    /// Pages will be read in order; prefetch aggressively.
    Sequential,
    /// Pages will be touched in random order; avoid wasted readahead.
    Random,
}

impl AccessPattern {
    /// `true` maps to `Sequential`, `false` to `Random`.
    #[must_use]
    pub fn from_readahead(readahead: bool) -> Self {
        if readahead {
            AccessPattern::Sequential
        } else {
            AccessPattern::Random
        }
    }
}

impl From<bool> for AccessPattern {
    fn from(readahead: bool) -> Self {
        Self::from_readahead(readahead)
    }
}

impl MappedRegion {
    /// Advise the OS about the expected access pattern for the whole region.
    ///
    /// The advice is a hint and has no effect on correctness. Set `readahead` to
    /// false if pages will be referenced in random order.
    ///
    /// # Platform-specific behavior
    ///
    /// - **Unix**: `madvise` with `MADV_SEQUENTIAL` or `MADV_RANDOM`
    /// - **Windows**: `PrefetchVirtualMemory` for readahead, no-op otherwise
    ///
    /// # Errors
    ///
    /// Returns `MmapError::AdviseFailed` if the region is unmapped or the hint is rejected.
    pub fn advise(&self, readahead: bool) -> Result<()> {
        self.advise_range(0, self.len(), readahead)
    }

    /// Advise on `[offset, offset + len)` only. The start is widened down to a page
    /// boundary. An empty range is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `MmapError::OutOfBounds` if the range exceeds the region.
    /// Returns `MmapError::AdviseFailed` if the region is unmapped or the hint is rejected.
    pub fn advise_range(&self, offset: u64, len: u64, readahead: bool) -> Result<()> {
        let raw = self
            .raw()
            .ok_or_else(|| MmapError::AdviseFailed(invalid_input("region is not mapped")))?;
        let (start, end) = slice_range(offset, len, self.len())?;
        if start == end {
            return Ok(());
        }
        let (start, span) = page_span(start, end);
        raw.advise(start, span, AccessPattern::from_readahead(readahead))
            .map_err(MmapError::AdviseFailed)
    }

    /// Advise as [`advise`](Self::advise) does, logging a rejected hint instead of
    /// returning it. Returns whether the hint was accepted.
    pub fn advise_or_warn(&self, readahead: bool) -> bool {
        match self.advise(readahead) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("ignoring rejected access-pattern hint (readahead={readahead}): {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn mapped(len: usize) -> (tempfile::NamedTempFile, MappedRegion) {
        let mut f = tempfile::NamedTempFile::new().expect("tempfile");
        f.write_all(&vec![0u8; len]).expect("write");
        let file = f.reopen().expect("reopen");
        // SAFETY: the temp file is private to this test and never written afterwards.
        let region = unsafe { MappedRegion::map(&file, false, len as u64) }.expect("map");
        (f, region)
    }

    #[test]
    fn readahead_flag_maps_to_pattern() {
        assert_eq!(AccessPattern::from(true), AccessPattern::Sequential);
        assert_eq!(AccessPattern::from(false), AccessPattern::Random);
    }

    #[test]
    fn test_advise_ranges() {
        let (_f, region) = mapped(8192);

        region.advise_range(0, 4096, true).expect("sequential advice");
        region.advise_range(4096, 4096, false).expect("random advice");
        region.advise_range(100, 10, true).expect("unaligned start");

        // Empty range is a no-op
        region.advise_range(0, 0, true).expect("empty range");

        assert!(matches!(
            region.advise_range(8192, 1, true),
            Err(MmapError::OutOfBounds { .. })
        ));
        assert!(region.advise_range(0, 8193, false).is_err());
    }

    #[test]
    fn advise_after_unmap_fails() {
        let (_f, mut region) = mapped(4096);
        region.unmap().expect("unmap");
        assert!(matches!(region.advise(true), Err(MmapError::AdviseFailed(_))));
        assert!(!region.advise_or_warn(false));
    }
}
