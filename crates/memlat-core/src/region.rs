//! Anonymous memory region owned by the workload driver.
//!
//! `mmap` rather than the allocator so the region is page-aligned and can be
//! released wholesale, and so eviction hints address exactly the pages under
//! test. Torn down exactly once on drop, whether the run completed or was
//! interrupted.

use crate::error::{Error, Result};
use nix::libc::{
    madvise, mlock, mmap, munlock, munmap, MADV_PAGEOUT, MADV_RANDOM, MADV_SEQUENTIAL,
    MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE,
};
use std::ptr::null_mut;
use tracing::warn;

/// Granularity at which eviction and fault costs are measured.
pub const PAGE_SIZE: usize = 4096;

/// A page-aligned anonymous mapping with exclusive ownership for the run.
#[derive(Debug)]
pub struct MemoryRegion {
    base: *mut u8,
    len: usize,
}

// The region is only ever accessed by its single logical owner; the raw
// pointer is an implementation detail of the mapping.
unsafe impl Send for MemoryRegion {}

impl MemoryRegion {
    /// Map `len` bytes of anonymous memory.
    ///
    /// `len` must be a non-zero multiple of [`PAGE_SIZE`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Map`] if the kernel refuses the mapping.
    pub fn anonymous(len: usize) -> Result<Self> {
        debug_assert!(len > 0 && len % PAGE_SIZE == 0);
        let base = unsafe {
            mmap(
                null_mut(),
                len,
                PROT_READ | PROT_WRITE,
                MAP_PRIVATE | MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if base == MAP_FAILED {
            return Err(Error::Map {
                len,
                source: std::io::Error::last_os_error(),
            });
        }
        Ok(Self {
            base: base.cast::<u8>(),
            len,
        })
    }

    /// Total length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; a region is at least one page.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of whole pages in the region.
    #[must_use]
    pub fn num_pages(&self) -> usize {
        self.len / PAGE_SIZE
    }

    /// The whole region as a mutable byte slice.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.base, self.len) }
    }

    /// Hint the expected access order to the kernel.
    ///
    /// Advisory only; a refusal is logged and ignored.
    pub fn advise_sequential(&self, sequential: bool) {
        let advice = if sequential {
            MADV_SEQUENTIAL
        } else {
            MADV_RANDOM
        };
        let rc = unsafe { madvise(self.base.cast(), self.len, advice) };
        if rc != 0 {
            warn!(
                error = %std::io::Error::last_os_error(),
                "madvise access hint refused"
            );
        }
    }

    /// Ask the kernel to evict one page from resident memory.
    ///
    /// Returns whether the hint was accepted. A refusal is a per-page
    /// non-event, not an error: the caller drops the would-be sample.
    #[must_use]
    pub fn pageout(&self, page: usize) -> bool {
        debug_assert!(page < self.num_pages());
        let addr = unsafe { self.base.add(page * PAGE_SIZE) };
        unsafe { madvise(addr.cast(), PAGE_SIZE, MADV_PAGEOUT) == 0 }
    }

    /// Read one byte from a page with a volatile load.
    ///
    /// Volatile so the touch that triggers the fault/decompress cannot be
    /// optimized away or hoisted out of the timed window.
    #[must_use]
    pub fn read_byte(&self, page: usize) -> u8 {
        debug_assert!(page < self.num_pages());
        unsafe { self.base.add(page * PAGE_SIZE).read_volatile() }
    }

    /// Store one byte into a page with a volatile store.
    pub fn write_byte(&mut self, page: usize, value: u8) {
        debug_assert!(page < self.num_pages());
        unsafe { self.base.add(page * PAGE_SIZE).write_volatile(value) }
    }

    /// Pin the region in RAM so it is never swapped.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the kernel refuses (RLIMIT_MEMLOCK, missing
    /// privilege, insufficient memory). The region stays usable either way.
    pub fn lock(&self) -> std::io::Result<()> {
        let rc = unsafe { mlock(self.base.cast(), self.len) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }

    /// Release a previous [`lock`](Self::lock). Refusals are logged only.
    pub fn unlock(&self) {
        let rc = unsafe { munlock(self.base.cast(), self.len) };
        if rc != 0 {
            warn!(error = %std::io::Error::last_os_error(), "munlock failed");
        }
    }
}

impl Drop for MemoryRegion {
    fn drop(&mut self) {
        let rc = unsafe { munmap(self.base.cast(), self.len) };
        if rc != 0 {
            // Never retried; the process is on its way out anyway.
            warn!(
                len = self.len,
                error = %std::io::Error::last_os_error(),
                "munmap failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_mapping_basic() {
        let region = MemoryRegion::anonymous(4 * PAGE_SIZE).unwrap();
        assert_eq!(region.len(), 4 * PAGE_SIZE);
        assert_eq!(region.num_pages(), 4);
        assert!(!region.is_empty());
    }

    #[test]
    fn test_fresh_pages_read_zero() {
        let region = MemoryRegion::anonymous(2 * PAGE_SIZE).unwrap();
        assert_eq!(region.read_byte(0), 0);
        assert_eq!(region.read_byte(1), 0);
    }

    #[test]
    fn test_byte_write_read_round_trip() {
        let mut region = MemoryRegion::anonymous(2 * PAGE_SIZE).unwrap();
        region.write_byte(1, 0xab);
        assert_eq!(region.read_byte(1), 0xab);
        assert_eq!(region.read_byte(0), 0);
    }

    #[test]
    fn test_slice_covers_whole_region() {
        let mut region = MemoryRegion::anonymous(3 * PAGE_SIZE).unwrap();
        let slice = region.as_mut_slice();
        assert_eq!(slice.len(), 3 * PAGE_SIZE);
        slice[3 * PAGE_SIZE - 1] = 7;
        assert_eq!(region.as_mut_slice()[3 * PAGE_SIZE - 1], 7);
    }

    #[test]
    fn test_advise_and_pageout_do_not_crash() {
        let mut region = MemoryRegion::anonymous(PAGE_SIZE).unwrap();
        region.advise_sequential(true);
        region.advise_sequential(false);
        region.write_byte(0, 1);
        // Acceptance depends on the kernel; either answer is valid here.
        let _ = region.pageout(0);
    }

    #[test]
    fn test_drop_releases_mapping() {
        for _ in 0..32 {
            let region = MemoryRegion::anonymous(16 * PAGE_SIZE).unwrap();
            drop(region);
        }
    }
}
