//! Compressibility profiles for test memory.
//!
//! A compressed-swap subsystem's per-page cost depends heavily on what the
//! page holds, so fills are chosen for their predictable compression-ratio
//! behavior rather than realism of any single byte value.

use crate::region::PAGE_SIZE;
use crate::rng::Lcg;

/// Byte-fill pattern controlling data compressibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternKind {
    /// Page-sized sub-chunks cycling through the other profiles, approximating
    /// realistic heterogeneous memory content.
    #[default]
    Mixed,
    /// Pseudo-random bytes (low compression ratio).
    Random,
    /// All zeros (high compression ratio).
    Zero,
    /// Byte at position p = (offset + p) mod 256 (medium compression ratio).
    Sequential,
}

impl PatternKind {
    /// Parse the numeric code used on the command line (0-3).
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Mixed),
            1 => Some(Self::Random),
            2 => Some(Self::Zero),
            3 => Some(Self::Sequential),
            _ => None,
        }
    }

    /// Numeric code echoed back in reports.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Mixed => 0,
            Self::Random => 1,
            Self::Zero => 2,
            Self::Sequential => 3,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Mixed => "mixed",
            Self::Random => "random",
            Self::Zero => "zero",
            Self::Sequential => "sequential",
        }
    }
}

/// Fill `buf` deterministically with the given pattern.
///
/// `offset` is the absolute byte offset of `buf[0]` within the region, so a
/// region filled in chunks is byte-identical to one filled in a single call.
/// Always succeeds; the only side effect is the write itself.
pub fn fill(buf: &mut [u8], kind: PatternKind, offset: usize, rng: &mut Lcg) {
    match kind {
        PatternKind::Random => {
            for byte in buf.iter_mut() {
                *byte = rng.next_byte();
            }
        }
        PatternKind::Zero => {
            buf.fill(0);
        }
        PatternKind::Sequential => {
            for (p, byte) in buf.iter_mut().enumerate() {
                *byte = ((offset + p) % 256) as u8;
            }
        }
        PatternKind::Mixed => {
            let mut pos = 0;
            while pos < buf.len() {
                let chunk_len = PAGE_SIZE.min(buf.len() - pos);
                let chunk_offset = offset + pos;
                let chunk = &mut buf[pos..pos + chunk_len];

                match (chunk_offset / PAGE_SIZE) % 4 {
                    0 => {
                        for byte in chunk.iter_mut() {
                            *byte = rng.next_byte();
                        }
                    }
                    1 => chunk.fill((chunk_offset % 256) as u8),
                    2 => chunk.fill(0),
                    _ => {
                        for (p, byte) in chunk.iter_mut().enumerate() {
                            *byte = ((chunk_offset + p) % 256) as u8;
                        }
                    }
                }
                pos += chunk_len;
            }
        }
    }
}

/// Fill `buf` with one repeated byte per page: page `p` holds `p % 256`.
///
/// This is the mixed-workload fill; every page is uniformly compressible and
/// its content identifies the page. `offset` is the absolute byte offset of
/// `buf[0]` within the region, so chunked fills stay page-accurate.
pub fn fill_page_repeated(buf: &mut [u8], offset: usize) {
    let mut pos = 0;
    while pos < buf.len() {
        // Never cross a page boundary, even from an unaligned start.
        let in_page = (offset + pos) % PAGE_SIZE;
        let chunk_len = (PAGE_SIZE - in_page).min(buf.len() - pos);
        let page = (offset + pos) / PAGE_SIZE;
        buf[pos..pos + chunk_len].fill((page % 256) as u8);
        pos += chunk_len;
    }
}
