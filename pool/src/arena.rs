//! Pre-allocated buffer arena for pooled I/O contexts.
//!
//! A [`BufferArena`] owns one large contiguous byte region, allocated once and
//! carved into fixed-length segments on demand. Handing out a segment is O(1)
//! (a split at the cursor) and there is no fragmentation bookkeeping: issued
//! slices are never reclaimed, so the footprint only grows.
//!
//! # Growth
//!
//! When the active region cannot satisfy a request, a fresh, independently
//! allocated region of the original size is appended and the cursor restarts
//! there. Outstanding slices keep their regions alive, so growth never
//! invalidates anything already issued. Any unissued tail of the old region is
//! abandoned.

use crate::Error;
use bytes::BytesMut;
use tracing::warn;

/// An exclusively-owned fixed window into an arena region.
///
/// The window's position and length never change after creation. `BufferSlice`
/// is intentionally not `Clone`: exactly one owner exists, so mutable access
/// is race-free by construction. Dropping a slice releases its keep-alive on
/// the backing region but never returns bytes to the arena.
pub struct BufferSlice {
    data: BytesMut,
}

impl BufferSlice {
    /// Returns the fixed length of the slice.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the slice has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a raw pointer to the slice's first byte.
    ///
    /// Useful for identity checks (two live slices never share an address)
    /// and for handing the window to platform I/O calls.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }
}

impl AsRef<[u8]> for BufferSlice {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl AsMut<[u8]> for BufferSlice {
    #[inline]
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl std::fmt::Debug for BufferSlice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferSlice")
            .field("ptr", &self.data.as_ptr())
            .field("len", &self.data.len())
            .finish()
    }
}

/// A contiguous memory region subdivided into fixed-size slices.
///
/// Created once at pool construction and lives as long as the pool. Slices
/// issued from the same region are pairwise disjoint and address-contiguous
/// in issue order.
pub struct BufferArena {
    /// Fixed upper bound on the length of any issued slice.
    slice_size: usize,
    /// Slots per region; each growth allocates `slots * slice_size` bytes.
    slots: usize,
    /// Unissued remainder of the active region.
    region: BytesMut,
    /// Number of regions allocated so far.
    regions: usize,
}

impl BufferArena {
    /// Pre-allocates a single region of `total_slots * slice_size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `total_slots * slice_size` overflows `usize`.
    pub fn new(total_slots: usize, slice_size: usize) -> Self {
        let bytes = total_slots
            .checked_mul(slice_size)
            .expect("total_slots * slice_size overflows usize");
        Self {
            slice_size,
            slots: total_slots,
            region: BytesMut::zeroed(bytes),
            regions: 1,
        }
    }

    /// Takes the next unused `len` bytes, advancing the internal cursor.
    ///
    /// Allocates a fresh region when the active one cannot satisfy the
    /// request; the request itself never fails for `len <= slice_size`.
    ///
    /// # Errors
    ///
    /// [`Error::CapacityExceeded`] if `len` exceeds the arena's slice size.
    pub fn take_slice(&mut self, len: usize) -> Result<BufferSlice, Error> {
        if len > self.slice_size {
            return Err(Error::CapacityExceeded(len, self.slice_size));
        }
        if self.region.len() < len {
            // A new region keeps outstanding slices valid; growing the
            // original in place would move them.
            let bytes = self.slots.max(1) * self.slice_size;
            self.region = BytesMut::zeroed(bytes);
            self.regions += 1;
            warn!(
                regions = self.regions,
                bytes, "arena exhausted, allocated new region"
            );
        }
        Ok(BufferSlice {
            data: self.region.split_to(len),
        })
    }

    /// Returns the fixed per-slice size limit.
    #[inline]
    pub fn slice_size(&self) -> usize {
        self.slice_size
    }

    /// Returns the number of regions allocated so far (1 until first growth).
    #[inline]
    pub fn regions(&self) -> usize {
        self.regions
    }
}

impl std::fmt::Debug for BufferArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferArena")
            .field("slice_size", &self.slice_size)
            .field("slots", &self.slots)
            .field("remaining", &self.region.len())
            .field("regions", &self.regions)
            .finish()
    }
}
