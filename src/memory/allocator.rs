//! Offset allocator with free-block coalescing.
//!
//! Tracks a logical address space `[0, peak)` and assigns byte offsets to
//! buffer requests: first-fit reuse of freed space, bump allocation past the
//! high-water mark when nothing fits. No physical memory exists until
//! [`OffsetAllocator::materialize`] requests exactly `peak` bytes from the
//! device runtime; after that the layout is frozen.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::runtime::{DevicePtr, DeviceRuntime, RuntimeResult};
use crate::tensor::DType;

/// Plans buffer offsets within a single backing region.
///
/// Lifecycle is two-phase: alloc/free are only legal while planning; the
/// first `materialize` call binds physical memory and freezes the layout.
/// Offsets already handed out would not survive a layout change, so calling
/// alloc/free afterwards is a programming error and panics.
#[derive(Debug)]
pub struct OffsetAllocator {
    runtime: Arc<dyn DeviceRuntime>,
    /// Padding unit; every request is rounded up to a multiple of this.
    alignment: usize,
    /// Bytes currently allocated (logical).
    used: usize,
    /// High-water mark; the size requested from the runtime at materialization.
    peak: usize,
    /// Free regions, offset -> size. Entries never overlap or touch.
    free_blocks: BTreeMap<usize, usize>,
    /// Physical backing, bound at most once.
    backing: Option<DevicePtr>,
}

impl OffsetAllocator {
    /// Create an allocator with the default alignment: the size of the
    /// largest scalar element type, so any dtype can live at any offset.
    pub fn new(runtime: Arc<dyn DeviceRuntime>) -> Self {
        Self::with_alignment(runtime, DType::MAX_ELEMENT_SIZE)
    }

    /// Create an allocator with a custom alignment (must be a power of two).
    pub fn with_alignment(runtime: Arc<dyn DeviceRuntime>, alignment: usize) -> Self {
        assert!(
            alignment.is_power_of_two(),
            "alignment must be a power of two, got {alignment}"
        );
        Self {
            runtime,
            alignment,
            used: 0,
            peak: 0,
            free_blocks: BTreeMap::new(),
            backing: None,
        }
    }

    /// Reserve space for `nbytes` and return its starting offset.
    ///
    /// The request is rounded up to the alignment unit. Free blocks are
    /// scanned first-fit in ascending offset order; an exact fit consumes the
    /// whole entry, a larger block is split with the tail remainder kept
    /// free. When nothing fits, the address space grows at `peak`.
    ///
    /// # Panics
    ///
    /// Panics if called after materialization, or if `nbytes` is zero.
    pub fn alloc(&mut self, nbytes: usize) -> usize {
        assert!(
            self.backing.is_none(),
            "alloc after materialization: the offset layout is frozen"
        );
        let size = self.aligned_size(nbytes);
        self.used += size;

        let found = self
            .free_blocks
            .iter()
            .find(|&(_, &block_size)| block_size >= size)
            .map(|(&offset, &block_size)| (offset, block_size));
        if let Some((offset, block_size)) = found {
            self.free_blocks.remove(&offset);
            if block_size > size {
                self.free_blocks.insert(offset + size, block_size - size);
            }
            tracing::trace!(offset, size, "reused free block");
            return offset;
        }

        let offset = self.peak;
        self.peak += size;
        tracing::trace!(offset, size, peak = self.peak, "grew address space");
        offset
    }

    /// Return the region `[offset, offset + nbytes)` to the allocator.
    ///
    /// A region ending exactly at `peak` shrinks the address space back
    /// instead of fragmenting it. Anything else joins the free list, merged
    /// with its adjacent neighbors when present so entries never touch.
    ///
    /// # Panics
    ///
    /// Panics if called after materialization, or if `nbytes` is zero.
    pub fn free(&mut self, offset: usize, nbytes: usize) {
        assert!(
            self.backing.is_none(),
            "free after materialization: the offset layout is frozen"
        );
        let size = self.aligned_size(nbytes);
        debug_assert_eq!(offset % self.alignment, 0, "offset not from this allocator");
        self.used -= size;

        if offset + size == self.peak {
            self.peak -= size;
            tracing::trace!(offset, size, peak = self.peak, "shrank address space");
            return;
        }

        let mut start = offset;
        let mut merged = size;
        if let Some((&prev_offset, &prev_size)) = self.free_blocks.range(..offset).next_back() {
            if prev_offset + prev_size == offset {
                self.free_blocks.remove(&prev_offset);
                start = prev_offset;
                merged += prev_size;
            }
        }
        if let Some(&next_size) = self.free_blocks.get(&(offset + size)) {
            self.free_blocks.remove(&(offset + size));
            merged += next_size;
        }
        self.free_blocks.insert(start, merged);
        tracing::trace!(offset, size, start, merged, "freed block");
    }

    /// Bind physical memory to the planned address space.
    ///
    /// The first call requests `peak` bytes from the device runtime; later
    /// calls return the cached pointer without touching the runtime again.
    pub fn materialize(&mut self) -> RuntimeResult<DevicePtr> {
        if let Some(ptr) = self.backing {
            return Ok(ptr);
        }
        let ptr = self.runtime.allocate(self.peak)?;
        tracing::info!(bytes = self.peak, "allocator materialized backing memory");
        self.backing = Some(ptr);
        Ok(ptr)
    }

    /// Round `nbytes` up to the nearest multiple of the alignment unit.
    ///
    /// # Panics
    ///
    /// Panics if `nbytes` is zero; buffers are sized from real tensor shapes
    /// and a zero-byte buffer has no offset to plan.
    pub fn aligned_size(&self, nbytes: usize) -> usize {
        assert!(nbytes > 0, "zero-byte buffer request");
        ((nbytes - 1) / self.alignment + 1) * self.alignment
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn peak(&self) -> usize {
        self.peak
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    pub fn is_materialized(&self) -> bool {
        self.backing.is_some()
    }

    /// Snapshot of the allocator state for diagnostics.
    pub fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            used: self.used,
            peak: self.peak,
            free_block_count: self.free_blocks.len(),
            free_bytes: self.free_blocks.values().sum(),
        }
    }
}

impl Drop for OffsetAllocator {
    fn drop(&mut self) {
        if let Some(ptr) = self.backing.take() {
            self.runtime.release(ptr, self.peak);
        }
    }
}

/// Point-in-time allocator usage, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Bytes currently allocated
    pub used: usize,
    /// High-water mark of the address space
    pub peak: usize,
    /// Number of disjoint free regions
    pub free_block_count: usize,
    /// Total bytes across free regions
    pub free_bytes: usize,
}

impl std::fmt::Display for AllocatorStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "used={} peak={} free={} bytes in {} blocks",
            self.used, self.peak, self.free_bytes, self.free_block_count
        )
    }
}
