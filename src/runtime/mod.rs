//! Device memory capability consumed by the offset allocator.
//!
//! The allocator plans a logical address space and only touches physical
//! memory once, at materialization. That single allocation (and its eventual
//! release) goes through the [`DeviceRuntime`] trait so the same planning
//! code serves GPU backends and host-memory execution alike.

use std::fmt;
use std::ptr::NonNull;

use thiserror::Error;

use crate::tensor::DType;

/// Device runtime error types
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("device allocation of {nbytes} bytes failed: {reason}")]
    AllocationFailed { nbytes: usize, reason: String },
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Non-null physical address handed out by a device runtime.
///
/// This crate never dereferences the address; it is an opaque handle that
/// upload/kernel code combines with planned offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevicePtr(NonNull<u8>);

// SAFETY: DevicePtr is an address handle, never dereferenced by this crate.
// Access to the memory it names is governed by the runtime that produced it.
unsafe impl Send for DevicePtr {}
unsafe impl Sync for DevicePtr {}

impl DevicePtr {
    pub fn new(ptr: NonNull<u8>) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.0.as_ptr()
    }
}

/// Backing-memory provider for a planned address space.
///
/// The allocator invokes `allocate` exactly once per lifetime (at
/// materialization) and `release` exactly once (at teardown, if an
/// allocation was made). `release` must be passed the pointer and byte count
/// returned by and given to `allocate`.
pub trait DeviceRuntime: fmt::Debug + Send + Sync {
    fn allocate(&self, nbytes: usize) -> RuntimeResult<DevicePtr>;

    fn release(&self, ptr: DevicePtr, nbytes: usize);
}

/// Reference runtime over the system allocator.
///
/// Serves CPU-only planning passes and tests. Zero-byte requests are clamped
/// to one alignment-sized unit so the returned pointer is always real.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostRuntime;

impl HostRuntime {
    fn layout(nbytes: usize) -> Result<std::alloc::Layout, std::alloc::LayoutError> {
        std::alloc::Layout::from_size_align(nbytes.max(1), DType::MAX_ELEMENT_SIZE)
    }
}

impl DeviceRuntime for HostRuntime {
    fn allocate(&self, nbytes: usize) -> RuntimeResult<DevicePtr> {
        let layout = Self::layout(nbytes).map_err(|e| RuntimeError::AllocationFailed {
            nbytes,
            reason: e.to_string(),
        })?;
        // SAFETY: layout has non-zero size (clamped to one byte minimum).
        let raw = unsafe { std::alloc::alloc(layout) };
        NonNull::new(raw)
            .map(DevicePtr::new)
            .ok_or_else(|| RuntimeError::AllocationFailed {
                nbytes,
                reason: "system allocator returned null".to_string(),
            })
    }

    fn release(&self, ptr: DevicePtr, nbytes: usize) {
        if let Ok(layout) = Self::layout(nbytes) {
            // SAFETY: ptr was produced by allocate with this same layout.
            unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_runtime_round_trip() {
        let runtime = HostRuntime;
        let ptr = runtime.allocate(128).unwrap();
        // The memory is real and writable.
        unsafe { ptr.as_ptr().write_bytes(0xAB, 128) };
        runtime.release(ptr, 128);
    }

    #[test]
    fn test_host_runtime_zero_bytes() {
        let runtime = HostRuntime;
        let ptr = runtime.allocate(0).unwrap();
        runtime.release(ptr, 0);
    }

    #[test]
    fn test_device_ptr_is_copy() {
        let runtime = HostRuntime;
        let ptr = runtime.allocate(8).unwrap();
        let copy = ptr;
        assert_eq!(ptr, copy);
        runtime.release(ptr, 8);
    }
}
