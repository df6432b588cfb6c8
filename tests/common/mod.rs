//! Common test fixtures: a device runtime that counts its invocations.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use tensorforge::runtime::{DevicePtr, DeviceRuntime, RuntimeError, RuntimeResult};

/// Device runtime double that records traffic instead of touching hardware.
///
/// Returned addresses are fake and never dereferenced; the allocator only
/// caches and hands them back.
#[derive(Debug, Default)]
pub struct CountingRuntime {
    pub allocations: AtomicUsize,
    pub releases: AtomicUsize,
    pub last_alloc_bytes: AtomicUsize,
    pub last_release_bytes: AtomicUsize,
    pub fail_allocations: bool,
}

impl CountingRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_allocations: true,
            ..Self::default()
        }
    }

    pub fn allocation_count(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl DeviceRuntime for CountingRuntime {
    fn allocate(&self, nbytes: usize) -> RuntimeResult<DevicePtr> {
        if self.fail_allocations {
            return Err(RuntimeError::AllocationFailed {
                nbytes,
                reason: "forced failure".to_string(),
            });
        }
        self.allocations.fetch_add(1, Ordering::SeqCst);
        self.last_alloc_bytes.store(nbytes, Ordering::SeqCst);
        let addr = NonNull::new(0x1000 as *mut u8).expect("static test address");
        Ok(DevicePtr::new(addr))
    }

    fn release(&self, _ptr: DevicePtr, nbytes: usize) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.last_release_bytes.store(nbytes, Ordering::SeqCst);
    }
}
