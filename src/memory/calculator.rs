//! Memory requirements calculator for planning passes.
//!
//! Sums the aligned byte sizes of a set of tensors before any allocation
//! occurs, so a caller can check device capacity up front and fail fast with
//! a clean error instead of dying mid-plan.

use crate::tensor::{DType, TensorShape};

/// Accumulates tensor byte sizes, aligned the same way the offset allocator
/// aligns its requests.
#[derive(Debug, Clone)]
pub struct MemoryCalculator {
    entries: Vec<(String, usize)>,
    alignment: usize,
}

impl MemoryCalculator {
    pub fn new() -> Self {
        Self::with_alignment(DType::MAX_ELEMENT_SIZE)
    }

    /// Create a calculator with a custom alignment (must be a power of two).
    pub fn with_alignment(alignment: usize) -> Self {
        assert!(
            alignment.is_power_of_two(),
            "alignment must be a power of two, got {alignment}"
        );
        Self {
            entries: Vec::new(),
            alignment,
        }
    }

    /// Track a tensor. The name is kept for diagnostics only.
    pub fn add_tensor(&mut self, name: impl Into<String>, shape: &TensorShape, dtype: DType) {
        let bytes = shape.byte_size(dtype);
        let aligned = (bytes + self.alignment - 1) & !(self.alignment - 1);
        self.entries.push((name.into(), aligned));
    }

    /// Total bytes a plan over the tracked tensors will request.
    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|(_, size)| size).sum()
    }

    pub fn tensor_count(&self) -> usize {
        self.entries.len()
    }

    /// Individual aligned sizes, for logging.
    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    /// Forget all tracked tensors, keeping the alignment.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for MemoryCalculator {
    fn default() -> Self {
        Self::new()
    }
}
