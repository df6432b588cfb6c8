//! Tensor shape descriptor with stride computation.

use crate::tensor::DType;

/// Ordered dimension sizes with row-major strides.
///
/// Read-only once constructed; shape inference and buffer-size computation
/// consume it without mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorShape {
    dims: Vec<usize>,
    strides: Vec<usize>,
}

impl TensorShape {
    /// Create a tensor shape from dimensions, computing row-major strides
    /// (last dimension varies fastest).
    pub fn from_dims(dims: &[usize]) -> Self {
        let mut strides = Vec::with_capacity(dims.len());
        let mut stride: usize = 1;
        for dim in dims.iter().rev() {
            strides.push(stride);
            stride = stride.saturating_mul(*dim);
        }
        strides.reverse();
        Self {
            dims: dims.to_vec(),
            strides,
        }
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements.
    pub fn element_count(&self) -> usize {
        self.dims
            .iter()
            .copied()
            .fold(1usize, |acc, x| acc.checked_mul(x).unwrap_or(usize::MAX))
    }

    /// Bytes needed to store the tensor contiguously with the given element
    /// type.
    pub fn byte_size(&self, dtype: DType) -> usize {
        self.element_count().saturating_mul(dtype.element_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_computation() {
        let shape = TensorShape::from_dims(&[2, 3, 4]);
        // Row-major: stride[0] = 3*4, stride[1] = 4, stride[2] = 1
        assert_eq!(shape.strides(), &[12, 4, 1]);
        assert_eq!(shape.rank(), 3);
        assert_eq!(shape.element_count(), 24);
    }

    #[test]
    fn test_scalar_shape() {
        let shape = TensorShape::from_dims(&[]);
        assert_eq!(shape.rank(), 0);
        assert_eq!(shape.element_count(), 1);
        assert!(shape.strides().is_empty());
    }

    #[test]
    fn test_byte_size() {
        let shape = TensorShape::from_dims(&[16, 32]);
        assert_eq!(shape.byte_size(DType::F32), 16 * 32 * 4);
        assert_eq!(shape.byte_size(DType::F16), 16 * 32 * 2);
    }

    #[test]
    fn test_zero_dim_shape() {
        let shape = TensorShape::from_dims(&[4, 0, 2]);
        assert_eq!(shape.element_count(), 0);
        assert_eq!(shape.byte_size(DType::F64), 0);
    }
}
