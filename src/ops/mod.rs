//! Operator shape inference.

pub mod matmul;

pub use matmul::{infer_matmul_shape, MatmulOp, ShapeError, ShapeResult};
