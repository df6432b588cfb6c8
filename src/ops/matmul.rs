//! Matrix multiplication shape inference.
//!
//! Computes the output shape of a matmul node before execution: batch
//! dimensions broadcast NumPy/ONNX-style, the trailing two dimensions follow
//! matrix-product rules with per-operand transpose flags, and an optional
//! bias operand must broadcast against the result without widening it.

use std::fmt;

use thiserror::Error;

use crate::tensor::TensorShape;

/// Shape incompatibility reported by matmul inference.
///
/// These are ordinary operator-construction failures, not fatal errors; the
/// graph builder surfaces them to the user as an invalid graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("matmul operand {operand} must be at least 2-D, got rank {rank}")]
    RankTooLow { operand: &'static str, rank: usize },
    #[error("batch dimensions not broadcastable at result axis {axis}: {a} vs {b}")]
    BatchDimMismatch { axis: usize, a: usize, b: usize },
    #[error("inner dimensions disagree: A has {a_cols} columns, B has {b_rows} rows")]
    InnerDimMismatch { a_cols: usize, b_rows: usize },
    #[error("bias must be at least 2-D, got rank {rank}")]
    BiasRankTooLow { rank: usize },
    #[error("bias rank {rank} exceeds result rank {result_rank}")]
    BiasRankExceedsResult { rank: usize, result_rank: usize },
    #[error("bias dimension {bias} does not broadcast against result dimension {out} at axis {axis}")]
    BiasDimMismatch { axis: usize, bias: usize, out: usize },
}

pub type ShapeResult<T> = Result<T, ShapeError>;

/// Infer the output dimensions of `A x B` (optionally `A x B + C`).
///
/// Batch dimensions pair up from the innermost outward, aligned at the two
/// trailing matrix dimensions; equal sizes carry over and size-1 dimensions
/// stretch to the other side. Once the shorter operand runs out, the longer
/// operand's leading dimensions copy through verbatim. Transpose flags apply
/// to the trailing two dimensions of their operand only.
pub fn infer_matmul_shape(
    a_dims: &[usize],
    b_dims: &[usize],
    trans_a: bool,
    trans_b: bool,
    bias_dims: Option<&[usize]>,
) -> ShapeResult<Vec<usize>> {
    let rank_a = a_dims.len();
    let rank_b = b_dims.len();
    if rank_a < 2 {
        return Err(ShapeError::RankTooLow {
            operand: "A",
            rank: rank_a,
        });
    }
    if rank_b < 2 {
        return Err(ShapeError::RankTooLow {
            operand: "B",
            rank: rank_b,
        });
    }

    let rank_out = rank_a.max(rank_b);
    let mut out = vec![0usize; rank_out];

    let batch_a = rank_a - 2;
    let batch_b = rank_b - 2;
    let paired = batch_a.min(batch_b);
    for k in 0..paired {
        let da = a_dims[batch_a - 1 - k];
        let db = b_dims[batch_b - 1 - k];
        let axis = rank_out - 3 - k;
        out[axis] = if da == db {
            da
        } else if da == 1 {
            db
        } else if db == 1 {
            da
        } else {
            return Err(ShapeError::BatchDimMismatch { axis, a: da, b: db });
        };
    }
    // The longer operand's outer batch dimensions carry over unchanged.
    let longer = if rank_a >= rank_b { a_dims } else { b_dims };
    for axis in 0..rank_out - 2 - paired {
        out[axis] = longer[axis];
    }

    let (mut a_rows, mut a_cols) = (a_dims[rank_a - 2], a_dims[rank_a - 1]);
    if trans_a {
        std::mem::swap(&mut a_rows, &mut a_cols);
    }
    let (mut b_rows, mut b_cols) = (b_dims[rank_b - 2], b_dims[rank_b - 1]);
    if trans_b {
        std::mem::swap(&mut b_rows, &mut b_cols);
    }
    if a_cols != b_rows {
        return Err(ShapeError::InnerDimMismatch { a_cols, b_rows });
    }
    out[rank_out - 2] = a_rows;
    out[rank_out - 1] = b_cols;

    if let Some(c_dims) = bias_dims {
        let rank_c = c_dims.len();
        if rank_c < 2 {
            return Err(ShapeError::BiasRankTooLow { rank: rank_c });
        }
        if rank_c > rank_out {
            return Err(ShapeError::BiasRankExceedsResult {
                rank: rank_c,
                result_rank: rank_out,
            });
        }
        // Bias broadcasts one-way against the finished result; it never
        // widens it.
        for k in 0..rank_c {
            let bias = c_dims[rank_c - 1 - k];
            let axis = rank_out - 1 - k;
            if bias != out[axis] && bias != 1 {
                return Err(ShapeError::BiasDimMismatch {
                    axis,
                    bias,
                    out: out[axis],
                });
            }
        }
    }

    Ok(out)
}

/// Matmul operator node parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatmulOp {
    pub trans_a: bool,
    pub trans_b: bool,
}

impl MatmulOp {
    pub fn new(trans_a: bool, trans_b: bool) -> Self {
        Self { trans_a, trans_b }
    }

    /// Infer the output shape for this node's operands.
    pub fn infer_shape(
        &self,
        a: &TensorShape,
        b: &TensorShape,
        bias: Option<&TensorShape>,
    ) -> ShapeResult<TensorShape> {
        infer_matmul_shape(
            a.dims(),
            b.dims(),
            self.trans_a,
            self.trans_b,
            bias.map(|c| c.dims()),
        )
        .map(|dims| TensorShape::from_dims(&dims))
    }
}

impl fmt::Display for MatmulOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Matmul([{},{}])",
            if self.trans_a { "A^T" } else { "A" },
            if self.trans_b { "B^T" } else { "B" }
        )
    }
}
