//! Unified error handling for TensorForge
//!
//! Each module defines its own `thiserror` enum; this module consolidates
//! them into a single crate-level type for callers that thread results
//! through a whole planning pass.

use thiserror::Error;

use crate::logging::LoggingError;
use crate::ops::matmul::ShapeError;
use crate::runtime::RuntimeError;

/// Unified error type for TensorForge.
///
/// Shape incompatibilities are ordinary recoverable errors: the graph builder
/// treats them as operator-construction failure and marks the node invalid.
/// Allocator lifecycle violations are programming errors and panic instead of
/// surfacing here.
#[derive(Debug, Error)]
pub enum TensorForgeError {
    /// Device runtime failure (allocation at materialization time)
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Operator shape inference failure
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// Logging initialization failure
    #[error(transparent)]
    Logging(#[from] LoggingError),
}

/// Helper type alias for Results using TensorForgeError
pub type ForgeResult<T> = std::result::Result<T, TensorForgeError>;
