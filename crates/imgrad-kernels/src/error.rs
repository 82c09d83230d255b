//! Error types for the image-gradient operators
//!
//! The operators accept any well-formed floating-point input, so the
//! taxonomy is small: wrong tensor ranks or shapes, invalid configuration,
//! and failures surfaced by the underlying tensor primitives.
//!
//! # Examples
//!
//! ```
//! use imgrad_core::DenseND;
//! use imgrad_kernels::{spatial_gradient, FilterError};
//!
//! let not_an_image = DenseND::<f64>::zeros(&[3, 3]);
//! match spatial_gradient(&not_an_image) {
//!     Err(FilterError::Shape { expected_rank, actual, .. }) => {
//!         assert_eq!(expected_rank, 4);
//!         assert_eq!(actual, vec![3, 3]);
//!     }
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```

use thiserror::Error;

/// Error type for the filter operators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// A tensor argument has the wrong rank
    #[error("{operation}: expected a rank-{expected_rank} tensor, got shape {actual:?}")]
    Shape {
        operation: &'static str,
        expected_rank: usize,
        actual: Vec<usize>,
    },

    /// Two tensor arguments that must agree in shape do not
    #[error("{operation}: shape mismatch, expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        operation: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A configuration value is out of range for the requested operation
    #[error("invalid {parameter}: {reason}")]
    InvalidConfig {
        parameter: &'static str,
        reason: String,
    },

    /// An underlying tensor primitive rejected its input
    #[error("tensor error: {0}")]
    Tensor(String),
}

impl From<anyhow::Error> for FilterError {
    fn from(err: anyhow::Error) -> Self {
        FilterError::Tensor(format!("{:#}", err))
    }
}

/// Result type for the filter operators
pub type FilterResult<T> = Result<T, FilterError>;

/// Fail with [`FilterError::Shape`] unless `shape` has exactly `rank` axes.
pub(crate) fn ensure_rank(
    operation: &'static str,
    shape: &[usize],
    rank: usize,
) -> FilterResult<()> {
    if shape.len() != rank {
        return Err(FilterError::Shape {
            operation,
            expected_rank: rank,
            actual: shape.to_vec(),
        });
    }
    Ok(())
}
