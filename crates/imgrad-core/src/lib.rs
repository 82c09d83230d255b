//! # imgrad-core
//!
//! Core tensor type and image primitives for imgrad.
//!
//! This crate provides the building blocks the gradient operators are
//! composed from:
//!
//! - **Dense tensor representation** ([`DenseND`]) backed by `scirs2-core` arrays
//! - **Spatial padding** ([`DenseND::pad2d`]) with [`PaddingMode`] and its adjoint
//! - **Depthwise cross-correlation** ([`DenseND::depthwise_correlate2d`]) and its adjoint
//! - **Element-wise arithmetic**, stacking and axis selection
//!
//! Every primitive is linear or element-wise with a closed-form derivative,
//! which is what lets the operators built on top expose explicit backward
//! passes instead of relying on a tape.
//!
//! ## SciRS2 Integration
//!
//! All array, numeric and parallel access goes through `scirs2-core`
//! (`ndarray_ext`, `numeric`, `parallel_ops`). Direct use of `ndarray`,
//! `num-traits` or `rayon` is not permitted.
//!
//! ## Quick Start
//!
//! ```
//! use imgrad_core::{DenseND, PaddingMode};
//!
//! let image = DenseND::<f64>::ones(&[2, 3, 8, 8]);
//! let padded = image.pad2d(1, PaddingMode::Zeros).unwrap();
//! assert_eq!(padded.shape(), &[2, 3, 10, 10]);
//!
//! let box3 = DenseND::<f64>::ones(&[3, 3]);
//! let summed = padded.depthwise_correlate2d(&box3).unwrap();
//! assert_eq!(summed.shape(), &[2, 3, 8, 8]);
//! assert_eq!(summed.get(&[0, 0, 4, 4]), Some(&9.0));
//! assert_eq!(summed.get(&[0, 0, 0, 0]), Some(&4.0));
//! ```
//!
//! ## Error Handling
//!
//! Operations return `anyhow::Result` for precondition failures (rank,
//! shape, extent). Non-finite values are never rejected; they propagate
//! with IEEE-754 semantics.
//!
//! ## Features
//!
//! - `parallel` (default): distribute planes over the rayon pool via scirs2-core
//! - `serde`: serialize/deserialize [`PaddingMode`]

pub mod dense;


pub use dense::{DenseND, PaddingMode};
