//! # imgrad-ad
//!
//! Differentiation and tracing support for the imgrad operators.
//!
//! This crate provides:
//! - [`vjp`]: VJP (vector-Jacobian product) contexts for `spatial_gradient`
//!   and `sobel`, built on their closed-form backward passes
//! - [`gradcheck`]: finite-difference verification of any backward pass
//! - [`graph`]: static, data-independent graphs into which both operators
//!   can be traced, replayed, and back-propagated through
//!
//! ## Example
//!
//! ```
//! use imgrad_ad::graph::trace_spatial_gradient;
//! use imgrad_ad::vjp::{SpatialGradientVjp, VjpOp};
//! use imgrad_core::DenseND;
//! use imgrad_kernels::GradientConfig;
//!
//! let image = DenseND::<f64>::from_fn(&[1, 1, 4, 4], |i| (i[2] + 2 * i[3]) as f64);
//! let config = GradientConfig::default();
//!
//! // Eager forward + explicit backward
//! let (grad, ctx) = SpatialGradientVjp::forward(&image, config).unwrap();
//! let upstream = DenseND::ones(grad.shape());
//! let eager_back = ctx.vjp(&upstream).unwrap().remove(0);
//!
//! // Traced graph, replayed and differentiated
//! let graph = trace_spatial_gradient::<f64>(&config).unwrap();
//! assert_eq!(graph.run(&image).unwrap(), grad);
//! let traced_back = graph.vjp(&image, &upstream).unwrap();
//! assert!(traced_back.max_abs_diff(&eager_back).unwrap() < 1e-12);
//! ```

pub mod gradcheck;
pub mod graph;
pub mod vjp;

// Re-exports
pub use gradcheck::{
    check_gradient, check_vjp_op, DifferenceScheme, GradCheckConfig, GradCheckResult,
};
pub use graph::{trace_sobel, trace_spatial_gradient, GraphOp, ImageInput, NodeId, StaticGraph};
pub use vjp::{SobelVjp, SpatialGradientVjp, VjpOp};
