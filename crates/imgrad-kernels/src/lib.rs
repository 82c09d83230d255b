//! # imgrad-kernels
//!
//! Differentiable image-gradient operators for imgrad.
//!
//! ## Overview
//!
//! - [`spatial_gradient`] - per-channel `(dx, dy)` via the Sobel kernels,
//!   `[B, C, H, W] -> [B, C, 2, H, W]`
//! - [`sobel`] - edge magnitude `sqrt(dx² + dy² + eps)`,
//!   `[B, C, H, W] -> [B, C, H, W]`
//! - [`spatial_gradient_backward`] / [`sobel_backward`] - closed-form
//!   vector-Jacobian products
//! - [`sobel_kernel_3x3`], [`sobel_kernel_2d`], [`SOBEL_X`], [`SOBEL_Y`]
//!
//! Batch and channel axes are independent: weights are shared across
//! channels and every `(b, c)` plane is processed on its own (in parallel
//! with the `parallel` feature).
//!
//! ## Quick Start
//!
//! ```rust
//! use imgrad_core::DenseND;
//! use imgrad_kernels::{sobel, sobel_backward, spatial_gradient, SobelConfig};
//!
//! let image = DenseND::<f64>::from_fn(&[2, 3, 8, 8], |i| (i[2] * i[3]) as f64);
//!
//! let grad = spatial_gradient(&image).unwrap();
//! assert_eq!(grad.shape(), &[2, 3, 2, 8, 8]);
//!
//! let edges = sobel(&image).unwrap();
//! assert!(edges.iter().all(|&v| v >= 0.0));
//!
//! let upstream = DenseND::<f64>::ones(&[2, 3, 8, 8]);
//! let grad_image = sobel_backward(&image, &upstream, &SobelConfig::default()).unwrap();
//! assert_eq!(grad_image.shape(), image.shape());
//! ```
//!
//! ## Configuration
//!
//! [`GradientConfig`] selects the padding mode (zero padding by default) and
//! kernel normalization; [`SobelConfig`] adds the stabilizer `eps`
//! ([`DEFAULT_EPS`]).

pub mod error;
pub mod sobel;
pub mod sobel_kernels;
pub mod spatial_gradient;


pub use error::{FilterError, FilterResult};
pub use sobel::{sobel, sobel_backward, sobel_with, SobelConfig, DEFAULT_EPS};
pub use sobel_kernels::{
    sobel_kernel_2d, sobel_kernel_3x3, SobelKernels, SOBEL_NORM, SOBEL_X, SOBEL_Y,
};
pub use spatial_gradient::{
    spatial_gradient, spatial_gradient_backward, spatial_gradient_with, GradientConfig,
};
