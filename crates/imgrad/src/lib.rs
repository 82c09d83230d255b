//! # imgrad - Differentiable Image Gradients
//!
//! Sobel edge magnitude and first-order spatial gradients over batched,
//! multi-channel images, with explicit backward passes, finite-difference
//! gradient checking and static traced graphs.
//!
//! This is the **meta crate** that re-exports all imgrad components.
//!
//! ## Quick Start
//!
//! ```
//! use imgrad::prelude::*;
//!
//! // [batch, channel, height, width]
//! let image = DenseND::<f64>::from_fn(&[2, 3, 6, 6], |i| (i[2] * i[3]) as f64 * 0.1);
//!
//! let grad = spatial_gradient(&image)?;
//! assert_eq!(grad.shape(), &[2, 3, 2, 6, 6]);
//!
//! let edges = sobel(&image)?;
//! assert_eq!(edges.shape(), image.shape());
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Components
//!
//! ### Tensors ([`core`])
//!
//! `DenseND<T>`, 2-D padding with [`PaddingMode`](core::PaddingMode) and
//! depthwise cross-correlation, each with its adjoint.
//!
//! ### Operators ([`kernels`])
//!
//! `spatial_gradient`, `sobel`, their backward functions and the Sobel
//! kernel constants.
//!
//! ```
//! use imgrad::kernels::{sobel_with, SobelConfig};
//! use imgrad::core::{DenseND, PaddingMode};
//! use imgrad::kernels::GradientConfig;
//!
//! let config = SobelConfig::default()
//!     .with_gradient(GradientConfig::default().with_padding(PaddingMode::Replicate));
//! let flat = DenseND::<f32>::from_elem(&[1, 1, 5, 5], 3.0);
//! let edges = sobel_with(&flat, &config).unwrap();
//! // Replicate padding sees no edge at the image border.
//! assert!(edges.iter().all(|&v| v < 1e-3));
//! ```
//!
//! ### Differentiation and Tracing ([`ad`])
//!
//! VJP contexts, gradient checking and [`StaticGraph`](ad::StaticGraph).
//!
//! ```
//! use imgrad::prelude::*;
//!
//! let image = DenseND::<f64>::from_fn(&[1, 2, 5, 4], |i| ((i[1] + i[2] * i[3]) % 5) as f64);
//! let upstream = DenseND::<f64>::ones(&[1, 2, 2, 5, 4]);
//!
//! let graph = trace_spatial_gradient::<f64>(&GradientConfig::default())?;
//! let traced = graph.vjp(&image, &upstream)?;
//! let explicit = spatial_gradient_backward(&upstream, &GradientConfig::default())?;
//! assert!(traced.max_abs_diff(&explicit)? < 1e-12);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` (default): process `(batch, channel)` planes on the rayon
//!   pool from `scirs2-core`
//! - `tracing-subscriber` (default): [`tracing_support::init_tracing`]
//! - `serde`: `Serialize`/`Deserialize` for the configuration types

pub mod tracing_support;

// Re-export all components
pub use imgrad_ad as ad;
pub use imgrad_core as core;
pub use imgrad_kernels as kernels;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! # Example
    //!
    //! ```
    //! use imgrad::prelude::*;
    //!
    //! let image = DenseND::<f64>::zeros(&[1, 3, 4, 4]);
    //! assert_eq!(sobel(&image).unwrap().shape(), &[1, 3, 4, 4]);
    //! ```

    // Core types
    pub use crate::core::{DenseND, PaddingMode};

    // Operators
    pub use crate::kernels::{
        sobel, sobel_backward, sobel_with, spatial_gradient, spatial_gradient_backward,
        spatial_gradient_with, FilterError, FilterResult, GradientConfig, SobelConfig,
    };

    // Differentiation and tracing
    pub use crate::ad::{
        check_gradient, trace_sobel, trace_spatial_gradient, GradCheckConfig, SobelVjp,
        SpatialGradientVjp, StaticGraph, VjpOp,
    };
}
