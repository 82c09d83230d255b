//! First-order spatial gradient of an image
//!
//! # Forward
//!
//! For an image `[B, C, H, W]` every `(b, c)` plane is padded by one pixel
//! and cross-correlated with both Sobel kernels, giving a gradient tensor
//! `[B, C, 2, H, W]` whose axis 2 holds `(dx, dy)`. The kernels are shared by
//! every channel.
//!
//! # Backward
//!
//! The forward is linear in the image, so its backward is its adjoint and
//! does not need the forward input:
//!
//! ```text
//! grad_image = pad^T( corr^T(grad[:, :, 0], gx) + corr^T(grad[:, :, 1], gy) )
//! ```

use crate::error::{ensure_rank, FilterError, FilterResult};
use crate::sobel_kernels::SobelKernels;
use imgrad_core::{DenseND, PaddingMode};
use scirs2_core::numeric::Float;

/// Border width added before correlating with a 3x3 kernel
pub(crate) const HALO: usize = 1;

/// Configuration shared by the gradient operators
///
/// # Examples
///
/// ```
/// use imgrad_core::PaddingMode;
/// use imgrad_kernels::GradientConfig;
///
/// let config = GradientConfig::default()
///     .with_padding(PaddingMode::Replicate)
///     .with_normalized(true);
/// assert_eq!(config.padding, PaddingMode::Replicate);
/// assert!(config.normalized);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GradientConfig {
    /// Border handling before correlation
    pub padding: PaddingMode,
    /// Divide both kernels by the sum of their absolute weights
    pub normalized: bool,
}

impl GradientConfig {
    /// Zero padding, unnormalized kernels
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the padding mode
    pub fn with_padding(mut self, padding: PaddingMode) -> Self {
        self.padding = padding;
        self
    }

    /// Enable or disable kernel normalization
    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    /// Kernel pair selected by this configuration
    pub fn kernels<T: Float>(&self) -> FilterResult<SobelKernels<T>> {
        SobelKernels::new(self.normalized)
    }

    /// Check that an `H x W` plane can be padded under this configuration.
    pub fn validate_extent(&self, height: usize, width: usize) -> FilterResult<()> {
        let min = self.padding.min_extent(HALO).max(1);
        if height < min || width < min {
            return Err(FilterError::InvalidConfig {
                parameter: "padding",
                reason: format!(
                    "{:?} padding needs height and width >= {}, got {}x{}",
                    self.padding, min, height, width
                ),
            });
        }
        Ok(())
    }

    /// Check that `shape` is a `[B, C, H, W]` image this configuration can
    /// pad, reporting failures under `operation`.
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::PaddingMode;
    /// use imgrad_kernels::{FilterError, GradientConfig};
    ///
    /// let config = GradientConfig::default().with_padding(PaddingMode::Reflect);
    /// assert!(config.validate_image("sobel", &[1, 3, 4, 4]).is_ok());
    /// assert!(matches!(
    ///     config.validate_image("sobel", &[3, 4, 4]),
    ///     Err(FilterError::Shape { expected_rank: 4, .. })
    /// ));
    /// assert!(matches!(
    ///     config.validate_image("sobel", &[1, 1, 1, 4]),
    ///     Err(FilterError::InvalidConfig { .. })
    /// ));
    /// ```
    pub fn validate_image(&self, operation: &'static str, shape: &[usize]) -> FilterResult<()> {
        ensure_rank(operation, shape, 4)?;
        self.validate_extent(shape[2], shape[3])
    }
}

/// Spatial gradient with the default configuration.
///
/// # Shape Requirements
///
/// - Input: `[B, C, H, W]`
/// - Output: `[B, C, 2, H, W]`, axis 2 is `(dx, dy)`
///
/// # Errors
///
/// [`FilterError::Shape`] when the input is not rank 4.
///
/// # Examples
///
/// ```
/// use imgrad_core::DenseND;
/// use imgrad_kernels::spatial_gradient;
///
/// let plus = DenseND::<f64>::from_vec(
///     vec![0.0, 1.0, 0.0,
///          1.0, 1.0, 1.0,
///          0.0, 1.0, 0.0],
///     &[1, 1, 3, 3],
/// ).unwrap();
///
/// let grad = spatial_gradient(&plus).unwrap();
/// assert_eq!(grad.shape(), &[1, 1, 2, 3, 3]);
/// assert_eq!(grad.get(&[0, 0, 0, 1, 0]), Some(&4.0)); // dx
/// assert_eq!(grad.get(&[0, 0, 1, 0, 1]), Some(&4.0)); // dy
/// ```
pub fn spatial_gradient<T>(image: &DenseND<T>) -> FilterResult<DenseND<T>>
where
    T: Float + Send + Sync,
{
    spatial_gradient_with(image, &GradientConfig::default())
}

/// Spatial gradient with an explicit configuration.
#[tracing::instrument(level = "debug", skip_all, fields(shape = ?image.shape(), padding = ?config.padding))]
pub fn spatial_gradient_with<T>(
    image: &DenseND<T>,
    config: &GradientConfig,
) -> FilterResult<DenseND<T>>
where
    T: Float + Send + Sync,
{
    let (dx, dy) = gradient_planes(image, config, "spatial_gradient")?;
    Ok(DenseND::stack(&[dx, dy], 2)?)
}

/// Backward of [`spatial_gradient_with`].
///
/// Takes `∂L/∂gradient` of shape `[B, C, 2, H, W]` and returns `∂L/∂image`
/// of shape `[B, C, H, W]`.
///
/// # Examples
///
/// ```
/// use imgrad_core::DenseND;
/// use imgrad_kernels::{spatial_gradient, spatial_gradient_backward, GradientConfig};
///
/// let x = DenseND::<f64>::from_fn(&[1, 1, 4, 4], |i| (i[2] * 4 + i[3]) as f64);
/// let g = DenseND::<f64>::from_fn(&[1, 1, 2, 4, 4], |i| (i[2] + i[3]) as f64 - 1.5);
///
/// // <J x, g> == <x, J^T g>
/// let lhs = spatial_gradient(&x).unwrap().dot(&g).unwrap();
/// let back = spatial_gradient_backward(&g, &GradientConfig::default()).unwrap();
/// let rhs = x.dot(&back).unwrap();
/// assert!((lhs - rhs).abs() < 1e-9);
/// ```
#[tracing::instrument(level = "debug", skip_all, fields(shape = ?grad_output.shape(), padding = ?config.padding))]
pub fn spatial_gradient_backward<T>(
    grad_output: &DenseND<T>,
    config: &GradientConfig,
) -> FilterResult<DenseND<T>>
where
    T: Float + Send + Sync,
{
    let operation = "spatial_gradient_backward";
    let shape = grad_output.shape();
    ensure_rank(operation, shape, 5)?;
    if shape[2] != 2 {
        let mut expected = shape.to_vec();
        expected[2] = 2;
        return Err(FilterError::ShapeMismatch {
            operation,
            expected,
            actual: shape.to_vec(),
        });
    }

    let grad_dx = grad_output.index_axis(2, 0)?;
    let grad_dy = grad_output.index_axis(2, 1)?;
    gradient_planes_backward(&grad_dx, &grad_dy, config)
}

/// Forward pass returning the `dx` and `dy` planes separately, each
/// `[B, C, H, W]`.
pub(crate) fn gradient_planes<T>(
    image: &DenseND<T>,
    config: &GradientConfig,
    operation: &'static str,
) -> FilterResult<(DenseND<T>, DenseND<T>)>
where
    T: Float + Send + Sync,
{
    config.validate_image(operation, image.shape())?;

    let kernels = config.kernels::<T>()?;
    let padded = image.pad2d(HALO, config.padding)?;
    let dx = padded.depthwise_correlate2d(&kernels.gx)?;
    let dy = padded.depthwise_correlate2d(&kernels.gy)?;
    Ok((dx, dy))
}

/// Adjoint of [`gradient_planes`].
pub(crate) fn gradient_planes_backward<T>(
    grad_dx: &DenseND<T>,
    grad_dy: &DenseND<T>,
    config: &GradientConfig,
) -> FilterResult<DenseND<T>>
where
    T: Float + Send + Sync,
{
    let operation = "spatial_gradient_backward";
    ensure_rank(operation, grad_dx.shape(), 4)?;
    if grad_dx.shape() != grad_dy.shape() {
        return Err(FilterError::ShapeMismatch {
            operation,
            expected: grad_dx.shape_vec(),
            actual: grad_dy.shape_vec(),
        });
    }
    let shape = grad_dx.shape();
    config.validate_extent(shape[2], shape[3])?;

    let kernels = config.kernels::<T>()?;
    let padded_from_dx = grad_dx.depthwise_correlate2d_adjoint(&kernels.gx)?;
    let padded_from_dy = grad_dy.depthwise_correlate2d_adjoint(&kernels.gy)?;
    let padded = padded_from_dx.add(&padded_from_dy)?;
    Ok(padded.pad2d_adjoint(HALO, config.padding)?)
}
