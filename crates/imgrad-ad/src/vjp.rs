//! Vector-Jacobian Product (VJP) rules for the image-gradient operators
//!
//! For a forward operation `y = f(x)`, the VJP computes:
//! ```text
//! vjp(dy) = ∂L/∂x
//! ```
//! where `dy = ∂L/∂y` is the incoming gradient (cotangent).
//!
//! Each context stores exactly what its backward needs from the forward
//! pass: nothing for the linear spatial gradient, the input image for
//! Sobel.

use anyhow::Result;
use imgrad_core::DenseND;
use imgrad_kernels::{
    sobel_backward, sobel_with, spatial_gradient_backward, spatial_gradient_with,
    GradientConfig, SobelConfig,
};
use scirs2_core::numeric::Float;

/// Trait for operations that support VJP (backward differentiation)
pub trait VjpOp<T> {
    /// Compute the VJP (backward pass) given the output gradient
    ///
    /// # Arguments
    ///
    /// * `output_grad` - Gradient w.r.t. the output (∂L/∂output)
    ///
    /// # Returns
    ///
    /// Gradients w.r.t. each input, in input order
    fn vjp(&self, output_grad: &DenseND<T>) -> Result<Vec<DenseND<T>>>;
}

/// VJP context for [`spatial_gradient_with`]
///
/// # Example
///
/// ```
/// use imgrad_ad::vjp::{SpatialGradientVjp, VjpOp};
/// use imgrad_core::DenseND;
/// use imgrad_kernels::GradientConfig;
///
/// let image = DenseND::<f64>::ones(&[1, 2, 4, 4]);
/// let (grad, ctx) = SpatialGradientVjp::forward(&image, GradientConfig::default()).unwrap();
///
/// let grads = ctx.vjp(&DenseND::<f64>::ones(grad.shape())).unwrap();
/// assert_eq!(grads[0].shape(), image.shape());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialGradientVjp {
    /// Configuration used in the forward pass
    pub config: GradientConfig,
}

impl SpatialGradientVjp {
    /// Create a context for a forward pass run with `config`
    pub fn new(config: GradientConfig) -> Self {
        Self { config }
    }

    /// Run the forward pass and return its output together with the context
    pub fn forward<T>(image: &DenseND<T>, config: GradientConfig) -> Result<(DenseND<T>, Self)>
    where
        T: Float + Send + Sync,
    {
        let output = spatial_gradient_with(image, &config)?;
        Ok((output, Self::new(config)))
    }
}

impl<T> VjpOp<T> for SpatialGradientVjp
where
    T: Float + Send + Sync,
{
    fn vjp(&self, output_grad: &DenseND<T>) -> Result<Vec<DenseND<T>>> {
        Ok(vec![spatial_gradient_backward(output_grad, &self.config)?])
    }
}

/// VJP context for [`sobel_with`]
///
/// Saves the forward input, from which the backward recomputes the
/// gradient direction at every pixel.
#[derive(Debug, Clone)]
pub struct SobelVjp<T> {
    /// Input image (saved from forward pass)
    pub input: DenseND<T>,
    /// Configuration used in the forward pass
    pub config: SobelConfig,
}

impl<T> SobelVjp<T>
where
    T: Float + Send + Sync,
{
    /// Create a context from a saved forward input
    pub fn new(input: DenseND<T>, config: SobelConfig) -> Self {
        Self { input, config }
    }

    /// Run the forward pass and return its output together with the context
    pub fn forward(image: &DenseND<T>, config: SobelConfig) -> Result<(DenseND<T>, Self)> {
        let output = sobel_with(image, &config)?;
        Ok((output, Self::new(image.clone(), config)))
    }
}

impl<T> VjpOp<T> for SobelVjp<T>
where
    T: Float + Send + Sync,
{
    fn vjp(&self, output_grad: &DenseND<T>) -> Result<Vec<DenseND<T>>> {
        Ok(vec![sobel_backward(&self.input, output_grad, &self.config)?])
    }
}
