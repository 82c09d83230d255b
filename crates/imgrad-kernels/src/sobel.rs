//! Sobel edge magnitude
//!
//! ```text
//! magnitude = sqrt(dx² + dy² + eps)
//! ```
//!
//! `eps` keeps the square root differentiable where the gradient vanishes.
//! The backward pass routes `g · dx / m` and `g · dy / m` through the
//! spatial-gradient adjoint, where `m` is the forward magnitude.

use crate::error::{ensure_rank, FilterError, FilterResult};
use crate::spatial_gradient::{gradient_planes, gradient_planes_backward, GradientConfig};
use imgrad_core::DenseND;
use scirs2_core::numeric::Float;

/// Default stabilizer added under the square root
///
/// Small enough that a pixel with zero gradient reads below `1e-4`, while
/// its derivative stays finite.
pub const DEFAULT_EPS: f64 = 1e-9;

/// Configuration of the Sobel operator
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SobelConfig {
    /// Configuration of the underlying spatial gradient
    pub gradient: GradientConfig,
    /// Non-negative constant added to `dx² + dy²`
    pub eps: f64,
}

impl Default for SobelConfig {
    fn default() -> Self {
        Self {
            gradient: GradientConfig::default(),
            eps: DEFAULT_EPS,
        }
    }
}

impl SobelConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the spatial-gradient configuration
    pub fn with_gradient(mut self, gradient: GradientConfig) -> Self {
        self.gradient = gradient;
        self
    }

    /// Set the stabilizer
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Reject negative or non-finite `eps`.
    pub fn validate(&self) -> FilterResult<()> {
        if !self.eps.is_finite() || self.eps < 0.0 {
            return Err(FilterError::InvalidConfig {
                parameter: "eps",
                reason: format!("must be finite and non-negative, got {}", self.eps),
            });
        }
        Ok(())
    }

    fn eps_as<T: Float>(&self) -> FilterResult<T> {
        self.validate()?;
        T::from(self.eps).ok_or_else(|| FilterError::InvalidConfig {
            parameter: "eps",
            reason: format!("{} is not representable in the element type", self.eps),
        })
    }
}

/// Sobel edge magnitude with the default configuration.
///
/// # Shape Requirements
///
/// - Input: `[B, C, H, W]`
/// - Output: `[B, C, H, W]`, non-negative
///
/// # Examples
///
/// ```
/// use imgrad_core::DenseND;
/// use imgrad_kernels::sobel;
///
/// let plus = DenseND::<f64>::from_vec(
///     vec![0.0, 1.0, 0.0,
///          1.0, 1.0, 1.0,
///          0.0, 1.0, 0.0],
///     &[1, 1, 3, 3],
/// ).unwrap();
///
/// let edges = sobel(&plus).unwrap();
/// assert_eq!(edges.shape(), plus.shape());
/// assert!((edges.get(&[0, 0, 0, 0]).unwrap() - 18f64.sqrt()).abs() < 1e-4);
/// assert!(edges.get(&[0, 0, 1, 1]).unwrap().abs() < 1e-4);
/// ```
pub fn sobel<T>(image: &DenseND<T>) -> FilterResult<DenseND<T>>
where
    T: Float + Send + Sync,
{
    sobel_with(image, &SobelConfig::default())
}

/// Sobel edge magnitude with an explicit configuration.
#[tracing::instrument(level = "debug", skip_all, fields(shape = ?image.shape(), eps = config.eps))]
pub fn sobel_with<T>(image: &DenseND<T>, config: &SobelConfig) -> FilterResult<DenseND<T>>
where
    T: Float + Send + Sync,
{
    let eps = config.eps_as::<T>()?;
    let (dx, dy) = gradient_planes(image, &config.gradient, "sobel")?;
    magnitude(&dx, &dy, eps)
}

/// Backward of [`sobel_with`].
///
/// Needs the forward input to recover the gradient direction at every
/// pixel. `grad_output` must have the same shape as `image`.
///
/// With `eps = 0`, pixels whose gradient vanishes produce NaN.
#[tracing::instrument(level = "debug", skip_all, fields(shape = ?image.shape(), eps = config.eps))]
pub fn sobel_backward<T>(
    image: &DenseND<T>,
    grad_output: &DenseND<T>,
    config: &SobelConfig,
) -> FilterResult<DenseND<T>>
where
    T: Float + Send + Sync,
{
    let operation = "sobel_backward";
    ensure_rank(operation, image.shape(), 4)?;
    if grad_output.shape() != image.shape() {
        return Err(FilterError::ShapeMismatch {
            operation,
            expected: image.shape_vec(),
            actual: grad_output.shape_vec(),
        });
    }

    let eps = config.eps_as::<T>()?;
    let (dx, dy) = gradient_planes(image, &config.gradient, operation)?;
    let m = magnitude(&dx, &dy, eps)?;

    let g_over_m = grad_output.div(&m)?;
    let grad_dx = g_over_m.mul(&dx)?;
    let grad_dy = g_over_m.mul(&dy)?;
    gradient_planes_backward(&grad_dx, &grad_dy, &config.gradient)
}

fn magnitude<T: Float>(dx: &DenseND<T>, dy: &DenseND<T>, eps: T) -> FilterResult<DenseND<T>> {
    Ok(dx.square().add(&dy.square())?.add_scalar(eps).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plus_sign() -> DenseND<f64> {
        DenseND::from_vec(
            vec![0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 0.0],
            &[1, 1, 3, 3],
        )
        .unwrap()
    }

    #[test]
    fn test_plus_sign_magnitude() {
        let edges = sobel(&plus_sign()).unwrap();
        let expected = [4.2426, 4.0, 4.2426, 4.0, 0.0, 4.0, 4.2426, 4.0, 4.2426];
        for (got, want) in edges.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-4, "{} vs {}", got, want);
        }
    }

    #[test]
    fn test_eps_shifts_flat_image() {
        let flat = DenseND::<f64>::from_elem(&[1, 1, 4, 4], 2.0);
        let config = SobelConfig::new().with_eps(0.25);
        // Interior pixels have zero gradient, so they read sqrt(eps).
        let edges = sobel_with(&flat, &config).unwrap();
        assert_eq!(edges.get(&[0, 0, 1, 1]), Some(&0.5));
    }

    #[test]
    fn test_rejects_negative_eps() {
        let config = SobelConfig::new().with_eps(-1.0);
        assert!(matches!(
            sobel_with(&plus_sign(), &config),
            Err(FilterError::InvalidConfig { parameter: "eps", .. })
        ));
        assert!(SobelConfig::new().with_eps(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_backward_rejects_mismatched_gradient() {
        let g = DenseND::<f64>::ones(&[1, 1, 3, 4]);
        assert!(matches!(
            sobel_backward(&plus_sign(), &g, &SobelConfig::default()),
            Err(FilterError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_backward_finite_at_flat_regions() {
        let flat = DenseND::<f64>::zeros(&[1, 1, 4, 4]);
        let g = DenseND::<f64>::ones(&[1, 1, 4, 4]);
        let back = sobel_backward(&flat, &g, &SobelConfig::default()).unwrap();
        assert!(back.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_backward_matches_directional_derivative() {
        let x = DenseND::<f64>::from_fn(&[1, 2, 4, 5], |i| {
            ((i[1] * 7 + i[2] * 3 + i[3] * 5) % 9) as f64 * 0.3
        });
        let v = DenseND::<f64>::from_fn(&[1, 2, 4, 5], |i| ((i[2] + i[3]) % 3) as f64 - 1.0);
        let g = DenseND::<f64>::from_fn(&[1, 2, 4, 5], |i| 0.5 + (i[3] as f64) * 0.1);
        // A larger eps keeps the central difference away from the kink at m = 0.
        let config = SobelConfig::new().with_eps(1e-2);

        let h = 1e-6;
        let plus = sobel_with(&x.add(&v.scalar_mul(h)).unwrap(), &config).unwrap();
        let minus = sobel_with(&x.sub(&v.scalar_mul(h)).unwrap(), &config).unwrap();
        let numeric = g.dot(&plus.sub(&minus).unwrap()).unwrap() / (2.0 * h);

        let analytic = sobel_backward(&x, &g, &config).unwrap().dot(&v).unwrap();
        assert!(
            (numeric - analytic).abs() < 1e-4 * (1.0 + analytic.abs()),
            "{} vs {}",
            numeric,
            analytic
        );
    }
}
