//! Sobel derivative kernels
//!
//! Both kernels are applied by cross-correlation (no flip), so `SOBEL_X`
//! responds positively to intensity increasing to the right and `SOBEL_Y`
//! to intensity increasing downwards.
//!
//! ```text
//! SOBEL_X = [-1  0  1]      SOBEL_Y = [-1 -2 -1]
//!           [-2  0  2]                [ 0  0  0]
//!           [-1  0  1]                [ 1  2  1]
//! ```
//!
//! `SOBEL_Y` is the transpose of `SOBEL_X`.

use crate::error::{FilterError, FilterResult};
use imgrad_core::DenseND;
use scirs2_core::numeric::Float;

/// Horizontal derivative kernel (responds to vertical edges)
pub const SOBEL_X: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];

/// Vertical derivative kernel (responds to horizontal edges)
pub const SOBEL_Y: [[f64; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Sum of absolute weights of either Sobel kernel
pub const SOBEL_NORM: f64 = 8.0;

/// The `(gx, gy)` kernel pair used by the gradient operators
#[derive(Debug, Clone, PartialEq)]
pub struct SobelKernels<T> {
    /// Horizontal derivative kernel, shape `[3, 3]`
    pub gx: DenseND<T>,
    /// Vertical derivative kernel, shape `[3, 3]`
    pub gy: DenseND<T>,
}

impl<T: Float> SobelKernels<T> {
    /// Build the kernel pair, optionally divided by [`SOBEL_NORM`].
    pub fn new(normalized: bool) -> FilterResult<Self> {
        let scale = if normalized { 1.0 / SOBEL_NORM } else { 1.0 };
        Ok(Self {
            gx: kernel_from_rows(&SOBEL_X, scale)?,
            gy: kernel_from_rows(&SOBEL_Y, scale)?,
        })
    }
}

/// Horizontal Sobel kernel as a `[3, 3]` tensor.
///
/// # Examples
///
/// ```
/// use imgrad_kernels::sobel_kernel_3x3;
///
/// let gx = sobel_kernel_3x3::<f64>().unwrap();
/// assert_eq!(gx.shape(), &[3, 3]);
/// assert_eq!(gx.get(&[1, 0]), Some(&-2.0));
/// assert_eq!(gx.get(&[1, 2]), Some(&2.0));
/// ```
pub fn sobel_kernel_3x3<T: Float>() -> FilterResult<DenseND<T>> {
    kernel_from_rows(&SOBEL_X, 1.0)
}

/// Both Sobel kernels, unnormalized.
///
/// # Examples
///
/// ```
/// use imgrad_kernels::sobel_kernel_2d;
///
/// let kernels = sobel_kernel_2d::<f32>().unwrap();
/// // gy is the transpose of gx
/// for i in 0..3 {
///     for j in 0..3 {
///         assert_eq!(kernels.gx.get(&[i, j]), kernels.gy.get(&[j, i]));
///     }
/// }
/// ```
pub fn sobel_kernel_2d<T: Float>() -> FilterResult<SobelKernels<T>> {
    SobelKernels::new(false)
}

fn kernel_from_rows<T: Float>(rows: &[[f64; 3]; 3], scale: f64) -> FilterResult<DenseND<T>> {
    let weights = rows
        .iter()
        .flatten()
        .map(|&w| {
            T::from(w * scale).ok_or_else(|| FilterError::InvalidConfig {
                parameter: "kernel",
                reason: format!("weight {} is not representable in the element type", w),
            })
        })
        .collect::<FilterResult<Vec<T>>>()?;
    Ok(DenseND::from_vec(weights, &[3, 3])?)
}
