//! Depthwise 2D cross-correlation for image tensors
//!
//! This module provides the convolution primitive underneath the spatial
//! gradient operators: a single 2D kernel slid over every `(batch, channel)`
//! plane of a `[N, C, H, W]` tensor. Weights are shared across channels, so
//! the channel axis behaves exactly like an extra batch axis.
//!
//! # Mathematical Background
//!
//! Deep-learning "convolution" is cross-correlation (no kernel flip):
//!
//! ```text
//! Output[n,c,i,j] = ΣΣ Input[n,c,i+m,j+k] · K[m,k]
//! ```
//!
//! Only the valid region is produced; callers pad beforehand with
//! [`DenseND::pad2d`]. The adjoint scatters each output gradient back over
//! the window it was computed from:
//!
//! ```text
//! GradInput[n,c,i+m,j+k] += GradOutput[n,c,i,j] · K[m,k]
//! ```
//!
//! # Parallelism
//!
//! With the `parallel` feature, planes are distributed across the rayon pool
//! from `scirs2_core::parallel_ops`. Each worker owns exactly one output
//! plane, so no synchronization is needed.

#![allow(clippy::needless_range_loop)]

use super::types::DenseND;
use scirs2_core::numeric::Float;

/// Geometry of one depthwise correlation, shared by forward and adjoint.
#[derive(Debug, Clone, Copy)]
struct PlaneGeometry {
    in_h: usize,
    in_w: usize,
    kernel_h: usize,
    kernel_w: usize,
    out_h: usize,
    out_w: usize,
}

impl PlaneGeometry {
    fn in_len(&self) -> usize {
        self.in_h * self.in_w
    }

    fn out_len(&self) -> usize {
        self.out_h * self.out_w
    }
}

/// Valid cross-correlation of one plane.
fn correlate_plane<T: Float>(input: &[T], kernel: &[T], g: PlaneGeometry, output: &mut [T]) {
    for out_i in 0..g.out_h {
        for out_j in 0..g.out_w {
            let mut sum = T::zero();
            for ki in 0..g.kernel_h {
                let row = (out_i + ki) * g.in_w + out_j;
                for kj in 0..g.kernel_w {
                    sum = sum + input[row + kj] * kernel[ki * g.kernel_w + kj];
                }
            }
            output[out_i * g.out_w + out_j] = sum;
        }
    }
}

/// Transpose of [`correlate_plane`]: accumulate into `grad_input`.
fn correlate_plane_adjoint<T: Float>(
    grad_output: &[T],
    kernel: &[T],
    g: PlaneGeometry,
    grad_input: &mut [T],
) {
    for out_i in 0..g.out_h {
        for out_j in 0..g.out_w {
            let go = grad_output[out_i * g.out_w + out_j];
            for ki in 0..g.kernel_h {
                let row = (out_i + ki) * g.in_w + out_j;
                for kj in 0..g.kernel_w {
                    grad_input[row + kj] = grad_input[row + kj] + go * kernel[ki * g.kernel_w + kj];
                }
            }
        }
    }
}

/// Run `f(plane_index, dst_plane)` over every destination plane.
fn for_each_plane<T, F>(dst: &mut [T], plane_len: usize, f: F)
where
    T: Float + Send + Sync,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if plane_len == 0 || dst.is_empty() {
        return;
    }

    #[cfg(feature = "parallel")]
    {
        use scirs2_core::parallel_ops::*;
        dst.par_chunks_mut(plane_len)
            .enumerate()
            .for_each(|(p, plane)| f(p, plane));
    }

    #[cfg(not(feature = "parallel"))]
    {
        dst.chunks_mut(plane_len)
            .enumerate()
            .for_each(|(p, plane)| f(p, plane));
    }
}

impl<T> DenseND<T>
where
    T: Float + Send + Sync,
{
    /// Depthwise valid 2D cross-correlation with a single shared kernel.
    ///
    /// # Arguments
    ///
    /// * `kernel` - 2D kernel `[KH, KW]`, applied identically to every plane
    ///
    /// # Shape Requirements
    ///
    /// - Input: `[N, C, H, W]` (already padded)
    /// - Kernel: `[KH, KW]` with `KH <= H`, `KW <= W`
    /// - Output: `[N, C, H - KH + 1, W - KW + 1]`
    ///
    /// # Complexity
    ///
    /// O(N * C * H * W * KH * KW)
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::DenseND;
    ///
    /// // Horizontal difference on a ramp: every output equals 2.
    /// let ramp = DenseND::<f64>::from_fn(&[1, 2, 3, 5], |idx| idx[3] as f64);
    /// let kernel = DenseND::<f64>::from_vec(vec![-1.0, 0.0, 1.0], &[1, 3]).unwrap();
    ///
    /// let out = ramp.depthwise_correlate2d(&kernel).unwrap();
    /// assert_eq!(out.shape(), &[1, 2, 3, 3]);
    /// assert!(out.iter().all(|&v| v == 2.0));
    /// ```
    pub fn depthwise_correlate2d(&self, kernel: &Self) -> anyhow::Result<Self> {
        let g = self.correlation_geometry(kernel, "depthwise_correlate2d")?;
        let shape = self.shape();
        let (n, c) = (shape[0], shape[1]);

        let input = self.data.as_standard_layout();
        let input = input
            .as_slice()
            .ok_or_else(|| anyhow::anyhow!("depthwise_correlate2d: input is not contiguous"))?;
        let weights: Vec<T> = kernel.data.iter().copied().collect();

        let mut output = vec![T::zero(); n * c * g.out_len()];
        for_each_plane(&mut output, g.out_len(), |p, plane| {
            let src = &input[p * g.in_len()..(p + 1) * g.in_len()];
            correlate_plane(src, &weights, g, plane);
        });

        Self::from_vec(output, &[n, c, g.out_h, g.out_w])
    }

    /// Adjoint of [`depthwise_correlate2d`](Self::depthwise_correlate2d).
    ///
    /// `self` is the gradient with respect to the correlation output
    /// `[N, C, OH, OW]`; the result is the gradient with respect to its input
    /// `[N, C, OH + KH - 1, OW + KW - 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::DenseND;
    ///
    /// let kernel = DenseND::<f64>::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// let grad_out = DenseND::<f64>::ones(&[1, 1, 1, 1]);
    ///
    /// // A single output pixel scatters the kernel back over its window.
    /// let grad_in = grad_out.depthwise_correlate2d_adjoint(&kernel).unwrap();
    /// assert_eq!(grad_in.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    /// ```
    pub fn depthwise_correlate2d_adjoint(&self, kernel: &Self) -> anyhow::Result<Self> {
        anyhow::ensure!(
            self.rank() == 4,
            "depthwise_correlate2d_adjoint: gradient must be 4D [N, C, OH, OW], got rank {}",
            self.rank()
        );
        anyhow::ensure!(
            kernel.rank() == 2,
            "Kernel must be 2D, got rank {}",
            kernel.rank()
        );

        let shape = self.shape();
        let (n, c, out_h, out_w) = (shape[0], shape[1], shape[2], shape[3]);
        let (kernel_h, kernel_w) = (kernel.shape()[0], kernel.shape()[1]);
        anyhow::ensure!(
            kernel_h > 0 && kernel_w > 0,
            "Kernel must be non-empty, got {}x{}",
            kernel_h,
            kernel_w
        );

        let g = PlaneGeometry {
            in_h: out_h + kernel_h - 1,
            in_w: out_w + kernel_w - 1,
            kernel_h,
            kernel_w,
            out_h,
            out_w,
        };

        let grad_output = self.data.as_standard_layout();
        let grad_output = grad_output.as_slice().ok_or_else(|| {
            anyhow::anyhow!("depthwise_correlate2d_adjoint: gradient is not contiguous")
        })?;
        let weights: Vec<T> = kernel.data.iter().copied().collect();

        let mut grad_input = vec![T::zero(); n * c * g.in_len()];
        for_each_plane(&mut grad_input, g.in_len(), |p, plane| {
            let src = &grad_output[p * g.out_len()..(p + 1) * g.out_len()];
            correlate_plane_adjoint(src, &weights, g, plane);
        });

        Self::from_vec(grad_input, &[n, c, g.in_h, g.in_w])
    }

    fn correlation_geometry(&self, kernel: &Self, op: &str) -> anyhow::Result<PlaneGeometry> {
        anyhow::ensure!(
            self.rank() == 4,
            "{}: input must be 4D [N, C, H, W], got rank {}",
            op,
            self.rank()
        );
        anyhow::ensure!(
            kernel.rank() == 2,
            "Kernel must be 2D, got rank {}",
            kernel.rank()
        );

        let (in_h, in_w) = (self.shape()[2], self.shape()[3]);
        let (kernel_h, kernel_w) = (kernel.shape()[0], kernel.shape()[1]);
        anyhow::ensure!(
            kernel_h > 0 && kernel_w > 0,
            "Kernel must be non-empty, got {}x{}",
            kernel_h,
            kernel_w
        );
        anyhow::ensure!(
            in_h >= kernel_h && in_w >= kernel_w,
            "{}: input size {}x{} is smaller than kernel size {}x{}",
            op,
            in_h,
            in_w,
            kernel_h,
            kernel_w
        );

        Ok(PlaneGeometry {
            in_h,
            in_w,
            kernel_h,
            kernel_w,
            out_h: in_h - kernel_h + 1,
            out_w: in_w - kernel_w + 1,
        })
    }
}
