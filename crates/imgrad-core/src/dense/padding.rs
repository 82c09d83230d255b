//! Spatial padding of the two trailing axes and its adjoint
//!
//! Every leading axis is treated as an independent plane index, so an image
//! `[B, C, H, W]` is padded as `B * C` independent `H x W` planes.
//!
//! # Padding Modes
//!
//! For a row of length `n = 4` padded by `p = 2`:
//!
//! ```text
//! source:       a b c d
//! Zeros:    0 0 a b c d 0 0
//! Replicate:a a a b c d d d
//! Reflect:  c b a b c d c b
//! ```
//!
//! # Adjoint
//!
//! Padding is linear, so its backward is its transpose: every padded cell
//! sends its gradient to the source cell it was copied from. Under `Zeros`
//! that is a crop; under `Replicate`/`Reflect` border cells accumulate the
//! contributions of their copies.

use super::types::DenseND;
use scirs2_core::numeric::Float;

/// Boundary handling for [`DenseND::pad2d`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PaddingMode {
    /// Constant zero outside the image
    #[default]
    Zeros,
    /// Repeat the nearest edge pixel
    Replicate,
    /// Mirror about the edge pixel, excluding the edge itself
    Reflect,
}

impl PaddingMode {
    /// Map a (possibly out-of-range) coordinate to the source coordinate it
    /// reads from, or `None` when the padded cell is a constant zero.
    ///
    /// Callers guarantee `n > pad` for `Reflect` and `n > 0` for `Replicate`.
    #[inline]
    pub(crate) fn source_index(self, i: isize, n: usize) -> Option<usize> {
        let last = n as isize - 1;
        match self {
            PaddingMode::Zeros => (0..=last).contains(&i).then_some(i as usize),
            PaddingMode::Replicate => Some(i.clamp(0, last) as usize),
            PaddingMode::Reflect => {
                let r = if i < 0 {
                    -i
                } else if i > last {
                    2 * last - i
                } else {
                    i
                };
                Some(r as usize)
            }
        }
    }

    /// Smallest spatial extent this mode can pad by `pad` pixels.
    pub fn min_extent(self, pad: usize) -> usize {
        match self {
            PaddingMode::Zeros => 0,
            PaddingMode::Replicate => usize::from(pad > 0),
            PaddingMode::Reflect => pad + 1,
        }
    }
}

impl<T> DenseND<T>
where
    T: Float,
{
    /// Pad the two trailing axes by `pad` cells on every side.
    ///
    /// # Shape Requirements
    ///
    /// - Input: `[..., H, W]` with rank ≥ 2
    /// - Output: `[..., H + 2*pad, W + 2*pad]`
    ///
    /// # Errors
    ///
    /// Returns an error for rank < 2, or when `H`/`W` are too small for the
    /// mode (see [`PaddingMode::min_extent`]).
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::{DenseND, PaddingMode};
    ///
    /// let x = DenseND::<f64>::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2]).unwrap();
    ///
    /// let zeros = x.pad2d(1, PaddingMode::Zeros).unwrap();
    /// assert_eq!(zeros.shape(), &[1, 1, 4, 4]);
    /// assert_eq!(zeros.get(&[0, 0, 0, 0]), Some(&0.0));
    ///
    /// let edge = x.pad2d(1, PaddingMode::Replicate).unwrap();
    /// assert_eq!(edge.get(&[0, 0, 0, 0]), Some(&1.0));
    /// assert_eq!(edge.get(&[0, 0, 3, 3]), Some(&4.0));
    /// ```
    pub fn pad2d(&self, pad: usize, mode: PaddingMode) -> anyhow::Result<Self> {
        let (planes, h, w) = self.plane_dims("pad2d")?;
        check_extent(mode, pad, h, w)?;

        let hp = h + 2 * pad;
        let wp = w + 2 * pad;
        let src = self.data.as_standard_layout();
        let src = src
            .as_slice()
            .ok_or_else(|| anyhow::anyhow!("pad2d: input is not contiguous"))?;

        let mut out = vec![T::zero(); planes * hp * wp];
        if !out.is_empty() {
            for (p, dst) in out.chunks_mut(hp * wp).enumerate() {
                let plane = &src[p * h * w..(p + 1) * h * w];
                for i in 0..hp {
                    let Some(si) = mode.source_index(i as isize - pad as isize, h) else {
                        continue;
                    };
                    for j in 0..wp {
                        if let Some(sj) = mode.source_index(j as isize - pad as isize, w) {
                            dst[i * wp + j] = plane[si * w + sj];
                        }
                    }
                }
            }
        }

        let mut shape = self.shape_vec();
        let r = shape.len();
        shape[r - 2] = hp;
        shape[r - 1] = wp;
        Self::from_vec(out, &shape)
    }

    /// Adjoint of [`pad2d`](Self::pad2d).
    ///
    /// `self` is a gradient with respect to the padded tensor
    /// `[..., H + 2*pad, W + 2*pad]`; the result is the gradient with respect
    /// to the unpadded `[..., H, W]` input.
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::{DenseND, PaddingMode};
    ///
    /// // Every padded cell of a 1x1 image replicates the centre pixel.
    /// let grad = DenseND::<f64>::ones(&[1, 1, 3, 3]);
    /// let back = grad.pad2d_adjoint(1, PaddingMode::Replicate).unwrap();
    /// assert_eq!(back.to_vec(), vec![9.0]);
    ///
    /// let crop = grad.pad2d_adjoint(1, PaddingMode::Zeros).unwrap();
    /// assert_eq!(crop.to_vec(), vec![1.0]);
    /// ```
    pub fn pad2d_adjoint(&self, pad: usize, mode: PaddingMode) -> anyhow::Result<Self> {
        let (planes, hp, wp) = self.plane_dims("pad2d_adjoint")?;
        anyhow::ensure!(
            hp >= 2 * pad && wp >= 2 * pad,
            "pad2d_adjoint: padded extent {}x{} is smaller than twice the padding {}",
            hp,
            wp,
            pad
        );
        let h = hp - 2 * pad;
        let w = wp - 2 * pad;
        check_extent(mode, pad, h, w)?;

        let src = self.data.as_standard_layout();
        let src = src
            .as_slice()
            .ok_or_else(|| anyhow::anyhow!("pad2d_adjoint: gradient is not contiguous"))?;

        let mut out = vec![T::zero(); planes * h * w];
        if !out.is_empty() {
            for (p, dst) in out.chunks_mut(h * w).enumerate() {
                let plane = &src[p * hp * wp..(p + 1) * hp * wp];
                for i in 0..hp {
                    let Some(si) = mode.source_index(i as isize - pad as isize, h) else {
                        continue;
                    };
                    for j in 0..wp {
                        if let Some(sj) = mode.source_index(j as isize - pad as isize, w) {
                            dst[si * w + sj] = dst[si * w + sj] + plane[i * wp + j];
                        }
                    }
                }
            }
        }

        let mut shape = self.shape_vec();
        let r = shape.len();
        shape[r - 2] = h;
        shape[r - 1] = w;
        Self::from_vec(out, &shape)
    }

    /// Split the shape into (number of planes, height, width).
    pub(crate) fn plane_dims(&self, op: &str) -> anyhow::Result<(usize, usize, usize)> {
        let shape = self.shape();
        anyhow::ensure!(
            shape.len() >= 2,
            "{}: input must have rank >= 2, got rank {}",
            op,
            shape.len()
        );
        let r = shape.len();
        let planes = shape[..r - 2].iter().product();
        Ok((planes, shape[r - 2], shape[r - 1]))
    }
}

fn check_extent(mode: PaddingMode, pad: usize, h: usize, w: usize) -> anyhow::Result<()> {
    let min = mode.min_extent(pad);
    anyhow::ensure!(
        h >= min && w >= min,
        "{:?} padding by {} needs spatial extent >= {}, got {}x{}",
        mode,
        pad,
        min,
        h,
        w
    );
    Ok(())
}
