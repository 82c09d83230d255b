//! Stacking tensors along a new axis and selecting a single index of an axis
//!
//! Used to assemble `[B, C, 2, H, W]` gradients from their dx/dy planes and
//! to take them apart again.

use super::types::DenseND;
use scirs2_core::ndarray_ext::Axis;
use scirs2_core::numeric::Num;

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Stack tensors of identical shape along a new axis.
    ///
    /// # Errors
    ///
    /// Fails on an empty list, on differing shapes, or when `axis` exceeds
    /// the operand rank.
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::DenseND;
    ///
    /// let dx = DenseND::<f64>::ones(&[1, 3, 4, 4]);
    /// let dy = DenseND::<f64>::zeros(&[1, 3, 4, 4]);
    ///
    /// let grad = DenseND::stack(&[dx, dy], 2).unwrap();
    /// assert_eq!(grad.shape(), &[1, 3, 2, 4, 4]);
    /// ```
    pub fn stack(tensors: &[Self], axis: usize) -> anyhow::Result<Self> {
        let Some((first, rest)) = tensors.split_first() else {
            anyhow::bail!("stack needs at least one tensor");
        };
        anyhow::ensure!(
            axis <= first.rank(),
            "stack axis {} exceeds rank {}",
            axis,
            first.rank()
        );
        if let Some((pos, odd)) = rest.iter().enumerate().find(|(_, t)| t.shape() != first.shape()) {
            anyhow::bail!(
                "stack operand {} has shape {:?}, operand 0 has {:?}",
                pos + 1,
                odd.shape(),
                first.shape()
            );
        }

        let views: Vec<_> = tensors.iter().map(|tensor| tensor.data.view()).collect();
        Ok(Self {
            data: scirs2_core::ndarray::stack(Axis(axis), &views)?,
        })
    }

    /// Select index `index` of axis `axis`, removing that axis.
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::DenseND;
    ///
    /// let grad = DenseND::<f64>::from_fn(&[1, 1, 2, 2, 2], |idx| idx[2] as f64);
    /// let dy = grad.index_axis(2, 1).unwrap();
    /// assert_eq!(dy.shape(), &[1, 1, 2, 2]);
    /// assert!(dy.iter().all(|&v| v == 1.0));
    /// ```
    pub fn index_axis(&self, axis: usize, index: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(
            axis < self.rank(),
            "index_axis: axis {} on a rank-{} tensor",
            axis,
            self.rank()
        );
        anyhow::ensure!(
            index < self.shape()[axis],
            "Index {} out of bounds for axis {} of size {}",
            index,
            axis,
            self.shape()[axis]
        );

        Ok(Self {
            data: self.data.index_axis(Axis(axis), index).to_owned(),
        })
    }
}
