//! Dense tensor type definition and basic operations
//!
//! This module defines the core `DenseND<T>` type and provides basic creation
//! and accessor methods. Additional operations are organized in separate modules.

use scirs2_core::ndarray_ext::{Array, Dimension, IxDyn};
use scirs2_core::numeric::Num;

/// Dense N-dimensional tensor backed by scirs2_core's ndarray
///
/// Images are stored as `[batch, channel, height, width]`, spatial
/// gradients as `[batch, channel, 2, height, width]`.
///
/// # Type Parameters
///
/// * `T` - The element type (typically `f32` or `f64`)
///
/// # Memory Layout
///
/// Constructors produce row-major tensors. Plane-walking kernels call
/// `as_standard_layout()` first, so arrays with arbitrary strides wrapped via
/// [`from_array`](Self::from_array) work too.
///
/// # Examples
///
/// ```
/// use imgrad_core::dense::DenseND;
///
/// let image = DenseND::<f64>::zeros(&[1, 3, 4, 4]);
/// assert_eq!(image.shape(), &[1, 3, 4, 4]);
/// assert_eq!(image.rank(), 4);
/// ```
#[derive(Clone, PartialEq)]
pub struct DenseND<T> {
    /// Underlying ndarray storage (via scirs2_core)
    pub(crate) data: Array<T, IxDyn>,
}

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Wrap an existing ndarray without copying
    ///
    /// # Examples
    ///
    /// ```
    /// use scirs2_core::ndarray_ext::Array;
    /// use imgrad_core::dense::DenseND;
    ///
    /// let arr = Array::<f64, _>::zeros(vec![1, 1, 3, 3]);
    /// let image = DenseND::from_array(arr);
    /// assert_eq!(image.shape(), &[1, 1, 3, 3]);
    /// ```
    pub fn from_array(array: Array<T, IxDyn>) -> Self {
        Self { data: array }
    }

    /// Build a tensor from row-major `values`.
    ///
    /// # Errors
    ///
    /// Fails when `values.len()` differs from the product of `shape`.
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::dense::DenseND;
    ///
    /// let plus = DenseND::from_vec(
    ///     vec![0.0, 1.0, 0.0,
    ///          1.0, 1.0, 1.0,
    ///          0.0, 1.0, 0.0],
    ///     &[1, 1, 3, 3],
    /// ).unwrap();
    /// assert_eq!(plus.shape(), &[1, 1, 3, 3]);
    ///
    /// assert!(DenseND::from_vec(vec![1.0, 2.0], &[3]).is_err());
    /// ```
    pub fn from_vec(values: Vec<T>, shape: &[usize]) -> anyhow::Result<Self> {
        let expected: usize = shape.iter().product();
        anyhow::ensure!(
            values.len() == expected,
            "Shape {:?} holds {} elements, got {}",
            shape,
            expected,
            values.len()
        );
        Ok(Self {
            data: Array::from_shape_vec(IxDyn(shape), values)?,
        })
    }

    /// Tensor of `shape` with every element set to `value`
    pub fn from_elem(shape: &[usize], value: T) -> Self {
        Self {
            data: Array::from_elem(IxDyn(shape), value),
        }
    }

    /// Zero-filled tensor
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::dense::DenseND;
    ///
    /// let grad = DenseND::<f64>::zeros(&[2, 3, 2, 4, 4]);
    /// assert_eq!(grad.len(), 192);
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    /// One-filled tensor
    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: Array::ones(IxDyn(shape)),
        }
    }

    /// Build a tensor by evaluating `f` at every multi-index (row-major order)
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::dense::DenseND;
    ///
    /// // Horizontal ramp: value equals the column index
    /// let ramp = DenseND::<f64>::from_fn(&[1, 1, 2, 3], |idx| idx[3] as f64);
    /// assert_eq!(ramp.to_vec(), vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0]);
    /// ```
    pub fn from_fn<F>(shape: &[usize], mut f: F) -> Self
    where
        F: FnMut(&[usize]) -> T,
    {
        Self {
            data: Array::from_shape_fn(IxDyn(shape), |idx| f(idx.slice())),
        }
    }

    /// Number of axes
    pub fn rank(&self) -> usize {
        self.data.ndim()
    }

    /// Extent of every axis
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Owned copy of [`shape`](Self::shape)
    pub fn shape_vec(&self) -> Vec<usize> {
        self.data.shape().to_vec()
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when any axis has extent zero
    ///
    /// Zero-sized batch or channel axes are legal image shapes, so empty
    /// tensors flow through every operator.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Elements in row-major order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// Copy the elements out in row-major order
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::dense::DenseND;
    ///
    /// let tensor = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// assert_eq!(tensor.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    /// ```
    pub fn to_vec(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }

    /// Consume the tensor, returning its elements in row-major order
    pub fn into_vec(self) -> Vec<T> {
        self.data.into_iter().collect()
    }

    /// Multi-index of the element at row-major offset `offset`
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::dense::DenseND;
    ///
    /// let tensor = DenseND::<f64>::zeros(&[2, 3, 4]);
    /// assert_eq!(tensor.linear_to_multi_index(13), vec![1, 0, 1]);
    /// ```
    pub fn linear_to_multi_index(&self, offset: usize) -> Vec<usize> {
        let mut index = vec![0; self.rank()];
        let mut rest = offset;
        for (slot, &extent) in index.iter_mut().zip(self.shape()).rev() {
            *slot = rest % extent;
            rest /= extent;
        }
        index
    }
}
