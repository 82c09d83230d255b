//! Element-wise mathematical operations on tensors
//!
//! The magnitude reduction of the Sobel operator and its backward pass are
//! composed entirely from these primitives.

use super::types::DenseND;
use scirs2_core::ndarray_ext::Zip;
use scirs2_core::numeric::Float;

impl<T> DenseND<T>
where
    T: Float,
{
    /// Apply `f` to every element, producing a new tensor of the same shape.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(T) -> T,
    {
        Self {
            data: self.data.mapv(f),
        }
    }

    /// Square every element.
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::DenseND;
    ///
    /// let x = DenseND::<f64>::from_vec(vec![-3.0, 4.0], &[2]).unwrap();
    /// assert_eq!(x.square().to_vec(), vec![9.0, 16.0]);
    /// ```
    pub fn square(&self) -> Self {
        self.map(|x| x * x)
    }

    /// Square root of every element (NaN for negative inputs).
    pub fn sqrt(&self) -> Self {
        self.map(|x| x.sqrt())
    }

    /// Add a scalar to every element.
    pub fn add_scalar(&self, scalar: T) -> Self {
        self.map(|x| x + scalar)
    }

    /// Multiply every element by a scalar.
    pub fn scalar_mul(&self, scalar: T) -> Self {
        self.map(|x| x * scalar)
    }

    /// Element-wise addition.
    ///
    /// # Errors
    ///
    /// Returns an error if shapes differ. No broadcasting.
    pub fn add(&self, other: &Self) -> anyhow::Result<Self> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    /// Element-wise subtraction.
    pub fn sub(&self, other: &Self) -> anyhow::Result<Self> {
        self.zip_with(other, "sub", |a, b| a - b)
    }

    /// Element-wise (Hadamard) multiplication.
    pub fn mul(&self, other: &Self) -> anyhow::Result<Self> {
        self.zip_with(other, "mul", |a, b| a * b)
    }

    /// Element-wise division.
    pub fn div(&self, other: &Self) -> anyhow::Result<Self> {
        self.zip_with(other, "div", |a, b| a / b)
    }

    /// Sum of element-wise products, `<self, other>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::DenseND;
    ///
    /// let a = DenseND::<f64>::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
    /// let b = DenseND::<f64>::from_vec(vec![4.0, 5.0, 6.0], &[3]).unwrap();
    /// assert_eq!(a.dot(&b).unwrap(), 32.0);
    /// ```
    pub fn dot(&self, other: &Self) -> anyhow::Result<T> {
        anyhow::ensure!(
            self.shape() == other.shape(),
            "dot: shape mismatch {:?} vs {:?}",
            self.shape(),
            other.shape()
        );
        let mut sum = T::zero();
        Zip::from(&self.data)
            .and(&other.data)
            .for_each(|&a, &b| sum = sum + a * b);
        Ok(sum)
    }

    /// Largest absolute element-wise difference between two tensors.
    ///
    /// NaN differences are reported as NaN so that comparisons against a
    /// tolerance fail.
    pub fn max_abs_diff(&self, other: &Self) -> anyhow::Result<T> {
        anyhow::ensure!(
            self.shape() == other.shape(),
            "max_abs_diff: shape mismatch {:?} vs {:?}",
            self.shape(),
            other.shape()
        );
        let mut max = T::zero();
        Zip::from(&self.data).and(&other.data).for_each(|&a, &b| {
            let d = (a - b).abs();
            if d.is_nan() || d > max {
                max = d;
            }
        });
        Ok(max)
    }

    fn zip_with<F>(&self, other: &Self, op: &str, f: F) -> anyhow::Result<Self>
    where
        F: Fn(T, T) -> T,
    {
        anyhow::ensure!(
            self.shape() == other.shape(),
            "{}: shape mismatch {:?} vs {:?}",
            op,
            self.shape(),
            other.shape()
        );
        let data = Zip::from(&self.data)
            .and(&other.data)
            .map_collect(|&a, &b| f(a, b));
        Ok(Self { data })
    }
}
