//! Element access on tensors
//!
//! Bounds-checked accessors returning `Option`. The panicking `Index` impls
//! live in `densend_traits`.

use super::types::DenseND;
use scirs2_core::numeric::Num;

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Element at `index`, or `None` when the rank or any coordinate is off
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::DenseND;
    ///
    /// let tensor = DenseND::<f64>::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// assert_eq!(tensor.get(&[0, 1]), Some(&2.0));
    /// assert_eq!(tensor.get(&[5, 5]), None);
    /// assert_eq!(tensor.get(&[0]), None);
    /// ```
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        if !self.contains_index(index) {
            return None;
        }
        self.data.get(index)
    }

    /// Mutable counterpart of [`get`](Self::get)
    ///
    /// # Examples
    ///
    /// ```
    /// use imgrad_core::DenseND;
    ///
    /// let mut tensor = DenseND::<f64>::zeros(&[1, 1, 2, 2]);
    /// if let Some(elem) = tensor.get_mut(&[0, 0, 1, 1]) {
    ///     *elem = 10.0;
    /// }
    /// assert_eq!(tensor.get(&[0, 0, 1, 1]), Some(&10.0));
    /// ```
    pub fn get_mut(&mut self, index: &[usize]) -> Option<&mut T> {
        if !self.contains_index(index) {
            return None;
        }
        self.data.get_mut(index)
    }

    fn contains_index(&self, index: &[usize]) -> bool {
        index.len() == self.rank() && index.iter().zip(self.shape()).all(|(&i, &n)| i < n)
    }
}
