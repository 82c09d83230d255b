//! Panicking multi-index access and a shape-first `Debug`

use super::types::DenseND;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Element at a full multi-index; panics where [`DenseND::get`] returns `None`
impl<T> Index<&[usize]> for DenseND<T> {
    type Output = T;

    fn index(&self, pixel: &[usize]) -> &T {
        &self.data[pixel]
    }
}

impl<T> IndexMut<&[usize]> for DenseND<T> {
    fn index_mut(&mut self, pixel: &[usize]) -> &mut T {
        &mut self.data[pixel]
    }
}

impl<T: fmt::Debug> fmt::Debug for DenseND<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseND")
            .field("shape", &self.data.shape())
            .field("rank", &self.data.ndim())
            .field("data", &self.data)
            .finish()
    }
}
