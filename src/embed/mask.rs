//! Boolean masks selecting positions of a destination array.

use crate::error::{ReparamError, Result};
use ndarray::{Array, Array1, ArrayBase, ArrayD, Data, Dimension, IxDyn};

/// A boolean array of any dimensionality marking the positions an
/// embedding writes to.
///
/// Positions are visited in the array's logical row-major order, both when
/// scattering and when gathering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    cells: ArrayD<bool>,
    count: usize,
}

impl Mask {
    pub fn new(cells: ArrayD<bool>) -> Self {
        let count = cells.iter().filter(|&&m| m).count();
        Self { cells, count }
    }

    /// Mask that is true wherever `predicate` holds for the matching element of `array`.
    pub fn from_predicate<S, D, F>(array: &ArrayBase<S, D>, predicate: F) -> Self
    where
        S: Data,
        D: Dimension,
        F: Fn(&S::Elem) -> bool,
    {
        Self::new(array.map(predicate).into_dyn())
    }

    /// Number of true positions.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn shape(&self) -> &[usize] {
        self.cells.shape()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn as_array(&self) -> &ArrayD<bool> {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.cells.iter().copied()
    }

    /// Indices of the true positions, in scatter order.
    pub fn positions(&self) -> impl Iterator<Item = IxDyn> + '_ {
        self.cells
            .indexed_iter()
            .filter(|&(_, &m)| m)
            .map(|(index, _)| index)
    }

    /// The mask with every position flipped.
    pub fn complement(&self) -> Mask {
        Mask::new(self.cells.mapv(|m| !m))
    }

    /// Fail with `DimensionMismatch` unless `shape` equals the mask's shape.
    pub fn check_shape(&self, shape: &[usize], what: &str) -> Result<()> {
        if shape != self.shape() {
            return Err(ReparamError::DimensionMismatch(format!(
                "{} shape {:?} does not match mask shape {:?}",
                what,
                shape,
                self.shape()
            )));
        }
        Ok(())
    }

    /// Elements of `array` at the true positions, in scatter order.
    pub fn gather<A, S, D>(&self, array: &ArrayBase<S, D>) -> Result<Array1<A>>
    where
        A: Clone,
        S: Data<Elem = A>,
        D: Dimension,
    {
        self.check_shape(array.shape(), "array")?;
        Ok(array
            .iter()
            .zip(self.cells.iter())
            .filter(|&(_, &m)| m)
            .map(|(value, _)| value.clone())
            .collect())
    }
}

impl<D: Dimension> From<Array<bool, D>> for Mask {
    fn from(cells: Array<bool, D>) -> Self {
        Mask::new(cells.into_dyn())
    }
}

impl From<Vec<bool>> for Mask {
    fn from(cells: Vec<bool>) -> Self {
        Mask::new(Array1::from(cells).into_dyn())
    }
}
