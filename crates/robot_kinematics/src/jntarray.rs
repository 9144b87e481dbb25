use std::ops::{Index, IndexMut};

use nalgebra::DVector;

use crate::Chain;
use crate::error::{SolverError, check_size};

/// Joint values of a chain, one per non-fixed joint in chain order
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JntArray {
    data: DVector<f64>,
}

impl Default for JntArray {
    fn default() -> Self {
        Self::new(0)
    }
}

impl JntArray {
    /// Zero-filled array of `n` joints
    pub fn new(n: usize) -> Self {
        Self {
            data: DVector::zeros(n),
        }
    }

    pub fn from_slice(values: &[f64]) -> Self {
        Self {
            data: DVector::from_column_slice(values),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of rows, same as [`JntArray::len`]
    pub fn rows(&self) -> usize {
        self.data.len()
    }

    /// Change the length, zeroing every value
    pub fn resize(&mut self, n: usize) {
        self.data = DVector::zeros(n);
    }

    pub fn set_to_zero(&mut self) {
        self.data.fill(0.0);
    }

    /// Whether there is one value per joint of `chain`
    pub fn matches(&self, chain: &Chain) -> bool {
        self.len() == chain.nr_of_joints()
    }

    /// `out = self + other`
    pub fn add(&self, other: &JntArray, out: &mut JntArray) -> Result<(), SolverError> {
        check_size(self.len(), other.len())?;
        check_size(self.len(), out.len())?;
        self.data.add_to(&other.data, &mut out.data);
        Ok(())
    }

    /// `out = self - other`
    pub fn subtract(&self, other: &JntArray, out: &mut JntArray) -> Result<(), SolverError> {
        check_size(self.len(), other.len())?;
        check_size(self.len(), out.len())?;
        self.data.sub_to(&other.data, &mut out.data);
        Ok(())
    }

    pub fn as_slice(&self) -> &[f64] {
        self.data.as_slice()
    }

    pub fn as_nalgebra(&self) -> &DVector<f64> {
        &self.data
    }

    pub fn as_nalgebra_mut(&mut self) -> &mut DVector<f64> {
        &mut self.data
    }
}

impl From<DVector<f64>> for JntArray {
    fn from(data: DVector<f64>) -> Self {
        Self { data }
    }
}

impl From<Vec<f64>> for JntArray {
    fn from(values: Vec<f64>) -> Self {
        Self {
            data: DVector::from_vec(values),
        }
    }
}

impl Index<usize> for JntArray {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.data[index]
    }
}

impl IndexMut<usize> for JntArray {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.data[index]
    }
}
