use std::ops::{Index, IndexMut};

use nalgebra::DMatrix;
use robot_frames::{Twist, Vector};

/// A 6 x n matrix mapping joint velocities to a twist
///
/// Rows `0..3` are the linear part, rows `3..6` the angular part. Column
/// `i` is the twist caused by unit velocity of the `i`-th non-fixed joint.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Jacobian {
    data: DMatrix<f64>,
}

impl Jacobian {
    /// Zero Jacobian for `columns` joints
    pub fn new(columns: usize) -> Self {
        Self {
            data: DMatrix::zeros(6, columns),
        }
    }

    pub fn rows(&self) -> usize {
        6
    }

    pub fn columns(&self) -> usize {
        self.data.ncols()
    }

    /// Change the number of columns, zeroing every entry
    pub fn resize(&mut self, columns: usize) {
        self.data = DMatrix::zeros(6, columns);
    }

    pub fn set_to_zero(&mut self) {
        self.data.fill(0.0);
    }

    /// The twist stored in column `i`
    ///
    /// # Panics
    /// If `i` is not below [`Jacobian::columns`].
    pub fn column(&self, i: usize) -> Twist {
        let c = self.data.column(i);
        Twist::new(
            Vector::new(c[0], c[1], c[2]),
            Vector::new(c[3], c[4], c[5]),
        )
    }

    /// # Panics
    /// If `i` is not below [`Jacobian::columns`].
    pub fn set_column(&mut self, i: usize, t: &Twist) {
        let mut c = self.data.column_mut(i);
        for (row, value) in t.as_array().into_iter().enumerate() {
            c[row] = value;
        }
    }

    pub fn as_nalgebra(&self) -> &DMatrix<f64> {
        &self.data
    }

    pub fn as_nalgebra_mut(&mut self) -> &mut DMatrix<f64> {
        &mut self.data
    }
}

impl Index<(usize, usize)> for Jacobian {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.data[index]
    }
}

impl IndexMut<(usize, usize)> for Jacobian {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        &mut self.data[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape() {
        let mut jac = Jacobian::new(4);
        assert_eq!(jac.rows(), 6);
        assert_eq!(jac.columns(), 4);
        jac.resize(2);
        assert_eq!(jac.columns(), 2);
        assert_eq!(jac.as_nalgebra().nrows(), 6);
    }

    #[test]
    fn test_column_round_trip() {
        let mut jac = Jacobian::new(3);
        let t = Twist::from([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        jac.set_column(1, &t);
        assert_eq!(jac.column(1), t);
        assert_eq!(jac[(4, 1)], 5.0);
        assert_eq!(jac.column(0), Twist::zero());

        jac[(0, 2)] = -1.0;
        assert_eq!(jac.column(2).vel.x(), -1.0);
        jac.set_to_zero();
        assert_eq!(jac, Jacobian::new(3));
    }

    #[test]
    #[should_panic]
    fn test_column_out_of_range() {
        let jac = Jacobian::new(1);
        let _ = jac.column(1);
    }
}
