use nalgebra::{DMatrix, DVector};

use super::{SvdError, check_shape};

/// Warm-started one-sided Jacobi SVD
///
/// Keeps `U` (`m x m`) and `V` (`n x n`) between calls. Each call starts
/// from the previous factor on one side and sweeps plane rotations until a
/// whole pass rotates nothing, so a matrix that changed little since the
/// last call converges in very few sweeps.
///
/// Singular values come out in whatever order the sweeps leave them; they
/// are not sorted.
#[derive(Clone, Debug)]
pub struct SvdJacobi {
    u: DMatrix<f64>,
    sigma: DVector<f64>,
    v: DMatrix<f64>,
    b: DMatrix<f64>,
    threshold: f64,
    max_sweeps: usize,
}

impl SvdJacobi {
    /// Kernel for `rows x cols` matrices with `rows >= cols`
    ///
    /// A pair is rotated while its squared normalized inner product is at
    /// least `threshold`.
    pub fn new(rows: usize, cols: usize, threshold: f64, max_sweeps: usize) -> Self {
        Self {
            u: DMatrix::identity(rows, rows),
            sigma: DVector::zeros(cols),
            v: DMatrix::identity(cols, cols),
            b: DMatrix::zeros(rows, cols),
            threshold,
            max_sweeps,
        }
    }

    /// Reallocate for a new shape, dropping the warm start
    pub fn resize(&mut self, rows: usize, cols: usize) {
        *self = Self::new(rows, cols, self.threshold, self.max_sweeps);
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    pub fn set_max_sweeps(&mut self, max_sweeps: usize) {
        self.max_sweeps = max_sweeps;
    }

    /// Decompose `a`, returning the number of sweeps that rotated anything
    ///
    /// With `reuse_v` the sweep starts from `B = A V` and rotates columns,
    /// updating `V`; `U` and `S` are rebuilt from the columns of `B`.
    /// Without it the sweep starts from `B = Uᵀ A` and rotates rows,
    /// updating `U`; `V` and `S` are rebuilt from the rows of `B`.
    pub fn decompose(&mut self, a: &DMatrix<f64>, reuse_v: bool) -> Result<usize, SvdError> {
        let (rows, cols) = self.b.shape();
        check_shape(a, rows, cols)?;
        if reuse_v {
            self.b.gemm(1.0, a, &self.v, 0.0);
            let sweeps = self.sweep_columns()?;
            for i in 0..rows {
                if i < cols {
                    let s = self.b.column(i).norm();
                    if s == 0.0 {
                        self.u.set_column(i, &self.b.column(i));
                    } else {
                        self.u.set_column(i, &(self.b.column(i) / s));
                    }
                    self.sigma[i] = s;
                } else {
                    self.u.column_mut(i).fill(0.0);
                }
            }
            Ok(sweeps)
        } else {
            self.b.gemm_tr(1.0, &self.u, a, 0.0);
            let sweeps = self.sweep_rows()?;
            for i in 0..cols {
                let s = self.b.row(i).norm();
                if s == 0.0 {
                    self.v.set_column(i, &self.b.row(i).transpose());
                } else {
                    self.v.set_column(i, &(self.b.row(i).transpose() / s));
                }
                self.sigma[i] = s;
            }
            Ok(sweeps)
        }
    }

    fn sweep_columns(&mut self) -> Result<usize, SvdError> {
        let n = self.b.ncols();
        for sweeps in 0..self.max_sweeps {
            let mut rotated = false;
            for i in 0..n {
                for j in i + 1..n {
                    let p = self.b.column(i).dot(&self.b.column(j));
                    let qi = self.b.column(i).norm_squared();
                    let qj = self.b.column(j).norm_squared();
                    if let Some((c, s)) = plane_rotation(p, qi, qj, self.threshold) {
                        rotate_columns(&mut self.b, i, j, c, s);
                        rotate_columns(&mut self.v, i, j, c, s);
                        rotated = true;
                    }
                }
            }
            if !rotated {
                return Ok(sweeps);
            }
        }
        Err(SvdError::NoConvergence {
            max_iterations: self.max_sweeps,
        })
    }

    fn sweep_rows(&mut self) -> Result<usize, SvdError> {
        let n = self.b.ncols();
        for sweeps in 0..self.max_sweeps {
            let mut rotated = false;
            for i in 0..n {
                for j in i + 1..n {
                    let p = self.b.row(i).dot(&self.b.row(j));
                    let qi = self.b.row(i).norm_squared();
                    let qj = self.b.row(j).norm_squared();
                    if let Some((c, s)) = plane_rotation(p, qi, qj, self.threshold) {
                        rotate_rows(&mut self.b, i, j, c, s);
                        rotate_columns(&mut self.u, i, j, c, s);
                        rotated = true;
                    }
                }
            }
            if !rotated {
                return Ok(sweeps);
            }
        }
        Err(SvdError::NoConvergence {
            max_iterations: self.max_sweeps,
        })
    }

    /// `m x m`; columns past `n` are zero after a column sweep
    pub fn u(&self) -> &DMatrix<f64> {
        &self.u
    }

    pub fn singular_values(&self) -> &DVector<f64> {
        &self.sigma
    }

    pub fn v(&self) -> &DMatrix<f64> {
        &self.v
    }
}

/// Cosine and sine that orthogonalize a pair with inner product `p` and
/// squared norms `qi`, `qj`, or `None` when the pair is already orthogonal
/// enough or one of them is zero
fn plane_rotation(p: f64, qi: f64, qj: f64, threshold: f64) -> Option<(f64, f64)> {
    if qi * qj == 0.0 {
        return None;
    }
    let alpha = p * p / (qi * qj);
    if alpha < threshold {
        return None;
    }
    let q = qi - qj;
    let c = (4.0 * p * p + q * q).sqrt();
    if q >= 0.0 {
        let cos = ((c + q) / (2.0 * c)).sqrt();
        Some((cos, p / (c * cos)))
    } else {
        let sin = ((c - q) / (2.0 * c)).sqrt().copysign(p);
        Some((p / (c * sin), sin))
    }
}

/// `x_i <- c x_i + s x_j`, `x_j <- c x_j - s x_i`
fn rotate_columns(m: &mut DMatrix<f64>, i: usize, j: usize, c: f64, s: f64) {
    for r in 0..m.nrows() {
        let x = m[(r, i)];
        let y = m[(r, j)];
        m[(r, i)] = c * x + s * y;
        m[(r, j)] = c * y - s * x;
    }
}

fn rotate_rows(m: &mut DMatrix<f64>, i: usize, j: usize, c: f64, s: f64) {
    for k in 0..m.ncols() {
        let x = m[(i, k)];
        let y = m[(j, k)];
        m[(i, k)] = c * x + s * y;
        m[(j, k)] = c * y - s * x;
    }
}
