use nalgebra::{DMatrix, DVector};

use super::{SvdError, SvdKernel, check_shape, sort_descending};

/// SVD by Householder QR followed by one-sided Jacobi rotations on the
/// triangular factor
///
/// The input is reduced to `Q R` first (its transpose when it has more
/// columns than rows) so the rotation sweeps only touch a square matrix
/// the size of the smaller dimension. By default the sweeps rotate columns
/// of `R`; [`SvdGivens::set_rotate_rows`] switches them to rows, which
/// accumulates the rotations on the other side.
#[derive(Clone, Debug)]
pub struct SvdGivens {
    rows: usize,
    cols: usize,
    rotate_rows: bool,
    // QR workspace, `p x q` with `p >= q`
    work: DMatrix<f64>,
    q: DMatrix<f64>,
    reflector: DVector<f64>,
    // Rotation workspace on the `q x q` factor
    b: DMatrix<f64>,
    rotations: DMatrix<f64>,
    small_sigma: DVector<f64>,
    small_left: DMatrix<f64>,
    small_right: DMatrix<f64>,
    // Outputs
    u: DMatrix<f64>,
    sigma: DVector<f64>,
    v: DMatrix<f64>,
}

impl SvdGivens {
    pub fn new(rows: usize, cols: usize) -> Self {
        let (p, q) = (rows.max(cols), rows.min(cols));
        Self {
            rows,
            cols,
            rotate_rows: false,
            work: DMatrix::zeros(p, q),
            q: DMatrix::zeros(p, p),
            reflector: DVector::zeros(p),
            b: DMatrix::zeros(q, q),
            rotations: DMatrix::zeros(q, q),
            small_sigma: DVector::zeros(q),
            small_left: DMatrix::zeros(q, q),
            small_right: DMatrix::zeros(q, q),
            u: DMatrix::zeros(rows, cols),
            sigma: DVector::zeros(cols),
            v: DMatrix::zeros(cols, cols),
        }
    }

    /// Rotate rows instead of columns of the triangular factor
    pub fn set_rotate_rows(&mut self, rotate_rows: bool) {
        self.rotate_rows = rotate_rows;
    }

    fn transposed(&self) -> bool {
        self.cols > self.rows
    }

    /// Householder QR of `work` in place, accumulating `Q`
    fn factorize(&mut self) {
        let (p, q) = self.work.shape();
        self.q.fill_with_identity();
        for k in 0..q.min(p.saturating_sub(1)) {
            let norm = self.work.view((k, k), (p - k, 1)).norm();
            if norm == 0.0 {
                continue;
            }
            let alpha = if self.work[(k, k)] >= 0.0 { -norm } else { norm };
            self.reflector.fill(0.0);
            for i in k..p {
                self.reflector[i] = self.work[(i, k)];
            }
            self.reflector[k] -= alpha;
            let v_norm = self.reflector.norm();
            if v_norm == 0.0 {
                continue;
            }
            self.reflector /= v_norm;

            // work <- (I - 2 v vᵀ) work
            for j in k..q {
                let mut dot = 0.0;
                for i in k..p {
                    dot += self.reflector[i] * self.work[(i, j)];
                }
                for i in k..p {
                    self.work[(i, j)] -= 2.0 * dot * self.reflector[i];
                }
            }
            // Q <- Q (I - 2 v vᵀ)
            for i in 0..p {
                let mut dot = 0.0;
                for j in k..p {
                    dot += self.q[(i, j)] * self.reflector[j];
                }
                for j in k..p {
                    self.q[(i, j)] -= 2.0 * dot * self.reflector[j];
                }
            }
        }
    }

    /// Orthogonalize the columns of `b`, accumulating the rotations
    ///
    /// Returns the number of sweeps it took.
    fn sweep(&mut self, max_sweeps: usize) -> Result<usize, SvdError> {
        let n = self.b.ncols();
        let tolerance = n as f64 * f64::EPSILON;
        self.rotations.fill_with_identity();

        for sweep in 0..max_sweeps {
            let mut rotated = false;
            for i in 0..n {
                for j in i + 1..n {
                    let alpha = self.b.column(i).norm_squared();
                    let beta = self.b.column(j).norm_squared();
                    let gamma = self.b.column(i).dot(&self.b.column(j));
                    if alpha == 0.0 || beta == 0.0 {
                        continue;
                    }
                    if gamma.abs() <= tolerance * (alpha * beta).sqrt() {
                        continue;
                    }
                    let zeta = (beta - alpha) / (2.0 * gamma);
                    let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                    let c = 1.0 / (1.0 + t * t).sqrt();
                    let s = c * t;
                    rotate_columns(&mut self.b, i, j, c, s);
                    rotate_columns(&mut self.rotations, i, j, c, s);
                    rotated = true;
                }
            }
            if !rotated {
                return Ok(sweep);
            }
        }
        Err(SvdError::NoConvergence {
            max_iterations: max_sweeps,
        })
    }
}

/// `x_i <- c x_i - s x_j`, `x_j <- s x_i + c x_j`
fn rotate_columns(m: &mut DMatrix<f64>, i: usize, j: usize, c: f64, s: f64) {
    for r in 0..m.nrows() {
        let x = m[(r, i)];
        let y = m[(r, j)];
        m[(r, i)] = c * x - s * y;
        m[(r, j)] = s * x + c * y;
    }
}

impl SvdKernel for SvdGivens {
    fn with_size(rows: usize, cols: usize) -> Self {
        Self::new(rows, cols)
    }

    fn resize(&mut self, rows: usize, cols: usize) {
        let rotate_rows = self.rotate_rows;
        *self = Self::new(rows, cols);
        self.rotate_rows = rotate_rows;
    }

    fn decompose(&mut self, a: &DMatrix<f64>, max_iterations: usize) -> Result<(), SvdError> {
        check_shape(a, self.rows, self.cols)?;
        if a.iter().any(|x| !x.is_finite()) {
            return Err(SvdError::Breakdown {
                message: "matrix has non-finite entries",
            });
        }
        let transposed = self.transposed();
        if transposed {
            a.transpose_to(&mut self.work);
        } else {
            self.work.copy_from(a);
        }
        self.factorize();

        // `R` in `b`, or `Rᵀ` when rotating rows
        let q = self.b.nrows();
        self.b.fill(0.0);
        for j in 0..q {
            for i in 0..=j {
                if self.rotate_rows {
                    self.b[(j, i)] = self.work[(i, j)];
                } else {
                    self.b[(i, j)] = self.work[(i, j)];
                }
            }
        }
        self.sweep(max_iterations)?;

        // b = W J with orthogonal W columns: W = left · diag(sigma)
        for j in 0..q {
            let s = self.b.column(j).norm();
            self.small_sigma[j] = s;
            if s == 0.0 {
                self.small_left.column_mut(j).fill(0.0);
            } else {
                let column = self.b.column(j) / s;
                self.small_left.set_column(j, &column);
            }
        }
        if self.rotate_rows {
            // Rᵀ = L S Jᵀ, so R = J S Lᵀ
            self.small_right.copy_from(&self.small_left);
            self.small_left.copy_from(&self.rotations);
        } else {
            self.small_right.copy_from(&self.rotations);
        }
        sort_descending(
            &mut self.small_sigma,
            &mut self.small_left,
            &mut self.small_right,
        );

        // Factor of Q matching the columns of R
        let q_thin = self.q.columns(0, q);
        self.sigma.fill(0.0);
        self.sigma.rows_mut(0, q).copy_from(&self.small_sigma);
        if transposed {
            // Aᵀ = Q L S Jᵀ, so A = J S (Q L)ᵀ
            self.u.fill(0.0);
            self.u.columns_mut(0, q).copy_from(&self.small_right);
            let p = self.q.ncols();
            self.v
                .columns_mut(0, q)
                .gemm(1.0, &q_thin, &self.small_left, 0.0);
            self.v
                .columns_mut(q, p - q)
                .copy_from(&self.q.columns(q, p - q));
        } else {
            self.u.gemm(1.0, &q_thin, &self.small_left, 0.0);
            self.v.copy_from(&self.small_right);
        }
        Ok(())
    }

    fn u(&self) -> &DMatrix<f64> {
        &self.u
    }

    fn singular_values(&self) -> &DVector<f64> {
        &self.sigma
    }

    fn v(&self) -> &DMatrix<f64> {
        &self.v
    }
}
