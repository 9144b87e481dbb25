use nalgebra::{DMatrix, DVector};

use super::{SvdError, SvdKernel, check_shape, sort_descending};

/// SVD by Householder bidiagonalization and implicit shifted QR
///
/// Works for any shape. `U` starts as a copy of the input and is
/// transformed in place, so the decomposition needs no buffers beyond the
/// outputs and one superdiagonal vector.
#[derive(Clone, Debug)]
pub struct SvdHouseholder {
    u: DMatrix<f64>,
    sigma: DVector<f64>,
    v: DMatrix<f64>,
    superdiag: DVector<f64>,
}

impl SvdHouseholder {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            u: DMatrix::zeros(rows, cols),
            sigma: DVector::zeros(cols),
            v: DMatrix::zeros(cols, cols),
            superdiag: DVector::zeros(cols),
        }
    }
}

impl SvdKernel for SvdHouseholder {
    fn with_size(rows: usize, cols: usize) -> Self {
        Self::new(rows, cols)
    }

    fn resize(&mut self, rows: usize, cols: usize) {
        *self = Self::new(rows, cols);
    }

    fn decompose(&mut self, a: &DMatrix<f64>, max_iterations: usize) -> Result<(), SvdError> {
        check_shape(a, self.u.nrows(), self.u.ncols())?;
        self.u.copy_from(a);
        let anorm = bidiagonalize(&mut self.u, &mut self.sigma, &mut self.superdiag)?;
        accumulate_right(&self.u, &self.superdiag, &mut self.v);
        accumulate_left(&mut self.u, &self.sigma);
        diagonalize(
            &mut self.u,
            &mut self.sigma,
            &mut self.v,
            &mut self.superdiag,
            anorm,
            max_iterations,
        )?;
        sort_descending(&mut self.sigma, &mut self.u, &mut self.v);
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

/// `|a|` carrying the sign of `b`
fn sign(a: f64, b: f64) -> f64 {
    if b >= 0.0 { a.abs() } else { -a.abs() }
}

fn breakdown(message: &'static str) -> SvdError {
    SvdError::Breakdown { message }
}

/// Reduce `u` to bidiagonal form with alternating column and row
/// reflections
///
/// The diagonal ends up in `sigma` and the superdiagonal in `e` (`e[0]` is
/// always zero). The reflection vectors stay behind in `u`. Returns the
/// matrix norm estimate used as the zero threshold later on.
fn bidiagonalize(
    u: &mut DMatrix<f64>,
    sigma: &mut DVector<f64>,
    e: &mut DVector<f64>,
) -> Result<f64, SvdError> {
    let (rows, cols) = u.shape();
    let mut g = 0.0;
    let mut scale = 0.0;
    let mut anorm: f64 = 0.0;

    for i in 0..cols {
        let l = i + 1;
        e[i] = scale * g;
        g = 0.0;
        scale = 0.0;
        let mut s = 0.0;

        if i < rows {
            for k in i..rows {
                scale += u[(k, i)].abs();
            }
            if scale != 0.0 {
                for k in i..rows {
                    u[(k, i)] /= scale;
                    s += u[(k, i)] * u[(k, i)];
                }
                let f = u[(i, i)];
                if !(s >= 0.0) {
                    return Err(breakdown("column norm is not a number"));
                }
                g = -sign(s.sqrt(), f);
                let h = f * g - s;
                if h == 0.0 {
                    return Err(breakdown("degenerate column reflection"));
                }
                u[(i, i)] = f - g;
                for j in l..cols {
                    let mut s = 0.0;
                    for k in i..rows {
                        s += u[(k, i)] * u[(k, j)];
                    }
                    let f = s / h;
                    for k in i..rows {
                        let uki = u[(k, i)];
                        u[(k, j)] += f * uki;
                    }
                }
                for k in i..rows {
                    u[(k, i)] *= scale;
                }
            }
        }
        sigma[i] = scale * g;

        g = 0.0;
        scale = 0.0;
        s = 0.0;
        if i < rows && i + 1 != cols {
            for k in l..cols {
                scale += u[(i, k)].abs();
            }
            if scale != 0.0 {
                for k in l..cols {
                    u[(i, k)] /= scale;
                    s += u[(i, k)] * u[(i, k)];
                }
                let f = u[(i, l)];
                if !(s >= 0.0) {
                    return Err(breakdown("row norm is not a number"));
                }
                g = -sign(s.sqrt(), f);
                let h = f * g - s;
                if h == 0.0 {
                    return Err(breakdown("degenerate row reflection"));
                }
                u[(i, l)] = f - g;
                for k in l..cols {
                    e[k] = u[(i, k)] / h;
                }
                for j in l..rows {
                    let mut s = 0.0;
                    for k in l..cols {
                        s += u[(j, k)] * u[(i, k)];
                    }
                    for k in l..cols {
                        u[(j, k)] += s * e[k];
                    }
                }
                for k in l..cols {
                    u[(i, k)] *= scale;
                }
            }
        }
        anorm = anorm.max(sigma[i].abs() + e[i].abs());
    }
    Ok(anorm)
}

/// Build `V` from the row reflections stored in `u`
fn accumulate_right(u: &DMatrix<f64>, e: &DVector<f64>, v: &mut DMatrix<f64>) {
    let cols = u.ncols();
    let mut l = cols;
    let mut g = 0.0;
    for i in (0..cols).rev() {
        if i + 1 < cols {
            if g != 0.0 {
                // Double division avoids underflow
                for j in l..cols {
                    v[(j, i)] = (u[(i, j)] / u[(i, l)]) / g;
                }
                for j in l..cols {
                    let mut s = 0.0;
                    for k in l..cols {
                        s += u[(i, k)] * v[(k, j)];
                    }
                    for k in l..cols {
                        let vki = v[(k, i)];
                        v[(k, j)] += s * vki;
                    }
                }
            }
            for j in l..cols {
                v[(i, j)] = 0.0;
                v[(j, i)] = 0.0;
            }
        }
        v[(i, i)] = 1.0;
        g = e[i];
        l = i;
    }
}

/// Turn the column reflections stored in `u` into the left factor
fn accumulate_left(u: &mut DMatrix<f64>, sigma: &DVector<f64>) {
    let (rows, cols) = u.shape();
    for i in (0..rows.min(cols)).rev() {
        let l = i + 1;
        for j in l..cols {
            u[(i, j)] = 0.0;
        }
        let g = sigma[i];
        if g != 0.0 {
            let g = 1.0 / g;
            for j in l..cols {
                let mut s = 0.0;
                for k in l..rows {
                    s += u[(k, i)] * u[(k, j)];
                }
                let f = (s / u[(i, i)]) * g;
                for k in i..rows {
                    let uki = u[(k, i)];
                    u[(k, j)] += f * uki;
                }
            }
            for j in i..rows {
                u[(j, i)] *= g;
            }
        } else {
            for j in i..rows {
                u[(j, i)] = 0.0;
            }
        }
        u[(i, i)] += 1.0;
    }
}

/// Chase the superdiagonal to zero with shifted QR steps
fn diagonalize(
    u: &mut DMatrix<f64>,
    sigma: &mut DVector<f64>,
    v: &mut DMatrix<f64>,
    e: &mut DVector<f64>,
    anorm: f64,
    max_iterations: usize,
) -> Result<(), SvdError> {
    let (rows, cols) = u.shape();

    for k in (0..cols).rev() {
        let mut converged = false;
        for _ in 0..max_iterations {
            // Find the start `l` of the unreduced block ending at `k`
            let mut cancel = true;
            let mut l = k;
            loop {
                if l == 0 || e[l].abs() + anorm == anorm {
                    cancel = false;
                    break;
                }
                if sigma[l - 1].abs() + anorm == anorm {
                    break;
                }
                l -= 1;
            }

            if cancel {
                // sigma[l - 1] is negligible: rotate e[l] away
                let nm = l - 1;
                let mut c = 0.0;
                let mut s = 1.0;
                for i in l..=k {
                    let f = s * e[i];
                    e[i] *= c;
                    if f.abs() + anorm == anorm {
                        break;
                    }
                    let g = sigma[i];
                    let h = f.hypot(g);
                    sigma[i] = h;
                    let h = 1.0 / h;
                    c = g * h;
                    s = -f * h;
                    for j in 0..rows {
                        let y = u[(j, nm)];
                        let z = u[(j, i)];
                        u[(j, nm)] = y * c + z * s;
                        u[(j, i)] = z * c - y * s;
                    }
                }
            }

            let z = sigma[k];
            if l == k {
                if z < 0.0 {
                    sigma[k] = -z;
                    for j in 0..cols {
                        v[(j, k)] = -v[(j, k)];
                    }
                }
                converged = true;
                break;
            }

            // Shift from the bottom 2x2 minor
            let nm = k - 1;
            let mut x = sigma[l];
            let mut y = sigma[nm];
            let mut g = e[nm];
            let mut h = e[k];
            let mut f = ((y - z) * (y + z) + (g - h) * (g + h)) / (2.0 * h * y);
            g = f.hypot(1.0);
            f = ((x - z) * (x + z) + h * ((y / (f + sign(g, f))) - h)) / x;

            let mut c = 1.0;
            let mut s = 1.0;
            for j in l..=nm {
                let i = j + 1;
                g = e[i];
                y = sigma[i];
                h = s * g;
                g *= c;
                let mut z = f.hypot(h);
                e[j] = z;
                c = f / z;
                s = h / z;
                f = x * c + g * s;
                g = g * c - x * s;
                h = y * s;
                y *= c;
                for jj in 0..cols {
                    let a = v[(jj, j)];
                    let b = v[(jj, i)];
                    v[(jj, j)] = a * c + b * s;
                    v[(jj, i)] = b * c - a * s;
                }
                z = f.hypot(h);
                sigma[j] = z;
                if z != 0.0 {
                    z = 1.0 / z;
                    c = f * z;
                    s = h * z;
                }
                f = c * g + s * y;
                x = c * y - s * g;
                for jj in 0..rows {
                    let a = u[(jj, j)];
                    let b = u[(jj, i)];
                    u[(jj, j)] = a * c + b * s;
                    u[(jj, i)] = b * c - a * s;
                }
            }
            e[l] = 0.0;
            e[k] = f;
            sigma[k] = x;
        }
        if !converged {
            return Err(SvdError::NoConvergence { max_iterations });
        }
    }
    Ok(())
}
