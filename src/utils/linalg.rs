//! Dense linear algebra shared by the Newton system solver, the
//! Levenberg-Marquardt step, and the curve-fit covariance estimate.
//!
//! Both routines use partial pivoting and treat any pivot whose magnitude is
//! below [`PIVOT_TOLERANCE`] after the row swap as a singular matrix.

use crate::error::{NumOptError, Result};
use ndarray::{s, Array1, Array2};

/// Smallest pivot magnitude accepted before a matrix is declared singular.
pub const PIVOT_TOLERANCE: f64 = 1e-14;

/// Swap rows `i` and `j` of `m` in place.
fn swap_rows(m: &mut Array2<f64>, i: usize, j: usize) {
    if i == j {
        return;
    }
    for col in 0..m.ncols() {
        m.swap([i, col], [j, col]);
    }
}

/// Row index of the largest-magnitude entry in `col`, searching rows `col..`.
fn pivot_row(m: &Array2<f64>, col: usize) -> usize {
    let mut best = col;
    let mut best_val = m[[col, col]].abs();
    for row in (col + 1)..m.nrows() {
        let val = m[[row, col]].abs();
        if val > best_val {
            best_val = val;
            best = row;
        }
    }
    best
}

fn check_square(a: &Array2<f64>) -> Result<usize> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(NumOptError::DimensionMismatch(format!(
            "Expected a square matrix, got {}x{}",
            n,
            a.ncols()
        )));
    }
    Ok(n)
}

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
///
/// # Errors
///
/// * `DimensionMismatch` if `a` is not square or `b` has the wrong length
/// * `SingularMatrix` if a pivot falls below [`PIVOT_TOLERANCE`]
pub fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = check_square(a)?;
    if b.len() != n {
        return Err(NumOptError::DimensionMismatch(format!(
            "Expected right-hand side of length {}, got {}",
            n,
            b.len()
        )));
    }

    // Augmented matrix [A | b]
    let mut aug = Array2::<f64>::zeros((n, n + 1));
    aug.slice_mut(s![.., ..n]).assign(a);
    aug.column_mut(n).assign(b);

    for col in 0..n {
        let p = pivot_row(&aug, col);
        swap_rows(&mut aug, col, p);

        let pivot = aug[[col, col]];
        if pivot.abs() < PIVOT_TOLERANCE {
            return Err(NumOptError::SingularMatrix);
        }

        for row in (col + 1)..n {
            let factor = aug[[row, col]] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in col..=n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = aug[[i, n]];
        for j in (i + 1)..n {
            sum -= aug[[i, j]] * x[j];
        }
        x[i] = sum / aug[[i, i]];
    }

    Ok(x)
}

/// Invert `A` by Gauss-Jordan elimination with partial pivoting.
///
/// # Errors
///
/// * `DimensionMismatch` if `a` is not square
/// * `SingularMatrix` if a pivot falls below [`PIVOT_TOLERANCE`]
pub fn invert(a: &Array2<f64>) -> Result<Array2<f64>> {
    let n = check_square(a)?;

    // Augmented matrix [A | I]
    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    aug.slice_mut(s![.., ..n]).assign(a);
    for i in 0..n {
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let p = pivot_row(&aug, col);
        swap_rows(&mut aug, col, p);

        let pivot = aug[[col, col]];
        if pivot.abs() < PIVOT_TOLERANCE {
            return Err(NumOptError::SingularMatrix);
        }

        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for j in 0..2 * n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    Ok(aug.slice(s![.., n..]).to_owned())
}
