//! Dense solve on borrowed scratch.
//!
//! The Jacobian lives in the slot's solver region, so the solve works on a
//! nalgebra view of that slice (column-major) and never allocates.

use nalgebra::DMatrixViewMut;
use pte_core::Real;

/// Pivot magnitude below which the matrix is treated as singular.
const SINGULAR_PIVOT: Real = 1.0e-300;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Singular {
    pub column: usize,
}

/// Solves `a x = b` in place by Gaussian elimination with partial pivoting.
///
/// `a` is overwritten with its row-echelon form; `b` holds `x` on success.
pub fn solve_in_place(mut a: DMatrixViewMut<'_, Real>, b: &mut [Real]) -> Result<(), Singular> {
    let n = b.len();
    debug_assert_eq!(a.nrows(), n);
    debug_assert_eq!(a.ncols(), n);

    for k in 0..n {
        let mut piv = k;
        let mut best = a[(k, k)].abs();
        for i in (k + 1)..n {
            let v = a[(i, k)].abs();
            if v > best {
                best = v;
                piv = i;
            }
        }
        if !(best > SINGULAR_PIVOT) {
            return Err(Singular { column: k });
        }
        if piv != k {
            a.swap_rows(piv, k);
            b.swap(piv, k);
        }
        let inv = 1.0 / a[(k, k)];
        for i in (k + 1)..n {
            let f = a[(i, k)] * inv;
            if f == 0.0 {
                continue;
            }
            a[(i, k)] = 0.0;
            for j in (k + 1)..n {
                a[(i, j)] -= f * a[(k, j)];
            }
            b[i] -= f * b[k];
        }
    }

    for k in (0..n).rev() {
        let mut s = b[k];
        for j in (k + 1)..n {
            s -= a[(k, j)] * b[j];
        }
        b[k] = s / a[(k, k)];
    }
    Ok(())
}
