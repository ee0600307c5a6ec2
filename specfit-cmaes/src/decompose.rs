//! Symmetric eigen-decomposition used to keep the covariance matrix's
//! eigensystem available for sampling and step-size adaptation.
//!
//! The contract mirrors a LAPACK `dsyevr`-style call: for a symmetric
//! `n x n` matrix `a`, produce an orthonormal `b` and ascending eigenvalues
//! `w` such that `a = b * diag(w) * b^T`. A pure-Rust cyclic Jacobi
//! eigenvalue algorithm satisfies this without a BLAS/LAPACK dependency.

use ndarray::{Array1, Array2};
use thiserror::Error;

/// Failure modes for the eigen-decomposition step.
#[derive(Debug, Error)]
pub enum DecomposeError {
    /// The Jacobi sweep did not converge within the iteration budget.
    #[error("eigen-decomposition did not converge within {0} sweeps")]
    DecompositionFailed(usize),
    /// The input matrix was not square.
    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
}

const MAX_SWEEPS: usize = 100;
const CONVERGENCE_EPS: f64 = 1e-14;

/// Decompose a symmetric matrix into eigenvectors (columns of `b`) and
/// ascending eigenvalues `w`, via the cyclic Jacobi eigenvalue algorithm.
pub fn decompose(a: &Array2<f64>) -> Result<(Array2<f64>, Array1<f64>), DecomposeError> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(DecomposeError::NotSquare { rows: a.nrows(), cols: a.ncols() });
    }
    if n == 0 {
        return Ok((Array2::zeros((0, 0)), Array1::zeros(0)));
    }

    let mut m = a.clone();
    let mut v = Array2::eye(n);

    let mut converged = false;
    for _sweep in 0..MAX_SWEEPS {
        let off_diagonal_norm: f64 = (0..n)
            .flat_map(|p| (p + 1..n).map(move |q| (p, q)))
            .map(|(p, q)| m[[p, q]] * m[[p, q]])
            .sum::<f64>()
            .sqrt();
        if off_diagonal_norm < CONVERGENCE_EPS {
            converged = true;
            break;
        }

        for p in 0..n {
            for q in p + 1..n {
                if m[[p, q]].abs() < f64::EPSILON {
                    continue;
                }
                let theta = (m[[q, q]] - m[[p, p]]) / (2.0 * m[[p, q]]);
                let t = theta.signum() / (theta.abs() + (1.0 + theta * theta).sqrt());
                let t = if theta == 0.0 { 1.0 } else { t };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;

                rotate(&mut m, p, q, c, s);
                rotate_columns(&mut v, p, q, c, s);
            }
        }
    }
    if !converged {
        return Err(DecomposeError::DecompositionFailed(MAX_SWEEPS));
    }

    let mut eigenvalues: Vec<f64> = (0..n).map(|i| m[[i, i]]).collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| eigenvalues[i].partial_cmp(&eigenvalues[j]).unwrap());

    let mut w = Array1::zeros(n);
    let mut b = Array2::zeros((n, n));
    for (rank, &i) in order.iter().enumerate() {
        w[rank] = eigenvalues[i];
        for r in 0..n {
            b[[r, rank]] = v[[r, i]];
        }
    }
    eigenvalues.clear();

    Ok((b, w))
}

fn rotate(m: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    let n = m.nrows();
    let mpp = m[[p, p]];
    let mqq = m[[q, q]];
    let mpq = m[[p, q]];

    m[[p, p]] = c * c * mpp - 2.0 * s * c * mpq + s * s * mqq;
    m[[q, q]] = s * s * mpp + 2.0 * s * c * mpq + c * c * mqq;
    m[[p, q]] = 0.0;
    m[[q, p]] = 0.0;

    for i in 0..n {
        if i == p || i == q {
            continue;
        }
        let mip = m[[i, p]];
        let miq = m[[i, q]];
        let new_ip = c * mip - s * miq;
        let new_iq = s * mip + c * miq;
        m[[i, p]] = new_ip;
        m[[p, i]] = new_ip;
        m[[i, q]] = new_iq;
        m[[q, i]] = new_iq;
    }
}

fn rotate_columns(v: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    let n = v.nrows();
    for i in 0..n {
        let vip = v[[i, p]];
        let viq = v[[i, q]];
        v[[i, p]] = c * vip - s * viq;
        v[[i, q]] = s * vip + c * viq;
    }
}

/// Clip the condition number to `kappa_max` by adding a uniform shift `t` to
/// every eigenvalue, rather than floor-clamping the small ones individually.
/// The same shift must be added to the covariance matrix's diagonal to keep
/// `c == b * diag(w) * b^T` exact; returns `t` (zero if no shift was needed)
/// so the caller can apply it there.
pub fn clip_condition_number(w: &mut Array1<f64>, kappa_max: f64) -> f64 {
    let n = w.len();
    if n == 0 {
        return 0.0;
    }
    let t = w[n - 1] / kappa_max - w[0];
    if t > 0.0 {
        for wi in w.iter_mut() {
            *wi += t;
        }
    }
    t.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposes_diagonal_matrix() {
        let a = Array2::from_shape_vec((3, 3), vec![3.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0])
            .unwrap();
        let (b, w) = decompose(&a).unwrap();
        assert!((w[0] - 1.0).abs() < 1e-9);
        assert!((w[1] - 2.0).abs() < 1e-9);
        assert!((w[2] - 3.0).abs() < 1e-9);

        let reconstructed = b.dot(&Array2::from_diag(&w)).dot(&b.t());
        for i in 0..3 {
            for j in 0..3 {
                assert!((reconstructed[[i, j]] - a[[i, j]]).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn orthonormal_eigenvectors() {
        let a = Array2::from_shape_vec((3, 3), vec![2.0, 1.0, 0.0, 1.0, 2.0, 1.0, 0.0, 1.0, 2.0])
            .unwrap();
        let (b, _w) = decompose(&a).unwrap();
        let identity = b.t().dot(&b);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((identity[[i, j]] - expected).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn ascending_eigenvalue_order() {
        let a = Array2::from_shape_vec((2, 2), vec![5.0, 4.0, 4.0, 5.0]).unwrap();
        let (_b, w) = decompose(&a).unwrap();
        assert!(w[0] <= w[1]);
        assert!((w[0] - 1.0).abs() < 1e-9);
        assert!((w[1] - 9.0).abs() < 1e-9);
    }

    #[test]
    fn clips_condition_number() {
        let mut w = Array1::from_vec(vec![1e-20, 1.0, 2.0]);
        clip_condition_number(&mut w, 1e14);
        assert!(w[1] / w[0] <= 1e14 * 1.0001);
    }

    #[test]
    fn matches_the_reference_eigenvalues() {
        let a = Array2::from_shape_vec((3, 3), vec![1.0, 2.0, 3.0, 2.0, 4.0, 5.0, 3.0, 5.0, 6.0]).unwrap();
        let (b, w) = decompose(&a).unwrap();

        let expected = [-0.515729, 0.170915, 11.34480];
        for i in 0..3 {
            assert!((w[i] - expected[i]).abs() < 1e-5, "w[{i}]={}, expected {}", w[i], expected[i]);
        }

        let reconstructed = b.dot(&Array2::from_diag(&w)).dot(&b.t());
        for i in 0..3 {
            for j in 0..3 {
                assert!((reconstructed[[i, j]] - a[[i, j]]).abs() < 1e-9);
            }
        }
    }
}
