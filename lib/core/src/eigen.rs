//! Eigenvalues of symmetric 3x3 matrices
//!
//! Cyclic Jacobi rotation. The sweep order is fixed, so identical input
//! always yields bit-identical output.

use nalgebra::Matrix3;

const MAX_SWEEPS: usize = 50;
const OFF_DIAGONAL_TOLERANCE: f64 = 1e-30;

/// Eigenvalues of a symmetric matrix, sorted descending.
///
/// Only the upper triangle is trusted; the input is symmetrized first.
pub fn symmetric_eigenvalues(m: &Matrix3<f64>) -> [f64; 3] {
    let mut a = (m + m.transpose()) * 0.5;
    let scale = a.norm_squared().max(f64::MIN_POSITIVE);

    for _ in 0..MAX_SWEEPS {
        let off = a[(0, 1)].powi(2) + a[(0, 2)].powi(2) + a[(1, 2)].powi(2);
        if off <= OFF_DIAGONAL_TOLERANCE * scale {
            break;
        }
        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            rotate(&mut a, p, q);
        }
    }

    let mut values = [a[(0, 0)], a[(1, 1)], a[(2, 2)]];
    values.sort_by(|x, y| y.total_cmp(x));
    values
}

/// One Jacobi rotation zeroing `a[(p, q)]`.
fn rotate(a: &mut Matrix3<f64>, p: usize, q: usize) {
    let apq = a[(p, q)];
    if apq == 0.0 {
        return;
    }
    let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * apq);
    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
    let c = 1.0 / (t * t + 1.0).sqrt();
    let s = t * c;

    a[(p, p)] -= t * apq;
    a[(q, q)] += t * apq;
    a[(p, q)] = 0.0;
    a[(q, p)] = 0.0;

    let r = 3 - p - q;
    let arp = a[(r, p)];
    let arq = a[(r, q)];
    a[(r, p)] = c * arp - s * arq;
    a[(p, r)] = a[(r, p)];
    a[(r, q)] = s * arp + c * arq;
    a[(q, r)] = a[(r, q)];
}
