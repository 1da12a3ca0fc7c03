// Incremental L-shape fit: a rank-1 running update of a 4x4 scatter matrix
// over the boundary set, selecting the split point that minimizes the
// smaller eigenvalue of a Schur complement.

use super::proposal::BoundaryPoint;
use nalgebra::{Matrix2, Matrix4};

/// The fitted L: two perpendicular lines through a joint normal `(n1, n2)`
/// and per-line constants `(c1, c2)`, plus the boundary split index.
///
/// `line_1: n1*x + n2*y + c1 = 0`, `line_2: -n2*x + n1*y + c2 = 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LShape {
    pub c1: f64,
    pub c2: f64,
    pub n1: f64,
    pub n2: f64,
    pub split: usize,
}

fn delta_m(x: f64, y: f64) -> Matrix4<f64> {
    Matrix4::new(
        1.0, 0.0, x, y,
        0.0, -1.0, -y, x,
        x, -y, x * x - y * y, 2.0 * x * y,
        y, x, 2.0 * x * y, y * y - x * x,
    )
}

/// `u = (c1, c2, n1, n2, k*)` plus the fit error (the minimized eigenvalue).
/// A non-positive error means no valid fit was found.
pub fn fit(boundary: &[BoundaryPoint], s_group_refined_threshold: usize) -> (LShape, f64) {
    let n = boundary.len();
    if n <= s_group_refined_threshold {
        return (
            LShape {
                c1: 0.0,
                c2: 0.0,
                n1: 0.0,
                n2: 0.0,
                split: 0,
            },
            0.0,
        );
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;
    let mut sum_xy = 0.0;
    for p in boundary {
        sum_x += p.x;
        sum_y += p.y;
        sum_x2 += p.x * p.x;
        sum_y2 += p.y * p.y;
        sum_xy += p.x * p.y;
    }

    // Initial state: every point assigned to line-2. Row/col 0 (c1) starts
    // at zero since no point has moved to line-1 yet.
    let mut m = Matrix4::zeros();
    m[(1, 1)] = n as f64;
    m[(1, 2)] = sum_y;
    m[(1, 3)] = -sum_x;
    m[(2, 2)] = sum_y2;
    m[(2, 3)] = -sum_xy;
    m[(3, 3)] = sum_x2;
    m[(2, 1)] = m[(1, 2)];
    m[(3, 1)] = m[(1, 3)];
    m[(3, 2)] = m[(2, 3)];

    let mut best_lambda = f64::INFINITY;
    let mut best: Option<LShape> = None;

    for i in 0..(n - 1) {
        m += delta_m(boundary[i].x, boundary[i].y);
        let split = i + 1;

        let m11 = Matrix2::new(m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)]);
        let m12 = Matrix2::new(m[(0, 2)], m[(0, 3)], m[(1, 2)], m[(1, 3)]);
        let m22 = Matrix2::new(m[(2, 2)], m[(2, 3)], m[(3, 2)], m[(3, 3)]);

        let det11 = m11.determinant();
        if det11.abs() < 1e-9 {
            continue;
        }
        let m11_inv = match m11.try_inverse() {
            Some(inv) => inv,
            None => continue,
        };

        let schur = m22 - m12.transpose() * m11_inv * m12;
        let (lambda, eigenvector) = match smallest_eigenpair(&schur) {
            Some(pair) => pair,
            None => continue,
        };

        if lambda < best_lambda {
            best_lambda = lambda;
            let c = -(m11_inv * m12 * eigenvector);
            best = Some(LShape {
                c1: c[0],
                c2: c[1],
                n1: eigenvector[0],
                n2: eigenvector[1],
                split,
            });
        }
    }

    match best {
        Some(shape) => (shape, best_lambda),
        None => (
            LShape {
                c1: 0.0,
                c2: 0.0,
                n1: 0.0,
                n2: 0.0,
                split: 0,
            },
            0.0,
        ),
    }
}

/// Closed-form eigendecomposition of a symmetric 2x2 matrix, returning the
/// smaller eigenvalue and its (unit) eigenvector.
fn smallest_eigenpair(m: &Matrix2<f64>) -> Option<(f64, nalgebra::Vector2<f64>)> {
    let a = m[(0, 0)];
    let b = m[(0, 1)];
    let d = m[(1, 1)];
    let trace = a + d;
    let det = a * d - b * b;
    let disc = (trace * trace / 4.0 - det).max(0.0).sqrt();
    let lambda_small = trace / 2.0 - disc;

    let eigenvector = if b.abs() > 1e-12 {
        nalgebra::Vector2::new(lambda_small - d, b)
    } else if (a - lambda_small).abs() < 1e-12 {
        nalgebra::Vector2::new(1.0, 0.0)
    } else {
        nalgebra::Vector2::new(0.0, 1.0)
    };
    let norm = eigenvector.norm();
    if norm <= 0.0 {
        return None;
    }
    Some((lambda_small, eigenvector / norm))
}
