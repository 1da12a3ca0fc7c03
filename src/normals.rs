// Per-point normal estimation: a local PCA over each point's k-NN
// neighborhood, picking the best-conditioned 2x2 minor of the covariance
// matrix to solve for the plane's slope. This mirrors the corpus's own
// `plane_from_points` helper, adapted from a single best-fit plane over a
// point set to a per-point neighborhood query backed by a fixed-radius index.

use crate::structures::{DistanceMetric, FixedRadiusSearch3D};
use crate::types::Point3;
use nalgebra::Vector3;

/// Fits a plane through `points` and returns its (not necessarily unit)
/// normal direction, via the best-conditioned 2x2 minor of the 3x3
/// covariance matrix.
fn plane_from_points(points: &[Point3]) -> Vector3<f64> {
    let n = points.len() as f64;
    let (mut sx, mut sy, mut sz) = (0.0, 0.0, 0.0);
    for p in points {
        sx += p.x;
        sy += p.y;
        sz += p.z;
    }
    let (cx, cy, cz) = (sx / n, sy / n, sz / n);

    let (mut xx, mut xy, mut xz, mut yy, mut yz, mut zz) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    for p in points {
        let (dx, dy, dz) = (p.x - cx, p.y - cy, p.z - cz);
        xx += dx * dx;
        xy += dx * dy;
        xz += dx * dz;
        yy += dy * dy;
        yz += dy * dz;
        zz += dz * dz;
    }

    let det_x = yy * zz - yz * yz;
    let det_y = xx * zz - xz * xz;
    let det_z = xx * yy - xy * xy;

    let det_max = det_x.abs().max(det_y.abs()).max(det_z.abs());
    if det_max <= 0.0 {
        return Vector3::new(0.0, 0.0, 1.0);
    }

    if det_max == det_x.abs() {
        let a = (xz * yz - xy * zz) / det_x;
        let b = (xy * yz - xz * yy) / det_x;
        Vector3::new(1.0, a, b)
    } else if det_max == det_y.abs() {
        let a = (yz * xz - xy * zz) / det_y;
        let b = (xy * xz - yz * xx) / det_y;
        Vector3::new(a, 1.0, b)
    } else {
        let a = (yz * xy - xz * yy) / det_z;
        let b = (xz * xy - yz * xx) / det_z;
        Vector3::new(a, b, 1.0)
    }
}

/// Estimates a (non-unit) normal at every point of `frustum`, using a
/// fixed-radius neighborhood of `radius` meters built over the frustum
/// itself (not the whole cloud).
pub fn estimate_normals(frustum: &[Point3], radius: f64) -> Vec<Vector3<f64>> {
    let mut index = FixedRadiusSearch3D::new(radius, DistanceMetric::Euclidean);
    for (i, p) in frustum.iter().enumerate() {
        index.insert(p.x, p.y, p.z, i);
    }

    frustum
        .iter()
        .map(|p| {
            let neighbors = index.search(p.x, p.y, p.z);
            if neighbors.len() < 3 {
                return Vector3::new(0.0, 0.0, 1.0);
            }
            let pts: Vec<Point3> = neighbors.iter().map(|&(i, _)| frustum[i]).collect();
            let n = plane_from_points(&pts);
            let norm = n.norm();
            if norm > 0.0 {
                n / norm
            } else {
                Vector3::new(0.0, 0.0, 1.0)
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_plane_from_points_flat_horizontal_slab() {
        let points = vec![
            Point3::new(0.0, 0.0, 5.0, 1.0),
            Point3::new(1.0, 0.0, 5.0, 1.0),
            Point3::new(0.0, 1.0, 5.0, 1.0),
            Point3::new(1.0, 1.0, 5.0, 1.0),
        ];
        let n = plane_from_points(&points);
        let norm = n.norm();
        let unit = n / norm;
        // the slab lies in the z=5 plane, so the fitted normal should be
        // nearly aligned with the z axis.
        assert!(unit.z.abs() > 0.9);
    }

    #[test]
    fn test_estimate_normals_returns_one_per_point() {
        let points = vec![
            Point3::new(0.0, 0.0, 5.0, 1.0),
            Point3::new(1.0, 0.0, 5.0, 1.0),
            Point3::new(0.0, 1.0, 5.0, 1.0),
            Point3::new(1.0, 1.0, 5.0, 1.0),
        ];
        let normals = estimate_normals(&points, 4.0);
        assert_eq!(normals.len(), points.len());
    }
}
