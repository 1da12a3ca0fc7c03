// Frustum clipping: projects the cloud through the frame's calibration and
// keeps the points that fall inside a detection's 2-D box, optionally
// respecting prior occluders' claims.

use crate::calibration::Calibration;
use crate::types::{Box2D, Point3};

/// An occluder's overlap region together with the point indices it already
/// claimed, used by `overlap_aware_clip` to exclude points a higher-priority
/// occluder has already taken.
pub struct OverlapClaim<'a> {
    pub region: Box2D,
    /// Sorted ascending, matching the invariant on emitted cluster indices.
    pub claimed_indices: &'a [usize],
}

/// The frustum for a single detection: point indices and their positions,
/// in input order.
#[derive(Clone, Debug, Default)]
pub struct Frustum {
    pub indices: Vec<usize>,
    pub points: Vec<Point3>,
}

impl Frustum {
    pub fn mean_x(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.iter().map(|p| p.x).sum::<f64>() / self.points.len() as f64
    }
}

fn claimed(claim: &OverlapClaim, index: usize) -> bool {
    claim.claimed_indices.binary_search(&index).is_ok()
}

/// Simple clip, used for obstacles and for vehicles with no overlap
/// arbitration: keep every point with `x > min_x` whose projection lands
/// inside `target`.
pub fn simple_clip(cloud: &[Point3], calibration: &Calibration, target: &Box2D, min_x: f64) -> Frustum {
    let mut frustum = Frustum::default();
    for (index, point) in cloud.iter().enumerate() {
        if point.x <= min_x {
            continue;
        }
        let (u, v) = calibration.project(point.x, point.y, point.z);
        if target.contains(u, v) {
            frustum.indices.push(index);
            frustum.points.push(*point);
        }
    }
    frustum
}

/// Overlap-aware clip, used for vehicles: keeps points in `target` that no
/// already-processed occluder both overlaps-contains and has already
/// claimed.
pub fn overlap_aware_clip(
    cloud: &[Point3],
    calibration: &Calibration,
    target: &Box2D,
    overlaps: &[OverlapClaim],
    min_x: f64,
) -> Frustum {
    let mut frustum = Frustum::default();
    for (index, point) in cloud.iter().enumerate() {
        if point.x <= min_x {
            continue;
        }
        let (u, v) = calibration.project(point.x, point.y, point.z);
        if !target.contains(u, v) {
            continue;
        }
        let excluded = overlaps
            .iter()
            .any(|claim| claim.region.contains(u, v) && claimed(claim, index));
        if !excluded {
            frustum.indices.push(index);
            frustum.points.push(*point);
        }
    }
    frustum
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::{Matrix3, Matrix3x4, Vector3};

    fn identity_calibration() -> Calibration {
        let p = Matrix3x4::new(
            500.0, 0.0, 320.0, 0.0, 0.0, 500.0, 240.0, 0.0, 0.0, 0.0, 1.0, 0.0,
        );
        Calibration::new(p, Matrix3::identity(), Vector3::zeros()).unwrap()
    }

    #[test]
    fn test_simple_clip_keeps_points_inside_box() {
        let calibration = identity_calibration();
        let cloud = vec![
            Point3::new(10.0, 0.0, 0.0, 1.0),
            Point3::new(10.0, 100.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 0.0, 1.0),
        ];
        let target = Box2D::new(0.0, 0.0, 640.0, 480.0);
        let frustum = simple_clip(&cloud, &calibration, &target, 3.0);
        assert_eq!(frustum.indices, vec![0]);
    }

    #[test]
    fn test_overlap_aware_clip_excludes_claimed_points() {
        let calibration = identity_calibration();
        let cloud = vec![
            Point3::new(10.0, 0.0, 0.0, 1.0),
            Point3::new(10.0, 0.1, 0.0, 1.0),
        ];
        let target = Box2D::new(0.0, 0.0, 640.0, 480.0);
        let region = Box2D::new(0.0, 0.0, 640.0, 480.0);
        let claimed_indices = vec![0usize];
        let claims = vec![OverlapClaim {
            region,
            claimed_indices: &claimed_indices,
        }];
        let frustum = overlap_aware_clip(&cloud, &calibration, &target, &claims, 5.0);
        assert_eq!(frustum.indices, vec![1]);
    }
}
