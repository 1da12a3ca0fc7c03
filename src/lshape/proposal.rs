// L-shape boundary extraction: sweeps a cluster by polar angle and keeps
// the nearest-to-sensor points per angular bucket, producing the ordered
// boundary set the incremental fit consumes.

use crate::types::Point3;

/// A boundary-sweep point, LiDAR-plane coordinates plus its polar angle and
/// range (angle/range are retained only for the bucketing scan).
#[derive(Clone, Copy, Debug)]
pub struct BoundaryPoint {
    pub x: f64,
    pub y: f64,
}

struct PolarPoint {
    x: f64,
    y: f64,
    theta: f64,
    r: f64,
}

/// Builds the proposed boundary set from cluster `points`, requiring
/// `|C| > s_group_threshold` and returning an empty vec otherwise (the
/// caller gates on `|S| > s_group_threshold` too before fitting).
pub fn propose_boundary(points: &[Point3], angle_reso: f64, point_num: usize, s_group_threshold: usize) -> Vec<BoundaryPoint> {
    if points.len() <= s_group_threshold {
        return Vec::new();
    }

    let mut polar: Vec<PolarPoint> = points
        .iter()
        .map(|p| {
            let theta = p.y.atan2(p.x).to_degrees();
            let r = (p.x * p.x + p.y * p.y).sqrt();
            PolarPoint {
                x: p.x,
                y: p.y,
                theta,
                r,
            }
        })
        .collect();
    polar.sort_by(|a, b| a.theta.partial_cmp(&b.theta).unwrap());

    let mut boundary = Vec::new();
    let mut bucket: Vec<&PolarPoint> = Vec::new();
    let mut running_sum = 0.0;

    let flush = |bucket: &mut Vec<&PolarPoint>, boundary: &mut Vec<BoundaryPoint>| {
        if bucket.is_empty() {
            return;
        }
        bucket.sort_by(|a, b| a.r.partial_cmp(&b.r).unwrap());
        for p in bucket.iter().take(point_num) {
            boundary.push(BoundaryPoint { x: p.x, y: p.y });
        }
        bucket.clear();
    };

    for p in &polar {
        if bucket.is_empty() {
            bucket.push(p);
            running_sum = p.theta;
            continue;
        }
        let running_mean = running_sum / bucket.len() as f64;
        if (p.theta - running_mean).abs() <= angle_reso {
            bucket.push(p);
            running_sum += p.theta;
        } else {
            flush(&mut bucket, &mut boundary);
            bucket.push(p);
            running_sum = p.theta;
        }
    }
    flush(&mut bucket, &mut boundary);

    boundary
}
