// Oriented box reconstruction: corner intersection from the fitted L,
// extents from the 2-D box edges back-projected into LiDAR rays, and
// height from the raw cluster.

use crate::calibration::{BackProjectedLine, Calibration};
use crate::config::FusionConfig;
use crate::lshape::{BoundaryPoint, LShape};
use crate::types::{Box2D, Box3D, Point3};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Point2 {
    x: f64,
    y: f64,
}

/// Solves the two-line intersection for the fitted L's corner.
fn solve_corner(shape: &LShape, min_slope: f64) -> Option<Point2> {
    let n1 = shape.n1;
    let n2 = shape.n2;
    let c1 = shape.c1;
    let c2 = shape.c2;

    if n2.abs() > 0.0 && (n1 / n2).abs() < min_slope {
        return Some(Point2 {
            x: c2 / n2,
            y: -c1 / n2,
        });
    }
    if n1.abs() > 0.0 && (n2 / n1).abs() < min_slope {
        return Some(Point2 {
            x: -c1 / n1,
            y: -c2 / n1,
        });
    }
    if n1 == 0.0 && n2 == 0.0 {
        return None;
    }
    let denom = n1 * n1 + n2 * n2;
    if denom <= 0.0 {
        return None;
    }
    let x = (n2 * c2 - n1 * c1) / denom;
    let y = -(n1 / n2) * x - c1 / n2;
    Some(Point2 { x, y })
}

/// Intersects `line` (the fitted line-1: n1*x + n2*y + c1 = 0) with a
/// back-projected ray `y = k*x + b`.
fn intersect_line1(n1: f64, n2: f64, c1: f64, ray: &BackProjectedLine) -> Option<Point2> {
    if ray.vertical {
        return None;
    }
    let denom = n1 + n2 * ray.slope;
    if denom.abs() < 1e-12 {
        return None;
    }
    let x = -(c1 + n2 * ray.intercept) / denom;
    let y = ray.slope * x + ray.intercept;
    Some(Point2 { x, y })
}

/// Intersects `line` (the fitted line-2: -n2*x + n1*y + c2 = 0) with a
/// back-projected ray `y = k*x + b`.
fn intersect_line2(n1: f64, n2: f64, c2: f64, ray: &BackProjectedLine) -> Option<Point2> {
    if ray.vertical {
        return None;
    }
    let denom = n1 * ray.slope - n2;
    if denom.abs() < 1e-12 {
        return None;
    }
    let x = -(c2 + n1 * ray.intercept) / denom;
    let y = ray.slope * x + ray.intercept;
    Some(Point2 { x, y })
}

/// Folds a raw `atan2` angle into `(-pi/2, pi/2]`, since a fitted line has
/// no inherent direction (heading and heading + pi describe the same L).
fn normalize_heading(angle: f64) -> f64 {
    let mut h = angle;
    let half_pi = std::f64::consts::FRAC_PI_2;
    while h <= -half_pi {
        h += std::f64::consts::PI;
    }
    while h > half_pi {
        h -= std::f64::consts::PI;
    }
    h
}

fn distance(a: Point2, b: Point2) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Unit direction vector, or the zero vector if `(dx, dy)` is degenerate.
fn unit(dx: f64, dy: f64) -> Point2 {
    let norm = (dx * dx + dy * dy).sqrt();
    if norm > 1e-12 {
        Point2 { x: dx / norm, y: dy / norm }
    } else {
        Point2 { x: 0.0, y: 0.0 }
    }
}

/// Projects `points` onto the ray `corner + t * dir` and returns the
/// farthest point reached (by `|t|`) along with its signed offset.
fn farthest_along(points: &[Point2], corner: Point2, dir: Point2) -> Option<(f64, Point2)> {
    points
        .iter()
        .map(|p| (p.x - corner.x) * dir.x + (p.y - corner.y) * dir.y)
        .max_by(|a, b| a.abs().partial_cmp(&b.abs()).unwrap())
        .map(|t| {
            (
                t.abs(),
                Point2 {
                    x: corner.x + t * dir.x,
                    y: corner.y + t * dir.y,
                },
            )
        })
}

/// Fallback when the back-projected edges are parallel to the fitted lines:
/// project the boundary's line-1/line-2 halves (split at the fit's `split`
/// index) onto their respective fitted-line directions and take the corner
/// farthest along each, instead of an axis-aligned offset.
fn extents_from_boundary(
    boundary: &[BoundaryPoint],
    corner: Point2,
    split: usize,
    dir1: Point2,
    dir2: Point2,
) -> Option<((f64, Point2), (f64, Point2))> {
    let split = split.min(boundary.len());
    let line1: Vec<Point2> = boundary[..split].iter().map(|p| Point2 { x: p.x, y: p.y }).collect();
    let line2: Vec<Point2> = boundary[split..].iter().map(|p| Point2 { x: p.x, y: p.y }).collect();

    let far1 = farthest_along(&line1, corner, dir1)?;
    let far2 = farthest_along(&line2, corner, dir2)?;
    Some((far1, far2))
}

/// Reconstructs an oriented 3-D box from a fitted L-shape, the originating
/// 2-D box, the frame calibration, and the cluster's raw points. Returns
/// `None` when the corner or the extents are degenerate.
pub fn reconstruct(
    shape: &LShape,
    boundary: &[BoundaryPoint],
    box_2d: &Box2D,
    calibration: &Calibration,
    cluster: &[Point3],
    config: &FusionConfig,
) -> Option<Box3D> {
    let corner = solve_corner(shape, config.min_slope)?;

    let ray_min = calibration.back_project(box_2d.xmin, box_2d.ymin);
    let ray_max = calibration.back_project(box_2d.xmax, box_2d.ymax);

    let point_1 = intersect_line1(shape.n1, shape.n2, shape.c1, &ray_min);
    let point_3 = intersect_line2(shape.n1, shape.n2, shape.c2, &ray_max);

    let (point_1, point_3, length, width) = match (point_1, point_3) {
        (Some(p1), Some(p3)) => {
            let length = distance(p1, corner);
            let width = distance(p3, corner);
            (p1, p3, length, width)
        }
        _ => {
            log::warn!("back-projected box edges are parallel to the fitted L; falling back to boundary projection");
            let dir1 = unit(-shape.n2, shape.n1);
            let dir2 = unit(shape.n1, shape.n2);
            let ((length, p1), (width, p3)) = extents_from_boundary(boundary, corner, shape.split, dir1, dir2)?;
            (p1, p3, length, width)
        }
    };

    if length <= 0.0 || width <= 0.0 {
        return None;
    }

    let point_2 = Point2 {
        x: point_3.x + (point_1.x - corner.x),
        y: point_3.y + (point_1.y - corner.y),
    };

    let mut z_min = f64::INFINITY;
    let mut z_max = f64::NEG_INFINITY;
    for p in cluster {
        if p.z < z_min {
            z_min = p.z;
        }
        if p.z < config.height_clip_z && p.z > z_max {
            z_max = p.z;
        }
    }
    if !z_min.is_finite() || !z_max.is_finite() || z_max <= z_min {
        return None;
    }
    let height = z_max - z_min;

    let dx = corner.x - point_1.x;
    let dy = corner.y - point_1.y;
    if dx.abs() < 1e-12 && dy.abs() < 1e-12 {
        log::warn!("degenerate heading during box reconstruction");
        return None;
    }
    let heading = normalize_heading(dy.atan2(dx));

    Some(Box3D {
        x: (corner.x + point_2.x) / 2.0,
        y: (corner.y + point_2.y) / 2.0,
        z: z_min + height / 2.0,
        length,
        width,
        height,
        heading,
        corner_x: corner.x,
        corner_y: corner.y,
    })
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
    fn test_solve_corner_axis_aligned() {
        // line-1: x = 10 (n1=1, n2=0, c1=-10); line-2: y = 2 (-n2*x+n1*y+c2=0 => y=2 => c2=-2, n1=1,n2=0)
        let shape = LShape {
            c1: -10.0,
            c2: -2.0,
            n1: 1.0,
            n2: 0.0,
            split: 5,
        };
        let corner = solve_corner(&shape, 1e-7).unwrap();
        assert!((corner.x - 10.0).abs() < 1e-6);
        assert!((corner.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_extents_from_boundary_follows_fitted_line_directions() {
        // A diagonal L: line-1 is x + y = 0, line-2 is x - y = 0, meeting at
        // the origin. The far corners must land back on those lines, not on
        // an axis-aligned offset from the corner.
        let n1 = std::f64::consts::FRAC_1_SQRT_2;
        let n2 = std::f64::consts::FRAC_1_SQRT_2;
        let corner = Point2 { x: 0.0, y: 0.0 };
        let dir1 = unit(-n2, n1);
        let dir2 = unit(n1, n2);

        let boundary = vec![
            BoundaryPoint { x: -2.0, y: 2.0 }, // on line-1 (x + y = 0)
            BoundaryPoint { x: 3.0, y: 3.0 },  // on line-2 (x - y = 0)
        ];

        let ((length, p1), (width, p3)) = extents_from_boundary(&boundary, corner, 1, dir1, dir2).unwrap();

        assert!((p1.x - (-2.0)).abs() < 1e-9);
        assert!((p1.y - 2.0).abs() < 1e-9);
        assert!((length - (8.0_f64).sqrt()).abs() < 1e-9);

        assert!((p3.x - 3.0).abs() < 1e-9);
        assert!((p3.y - 3.0).abs() < 1e-9);
        assert!((width - (18.0_f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_reconstruct_produces_positive_extents_for_clean_box() {
        let calibration = identity_calibration();
        let box_2d = Box2D::new(100.0, 200.0, 540.0, 480.0);
        let shape = LShape {
            c1: -10.0,
            c2: -2.0,
            n1: 1.0,
            n2: 0.0,
            split: 5,
        };
        let boundary = vec![
            BoundaryPoint { x: 10.0, y: 2.0 },
            BoundaryPoint { x: 10.0, y: 4.0 },
            BoundaryPoint { x: 12.0, y: 2.0 },
        ];
        let cluster = vec![
            Point3::new(10.0, 2.0, -1.0, 1.0),
            Point3::new(10.0, 2.0, 0.5, 1.0),
        ];
        let config = FusionConfig::default();
        let box3d = reconstruct(&shape, &boundary, &box_2d, &calibration, &cluster, &config);
        assert!(box3d.is_some());
        let box3d = box3d.unwrap();
        assert!(box3d.height > 0.0);
    }
}
