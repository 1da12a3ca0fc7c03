// End-to-end scenario tests building small synthetic frames and asserting
// on the resulting FrameResult, per the seed suite.

use fusion_core::config::FusionConfig;
use fusion_core::driver::FrameContext;
use fusion_core::types::{Box2D, Point3, VehicleClass};
use nalgebra::{Matrix3, Matrix3x4, Vector3};

fn pinhole_calibration() -> (Matrix3x4<f64>, Matrix3<f64>, Vector3<f64>) {
    let p = Matrix3x4::new(
        500.0, 0.0, 320.0, 0.0, 0.0, 500.0, 240.0, 0.0, 0.0, 0.0, 1.0, 0.0,
    );
    (p, Matrix3::identity(), Vector3::zeros())
}

/// Roughly a 4.2m x 1.8m car footprint with an L-shaped near edge, centered
/// near (10m, 2m) in LiDAR coordinates.
fn planar_l_car(center_x: f64, center_y: f64) -> Vec<Point3> {
    let mut points = Vec::new();
    for i in 0..100 {
        let x = center_x + (i as f64) * 0.042;
        points.push(Point3::new(x, center_y, -0.3, 45.0));
    }
    for i in 0..100 {
        let y = center_y + (i as f64) * 0.018;
        points.push(Point3::new(center_x, y, -0.3, 45.0));
    }
    points
}

#[test]
fn test_single_isolated_car_produces_one_detection_with_full_cluster() {
    let context = FrameContext::new(FusionConfig::default());
    let cloud = planar_l_car(10.0, 2.0);
    let vehicle_boxes = vec![Box2D::new(50.0, 100.0, 620.0, 460.0).with_class(VehicleClass::Car)];
    let (p, r, t) = pinhole_calibration();

    let result = context
        .process_frame(&cloud, &vehicle_boxes, &[], p, r, t)
        .expect("well-formed frame must not error");

    assert_eq!(result.vehicles.len(), 1);
    let detection = &result.vehicles[0];
    assert!(!detection.cluster_indices.is_empty());
    let mut sorted = detection.cluster_indices.clone();
    sorted.sort_unstable();
    assert_eq!(detection.cluster_indices, sorted, "cluster indices must be sorted ascending");
}

#[test]
fn test_two_disjoint_cars_have_disjoint_clusters() {
    let context = FrameContext::new(FusionConfig::default());
    let mut cloud = planar_l_car(10.0, -5.0);
    cloud.extend(planar_l_car(10.0, 5.0));

    let vehicle_boxes = vec![
        Box2D::new(50.0, 100.0, 250.0, 460.0).with_class(VehicleClass::Car),
        Box2D::new(400.0, 100.0, 600.0, 460.0).with_class(VehicleClass::Car),
    ];
    let (p, r, t) = pinhole_calibration();

    let result = context
        .process_frame(&cloud, &vehicle_boxes, &[], p, r, t)
        .expect("well-formed frame must not error");

    assert_eq!(result.vehicles.len(), 2);
    let a: std::collections::HashSet<_> = result.vehicles[0].cluster_indices.iter().collect();
    let b: std::collections::HashSet<_> = result.vehicles[1].cluster_indices.iter().collect();
    assert!(a.is_disjoint(&b), "clusters from disjoint vehicles must not share point indices");
}

#[test]
fn test_empty_vehicle_boxes_yields_empty_vehicle_output() {
    let context = FrameContext::new(FusionConfig::default());
    let cloud = planar_l_car(10.0, 2.0);
    let (p, r, t) = pinhole_calibration();

    let result = context
        .process_frame(&cloud, &[], &[], p, r, t)
        .expect("empty vehicle list must not error");

    assert!(result.vehicles.is_empty());
    assert!(result.obstacles.is_empty());
}

#[test]
fn test_vehicle_with_empty_frustum_is_not_far_and_has_no_box() {
    let context = FrameContext::new(FusionConfig::default());
    let cloud = planar_l_car(10.0, 2.0);
    // a box far away in image space that the projected car points never land in.
    let vehicle_boxes = vec![Box2D::new(1000.0, 1000.0, 1100.0, 1100.0).with_class(VehicleClass::Car)];
    let (p, r, t) = pinhole_calibration();

    let result = context
        .process_frame(&cloud, &vehicle_boxes, &[], p, r, t)
        .expect("well-formed frame must not error");

    let detection = &result.vehicles[0];
    assert!(!detection.far);
    assert!(detection.box_3d.is_none());
    assert_eq!(detection.distance_far, 0.0);
    assert!(detection.cluster_indices.is_empty());
}

#[test]
fn test_sparse_frustum_below_clustering_minimum_reports_far() {
    let context = FrameContext::new(FusionConfig::default());
    // only 3 points in the whole cloud, projecting inside the vehicle box.
    let cloud = vec![
        Point3::new(10.0, 2.0, -0.3, 45.0),
        Point3::new(10.1, 2.0, -0.3, 45.0),
        Point3::new(10.2, 2.0, -0.3, 45.0),
    ];
    let vehicle_boxes = vec![Box2D::new(50.0, 100.0, 620.0, 460.0).with_class(VehicleClass::Car)];
    let (p, r, t) = pinhole_calibration();

    let result = context
        .process_frame(&cloud, &vehicle_boxes, &[], p, r, t)
        .expect("well-formed frame must not error");

    let detection = &result.vehicles[0];
    assert!(detection.far);
    let expected_mean_x = (10.0 + 10.1 + 10.2) / 3.0;
    assert!((detection.distance_far - expected_mean_x).abs() < 1e-9);
}

#[test]
fn test_malformed_box_is_rejected_at_construction() {
    let context = FrameContext::new(FusionConfig::default());
    let cloud = planar_l_car(10.0, 2.0);
    // xmax < xmin: malformed.
    let vehicle_boxes = vec![Box2D::new(500.0, 100.0, 50.0, 460.0).with_class(VehicleClass::Car)];
    let (p, r, t) = pinhole_calibration();

    let result = context.process_frame(&cloud, &vehicle_boxes, &[], p, r, t);
    assert!(result.is_err());
}

#[test]
fn test_non_finite_point_is_rejected_at_construction() {
    let context = FrameContext::new(FusionConfig::default());
    let mut cloud = planar_l_car(10.0, 2.0);
    cloud.push(Point3::new(f64::NAN, 0.0, 0.0, 0.0));
    let vehicle_boxes = vec![Box2D::new(50.0, 100.0, 620.0, 460.0).with_class(VehicleClass::Car)];
    let (p, r, t) = pinhole_calibration();

    let result = context.process_frame(&cloud, &vehicle_boxes, &[], p, r, t);
    assert!(result.is_err());
}
