/*
Demo binary for the fusion core: builds a small synthetic frame, runs
FrameContext::process_frame, and prints a summary. Verbosity is controlled
by RUST_LOG, the same way the corpus's own binaries gate verbosity behind
a command-line flag, except driven by the env_logger convention instead.
*/

use fusion_core::config::FusionConfig;
use fusion_core::driver::FrameContext;
use fusion_core::types::{Box2D, Point3, VehicleClass};
use nalgebra::{Matrix3, Matrix3x4, Vector3};

fn synthetic_car_cloud(center_x: f64, center_y: f64) -> Vec<Point3> {
    let mut points = Vec::new();
    for i in 0..20 {
        let x = center_x + (i as f64) * 0.02;
        points.push(Point3::new(x, center_y, -0.3, 40.0));
        points.push(Point3::new(x, center_y + 1.8, -0.3, 40.0));
    }
    for i in 0..20 {
        let y = center_y + (i as f64) * 0.09;
        points.push(Point3::new(center_x, y, -0.3, 40.0));
        points.push(Point3::new(center_x + 4.2, y, -0.3, 40.0));
    }
    points
}

fn identity_camera_calibration() -> (Matrix3x4<f64>, Matrix3<f64>, Vector3<f64>) {
    let p = Matrix3x4::new(
        500.0, 0.0, 320.0, 0.0, 0.0, 500.0, 240.0, 0.0, 0.0, 0.0, 1.0, 0.0,
    );
    (p, Matrix3::identity(), Vector3::zeros())
}

fn main() {
    env_logger::init();

    let config = FusionConfig::from_file("fusion_config.json");
    let context = FrameContext::new(config);

    let cloud = synthetic_car_cloud(10.0, 2.0);
    let vehicle_boxes = vec![Box2D::new(100.0, 150.0, 540.0, 420.0).with_class(VehicleClass::Car)];
    let obstacle_boxes: Vec<Box2D> = Vec::new();
    let (p, r, t) = identity_camera_calibration();

    match context.process_frame(&cloud, &vehicle_boxes, &obstacle_boxes, p, r, t) {
        Ok(result) => {
            for (i, detection) in result.vehicles.iter().enumerate() {
                match &detection.box_3d {
                    Some(box_3d) => println!(
                        "vehicle {}: box at ({:.2}, {:.2}), {:.2}m x {:.2}m, heading {:.3} rad, {} points",
                        i,
                        box_3d.x,
                        box_3d.y,
                        box_3d.length,
                        box_3d.width,
                        box_3d.heading,
                        detection.cluster_indices.len()
                    ),
                    None if detection.far => {
                        println!("vehicle {}: far, distance {:.2}m", i, detection.distance_far)
                    }
                    None => println!(
                        "vehicle {}: cluster of {} points, no box",
                        i,
                        detection.cluster_indices.len()
                    ),
                }
            }
        }
        Err(e) => eprintln!("frame rejected: {}", e),
    }
}
