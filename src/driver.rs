// Per-frame processing driver: builds calibration, the occlusion table and
// groups, then runs the obstacle pass and the vehicle pass. Independent
// rows are dispatched one worker thread each, following the corpus's own
// explicit-thread-plus-channel fan-out rather than a thread-pool crate.

use crate::calibration::Calibration;
use crate::cluster::{cluster, ClusterOutcome};
use crate::config::FusionConfig;
use crate::error::FusionError;
use crate::frustum::{overlap_aware_clip, simple_clip, Frustum, OverlapClaim};
use crate::lshape::{fit, propose_boundary};
use crate::normals::estimate_normals;
use crate::occlusion::OcclusionTable;
use crate::overlap::overlap;
use crate::reconstruct::reconstruct;
use crate::types::{Box2D, Detection, FrameResult, Point3};
use nalgebra::{Matrix3, Matrix3x4, Vector3};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

/// Holds the frame-lifetime configuration. Cheap to construct; intended to
/// be kept alive across frames by the caller.
pub struct FrameContext {
    config: FusionConfig,
}

impl FrameContext {
    pub fn new(config: FusionConfig) -> FrameContext {
        FrameContext { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Runs the full fusion pipeline for one frame. Fails only on contract
    /// violations at the input boundary; every other degeneracy resolves to
    /// a `far` detection or a cluster-without-box detection.
    pub fn process_frame(
        &self,
        cloud: &[Point3],
        vehicle_boxes: &[Box2D],
        obstacle_boxes: &[Box2D],
        projection: Matrix3x4<f64>,
        rectification: Matrix3<f64>,
        translation: Vector3<f64>,
    ) -> Result<FrameResult, FusionError> {
        for (index, point) in cloud.iter().enumerate() {
            if !point.is_finite() {
                return Err(FusionError::NonFinitePoint { index });
            }
        }
        for (index, b) in vehicle_boxes.iter().chain(obstacle_boxes.iter()).enumerate() {
            if !b.is_well_formed() {
                return Err(FusionError::MalformedBox2D {
                    index,
                    width: b.width(),
                    height: b.height(),
                });
            }
        }

        let calibration = Calibration::new(projection, rectification, translation)?;
        let cloud = Arc::new(cloud.to_vec());

        let mut order: Vec<usize> = (0..vehicle_boxes.len()).collect();
        order.sort_by(|&a, &b| vehicle_boxes[b].ymax.partial_cmp(&vehicle_boxes[a].ymax).unwrap());
        let sorted_vehicles: Vec<Box2D> = order.iter().map(|&i| vehicle_boxes[i]).collect();

        let table = OcclusionTable::build(&sorted_vehicles, obstacle_boxes, self.config.iou_threshold);
        let groups = table.groups(&(0..sorted_vehicles.len()).collect::<Vec<_>>());

        log::info!(
            "frame: {} vehicles, {} obstacles, {} groups",
            sorted_vehicles.len(),
            obstacle_boxes.len(),
            groups.len()
        );

        let obstacle_detections = self.run_obstacle_pass(&cloud, &calibration, obstacle_boxes, &table);
        let vehicle_detections = self.run_vehicle_pass(
            &cloud,
            &calibration,
            &sorted_vehicles,
            obstacle_boxes,
            &obstacle_detections,
            &table,
            &groups,
        );

        let with_box = vehicle_detections.iter().filter(|d| d.box_3d.is_some()).count();
        let far = vehicle_detections.iter().filter(|d| d.far).count();
        log::info!(
            "frame complete: {} vehicle boxes, {} far, {} obstacle clusters",
            with_box,
            far,
            obstacle_detections.iter().filter(|d| !d.far).count()
        );

        Ok(FrameResult {
            vehicles: vehicle_detections,
            obstacles: obstacle_detections,
        })
    }

    fn run_obstacle_pass(
        &self,
        cloud: &Arc<Vec<Point3>>,
        calibration: &Calibration,
        obstacle_boxes: &[Box2D],
        table: &OcclusionTable,
    ) -> Vec<Detection> {
        let relevant: Vec<usize> = (0..obstacle_boxes.len())
            .filter(|&i| table.obstacle_is_relevant(i))
            .collect();

        let (tx, rx) = mpsc::channel();
        let mut handles = Vec::with_capacity(relevant.len());
        for &i in &relevant {
            let tx = tx.clone();
            let cloud = Arc::clone(cloud);
            let calibration = calibration.clone();
            let box_2d = obstacle_boxes[i];
            let config = self.config;
            let handle = thread::spawn(move || {
                let frustum = simple_clip(&cloud, &calibration, &box_2d, config.simple_clip_min_x);
                let detection = finish_detection(box_2d, &frustum, &calibration, &config);
                tx.send((i, detection))
                    .expect("obstacle worker result channel closed early");
            });
            handles.push(handle);
        }
        drop(tx);

        let mut results: Vec<Option<Detection>> = vec![None; obstacle_boxes.len()];
        for (i, detection) in rx {
            results[i] = Some(detection);
        }
        for handle in handles {
            handle.join().expect("obstacle worker thread panicked");
        }

        results
            .into_iter()
            .enumerate()
            .map(|(i, det)| det.unwrap_or_else(|| Detection::empty(obstacle_boxes[i])))
            .collect()
    }

    fn run_vehicle_pass(
        &self,
        cloud: &Arc<Vec<Point3>>,
        calibration: &Calibration,
        sorted_vehicles: &[Box2D],
        obstacle_boxes: &[Box2D],
        obstacle_detections: &[Detection],
        table: &OcclusionTable,
        groups: &[Vec<usize>],
    ) -> Vec<Detection> {
        let (tx, rx) = mpsc::channel();
        let mut handles = Vec::with_capacity(groups.len());

        for group in groups {
            let tx = tx.clone();
            let cloud = Arc::clone(cloud);
            let calibration = calibration.clone();
            let group = group.clone();
            let vehicles: Vec<Box2D> = group.iter().map(|&n| sorted_vehicles[n]).collect();
            let obstacles = obstacle_boxes.to_vec();
            let obstacle_claims: Vec<Vec<usize>> = obstacle_detections
                .iter()
                .map(|d| d.cluster_indices.clone())
                .collect();
            let table = table.clone();
            let config = self.config;

            let handle = thread::spawn(move || {
                let mut local: Vec<Detection> = Vec::with_capacity(group.len());
                for (local_idx, &n) in group.iter().enumerate() {
                    let mut overlaps: Vec<OverlapClaim> = Vec::new();

                    for o in 0..obstacles.len() {
                        if table.obstacle_occludes(o, n) {
                            let region = overlap(&obstacles[o], &vehicles[local_idx]);
                            overlaps.push(OverlapClaim {
                                region,
                                claimed_indices: &obstacle_claims[o],
                            });
                        }
                    }
                    for (j_local, &j) in group.iter().enumerate().take(local_idx) {
                        if table.vehicle_occludes(j, n) {
                            let region = overlap(&vehicles[j_local], &vehicles[local_idx]);
                            overlaps.push(OverlapClaim {
                                region,
                                claimed_indices: &local[j_local].cluster_indices,
                            });
                        }
                    }

                    let frustum = overlap_aware_clip(
                        &cloud,
                        &calibration,
                        &vehicles[local_idx],
                        &overlaps,
                        config.overlap_clip_min_x,
                    );
                    let detection = finish_detection(vehicles[local_idx], &frustum, &calibration, &config);
                    local.push(detection);
                }
                tx.send((group.clone(), local))
                    .expect("vehicle worker result channel closed early");
            });
            handles.push(handle);
        }
        drop(tx);

        let mut results: Vec<Option<Detection>> = vec![None; sorted_vehicles.len()];
        for (group, detections) in rx {
            for (n, detection) in group.into_iter().zip(detections.into_iter()) {
                results[n] = Some(detection);
            }
        }
        for handle in handles {
            handle.join().expect("vehicle worker thread panicked");
        }

        results
            .into_iter()
            .enumerate()
            .map(|(n, det)| det.unwrap_or_else(|| Detection::empty(sorted_vehicles[n])))
            .collect()
    }
}

/// Shared tail of the obstacle and vehicle passes: cluster the frustum,
/// attempt an L-shape fit, and reconstruct the box on success.
fn finish_detection(box_2d: Box2D, frustum: &Frustum, calibration: &Calibration, config: &FusionConfig) -> Detection {
    if frustum.points.is_empty() {
        return Detection::empty(box_2d);
    }

    let normals = estimate_normals(&frustum.points, config.normal_radius);
    let outcome = cluster(&frustum.points, &normals, config);

    let local_indices = match outcome {
        ClusterOutcome::Found(indices) => indices,
        ClusterOutcome::NoCluster => {
            let mut d = Detection::empty(box_2d);
            d.far = true;
            d.distance_far = frustum.mean_x();
            log::debug!("frustum of {} points yielded no cluster; far = true", frustum.points.len());
            return d;
        }
    };

    let cluster_points: Vec<Point3> = local_indices.iter().map(|&i| frustum.points[i]).collect();
    let mut cluster_indices: Vec<usize> = local_indices.iter().map(|&i| frustum.indices[i]).collect();
    cluster_indices.sort_unstable();

    let mut detection = Detection {
        box_2d,
        box_3d: None,
        cluster_indices,
        cluster_points: cluster_points.clone(),
        far: false,
        distance_far: 0.0,
    };

    let boundary = propose_boundary(
        &cluster_points,
        config.angle_reso,
        config.point_num,
        config.s_group_threshold,
    );
    if boundary.len() > config.s_group_threshold {
        let (shape, error) = fit(&boundary, config.s_group_refined_threshold);
        log::debug!("cluster size {}, fit error {}", cluster_points.len(), error);
        if error > 0.0 {
            detection.box_3d = reconstruct(&shape, &boundary, &box_2d, calibration, &cluster_points, config);
        }
    }

    detection
}
