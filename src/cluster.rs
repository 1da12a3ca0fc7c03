// Conditional Euclidean clustering: connected components over a
// fixed-radius spatial graph, gated by a hybrid distance/intensity/normal
// predicate, returning the dominant cluster.

use crate::config::FusionConfig;
use crate::structures::{DistanceMetric, FixedRadiusSearch3D};
use crate::types::Point3;
use nalgebra::Vector3;

/// `same_cluster(a, b, d_sq)`: either intensity similarity or normal
/// dissimilarity permits growth at short range; only intensity similarity
/// permits growth at long range.
fn same_cluster(
    a: &Point3,
    b: &Point3,
    normal_a: &Vector3<f64>,
    normal_b: &Vector3<f64>,
    d_sq: f64,
    config: &FusionConfig,
) -> bool {
    let intensity_diff = (a.intensity - b.intensity).abs();
    if d_sq < config.cluster_distance_sq_threshold {
        let dot = normal_a.dot(normal_b).abs();
        intensity_diff < config.cluster_intensity_threshold_near || dot < config.cluster_normal_threshold
    } else {
        intensity_diff < config.cluster_intensity_threshold_far
    }
}

/// Result of clustering a frustum: either the dominant cluster's local
/// indices (into the frustum, not the original cloud), or a failure signal
/// that the caller should treat as a `far` fallback.
pub enum ClusterOutcome {
    Found(Vec<usize>),
    NoCluster,
}

/// Runs conditional Euclidean region growing over `frustum` and returns the
/// largest connected component that meets the minimum-size constraint.
/// Indices returned are local to `frustum`, sorted ascending.
pub fn cluster(frustum: &[Point3], normals: &[Vector3<f64>], config: &FusionConfig) -> ClusterOutcome {
    let n = frustum.len();
    if n == 0 {
        return ClusterOutcome::NoCluster;
    }

    let mut index = FixedRadiusSearch3D::new(config.cluster_tolerance, DistanceMetric::SquaredEuclidean);
    for (i, p) in frustum.iter().enumerate() {
        index.insert(p.x, p.y, p.z, i);
    }

    let mut visited = vec![false; n];
    let mut components: Vec<Vec<usize>> = Vec::new();

    for seed in 0..n {
        if visited[seed] {
            continue;
        }
        let mut members = Vec::new();
        let mut stack = vec![seed];
        visited[seed] = true;
        while let Some(i) = stack.pop() {
            members.push(i);
            let p = &frustum[i];
            for (j, d_sq) in index.search(p.x, p.y, p.z) {
                if visited[j] || j == i {
                    continue;
                }
                if same_cluster(&frustum[i], &frustum[j], &normals[i], &normals[j], d_sq, config) {
                    visited[j] = true;
                    stack.push(j);
                }
            }
        }
        components.push(members);
    }

    // A tiny frustum's fractional minimum (ceil(0.2 * N)) can fall as low as
    // 1, which would let a handful of noise points pass as a cluster; floor
    // it at the same minimum boundary-set size the L-shape stage requires,
    // so a frustum too small to ever yield a usable fit reports `far` early.
    let min_size = ((config.cluster_min_fraction * n as f64).ceil() as usize).max(config.s_group_threshold);
    // `max_by_key` would keep the *last* of several equally-sized components;
    // components are discovered in ascending seed order, so only replace the
    // running best on a strict improvement to keep the earliest-encountered one.
    let mut best: Option<Vec<usize>> = None;
    for c in components {
        if c.len() < min_size || c.len() > n {
            continue;
        }
        let keep = match &best {
            Some(b) => c.len() > b.len(),
            None => true,
        };
        if keep {
            best = Some(c);
        }
    }

    match best {
        Some(mut members) => {
            members.sort_unstable();
            ClusterOutcome::Found(members)
        }
        None => ClusterOutcome::NoCluster,
    }
}
