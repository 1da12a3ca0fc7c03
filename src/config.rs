// Loadable threshold configuration, following the same read-with-fallback
// pattern the corpus uses for its own settings file: missing or malformed
// JSON never aborts startup, it just falls back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Every tunable threshold used by the fusion pipeline. Constructed once per
/// session and threaded through the frame context; never a bare literal
/// re-used across call sites.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Containment threshold used by the occlusion predicate.
    pub iou_threshold: f64,
    /// Minimum LiDAR-frame x for a point to be considered in a simple frustum clip.
    pub simple_clip_min_x: f64,
    /// Minimum LiDAR-frame x for a point to be considered in an overlap-aware clip.
    pub overlap_clip_min_x: f64,
    /// Radius (m) used for k-NN normal estimation.
    pub normal_radius: f64,
    /// Squared-distance cutoff (m^2) distinguishing the short-range and long-range
    /// branches of the region-growing predicate.
    pub cluster_distance_sq_threshold: f64,
    /// Intensity-similarity threshold in the short-range branch.
    pub cluster_intensity_threshold_near: f64,
    /// Intensity-similarity threshold in the long-range branch.
    pub cluster_intensity_threshold_far: f64,
    /// Normal-dissimilarity threshold (|dot product| below this permits growth).
    pub cluster_normal_threshold: f64,
    /// Spatial tolerance (m) for the connected-components growth step.
    pub cluster_tolerance: f64,
    /// Minimum cluster size as a fraction of the frustum point count.
    pub cluster_min_fraction: f64,
    /// Angular bucket width (degrees) for L-shape boundary extraction.
    pub angle_reso: f64,
    /// Points retained per angular bucket.
    pub point_num: usize,
    /// Minimum cluster size before an L-shape proposal is attempted.
    pub s_group_threshold: usize,
    /// Minimum boundary-set size before a fit is attempted.
    pub s_group_refined_threshold: usize,
    /// Near-zero slope/determinant guard used throughout corner reconstruction.
    pub min_slope: f64,
    /// Roof clip applied when estimating box height.
    pub height_clip_z: f64,
    /// Sanity-gate upper bound on box length (m).
    pub max_length: f64,
    /// Sanity-gate upper bound on box width (m).
    pub max_width: f64,
    /// Sanity-gate upper bound on box height (m).
    pub max_height: f64,
}

impl Default for FusionConfig {
    fn default() -> FusionConfig {
        FusionConfig {
            iou_threshold: 0.25,
            simple_clip_min_x: 3.0,
            overlap_clip_min_x: 5.0,
            normal_radius: 4.0,
            cluster_distance_sq_threshold: 4.0,
            cluster_intensity_threshold_near: 8.0,
            cluster_intensity_threshold_far: 3.0,
            cluster_normal_threshold: 0.06,
            cluster_tolerance: 0.7,
            cluster_min_fraction: 0.2,
            angle_reso: 0.06,
            point_num: 2,
            s_group_threshold: 10,
            s_group_refined_threshold: 5,
            min_slope: 1e-7,
            height_clip_z: 1.0,
            max_length: 6.0,
            max_width: 6.0,
            max_height: 3.0,
        }
    }
}

impl FusionConfig {
    /// Reads a JSON-backed configuration from `path`. A missing file silently
    /// falls back to defaults; a malformed file logs a warning and also falls
    /// back to defaults, mirroring the corpus's own settings loader.
    pub fn from_file<P: AsRef<Path>>(path: P) -> FusionConfig {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!(
                        "failed to parse configuration file {}: {}; using defaults",
                        path.display(),
                        e
                    );
                    FusionConfig::default()
                }
            },
            Err(_) => FusionConfig::default(),
        }
    }

    /// Writes the configuration to `path` as pretty-printed JSON.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        fs::write(path, json)
    }
}
