// The fatal, input-boundary error type. Everything that is merely a
// degeneracy (singular M11, parallel back-projected edges, an empty
// frustum) resolves locally in the driver instead of appearing here.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    #[error("box2d at index {index} is malformed: width={width}, height={height}")]
    MalformedBox2D {
        index: usize,
        width: f64,
        height: f64,
    },

    #[error("calibration matrix entry is non-finite: {matrix} at ({row}, {col})")]
    NonFiniteCalibration {
        matrix: &'static str,
        row: usize,
        col: usize,
    },

    #[error("calibration block P[:, 0:3] is not invertible (determinant {determinant})")]
    NonInvertibleCalibration { determinant: f64 },

    #[error("point at cloud index {index} is non-finite")]
    NonFinitePoint { index: usize },
}
