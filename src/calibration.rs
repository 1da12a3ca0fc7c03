// Calibration assembly: composes the camera projection and LiDAR-camera
// extrinsics into a single point-projection matrix plus a back-projection
// pair used to lift image pixels to LiDAR-frame rays.

use crate::error::FusionError;
use nalgebra::{Matrix3, Matrix3x4, Matrix4, Vector3};

/// A back-projected image-space line in the LiDAR XY plane: `y = slope * x + intercept`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackProjectedLine {
    pub slope: f64,
    pub intercept: f64,
    /// True when the ray's `k_x` component is (near-)zero, meaning the pixel
    /// back-projects to a vertical line rather than a finite slope.
    pub vertical: bool,
}

/// The frame-lifetime projection geometry. Immutable once constructed.
#[derive(Clone, Debug)]
pub struct Calibration {
    /// 3x4 point-projection matrix, `Π = P * [R|T; 0 0 0 1]`.
    projection: Matrix3x4<f64>,
    /// `R_bp = Rᵀ * (P[:, 0:3])⁻¹`.
    r_bp: Matrix3<f64>,
    /// `T_bp = Rᵀ * T`.
    t_bp: Vector3<f64>,
}

impl Calibration {
    /// Builds the calibration from the camera projection `p` (3x4), the
    /// rectification rotation `r` (3x3), and the translation `t` (3x1).
    ///
    /// Fails if any input entry is non-finite or if `p`'s leading 3x3 block
    /// is not invertible; both are contract violations caught here rather
    /// than discovered lazily during back-projection.
    pub fn new(p: Matrix3x4<f64>, r: Matrix3<f64>, t: Vector3<f64>) -> Result<Calibration, FusionError> {
        for row in 0..3 {
            for col in 0..4 {
                if !p[(row, col)].is_finite() {
                    return Err(FusionError::NonFiniteCalibration {
                        matrix: "P",
                        row,
                        col,
                    });
                }
            }
            for col in 0..3 {
                if !r[(row, col)].is_finite() {
                    return Err(FusionError::NonFiniteCalibration {
                        matrix: "R",
                        row,
                        col,
                    });
                }
            }
            if !t[row].is_finite() {
                return Err(FusionError::NonFiniteCalibration {
                    matrix: "T",
                    row,
                    col: 0,
                });
            }
        }

        let p_block = p.fixed_view::<3, 3>(0, 0).into_owned();
        let det = p_block.determinant();
        if det.abs() < 1e-12 {
            return Err(FusionError::NonInvertibleCalibration { determinant: det });
        }
        let p_block_inv = p_block
            .try_inverse()
            .ok_or(FusionError::NonInvertibleCalibration { determinant: det })?;

        let mut m = Matrix4::<f64>::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&r);
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&t);

        let projection = p * m;
        let r_t = r.transpose();
        let r_bp = r_t * p_block_inv;
        let t_bp = r_t * t;

        Ok(Calibration {
            projection,
            r_bp,
            t_bp,
        })
    }

    /// Projects a LiDAR-frame point to pixel coordinates `(u, v)`.
    pub fn project(&self, x: f64, y: f64, z: f64) -> (f64, f64) {
        let p = self.projection * nalgebra::Vector4::new(x, y, z, 1.0);
        (p[0] / p[2], p[1] / p[2])
    }

    /// Lifts a pixel `(u, v)` to the LiDAR-frame line it back-projects to.
    pub fn back_project(&self, u: f64, v: f64) -> BackProjectedLine {
        let k = self.r_bp * Vector3::new(u, v, 1.0);
        if k[0].abs() < 1e-12 {
            return BackProjectedLine {
                slope: f64::INFINITY,
                intercept: 0.0,
                vertical: true,
            };
        }
        let slope = k[1] / k[0];
        let intercept = slope * self.t_bp[0] - self.t_bp[1];
        BackProjectedLine {
            slope,
            intercept,
            vertical: false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn identity_calibration() -> Calibration {
        let p = Matrix3x4::new(
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0,
        );
        let r = Matrix3::identity();
        let t = Vector3::new(0.0, 0.0, 0.0);
        Calibration::new(p, r, t).unwrap()
    }

    #[test]
    fn test_project_identity() {
        let c = identity_calibration();
        let (u, v) = c.project(2.0, 4.0, 8.0);
        assert!((u - 0.25).abs() < 1e-9);
        assert!((v - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_singular_projection_block() {
        let p = Matrix3x4::new(
            1.0, 2.0, 3.0, 0.0, 2.0, 4.0, 6.0, 0.0, 3.0, 6.0, 9.0, 0.0,
        );
        let r = Matrix3::identity();
        let t = Vector3::new(0.0, 0.0, 0.0);
        let result = Calibration::new(p, r, t);
        assert!(matches!(result, Err(FusionError::NonInvertibleCalibration { .. })));
    }

    #[test]
    fn test_rejects_non_finite_entry() {
        let p = Matrix3x4::new(
            f64::NAN, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0,
        );
        let r = Matrix3::identity();
        let t = Vector3::new(0.0, 0.0, 0.0);
        let result = Calibration::new(p, r, t);
        assert!(matches!(result, Err(FusionError::NonFiniteCalibration { .. })));
    }

    #[test]
    fn test_project_then_back_project_recovers_ray() {
        let p = Matrix3x4::new(
            500.0, 0.0, 320.0, 0.0, 0.0, 500.0, 240.0, 0.0, 0.0, 0.0, 1.0, 0.0,
        );
        let r = Matrix3::identity();
        let t = Vector3::new(0.0, 0.0, 0.0);
        let c = Calibration::new(p, r, t).unwrap();
        let (u, v) = c.project(10.0, 2.0, 1.0);
        let line = c.back_project(u, v);
        assert!(!line.vertical);
        let y_on_line = line.slope * 10.0 + line.intercept;
        assert!((y_on_line - 2.0).abs() < 1e-6);
    }
}
