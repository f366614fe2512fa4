//! Implements the Pinhole camera model for rectilinear views.
//!
//! This module provides the [`PinholeModel`] struct used as the virtual camera
//! looking into a panorama. It adheres to the [`CameraModel`] trait defined in the
//! parent `camera` module ([`crate::camera`]). The model assumes no lens distortion
//! and a square pixel, so `fx == fy` when it is built from a field of view.

use crate::camera::{validation, CameraModel, CameraModelError, Intrinsics, Resolution};
use nalgebra::{Matrix3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Represents a Pinhole camera model.
///
/// This struct holds the intrinsic parameters (focal length, principal point)
/// and image resolution of the rendered view.
///
/// # Examples
///
/// ```rust
/// use panoview::camera::pinhole::PinholeModel;
/// use panoview::camera::Resolution;
///
/// let model = PinholeModel::from_fov(90.0, Resolution { width: 641, height: 481 }).unwrap();
///
/// // f = 0.5 * 641 / tan(45 deg)
/// assert!((model.intrinsics.fx - 320.5).abs() < 1e-9);
/// assert_eq!(model.intrinsics.cx, 320.0);
/// assert_eq!(model.intrinsics.cy, 240.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinholeModel {
    /// The intrinsic parameters of the camera, [`Intrinsics`] (fx, fy, cx, cy).
    pub intrinsics: Intrinsics,
    /// The resolution of the camera image, [`Resolution`] (width, height).
    pub resolution: Resolution,
}

impl PinholeModel {
    /// Creates a new [`PinholeModel`] from a horizontal field of view.
    ///
    /// The focal length is `0.5 * width / tan(0.5 * fov)` and the principal point
    /// sits at the pixel centre of the image, `((width - 1) / 2, (height - 1) / 2)`.
    ///
    /// # Arguments
    ///
    /// * `fov_degrees` - Horizontal field of view in degrees, in the open range `(0, 180)`.
    /// * `resolution` - Output image size.
    ///
    /// # Errors
    ///
    /// * [`CameraModelError::InvalidParams`] if the field of view or resolution is out of range.
    /// * [`CameraModelError::FocalLengthMustBePositive`] if the derived focal length is not usable.
    pub fn from_fov(fov_degrees: f64, resolution: Resolution) -> Result<Self, CameraModelError> {
        if !(fov_degrees > 0.0 && fov_degrees < 180.0) {
            return Err(CameraModelError::InvalidParams(format!(
                "field of view must be in (0, 180) degrees, got {fov_degrees}"
            )));
        }
        validation::validate_resolution(&resolution)?;

        let width = resolution.width as f64;
        let height = resolution.height as f64;
        let f = 0.5 * width / (0.5 * fov_degrees.to_radians()).tan();

        let model = PinholeModel {
            intrinsics: Intrinsics {
                fx: f,
                fy: f,
                cx: (width - 1.0) / 2.0,
                cy: (height - 1.0) / 2.0,
            },
            resolution,
        };

        model.validate_params()?;

        Ok(model)
    }

    /// Returns the intrinsic matrix `K`.
    pub fn intrinsic_matrix(&self) -> Matrix3<f64> {
        let Intrinsics { fx, fy, cx, cy } = self.intrinsics;
        Matrix3::new(fx, 0.0, cx, 0.0, fy, cy, 0.0, 0.0, 1.0)
    }

    /// Returns `K^-1`, which maps homogeneous pixels `(u, v, 1)` to camera rays.
    pub fn inverse_intrinsic_matrix(&self) -> Result<Matrix3<f64>, CameraModelError> {
        self.intrinsic_matrix()
            .try_inverse()
            .ok_or(CameraModelError::SingularIntrinsics)
    }
}

impl CameraModel for PinholeModel {
    /// Projects a 3D point from camera coordinates to 2D image coordinates.
    ///
    /// `u = fx * X / Z + cx`, `v = fy * Y / Z + cy`. Points behind the camera have no
    /// image and are reported as [`CameraModelError::DegenerateRay`].
    fn project(&self, point_3d: &Vector3<f64>) -> Result<Vector2<f64>, CameraModelError> {
        if point_3d.z < f64::EPSILON.sqrt() {
            return Err(CameraModelError::DegenerateRay);
        }
        let u = self.intrinsics.fx * point_3d.x / point_3d.z + self.intrinsics.cx;
        let v = self.intrinsics.fy * point_3d.y / point_3d.z + self.intrinsics.cy;
        Ok(Vector2::new(u, v))
    }

    /// Unprojects a 2D image point to a unit 3D ray through `K^-1 (u, v, 1)`.
    ///
    /// # Errors
    ///
    /// * [`CameraModelError::PointIsOutSideImage`]: If the input 2D point is outside the camera's resolution.
    fn unproject(&self, point_2d: &Vector2<f64>) -> Result<Vector3<f64>, CameraModelError> {
        if point_2d.x < 0.0
            || point_2d.x >= self.resolution.width as f64
            || point_2d.y < 0.0
            || point_2d.y >= self.resolution.height as f64
        {
            return Err(CameraModelError::PointIsOutSideImage);
        }

        let k_inv = self.inverse_intrinsic_matrix()?;
        let ray = k_inv * Vector3::new(point_2d.x, point_2d.y, 1.0);
        Ok(ray.normalize())
    }

    fn validate_params(&self) -> Result<(), CameraModelError> {
        validation::validate_intrinsics(&self.intrinsics)?;
        validation::validate_resolution(&self.resolution)?;
        Ok(())
    }

    fn get_resolution(&self) -> Resolution {
        self.resolution
    }
}

/// Contains unit tests for the Pinhole camera model.
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn get_sample_model() -> PinholeModel {
        PinholeModel::from_fov(
            110.0,
            Resolution {
                width: 960,
                height: 540,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_pinhole_from_fov() {
        let model = get_sample_model();
        let expected_f = 0.5 * 960.0 / (55.0_f64.to_radians()).tan();

        assert_relative_eq!(model.intrinsics.fx, expected_f, epsilon = 1e-9);
        assert_relative_eq!(model.intrinsics.fy, expected_f, epsilon = 1e-9);
        assert_relative_eq!(model.intrinsics.cx, 479.5);
        assert_relative_eq!(model.intrinsics.cy, 269.5);
    }

    #[test]
    fn test_pinhole_rejects_bad_fov() {
        let resolution = Resolution {
            width: 10,
            height: 10,
        };
        assert!(PinholeModel::from_fov(0.0, resolution).is_err());
        assert!(PinholeModel::from_fov(180.0, resolution).is_err());
        assert!(PinholeModel::from_fov(f64::NAN, resolution).is_err());
    }

    #[test]
    fn test_pinhole_inverse_intrinsics() {
        let model = get_sample_model();
        let product = model.intrinsic_matrix() * model.inverse_intrinsic_matrix().unwrap();
        assert_relative_eq!(product, Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_pinhole_centre_ray_is_optical_axis() {
        let model = get_sample_model();
        let ray = model
            .unproject(&Vector2::new(model.intrinsics.cx, model.intrinsics.cy))
            .unwrap();
        assert_relative_eq!(ray, Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
    }

    /// Tests the projection and unprojection consistency of the [`PinholeModel`].
    #[test]
    fn test_pinhole_project_unproject() {
        let model = get_sample_model();

        let point_3d = Vector3::new(0.3, -0.2, 1.5);
        let norm_3d = point_3d.normalize();

        let point_2d = model.project(&point_3d).unwrap();
        let point_3d_unprojected = model.unproject(&point_2d).unwrap();

        assert_relative_eq!(norm_3d, point_3d_unprojected, epsilon = 1e-9);
    }

    #[test]
    fn test_pinhole_unproject_outside_image() {
        let model = get_sample_model();
        assert_eq!(
            model.unproject(&Vector2::new(-1.0, 10.0)),
            Err(CameraModelError::PointIsOutSideImage)
        );
        assert_eq!(
            model.unproject(&Vector2::new(10.0, 540.0)),
            Err(CameraModelError::PointIsOutSideImage)
        );
    }
}
