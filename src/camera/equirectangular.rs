//! Equirectangular (spherical) camera model for full panoramas.
//!
//! Image `x` is linear in longitude, `atan2(X, Z)`, and image `y` is linear in
//! latitude, `asin(Y)` of the unit ray. The pixel mapping spans `width - 1` and
//! `height - 1` so that longitude `-pi` lands on the first column and `+pi` on the
//! last one.

use std::f64::consts::PI;

use crate::camera::{validation, CameraModel, CameraModelError, Resolution};
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquirectangularModel {
    pub resolution: Resolution,
}

impl EquirectangularModel {
    pub fn new(resolution: Resolution) -> Result<Self, CameraModelError> {
        let model = EquirectangularModel { resolution };
        model.validate_params()?;
        Ok(model)
    }

    /// Converts a ray into `(longitude, latitude)` in radians.
    pub fn ray_to_lon_lat(point_3d: &Vector3<f64>) -> Result<Vector2<f64>, CameraModelError> {
        let norm = point_3d.norm();
        if norm < f64::EPSILON || !norm.is_finite() {
            return Err(CameraModelError::DegenerateRay);
        }
        let unit = point_3d / norm;
        let lon = unit.x.atan2(unit.z);
        let lat = unit.y.clamp(-1.0, 1.0).asin();
        Ok(Vector2::new(lon, lat))
    }

    /// Maps `(longitude, latitude)` in radians to source pixel coordinates.
    pub fn lon_lat_to_pixel(&self, lon_lat: &Vector2<f64>) -> Vector2<f64> {
        let x = (lon_lat.x / (2.0 * PI) + 0.5) * (self.resolution.width as f64 - 1.0);
        let y = (lon_lat.y / PI + 0.5) * (self.resolution.height as f64 - 1.0);
        Vector2::new(x, y)
    }
}

impl CameraModel for EquirectangularModel {
    /// Projects a ray to source pixel coordinates. Every non-zero ray has an image.
    fn project(&self, point_3d: &Vector3<f64>) -> Result<Vector2<f64>, CameraModelError> {
        let lon_lat = Self::ray_to_lon_lat(point_3d)?;
        Ok(self.lon_lat_to_pixel(&lon_lat))
    }

    fn unproject(&self, point_2d: &Vector2<f64>) -> Result<Vector3<f64>, CameraModelError> {
        let width = self.resolution.width as f64;
        let height = self.resolution.height as f64;
        if point_2d.x < 0.0 || point_2d.x > width - 1.0 || point_2d.y < 0.0 || point_2d.y > height - 1.0
        {
            return Err(CameraModelError::PointIsOutSideImage);
        }

        let lon = (point_2d.x / (width - 1.0).max(1.0) - 0.5) * 2.0 * PI;
        let lat = (point_2d.y / (height - 1.0).max(1.0) - 0.5) * PI;
        Ok(Vector3::new(
            lat.cos() * lon.sin(),
            lat.sin(),
            lat.cos() * lon.cos(),
        ))
    }

    fn validate_params(&self) -> Result<(), CameraModelError> {
        validation::validate_resolution(&self.resolution)
    }

    fn get_resolution(&self) -> Resolution {
        self.resolution
    }
}
