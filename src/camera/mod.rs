//! Camera models used to re-project panoramas.
//!
//! Two models share the [`CameraModel`] trait: the [`PinholeModel`] describes the
//! rectilinear view rendered for display, and the [`EquirectangularModel`] describes
//! the spherical source panorama. A view is rendered by unprojecting every output
//! pixel through the pinhole model, rotating the ray with a [`ViewRotation`], and
//! projecting it into the equirectangular source.

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

pub mod equirectangular;
pub mod pinhole;
pub mod rotation;

pub use equirectangular::EquirectangularModel;
pub use pinhole::PinholeModel;
pub use rotation::ViewRotation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CameraModelError {
    #[error("Input point is outside the image")]
    PointIsOutSideImage,
    #[error("Ray has zero length, direction is undefined")]
    DegenerateRay,
    #[error("Focal length must be positive")]
    FocalLengthMustBePositive,
    #[error("Principal point must be finite")]
    PrincipalPointMustBeFinite,
    #[error("Intrinsic matrix is not invertible")]
    SingularIntrinsics,
    #[error("Invalid camera parameters: {0}")]
    InvalidParams(String),
}

/// Trait defining the core functionality for camera models
pub trait CameraModel {
    /// Project a 3D direction to 2D image coordinates
    fn project(&self, point_3d: &Vector3<f64>) -> Result<Vector2<f64>, CameraModelError>;

    /// Unproject 2D image coordinates to a unit 3D ray
    fn unproject(&self, point_2d: &Vector2<f64>) -> Result<Vector3<f64>, CameraModelError>;

    /// Validate camera parameters
    fn validate_params(&self) -> Result<(), CameraModelError>;

    fn get_resolution(&self) -> Resolution;
}

/// Common validation functions for camera parameters
pub mod validation {
    use super::*;

    pub fn validate_intrinsics(intrinsics: &Intrinsics) -> Result<(), CameraModelError> {
        if !(intrinsics.fx > 0.0) || !(intrinsics.fy > 0.0) || !intrinsics.fx.is_finite() {
            return Err(CameraModelError::FocalLengthMustBePositive);
        }
        if !intrinsics.cx.is_finite() || !intrinsics.cy.is_finite() {
            return Err(CameraModelError::PrincipalPointMustBeFinite);
        }
        Ok(())
    }

    pub fn validate_resolution(resolution: &Resolution) -> Result<(), CameraModelError> {
        if resolution.width == 0 || resolution.height == 0 {
            return Err(CameraModelError::InvalidParams(format!(
                "resolution must be non-empty, got {}x{}",
                resolution.width, resolution.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_intrinsics_rejects_bad_focal() {
        let intrinsics = Intrinsics {
            fx: 0.0,
            fy: 500.0,
            cx: 320.0,
            cy: 240.0,
        };
        assert_eq!(
            validation::validate_intrinsics(&intrinsics),
            Err(CameraModelError::FocalLengthMustBePositive)
        );

        let intrinsics = Intrinsics {
            fx: f64::NAN,
            ..intrinsics
        };
        assert!(validation::validate_intrinsics(&intrinsics).is_err());
    }

    #[test]
    fn test_validate_intrinsics_rejects_bad_principal_point() {
        let intrinsics = Intrinsics {
            fx: 500.0,
            fy: 500.0,
            cx: f64::INFINITY,
            cy: 240.0,
        };
        assert_eq!(
            validation::validate_intrinsics(&intrinsics),
            Err(CameraModelError::PrincipalPointMustBeFinite)
        );
    }

    #[test]
    fn test_validate_resolution() {
        assert!(validation::validate_resolution(&Resolution {
            width: 960,
            height: 540
        })
        .is_ok());
        assert!(validation::validate_resolution(&Resolution {
            width: 0,
            height: 540
        })
        .is_err());
    }
}
