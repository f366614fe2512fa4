//! Viewing-direction rotation built from heading and pitch.
//!
//! The rotation is composed as `R = R_pitch * R_yaw`. `R_yaw` turns by the heading
//! about the world up axis (`+y`). `R_pitch` turns by the pitch about the right axis
//! *after* it has been carried along by the yaw, `R_yaw * x`, rather than the fixed
//! world `x` axis. Both rotations are axis-angle (Rodrigues) rotations.

use nalgebra::{Rotation3, Vector3};

/// Rotation from view-camera coordinates to panorama (world) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRotation {
    rotation: Rotation3<f64>,
}

impl ViewRotation {
    /// Builds the rotation for a heading and pitch given in degrees.
    pub fn from_heading_pitch(heading_degrees: f64, pitch_degrees: f64) -> Self {
        let yaw = Rotation3::from_scaled_axis(Vector3::y() * heading_degrees.to_radians());
        let pitch_axis = yaw * Vector3::x();
        let pitch = Rotation3::from_scaled_axis(pitch_axis * pitch_degrees.to_radians());

        ViewRotation {
            rotation: pitch * yaw,
        }
    }

    /// Rotates a camera-space ray into panorama coordinates.
    pub fn apply(&self, ray: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * ray
    }

    pub fn matrix(&self) -> &Rotation3<f64> {
        &self.rotation
    }
}

impl Default for ViewRotation {
    fn default() -> Self {
        ViewRotation {
            rotation: Rotation3::identity(),
        }
    }
}
