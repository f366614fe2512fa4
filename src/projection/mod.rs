//! Rendering of rectilinear views from equirectangular panoramas.
//!
//! For every output pixel the [`PinholeModel`] gives a camera ray through
//! `K^-1 (u, v, 1)`, the [`ViewRotation`] turns it toward the requested heading
//! and pitch, and the [`EquirectangularModel`] maps it to a source pixel which is
//! resampled with [`sampling::sample_bicubic`].

use image::RgbImage;
use log::debug;
use nalgebra::{Matrix3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::camera::{
    CameraModel, CameraModelError, EquirectangularModel, PinholeModel, Resolution, ViewRotation,
};
use crate::location::PanoramaLocation;

pub mod sampling;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Source panorama is empty ({width}x{height})")]
    EmptySource { width: u32, height: u32 },
    #[error("Invalid view: {0}")]
    InvalidView(String),
    #[error(transparent)]
    Camera(#[from] CameraModelError),
}

/// Viewing direction and output format of one rendered view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewParams {
    /// Degrees, 0 looks at the panorama centre.
    pub heading: f64,
    /// Degrees, positive looks up.
    pub pitch: f64,
    /// Horizontal field of view in degrees.
    pub fov: f64,
    pub output: Resolution,
}

impl ViewParams {
    pub fn for_location(location: &PanoramaLocation) -> Self {
        ViewParams {
            heading: location.heading,
            pitch: location.pitch,
            fov: location.params.fov,
            output: location.params.output,
        }
    }
}

/// Renders views with a fixed camera; build once and reuse across panoramas.
#[derive(Debug, Clone)]
pub struct Projector {
    camera: PinholeModel,
    k_inv: Matrix3<f64>,
    rotation: ViewRotation,
}

impl Projector {
    pub fn new(view: &ViewParams) -> Result<Self, ProjectionError> {
        if !view.heading.is_finite() || !view.pitch.is_finite() {
            return Err(ProjectionError::InvalidView(format!(
                "heading and pitch must be finite, got {} / {}",
                view.heading, view.pitch
            )));
        }
        let camera = PinholeModel::from_fov(view.fov, view.output)?;
        let k_inv = camera.inverse_intrinsic_matrix()?;
        let rotation = ViewRotation::from_heading_pitch(view.heading, view.pitch);

        Ok(Self {
            camera,
            k_inv,
            rotation,
        })
    }

    /// Rotated world ray of output pixel `(px, py)`, not normalized.
    pub fn pixel_ray(&self, px: f64, py: f64) -> Vector3<f64> {
        self.rotation.apply(&(self.k_inv * Vector3::new(px, py, 1.0)))
    }

    /// Source pixel sampled for output pixel `(px, py)`.
    pub fn source_coordinates(
        &self,
        source: &EquirectangularModel,
        px: f64,
        py: f64,
    ) -> Result<Vector2<f64>, CameraModelError> {
        source.project(&self.pixel_ray(px, py))
    }

    /// Renders the view from `source`.
    ///
    /// The output always has the configured resolution. The source must be non-empty.
    pub fn project(&self, source: &RgbImage) -> Result<RgbImage, ProjectionError> {
        let (src_width, src_height) = source.dimensions();
        if src_width == 0 || src_height == 0 {
            return Err(ProjectionError::EmptySource {
                width: src_width,
                height: src_height,
            });
        }
        let model = EquirectangularModel::new(Resolution {
            width: src_width,
            height: src_height,
        })?;

        let Resolution { width, height } = self.camera.get_resolution();
        debug!(
            "Projecting {}x{} panorama to {}x{} view",
            src_width, src_height, width, height
        );

        let mut output = RgbImage::new(width, height);
        for (px, py, pixel) in output.enumerate_pixels_mut() {
            // Rays through K^-1 of a valid camera are never zero.
            if let Ok(coords) = self.source_coordinates(&model, f64::from(px), f64::from(py)) {
                *pixel = sampling::sample_bicubic(source, coords.x, coords.y);
            }
        }

        Ok(output)
    }
}

/// Renders one view of `source`.
pub fn project(source: &RgbImage, view: &ViewParams) -> Result<RgbImage, ProjectionError> {
    Projector::new(view)?.project(source)
}
