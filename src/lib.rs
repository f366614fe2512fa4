//! Panoview Library
//!
//! A Rust library for turning tiled street-level panoramas into flat views.
//! This library provides:
//! - Bounded-concurrency tile fetching with per-tile failure tolerance
//! - Assembly of tiles into an equirectangular panorama, with border-artifact cropping
//! - Pinhole and equirectangular camera models
//! - Rectilinear re-projection of a heading, pitch and field of view
//! - Composition of several views into one challenge image
//!
//! The location data set can be loaded through the `catalog` module to draw the
//! locations of a challenge.

pub mod acquisition;
pub mod assembly;
pub mod camera;
pub mod catalog;
pub mod challenge;
pub mod fetch;
pub mod location;
pub mod projection;
pub mod util;

// Re-export commonly used types
pub use camera::{
    CameraModel, CameraModelError, EquirectangularModel, Intrinsics, PinholeModel, Resolution,
    ViewRotation,
};

pub use acquisition::{Acquisition, AcquisitionError, PanoramaPipeline, PipelineConfig};
pub use assembly::PanoramaAssembler;
pub use catalog::{CatalogError, ImpostorChallenge, LocationCatalog};
pub use challenge::{Challenge, ChallengeCompositor};
pub use fetch::{FetchConfig, HttpTileSource, TileFetchError, TileFetcher, TileSource};
pub use location::{AcquisitionParams, LocationError, PanoramaLocation, TileCoord, TileGrid};
pub use projection::{Projector, ProjectionError, ViewParams};
