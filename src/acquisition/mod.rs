//! Single-panorama pipeline: fetch the tiles, assemble the panorama, render the view.

use std::fs;
use std::io::Write;

use image::RgbImage;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::assembly::PanoramaAssembler;
use crate::fetch::{FetchConfig, HttpTileSource, TileFetchError, TileFetcher, TileSource};
use crate::location::{AcquisitionParams, LocationError, PanoramaLocation};
use crate::projection::{Projector, ProjectionError, ViewParams};

#[derive(thiserror::Error, Debug)]
pub enum AcquisitionError {
    #[error("Invalid location: {0}")]
    Location(#[from] LocationError),
    #[error("Projection failed: {0}")]
    Projection(#[from] ProjectionError),
    #[error("Projection worker failed: {0}")]
    Worker(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse YAML: {0}")]
    YamlError(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IOError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::YamlError(err.to_string())
    }
}

/// Overrides for the acquisition and transport defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub acquisition: AcquisitionParams,
    pub fetch: FetchConfig,
}

impl PipelineConfig {
    /// Loads a configuration from a YAML file. Missing keys keep their defaults.
    pub fn load_from_yaml(path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to_yaml(&self, path: &str) -> Result<(), ConfigError> {
        let yaml_string = serde_yaml::to_string(self)?;
        let mut file = fs::File::create(path)?;
        file.write_all(yaml_string.as_bytes())?;
        Ok(())
    }
}

/// A rendered view together with how much of its panorama was available.
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub view: RgbImage,
    pub fetched_tiles: usize,
    pub missing_tiles: usize,
}

impl Acquisition {
    /// True when no tile could be fetched and the view is black.
    pub fn is_degraded(&self) -> bool {
        self.fetched_tiles == 0
    }
}

/// Runs fetch, assembly and projection for locations.
pub struct PanoramaPipeline<S> {
    fetcher: TileFetcher<S>,
}

impl PanoramaPipeline<HttpTileSource> {
    pub fn http(config: FetchConfig) -> Result<Self, TileFetchError> {
        Ok(Self::new(TileFetcher::http(config)?))
    }
}

impl<S: TileSource> PanoramaPipeline<S> {
    pub fn new(fetcher: TileFetcher<S>) -> Self {
        Self { fetcher }
    }

    /// Acquires the panorama of `location` and renders its view.
    ///
    /// Tile failures degrade the result but never fail it; only invalid parameters do.
    pub async fn acquire(&self, location: &PanoramaLocation) -> Result<Acquisition, AcquisitionError> {
        location.params.validate()?;
        let grid = location.grid()?;
        let assembler = PanoramaAssembler::from_params(&location.params)?;
        let projector = Projector::new(&ViewParams::for_location(location))?;

        info!(
            "Acquiring panorama {} ({}, {}) in {}",
            location.pano_id, location.latitude, location.longitude, location.country_code
        );
        let tiles = self
            .fetcher
            .fetch_grid(&location.pano_id, location.params.zoom, grid)
            .await;
        let fetched_tiles = tiles.fetched_count();
        let missing_tiles = tiles.missing_count();
        if tiles.is_total_failure() {
            warn!(
                "No tile of panorama {} could be fetched, rendering a blank view",
                location.pano_id
            );
        }

        let view = tokio::task::spawn_blocking(move || -> Result<RgbImage, AcquisitionError> {
            let panorama = assembler.assemble_and_crop(&tiles)?;
            drop(tiles);
            Ok(projector.project(&panorama)?)
        })
        .await
        .map_err(|e| AcquisitionError::Worker(e.to_string()))??;

        info!(
            "Panorama {} rendered ({} tiles, {} missing)",
            location.pano_id, fetched_tiles, missing_tiles
        );
        Ok(Acquisition {
            view,
            fetched_tiles,
            missing_tiles,
        })
    }
}
