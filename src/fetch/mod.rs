//! Bounded-concurrency retrieval of the tile grid of one panorama.
//!
//! Every tile is an independent request. At most [`FetchConfig::concurrency`]
//! requests are in flight at once, each bounded by [`FetchConfig::request_timeout`].
//! A tile that cannot be fetched or decoded becomes a [`TileOutcome::Missing`]
//! tombstone; it never aborts the batch.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use image::RgbImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::location::{TileCoord, TileGrid};

pub mod source;

pub use source::{HttpTileSource, TileSource, DEFAULT_TILE_URL};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TileFetchError {
    #[error("Tile request failed: {0}")]
    Request(String),
    #[error("Tile server answered with status {0}")]
    Status(u16),
    #[error("Tile payload could not be decoded: {0}")]
    Decode(String),
    #[error("Tile request timed out")]
    Timeout,
}

/// Transport settings for tile retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum number of tile requests in flight for one panorama.
    pub concurrency: usize,
    /// Upper bound on one tile request, including the body download.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    pub url_template: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 80,
            request_timeout: Duration::from_secs(10),
            url_template: DEFAULT_TILE_URL.to_string(),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Result of one tile request: a decoded tile or a tombstone.
#[derive(Debug, Clone)]
pub enum TileOutcome {
    Fetched(RgbImage),
    Missing(TileFetchError),
}

impl TileOutcome {
    pub fn image(&self) -> Option<&RgbImage> {
        match self {
            TileOutcome::Fetched(image) => Some(image),
            TileOutcome::Missing(_) => None,
        }
    }
}

/// Settled outcomes of every tile of a grid.
#[derive(Debug, Clone)]
pub struct FetchedTiles {
    pub grid: TileGrid,
    pub tiles: Vec<(TileCoord, TileOutcome)>,
}

impl FetchedTiles {
    pub fn fetched_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|(_, outcome)| outcome.image().is_some())
            .count()
    }

    pub fn missing_count(&self) -> usize {
        self.tiles.len() - self.fetched_count()
    }

    pub fn is_total_failure(&self) -> bool {
        self.fetched_count() == 0
    }
}

/// Fetches tile grids from a [`TileSource`].
pub struct TileFetcher<S> {
    source: S,
    config: FetchConfig,
}

impl TileFetcher<HttpTileSource> {
    /// Creates a fetcher that talks to the tile server described by `config`.
    pub fn http(config: FetchConfig) -> Result<Self, TileFetchError> {
        let source = HttpTileSource::new(config.url_template.clone(), config.request_timeout)?;
        Ok(Self::new(source, config))
    }
}

impl<S: TileSource> TileFetcher<S> {
    pub fn new(source: S, config: FetchConfig) -> Self {
        Self { source, config }
    }

    /// Fetches every tile of `grid` and waits until all requests have settled.
    ///
    /// The limiter is owned by this call, so the bound applies per panorama.
    pub async fn fetch_grid(&self, pano_id: &str, zoom: u32, grid: TileGrid) -> FetchedTiles {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        debug!(
            "Fetching {} tiles ({}x{}) for panorama {} at zoom {}",
            grid.len(),
            grid.tiles_x,
            grid.tiles_y,
            pano_id,
            zoom
        );

        let requests = grid.coords().map(|coord| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let outcome = match semaphore.acquire().await {
                    Ok(_permit) => self.fetch_one(pano_id, coord, zoom).await,
                    Err(e) => Err(TileFetchError::Request(format!("limiter closed: {e}"))),
                };
                match outcome {
                    Ok(tile) => (coord, TileOutcome::Fetched(tile)),
                    Err(e) => {
                        warn!(
                            "Tile ({}, {}) of panorama {} unavailable: {}",
                            coord.x, coord.y, pano_id, e
                        );
                        (coord, TileOutcome::Missing(e))
                    }
                }
            }
        });

        let tiles = join_all(requests).await;
        let fetched = FetchedTiles { grid, tiles };
        debug!(
            "Panorama {}: {} tiles fetched, {} missing",
            pano_id,
            fetched.fetched_count(),
            fetched.missing_count()
        );
        fetched
    }

    async fn fetch_one(
        &self,
        pano_id: &str,
        coord: TileCoord,
        zoom: u32,
    ) -> Result<RgbImage, TileFetchError> {
        let payload = tokio::time::timeout(
            self.config.request_timeout,
            self.source.fetch_tile(pano_id, coord, zoom),
        )
        .await
        .map_err(|_| TileFetchError::Timeout)??;

        tokio::task::spawn_blocking(move || decode_tile(&payload))
            .await
            .map_err(|e| TileFetchError::Decode(format!("decoder task failed: {e}")))?
    }
}

/// Decodes a tile payload of any format `image` recognizes into RGB.
pub fn decode_tile(payload: &[u8]) -> Result<RgbImage, TileFetchError> {
    let tile =
        image::load_from_memory(payload).map_err(|e| TileFetchError::Decode(e.to_string()))?;
    Ok(tile.to_rgb8())
}
