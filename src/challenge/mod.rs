//! Quiz images built from several panoramas.
//!
//! Every location is acquired concurrently and independently. The rendered views are
//! laid out two per row in input order: location `i` lands in column `i % 2` and row
//! `i / 2`, whatever order the acquisitions finish in.

use futures::future::join_all;
use image::{imageops, RgbImage};
use log::{info, warn};

use crate::acquisition::{Acquisition, AcquisitionError, PanoramaPipeline};
use crate::camera::Resolution;
use crate::fetch::TileSource;
use crate::location::PanoramaLocation;

/// Number of views per row of the composite.
pub const GRID_COLUMNS: u32 = 2;

/// Composite image and the per-location outcome, in input order.
#[derive(Debug)]
pub struct Challenge {
    pub image: RgbImage,
    pub cell: Resolution,
    pub outcomes: Vec<Result<Acquisition, AcquisitionError>>,
}

impl Challenge {
    /// Indices of locations whose cell is blank, either failed or fully degraded.
    pub fn degraded_cells(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, outcome)| outcome.as_ref().map_or(true, Acquisition::is_degraded))
            .map(|(index, _)| index)
            .collect()
    }
}

/// Top-left corner of cell `index`.
pub fn cell_origin(index: usize, cell: Resolution) -> (u32, u32) {
    let index = index as u32;
    (
        (index % GRID_COLUMNS) * cell.width,
        (index / GRID_COLUMNS) * cell.height,
    )
}

/// Size of a canvas holding `count` cells.
pub fn canvas_size(count: usize, cell: Resolution) -> Resolution {
    let rows = (count as u32).div_ceil(GRID_COLUMNS);
    Resolution {
        width: GRID_COLUMNS * cell.width,
        height: rows * cell.height,
    }
}

/// Largest output resolution among the locations whose parameters are valid.
///
/// Rejected locations never render, so their requested size is ignored.
pub fn cell_size(locations: &[PanoramaLocation]) -> Resolution {
    locations
        .iter()
        .filter(|location| location.params.validate().is_ok())
        .map(|location| location.params.output)
        .fold(Resolution { width: 0, height: 0 }, |cell, output| Resolution {
            width: cell.width.max(output.width),
            height: cell.height.max(output.height),
        })
}

pub struct ChallengeCompositor<S> {
    pipeline: PanoramaPipeline<S>,
}

impl<S: TileSource> ChallengeCompositor<S> {
    pub fn new(pipeline: PanoramaPipeline<S>) -> Self {
        Self { pipeline }
    }

    /// Acquires every location and tiles the views into one image.
    ///
    /// A failed location leaves its cell black; it does not affect the others.
    pub async fn compose(&self, locations: &[PanoramaLocation]) -> Challenge {
        info!("Composing challenge from {} locations", locations.len());
        let outcomes: Vec<_> = join_all(
            locations
                .iter()
                .map(|location| self.pipeline.acquire(location)),
        )
        .await;

        let cell = cell_size(locations);
        let size = canvas_size(locations.len(), cell);
        let mut image = RgbImage::new(size.width, size.height);

        for (index, (location, outcome)) in locations.iter().zip(&outcomes).enumerate() {
            match outcome {
                Ok(acquisition) => {
                    let (x, y) = cell_origin(index, cell);
                    imageops::replace(&mut image, &acquisition.view, i64::from(x), i64::from(y));
                }
                Err(e) => warn!(
                    "Location {} ({}) failed, leaving its cell blank: {}",
                    index, location.pano_id, e
                ),
            }
        }

        let challenge = Challenge {
            image,
            cell,
            outcomes,
        };
        info!(
            "Challenge composed: {}x{}, {} degraded cells",
            size.width,
            size.height,
            challenge.degraded_cells().len()
        );
        challenge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::solid_tile_png;
    use crate::fetch::{FetchConfig, TileFetchError, TileFetcher};
    use crate::location::{AcquisitionParams, LocationError, TileCoord};
    use async_trait::async_trait;
    use bytes::Bytes;
    use image::Rgb;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Serves a solid tile per panorama id; unknown ids fail.
    struct ColorSource {
        tiles: HashMap<String, Bytes>,
        delays: HashMap<String, Duration>,
    }

    #[async_trait]
    impl TileSource for ColorSource {
        async fn fetch_tile(
            &self,
            pano_id: &str,
            _coord: TileCoord,
            _zoom: u32,
        ) -> Result<Bytes, TileFetchError> {
            if let Some(delay) = self.delays.get(pano_id) {
                tokio::time::sleep(*delay).await;
            }
            self.tiles
                .get(pano_id)
                .cloned()
                .ok_or(TileFetchError::Status(404))
        }
    }

    const TILE: u32 = 8;
    const CELL: Resolution = Resolution {
        width: 20,
        height: 12,
    };

    fn params() -> AcquisitionParams {
        AcquisitionParams {
            zoom: 1,
            tile_size: TILE,
            alt_tile_size: 6,
            fov: 60.0,
            output: CELL,
        }
    }

    fn colors() -> Vec<(&'static str, Rgb<u8>)> {
        vec![
            ("north", Rgb([255, 0, 0])),
            ("east", Rgb([0, 255, 0])),
            ("south", Rgb([0, 0, 255])),
            ("west", Rgb([255, 255, 0])),
        ]
    }

    fn compositor(skip: Option<&str>) -> ChallengeCompositor<ColorSource> {
        let mut tiles = HashMap::new();
        let mut delays = HashMap::new();
        for (i, (id, color)) in colors().into_iter().enumerate() {
            if Some(id) != skip {
                tiles.insert(id.to_string(), solid_tile_png(TILE, color));
            }
            // Earlier locations finish last.
            delays.insert(id.to_string(), Duration::from_millis(20 - 5 * i as u64));
        }
        let fetcher = TileFetcher::new(ColorSource { tiles, delays }, FetchConfig::default());
        ChallengeCompositor::new(PanoramaPipeline::new(fetcher))
    }

    fn locations() -> Vec<PanoramaLocation> {
        colors()
            .into_iter()
            .map(|(id, _)| PanoramaLocation::new(0.0, 0.0, id).with_params(params()))
            .collect()
    }

    #[test]
    fn test_cell_layout() {
        assert_eq!(cell_origin(0, CELL), (0, 0));
        assert_eq!(cell_origin(1, CELL), (20, 0));
        assert_eq!(cell_origin(2, CELL), (0, 12));
        assert_eq!(cell_origin(3, CELL), (20, 12));
        assert_eq!(canvas_size(4, CELL), Resolution { width: 40, height: 24 });
        assert_eq!(canvas_size(3, CELL), Resolution { width: 40, height: 24 });
        assert_eq!(canvas_size(1, CELL), Resolution { width: 40, height: 12 });
    }

    #[tokio::test]
    async fn test_quadrants_follow_input_order() {
        let challenge = compositor(None).compose(&locations()).await;

        assert_eq!(challenge.image.dimensions(), (40, 24));
        assert!(challenge.degraded_cells().is_empty());
        for (index, (_, color)) in colors().into_iter().enumerate() {
            let (x, y) = cell_origin(index, CELL);
            assert_eq!(*challenge.image.get_pixel(x, y), color);
            assert_eq!(*challenge.image.get_pixel(x + CELL.width / 2, y + CELL.height / 2), color);
            assert_eq!(*challenge.image.get_pixel(x + CELL.width - 1, y + CELL.height - 1), color);
        }
    }

    #[tokio::test]
    async fn test_failed_location_leaves_black_quadrant() {
        let challenge = compositor(Some("south")).compose(&locations()).await;

        assert_eq!(challenge.image.dimensions(), (40, 24));
        assert_eq!(challenge.degraded_cells(), vec![2]);
        assert!(challenge.outcomes[2].as_ref().unwrap().is_degraded());

        for (index, (_, color)) in colors().into_iter().enumerate() {
            let (x, y) = cell_origin(index, CELL);
            let expected = if index == 2 { Rgb([0, 0, 0]) } else { color };
            assert_eq!(*challenge.image.get_pixel(x + 3, y + 3), expected);
        }
    }

    #[tokio::test]
    async fn test_invalid_location_does_not_abort_siblings() {
        let mut locations = locations();
        locations[1].params.zoom = 0;
        let challenge = compositor(None).compose(&locations).await;

        assert!(matches!(
            challenge.outcomes[1],
            Err(AcquisitionError::Location(LocationError::InvalidZoom(0)))
        ));
        assert_eq!(challenge.degraded_cells(), vec![1]);
        assert_eq!(*challenge.image.get_pixel(0, 0), Rgb([255, 0, 0]));
        assert_eq!(*challenge.image.get_pixel(25, 5), Rgb([0, 0, 0]));
        assert_eq!(*challenge.image.get_pixel(5, 17), Rgb([0, 0, 255]));
        assert_eq!(*challenge.image.get_pixel(25, 17), Rgb([255, 255, 0]));
    }

    #[tokio::test]
    async fn test_rejected_location_does_not_size_cells() {
        let mut locations = locations();
        locations[3].params.zoom = 0;
        locations[3].params.output = Resolution {
            width: 4000,
            height: 3000,
        };
        assert_eq!(cell_size(&locations), CELL);

        let challenge = compositor(None).compose(&locations).await;
        assert_eq!(challenge.cell, CELL);
        assert_eq!(challenge.image.dimensions(), (40, 24));
        assert_eq!(challenge.degraded_cells(), vec![3]);
    }

    #[tokio::test]
    async fn test_empty_challenge() {
        let challenge = compositor(None).compose(&[]).await;
        assert_eq!(challenge.image.dimensions(), (0, 0));
        assert!(challenge.outcomes.is_empty());
    }
}
