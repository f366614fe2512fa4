//! Compositing of fetched tiles into one equirectangular panorama.
//!
//! Tiles are pasted at `(x * tile_size, y * tile_size)` on a black canvas, so a
//! missing tile simply leaves its region black. Some panoramas are served with
//! their populated area shrunk to `alt_tile_size` per tile and black padding to the
//! right and bottom; [`crop_border_artifact`] removes that padding.

use image::{imageops, Rgb, RgbImage};
use log::debug;

use crate::fetch::FetchedTiles;
use crate::location::{AcquisitionParams, LocationError, TileGrid};

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Builds equirectangular panoramas from tile grids.
#[derive(Debug, Clone)]
pub struct PanoramaAssembler {
    tile_size: u32,
    alt_tile_size: u32,
}

impl PanoramaAssembler {
    pub fn new(tile_size: u32, alt_tile_size: u32) -> Result<Self, LocationError> {
        if tile_size == 0 {
            return Err(LocationError::TileSizeMustBePositive);
        }
        if alt_tile_size == 0 || alt_tile_size > tile_size {
            return Err(LocationError::InvalidAltTileSize {
                tile_size,
                alt_tile_size,
            });
        }
        Ok(Self {
            tile_size,
            alt_tile_size,
        })
    }

    pub fn from_params(params: &AcquisitionParams) -> Result<Self, LocationError> {
        Self::new(params.tile_size, params.alt_tile_size)
    }

    /// Pastes every fetched tile into a canvas of the full grid size.
    pub fn assemble(&self, tiles: &FetchedTiles) -> Result<RgbImage, LocationError> {
        let size = tiles.grid.panorama_size(self.tile_size)?;
        let mut canvas = RgbImage::from_pixel(size.width, size.height, BLACK);

        for (coord, outcome) in &tiles.tiles {
            if let Some(tile) = outcome.image() {
                imageops::replace(
                    &mut canvas,
                    tile,
                    i64::from(coord.x) * i64::from(self.tile_size),
                    i64::from(coord.y) * i64::from(self.tile_size),
                );
            }
        }

        Ok(canvas)
    }

    /// Assembles the grid and removes the border artifact when present.
    pub fn assemble_and_crop(&self, tiles: &FetchedTiles) -> Result<RgbImage, LocationError> {
        let canvas = self.assemble(tiles)?;
        Ok(crop_border_artifact(canvas, tiles.grid, self.alt_tile_size))
    }
}

/// Returns true when the whole bottom row and the whole right column are exactly black.
pub fn has_border_artifact(image: &RgbImage) -> bool {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return false;
    }

    let bottom_black = (0..width).all(|x| *image.get_pixel(x, height - 1) == BLACK);
    let right_black = (0..height).all(|y| *image.get_pixel(width - 1, y) == BLACK);
    bottom_black && right_black
}

/// Crops to `alt_tile_size * tiles_x` by `alt_tile_size * tiles_y` from the top-left
/// corner if the border artifact is detected. Otherwise the image is returned untouched.
pub fn crop_border_artifact(image: RgbImage, grid: TileGrid, alt_tile_size: u32) -> RgbImage {
    if !has_border_artifact(&image) {
        debug!("No border artifact, keeping {}x{}", image.width(), image.height());
        return image;
    }

    let width = alt_tile_size.saturating_mul(grid.tiles_x).min(image.width());
    let height = alt_tile_size.saturating_mul(grid.tiles_y).min(image.height());
    debug!(
        "Border artifact detected, cropping {}x{} to {}x{}",
        image.width(),
        image.height(),
        width,
        height
    );
    imageops::crop_imm(&image, 0, 0, width, height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{TileFetchError, TileOutcome};
    use crate::location::TileCoord;

    fn solid_grid(grid: TileGrid, tile_size: u32, color: Rgb<u8>) -> FetchedTiles {
        FetchedTiles {
            grid,
            tiles: grid
                .coords()
                .map(|coord| {
                    (
                        coord,
                        TileOutcome::Fetched(RgbImage::from_pixel(tile_size, tile_size, color)),
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn test_assemble_places_tiles() {
        let grid = TileGrid::for_zoom(1).unwrap();
        let tiles = FetchedTiles {
            grid,
            tiles: vec![
                (
                    TileCoord { x: 0, y: 0 },
                    TileOutcome::Fetched(RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]))),
                ),
                (
                    TileCoord { x: 1, y: 0 },
                    TileOutcome::Fetched(RgbImage::from_pixel(4, 4, Rgb([0, 255, 0]))),
                ),
            ],
        };
        let assembler = PanoramaAssembler::new(4, 3).unwrap();
        let image = assembler.assemble(&tiles).unwrap();

        assert_eq!(image.dimensions(), (8, 4));
        assert_eq!(*image.get_pixel(0, 0), Rgb([255, 0, 0]));
        assert_eq!(*image.get_pixel(3, 3), Rgb([255, 0, 0]));
        assert_eq!(*image.get_pixel(4, 0), Rgb([0, 255, 0]));
        assert_eq!(*image.get_pixel(7, 3), Rgb([0, 255, 0]));
    }

    #[test]
    fn test_missing_tiles_stay_black() {
        let grid = TileGrid::for_zoom(2).unwrap();
        let mut tiles = solid_grid(grid, 4, Rgb([10, 20, 30]));
        for (coord, outcome) in tiles.tiles.iter_mut() {
            if coord.x == 1 && coord.y == 0 {
                *outcome = TileOutcome::Missing(TileFetchError::Status(500));
            }
        }
        let assembler = PanoramaAssembler::new(4, 4).unwrap();
        let image = assembler.assemble(&tiles).unwrap();

        assert_eq!(image.dimensions(), (16, 8));
        assert_eq!(*image.get_pixel(5, 2), BLACK);
        assert_eq!(*image.get_pixel(1, 2), Rgb([10, 20, 30]));
        assert_eq!(*image.get_pixel(9, 6), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_full_image_is_kept() {
        let grid = TileGrid::for_zoom(2).unwrap();
        let assembler = PanoramaAssembler::new(8, 6).unwrap();
        let image = assembler
            .assemble_and_crop(&solid_grid(grid, 8, Rgb([1, 1, 1])))
            .unwrap();
        assert_eq!(image.dimensions(), (32, 16));
    }

    #[test]
    fn test_border_artifact_is_cropped() {
        let grid = TileGrid::for_zoom(2).unwrap();
        let mut image = RgbImage::from_pixel(32, 16, BLACK);
        for y in 0..12 {
            for x in 0..24 {
                image.put_pixel(x, y, Rgb([50, 60, 70]));
            }
        }
        assert!(has_border_artifact(&image));

        let cropped = crop_border_artifact(image, grid, 6);
        assert_eq!(cropped.dimensions(), (24, 12));
        assert_eq!(*cropped.get_pixel(23, 11), Rgb([50, 60, 70]));
    }

    #[test]
    fn test_single_lit_pixel_disqualifies_crop() {
        let grid = TileGrid::for_zoom(2).unwrap();
        let mut image = RgbImage::from_pixel(32, 16, BLACK);
        image.put_pixel(0, 15, Rgb([0, 0, 1]));
        assert!(!has_border_artifact(&image));
        assert_eq!(crop_border_artifact(image, grid, 6).dimensions(), (32, 16));

        let mut image = RgbImage::from_pixel(32, 16, BLACK);
        image.put_pixel(31, 0, Rgb([1, 0, 0]));
        assert!(!has_border_artifact(&image));
        assert_eq!(crop_border_artifact(image, grid, 6).dimensions(), (32, 16));
    }

    #[test]
    fn test_all_missing_yields_black_cropped_panorama() {
        let grid = TileGrid::for_zoom(3).unwrap();
        let tiles = FetchedTiles {
            grid,
            tiles: grid
                .coords()
                .map(|coord| (coord, TileOutcome::Missing(TileFetchError::Timeout)))
                .collect(),
        };
        let assembler = PanoramaAssembler::new(16, 13).unwrap();
        let image = assembler.assemble_and_crop(&tiles).unwrap();

        assert_eq!(image.dimensions(), (13 * 8, 13 * 4));
        assert!(image.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn test_oversized_canvas_is_an_error() {
        let grid = TileGrid::for_zoom(10).unwrap();
        let assembler = PanoramaAssembler::new(1 << 23, 1).unwrap();
        let tiles = FetchedTiles {
            grid,
            tiles: vec![],
        };
        assert!(matches!(
            assembler.assemble(&tiles),
            Err(LocationError::PanoramaTooLarge { .. })
        ));
        assert!(assembler.assemble_and_crop(&tiles).is_err());
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(PanoramaAssembler::new(0, 0).is_err());
        assert!(PanoramaAssembler::new(512, 600).is_err());
        assert!(PanoramaAssembler::from_params(&AcquisitionParams::default()).is_ok());
    }
}
