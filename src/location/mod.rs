//! Panorama locations and the fixed parameters used to acquire them.
//!
//! A [`PanoramaLocation`] is built from one record of the location data set and
//! carries an [`AcquisitionParams`] describing how its panorama is fetched and
//! rendered. The tile layout of a zoom level is described by a [`TileGrid`].

use serde::{Deserialize, Serialize};

use crate::camera::Resolution;

/// Largest zoom level whose tile counts fit comfortably in `u32` pixel sizes.
pub const MAX_ZOOM: u32 = 10;

/// Upper bound on the pixel count of an assembled panorama.
pub const MAX_PANORAMA_PIXELS: u64 = 1 << 28;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("Zoom level must be in 1..={max}, got {0}", max = MAX_ZOOM)]
    InvalidZoom(u32),
    #[error("Tile size must be positive")]
    TileSizeMustBePositive,
    #[error("Alternate tile size must be in 1..={tile_size}, got {alt_tile_size}")]
    InvalidAltTileSize { tile_size: u32, alt_tile_size: u32 },
    #[error("Field of view must be in (0, 180) degrees, got {0}")]
    InvalidFov(f64),
    #[error("Output resolution must be non-empty, got {width}x{height}")]
    InvalidOutputResolution { width: u32, height: u32 },
    #[error("Panorama of {tiles_x}x{tiles_y} tiles of {tile_size}px exceeds {max} pixels", max = MAX_PANORAMA_PIXELS)]
    PanoramaTooLarge {
        tile_size: u32,
        tiles_x: u32,
        tiles_y: u32,
    },
}

/// Parameters shared by every acquisition: tile layout and view rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionParams {
    pub zoom: u32,
    /// Edge length of one served tile, in pixels.
    pub tile_size: u32,
    /// Edge length of the populated part of a tile when the server pads the panorama
    /// with a black border.
    pub alt_tile_size: u32,
    /// Horizontal field of view of the rendered view, in degrees.
    pub fov: f64,
    pub output: Resolution,
}

impl Default for AcquisitionParams {
    fn default() -> Self {
        Self {
            zoom: 3,
            tile_size: 512,
            alt_tile_size: 416,
            fov: 110.0,
            output: Resolution {
                width: 960,
                height: 540,
            },
        }
    }
}

impl AcquisitionParams {
    pub fn validate(&self) -> Result<(), LocationError> {
        if self.zoom == 0 || self.zoom > MAX_ZOOM {
            return Err(LocationError::InvalidZoom(self.zoom));
        }
        if self.tile_size == 0 {
            return Err(LocationError::TileSizeMustBePositive);
        }
        self.grid()?.panorama_size(self.tile_size)?;
        if self.alt_tile_size == 0 || self.alt_tile_size > self.tile_size {
            return Err(LocationError::InvalidAltTileSize {
                tile_size: self.tile_size,
                alt_tile_size: self.alt_tile_size,
            });
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(LocationError::InvalidFov(self.fov));
        }
        if self.output.width == 0 || self.output.height == 0 {
            return Err(LocationError::InvalidOutputResolution {
                width: self.output.width,
                height: self.output.height,
            });
        }
        Ok(())
    }

    /// Tile grid of this zoom level.
    pub fn grid(&self) -> Result<TileGrid, LocationError> {
        TileGrid::for_zoom(self.zoom)
    }
}

/// Grid coordinate of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

/// Index space `[0, tiles_x) x [0, tiles_y)` of the tiles of one panorama.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub tiles_x: u32,
    pub tiles_y: u32,
}

impl TileGrid {
    /// `tiles_x = 2^zoom`, `tiles_y = 2^(zoom - 1)`.
    pub fn for_zoom(zoom: u32) -> Result<Self, LocationError> {
        if zoom == 0 || zoom > MAX_ZOOM {
            return Err(LocationError::InvalidZoom(zoom));
        }
        Ok(TileGrid {
            tiles_x: 1 << zoom,
            tiles_y: 1 << (zoom - 1),
        })
    }

    /// Pixel size of the assembled panorama for `tile_size` pixel tiles.
    pub fn panorama_size(&self, tile_size: u32) -> Result<Resolution, LocationError> {
        let too_large = || LocationError::PanoramaTooLarge {
            tile_size,
            tiles_x: self.tiles_x,
            tiles_y: self.tiles_y,
        };
        let width = tile_size.checked_mul(self.tiles_x).ok_or_else(too_large)?;
        let height = tile_size.checked_mul(self.tiles_y).ok_or_else(too_large)?;
        if u64::from(width) * u64::from(height) > MAX_PANORAMA_PIXELS {
            return Err(too_large());
        }
        Ok(Resolution { width, height })
    }

    pub fn len(&self) -> usize {
        self.tiles_x as usize * self.tiles_y as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All coordinates, column by column.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> {
        let tiles_y = self.tiles_y;
        (0..self.tiles_x).flat_map(move |x| (0..tiles_y).map(move |y| TileCoord { x, y }))
    }
}

fn default_country_code() -> String {
    "us".to_string()
}

fn default_country_name() -> String {
    "United States".to_string()
}

/// One panorama of the location data set.
///
/// The serialized field names follow the data set records
/// (`lat`, `lng`, `panoId`, `heading`, `pitch`, `countryCode`, `countryName`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanoramaLocation {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    #[serde(rename = "panoId")]
    pub pano_id: String,
    #[serde(default)]
    pub heading: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(rename = "countryCode", default = "default_country_code")]
    pub country_code: String,
    #[serde(rename = "countryName", default = "default_country_name")]
    pub country_name: String,
    #[serde(skip)]
    pub params: AcquisitionParams,
}

impl PanoramaLocation {
    pub fn new(latitude: f64, longitude: f64, pano_id: impl Into<String>) -> Self {
        PanoramaLocation {
            latitude,
            longitude,
            pano_id: pano_id.into(),
            heading: 0.0,
            pitch: 0.0,
            country_code: default_country_code(),
            country_name: default_country_name(),
            params: AcquisitionParams::default(),
        }
    }

    pub fn with_view(mut self, heading: f64, pitch: f64) -> Self {
        self.heading = heading;
        self.pitch = pitch;
        self
    }

    pub fn with_params(mut self, params: AcquisitionParams) -> Self {
        self.params = params;
        self
    }

    /// Parses a single data set record.
    pub fn from_json(record: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(record)
    }

    pub fn grid(&self) -> Result<TileGrid, LocationError> {
        self.params.grid()
    }

    /// Link that opens this panorama in the public map viewer.
    pub fn maps_link(&self) -> String {
        format!(
            "https://www.google.com/maps?q&layer=c&cbll={},{}&cbp=0,{},0,0,{}",
            self.latitude, self.longitude, self.heading, self.pitch
        )
    }
}
