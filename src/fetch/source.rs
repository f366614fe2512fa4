//! Transports that deliver raw tile payloads.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;

use crate::fetch::TileFetchError;
use crate::location::TileCoord;

/// Default tile endpoint. `{pano_id}`, `{x}`, `{y}` and `{zoom}` are substituted per tile.
pub const DEFAULT_TILE_URL: &str =
    "https://cbk0.google.com/cbk?output=tile&panoid={pano_id}&x={x}&y={y}&zoom={zoom}";

/// Delivers the encoded image payload of one tile.
#[async_trait]
pub trait TileSource: Send + Sync {
    async fn fetch_tile(
        &self,
        pano_id: &str,
        coord: TileCoord,
        zoom: u32,
    ) -> Result<Bytes, TileFetchError>;
}

/// Expands a tile URL template.
pub fn tile_url(template: &str, pano_id: &str, coord: TileCoord, zoom: u32) -> String {
    template
        .replace("{pano_id}", pano_id)
        .replace("{x}", &coord.x.to_string())
        .replace("{y}", &coord.y.to_string())
        .replace("{zoom}", &zoom.to_string())
}

/// Fetches tiles over HTTPS with a shared connection pool.
#[derive(Debug, Clone)]
pub struct HttpTileSource {
    client: Client,
    url_template: String,
}

impl HttpTileSource {
    pub fn new(url_template: impl Into<String>, request_timeout: Duration) -> Result<Self, TileFetchError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(request_timeout)
            .https_only(true)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| TileFetchError::Request(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url_template: url_template.into(),
        })
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }
}

#[async_trait]
impl TileSource for HttpTileSource {
    async fn fetch_tile(
        &self,
        pano_id: &str,
        coord: TileCoord,
        zoom: u32,
    ) -> Result<Bytes, TileFetchError> {
        let url = tile_url(&self.url_template, pano_id, coord, zoom);
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                TileFetchError::Timeout
            } else {
                TileFetchError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TileFetchError::Status(status.as_u16()));
        }

        response
            .bytes()
            .await
            .map_err(|e| TileFetchError::Request(e.to_string()))
    }
}
