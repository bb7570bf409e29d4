//! Compositor inputs, asset-resolver seams and the layout-engine contract.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::application::render::types::{RenderError, VisualNode};

/// One quote-card generation request. Created per interaction, consumed
/// synchronously, never persisted.
#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub icon_url: String,
    pub text: String,
    pub name: String,
    pub handle: String,
    pub mention_names: HashMap<String, String>,
}

/// Upstream asset retrieval failure. Always fatal for the request; the
/// single animated→static emoji fallback is the only built-in retry.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to `{url}` failed: {message}")]
    Request { url: String, message: String },
    #[error("`{url}` returned status {status}")]
    Status { url: String, status: u16 },
    #[error("font manifest contained no usable font reference")]
    FontManifest,
}

impl FetchError {
    pub fn request(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }
}

/// Fetches the avatar icon and re-encodes it as a data URI tagged with the
/// response's content type.
#[async_trait]
pub trait IconFetcher: Send + Sync {
    async fn fetch_data_uri(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches a font resource scoped to the characters present in `seed`.
#[async_trait]
pub trait FontProvider: Send + Sync {
    async fn fetch_subset(&self, seed: &str, family: &str, weight: u16)
    -> Result<Bytes, FetchError>;
}

/// Resolves a pictographic grapheme cluster to an image source.
#[async_trait]
pub trait GenericEmojiResolver: Send + Sync {
    async fn resolve(&self, segment: &str) -> Result<String, FetchError>;
}

/// A fetched font ready for embedding.
#[derive(Debug, Clone)]
pub struct FontResource {
    pub family: String,
    pub weight: u16,
    pub data: Bytes,
}

/// Embedded font as it appears in the engine payload.
#[derive(Debug, Serialize)]
pub struct FontSpec<'a> {
    pub family: &'a str,
    pub weight: u16,
    /// Raw font bytes, base64-encoded for transport.
    pub data: String,
}

impl<'a> FontSpec<'a> {
    pub fn from_resource(resource: &'a FontResource) -> Self {
        Self {
            family: &resource.family,
            weight: resource.weight,
            data: STANDARD.encode(&resource.data),
        }
    }
}

/// The layout engine's input contract.
///
/// The engine receives the fixed canvas, the embedded fonts, an asset table
/// mapping pictographic grapheme clusters to pre-resolved image sources
/// (any asset reference not in the table passes through unchanged) and the
/// styled tree. It answers with an SVG rendition of the laid-out document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPayload<'a> {
    pub width: u32,
    pub height: u32,
    pub fonts: Vec<FontSpec<'a>>,
    pub assets: BTreeMap<String, String>,
    pub root: &'a VisualNode,
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout engine unavailable: {0}")]
    Unavailable(String),
    #[error("layout engine failed: {0}")]
    Engine(String),
}

/// External layout backend, consumed as a black box.
#[async_trait]
pub trait LayoutEngine: Send + Sync {
    async fn layout(&self, payload: &LayoutPayload<'_>) -> Result<String, LayoutError>;
}

/// Failure of the whole composition. No partial image is ever surfaced.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("failed to rasterize layout output: {message}")]
    Raster { message: String },
}
