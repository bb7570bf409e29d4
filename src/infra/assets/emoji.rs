//! Custom-emoji loader with a process-wide cache, and the generic-emoji
//! resolver used by the compositor's pictographic pre-scan.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use metrics::counter;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::warn;
use url::Url;

use crate::application::image::{FetchError, GenericEmojiResolver};
use crate::application::render::types::{BoxedError, EmojiSource};
use crate::domain::emoji::icon_key;

use super::data_uri;

const METRIC_CACHE_HIT: &str = "meigen_emoji_cache_hit_total";
const METRIC_CACHE_MISS: &str = "meigen_emoji_cache_miss_total";
const METRIC_ANIMATED_FALLBACK: &str = "meigen_emoji_animated_fallback_total";

/// Process-wide cache of resolved custom-emoji data URIs.
///
/// An explicit object, passed by reference into the orchestration layer, so
/// tests and concurrent instances control its lifetime. Two requests racing
/// on the same missing key may both fetch and both store the same value;
/// the write is idempotent, so the waste is bounded.
#[derive(Default)]
pub struct EmojiCache {
    entries: DashMap<String, String>,
}

impl EmojiCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn insert(&self, key: String, value: String) {
        self.entries.insert(key, value);
    }
}

/// Cache key: emoji id plus a single animation-flag character.
fn cache_key(id: &str, animated: bool) -> String {
    format!("{id}:{}", if animated { 'a' } else { 's' })
}

/// Loads custom-emoji images from the platform CDN.
///
/// A requested animated emoji that fails to fetch falls back exactly once
/// to its static form before failing.
pub struct DiscordEmojiLoader {
    client: Client,
    cdn_base: Url,
    cache: Arc<EmojiCache>,
}

impl DiscordEmojiLoader {
    pub fn new(client: Client, cdn_base: Url, cache: Arc<EmojiCache>) -> Self {
        Self {
            client,
            cdn_base,
            cache,
        }
    }

    async fn load(&self, id: &str, animated: bool) -> Result<String, FetchError> {
        let key = cache_key(id, animated);
        if let Some(hit) = self.cache.get(&key) {
            counter!(METRIC_CACHE_HIT).increment(1);
            return Ok(hit);
        }
        counter!(METRIC_CACHE_MISS).increment(1);

        let source = if animated {
            match self.fetch_asset(id, true).await {
                Ok(source) => source,
                Err(error) => {
                    counter!(METRIC_ANIMATED_FALLBACK).increment(1);
                    warn!(
                        target = "meigen::assets::emoji",
                        emoji_id = id,
                        error = %error,
                        "animated emoji fetch failed; retrying with the static asset"
                    );
                    self.fetch_asset(id, false).await?
                }
            }
        } else {
            self.fetch_asset(id, false).await?
        };

        self.cache.insert(key, source.clone());
        Ok(source)
    }

    async fn fetch_asset(&self, id: &str, animated: bool) -> Result<String, FetchError> {
        let extension = if animated { "gif" } else { "png" };
        let fallback_type = if animated { "image/gif" } else { "image/png" };
        let url = self
            .cdn_base
            .join(&format!("emojis/{id}.{extension}"))
            .map_err(|err| FetchError::request(self.cdn_base.as_str(), err.to_string()))?;
        fetch_as_data_uri(&self.client, url, fallback_type).await
    }
}

#[async_trait]
impl EmojiSource for DiscordEmojiLoader {
    async fn load_custom_emoji(&self, id: &str, animated: bool) -> Result<String, BoxedError> {
        self.load(id, animated).await.map_err(Into::into)
    }
}

/// Resolves generic pictographic emoji against a Twemoji-style CDN keyed by
/// hyphen-joined code points.
pub struct TwemojiResolver {
    client: Client,
    cdn_base: Url,
}

impl TwemojiResolver {
    pub fn new(client: Client, cdn_base: Url) -> Self {
        Self { client, cdn_base }
    }
}

#[async_trait]
impl GenericEmojiResolver for TwemojiResolver {
    async fn resolve(&self, segment: &str) -> Result<String, FetchError> {
        let key = icon_key(segment);
        let url = self
            .cdn_base
            .join(&format!("svg/{key}.svg"))
            .map_err(|err| FetchError::request(self.cdn_base.as_str(), err.to_string()))?;
        fetch_as_data_uri(&self.client, url, "image/svg+xml").await
    }
}

async fn fetch_as_data_uri(
    client: &Client,
    url: Url,
    fallback_content_type: &str,
) -> Result<String, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|err| FetchError::request(url.as_str(), err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::status(url.as_str(), status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(fallback_content_type)
        .to_string();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| FetchError::request(url.as_str(), err.to_string()))?;

    Ok(data_uri(&content_type, &bytes))
}
