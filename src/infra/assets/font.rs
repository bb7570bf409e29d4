//! Font subset fetcher.
//!
//! The font service answers a CSS manifest for `{family, weight, text}`;
//! scoping the request to the characters that will actually be painted
//! keeps the transferred font small. Exactly one parsable font-resource
//! reference is expected in the manifest.

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use url::Url;

use crate::application::image::{FetchError, FontProvider};

/// Legacy user agent: the font service serves plain TrueType/OpenType CSS
/// only to browsers it does not recognise as WOFF2-capable.
const FONT_PROBE_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10_6_8; de-at) \
     AppleWebKit/533.21.1 (KHTML, like Gecko) Version/5.0.5 Safari/533.21.1";

static FONT_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"src: url\((?P<url>[^)]+)\) format\('(?:opentype|truetype)'\)")
        .expect("font src pattern")
});

pub struct SubsetFontProvider {
    client: Client,
    css_endpoint: Url,
}

impl SubsetFontProvider {
    pub fn new(client: Client, css_endpoint: Url) -> Self {
        Self {
            client,
            css_endpoint,
        }
    }
}

#[async_trait]
impl FontProvider for SubsetFontProvider {
    async fn fetch_subset(
        &self,
        seed: &str,
        family: &str,
        weight: u16,
    ) -> Result<Bytes, FetchError> {
        let mut manifest_url = self.css_endpoint.clone();
        manifest_url
            .query_pairs_mut()
            .append_pair("family", &format!("{family}:wght@{weight}"))
            .append_pair("text", seed);

        let response = self
            .client
            .get(manifest_url.clone())
            .header(USER_AGENT, FONT_PROBE_USER_AGENT)
            .send()
            .await
            .map_err(|err| FetchError::request(manifest_url.as_str(), err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(manifest_url.as_str(), status.as_u16()));
        }
        let manifest = response
            .text()
            .await
            .map_err(|err| FetchError::request(manifest_url.as_str(), err.to_string()))?;

        let font_url = extract_font_url(&manifest).ok_or(FetchError::FontManifest)?;

        let font_response = self
            .client
            .get(font_url)
            .send()
            .await
            .map_err(|err| FetchError::request(font_url, err.to_string()))?;
        let status = font_response.status();
        if !status.is_success() {
            return Err(FetchError::status(font_url, status.as_u16()));
        }
        font_response
            .bytes()
            .await
            .map_err(|err| FetchError::request(font_url, err.to_string()))
    }
}

/// Extract the single font-resource reference from a CSS manifest.
pub(crate) fn extract_font_url(manifest: &str) -> Option<&str> {
    FONT_SRC
        .captures(manifest)
        .and_then(|caps| caps.name("url"))
        .map(|m| m.as_str())
}
