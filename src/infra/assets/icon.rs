//! Avatar icon fetcher.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::application::image::{FetchError, IconFetcher};

use super::data_uri;

pub struct HttpIconFetcher {
    client: Client,
}

impl HttpIconFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IconFetcher for HttpIconFetcher {
    async fn fetch_data_uri(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| FetchError::request(url, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(url, status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| FetchError::request(url, err.to_string()))?;

        Ok(data_uri(&content_type, &bytes))
    }
}
