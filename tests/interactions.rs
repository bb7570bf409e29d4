//! Webhook surface tests: signature enforcement and the ping round trip.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header::CONTENT_TYPE};
use bytes::Bytes;
use ed25519_dalek::{Signer, SigningKey};
use tower::ServiceExt;
use url::Url;

use meigen::application::image::{
    CardConfig, FetchError, FontProvider, GenericEmojiResolver, IconFetcher, LayoutEngine,
    LayoutError, LayoutPayload, QuoteImageService,
};
use meigen::application::render::types::{BoxedError, EmojiSource};
use meigen::infra::discord::DiscordClient;
use meigen::infra::http::{AppState, SignatureVerifier, build_router};

struct UnreachableFonts;

#[async_trait]
impl FontProvider for UnreachableFonts {
    async fn fetch_subset(
        &self,
        _seed: &str,
        _family: &str,
        _weight: u16,
    ) -> Result<Bytes, FetchError> {
        panic!("fonts must not be fetched for this interaction");
    }
}

struct UnreachableIcon;

#[async_trait]
impl IconFetcher for UnreachableIcon {
    async fn fetch_data_uri(&self, _url: &str) -> Result<String, FetchError> {
        panic!("icons must not be fetched for this interaction");
    }
}

struct UnreachableEmoji;

#[async_trait]
impl EmojiSource for UnreachableEmoji {
    async fn load_custom_emoji(&self, _id: &str, _animated: bool) -> Result<String, BoxedError> {
        panic!("emoji must not be loaded for this interaction");
    }
}

#[async_trait]
impl GenericEmojiResolver for UnreachableEmoji {
    async fn resolve(&self, _segment: &str) -> Result<String, FetchError> {
        panic!("generic emoji must not be resolved for this interaction");
    }
}

struct UnreachableEngine;

#[async_trait]
impl LayoutEngine for UnreachableEngine {
    async fn layout(&self, _payload: &LayoutPayload<'_>) -> Result<String, LayoutError> {
        panic!("layout must not run for this interaction");
    }
}

fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[3u8; 32])
}

fn test_state() -> AppState {
    let client = reqwest::Client::new();
    let emoji = Arc::new(UnreachableEmoji);
    let quotes = Arc::new(QuoteImageService::new(
        Arc::new(UnreachableFonts),
        Arc::new(UnreachableIcon),
        emoji.clone(),
        emoji,
        Arc::new(UnreachableEngine),
        CardConfig::default(),
    ));
    let discord = Arc::new(DiscordClient::new(
        client,
        Url::parse("http://127.0.0.1:9/api/v10/").expect("api url"),
        Url::parse("http://127.0.0.1:9/cdn/").expect("cdn url"),
        "test-token",
    ));
    let verifier = Arc::new(
        SignatureVerifier::from_hex(&hex::encode(signing_key().verifying_key().as_bytes()))
            .expect("verifier from test key"),
    );

    AppState {
        discord,
        quotes,
        verifier,
        guild_id: "1".to_string(),
    }
}

fn signed_request(body: &str, timestamp: &str) -> Request<Body> {
    let mut message = timestamp.as_bytes().to_vec();
    message.extend_from_slice(body.as_bytes());
    let signature = hex::encode(signing_key().sign(&message).to_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/interactions")
        .header(CONTENT_TYPE, "application/json")
        .header("X-Signature-Ed25519", signature)
        .header("X-Signature-Timestamp", timestamp)
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn signed_ping_answers_pong() {
    let app = build_router(test_state());
    let response = app
        .oneshot(signed_request(r#"{"type":1,"application_id":"1","token":"t"}"#, "1700000000"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body reads");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(json, serde_json::json!({ "type": 1 }));
}

#[tokio::test]
async fn invalid_signature_is_unauthorized() {
    let app = build_router(test_state());
    let mut request = signed_request(r#"{"type":1,"application_id":"1","token":"t"}"#, "1700000000");
    request.headers_mut().insert(
        "X-Signature-Ed25519",
        hex::encode([0u8; 64]).parse().expect("header value"),
    );

    let response = app.oneshot(request).await.expect("router responds");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_signature_headers_are_a_bad_request() {
    let app = build_router(test_state());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/interactions")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"type":1}"#))
        .expect("request builds");

    let response = app.oneshot(request).await.expect("router responds");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn healthcheck_stays_open() {
    let app = build_router(test_state());
    let request = Request::builder()
        .method(Method::GET)
        .uri("/")
        .body(Body::empty())
        .expect("request builds");

    let response = app.oneshot(request).await.expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
}
