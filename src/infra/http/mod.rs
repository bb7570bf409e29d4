//! HTTP surface: the interaction webhook and a liveness probe.

mod interactions;
mod verify;

pub use verify::SignatureVerifier;

use std::sync::Arc;

use axum::{Router, middleware, routing::get, routing::post};

use crate::application::image::QuoteImageService;

use super::discord::DiscordClient;

/// Shared state for the webhook handlers.
#[derive(Clone)]
pub struct AppState {
    pub discord: Arc<DiscordClient>,
    pub quotes: Arc<QuoteImageService>,
    pub verifier: Arc<SignatureVerifier>,
    pub guild_id: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(healthcheck))
        .route(
            "/interactions",
            post(interactions::handle).layer(middleware::from_fn_with_state(
                state.clone(),
                verify::verify_signature,
            )),
        )
        .with_state(state)
}

async fn healthcheck() -> &'static str {
    "Hello, World!"
}
