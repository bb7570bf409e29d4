use std::{process, sync::Arc};

use tokio::net::TcpListener;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

use meigen::{
    application::{
        error::AppError,
        image::{CardConfig, QuoteImageService},
    },
    config,
    infra::{
        assets::{
            DiscordEmojiLoader, EmojiCache, HttpIconFetcher, SubsetFontProvider, TwemojiResolver,
        },
        discord::DiscordClient,
        error::InfraError,
        http::{self, AppState, SignatureVerifier},
        layout::CliLayoutEngine,
        telemetry,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let state = build_state(&settings)?;
    serve(&settings, state).await
}

fn build_state(settings: &config::Settings) -> Result<AppState, AppError> {
    let bot_token = settings
        .discord
        .bot_token
        .clone()
        .ok_or_else(|| InfraError::configuration("discord bot token is not configured"))
        .map_err(AppError::from)?;
    let public_key = settings
        .discord
        .public_key
        .clone()
        .ok_or_else(|| InfraError::configuration("discord public key is not configured"))
        .map_err(AppError::from)?;
    let guild_id = settings
        .discord
        .guild_id
        .clone()
        .ok_or_else(|| InfraError::configuration("discord guild id is not configured"))
        .map_err(AppError::from)?;

    let client = reqwest::Client::builder()
        .user_agent(user_agent())
        .build()
        .map_err(|err| AppError::unexpected(format!("failed to build http client: {err}")))?;

    let emoji_cache = Arc::new(EmojiCache::new());
    let emoji = Arc::new(DiscordEmojiLoader::new(
        client.clone(),
        settings.assets.emoji_cdn.clone(),
        emoji_cache,
    ));
    let generic_emoji = Arc::new(TwemojiResolver::new(
        client.clone(),
        settings.assets.twemoji_cdn.clone(),
    ));
    let fonts = Arc::new(SubsetFontProvider::new(
        client.clone(),
        settings.assets.font_css_url.clone(),
    ));
    let icons = Arc::new(HttpIconFetcher::new(client.clone()));
    let engine = Arc::new(CliLayoutEngine::new(settings.layout.cli_path.clone()));

    let card = CardConfig {
        width: settings.layout.canvas_width,
        height: settings.layout.canvas_height,
        primary_family: settings.assets.primary_family.clone(),
        code_family: settings.assets.code_family.clone(),
        regular_weight: settings.assets.regular_weight,
        bold_weight: settings.assets.bold_weight,
    };
    let quotes = Arc::new(QuoteImageService::new(
        fonts,
        icons,
        emoji,
        generic_emoji,
        engine,
        card,
    ));

    let discord = Arc::new(DiscordClient::new(
        client,
        settings.discord.api_base.clone(),
        settings.discord.cdn_base.clone(),
        bot_token,
    ));
    let verifier = Arc::new(SignatureVerifier::from_hex(&public_key).map_err(AppError::from)?);

    Ok(AppState {
        discord,
        quotes,
        verifier,
        guild_id,
    })
}

async fn serve(settings: &config::Settings, state: AppState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "meigen::server",
        addr = %settings.server.addr,
        "interaction webhook listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

fn user_agent() -> &'static str {
    concat!("meigen/", env!("CARGO_PKG_VERSION"))
}
