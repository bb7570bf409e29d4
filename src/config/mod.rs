//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "meigen";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10/";
const DEFAULT_DISCORD_CDN_BASE: &str = "https://cdn.discordapp.com/";
const DEFAULT_FONT_CSS_URL: &str = "https://fonts.googleapis.com/css2";
const DEFAULT_PRIMARY_FAMILY: &str = "Noto Sans JP";
const DEFAULT_CODE_FAMILY: &str = "Noto Sans Mono";
const DEFAULT_REGULAR_WEIGHT: u16 = 400;
const DEFAULT_BOLD_WEIGHT: u16 = 700;
const DEFAULT_EMOJI_CDN: &str = "https://cdn.discordapp.com/";
const DEFAULT_TWEMOJI_CDN: &str = "https://cdn.jsdelivr.net/gh/jdecked/twemoji@latest/assets/";
const DEFAULT_LAYOUT_CLI_PATH: &str = "meigen-layout";
const DEFAULT_CANVAS_WIDTH: u32 = 1200;
const DEFAULT_CANVAS_HEIGHT: u32 = 630;

/// Command-line arguments for the meigen binary.
#[derive(Debug, Parser)]
#[command(name = "meigen", version, about = "meigen quote-card bot server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MEIGEN_CONFIG_FILE", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the interaction webhook server.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the layout engine executable path.
    #[arg(long = "layout-cli-path", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub layout_cli_path: Option<PathBuf>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub discord: DiscordSettings,
    pub assets: AssetSettings,
    pub layout: LayoutSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DiscordSettings {
    /// Bot token; required to serve, absent in offline tooling contexts.
    pub bot_token: Option<String>,
    /// Application public key (hex) used to verify webhook signatures.
    pub public_key: Option<String>,
    /// The guild whose members are quoted.
    pub guild_id: Option<String>,
    pub api_base: Url,
    pub cdn_base: Url,
}

#[derive(Debug, Clone)]
pub struct AssetSettings {
    pub font_css_url: Url,
    pub primary_family: String,
    pub code_family: String,
    pub regular_weight: u16,
    pub bold_weight: u16,
    pub emoji_cdn: Url,
    pub twemoji_cdn: Url,
}

#[derive(Debug, Clone)]
pub struct LayoutSettings {
    pub cli_path: PathBuf,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("MEIGEN").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Parse the process arguments and load settings in one step.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    discord: RawDiscordSettings,
    assets: RawAssetSettings,
    layout: RawLayoutSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDiscordSettings {
    bot_token: Option<String>,
    public_key: Option<String>,
    guild_id: Option<String>,
    api_base: Option<String>,
    cdn_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAssetSettings {
    font_css_url: Option<String>,
    primary_family: Option<String>,
    code_family: Option<String>,
    regular_weight: Option<u16>,
    bold_weight: Option<u16>,
    emoji_cdn: Option<String>,
    twemoji_cdn: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLayoutSettings {
    cli_path: Option<PathBuf>,
    canvas_width: Option<u32>,
    canvas_height: Option<u32>,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(path) = overrides.layout_cli_path.as_ref() {
            self.layout.cli_path = Some(path.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let host = raw.server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = raw.server.port.unwrap_or(DEFAULT_PORT);
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|err| LoadError::invalid("server.host", format!("{err}")))?;

        let level = match raw.logging.level {
            Some(level) => LevelFilter::from_str(&level)
                .map_err(|err| LoadError::invalid("logging.level", err.to_string()))?,
            None => LevelFilter::INFO,
        };
        let format = if raw.logging.json.unwrap_or(false) {
            LogFormat::Json
        } else {
            LogFormat::Compact
        };

        let discord = DiscordSettings {
            bot_token: raw.discord.bot_token,
            public_key: raw.discord.public_key,
            guild_id: raw.discord.guild_id,
            api_base: parse_url("discord.api_base", raw.discord.api_base, DEFAULT_DISCORD_API_BASE)?,
            cdn_base: parse_url("discord.cdn_base", raw.discord.cdn_base, DEFAULT_DISCORD_CDN_BASE)?,
        };

        let assets = AssetSettings {
            font_css_url: parse_url("assets.font_css_url", raw.assets.font_css_url, DEFAULT_FONT_CSS_URL)?,
            primary_family: raw
                .assets
                .primary_family
                .unwrap_or_else(|| DEFAULT_PRIMARY_FAMILY.to_string()),
            code_family: raw
                .assets
                .code_family
                .unwrap_or_else(|| DEFAULT_CODE_FAMILY.to_string()),
            regular_weight: raw.assets.regular_weight.unwrap_or(DEFAULT_REGULAR_WEIGHT),
            bold_weight: raw.assets.bold_weight.unwrap_or(DEFAULT_BOLD_WEIGHT),
            emoji_cdn: parse_url("assets.emoji_cdn", raw.assets.emoji_cdn, DEFAULT_EMOJI_CDN)?,
            twemoji_cdn: parse_url("assets.twemoji_cdn", raw.assets.twemoji_cdn, DEFAULT_TWEMOJI_CDN)?,
        };

        let layout = LayoutSettings {
            cli_path: raw
                .layout
                .cli_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LAYOUT_CLI_PATH)),
            canvas_width: raw.layout.canvas_width.unwrap_or(DEFAULT_CANVAS_WIDTH),
            canvas_height: raw.layout.canvas_height.unwrap_or(DEFAULT_CANVAS_HEIGHT),
        };

        Ok(Self {
            server: ServerSettings { addr },
            logging: LoggingSettings { level, format },
            discord,
            assets,
            layout,
        })
    }
}

fn parse_url(key: &'static str, value: Option<String>, default: &str) -> Result<Url, LoadError> {
    let raw_value = value.unwrap_or_else(|| default.to_string());
    Url::parse(&raw_value).map_err(|err| LoadError::invalid(key, err.to_string()))
}

#[cfg(test)]
mod tests;
