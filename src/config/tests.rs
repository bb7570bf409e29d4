use clap::Parser;

use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_cover_endpoints_canvas_and_typography() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.assets.primary_family, "Noto Sans JP");
    assert_eq!(settings.assets.code_family, "Noto Sans Mono");
    assert_eq!(settings.assets.regular_weight, 400);
    assert_eq!(settings.assets.bold_weight, 700);
    assert_eq!(settings.layout.canvas_width, 1200);
    assert_eq!(settings.layout.canvas_height, 630);
    assert_eq!(
        settings.discord.api_base.as_str(),
        "https://discord.com/api/v10/"
    );
    assert!(settings.discord.bot_token.is_none());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn invalid_log_level_is_a_load_error() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("shouting".to_string());

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid { key: "logging.level", .. })
    ));
}

#[test]
fn invalid_urls_are_load_errors() {
    let mut raw = RawSettings::default();
    raw.assets.emoji_cdn = Some("not a url".to_string());

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid { key: "assets.emoji_cdn", .. })
    ));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["meigen"]);
    assert!(args.command.is_none());
}

#[test]
fn parse_serve_arguments() {
    let args = CliArgs::parse_from([
        "meigen",
        "serve",
        "--server-port",
        "8080",
        "--layout-cli-path",
        "/opt/layout/bin/engine",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_port, Some(8080));
            assert_eq!(
                serve.overrides.layout_cli_path.as_deref(),
                Some(std::path::Path::new("/opt/layout/bin/engine"))
            );
        }
    }
}
