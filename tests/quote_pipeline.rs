//! End-to-end compositor tests with stubbed resolvers and a stubbed layout
//! engine; only the rasterizer runs for real.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use meigen::application::image::{
    CardConfig, ComposeError, FetchError, FontProvider, GenericEmojiResolver, IconFetcher,
    LayoutEngine, LayoutError, LayoutPayload, QuoteImageService, QuoteRequest,
};
use meigen::application::render::types::{BoxedError, EmojiSource};

const PNG_MAGIC: [u8; 4] = [0x89, b'P', b'N', b'G'];

const ENGINE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="1200" height="630">
    <rect x="0" y="0" width="120" height="63" fill="#123456"/>
</svg>"##;

#[derive(Default)]
struct RecordingFonts {
    requests: Mutex<Vec<(String, String, u16)>>,
}

#[async_trait]
impl FontProvider for RecordingFonts {
    async fn fetch_subset(
        &self,
        seed: &str,
        family: &str,
        weight: u16,
    ) -> Result<Bytes, FetchError> {
        self.requests
            .lock()
            .expect("font request log")
            .push((seed.to_string(), family.to_string(), weight));
        Ok(Bytes::new())
    }
}

struct StaticIcon;

#[async_trait]
impl IconFetcher for StaticIcon {
    async fn fetch_data_uri(&self, _url: &str) -> Result<String, FetchError> {
        Ok("data:image/png;base64,aWNvbg==".to_string())
    }
}

struct FailingIcon;

#[async_trait]
impl IconFetcher for FailingIcon {
    async fn fetch_data_uri(&self, url: &str) -> Result<String, FetchError> {
        Err(FetchError::status(url, 404))
    }
}

#[derive(Default)]
struct RecordingEmoji {
    calls: Mutex<Vec<(String, bool)>>,
}

#[async_trait]
impl EmojiSource for RecordingEmoji {
    async fn load_custom_emoji(&self, id: &str, animated: bool) -> Result<String, BoxedError> {
        self.calls
            .lock()
            .expect("emoji call log")
            .push((id.to_string(), animated));
        Ok(format!("data:image/png;base64,ZW1vamk={id}"))
    }
}

#[derive(Default)]
struct RecordingGenericEmoji {
    segments: Mutex<Vec<String>>,
}

#[async_trait]
impl GenericEmojiResolver for RecordingGenericEmoji {
    async fn resolve(&self, segment: &str) -> Result<String, FetchError> {
        self.segments
            .lock()
            .expect("segment log")
            .push(segment.to_string());
        Ok("data:image/svg+xml;base64,dHdlbW9qaQ==".to_string())
    }
}

#[derive(Default)]
struct RecordingEngine {
    payloads: Mutex<Vec<serde_json::Value>>,
}

#[async_trait]
impl LayoutEngine for RecordingEngine {
    async fn layout(&self, payload: &LayoutPayload<'_>) -> Result<String, LayoutError> {
        let value = serde_json::to_value(payload)
            .map_err(|err| LayoutError::Engine(err.to_string()))?;
        self.payloads.lock().expect("payload log").push(value);
        Ok(ENGINE_SVG.to_string())
    }
}

struct Fixture {
    fonts: Arc<RecordingFonts>,
    emoji: Arc<RecordingEmoji>,
    generic_emoji: Arc<RecordingGenericEmoji>,
    engine: Arc<RecordingEngine>,
    service: QuoteImageService,
}

fn fixture_with_icon(icons: Arc<dyn IconFetcher>) -> Fixture {
    let fonts = Arc::new(RecordingFonts::default());
    let emoji = Arc::new(RecordingEmoji::default());
    let generic_emoji = Arc::new(RecordingGenericEmoji::default());
    let engine = Arc::new(RecordingEngine::default());
    let service = QuoteImageService::new(
        fonts.clone(),
        icons,
        emoji.clone(),
        generic_emoji.clone(),
        engine.clone(),
        CardConfig::default(),
    );
    Fixture {
        fonts,
        emoji,
        generic_emoji,
        engine,
        service,
    }
}

fn fixture() -> Fixture {
    fixture_with_icon(Arc::new(StaticIcon))
}

fn request() -> QuoteRequest {
    QuoteRequest {
        icon_url: "https://cdn.example/avatar.png".to_string(),
        text: "hello <:wave:5> 😀 <@1>".to_string(),
        name: "Alice A.".to_string(),
        handle: "alice".to_string(),
        mention_names: HashMap::from([("1".to_string(), "Alice".to_string())]),
    }
}

#[tokio::test]
async fn generates_a_png_from_the_full_pipeline() {
    let fixture = fixture();
    let png = fixture
        .service
        .generate(&request())
        .await
        .expect("composition succeeds");
    assert!(png.starts_with(&PNG_MAGIC));
}

#[tokio::test]
async fn requests_three_font_subsets_scoped_to_the_text_seed() {
    let fixture = fixture();
    fixture
        .service
        .generate(&request())
        .await
        .expect("composition succeeds");

    let requests = fixture.fonts.requests.lock().expect("font request log").clone();
    let families: Vec<(String, u16)> = requests
        .iter()
        .map(|(_, family, weight)| (family.clone(), *weight))
        .collect();
    assert_eq!(
        families,
        vec![
            ("Noto Sans JP".to_string(), 400),
            ("Noto Sans JP".to_string(), 700),
            ("Noto Sans Mono".to_string(), 400),
        ]
    );

    for (seed, _, _) in &requests {
        assert!(seed.contains("hello"));
        assert!(seed.contains("Alice A."));
        assert!(seed.contains("alice"));
        assert!(seed.contains('@'));
        assert!(seed.contains("Alice"));
    }
}

#[tokio::test]
async fn engine_payload_carries_canvas_fonts_and_emoji_assets() {
    let fixture = fixture();
    fixture
        .service
        .generate(&request())
        .await
        .expect("composition succeeds");

    let payloads = fixture.engine.payloads.lock().expect("payload log").clone();
    assert_eq!(payloads.len(), 1);
    let payload = &payloads[0];

    assert_eq!(payload["width"], 1200);
    assert_eq!(payload["height"], 630);
    assert_eq!(payload["fonts"].as_array().map(Vec::len), Some(3));
    assert_eq!(
        payload["assets"]["😀"],
        "data:image/svg+xml;base64,dHdlbW9qaQ=="
    );

    let resolved = fixture
        .generic_emoji
        .segments
        .lock()
        .expect("segment log")
        .clone();
    assert_eq!(resolved, vec!["😀".to_string()]);

    let emoji_calls = fixture.emoji.calls.lock().expect("emoji call log").clone();
    assert_eq!(emoji_calls, vec![("5".to_string(), false)]);
}

#[tokio::test]
async fn icon_failure_aborts_before_the_engine_runs() {
    let fixture = fixture_with_icon(Arc::new(FailingIcon));
    let result = fixture.service.generate(&request()).await;

    match result {
        Err(ComposeError::Fetch(FetchError::Status { status, .. })) => assert_eq!(status, 404),
        other => panic!("expected fetch failure, got {other:?}"),
    }
    assert!(fixture.engine.payloads.lock().expect("payload log").is_empty());
}
