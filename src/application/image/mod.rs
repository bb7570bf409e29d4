//! Image compositor: fans out asset resolution and drives the layout engine.
//!
//! One request resolves the rendered document, three font subsets and the
//! avatar icon concurrently; the join is all-or-nothing, so a single
//! upstream failure aborts the composition with no partial image.

mod raster;
pub mod types;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures::future::try_join_all;
use metrics::histogram;
use tokio::try_join;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::application::render::types::Direction;
use crate::application::render::{EmojiSource, NodeStyle, RenderContext, VisualNode, render_document};
use crate::domain::emoji;

pub use types::{
    ComposeError, FetchError, FontProvider, FontResource, FontSpec, GenericEmojiResolver,
    IconFetcher, LayoutEngine, LayoutError, LayoutPayload, QuoteRequest,
};

const METRIC_COMPOSE_MS: &str = "meigen_quote_compose_ms";

/// Canvas and typography configuration for the quote card.
#[derive(Debug, Clone)]
pub struct CardConfig {
    pub width: u32,
    pub height: u32,
    pub primary_family: String,
    pub code_family: String,
    pub regular_weight: u16,
    pub bold_weight: u16,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 630,
            primary_family: "Noto Sans JP".to_string(),
            code_family: "Noto Sans Mono".to_string(),
            regular_weight: 400,
            bold_weight: 700,
        }
    }
}

/// Orchestrates one quote-card composition end to end.
pub struct QuoteImageService {
    fonts: Arc<dyn FontProvider>,
    icons: Arc<dyn IconFetcher>,
    emoji: Arc<dyn EmojiSource>,
    generic_emoji: Arc<dyn GenericEmojiResolver>,
    engine: Arc<dyn LayoutEngine>,
    config: CardConfig,
}

impl QuoteImageService {
    pub fn new(
        fonts: Arc<dyn FontProvider>,
        icons: Arc<dyn IconFetcher>,
        emoji: Arc<dyn EmojiSource>,
        generic_emoji: Arc<dyn GenericEmojiResolver>,
        engine: Arc<dyn LayoutEngine>,
        config: CardConfig,
    ) -> Self {
        Self {
            fonts,
            icons,
            emoji,
            generic_emoji,
            engine,
            config,
        }
    }

    /// Generate the quote-card PNG for one request.
    pub async fn generate(&self, request: &QuoteRequest) -> Result<Bytes, ComposeError> {
        let started_at = Instant::now();
        let seed = text_seed(request);
        let ctx = RenderContext {
            mention_names: &request.mention_names,
            emoji: self.emoji.as_ref(),
        };

        let (content, regular, bold, mono, icon) = try_join!(
            async {
                render_document(&request.text, &ctx)
                    .await
                    .map_err(ComposeError::from)
            },
            self.fetch_font(&seed, &self.config.primary_family, self.config.regular_weight),
            self.fetch_font(&seed, &self.config.primary_family, self.config.bold_weight),
            self.fetch_font(&seed, &self.config.code_family, self.config.regular_weight),
            async {
                self.icons
                    .fetch_data_uri(&request.icon_url)
                    .await
                    .map_err(ComposeError::from)
            },
        )?;

        let fonts = vec![regular, bold, mono];
        let card = compose_card(&icon, content, &request.name, &request.handle);
        let assets = self.resolve_generic_emoji(&card).await?;

        let payload = LayoutPayload {
            width: self.config.width,
            height: self.config.height,
            fonts: fonts.iter().map(FontSpec::from_resource).collect(),
            assets,
            root: &card,
        };
        let svg = self.engine.layout(&payload).await?;
        let png = raster::rasterize(&svg, &fonts)?;

        histogram!(METRIC_COMPOSE_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
        debug!(
            target = "meigen::image",
            bytes = png.len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "quote card composed"
        );
        Ok(png)
    }

    async fn fetch_font(
        &self,
        seed: &str,
        family: &str,
        weight: u16,
    ) -> Result<FontResource, ComposeError> {
        let data = self.fonts.fetch_subset(seed, family, weight).await?;
        Ok(FontResource {
            family: family.to_string(),
            weight,
            data,
        })
    }

    /// Pre-resolve pictographic grapheme clusters found in the tree's text
    /// runs. The engine receives them as an asset table keyed by segment.
    async fn resolve_generic_emoji(
        &self,
        root: &VisualNode,
    ) -> Result<BTreeMap<String, String>, ComposeError> {
        let mut segments: Vec<String> = Vec::new();
        root.visit_text(&mut |content| {
            for cluster in content.graphemes(true) {
                if emoji::is_pictographic(cluster) && !segments.iter().any(|seen| seen == cluster) {
                    segments.push(cluster.to_string());
                }
            }
        });

        let resolved = try_join_all(segments.iter().map(|segment| async move {
            let source = self.generic_emoji.resolve(segment).await?;
            Ok::<_, FetchError>((segment.clone(), source))
        }))
        .await?;
        Ok(resolved.into_iter().collect())
    }
}

/// Every literal character that will be painted — message text, display
/// name, handle, the `@` sigil and each resolved mention display name —
/// used solely to scope font-subset requests.
fn text_seed(request: &QuoteRequest) -> String {
    let mut seed = String::with_capacity(
        request.text.len() + request.name.len() + request.handle.len() + 1,
    );
    seed.push_str(&request.text);
    seed.push_str(&request.name);
    seed.push_str(&request.handle);
    seed.push('@');
    for name in request.mention_names.values() {
        seed.push_str(name);
    }
    seed
}

/// The full card: grayscale avatar panel on the left, rendered content and
/// the name/handle footer on the right.
fn compose_card(icon: &str, content: VisualNode, name: &str, handle: &str) -> VisualNode {
    let avatar = VisualNode::image(
        icon,
        NodeStyle {
            width: Some("40%"),
            height: Some("100%"),
            object_fit: Some("cover"),
            grayscale: true,
            fade_right: true,
            ..NodeStyle::default()
        },
    );

    let footer = VisualNode::container(
        NodeStyle {
            direction: Some(Direction::Column),
            align_items: Some("center"),
            gap: Some(4.0),
            margin: Some("24px 0 0 0"),
            ..NodeStyle::default()
        },
        vec![
            VisualNode::container(
                NodeStyle {
                    font_size: Some(24.0),
                    text_align: Some("center"),
                    ..NodeStyle::default()
                },
                vec![VisualNode::text(name)],
            ),
            VisualNode::container(
                NodeStyle {
                    font_size: Some(20.0),
                    text_align: Some("center"),
                    opacity: Some(0.65),
                    ..NodeStyle::default()
                },
                vec![VisualNode::text(format!("@{handle}"))],
            ),
        ],
    );

    let column = VisualNode::container(
        NodeStyle {
            direction: Some(Direction::Column),
            align_items: Some("center"),
            width: Some("60%"),
            padding: Some("32px"),
            grow: true,
            ..NodeStyle::default()
        },
        vec![
            VisualNode::container(
                NodeStyle {
                    direction: Some(Direction::Row),
                    width: Some("100%"),
                    text_align: Some("left"),
                    ..NodeStyle::default()
                },
                vec![content],
            ),
            footer,
        ],
    );

    VisualNode::container(
        NodeStyle {
            direction: Some(Direction::Row),
            align_items: Some("center"),
            width: Some("100%"),
            height: Some("100%"),
            background: Some("#000000"),
            color: Some("#fafafa"),
            font_size: Some(32.0),
            ..NodeStyle::default()
        },
        vec![avatar, column],
    )
}
