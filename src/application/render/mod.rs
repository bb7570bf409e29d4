//! Async depth-first transform from the markdown AST to the visual tree.
//!
//! Every node's children are resolved concurrently — their futures start
//! together and are joined before the parent composes — so asset fetches
//! overlap while sibling order stays deterministic. Any asset failure in
//! the subtree aborts the whole render; there is no partial output.

mod styles;
pub mod types;

use futures::future::{BoxFuture, FutureExt, try_join_all};

use crate::domain::markdown::{MarkdownNode, parse_document};

pub use types::{BoxedError, EmojiSource, NodeStyle, RenderContext, RenderError, VisualNode};

/// Label painted for mention ids absent from the supplied name map.
const UNKNOWN_MENTION: &str = "unknown";

/// Render a raw message into the visual tree.
///
/// The text is normalized and parsed first; the resulting forest renders
/// under a single root container.
pub async fn render_document(
    text: &str,
    ctx: &RenderContext<'_>,
) -> Result<VisualNode, RenderError> {
    let ast = parse_document(text);
    let children = render_nodes(&ast, ctx).await?;
    Ok(VisualNode::container(styles::root(), children))
}

async fn render_nodes(
    nodes: &[MarkdownNode],
    ctx: &RenderContext<'_>,
) -> Result<Vec<VisualNode>, RenderError> {
    try_join_all(nodes.iter().map(|node| render_node(node, ctx))).await
}

fn render_node<'a>(
    node: &'a MarkdownNode,
    ctx: &'a RenderContext<'a>,
) -> BoxFuture<'a, Result<VisualNode, RenderError>> {
    async move {
        let rendered = match node {
            MarkdownNode::Text(content) => VisualNode::text(content.clone()),
            MarkdownNode::Paragraph(children) => {
                VisualNode::container(styles::paragraph(), render_nodes(children, ctx).await?)
            }
            MarkdownNode::Heading { level, children } => {
                VisualNode::container(styles::heading(*level), render_nodes(children, ctx).await?)
            }
            MarkdownNode::Strong(children) => {
                VisualNode::container(styles::strong(), render_nodes(children, ctx).await?)
            }
            MarkdownNode::Em(children) => {
                VisualNode::container(styles::em(), render_nodes(children, ctx).await?)
            }
            MarkdownNode::Del(children) => {
                VisualNode::container(styles::del(), render_nodes(children, ctx).await?)
            }
            MarkdownNode::InlineCode(content) => VisualNode::container(
                styles::inline_code(),
                vec![VisualNode::text(content.clone())],
            ),
            MarkdownNode::CodeBlock(content) => VisualNode::container(
                styles::code_block(),
                vec![VisualNode::text(content.clone())],
            ),
            MarkdownNode::BlockQuote(children) => {
                VisualNode::container(styles::block_quote(), render_nodes(children, ctx).await?)
            }
            MarkdownNode::List(items) => {
                let rows = try_join_all(items.iter().map(|item| async move {
                    let children = render_nodes(item, ctx).await?;
                    Ok::<_, RenderError>(VisualNode::container(
                        styles::list_item(),
                        vec![
                            VisualNode::text("•"),
                            VisualNode::container(NodeStyle::default(), children),
                        ],
                    ))
                }))
                .await?;
                VisualNode::container(styles::list(), rows)
            }
            MarkdownNode::Link(children) => {
                // Static output: a styled, underlined span, never a hyperlink.
                VisualNode::container(styles::link(), render_nodes(children, ctx).await?)
            }
            MarkdownNode::Spoiler(children) => {
                // Spoiler content is painted, not masked; the bordered
                // container is the only tell.
                VisualNode::container(styles::spoiler(), render_nodes(children, ctx).await?)
            }
            MarkdownNode::Mention { user_id } => {
                let name = ctx
                    .mention_names
                    .get(user_id)
                    .map(String::as_str)
                    .unwrap_or(UNKNOWN_MENTION);
                VisualNode::container(styles::mention(), vec![VisualNode::text(format!("@{name}"))])
            }
            MarkdownNode::CustomEmoji { id, animated } => {
                let source = ctx
                    .emoji
                    .load_custom_emoji(id, *animated)
                    .await
                    .map_err(|source| RenderError::Emoji {
                        id: id.clone(),
                        message: source.to_string(),
                    })?;
                VisualNode::image(source, styles::custom_emoji())
            }
        };
        Ok(rendered)
    }
    .boxed()
}
