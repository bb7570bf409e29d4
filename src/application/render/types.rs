//! Visual-node tree handed to the layout engine, and the renderer's seams.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Boxed error used at capability seams so implementations can surface
/// their own failure types without the renderer depending on them.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Supplies custom-emoji image sources by id.
///
/// One call is issued per emoji occurrence; deduplication or caching, if
/// any, is the implementation's business. A returned error aborts the
/// entire render.
#[async_trait]
pub trait EmojiSource: Send + Sync {
    async fn load_custom_emoji(&self, id: &str, animated: bool) -> Result<String, BoxedError>;
}

/// Immutable per-render inputs.
///
/// Ids missing from `mention_names` are not errors; they render as a
/// literal `unknown` badge.
pub struct RenderContext<'a> {
    pub mention_names: &'a HashMap<String, String>,
    pub emoji: &'a dyn EmojiSource,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to load custom emoji `{id}`: {message}")]
    Emoji { id: String, message: String },
}

/// A node of the styled tree the layout engine consumes.
///
/// The tree is serialized as the engine's JSON payload and never mutated
/// after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VisualNode {
    Text {
        content: String,
    },
    Image {
        source: String,
        style: NodeStyle,
    },
    Container {
        style: NodeStyle,
        children: Vec<VisualNode>,
    },
}

impl VisualNode {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn image(source: impl Into<String>, style: NodeStyle) -> Self {
        Self::Image {
            source: source.into(),
            style,
        }
    }

    pub fn container(style: NodeStyle, children: Vec<VisualNode>) -> Self {
        Self::Container { style, children }
    }

    /// Visit every literal text run in document order.
    pub fn visit_text(&self, visit: &mut dyn FnMut(&str)) {
        match self {
            VisualNode::Text { content } => visit(content),
            VisualNode::Image { .. } => {}
            VisualNode::Container { children, .. } => {
                for child in children {
                    child.visit_text(visit);
                }
            }
        }
    }

    /// Concatenate every literal text run in document order.
    pub fn flatten_text(&self) -> String {
        let mut out = String::new();
        self.visit_text(&mut |content| out.push_str(content));
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Row,
    Column,
}

/// Flat style applied to a container or image.
///
/// The engine treats unset fields as inherited or defaulted; only the
/// properties the fixed style table actually uses are modeled.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align_items: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justify_content: Option<&'static str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub wrap: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub grow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub monospace: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub pre_wrap: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_left: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_fit: Option<&'static str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub grayscale: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fade_right: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::{NodeStyle, VisualNode};

    #[test]
    fn flatten_walks_text_in_document_order() {
        let tree = VisualNode::container(
            NodeStyle::default(),
            vec![
                VisualNode::text("a"),
                VisualNode::container(NodeStyle::default(), vec![VisualNode::text("b")]),
                VisualNode::image("data:,x", NodeStyle::default()),
                VisualNode::text("c"),
            ],
        );
        assert_eq!(tree.flatten_text(), "abc");
    }

    #[test]
    fn unset_style_fields_are_omitted_from_the_payload() {
        let style = NodeStyle {
            monospace: true,
            font_size: Some(28.0),
            ..NodeStyle::default()
        };
        let json = serde_json::to_value(&style).expect("style serializes");
        assert_eq!(
            json,
            serde_json::json!({ "monospace": true, "fontSize": 28.0 })
        );
    }
}
