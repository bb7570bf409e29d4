//! Fixed style table: one style per AST variant.
//!
//! Values mirror the quote card's dark theme. Heading levels beyond the
//! defined set reuse the lowest-priority heading style.

use super::types::{Direction, NodeStyle};

pub(crate) fn root() -> NodeStyle {
    NodeStyle {
        direction: Some(Direction::Column),
        align_items: Some("stretch"),
        gap: Some(12.0),
        width: Some("100%"),
        color: Some("#fafafa"),
        text_align: Some("center"),
        ..NodeStyle::default()
    }
}

pub(crate) fn paragraph() -> NodeStyle {
    NodeStyle {
        direction: Some(Direction::Row),
        wrap: true,
        align_items: Some("baseline"),
        justify_content: Some("center"),
        gap: Some(4.0),
        font_size: Some(32.0),
        line_height: Some(1.5),
        ..NodeStyle::default()
    }
}

pub(crate) fn heading(level: u8) -> NodeStyle {
    let font_size = match level {
        1 => 42.0,
        2 => 38.0,
        _ => 34.0,
    };
    NodeStyle {
        font_size: Some(font_size),
        font_weight: Some(700),
        gap: Some(6.0),
        ..paragraph()
    }
}

pub(crate) fn block_quote() -> NodeStyle {
    NodeStyle {
        direction: Some(Direction::Column),
        gap: Some(6.0),
        border_left: Some("4px solid #666"),
        padding: Some("0 0 0 12px"),
        color: Some("#e0e0e0"),
        ..paragraph()
    }
}

pub(crate) fn list() -> NodeStyle {
    NodeStyle {
        direction: Some(Direction::Column),
        gap: Some(6.0),
        padding: Some("0 0 0 24px"),
        ..paragraph()
    }
}

pub(crate) fn list_item() -> NodeStyle {
    NodeStyle {
        direction: Some(Direction::Row),
        gap: Some(8.0),
        ..NodeStyle::default()
    }
}

pub(crate) fn strong() -> NodeStyle {
    NodeStyle {
        font_weight: Some(700),
        ..NodeStyle::default()
    }
}

pub(crate) fn em() -> NodeStyle {
    NodeStyle {
        italic: true,
        ..NodeStyle::default()
    }
}

pub(crate) fn del() -> NodeStyle {
    NodeStyle {
        strikethrough: true,
        ..NodeStyle::default()
    }
}

pub(crate) fn inline_code() -> NodeStyle {
    NodeStyle {
        monospace: true,
        font_size: Some(28.0),
        background: Some("#1c1c1c"),
        padding: Some("2px 6px"),
        border_radius: Some(4.0),
        ..NodeStyle::default()
    }
}

pub(crate) fn code_block() -> NodeStyle {
    NodeStyle {
        monospace: true,
        pre_wrap: true,
        font_size: Some(28.0),
        background: Some("#111"),
        padding: Some("12px"),
        border_radius: Some(8.0),
        ..NodeStyle::default()
    }
}

pub(crate) fn link() -> NodeStyle {
    NodeStyle {
        color: Some("#7cc7ff"),
        underline: true,
        ..NodeStyle::default()
    }
}

pub(crate) fn mention() -> NodeStyle {
    NodeStyle {
        background: Some("#1f1f1f"),
        padding: Some("2px 6px"),
        border_radius: Some(6.0),
        color: Some("#cfd9ff"),
        font_weight: Some(600),
        ..NodeStyle::default()
    }
}

pub(crate) fn spoiler() -> NodeStyle {
    NodeStyle {
        direction: Some(Direction::Row),
        align_items: Some("center"),
        gap: Some(6.0),
        border: Some("1px solid #555"),
        border_radius: Some(6.0),
        padding: Some("4px 8px"),
        background: Some("rgba(255,255,255,0.05)"),
        ..NodeStyle::default()
    }
}

pub(crate) fn custom_emoji() -> NodeStyle {
    NodeStyle {
        width: Some("1.2em"),
        height: Some("1.2em"),
        object_fit: Some("contain"),
        ..NodeStyle::default()
    }
}
