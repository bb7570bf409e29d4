//! Rasterization of the layout engine's SVG output.
//!
//! The vector output is cropped to the tight bounding box of drawn content
//! and painted onto a transparent pixmap; fetched fonts are registered so
//! text nodes resolve without touching system fonts.

use std::sync::Arc;

use bytes::Bytes;

use super::types::{ComposeError, FontResource};

pub(crate) fn rasterize(svg: &str, fonts: &[FontResource]) -> Result<Bytes, ComposeError> {
    let mut db = fontdb::Database::new();
    for font in fonts {
        db.load_font_data(font.data.to_vec());
    }

    let options = resvg::usvg::Options {
        fontdb: Arc::new(db),
        ..Default::default()
    };
    let tree = resvg::usvg::Tree::from_str(svg, &options)
        .map_err(|err| raster_error(format!("svg parse failed: {err}")))?;

    let content = tree.root().abs_bounding_box();
    let width = content.width().ceil() as u32;
    let height = content.height().ceil() as u32;
    if width == 0 || height == 0 {
        return Err(raster_error("layout produced no visible content"));
    }

    // Pixmap::new yields an all-transparent canvas; translating by the
    // content origin performs the crop.
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| raster_error("could not allocate output pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_translate(-content.x(), -content.y()),
        &mut pixmap.as_mut(),
    );

    let png = pixmap
        .encode_png()
        .map_err(|err| raster_error(format!("png encode failed: {err}")))?;
    Ok(Bytes::from(png))
}

fn raster_error(message: impl Into<String>) -> ComposeError {
    ComposeError::Raster {
        message: message.into(),
    }
}
