//! Upstream asset resolvers: avatar icon, font subsets and emoji images.

mod emoji;
mod font;
mod icon;

pub use emoji::{DiscordEmojiLoader, EmojiCache, TwemojiResolver};
pub use font::SubsetFontProvider;
pub use icon::HttpIconFetcher;

use base64::{Engine as _, engine::general_purpose::STANDARD};

/// Re-encode raw bytes as a data URI tagged with the given content type.
pub(crate) fn data_uri(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{content_type};base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::data_uri;

    #[test]
    fn data_uri_carries_content_type_and_base64_payload() {
        assert_eq!(data_uri("image/png", b"abc"), "data:image/png;base64,YWJj");
    }
}
