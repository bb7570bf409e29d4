//! Icon-key derivation for generic (non-custom) emoji.
//!
//! Emoji CDNs index their assets by the hyphen-joined hex code points of a
//! grapheme cluster. A lone emoji followed by VARIATION SELECTOR-16 is
//! indexed without the selector, while joined sequences keep every code
//! point — including internal selectors — or the lookup misses.

/// ZERO WIDTH JOINER, the glue inside composed emoji sequences.
pub const ZERO_WIDTH_JOINER: char = '\u{200D}';

/// VARIATION SELECTOR-16, the emoji-presentation selector.
const VARIATION_SELECTOR_16: char = '\u{FE0F}';

/// Derive the CDN lookup key for a pictographic grapheme cluster.
///
/// Clusters without a joiner drop every VS-16; clusters with a joiner keep
/// all code points in order. The remaining scalars are formatted as
/// lowercase hex and joined with `-`.
pub fn icon_key(cluster: &str) -> String {
    let keep_selectors = cluster.contains(ZERO_WIDTH_JOINER);
    cluster
        .chars()
        .filter(|ch| keep_selectors || *ch != VARIATION_SELECTOR_16)
        .map(|ch| format!("{:x}", ch as u32))
        .collect::<Vec<_>>()
        .join("-")
}

/// Whether a grapheme cluster is pictographic, i.e. worth resolving to an
/// emoji image instead of painting it with the text fonts.
///
/// The check is an explicit range test over the emoji blocks rather than a
/// full Unicode property table; keycap and digit sequences fall through to
/// text on purpose.
pub fn is_pictographic(cluster: &str) -> bool {
    cluster.chars().any(is_emoji_scalar)
}

fn is_emoji_scalar(ch: char) -> bool {
    let code = ch as u32;
    matches!(
        code,
        0x1F1E6..=0x1F1FF   // regional indicators (flags)
        | 0x1F300..=0x1F5FF // misc symbols and pictographs
        | 0x1F600..=0x1F64F // emoticons
        | 0x1F680..=0x1F6FF // transport and map symbols
        | 0x1F900..=0x1F9FF // supplemental symbols and pictographs
        | 0x1FA70..=0x1FAFF // symbols and pictographs extended-A
        | 0x2600..=0x26FF   // misc symbols
        | 0x2700..=0x27BF   // dingbats
    )
}

#[cfg(test)]
mod tests {
    use super::{icon_key, is_pictographic};

    #[test]
    fn lone_emoji_with_selector_drops_the_selector() {
        // U+2764 HEAVY BLACK HEART + VS-16
        assert_eq!(icon_key("\u{2764}\u{FE0F}"), "2764");
    }

    #[test]
    fn joined_sequence_keeps_every_code_point() {
        // ❤️‍🔥: 2764 FE0F 200D 1F525 — the internal selector must survive.
        let cluster = "\u{2764}\u{FE0F}\u{200D}\u{1F525}";
        assert_eq!(icon_key(cluster), "2764-fe0f-200d-1f525");
    }

    #[test]
    fn plain_emoji_maps_to_its_code_point() {
        assert_eq!(icon_key("😀"), "1f600");
    }

    #[test]
    fn flag_pair_joins_both_indicators() {
        assert_eq!(icon_key("🇯🇵"), "1f1ef-1f1f5");
    }

    #[test]
    fn pictographic_detection_accepts_emoji_and_rejects_text() {
        assert!(is_pictographic("😀"));
        assert!(is_pictographic("\u{2764}\u{FE0F}"));
        assert!(is_pictographic("🇯🇵"));
        assert!(!is_pictographic("a"));
        assert!(!is_pictographic("あ"));
        assert!(!is_pictographic("1"));
    }
}
