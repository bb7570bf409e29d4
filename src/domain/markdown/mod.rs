//! Discord-flavored markdown: AST types and parser entry points.
//!
//! The dialect is deliberately smaller than CommonMark. On top of the
//! generic block/inline grammar it adds three platform syntaxes — user
//! mentions (`<@123>`), custom emoji (`<a:dance:456>`) and spoilers
//! (`||hidden||`) — and anything the grammar does not recognise degrades to
//! literal text rather than failing the parse.

mod grammar;
pub mod normalize;

pub use normalize::normalize_line_breaks;

/// A parsed markdown node.
///
/// The AST is an ordered, immutable forest: sibling order is source order
/// and nodes are never rewritten after construction. The enum is closed on
/// purpose — the renderer matches exhaustively, so adding a variant without
/// handling it everywhere fails the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkdownNode {
    Text(String),
    Paragraph(Vec<MarkdownNode>),
    Heading {
        level: u8,
        children: Vec<MarkdownNode>,
    },
    Strong(Vec<MarkdownNode>),
    Em(Vec<MarkdownNode>),
    Del(Vec<MarkdownNode>),
    InlineCode(String),
    CodeBlock(String),
    BlockQuote(Vec<MarkdownNode>),
    List(Vec<Vec<MarkdownNode>>),
    Link(Vec<MarkdownNode>),
    Spoiler(Vec<MarkdownNode>),
    Mention {
        user_id: String,
    },
    CustomEmoji {
        id: String,
        animated: bool,
    },
}

/// Parse a raw message into an ordered forest of block nodes.
///
/// Line breaks are normalized first (see [`normalize_line_breaks`]), then
/// the block grammar runs over the result. Fenced code content is captured
/// verbatim and never re-enters inline scanning.
pub fn parse_document(input: &str) -> Vec<MarkdownNode> {
    let normalized = normalize_line_breaks(input);
    grammar::parse_blocks(&normalized)
}

/// Collect the distinct user ids mentioned in a raw message, in order of
/// first occurrence. Used to scope display-name lookups before rendering.
pub fn extract_mention_ids(input: &str) -> Vec<String> {
    grammar::mention_ids(input)
}

#[cfg(test)]
mod tests {
    use super::{MarkdownNode, extract_mention_ids, parse_document};

    fn text(content: &str) -> MarkdownNode {
        MarkdownNode::Text(content.to_string())
    }

    #[test]
    fn plain_line_parses_to_one_paragraph() {
        let ast = parse_document("hello world");
        assert_eq!(ast, vec![MarkdownNode::Paragraph(vec![text("hello world")])]);
    }

    #[test]
    fn mention_is_not_absorbed_by_text() {
        let ast = parse_document("Hello <@123> and <@!999>");
        assert_eq!(
            ast,
            vec![MarkdownNode::Paragraph(vec![
                text("Hello "),
                MarkdownNode::Mention {
                    user_id: "123".to_string()
                },
                text(" and "),
                MarkdownNode::Mention {
                    user_id: "999".to_string()
                },
            ])]
        );
    }

    #[test]
    fn custom_emoji_captures_animation_flag_and_id() {
        let ast = parse_document("hi <:smile:42> and <a:dance:43>");
        assert_eq!(
            ast,
            vec![MarkdownNode::Paragraph(vec![
                text("hi "),
                MarkdownNode::CustomEmoji {
                    id: "42".to_string(),
                    animated: false
                },
                text(" and "),
                MarkdownNode::CustomEmoji {
                    id: "43".to_string(),
                    animated: true
                },
            ])]
        );
    }

    #[test]
    fn spoiler_wraps_recursively_parsed_content() {
        let ast = parse_document("This is ||a **big** secret|| text");
        assert_eq!(
            ast,
            vec![MarkdownNode::Paragraph(vec![
                text("This is "),
                MarkdownNode::Spoiler(vec![
                    text("a "),
                    MarkdownNode::Strong(vec![text("big")]),
                    text(" secret"),
                ]),
                text(" text"),
            ])]
        );
    }

    #[test]
    fn spoiler_outranks_emphasis_scanning() {
        // `||*x*||` must parse as a spoiler containing emphasis, not as
        // text with a stray emphasis swallowing one pipe.
        let ast = parse_document("||*x*||");
        assert_eq!(
            ast,
            vec![MarkdownNode::Paragraph(vec![MarkdownNode::Spoiler(vec![
                MarkdownNode::Em(vec![text("x")])
            ])])]
        );
    }

    #[test]
    fn emphasis_strong_and_strikethrough_nest() {
        let ast = parse_document("**bold** *em* ~~gone~~");
        assert_eq!(
            ast,
            vec![MarkdownNode::Paragraph(vec![
                MarkdownNode::Strong(vec![text("bold")]),
                text(" "),
                MarkdownNode::Em(vec![text("em")]),
                text(" "),
                MarkdownNode::Del(vec![text("gone")]),
            ])]
        );
    }

    #[test]
    fn link_keeps_children_and_drops_the_target() {
        let ast = parse_document("[docs](https://example.com)");
        assert_eq!(
            ast,
            vec![MarkdownNode::Paragraph(vec![MarkdownNode::Link(vec![
                text("docs")
            ])])]
        );
    }

    #[test]
    fn heading_levels_parse_with_inline_content() {
        let ast = parse_document("## Title **here**");
        assert_eq!(
            ast,
            vec![MarkdownNode::Heading {
                level: 2,
                children: vec![text("Title "), MarkdownNode::Strong(vec![text("here")])],
            }]
        );
    }

    #[test]
    fn fenced_code_is_a_single_literal_run() {
        let ast = parse_document("```\n今日はいい天気ですね。\n```");
        assert_eq!(
            ast,
            vec![MarkdownNode::CodeBlock("今日はいい天気ですね。".to_string())]
        );
    }

    #[test]
    fn custom_syntax_inside_fences_stays_literal() {
        let ast = parse_document("```\n<@123> and ||secret||\n```");
        assert_eq!(
            ast,
            vec![MarkdownNode::CodeBlock("<@123> and ||secret||".to_string())]
        );
    }

    #[test]
    fn block_quote_wraps_block_parsed_content() {
        let ast = parse_document("> quoted line");
        assert_eq!(
            ast,
            vec![MarkdownNode::BlockQuote(vec![MarkdownNode::Paragraph(
                vec![text("quoted line")]
            )])]
        );
    }

    #[test]
    fn list_lines_become_list_items() {
        let ast = parse_document("- first item");
        assert_eq!(ast, vec![MarkdownNode::List(vec![vec![text("first item")]])]);
    }

    #[test]
    fn inline_code_content_is_literal() {
        let ast = parse_document("run `cargo *check*` now");
        assert_eq!(
            ast,
            vec![MarkdownNode::Paragraph(vec![
                text("run "),
                MarkdownNode::InlineCode("cargo *check*".to_string()),
                text(" now"),
            ])]
        );
    }

    #[test]
    fn unmatched_syntax_degrades_to_text() {
        let ast = parse_document("a || b <@nope> <:broken 5 < 6");
        let MarkdownNode::Paragraph(children) = &ast[0] else {
            panic!("expected paragraph, got {ast:?}");
        };
        let flattened: String = children
            .iter()
            .map(|node| match node {
                MarkdownNode::Text(content) => content.as_str(),
                other => panic!("expected only text nodes, got {other:?}"),
            })
            .collect();
        assert_eq!(flattened, "a || b <@nope> <:broken 5 < 6");
    }

    #[test]
    fn mention_ids_are_deduplicated_in_first_seen_order() {
        let ids = extract_mention_ids("<@9> then <@!3> and <@9> again");
        assert_eq!(ids, vec!["9".to_string(), "3".to_string()]);
    }
}
