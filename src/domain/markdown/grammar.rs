//! Block and inline grammar, expressed as ordered rule tables.
//!
//! Every inline rule is a (pattern, constructor) pair; table order is match
//! priority. Rust's `regex` crate has no lookahead, so the generic text
//! fallback is a manual scan that consumes at least one character and stops
//! before the next character that could open another rule.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::MarkdownNode;

// Block patterns. Paragraphs are single lines: normalization guarantees a
// blank line between any two non-blank source lines.
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\n+").expect("blank pattern"));
static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```([A-Za-z0-9_+.-]*)\n([\s\S]*?)```\n*").expect("fence pattern"));
static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6}) +([^\n]+?) *\n*").expect("heading pattern"));
static BLOCK_QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^((?:> ?[^\n]*\n?)+)\n*").expect("quote pattern"));
static LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((?:(?:[-*+]|[0-9]+\.) +[^\n]*\n?)+)\n*").expect("list pattern")
});
static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*+]|[0-9]+\.) +").expect("list marker pattern"));
static PARAGRAPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^\n]+)\n*").expect("paragraph pattern"));

// Inline patterns, all anchored at the scan position.
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([^\]]*)\]\(([^)\s]+)\)").expect("link pattern"));
static SPOILER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\|\|((?:[^|]|\|[^|])+?)\|\|").expect("spoiler pattern"));
static STRONG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*\*([\s\S]+?)\*\*").expect("strong pattern"));
static EM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\*([^*\n]+)\*|_([^_\n]+)_)").expect("em pattern"));
static DEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^~~([\s\S]+?)~~").expect("del pattern"));
static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^`([^`\n]+)`").expect("inline code pattern"));
static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<@!?([0-9]+)>").expect("mention pattern"));
static CUSTOM_EMOJI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<(a?):([^:>\s]+):([0-9]+)>").expect("custom emoji pattern"));
static MENTION_ANYWHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<@!?([0-9]+)>").expect("mention scan pattern"));

/// Characters that can open an inline rule; the text fallback stops in
/// front of them so every rule gets a chance at its own start position.
const INLINE_OPENERS: [char; 7] = ['*', '_', '~', '`', '|', '<', '['];

struct InlineRule {
    pattern: &'static Lazy<Regex>,
    build: fn(&Captures<'_>) -> MarkdownNode,
}

// Table order is precedence. Spoiler sits above emphasis so a `||` pair is
// never split by `*`/`_` scanning; mention and customEmoji sit above the
// text fallback so their literal sequences are never absorbed as plain
// text. The two platform tag syntaxes are lexically disjoint, so their
// relative order does not matter.
static INLINE_RULES: &[InlineRule] = &[
    InlineRule {
        pattern: &SPOILER,
        build: build_spoiler,
    },
    InlineRule {
        pattern: &LINK,
        build: build_link,
    },
    InlineRule {
        pattern: &STRONG,
        build: build_strong,
    },
    InlineRule {
        pattern: &EM,
        build: build_em,
    },
    InlineRule {
        pattern: &DEL,
        build: build_del,
    },
    InlineRule {
        pattern: &INLINE_CODE,
        build: build_inline_code,
    },
    InlineRule {
        pattern: &MENTION,
        build: build_mention,
    },
    InlineRule {
        pattern: &CUSTOM_EMOJI,
        build: build_custom_emoji,
    },
];

pub(super) fn parse_blocks(source: &str) -> Vec<MarkdownNode> {
    let mut nodes = Vec::new();
    let mut rest = source;

    while !rest.is_empty() {
        if let Some(found) = BLANK_LINES.find(rest) {
            rest = &rest[found.end()..];
            continue;
        }

        if let Some(caps) = CODE_BLOCK.captures(rest) {
            let content = group(&caps, 2);
            let content = content.strip_suffix('\n').unwrap_or(content);
            nodes.push(MarkdownNode::CodeBlock(content.to_string()));
            rest = &rest[match_len(&caps)..];
            continue;
        }

        if let Some(caps) = HEADING.captures(rest) {
            let level = group(&caps, 1).len() as u8;
            nodes.push(MarkdownNode::Heading {
                level,
                children: parse_inline(group(&caps, 2)),
            });
            rest = &rest[match_len(&caps)..];
            continue;
        }

        if let Some(caps) = BLOCK_QUOTE.captures(rest) {
            let stripped: Vec<&str> = group(&caps, 1)
                .lines()
                .map(|line| {
                    line.strip_prefix("> ")
                        .or_else(|| line.strip_prefix('>'))
                        .unwrap_or(line)
                })
                .collect();
            nodes.push(MarkdownNode::BlockQuote(parse_blocks(&stripped.join("\n"))));
            rest = &rest[match_len(&caps)..];
            continue;
        }

        if let Some(caps) = LIST.captures(rest) {
            let items: Vec<Vec<MarkdownNode>> = group(&caps, 1)
                .lines()
                .filter(|line| !line.is_empty())
                .map(|line| parse_inline(LIST_MARKER.replace(line, "").as_ref()))
                .collect();
            nodes.push(MarkdownNode::List(items));
            rest = &rest[match_len(&caps)..];
            continue;
        }

        let Some(caps) = PARAGRAPH.captures(rest) else {
            break;
        };
        nodes.push(MarkdownNode::Paragraph(parse_inline(
            group(&caps, 1).trim_end(),
        )));
        rest = &rest[match_len(&caps)..];
    }

    nodes
}

pub(super) fn parse_inline(source: &str) -> Vec<MarkdownNode> {
    let mut nodes: Vec<MarkdownNode> = Vec::new();
    let mut rest = source;

    'scan: while !rest.is_empty() {
        for rule in INLINE_RULES {
            if let Some(caps) = rule.pattern.captures(rest) {
                nodes.push((rule.build)(&caps));
                rest = &rest[match_len(&caps)..];
                continue 'scan;
            }
        }

        let taken = take_text(rest);
        push_text(&mut nodes, &rest[..taken]);
        rest = &rest[taken..];
    }

    nodes
}

pub(super) fn mention_ids(source: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for caps in MENTION_ANYWHERE.captures_iter(source) {
        let id = group(&caps, 1);
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

/// Length of text the fallback consumes: at least one character, then up to
/// (not including) the next character that could open an inline rule.
fn take_text(rest: &str) -> usize {
    for (index, ch) in rest.char_indices() {
        if index > 0 && INLINE_OPENERS.contains(&ch) {
            return index;
        }
    }
    rest.len()
}

/// Append literal text, merging with a trailing text node so degraded
/// syntax does not fragment the AST.
fn push_text(nodes: &mut Vec<MarkdownNode>, content: &str) {
    if let Some(MarkdownNode::Text(last)) = nodes.last_mut() {
        last.push_str(content);
        return;
    }
    nodes.push(MarkdownNode::Text(content.to_string()));
}

fn match_len(caps: &Captures<'_>) -> usize {
    caps.get(0).map_or(0, |m| m.end())
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map_or("", |m| m.as_str())
}

fn build_spoiler(caps: &Captures<'_>) -> MarkdownNode {
    MarkdownNode::Spoiler(parse_inline(group(caps, 1)))
}

fn build_link(caps: &Captures<'_>) -> MarkdownNode {
    // The rendered card is a static image, so the target has no consumer;
    // only the label survives.
    MarkdownNode::Link(parse_inline(group(caps, 1)))
}

fn build_strong(caps: &Captures<'_>) -> MarkdownNode {
    MarkdownNode::Strong(parse_inline(group(caps, 1)))
}

fn build_em(caps: &Captures<'_>) -> MarkdownNode {
    let content = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map_or("", |m| m.as_str());
    MarkdownNode::Em(parse_inline(content))
}

fn build_del(caps: &Captures<'_>) -> MarkdownNode {
    MarkdownNode::Del(parse_inline(group(caps, 1)))
}

fn build_inline_code(caps: &Captures<'_>) -> MarkdownNode {
    MarkdownNode::InlineCode(group(caps, 1).to_string())
}

fn build_mention(caps: &Captures<'_>) -> MarkdownNode {
    MarkdownNode::Mention {
        user_id: group(caps, 1).to_string(),
    }
}

fn build_custom_emoji(caps: &Captures<'_>) -> MarkdownNode {
    MarkdownNode::CustomEmoji {
        id: group(caps, 3).to_string(),
        animated: group(caps, 1) == "a",
    }
}
