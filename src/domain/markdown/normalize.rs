//! Line-break normalization applied ahead of parsing.
//!
//! Discord renders every message line as its own paragraph, while the block
//! grammar only splits paragraphs on blank lines. Appending one extra line
//! break to every non-blank line outside a code fence reproduces that
//! loose-paragraph spacing without touching fence content.

const FENCE: &str = "```";

/// Normalize line breaks in a raw message.
///
/// `\r\n` and bare `\r` are converted to `\n` first. A line that starts with
/// a fence delimiter is emitted unchanged and toggles fence state; every
/// line inside a fence (blank lines included) is emitted exactly as written.
/// Outside a fence, blank lines pass through and non-blank lines gain one
/// trailing line break.
pub fn normalize_line_breaks(input: &str) -> String {
    let unified = input.replace("\r\n", "\n").replace('\r', "\n");
    let mut in_fence = false;
    let mut out: Vec<String> = Vec::new();

    for line in unified.split('\n') {
        if line.starts_with(FENCE) {
            in_fence = !in_fence;
            out.push(line.to_string());
            continue;
        }

        if in_fence || line.is_empty() {
            out.push(line.to_string());
            continue;
        }

        out.push(format!("{line}\n"));
    }

    out.join("\n")
}
