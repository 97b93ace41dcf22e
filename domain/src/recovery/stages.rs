//! Text cleaning stages, each a pure function.

use regex::Regex;
use std::sync::LazyLock;

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^```[A-Za-z0-9_+-]*[ \t]*\r?\n?").expect("FENCE is a compile-time constant")
});

// Filler only counts at the very start or end of the text; the same words
// inside a JSON string value are content.
static FILLER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\A\s*(?:(?:here'?s the|here is the|the json)[^\n]*?:",
        r"|response:|output:|result:|json:)\s*",
    ))
    .expect("FILLER_PREFIX is a compile-time constant")
});

static FILLER_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\s*(?:hope this helps|let me know|this is the)[^\[\]{}]*\z")
        .expect("FILLER_SUFFIX is a compile-time constant")
});

static ARRAY_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("ARRAY_SPAN is a compile-time constant"));
static OBJECT_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("OBJECT_SPAN is a compile-time constant"));

/// Remove code-fence markers (with or without a language tag) at line
/// starts, and a trailing fence.
pub fn strip_markdown_fences(text: &str) -> String {
    let out = FENCE.replace_all(text.trim(), "");
    let trimmed = out.trim_end();
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim().to_string()
}

/// Remove generative filler ("Here is the ...:", "Hope this helps!").
pub fn strip_artifact_phrases(text: &str) -> String {
    let out = FILLER_PREFIX.replace(text, "");
    FILLER_SUFFIX.replace(&out, "").trim().to_string()
}

/// Drop blank lines and trailing whitespace.
pub fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Longest greedy `[...]` and `{...}` spans, longest first.
pub fn bracket_candidates(text: &str) -> Vec<&str> {
    let mut spans: Vec<&str> = [&*ARRAY_SPAN, &*OBJECT_SPAN]
        .into_iter()
        .filter_map(|re| re.find(text).map(|m| m.as_str()))
        .collect();
    spans.sort_by_key(|s| std::cmp::Reverse(s.len()));
    spans.dedup();
    spans
}
