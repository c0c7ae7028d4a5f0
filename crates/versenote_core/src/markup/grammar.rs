//! Token recognizers for the note markup.
//!
//! | Form | Shape |
//! |---|---|
//! | self id | line `@_id<token>@` |
//! | child id | line `@__id<token>@` |
//! | theme block | line `@theme` .. line `@` |
//! | tags block | line `@tags` .. line `@` |
//! | verse reference | inline `@<path/with/slashes>@` |
//! | header/title | line `#`×level + ` @ ` + title |

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Character repeated to mark header depth.
pub const HEADER_CHAR: char = '#';

const THEME_OPEN: &str = "@theme";
const TAGS_OPEN: &str = "@tags";
const BLOCK_CLOSE: &str = "@";

static SELF_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^@_id([a-z0-9]+)@[ \t]*$").expect("valid self id regex"));
static CHILD_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^@__id([a-z0-9]+)@[ \t]*$").expect("valid child id regex"));
static VERSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@/?([^@\s/][^@\s]*/[^@\s]+)@").expect("valid verse reference regex")
});

/// Plain and key/value tags parsed from one tags block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    pub tags: BTreeSet<String>,
    pub kv_tags: BTreeMap<String, String>,
}

/// Returns the header prefix for `level`, e.g. `"## @ "` for level 2.
pub fn header_marker(level: usize) -> String {
    let mut marker = HEADER_CHAR.to_string().repeat(level);
    marker.push_str(" @ ");
    marker
}

/// Returns the first self-id token.
pub fn self_id(text: &str) -> Option<String> {
    SELF_ID_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Returns every child-id token in order of appearance, without duplicates.
pub fn child_ids(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    CHILD_ID_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Formats the self-id line for `id`.
pub fn self_id_line(id: &str) -> String {
    format!("@_id{id}@")
}

/// Formats the child-id line for `id`.
pub fn child_id_line(id: &str) -> String {
    format!("@__id{id}@")
}

/// Returns the trimmed theme block body, if a non-empty block exists.
pub fn theme(text: &str) -> Option<String> {
    block_body(THEME_OPEN, text)
        .map(|body| body.trim().to_string())
        .filter(|body| !body.is_empty())
}

/// Parses the first tags block. Missing or unterminated blocks yield no tags.
pub fn tags(text: &str) -> TagSet {
    let mut parsed = TagSet::default();
    let Some(body) = block_body(TAGS_OPEN, text) else {
        return parsed;
    };

    for line in body.lines() {
        match parse_tag_line(line) {
            Some(TagLine::Plain(tag)) => {
                parsed.tags.insert(tag);
            }
            Some(TagLine::KeyValue(key, value)) => {
                parsed.kv_tags.insert(key, value);
            }
            None => {}
        }
    }
    parsed
}

/// One parsed line of a tags block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagLine {
    Plain(String),
    KeyValue(String, String),
}

/// Splits a tag line once on the first colon.
///
/// `key: value` is a key/value pair, `tag` and `tag:` are plain tags.
/// Blank lines and lines with an empty key are ignored.
pub fn parse_tag_line(line: &str) -> Option<TagLine> {
    let (key, value) = match line.split_once(':') {
        Some((key, value)) => (key.trim(), value.trim()),
        None => (line.trim(), ""),
    };
    if key.is_empty() {
        return None;
    }
    if value.is_empty() {
        Some(TagLine::Plain(key.to_string()))
    } else {
        Some(TagLine::KeyValue(key.to_string(), value.to_string()))
    }
}

/// Collects every inline verse reference.
pub fn verse_refs(text: &str) -> BTreeSet<String> {
    VERSE_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Returns the title from the first header line of exactly `level` markers.
pub fn title(text: &str, level: usize) -> Option<String> {
    if level == 0 {
        return None;
    }
    let marker = header_marker(level);
    text.lines()
        .find_map(|line| line.strip_prefix(marker.as_str()))
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
}

/// Body of the first closed `opener` block.
///
/// A block is closed by a bare `@` line. Another block opener before the
/// closing line leaves the block unterminated; a later `opener` line may
/// still start a closed block.
fn block_body(opener: &str, text: &str) -> Option<String> {
    let mut body: Option<Vec<&str>> = None;
    for line in text.lines() {
        let marker = line.trim_end();
        if marker == opener {
            body = Some(Vec::new());
            continue;
        }
        let Some(lines) = body.as_mut() else {
            continue;
        };
        match marker {
            BLOCK_CLOSE => return Some(lines.join("\n")),
            THEME_OPEN | TAGS_OPEN => body = None,
            _ => lines.push(line),
        }
    }
    None
}
