//! Lyric text normalization and the small amount of HTML handling the
//! scraping providers need.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static NEWLINE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static BR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap());
static CLASS_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());
static HREF_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());
static ANCHOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<a\b[^>]*>").unwrap());
static DIV_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<(/?)div\b[^>]*>").unwrap());

/// Put section markers such as `[Chorus]` on their own line and collapse
/// runs of blank lines.
///
/// A newline is inserted before every `[` and after every `]` unless one is
/// already there (or the bracket sits at the start of the text), then any
/// run of three or more newlines becomes exactly two. The result is a fixed
/// point: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + raw.len() / 16);
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '[' && !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push(c);
        if c == ']' && chars.peek().is_some_and(|next| *next != '\n') {
            out.push('\n');
        }
    }
    NEWLINE_RUN_RE.replace_all(&out, "\n\n").into_owned()
}

/// Convert an HTML fragment to plain text: `<br>` becomes a newline, other
/// tags are dropped, entities are decoded.
pub fn html_to_text(fragment: &str) -> String {
    let with_breaks = BR_RE.replace_all(fragment, "\n");
    let stripped = TAG_RE.replace_all(&with_breaks, "");
    decode_entities(&stripped)
}

/// Decode named and numeric HTML character references.
pub fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn attr<'a>(re: &Regex, tag: &'a str) -> Option<&'a str> {
    let caps = re.captures(tag)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// `href` of the first `<a>` whose `class` starts with `class_prefix`.
pub fn first_link_with_class_prefix(html: &str, class_prefix: &str) -> Option<String> {
    ANCHOR_RE
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|tag| attr(&CLASS_ATTR_RE, tag).is_some_and(|c| c.starts_with(class_prefix)))
        .find_map(|tag| attr(&HREF_ATTR_RE, tag))
        .filter(|href| !href.is_empty())
        .map(decode_entities)
}

/// Inner HTML of every `<div>` whose `class` starts with `class_prefix`, in
/// document order. Nested `<div>`s are balanced; a block whose closing tag
/// is missing runs to the end of the document.
pub fn div_blocks_with_class_prefix<'a>(html: &'a str, class_prefix: &str) -> Vec<&'a str> {
    let mut blocks = Vec::new();
    let mut cursor = 0;
    while cursor < html.len() {
        let Some(open) = DIV_RE.captures_at(html, cursor) else {
            break;
        };
        let Some(whole) = open.get(0) else { break };
        cursor = whole.end();
        let is_match = open[1].is_empty()
            && attr(&CLASS_ATTR_RE, whole.as_str()).is_some_and(|c| c.starts_with(class_prefix));
        if !is_match {
            continue;
        }

        let inner_start = whole.end();
        let mut depth = 1usize;
        let mut inner_end = html.len();
        for tag in DIV_RE.captures_iter(&html[inner_start..]) {
            let Some(m) = tag.get(0) else { continue };
            if tag[1].is_empty() {
                depth += 1;
            } else {
                depth -= 1;
                if depth == 0 {
                    inner_end = inner_start + m.start();
                    cursor = inner_start + m.end();
                    break;
                }
            }
        }
        if depth != 0 {
            cursor = html.len();
        }
        blocks.push(&html[inner_start..inner_end]);
    }
    blocks
}
