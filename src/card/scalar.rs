//! Scalar decoding and quote-aware line scanning.

use super::node::{Node, Scalar};
use crate::error::ParseError;
use serde_json::Number;

/// Tracks whether a scan position is inside quotes or brackets.
#[derive(Default)]
struct ScanState {
    quote: Option<char>,
    depth: usize,
}

impl ScanState {
    /// Advance over `ch`; `prev` is the character before it, if any.
    fn step(&mut self, prev: Option<char>, ch: char) {
        if let Some(q) = self.quote {
            if ch == q {
                self.quote = None;
            }
            return;
        }
        match ch {
            '"' | '\'' if opens_quote(prev) => self.quote = Some(ch),
            '[' | '{' => self.depth += 1,
            ']' | '}' => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
    }

    fn at_top_level(&self) -> bool {
        self.quote.is_none() && self.depth == 0
    }
}

/// Quotes only open at the start of a token, so apostrophes inside words
/// (`don't`) are plain text.
fn opens_quote(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, '[' | '{' | ',' | ':' | '-'),
    }
}

/// Strip a trailing ` #...` comment that sits outside quotes.
pub(crate) fn strip_trailing_comment(line: &str) -> &str {
    let mut state = ScanState::default();
    let mut prev = None;
    for (idx, ch) in line.char_indices() {
        if ch == '#' && state.quote.is_none() && matches!(prev, Some(' ') | Some('\t')) {
            return line[..idx].trim_end();
        }
        state.step(prev, ch);
        prev = Some(ch);
    }
    line
}

/// Byte offset of the colon that separates a key from its value.
///
/// The colon must be outside quotes and brackets and be followed by a space
/// or the end of the line, so `http://host` never reads as a key.
pub(crate) fn find_key_colon(content: &str) -> Option<usize> {
    let mut state = ScanState::default();
    let mut prev = None;
    let mut chars = content.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch == ':' && state.at_top_level() && idx > 0 {
            match chars.peek() {
                None => return Some(idx),
                Some((_, next)) if next.is_whitespace() => return Some(idx),
                _ => {}
            }
        }
        state.step(prev, ch);
        prev = Some(ch);
    }
    None
}

/// Split on `sep` where it appears outside quotes and nested brackets.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut state = ScanState::default();
    let mut prev = None;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        if ch == sep && state.at_top_level() {
            parts.push(&text[start..idx]);
            start = idx + ch.len_utf8();
        } else {
            state.step(prev, ch);
        }
        prev = Some(ch);
    }
    parts.push(&text[start..]);
    parts
}

/// Remove one matching pair of outer quotes, if present.
pub(crate) fn unquote(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return Some(&text[1..text.len() - 1]);
        }
    }
    None
}

fn is_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int_part) && frac_part.map_or(true, all_digits)
}

fn decode_number(text: &str) -> Option<Number> {
    if !text.contains('.') {
        if let Ok(int) = text.parse::<i64>() {
            return Some(Number::from(int));
        }
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

fn is_block_scalar_indicator(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some('|') | Some('>'))
        && chars.all(|c| matches!(c, '-' | '+' | '1'..='9'))
}

/// Decode a bare value into a scalar or inline sequence node.
pub fn decode_scalar(raw: &str, line: usize) -> Result<Node, ParseError> {
    let text = raw.trim();
    match text {
        "null" | "~" => return Ok(Node::Scalar(Scalar::Null)),
        "true" => return Ok(Node::Scalar(Scalar::Bool(true))),
        "false" => return Ok(Node::Scalar(Scalar::Bool(false))),
        _ => {}
    }

    if is_number(text) {
        if let Some(number) = decode_number(text) {
            return Ok(Node::Scalar(Scalar::Number(number)));
        }
    }

    if let Some(inner) = unquote(text) {
        return Ok(Node::string(inner));
    }

    if text.starts_with('[') {
        let inner = text
            .strip_suffix(']')
            .map(|t| &t[1..])
            .ok_or_else(|| ParseError::new(line, "unterminated inline sequence"))?;
        return decode_inline_sequence(inner, line);
    }

    let unsupported = match text.chars().next() {
        Some('{') => Some("flow mappings ({...}) are not supported"),
        Some('&') => Some("anchors (&name) are not supported"),
        Some('*') => Some("aliases (*name) are not supported"),
        Some('!') => Some("tags (!tag) are not supported"),
        _ if is_block_scalar_indicator(text) => Some("block scalars (| and >) are not supported"),
        _ => None,
    };
    if let Some(message) = unsupported {
        return Err(ParseError::new(line, message));
    }

    Ok(Node::string(text))
}

fn decode_inline_sequence(inner: &str, line: usize) -> Result<Node, ParseError> {
    if inner.trim().is_empty() {
        return Ok(Node::Sequence(Vec::new()));
    }
    let mut parts = split_top_level(inner, ',');
    if parts.len() > 1 && parts.last().map_or(false, |p| p.trim().is_empty()) {
        parts.pop();
    }
    let items = parts
        .into_iter()
        .map(|part| decode_scalar(part, line))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Node::Sequence(items))
}
