//! Agent card parser
//!
//! Parses the restricted YAML dialect used for agent cards: block mappings,
//! block sequences (including `- key: value` item mappings), inline `[...]`
//! sequences and plain or quoted scalars. Indentation decides nesting.
//!
//! Root-level indentation problems are hard errors. Inside nested blocks the
//! parser is lenient: lines indented deeper than their block continue that
//! block, and lines that cannot be attached anywhere are skipped with a
//! warning. Unsupported YAML features always fail.

use super::node::{Mapping, Node};
use super::scalar::{decode_scalar, find_key_colon, strip_trailing_comment, unquote};
use crate::error::ParseError;
use tracing::warn;

/// Columns a leading tab expands to.
const TAB_WIDTH: usize = 2;

#[derive(Debug, Clone)]
struct Line {
    /// 1-based source line
    number: usize,
    indent: usize,
    content: String,
}

fn is_sequence_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ")
}

/// Parse card text into a document tree.
///
/// An empty (or comment-only) document yields an empty mapping.
pub fn parse_document(text: &str) -> Result<Node, ParseError> {
    let lines = preprocess(text)?;
    let mut parser = Parser { lines, pos: 0 };
    parser.parse_root()
}

fn preprocess(text: &str) -> Result<Vec<Line>, ParseError> {
    let mut lines = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let number = idx + 1;
        let body = raw.trim_start_matches(|c| c == ' ' || c == '\t');
        if body.is_empty() || body.starts_with('#') {
            continue;
        }
        let indent = raw[..raw.len() - body.len()]
            .chars()
            .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
            .sum();
        let content = strip_trailing_comment(body).trim_end();

        if content == "---" || content.starts_with("--- ") || content == "..." {
            return Err(ParseError::new(
                number,
                "multi-document streams (---, ...) are not supported",
            ));
        }
        if content.starts_with('%') {
            return Err(ParseError::new(number, "directives (%) are not supported"));
        }

        lines.push(Line {
            number,
            indent,
            content: content.to_string(),
        });
    }
    Ok(lines)
}

struct Parser {
    lines: Vec<Line>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Line> {
        self.lines.get(self.pos)
    }

    fn parse_root(&mut self) -> Result<Node, ParseError> {
        let indent = match self.peek() {
            Some(first) => first.indent,
            None => return Ok(Node::Mapping(Mapping::new())),
        };
        let root = self.parse_block(indent, 0)?;
        if let Some(line) = self.peek() {
            return Err(ParseError::new(
                line.number,
                format!(
                    "inconsistent indentation at document root: expected {} spaces, found {}",
                    indent, line.indent
                ),
            ));
        }
        Ok(root)
    }

    fn parse_block(&mut self, indent: usize, depth: usize) -> Result<Node, ParseError> {
        let is_sequence = self
            .peek()
            .map_or(false, |line| is_sequence_item(&line.content));
        if is_sequence {
            self.parse_sequence(indent, depth)
        } else {
            self.parse_mapping(indent, depth)
        }
    }

    fn parse_sequence(&mut self, indent: usize, depth: usize) -> Result<Node, ParseError> {
        let mut items: Vec<Node> = Vec::new();

        while let Some(line) = self.peek().cloned() {
            if line.indent < indent {
                break;
            }

            if line.indent > indent {
                // Continuation indented between the dash and the item's
                // content column: attach to the last item if it is a mapping.
                let attachable = !is_sequence_item(&line.content)
                    && matches!(items.last(), Some(Node::Mapping(_)));
                if attachable {
                    let extra = self.parse_mapping(line.indent, depth + 1)?;
                    if let (Some(Node::Mapping(last)), Node::Mapping(extra)) =
                        (items.last_mut(), extra)
                    {
                        for (key, value) in extra.iter() {
                            last.insert(key.to_string(), value.clone());
                        }
                    }
                    continue;
                }
                if depth == 0 {
                    return Err(ParseError::new(
                        line.number,
                        "unexpected indentation after sequence item at document root",
                    ));
                }
                self.skip_unattached();
                continue;
            }

            if !is_sequence_item(&line.content) {
                if depth == 0 {
                    return Err(ParseError::new(
                        line.number,
                        "mapping key mixed with sequence items at document root",
                    ));
                }
                break;
            }

            let number = line.number;
            let after_dash = &line.content[1..];
            let rest = after_dash.trim_start();
            let item_indent = indent + 1 + (after_dash.len() - rest.len());

            if rest.is_empty() {
                self.pos += 1;
                let item = match self.peek().map(|next| next.indent) {
                    Some(child_indent) if child_indent > indent => {
                        self.parse_block(child_indent, depth + 1)?
                    }
                    _ => Node::null(),
                };
                items.push(item);
            } else if is_sequence_item(rest) || find_key_colon(rest).is_some() {
                // Re-read the remainder as the first line of a nested block
                // sitting at the item's content column.
                let rest = rest.to_string();
                self.lines[self.pos] = Line {
                    number,
                    indent: item_indent,
                    content: rest,
                };
                items.push(self.parse_block(item_indent, depth + 1)?);
            } else {
                let item = decode_scalar(rest, number)?;
                self.pos += 1;
                items.push(item);
            }
        }

        Ok(Node::Sequence(items))
    }

    fn parse_mapping(&mut self, indent: usize, depth: usize) -> Result<Node, ParseError> {
        let mut map = Mapping::new();

        while let Some(line) = self.peek().cloned() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent && depth == 0 {
                return Err(ParseError::new(
                    line.number,
                    format!(
                        "unexpected indentation at document root: expected {} spaces, found {}",
                        indent, line.indent
                    ),
                ));
            }

            let number = line.number;
            let line_indent = line.indent;

            if is_sequence_item(&line.content) {
                if depth == 0 {
                    return Err(ParseError::new(
                        number,
                        "sequence item mixed with mapping keys at document root",
                    ));
                }
                if line_indent == indent {
                    break;
                }
                self.skip_unattached();
                continue;
            }

            let colon = match find_key_colon(&line.content) {
                Some(colon) => colon,
                None => {
                    if line.content.starts_with('{') {
                        return Err(ParseError::new(
                            number,
                            "flow mappings ({...}) are not supported",
                        ));
                    }
                    if depth == 0 {
                        return Err(ParseError::new(number, "expected 'key: value'"));
                    }
                    self.skip_unattached();
                    continue;
                }
            };

            let raw_key = line.content[..colon].trim();
            let key = unquote(raw_key).unwrap_or(raw_key).to_string();
            let value_text = line.content[colon + 1..].trim();
            self.pos += 1;

            let value = if value_text.is_empty() {
                let next = self
                    .peek()
                    .map(|next| (next.indent, is_sequence_item(&next.content)));
                match next {
                    Some((child_indent, _)) if child_indent > line_indent => {
                        self.parse_block(child_indent, depth + 1)?
                    }
                    Some((child_indent, true)) if child_indent == line_indent => {
                        self.parse_sequence(line_indent, depth + 1)?
                    }
                    _ => Node::null(),
                }
            } else {
                decode_scalar(value_text, number)?
            };

            if map.insert(key.clone(), value).is_some() {
                warn!(line = number, key = %key, "Duplicate key in agent card, later value wins");
            }
        }

        Ok(Node::Mapping(map))
    }

    /// Skip the current line and everything nested under it.
    fn skip_unattached(&mut self) {
        let Some(line) = self.peek() else {
            return;
        };
        let (number, indent) = (line.number, line.indent);
        warn!(line = number, "Ignoring agent card line that has no parent to attach to");
        self.pos += 1;
        while self.peek().map_or(false, |next| next.indent > indent) {
            self.pos += 1;
        }
    }
}
