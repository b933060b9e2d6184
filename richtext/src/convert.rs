//! Plain text to rich-text conversion used when seeding pages from legacy
//! `.txt` content.
//!
//! Classification is heuristic. The thresholds below match content that was
//! generated earlier and is already stored.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::{BlockNode, Document, HeadingTag};

/// Blocks are separated by a blank line.
const BLOCK_SEPARATOR: &str = "\n\n";

/// A single-line block shorter than this (in UTF-16 code units) that does not
/// end with a period is taken to be a heading.
const HEADING_MAX_LEN: usize = 80;

// ASCII digits only; `\d` would also accept other scripts' digits.
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.").expect("valid list marker regex"));
static LIST_MARKER_WITH_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.\s*").expect("valid list marker regex"));

/// Convert freeform text into a document of headings, numbered lists and
/// paragraphs. Total over all inputs; the empty string yields an empty root.
pub fn text_to_document(text: &str) -> Document {
    let children = text
        .split(BLOCK_SEPARATOR)
        .map(classify_block)
        .filter(|node| !is_blank_paragraph(node))
        .collect();
    Document::new(children)
}

fn classify_block(block: &str) -> BlockNode {
    let lines: Vec<&str> = block.split('\n').collect();

    let all_list_or_blank = lines
        .iter()
        .all(|line| is_list_line(line) || trim_text(line).is_empty());
    if all_list_or_blank && lines.iter().any(|line| is_list_line(line)) {
        return BlockNode::numbered_list(
            lines
                .iter()
                .filter(|line| is_list_line(line))
                .map(|line| trim_text(strip_list_marker(line)).to_string()),
        );
    }

    if is_heading(block) {
        return BlockNode::heading(HeadingTag::H2, trim_text(block));
    }

    BlockNode::paragraph(trim_text(&block.replace('\n', " ")))
}

/// An empty block is never a heading: it falls through to an empty paragraph
/// and is dropped, so `""` and trailing separators produce no nodes.
fn is_heading(block: &str) -> bool {
    !block.is_empty()
        && block.encode_utf16().count() < HEADING_MAX_LEN
        && !block.ends_with('.')
        && !block.contains('\n')
}

/// `1.`, `12.` ... after trimming. The text after the period is not inspected.
fn is_list_line(line: &str) -> bool {
    LIST_MARKER.is_match(trim_text(line))
}

/// Remove `digits.` and the whitespace after it. Applied to the untrimmed
/// line, so an indented marker is left in place.
fn strip_list_marker(line: &str) -> &str {
    match LIST_MARKER_WITH_SPACE.find(line) {
        Some(marker) => &line[marker.end()..],
        None => line,
    }
}

/// Whitespace trimming that also drops a byte order mark, so a file saved
/// with a BOM classifies the same as one without.
fn trim_text(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

fn is_blank_paragraph(node: &BlockNode) -> bool {
    match node {
        BlockNode::Paragraph { children } => children
            .first()
            .is_none_or(|text| trim_text(&text.text).is_empty()),
        _ => false,
    }
}
