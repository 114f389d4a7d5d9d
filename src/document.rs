//! Managed section inside CLAUDE.md.
//!
//! The document is parsed once with pulldown-cmark to find real heading
//! lines (a `#` inside a fenced code block is not a heading). The managed
//! section starts at the heading whose text is exactly [`MANAGED_PHRASE`]
//! and runs up to the next heading of the same or higher rank, or to the end
//! of the document. Presence detection and removal both use that one range.
//!
//! Everything outside the section is kept byte for byte, line endings
//! included; only the seam left by a cut is tidied.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Three or more consecutive line breaks.
static EXCESS_LINE_BREAKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\r?\n)(?:\r?\n){2,}").expect("line break pattern is valid")
});

/// Heading text of the managed section. A heading that only mentions it
/// is not the managed section.
pub const MANAGED_PHRASE: &str = "모드 변경(Shift+Tab) 후 에이전트 자동 복원";

/// What `upsert_section` did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionUpsert {
    Added,
    Replaced,
    SkippedExisting,
}

/// A heading line and its rank
#[derive(Debug)]
struct Heading {
    level: usize,
    title: String,
    /// Byte offset of the start of the heading's line
    line_start: usize,
}

fn heading_level_to_usize(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn parse_headings(text: &str) -> Vec<Heading> {
    let opts = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES;
    let events: Vec<(Event, Range<usize>)> =
        CmarkParser::new_ext(text, opts).into_offset_iter().collect();

    let mut headings = Vec::new();
    let mut i = 0;
    while i < events.len() {
        if let Event::Start(Tag::Heading { level, .. }) = &events[i].0 {
            let level = heading_level_to_usize(*level);
            let start = events[i].1.start;
            let line_start = text[..start].rfind('\n').map_or(0, |p| p + 1);

            let mut title = String::new();
            i += 1;
            while i < events.len() {
                match &events[i].0 {
                    Event::End(TagEnd::Heading(_)) => break,
                    Event::Text(t) | Event::Code(t) => title.push_str(t),
                    _ => {}
                }
                i += 1;
            }

            headings.push(Heading {
                level,
                title: title.trim().to_string(),
                line_start,
            });
        }
        i += 1;
    }
    headings
}

/// Byte range of the managed section, if the document has one.
pub fn find_section(text: &str) -> Option<Range<usize>> {
    let headings = parse_headings(text);
    let idx = headings
        .iter()
        .position(|h| h.title == MANAGED_PHRASE)?;
    let start = headings[idx].line_start;
    let level = headings[idx].level;
    let end = headings[idx + 1..]
        .iter()
        .find(|h| h.level <= level)
        .map_or(text.len(), |h| h.line_start);
    Some(start..end)
}

pub fn has_section(text: &str) -> bool {
    find_section(text).is_some()
}

/// Append `template` as the managed section.
///
/// An existing section is kept unless `force` is set, in which case it is
/// cut out and the new content appended at the end of the document.
pub fn upsert_section(text: &str, template: &str, force: bool) -> (String, SectionUpsert) {
    let (base, action) = match find_section(text) {
        Some(_) if !force => return (text.to_string(), SectionUpsert::SkippedExisting),
        Some(range) => (cut(text, range), SectionUpsert::Replaced),
        None => (text.to_string(), SectionUpsert::Added),
    };
    let eol = line_ending(text);
    (append_block(&base, template, eol), action)
}

/// Remove the managed section. Returns the new text and whether anything
/// was removed; an unmanaged document comes back unchanged.
pub fn remove_section(text: &str) -> (String, bool) {
    match find_section(text) {
        Some(range) => {
            let rest = cut(text, range);
            let trimmed = rest.trim_end();
            if trimmed.is_empty() {
                (String::new(), true)
            } else {
                (format!("{trimmed}{}", line_ending(text)), true)
            }
        }
        None => (text.to_string(), false),
    }
}

/// Drop `range` from `text`. Blank lines are only collapsed where the two
/// remaining halves meet; a section cut from the top takes its trailing
/// line breaks with it.
fn cut(text: &str, range: Range<usize>) -> String {
    let before = &text[..range.start];
    let mut after = &text[range.end..];
    if before.is_empty() {
        after = after.trim_start_matches(['\r', '\n']);
    }

    // Widen the seam to the line breaks on both sides of it
    let head = before.trim_end_matches(['\r', '\n']);
    let tail = after.trim_start_matches(['\r', '\n']);
    let seam = format!("{}{}", &before[head.len()..], &after[..after.len() - tail.len()]);

    let mut rest = String::with_capacity(text.len());
    rest.push_str(head);
    rest.push_str(&collapse_blank_lines(&seam));
    rest.push_str(tail);
    rest
}

fn append_block(text: &str, block: &str, eol: &str) -> String {
    let block = block.trim();
    let existing = text.trim_end();
    if existing.is_empty() {
        format!("{block}{eol}")
    } else {
        format!("{existing}{eol}{eol}{block}{eol}")
    }
}

/// Collapse runs of three or more line breaks to two, keeping the
/// terminator style of the run.
fn collapse_blank_lines(content: &str) -> String {
    EXCESS_LINE_BREAKS.replace_all(content, "$1$1").into_owned()
}

/// `\r\n` when the document already uses it, `\n` otherwise.
fn line_ending(text: &str) -> &'static str {
    if text.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}
