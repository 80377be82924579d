//! Markdown to change-set parsing.
//!
//! The document is first flattened into block nodes with `pulldown-cmark`,
//! then folded by [`WalkState`] into the pending and released changes.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::domain::change::{Category, Change, RELEASE_PREFIX};
use crate::domain::version::parse_tolerant;

/// A top-level block of the document, reduced to plain text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(String),
    Paragraph(String),
    /// One string per top-level list item; nested lists are folded into their item
    List(Vec<String>),
}

/// Reasons the fold over blocks stops
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkError {
    /// A second pending block was found
    DuplicateUnreleased,
    /// The event stream or the walk state is inconsistent
    Structural(String),
}

/// Result of a parse, before any reconciliation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedChangelog {
    pub unreleased: Option<Change>,
    /// Explicit increment from `## [Unreleased] - MINOR`, uppercased
    pub increment: Option<String>,
    /// Released blocks in document order
    pub released: Vec<Change>,
}

static UNRELEASED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\[unreleased\]$").unwrap());
static UNRELEASED_INCREMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[unreleased\]-([a-z]+)$").unwrap());
static RELEASED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\d+\.\d+\.\d+(?:[-+][0-9a-z.+-]*)?\]-[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap()
});
static BRACKETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.*?)\]").unwrap());

/// Lowercase and drop all whitespace, the form header patterns match against.
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Inline containers whose source text is kept as written
fn is_inline(tag: &Tag) -> bool {
    matches!(
        tag,
        Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. }
    )
}

fn is_inline_end(tag: &TagEnd) -> bool {
    matches!(
        tag,
        TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link | TagEnd::Image
    )
}

/// Append the source slice covered by `span` to `text`, one line per space.
///
/// A backslash escaping the first character sits outside the first event's
/// range and is pulled back in.
fn flush(source: &str, span: &mut Option<Range<usize>>, text: &mut String) {
    let Some(range) = span.take() else {
        return;
    };
    let start = if source[..range.start].ends_with('\\') {
        range.start - 1
    } else {
        range.start
    };
    let joined = source[start..range.end]
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        return;
    }
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(&joined);
}

fn extend(span: &mut Option<Range<usize>>, range: Range<usize>) {
    *span = Some(match span.take() {
        Some(current) => current.start.min(range.start)..current.end.max(range.end),
        None => range,
    });
}

/// Flatten a Markdown document into its top-level blocks.
///
/// Inline content is sliced from the source rather than rebuilt from
/// events, so escapes, entities, inline HTML, code spans and links survive
/// exactly as written. Line breaks inside a block become single spaces.
pub fn blocks(source: &str) -> Result<Vec<Block>, WalkError> {
    let mut blocks = Vec::new();
    let mut text = String::new();
    let mut span: Option<Range<usize>> = None;
    let mut items: Vec<String> = Vec::new();
    let mut in_heading = false;
    let mut list_depth = 0usize;

    for (event, range) in Parser::new(source).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                in_heading = true;
                span = None;
                text.clear();
            }
            Event::End(TagEnd::Heading(_)) => {
                if !in_heading {
                    return Err(WalkError::Structural("heading closed before it was opened".into()));
                }
                in_heading = false;
                flush(source, &mut span, &mut text);
                blocks.push(Block::Heading(std::mem::take(&mut text)));
            }
            Event::Start(Tag::List(_)) => {
                flush(source, &mut span, &mut text);
                list_depth += 1;
                if list_depth == 1 {
                    items.clear();
                }
            }
            Event::End(TagEnd::List(_)) => {
                flush(source, &mut span, &mut text);
                list_depth = list_depth
                    .checked_sub(1)
                    .ok_or_else(|| WalkError::Structural("list closed before it was opened".into()))?;
                if list_depth == 0 {
                    blocks.push(Block::List(std::mem::take(&mut items)));
                }
            }
            Event::Start(Tag::Item) => {
                flush(source, &mut span, &mut text);
                if list_depth == 1 {
                    text.clear();
                }
            }
            Event::End(TagEnd::Item) => {
                if list_depth == 0 {
                    return Err(WalkError::Structural("list item outside of a list".into()));
                }
                flush(source, &mut span, &mut text);
                if list_depth == 1 {
                    items.push(std::mem::take(&mut text));
                }
            }
            Event::Start(Tag::Paragraph | Tag::HtmlBlock) => {
                if list_depth == 0 {
                    span = None;
                    text.clear();
                } else {
                    flush(source, &mut span, &mut text);
                }
            }
            Event::End(TagEnd::Paragraph | TagEnd::HtmlBlock) => {
                flush(source, &mut span, &mut text);
                if list_depth == 0 {
                    let paragraph = std::mem::take(&mut text);
                    if !paragraph.is_empty() {
                        blocks.push(Block::Paragraph(paragraph));
                    }
                }
            }
            Event::Start(tag) if is_inline(&tag) => extend(&mut span, range),
            Event::End(tag) if is_inline_end(&tag) => extend(&mut span, range),
            Event::Start(_) | Event::End(_) => flush(source, &mut span, &mut text),
            // text, code spans, inline and block HTML, breaks
            _ => extend(&mut span, range),
        }
    }

    if in_heading || list_depth != 0 {
        return Err(WalkError::Structural("document ended inside an open block".into()));
    }
    Ok(blocks)
}

/// Which change the walk is currently filling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Unreleased,
    Released(usize),
}

/// Fold state over the document blocks
#[derive(Debug, Default)]
pub struct WalkState {
    parsed: ParsedChangelog,
    cursor: Option<Cursor>,
    category: Option<Category>,
}

impl WalkState {
    /// Consume one block.
    pub fn step(&mut self, block: &Block) -> Result<(), WalkError> {
        match block {
            Block::Heading(text) => self.heading(text)?,
            Block::Paragraph(text) => self.append(text)?,
            Block::List(items) => {
                for item in items {
                    self.append(item)?;
                }
            }
        }
        Ok(())
    }

    pub fn finish(self) -> ParsedChangelog {
        self.parsed
    }

    /// What survives a structural failure: released blocks read so far,
    /// but no pending release.
    pub fn recover(self) -> ParsedChangelog {
        ParsedChangelog {
            unreleased: None,
            increment: None,
            released: self.parsed.released,
        }
    }

    fn heading(&mut self, text: &str) -> Result<(), WalkError> {
        let normalized = normalize(text);

        if let Some(caps) = UNRELEASED_INCREMENT.captures(&normalized) {
            let increment = caps.get(1).map(|m| m.as_str().to_uppercase());
            return self.open_unreleased(text, increment);
        }
        if UNRELEASED.is_match(&normalized) {
            return self.open_unreleased(text, None);
        }
        if RELEASED.is_match(&normalized) {
            self.open_released(text);
            return Ok(());
        }
        if self.cursor.is_some() {
            if let Some(category) = Category::from_heading(&normalized) {
                self.category = Some(category);
                return Ok(());
            }
        }
        self.append(text)
    }

    fn open_unreleased(&mut self, text: &str, increment: Option<String>) -> Result<(), WalkError> {
        if self.parsed.unreleased.is_some() {
            return Err(WalkError::DuplicateUnreleased);
        }
        debug!(heading = text, ?increment, "found pending release");
        self.parsed.unreleased = Some(Change::with_header(None, format!("{}{}", RELEASE_PREFIX, text)));
        self.parsed.increment = increment;
        self.cursor = Some(Cursor::Unreleased);
        self.category = None;
        Ok(())
    }

    fn open_released(&mut self, text: &str) {
        self.cursor = None;
        self.category = None;

        let version_text = BRACKETED
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .unwrap_or_default();
        match parse_tolerant(version_text) {
            Ok(version) => {
                debug!(%version, "found released version");
                self.parsed.released.push(Change::with_header(
                    Some(version),
                    format!("{}{}", RELEASE_PREFIX, text),
                ));
                self.cursor = Some(Cursor::Released(self.parsed.released.len() - 1));
            }
            Err(e) => warn!(heading = text, error = %e, "skipping release with unparsable version"),
        }
    }

    fn append(&mut self, text: &str) -> Result<(), WalkError> {
        let (cursor, category) = match (self.cursor, self.category) {
            (Some(cursor), Some(category)) => (cursor, category),
            _ => return Ok(()),
        };
        let change = match cursor {
            Cursor::Unreleased => self.parsed.unreleased.as_mut(),
            Cursor::Released(idx) => self.parsed.released.get_mut(idx),
        }
        .ok_or_else(|| WalkError::Structural(format!("no open change for {:?}", cursor)))?;
        change.push_entry(category, text);
        Ok(())
    }
}

/// Fold the blocks of `source` into a change-set.
///
/// A structural error degrades to "no pending release"; only a duplicate
/// pending block is reported.
pub fn walk(source: &str) -> Result<ParsedChangelog, WalkError> {
    let mut state = WalkState::default();
    let result = blocks(source).and_then(|blocks| blocks.iter().try_for_each(|block| state.step(block)));

    match result {
        Ok(()) => Ok(state.finish()),
        Err(WalkError::Structural(reason)) => {
            warn!(%reason, "malformed changelog, ignoring any pending release");
            Ok(state.recover())
        }
        Err(e) => Err(e),
    }
}
