//! Section-summary fragment.
//!
//! A paper's `section_summaries` field is a markup fragment holding one
//! block per summarized section:
//!
//! ```text
//! <div class="paragraph-summary"><h4>2.1 Results</h4><div class="summary-content">…</div></div>
//! ```
//!
//! The fragment is parsed into [`SummaryBlock`]s when sections are
//! re-summarized or displayed and rendered back (with escaping) for
//! storage. Parsing is lenient: a malformed tail is dropped and whatever
//! blocks were read before it are kept.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use tracing::warn;

const BLOCK_CLASS: &[u8] = b"paragraph-summary";
const CONTENT_CLASS: &[u8] = b"summary-content";
/// Suffix that older fragments appended to every block title.
const LEGACY_TITLE_SUFFIX: &str = "の要約:";

/// One summarized section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryBlock {
    pub title: String,
    pub content: String,
}

impl SummaryBlock {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Content,
}

fn has_class(e: &BytesStart<'_>, class: &[u8]) -> bool {
    e.attributes().any(|a| {
        a.as_ref()
            .map(|a| a.key.as_ref() == b"class" && a.value.as_ref() == class)
            .unwrap_or(false)
    })
}

static STRAY_LT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([A-Za-z/!?])?").unwrap());
static STRAY_AMP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(#?[A-Za-z0-9]+;)?").unwrap());

/// Escape `<` and `&` that cannot start markup or an entity.
///
/// Older fragments stored summary text unescaped, so `a < b` or `R&D`
/// appear verbatim between the tags.
fn escape_stray(fragment: &str) -> String {
    let lt = STRAY_LT_RE.replace_all(fragment, |caps: &regex::Captures<'_>| match caps.get(1) {
        Some(next) => format!("<{}", next.as_str()),
        None => "&lt;".to_string(),
    });
    STRAY_AMP_RE
        .replace_all(&lt, |caps: &regex::Captures<'_>| match caps.get(1) {
            Some(entity) => format!("&{}", entity.as_str()),
            None => "&amp;".to_string(),
        })
        .into_owned()
}

/// Parse a stored fragment into blocks, in document order.
///
/// Unclosed inline tags such as `<br>` are tolerated; a line break tag
/// inside a block becomes `\n`.
pub fn parse(fragment: &str) -> Vec<SummaryBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<SummaryBlock> = None;
    let mut field: Option<Field> = None;
    let source = escape_stray(fragment);
    let mut reader = quick_xml::Reader::from_str(&source);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"div" if has_class(&e, BLOCK_CLASS) => {
                    if let Some(done) = current.take() {
                        blocks.push(done);
                    }
                    current = Some(SummaryBlock::new("", ""));
                    field = None;
                }
                b"div" if has_class(&e, CONTENT_CLASS) => field = Some(Field::Content),
                b"h4" => field = Some(Field::Title),
                b"br" => push_line_break(current.as_mut(), field),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"br" {
                    push_line_break(current.as_mut(), field);
                }
            }
            Ok(Event::End(e)) => {
                if matches!(e.local_name().as_ref(), b"h4" | b"div") {
                    field = None;
                }
            }
            Ok(Event::Text(te)) => {
                if let (Some(block), Some(f)) = (current.as_mut(), field) {
                    let text = match te.unescape() {
                        Ok(t) => t.into_owned(),
                        Err(_) => String::from_utf8_lossy(&te).into_owned(),
                    };
                    match f {
                        Field::Title => block.title.push_str(&text),
                        Field::Content => block.content.push_str(&text),
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(error = %e, "section summaries fragment is malformed; keeping parsed blocks");
                break;
            }
            _ => {}
        }
    }
    if let Some(done) = current {
        blocks.push(done);
    }

    for block in &mut blocks {
        let title = block.title.trim();
        block.title = title
            .strip_suffix(LEGACY_TITLE_SUFFIX)
            .unwrap_or(title)
            .trim_end()
            .to_string();
    }
    blocks
}

fn push_line_break(block: Option<&mut SummaryBlock>, field: Option<Field>) {
    if let (Some(block), Some(Field::Content)) = (block, field) {
        block.content.push('\n');
    }
}

/// Render blocks into a fragment suitable for storage.
pub fn render(blocks: &[SummaryBlock]) -> String {
    blocks
        .iter()
        .map(|b| {
            format!(
                r#"<div class="paragraph-summary"><h4>{}</h4><div class="summary-content">{}</div></div>"#,
                escape(b.title.as_str()),
                escape(b.content.as_str())
            )
        })
        .collect()
}

/// Combine freshly generated blocks with a previously stored fragment.
///
/// Fresh blocks come first in the order given; previous blocks whose
/// title was not regenerated follow in their stored order.
pub fn merge(previous: &str, fresh: &[SummaryBlock]) -> String {
    let mut blocks: Vec<SummaryBlock> = fresh.to_vec();
    blocks.extend(
        parse(previous)
            .into_iter()
            .filter(|old| !fresh.iter().any(|f| f.title == old.title)),
    );
    render(&blocks)
}

/// Replace the content of the block titled `title`, keeping block order.
///
/// Returns `None` when the fragment has no such block.
pub fn replace_content(fragment: &str, title: &str, content: &str) -> Option<String> {
    let mut blocks = parse(fragment);
    let block = blocks.iter_mut().find(|b| b.title == title)?;
    block.content = content.to_string();
    Some(render(&blocks))
}

static SECTION_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)*)").unwrap());

/// Hierarchical number of a section title (`"2.10 Foo"` → `[2, 10]`).
///
/// Titles without a leading number sort after every numbered one.
pub fn section_number(title: &str) -> Vec<u64> {
    match SECTION_NUMBER_RE.captures(title) {
        Some(caps) => caps[1]
            .split('.')
            .map(|n| n.parse().unwrap_or(u64::MAX))
            .collect(),
        None => vec![u64::MAX],
    }
}

fn compare_numbers(a: &[u64], b: &[u64]) -> Ordering {
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        if x != y {
            return x.cmp(&y);
        }
    }
    Ordering::Equal
}

/// Sort blocks by section number for display (`2` < `2.1` < `2.2` < `10`).
/// Ties keep their stored order.
pub fn sort_by_section_number(blocks: &mut [SummaryBlock]) {
    blocks.sort_by(|a, b| compare_numbers(&section_number(&a.title), &section_number(&b.title)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_then_parse_keeps_blocks() {
        let blocks = vec![
            SummaryBlock::new("1 Introduction", "Sets up the problem."),
            SummaryBlock::new("2 Method", "Uses <attention> & friends."),
        ];
        let fragment = render(&blocks);
        assert!(fragment.contains("&lt;attention&gt; &amp; friends"));
        assert_eq!(parse(&fragment), blocks);
    }

    #[test]
    fn parse_empty_fragment() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn parse_strips_legacy_title_suffix() {
        let fragment = "<div class=\"paragraph-summary\">\n    <h4>3 Results\u{306e}\u{8981}\u{7d04}:</h4>\n    <div class=\"summary-content\">Good numbers.</div>\n</div>";
        assert_eq!(
            parse(fragment),
            vec![SummaryBlock::new("3 Results", "Good numbers.")]
        );
    }

    #[test]
    fn parse_keeps_blocks_before_malformed_tail() {
        let mut fragment = render(&[SummaryBlock::new("1 A", "ok")]);
        fragment.push_str("<div class=\"paragraph-summary\"><h4>2 B</h4></span>");
        let blocks = parse(&fragment);
        assert_eq!(blocks[0], SummaryBlock::new("1 A", "ok"));
    }

    #[test]
    fn parse_tolerates_unescaped_legacy_text() {
        let fragment = concat!(
            "<div class=\"paragraph-summary\"><h4>1 Bounds</h4>",
            "<div class=\"summary-content\">a < b & c<br>next line</div></div>",
            "<div class=\"paragraph-summary\"><h4>2 R&D</h4>",
            "<div class=\"summary-content\">kept &amp; fine</div></div>",
        );
        assert_eq!(
            parse(fragment),
            vec![
                SummaryBlock::new("1 Bounds", "a < b & c\nnext line"),
                SummaryBlock::new("2 R&D", "kept & fine"),
            ]
        );
    }

    #[test]
    fn merge_puts_fresh_first_and_replaces_same_title() {
        let previous = render(&[
            SummaryBlock::new("1 Intro", "old intro"),
            SummaryBlock::new("2 Method", "old method"),
        ]);
        let merged = merge(&previous, &[SummaryBlock::new("2 Method", "new method")]);
        assert_eq!(
            parse(&merged),
            vec![
                SummaryBlock::new("2 Method", "new method"),
                SummaryBlock::new("1 Intro", "old intro"),
            ]
        );
    }

    #[test]
    fn replace_content_edits_one_block_in_place() {
        let fragment = render(&[
            SummaryBlock::new("1 Intro", "draft"),
            SummaryBlock::new("2 Method", "method"),
        ]);
        let edited = replace_content(&fragment, "1 Intro", "hand written").unwrap();
        assert_eq!(
            parse(&edited),
            vec![
                SummaryBlock::new("1 Intro", "hand written"),
                SummaryBlock::new("2 Method", "method"),
            ]
        );
        assert!(replace_content(&fragment, "3 Results", "x").is_none());
    }

    #[test]
    fn section_numbers() {
        assert_eq!(section_number("2.10 Results"), vec![2, 10]);
        assert_eq!(section_number("7 Conclusion"), vec![7]);
        assert_eq!(section_number("Introduction"), vec![u64::MAX]);
    }

    #[test]
    fn sorts_hierarchically() {
        let mut blocks = vec![
            SummaryBlock::new("10 Appendix", ""),
            SummaryBlock::new("Introduction", ""),
            SummaryBlock::new("2.2 B", ""),
            SummaryBlock::new("2 Top", ""),
            SummaryBlock::new("2.1 A", ""),
        ];
        sort_by_section_number(&mut blocks);
        let titles: Vec<&str> = blocks.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["2 Top", "2.1 A", "2.2 B", "10 Appendix", "Introduction"]
        );
    }
}
