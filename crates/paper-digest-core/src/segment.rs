//! Heading-based section segmenter.
//!
//! Turns the positioned text runs of a PDF (one [`Page`] of
//! [`TextItem`]s per page) into an ordered list of [`Section`]s, the
//! concatenated plain text of the document, and a guess at its title.
//!
//! PDF text layers carry no newline markers, so lines are rebuilt from
//! baseline positions: whenever the baseline moves by more than
//! [`SegmenterOptions::line_threshold`] a new line starts.
//!
//! # Algorithm
//!
//! 1. Start with a default section (`"Introduction"`) that collects text
//!    before the first heading.
//! 2. Walk each page's items in emission order, appending each item's text
//!    to the current line.
//! 3. On a line boundary, trim the finished line. If the
//!    [`HeadingDetector`] accepts it, close the current section (only if it
//!    holds non-whitespace content) and open a new one titled with that
//!    line. Otherwise append the line plus `\n` to the current section.
//! 4. At the end of a page, the trailing partial line is always appended
//!    to the content; it is never tested as a heading.
//! 5. After the last page, keep the current section if it has content.
//! 6. The title guess is the first line of the full text, truncated to
//!    [`SegmenterOptions::title_max_chars`] characters.
//!
//! Segmentation is deterministic and never fails: a document without
//! heading-like lines degrades to a single section, and a document without
//! text yields no sections at all.
//!
//! # Example
//!
//! ```rust
//! use paper_digest_core::models::{Page, TextItem};
//! use paper_digest_core::segment::segment;
//!
//! let page = Page::new(vec![
//!     TextItem::new("2.1 Results", 700.0),
//!     TextItem::new("We measured things.", 680.0),
//!     TextItem::new("Then more things.", 660.0),
//! ]);
//! let out = segment(&[page]);
//! assert_eq!(out.sections.len(), 1);
//! assert_eq!(out.sections[0].title, "2.1 Results");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Page, Section};

/// Baseline movement (in source units) that starts a new line.
pub const DEFAULT_LINE_THRESHOLD: f64 = 5.0;
/// Title of the section that collects text before the first heading.
pub const DEFAULT_SECTION_TITLE: &str = "Introduction";
/// Maximum characters kept for the title guess.
pub const DEFAULT_TITLE_MAX_CHARS: usize = 100;

/// Decides whether a trimmed line is a section heading.
///
/// The default is [`NumberedHeading`]; other detectors (font-size or
/// model based) can be swapped in without touching line accumulation.
pub trait HeadingDetector: Send + Sync {
    fn is_heading(&self, line: &str) -> bool;
}

impl<F> HeadingDetector for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_heading(&self, line: &str) -> bool {
        self(line)
    }
}

/// Matches numbered headings such as `3 Method` or `2.1.4 Ablations`.
///
/// Only ASCII-uppercase initials are accepted, so `2.1 results` or a
/// heading in a non-Latin script is treated as body text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberedHeading;

static NUMBERED_HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+\.)*[0-9]+\s+[A-Z]").unwrap());

impl HeadingDetector for NumberedHeading {
    fn is_heading(&self, line: &str) -> bool {
        NUMBERED_HEADING_RE.is_match(line)
    }
}

/// Tunables for [`Segmenter`].
#[derive(Debug, Clone)]
pub struct SegmenterOptions {
    pub line_threshold: f64,
    pub default_title: String,
    pub title_max_chars: usize,
}

impl Default for SegmenterOptions {
    fn default() -> Self {
        Self {
            line_threshold: DEFAULT_LINE_THRESHOLD,
            default_title: DEFAULT_SECTION_TITLE.to_string(),
            title_max_chars: DEFAULT_TITLE_MAX_CHARS,
        }
    }
}

/// Output of a segmentation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segmentation {
    pub sections: Vec<Section>,
    /// Every reconstructed line, `\n`-terminated, with a blank line after each page.
    pub text: String,
    /// First line of `text`, possibly empty. Callers substitute `"Untitled"`.
    pub title_guess: String,
}

/// Receives per-page progress while a document is segmented.
///
/// Advisory only: the segmenter never pauses or stops because of it.
pub trait SegmentProgress {
    /// Called after page `page` (1-based) of `total` has been processed.
    fn page_done(&self, page: usize, total: usize);
}

/// Progress sink that discards every event.
pub struct NoProgress;

impl SegmentProgress for NoProgress {
    fn page_done(&self, _page: usize, _total: usize) {}
}

/// Section segmenter parameterised by its heading detector.
pub struct Segmenter<D = NumberedHeading> {
    detector: D,
    options: SegmenterOptions,
}

impl Segmenter<NumberedHeading> {
    pub fn new() -> Self {
        Self::with_detector(NumberedHeading)
    }
}

impl Default for Segmenter<NumberedHeading> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: HeadingDetector> Segmenter<D> {
    pub fn with_detector(detector: D) -> Self {
        Self {
            detector,
            options: SegmenterOptions::default(),
        }
    }

    pub fn options(mut self, options: SegmenterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn segment(&self, pages: &[Page]) -> Segmentation {
        self.segment_with_progress(pages, &NoProgress)
    }

    pub fn segment_with_progress(
        &self,
        pages: &[Page],
        progress: &dyn SegmentProgress,
    ) -> Segmentation {
        let mut sections = Vec::new();
        let mut current = Section {
            title: self.options.default_title.clone(),
            content: String::new(),
        };
        let mut text = String::new();

        for (page_index, page) in pages.iter().enumerate() {
            let mut page_text = String::new();
            let mut last_y: Option<f64> = None;
            let mut line = String::new();

            for item in &page.items {
                if let Some(y) = last_y {
                    if (y - item.baseline_y).abs() > self.options.line_threshold {
                        let finished = line.trim();
                        if !finished.is_empty() {
                            page_text.push_str(finished);
                            page_text.push('\n');
                            if self.detector.is_heading(finished) {
                                let next = Section {
                                    title: finished.to_string(),
                                    content: String::new(),
                                };
                                let done = std::mem::replace(&mut current, next);
                                if !done.content.trim().is_empty() {
                                    sections.push(done);
                                }
                            } else {
                                current.content.push_str(finished);
                                current.content.push('\n');
                            }
                        }
                        line.clear();
                    }
                }
                line.push_str(&item.text);
                last_y = Some(item.baseline_y);
            }

            // Trailing line of the page: content only, never a heading.
            let trailing = line.trim();
            if !trailing.is_empty() {
                page_text.push_str(trailing);
                page_text.push('\n');
                current.content.push_str(trailing);
                current.content.push('\n');
            }

            text.push_str(&page_text);
            text.push('\n');
            progress.page_done(page_index + 1, pages.len());
        }

        if !current.content.trim().is_empty() {
            sections.push(current);
        }

        let title_guess = text
            .trim()
            .split('\n')
            .next()
            .unwrap_or_default()
            .chars()
            .take(self.options.title_max_chars)
            .collect();

        Segmentation {
            sections,
            text,
            title_guess,
        }
    }
}

/// Segment with the default numbered-heading detector and options.
pub fn segment(pages: &[Page]) -> Segmentation {
    Segmenter::new().segment(pages)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::models::TextItem;

    fn lines(lines: &[&str]) -> Page {
        Page::new(
            lines
                .iter()
                .enumerate()
                .map(|(i, l)| TextItem::new(*l, 700.0 - 20.0 * i as f64))
                .collect(),
        )
    }

    #[test]
    fn heading_pattern() {
        let h = NumberedHeading;
        assert!(h.is_heading("1 Introduction"));
        assert!(h.is_heading("2.1 Related Work"));
        assert!(h.is_heading("10.2.3 Ablation"));
        assert!(!h.is_heading("2.1 related work"));
        assert!(!h.is_heading("Introduction"));
        assert!(!h.is_heading("2.Results"));
        assert!(!h.is_heading("1. Introduction"));
        assert!(!h.is_heading("3 関連研究"));
    }

    #[test]
    fn no_line_breaks_gives_single_default_section() {
        let page = Page::new(vec![
            TextItem::new("Deep ", 500.0),
            TextItem::new("learning ", 502.0),
            TextItem::new("works", 498.0),
        ]);
        let out = segment(&[page]);
        assert_eq!(
            out.sections,
            vec![Section {
                title: "Introduction".to_string(),
                content: "Deep learning works\n".to_string(),
            }]
        );
        assert_eq!(out.text, "Deep learning works\n\n");
        assert_eq!(out.title_guess, "Deep learning works");
    }

    #[test]
    fn heading_between_body_lines_splits_sections() {
        let out = segment(&[lines(&[
            "A Study of Things",
            "Abstract text here.",
            "1 Introduction",
            "Things are studied.",
            "Conclusion line.",
        ])]);
        assert_eq!(out.sections.len(), 2);
        assert_eq!(out.sections[0].title, "Introduction");
        assert_eq!(
            out.sections[0].content,
            "A Study of Things\nAbstract text here.\n"
        );
        assert_eq!(out.sections[1].title, "1 Introduction");
        assert_eq!(
            out.sections[1].content,
            "Things are studied.\nConclusion line.\n"
        );
        assert!(out
            .sections
            .iter()
            .all(|s| !s.content.contains("1 Introduction")));
    }

    #[test]
    fn body_lines_after_heading_stay_in_one_section() {
        let out = segment(&[lines(&["1 Introduction", "Some body.", "text continues"])]);
        assert_eq!(
            out.sections,
            vec![Section {
                title: "1 Introduction".to_string(),
                content: "Some body.\ntext continues\n".to_string(),
            }]
        );
    }

    #[test]
    fn trailing_line_of_page_is_never_a_heading() {
        let out = segment(&[
            lines(&["Preface line", "2 Method"]),
            lines(&["Body of page two.", "more"]),
        ]);
        assert_eq!(out.sections.len(), 1);
        assert_eq!(out.sections[0].title, "Introduction");
        assert_eq!(
            out.sections[0].content,
            "Preface line\n2 Method\nBody of page two.\nmore\n"
        );
    }

    #[test]
    fn heading_without_content_is_dropped() {
        let out = segment(&[lines(&["1 Intro", "2 Method", "Body.", "end"])]);
        assert_eq!(out.sections.len(), 1);
        assert_eq!(out.sections[0].title, "2 Method");
    }

    #[test]
    fn empty_document_has_no_sections() {
        let out = segment(&[Page::default(), Page::new(vec![TextItem::new("   ", 10.0)])]);
        assert!(out.sections.is_empty());
        assert_eq!(out.title_guess, "");
    }

    #[test]
    fn title_guess_is_truncated() {
        let long = "x".repeat(150);
        let out = segment(&[lines(&[&long, "tail"])]);
        assert_eq!(out.title_guess.chars().count(), 100);
    }

    #[test]
    fn segmentation_is_deterministic() {
        let pages = vec![
            lines(&["Title", "1 Intro", "a", "b"]),
            lines(&["2 Next", "c", "d"]),
        ];
        assert_eq!(segment(&pages), segment(&pages));
    }

    #[test]
    fn custom_detector_and_options() {
        let seg = Segmenter::with_detector(|line: &str| line.starts_with('#')).options(
            SegmenterOptions {
                line_threshold: 1.0,
                default_title: "Preamble".to_string(),
                title_max_chars: 3,
            },
        );
        let page = Page::new(vec![
            TextItem::new("hello", 10.0),
            TextItem::new("# Part", 8.0),
            TextItem::new("body", 6.0),
            TextItem::new("end", 4.0),
        ]);
        let out = seg.segment(&[page]);
        assert_eq!(out.sections[0].title, "Preamble");
        assert_eq!(out.sections[1].title, "# Part");
        assert_eq!(out.title_guess, "hel");
    }

    struct Recorder(RefCell<Vec<(usize, usize)>>);

    impl SegmentProgress for Recorder {
        fn page_done(&self, page: usize, total: usize) {
            self.0.borrow_mut().push((page, total));
        }
    }

    #[test]
    fn progress_reported_per_page() {
        let rec = Recorder(RefCell::new(Vec::new()));
        Segmenter::new().segment_with_progress(&[lines(&["a"]), lines(&["b"])], &rec);
        assert_eq!(rec.0.into_inner(), vec![(1, 2), (2, 2)]);
    }
}
