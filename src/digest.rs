//! Summarization workflows over stored papers.
//!
//! - [`summarize_sections`] summarizes a chosen set of sections one by one.
//!   A failing section is reported and skipped; every section that did
//!   succeed is merged into the paper's section-summaries fragment.
//! - [`summarize_document`] summarizes the whole paper from its sections,
//!   truncated to the configured character cap.
//! - [`edit_summary`] overwrites the whole-paper summary or one saved
//!   section summary by hand.

use paper_digest_core::store::Store;
use paper_digest_core::summaries::{self, SummaryBlock};
use paper_digest_core::{Paper, PaperStore, StoreError};
use thiserror::Error;
use tracing::{info, warn};

use crate::summarize::{SummarizeError, Summarizer};

#[derive(Debug, Error)]
pub enum DigestError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Summarize(#[from] SummarizeError),
    #[error("paper {0} has no sections to summarize")]
    NoSections(String),
    #[error("section {index} does not exist (paper has {count} sections)")]
    NoSuchSection { index: usize, count: usize },
    #[error("paper {id} has no saved summary for section '{title}'")]
    NoSuchSummary { id: String, title: String },
}

/// Outcome of a section batch.
#[derive(Debug)]
pub struct BatchReport {
    /// Blocks that were generated and saved, in request order.
    pub summarized: Vec<SummaryBlock>,
    /// Sections whose request failed, with the reason.
    pub failed: Vec<(String, SummarizeError)>,
}

impl BatchReport {
    pub fn all_failed(&self) -> bool {
        self.summarized.is_empty() && !self.failed.is_empty()
    }
}

/// Summarize the sections at `indices` (0-based) of paper `id`.
///
/// Indices are checked before any request is sent and repeated indices
/// are summarized once. The paper is saved
/// only when at least one section produced a summary; in that case the
/// fresh blocks replace same-titled blocks and `summarized` becomes true.
pub async fn summarize_sections<S: Store>(
    store: &PaperStore<S>,
    summarizer: &dyn Summarizer,
    id: &str,
    indices: &[usize],
) -> Result<BatchReport, DigestError> {
    let paper = store.get(id).await?;
    if paper.sections.is_empty() {
        return Err(DigestError::NoSections(id.to_string()));
    }
    let count = paper.sections.len();
    if let Some(&index) = indices.iter().find(|&&i| i >= count) {
        return Err(DigestError::NoSuchSection { index, count });
    }

    let mut selected: Vec<usize> = Vec::with_capacity(indices.len());
    for &index in indices {
        if !selected.contains(&index) {
            selected.push(index);
        }
    }

    let mut report = BatchReport {
        summarized: Vec::new(),
        failed: Vec::new(),
    };
    for index in selected {
        let section = &paper.sections[index];
        match summarizer.summarize_section(&section.content).await {
            Ok(summary) => report
                .summarized
                .push(SummaryBlock::new(section.title.clone(), summary)),
            Err(e) => {
                warn!(id = %id, section = %section.title, error = %e, "section summary failed");
                report.failed.push((section.title.clone(), e));
            }
        }
    }

    if !report.summarized.is_empty() {
        let fresh = report.summarized.clone();
        store
            .update(id, move |p| {
                p.section_summaries = summaries::merge(&p.section_summaries, &fresh);
                p.summarized = true;
            })
            .await?;
        info!(
            id = %id,
            summarized = report.summarized.len(),
            failed = report.failed.len(),
            "section summaries saved"
        );
    }
    Ok(report)
}

/// Whole-document input: `"{title}\n{content}"` per section, separated by
/// blank lines, cut to `max_chars` characters with `"..."` appended when
/// longer.
pub fn build_document(paper: &Paper, max_chars: usize) -> String {
    let joined = paper
        .sections
        .iter()
        .map(|s| format!("{}\n{}", s.title, s.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    match joined.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &joined[..cut]),
        None => joined,
    }
}

/// Summarize paper `id` as a whole and save the result as its summary.
///
/// Nothing is saved when the service fails.
pub async fn summarize_document<S: Store>(
    store: &PaperStore<S>,
    summarizer: &dyn Summarizer,
    id: &str,
    max_chars: usize,
) -> Result<String, DigestError> {
    let paper = store.get(id).await?;
    if paper.sections.is_empty() {
        return Err(DigestError::NoSections(id.to_string()));
    }

    let input = build_document(&paper, max_chars);
    let summary = summarizer.summarize_document(&paper.title, &input).await?;

    let saved = summary.clone();
    store
        .update(id, move |p| {
            p.summary = saved;
            p.summarized = true;
        })
        .await?;
    info!(id = %id, "document summary saved");
    Ok(summary)
}

/// Hand edit of a saved summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryEdit {
    /// Replace the whole-paper summary.
    Document(String),
    /// Replace the saved summary of the section titled `title`.
    Section { title: String, text: String },
}

/// Apply `edit` to paper `id` and mark it summarized. Returns the saved paper.
pub async fn edit_summary<S: Store>(
    store: &PaperStore<S>,
    id: &str,
    edit: SummaryEdit,
) -> Result<Paper, DigestError> {
    let paper = match edit {
        SummaryEdit::Document(text) => {
            store
                .update(id, move |p| {
                    p.summary = text;
                    p.summarized = true;
                })
                .await?
        }
        SummaryEdit::Section { title, text } => {
            let current = store.get(id).await?;
            let fragment = summaries::replace_content(&current.section_summaries, &title, &text)
                .ok_or_else(|| DigestError::NoSuchSummary {
                    id: id.to_string(),
                    title: title.clone(),
                })?;
            store
                .update(id, move |p| {
                    p.section_summaries = fragment;
                    p.summarized = true;
                })
                .await?
        }
    };
    info!(id = %id, "summary edited");
    Ok(paper)
}
