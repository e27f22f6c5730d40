//! Upload pipeline: PDF file → pages → sections → stored [`Paper`].
//!
//! ```text
//! read file ─▶ extract pages ─▶ segment (per-page progress) ─▶ new_paper ─▶ put
//! ```
//!
//! Any failure before `put` leaves the store untouched.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use paper_digest_core::library::new_paper;
use paper_digest_core::segment::{SegmentProgress, SegmenterOptions};
use paper_digest_core::store::Store;
use paper_digest_core::{Paper, PaperStore, Segmenter};
use tracing::info;

use crate::extract::{ExtractError, TextExtractor};

/// Build a paper record from PDF bytes. The bytes are kept as its payload.
pub fn build_paper(
    bytes: Vec<u8>,
    extractor: &dyn TextExtractor,
    options: SegmenterOptions,
    progress: &dyn SegmentProgress,
    date: NaiveDate,
) -> Result<Paper, ExtractError> {
    let pages = extractor.pages(&bytes)?;
    let segmentation = Segmenter::new()
        .options(options)
        .segment_with_progress(&pages, progress);
    Ok(new_paper(segmentation, Some(bytes), date))
}

/// Read, segment and save the PDF at `path`, dated today.
pub async fn add_paper<S: Store>(
    store: &PaperStore<S>,
    extractor: &dyn TextExtractor,
    path: &Path,
    options: SegmenterOptions,
    progress: &dyn SegmentProgress,
) -> Result<Paper> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let today = Local::now().date_naive();
    let paper = build_paper(bytes, extractor, options, progress, today)
        .with_context(|| format!("Failed to extract text from {}", path.display()))?;

    store.put(&paper).await?;
    info!(
        id = %paper.id,
        sections = paper.sections.len(),
        "paper added"
    );
    Ok(paper)
}
