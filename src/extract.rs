//! PDF text extraction into positioned [`Page`]s.
//!
//! The segmenter works on text items with a baseline y coordinate. The
//! `pdf-extract` backend already joins glyphs into lines, so every output
//! line becomes one [`TextItem`] placed a fixed line pitch below the
//! previous one. Blank lines still advance the baseline.

use std::panic;

use paper_digest_core::{Page, TextItem};
use thiserror::Error;

/// Baseline of the first line on a page (US Letter height in points).
const PAGE_TOP: f64 = 792.0;
/// Vertical distance between consecutive lines, well above the line threshold.
const LINE_PITCH: f64 = 14.0;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("PDF parser panicked: {0}")]
    Panicked(String),
}

/// Source of positioned page text for a document.
pub trait TextExtractor: Send + Sync {
    fn pages(&self, bytes: &[u8]) -> Result<Vec<Page>, ExtractError>;
}

/// [`TextExtractor`] backed by `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn pages(&self, bytes: &[u8]) -> Result<Vec<Page>, ExtractError> {
        let attempt = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes));
        let texts = match attempt {
            Ok(Ok(texts)) => texts,
            Ok(Err(e)) => return Err(ExtractError::Pdf(e.to_string())),
            Err(payload) => return Err(ExtractError::Panicked(panic_message(payload.as_ref()))),
        };
        Ok(texts.iter().map(|t| page_from_text(t)).collect())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Lay out one page of extracted text as line items, top to bottom.
pub fn page_from_text(text: &str) -> Page {
    let items = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| TextItem::new(line, PAGE_TOP - i as f64 * LINE_PITCH))
        .collect();
    Page::new(items)
}
