//! Core data models used throughout Paper Digest.
//!
//! These types describe the positioned text that comes out of a PDF
//! reader, the sections the segmenter builds from it, and the paper
//! records that the store persists.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One run of text emitted by a PDF text-extraction provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextItem {
    pub text: String,
    /// Vertical baseline position in the source coordinate system.
    pub baseline_y: f64,
}

impl TextItem {
    pub fn new(text: impl Into<String>, baseline_y: f64) -> Self {
        Self {
            text: text.into(),
            baseline_y,
        }
    }
}

/// A page of text items in emission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<TextItem>,
}

impl Page {
    pub fn new(items: Vec<TextItem>) -> Self {
        Self { items }
    }
}

/// A titled section of a paper and the body text that follows the heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
}

/// A paper as seen by callers of the store.
///
/// The original PDF bytes travel in [`Paper::file`]; the store keeps them
/// in a separate partition and reattaches them on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Markup fragment with one block per summarized section
    /// (see [`crate::summaries`]).
    #[serde(default)]
    pub section_summaries: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub summarized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<Vec<u8>>,
}

impl Paper {
    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    /// Split into the metadata record and, when present, the binary record.
    pub fn into_records(self) -> (PaperMeta, Option<FileRecord>) {
        let file = self.file.map(|data| FileRecord {
            id: self.id.clone(),
            data,
        });
        let meta = PaperMeta {
            id: self.id,
            title: self.title,
            date: self.date,
            text: self.text,
            sections: self.sections,
            section_summaries: self.section_summaries,
            summary: self.summary,
            summarized: self.summarized,
            has_file: file.is_some(),
        };
        (meta, file)
    }

    /// Rebuild a paper from its metadata record and optional binary record.
    pub fn from_records(meta: PaperMeta, file: Option<FileRecord>) -> Self {
        Self {
            id: meta.id,
            title: meta.title,
            date: meta.date,
            text: meta.text,
            sections: meta.sections,
            section_summaries: meta.section_summaries,
            summary: meta.summary,
            summarized: meta.summarized,
            file: file.map(|f| f.data),
        }
    }
}

/// Record kept in the `papers` partition. Never carries the PDF bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperMeta {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub section_summaries: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub summarized: bool,
    #[serde(default)]
    pub has_file: bool,
}

/// Record kept in the `files` partition, keyed by the paper id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: String,
    pub data: Vec<u8>,
}

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Generate a new paper id from the millisecond clock.
///
/// Ids are strictly increasing within a process: two papers created in
/// the same millisecond get consecutive values.
pub fn new_paper_id() -> String {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let next = if now > last { now } else { last + 1 };
        match LAST_ID.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next.to_string(),
            Err(actual) => last = actual,
        }
    }
}
