//! The legacy flat collection on disk.
//!
//! Older installs kept every paper in one JSON array, PDF bytes included:
//!
//! ```json
//! [{"id": "1700000000000", "title": "…", "date": "2024-03-01",
//!   "text": "…", "sections": [{"title": "…", "content": "…"}],
//!   "sectionSummaries": "", "summary": "", "summarized": false,
//!   "fileData": "data:application/pdf;base64,JVBERi0…"}]
//! ```
//!
//! [`JsonFileLegacy`] reads that file for
//! [`PaperStore::migrate_legacy`](paper_digest_core::PaperStore::migrate_legacy)
//! and deletes it once the migration has written every paper.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Local, NaiveDate, Utc};
use paper_digest_core::models::{Paper, Section};
use paper_digest_core::store::LegacySource;
use paper_digest_core::StoreError;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyPaper {
    id: String,
    #[serde(default)]
    title: String,
    date: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    section_summaries: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    summarized: bool,
    #[serde(default)]
    file_data: Option<String>,
}

impl LegacyPaper {
    /// Convert one legacy record. A bad date or payload degrades with a
    /// warning so one record cannot block the rest of the collection.
    fn into_paper(self) -> Paper {
        let date = parse_date(&self.date).unwrap_or_else(|| {
            let fallback = fallback_date(&self.id);
            warn!(
                id = %self.id,
                date = %self.date,
                fallback = %fallback,
                "legacy paper has an unreadable date"
            );
            fallback
        });
        let file = match self.file_data.as_deref() {
            Some(data) if !data.is_empty() => match decode_file_data(data) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!(id = %self.id, error = %e, "legacy paper file dropped");
                    None
                }
            },
            _ => None,
        };
        Paper {
            id: self.id,
            title: self.title,
            date,
            text: self.text,
            sections: self.sections,
            section_summaries: self.section_summaries,
            summary: self.summary,
            summarized: self.summarized,
            file,
        }
    }
}

/// Creation day encoded in a millisecond-clock id, else today.
fn fallback_date(id: &str) -> NaiveDate {
    id.parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.date_naive())
        .unwrap_or_else(|| Local::now().date_naive())
}

/// Accepts `YYYY-MM-DD` and full ISO timestamps (date part only).
fn parse_date(s: &str) -> Option<NaiveDate> {
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Decode a `data:<mime>;base64,<payload>` URL, or a bare base64 string.
pub fn decode_file_data(data: &str) -> Result<Vec<u8>, String> {
    let payload = match data.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| "data URL has no payload".to_string())?;
            if !header.ends_with(";base64") {
                return Err(format!("unsupported data URL encoding: {}", header));
            }
            payload
        }
        None => data,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("invalid base64 file data: {}", e))
}

/// Legacy collection stored as a JSON file.
pub struct JsonFileLegacy {
    path: PathBuf,
}

impl JsonFileLegacy {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LegacySource for JsonFileLegacy {
    fn load(&self) -> Result<Option<Vec<Paper>>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let raw: Vec<LegacyPaper> = serde_json::from_str(&content)?;
        debug!(path = %self.path.display(), papers = raw.len(), "legacy collection found");
        Ok(Some(raw.into_iter().map(LegacyPaper::into_paper).collect()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(format!("{}: {}", self.path.display(), e))),
        }
    }
}
