//! Segmentation progress reporting for `digest add`.
//!
//! Reports one event per processed page so users see how far a long PDF
//! has got. Progress is emitted on **stderr** so stdout remains parseable
//! for scripts.

use std::io::Write;

use paper_digest_core::segment::{NoProgress, SegmentProgress};

/// Human-friendly progress on stderr: `add paper.pdf  page 12 / 1,024`.
pub struct StderrProgress {
    label: String,
}

impl StderrProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl SegmentProgress for StderrProgress {
    fn page_done(&self, page: usize, total: usize) {
        let line = format!(
            "add {}  page {} / {}\n",
            self.label,
            format_number(page as u64),
            format_number(total as u64)
        );
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress {
    label: String,
}

impl JsonProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl SegmentProgress for JsonProgress {
    fn page_done(&self, page: usize, total: usize) {
        let obj = serde_json::json!({
            "event": "progress",
            "file": self.label,
            "phase": "segmenting",
            "page": page,
            "total": total
        });
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        }
    }
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for the document named `label`.
    pub fn reporter(&self, label: &str) -> Box<dyn SegmentProgress> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress::new(label)),
            ProgressMode::Json => Box::new(JsonProgress::new(label)),
        }
    }
}
