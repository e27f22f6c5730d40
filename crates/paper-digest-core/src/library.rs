//! Library-level operations on papers: building a new record from a
//! segmentation, explicit edits, and date ordering for listings.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{new_paper_id, Paper};
use crate::segment::Segmentation;

/// Title used when the segmenter found no first line.
pub const UNTITLED: &str = "Untitled";

/// Build the initial record for an uploaded document.
pub fn new_paper(segmentation: Segmentation, file: Option<Vec<u8>>, date: NaiveDate) -> Paper {
    let title = if segmentation.title_guess.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        segmentation.title_guess
    };
    Paper {
        id: new_paper_id(),
        title,
        date,
        text: segmentation.text,
        sections: segmentation.sections,
        section_summaries: String::new(),
        summary: String::new(),
        summarized: false,
        file,
    }
}

/// User edit of the editable descriptive fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaperEdit {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
}

impl PaperEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.date.is_none()
    }

    pub fn apply(&self, paper: &mut Paper) {
        if let Some(title) = &self.title {
            paper.title = title.clone();
        }
        if let Some(date) = self.date {
            paper.date = date;
        }
    }
}

/// Listing order by date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("invalid order '{}': expected asc or desc", other)),
        }
    }
}

/// Sort papers by date in place. Papers with the same date keep their
/// relative order.
pub fn sort_by_date(papers: &mut [Paper], direction: SortDirection) {
    match direction {
        SortDirection::Asc => papers.sort_by(|a, b| a.date.cmp(&b.date)),
        SortDirection::Desc => papers.sort_by(|a, b| b.date.cmp(&a.date)),
    }
}
