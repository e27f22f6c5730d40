//! # Paper Digest Core
//!
//! Shared, WASM-safe logic for Paper Digest: paper models, the section
//! segmenter, the store abstraction with its paper-level persistence
//! layer, and the section-summary fragment format.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. It compiles to both native targets and
//! `wasm32-unknown-unknown`, so the same logic can run inside a browser
//! page next to the PDF reader.

pub mod error;
pub mod library;
pub mod models;
pub mod segment;
pub mod store;
pub mod summaries;

pub use error::StoreError;
pub use models::{Page, Paper, Section, TextItem};
pub use segment::{segment, Segmentation, Segmenter};
pub use store::{PaperStore, Store};
