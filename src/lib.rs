//! # Paper Digest
//!
//! A local-first library for research papers: PDF section extraction,
//! durable storage with the original file, and AI-generated summaries.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌───────────────────┐
//! │ PDF file │──▶│  Extract   │──▶│ Segmenter (core)  │
//! └──────────┘   └────────────┘   └─────────┬─────────┘
//!                                           ▼
//!  ┌─────────────┐   ┌────────────────────────────────┐
//!  │ legacy JSON │──▶│ PaperStore (core) over SQLite  │
//!  └─────────────┘   │   papers │ files               │
//!                    └───────────────┬────────────────┘
//!                                    ▼
//!                    ┌────────────────────────────────┐
//!                    │ digest ◀──▶ summarization HTTP │
//!                    └────────────────────────────────┘
//! ```
//!
//! The storage-independent pieces (models, segmenter, store trait,
//! summaries fragment) live in `paper-digest-core` and are re-exported
//! here.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite storage engine |
//! | [`legacy`] | Legacy JSON collection |
//! | [`extract`] | PDF text extraction |
//! | [`ingest`] | Upload pipeline |
//! | [`progress`] | Segmentation progress on stderr |
//! | [`summarize`] | Summarization service client |
//! | [`digest`] | Section and document summarization |
//! | [`commands`] | CLI command implementations |

pub mod commands;
pub mod config;
pub mod db;
pub mod digest;
pub mod extract;
pub mod ingest;
pub mod legacy;
pub mod migrate;
pub mod progress;
pub mod sqlite_store;
pub mod summarize;

pub use paper_digest_core::{library, models, segment, store, summaries};
pub use paper_digest_core::{Page, Paper, PaperStore, Section, Store, StoreError, TextItem};
