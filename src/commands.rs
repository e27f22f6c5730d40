//! CLI command implementations. Results go to stdout; diagnostics and
//! progress go to stderr.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use paper_digest_core::library::{sort_by_date, PaperEdit, SortDirection};
use paper_digest_core::summaries;

use crate::config::Config;
use crate::digest;
use crate::extract::PdfExtractor;
use crate::ingest;
use crate::migrate;
use crate::progress::ProgressMode;
use crate::sqlite_store;
use crate::summarize::HttpSummarizer;

pub async fn run_init(config: &Config) -> Result<()> {
    migrate::run_migrations(config).await?;
    println!("Database initialized successfully.");
    Ok(())
}

pub async fn run_migrate(config: &Config) -> Result<()> {
    let store = sqlite_store::connect_store(config).await?;
    let report = sqlite_store::migrate_configured_legacy(&store, config).await?;
    match &config.legacy.path {
        Some(path) => println!(
            "Migrated {} legacy papers from {}.",
            report.migrated,
            path.display()
        ),
        None => println!("No legacy collection configured."),
    }
    Ok(())
}

pub async fn run_add(config: &Config, path: &Path, progress: ProgressMode) -> Result<()> {
    let store = sqlite_store::open(config).await?;
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let reporter = progress.reporter(&label);

    let paper = ingest::add_paper(
        &store,
        &PdfExtractor,
        path,
        config.segmenter.options(),
        reporter.as_ref(),
    )
    .await?;

    println!("Added paper {}", paper.id);
    println!("title:    {}", paper.title);
    println!("sections: {}", paper.sections.len());
    if paper.sections.is_empty() {
        println!("No text could be extracted; summarization is unavailable for this paper.");
    }
    Ok(())
}

pub async fn run_list(config: &Config, order: SortDirection) -> Result<()> {
    let store = sqlite_store::open(config).await?;
    let mut papers = store.get_all().await?;
    if papers.is_empty() {
        println!("No papers.");
        return Ok(());
    }
    sort_by_date(&mut papers, order);

    for p in &papers {
        let mark = if p.summarized { "*" } else { " " };
        println!("{} {}  {}  {}", mark, p.id, p.date, p.title);
    }
    println!("\n{} papers (* = summarized)", papers.len());
    Ok(())
}

pub async fn run_show(config: &Config, id: &str) -> Result<()> {
    let store = sqlite_store::open(config).await?;
    let paper = store.get(id).await?;

    println!("--- Paper ---");
    println!("id:         {}", paper.id);
    println!("title:      {}", paper.title);
    println!("date:       {}", paper.date);
    println!("summarized: {}", if paper.summarized { "yes" } else { "no" });
    match &paper.file {
        Some(data) => println!("file:       {} bytes", data.len()),
        None => println!("file:       none"),
    }

    println!("\n--- Sections ({}) ---", paper.sections.len());
    for (i, section) in paper.sections.iter().enumerate() {
        println!(
            "[{}] {} ({} chars)",
            i + 1,
            section.title,
            section.content.chars().count()
        );
    }

    if !paper.summary.is_empty() {
        println!("\n--- Summary ---");
        println!("{}", paper.summary);
    }
    Ok(())
}

pub async fn run_summaries(config: &Config, id: &str) -> Result<()> {
    let store = sqlite_store::open(config).await?;
    let paper = store.get(id).await?;
    let mut blocks = summaries::parse(&paper.section_summaries);
    if blocks.is_empty() {
        println!("No section summaries for {}.", id);
        return Ok(());
    }
    summaries::sort_by_section_number(&mut blocks);

    for block in &blocks {
        println!("## {}", block.title);
        println!("{}\n", block.content);
    }
    Ok(())
}

pub async fn run_edit(
    config: &Config,
    id: &str,
    title: Option<String>,
    date: Option<String>,
) -> Result<()> {
    let date = date
        .map(|d| {
            NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{}': expected YYYY-MM-DD", d))
        })
        .transpose()?;
    let edit = PaperEdit { title, date };
    if edit.is_empty() {
        bail!("Nothing to edit: pass --title and/or --date");
    }

    let store = sqlite_store::open(config).await?;
    let paper = store.update(id, |p| edit.apply(p)).await?;
    println!("Updated {}: {} ({})", paper.id, paper.title, paper.date);
    Ok(())
}

pub async fn run_delete(config: &Config, id: &str) -> Result<()> {
    let store = sqlite_store::open(config).await?;
    store.delete(id).await?;
    println!("Deleted {}", id);
    Ok(())
}

pub async fn run_export_file(config: &Config, id: &str, out: &Path) -> Result<()> {
    let store = sqlite_store::open(config).await?;
    let paper = store.get(id).await?;
    let Some(data) = paper.file else {
        bail!("paper {} has no stored file", id);
    };
    std::fs::write(out, &data).with_context(|| format!("Failed to write {}", out.display()))?;
    println!("Wrote {} bytes to {}", data.len(), out.display());
    Ok(())
}

/// `sections` are 1-based, as printed by `show`.
pub async fn run_edit_summary(
    config: &Config,
    id: &str,
    section: Option<String>,
    text: Option<String>,
    file: Option<&Path>,
) -> Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read summary file: {}", path.display()))?,
        (None, None) => bail!("Provide the new summary with --text or --file"),
    };
    let text = text.trim().to_string();

    let edit = match section {
        Some(title) => digest::SummaryEdit::Section { title, text },
        None => digest::SummaryEdit::Document(text),
    };
    let store = sqlite_store::open(config).await?;
    digest::edit_summary(&store, id, edit).await?;
    println!("Updated summary for {}", id);
    Ok(())
}

pub async fn run_summarize(config: &Config, id: &str, sections: &[usize]) -> Result<()> {
    if sections.is_empty() {
        bail!("Select at least one section with --section N");
    }
    if sections.contains(&0) {
        bail!("Section numbers start at 1");
    }
    let indices: Vec<usize> = sections.iter().map(|n| n - 1).collect();

    let summarizer = HttpSummarizer::new(&config.summarizer)?;
    let store = sqlite_store::open(config).await?;
    let report = digest::summarize_sections(&store, &summarizer, id, &indices).await?;

    for block in &report.summarized {
        println!("## {}", block.title);
        println!("{}\n", block.content);
    }
    for (title, err) in &report.failed {
        eprintln!("Failed to summarize {}: {}", title, err);
    }
    if report.all_failed() {
        bail!("No section could be summarized");
    }
    Ok(())
}

pub async fn run_summarize_all(config: &Config, id: &str) -> Result<()> {
    let summarizer = HttpSummarizer::new(&config.summarizer)?;
    let store = sqlite_store::open(config).await?;
    let summary = digest::summarize_document(
        &store,
        &summarizer,
        id,
        config.summarizer.max_document_chars,
    )
    .await?;
    println!("{}", summary);
    Ok(())
}
