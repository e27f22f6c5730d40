//! # Paper Digest CLI (`digest`)
//!
//! Keeps a local library of research papers: extracts sections from PDFs,
//! stores them with the original file, and requests section and
//! whole-paper summaries from a summarization service.
//!
//! ## Usage
//!
//! ```bash
//! digest --config ./config/digest.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `digest init` | Create the SQLite database and schema |
//! | `digest add <pdf>` | Extract, segment and store a PDF |
//! | `digest list` | List papers by date |
//! | `digest show <id>` | Show a paper and its numbered sections |
//! | `digest edit <id>` | Change title and/or date |
//! | `digest delete <id>` | Remove a paper and its file |
//! | `digest summarize <id> --section N` | Summarize selected sections |
//! | `digest summarize-all <id>` | Summarize the whole paper |
//! | `digest summaries <id>` | Print section summaries in section order |
//! | `digest edit-summary <id> --text T` | Replace a saved summary by hand |
//! | `digest export-file <id> <out>` | Write the stored PDF to disk |
//! | `digest migrate` | Import the legacy JSON collection |
//!
//! Set `RUST_LOG` (e.g. `RUST_LOG=paper_digest=debug`) for diagnostics on
//! stderr.

use clap::{Parser, Subcommand, ValueEnum};
use paper_digest::commands;
use paper_digest::config;
use paper_digest::library::SortDirection;
use paper_digest::progress::ProgressMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Paper Digest: a local library of research papers with AI summaries.
#[derive(Parser)]
#[command(name = "digest", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/digest.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Order {
    Asc,
    Desc,
}

impl From<Order> for SortDirection {
    fn from(o: Order) -> Self {
        match o {
            Order::Asc => SortDirection::Asc,
            Order::Desc => SortDirection::Desc,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Progress {
    /// Human progress when stderr is a terminal.
    Auto,
    Human,
    Json,
    Off,
}

impl From<Progress> for ProgressMode {
    fn from(p: Progress) -> Self {
        match p {
            Progress::Auto => ProgressMode::default_for_tty(),
            Progress::Human => ProgressMode::Human,
            Progress::Json => ProgressMode::Json,
            Progress::Off => ProgressMode::Off,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Add a PDF: extract its text, split it into sections and store it
    /// together with the original file.
    Add {
        pdf: PathBuf,
        /// Per-page progress on stderr.
        #[arg(long, value_enum, default_value = "auto")]
        progress: Progress,
    },

    /// List papers ordered by date.
    List {
        #[arg(long, value_enum, default_value = "desc")]
        order: Order,
    },

    /// Show a paper with its numbered sections.
    Show { id: String },

    /// Edit a paper's title and/or date.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// New date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a paper and its stored file.
    Delete { id: String },

    /// Summarize selected sections (numbers as shown by `show`).
    ///
    /// A failing section is reported and skipped; the others are saved.
    Summarize {
        id: String,
        #[arg(long = "section", required = true)]
        sections: Vec<usize>,
    },

    /// Summarize the whole paper.
    SummarizeAll { id: String },

    /// Print saved section summaries ordered by section number.
    Summaries { id: String },

    /// Replace a saved summary with your own text.
    ///
    /// With `--section TITLE` the saved summary of that section is
    /// replaced; otherwise the whole-paper summary is.
    EditSummary {
        id: String,
        /// Section title exactly as printed by `summaries`.
        #[arg(long)]
        section: Option<String>,
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        /// Read the new summary from a file.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Write the stored PDF to a file.
    ExportFile { id: String, out: PathBuf },

    /// Import the legacy JSON collection named by `[legacy].path`.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => commands::run_init(&cfg).await?,
        Commands::Add { pdf, progress } => {
            commands::run_add(&cfg, &pdf, progress.into()).await?
        }
        Commands::List { order } => commands::run_list(&cfg, order.into()).await?,
        Commands::Show { id } => commands::run_show(&cfg, &id).await?,
        Commands::Edit { id, title, date } => {
            commands::run_edit(&cfg, &id, title, date).await?
        }
        Commands::Delete { id } => commands::run_delete(&cfg, &id).await?,
        Commands::Summarize { id, sections } => {
            commands::run_summarize(&cfg, &id, &sections).await?
        }
        Commands::SummarizeAll { id } => commands::run_summarize_all(&cfg, &id).await?,
        Commands::Summaries { id } => commands::run_summaries(&cfg, &id).await?,
        Commands::EditSummary {
            id,
            section,
            text,
            file,
        } => {
            commands::run_edit_summary(&cfg, &id, section, text, file.as_deref()).await?
        }
        Commands::ExportFile { id, out } => commands::run_export_file(&cfg, &id, &out).await?,
        Commands::Migrate => commands::run_migrate(&cfg).await?,
    }

    Ok(())
}
