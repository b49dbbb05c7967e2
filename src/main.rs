//! # Paperstack CLI (`paper`)
//!
//! The `paper` binary drives the ingestion pipeline and answers retrieval
//! queries against the local store.
//!
//! ## Usage
//!
//! ```bash
//! paper --config ./config/paperstack.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `paper init` | Create the store directory and schema |
//! | `paper ingest` | Load PDFs, split, embed, and insert new chunks |
//! | `paper query "<question>"` | Print the top-6 passages for a question |
//! | `paper status` | Show passage counts by source |
//! | `paper clear --yes` | Delete the store wholesale |
//!
//! ## Examples
//!
//! ```bash
//! # Create the store
//! paper init --config ./config/paperstack.toml
//!
//! # Ingest the corpus directory (re-runs only pay for new chunks)
//! paper ingest --config ./config/paperstack.toml
//!
//! # See which files an ingest would read
//! paper ingest --dry-run --config ./config/paperstack.toml
//!
//! # Ask a question, human-readable or JSON
//! paper query "how are transformers trained?" --config ./config/paperstack.toml
//! paper query "how are transformers trained?" --json --config ./config/paperstack.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use paperstack::config;
use paperstack::embedding;
use paperstack::ingest;
use paperstack::retriever::{Retrieval, RETRIEVAL_K};
use paperstack::store::{self, VectorStore};

/// Paperstack CLI — a local-first PDF ingestion and retrieval backend for
/// research assistants.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/paperstack.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "paper",
    about = "Paperstack — a local-first PDF ingestion and retrieval backend for research assistants",
    version,
    long_about = "Paperstack walks a directory of PDFs, splits each page into semantically \
    coherent chunks, embeds them, and stores the result in a SQLite vector store. Ingestion \
    is idempotent; retrieval returns the six closest passages for a question."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/paperstack.toml`. The corpus directory, store
    /// location, and embedding provider are all read from this file.
    #[arg(long, global = true, default_value = "./config/paperstack.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the store directory and schema.
    ///
    /// This command is idempotent — running it multiple times is safe, and
    /// every other command creates the store on first use anyway.
    Init,

    /// Ingest the corpus directory.
    ///
    /// Loads every matching PDF page, splits pages into semantic chunks,
    /// and embeds and inserts the chunks whose ids are not already stored.
    Ingest {
        /// List matched files without extracting, embedding, or writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Retrieve the top passages for a question.
    ///
    /// Embeds the question and prints the six closest stored passages. A
    /// failing provider degrades to a warning, not an error: an assistant
    /// session answers without context rather than dying.
    Query {
        /// The question text.
        query: String,

        /// Print results as a JSON array instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show what the store currently holds.
    Status,

    /// Delete the store directory wholesale.
    ///
    /// The next ingest rebuilds it from scratch. This is the supported way
    /// to recover from renamed or re-lettered PDFs, whose positional ids
    /// would otherwise go stale.
    Clear {
        /// Actually delete. Without this flag the command only reports
        /// what it would remove.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    // Commands that must not (or need not) hold the store open.
    match &cli.command {
        Commands::Ingest { dry_run: true } => {
            ingest::run_ingest_dry_run(&cfg)?;
            return Ok(());
        }
        Commands::Clear { yes } => {
            if !yes {
                println!("clear");
                println!("  would delete: {}", cfg.store.dir.display());
                println!("  pass --yes to confirm");
                return Ok(());
            }
            let removed = store::clear_store(&cfg.store.dir)?;
            println!("clear");
            if removed {
                println!("  deleted: {}", cfg.store.dir.display());
            } else {
                println!("  nothing to delete at {}", cfg.store.dir.display());
            }
            return Ok(());
        }
        _ => {}
    }

    let provider = embedding::create_provider(&cfg.embedding)?;
    let store = VectorStore::open(&cfg.store.dir, provider.clone(), cfg.embedding.batch_size).await?;

    match cli.command {
        Commands::Init => {
            println!("Store initialized at {}", cfg.store.dir.display());
        }
        Commands::Ingest { .. } => {
            ingest::run_ingest(&cfg, &store, provider.as_ref()).await?;
        }
        Commands::Query { query, json } => {
            run_query(&store, &query, json).await?;
        }
        Commands::Status => {
            run_status(&cfg, &store).await?;
        }
        Commands::Clear { .. } => {
            // Handled above (before the store is opened)
            unreachable!()
        }
    }

    store.close().await;
    Ok(())
}

async fn run_query(store: &VectorStore, query: &str, json: bool) -> anyhow::Result<()> {
    let retriever = store.as_retriever(RETRIEVAL_K);

    match retriever.retrieve(query).await {
        Retrieval::Hits(hits) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                for (i, hit) in hits.iter().enumerate() {
                    println!(
                        "{}. [{:.3}] {} page {} chunk {}",
                        i + 1,
                        hit.score,
                        hit.source,
                        hit.page,
                        hit.chunk_index
                    );
                    println!("    id: {}", hit.id);
                    println!("    \"{}\"", hit.content.replace('\n', " ").trim());
                    println!();
                }
            }
        }
        Retrieval::Empty => {
            if json {
                println!("[]");
            } else {
                println!("No results.");
            }
        }
        Retrieval::ProviderFailed(e) => {
            eprintln!("Warning: retrieval unavailable: {}", e);
            if json {
                println!("[]");
            }
        }
    }

    Ok(())
}

async fn run_status(cfg: &config::Config, store: &VectorStore) -> anyhow::Result<()> {
    let total = store.count().await?;
    let by_source = store.source_counts().await?;

    println!("status");
    println!("  store: {}", cfg.store.dir.display());
    println!("  passages: {}", total);
    if !by_source.is_empty() {
        println!("  by source:");
        for (source, count) in &by_source {
            println!("    {}: {}", source, count);
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
