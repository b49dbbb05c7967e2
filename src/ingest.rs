//! Ingestion pipeline: load, split, identify, diff, insert.
//!
//! Stage order is fixed. Splitting embeds sentence windows before the id
//! diff happens, so every run needs a working provider even when nothing
//! new will be inserted. What the diff saves is the insert-side embedding
//! and the writes.
//!
//! The diff fetches the stored id set exactly once per run and filters in
//! memory. Chunks whose ids are already present are skipped wholesale;
//! there is no per-chunk lookup and no update path.

use crate::config::{Config, SplitterConfig};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::ids;
use crate::loader;
use crate::models::{Chunk, Document};
use crate::splitter;
use crate::store::VectorStore;

/// Counts for one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Pages loaded from the corpus.
    pub documents: usize,
    /// Chunks produced by the splitter across all pages.
    pub chunks: usize,
    /// Chunks skipped because their id was already stored.
    pub existing: usize,
    /// Chunks embedded and written this run.
    pub inserted: usize,
}

/// Split, identify, and insert the given pages, skipping ids already stored.
pub async fn ingest_documents(
    store: &VectorStore,
    provider: &dyn EmbeddingProvider,
    splitter_config: &SplitterConfig,
    documents: &[Document],
) -> Result<IngestReport> {
    let mut chunks = splitter::split_documents(provider, splitter_config, documents).await?;
    ids::assign_chunk_ids(&mut chunks);

    let existing = store.existing_ids().await?;
    let fresh: Vec<Chunk> = chunks
        .iter()
        .filter(|c| !existing.contains(&c.id))
        .cloned()
        .collect();
    let existing_count = chunks.len() - fresh.len();

    let inserted = if fresh.is_empty() {
        0
    } else {
        store.add_documents(&fresh).await?
    };

    tracing::info!(
        documents = documents.len(),
        chunks = chunks.len(),
        existing = existing_count,
        inserted,
        "ingest finished"
    );

    Ok(IngestReport {
        documents: documents.len(),
        chunks: chunks.len(),
        existing: existing_count,
        inserted,
    })
}

/// Load the corpus and run the full pipeline, printing a summary.
pub async fn run_ingest(
    config: &Config,
    store: &VectorStore,
    provider: &dyn EmbeddingProvider,
) -> Result<IngestReport> {
    let documents = loader::load_directory(&config.corpus)?;
    let report = ingest_documents(store, provider, &config.splitter, &documents).await?;

    println!("ingest");
    println!("  documents: {}", report.documents);
    println!("  chunks: {}", report.chunks);
    println!("  already stored: {}", report.existing);
    println!("  inserted: {}", report.inserted);

    Ok(report)
}

/// List the files an ingest run would read, without touching the provider
/// or the store.
pub fn run_ingest_dry_run(config: &Config) -> Result<()> {
    let files = loader::list_corpus_files(&config.corpus)?;

    println!("ingest (dry-run)");
    println!("  corpus: {}", config.corpus.dir.display());
    println!("  matched files: {}", files.len());
    for (_, source) in &files {
        println!("    {source}");
    }

    Ok(())
}
