//! SQLite-backed vector store.
//!
//! [`VectorStore`] is an explicit handle opened once at process start and
//! passed to the pipeline and retriever; there is no lazy global. It owns an
//! opaque on-disk directory holding the SQLite file. Opening creates the
//! directory and schema when absent and is idempotent. WAL mode keeps reads
//! usable while an ingestion run writes.
//!
//! `add_documents` embeds and then inserts row by row with no wrapping
//! transaction: a mid-run provider or store failure leaves the rows written
//! so far in place. Ingestion dedup keys on ids, so re-running after a
//! failure picks up exactly where the run died.
//!
//! Similarity search fetches all stored embeddings and ranks by cosine in
//! Rust. A linear scan is the intended scale here; corpora are directories
//! of PDFs, not web crawls.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob, EmbeddingProvider};
use crate::error::{Error, Result};
use crate::models::{Chunk, ScoredPassage};
use crate::retriever::Retriever;

const STORE_DB_FILE: &str = "passages.sqlite";

pub struct VectorStore {
    pool: SqlitePool,
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl VectorStore {
    /// Open (and if needed create) the store under `dir`.
    pub async fn open(
        dir: &Path,
        provider: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
    ) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::Provider(format!(
                "cannot create store directory {}: {e}",
                dir.display()
            ))
        })?;

        let db_path = dir.join(STORE_DB_FILE);
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;

        Ok(Self {
            pool,
            provider,
            batch_size: batch_size.max(1),
        })
    }

    /// The full id set, fetched in one query.
    ///
    /// The ingestion pipeline calls this exactly once per run and diffs
    /// incoming chunk ids against it.
    pub async fn existing_ids(&self) -> Result<HashSet<String>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM passages")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Embed and insert chunks, returning the number of rows written.
    ///
    /// Processes `batch_size` chunks at a time: embed the batch, then insert
    /// its rows one by one. Ids are taken from the chunks as-is; inserting an
    /// id that already exists is a constraint violation, not an update.
    pub async fn add_documents(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0usize;
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.provider.embed(&texts).await?;

            for (chunk, embedding) in batch.iter().zip(embeddings) {
                sqlx::query(
                    r#"
                    INSERT INTO passages (id, source, page, chunk_index, content, embedding, model, created_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&chunk.id)
                .bind(&chunk.source)
                .bind(chunk.page)
                .bind(chunk.chunk_index)
                .bind(&chunk.content)
                .bind(vec_to_blob(&embedding))
                .bind(self.provider.model_name())
                .bind(chrono::Utc::now().timestamp())
                .execute(&self.pool)
                .await?;

                inserted += 1;
            }
        }

        tracing::debug!(inserted, "added passages");
        Ok(inserted)
    }

    /// Embed the query and return the top `k` passages by cosine similarity.
    ///
    /// Ordering is deterministic: score descending, then id ascending. An
    /// empty store returns an empty vec, not an error.
    pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<ScoredPassage>> {
        let query_vec = self.provider.embed_query(query).await?;

        let rows = sqlx::query("SELECT id, source, page, chunk_index, content, embedding FROM passages")
            .fetch_all(&self.pool)
            .await?;

        let mut scored: Vec<ScoredPassage> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let embedding = blob_to_vec(&blob);
                ScoredPassage {
                    id: row.get("id"),
                    content: row.get("content"),
                    source: row.get("source"),
                    page: row.get("page"),
                    chunk_index: row.get("chunk_index"),
                    score: cosine_similarity(&query_vec, &embedding),
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(k);

        Ok(scored)
    }

    /// Number of stored passages.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM passages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Passage counts grouped by source, sorted by source.
    pub async fn source_counts(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            "SELECT source, COUNT(*) AS passages FROM passages GROUP BY source ORDER BY source",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get("source"), row.get("passages")))
            .collect())
    }

    /// A query-capable view over this store with a fixed `k`.
    pub fn as_retriever(&self, k: usize) -> Retriever<'_> {
        Retriever::new(self, k)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS passages (
            id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            page INTEGER NOT NULL,
            chunk_index INTEGER NOT NULL,
            content TEXT NOT NULL,
            embedding BLOB NOT NULL,
            model TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_passages_source ON passages(source)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete the store directory wholesale.
///
/// This is the out-of-band maintenance path: nothing may hold the store
/// open when it runs. Returns whether a store existed. The next
/// [`VectorStore::open`] recreates an empty one.
pub fn clear_store(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(dir).map_err(|e| {
        Error::Provider(format!(
            "cannot remove store directory {}: {e}",
            dir.display()
        ))
    })?;
    Ok(true)
}
