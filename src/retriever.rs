//! Fixed-k retrieval over the vector store.
//!
//! A [`Retriever`] is a narrow view over an open [`VectorStore`]: one
//! query in, at most `k` scored passages out. `k` is fixed when the view
//! is built; callers wanting different depths build different views.
//!
//! Failures surface as a [`Retrieval`] variant rather than an `Err`. An
//! interactive session treats a dead provider as "answer without context",
//! and an outcome value forces that decision to be written down at the
//! call site instead of hiding in a catch-all.

use crate::error::Error;
use crate::models::ScoredPassage;
use crate::store::VectorStore;

/// Passage count the assistant asks for on every question.
pub const RETRIEVAL_K: usize = 6;

/// Outcome of one retrieval.
#[derive(Debug)]
pub enum Retrieval {
    /// At least one passage matched, never more than `k`.
    Hits(Vec<ScoredPassage>),
    /// The store had nothing to offer. Not an error.
    Empty,
    /// Embedding the query or scanning the store failed.
    ProviderFailed(Error),
}

pub struct Retriever<'a> {
    store: &'a VectorStore,
    k: usize,
}

impl<'a> Retriever<'a> {
    pub fn new(store: &'a VectorStore, k: usize) -> Self {
        Self { store, k }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Embed the query and rank stored passages against it.
    pub async fn retrieve(&self, query: &str) -> Retrieval {
        match self.store.similarity_search(query, self.k).await {
            Ok(hits) if hits.is_empty() => Retrieval::Empty,
            Ok(hits) => Retrieval::Hits(hits),
            Err(e) => {
                tracing::warn!(error = %e, "retrieval failed");
                Retrieval::ProviderFailed(e)
            }
        }
    }
}
