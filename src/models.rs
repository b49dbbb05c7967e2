//! Core data models used throughout Paperstack.
//!
//! These types represent the pages, chunks, and query results that flow
//! through the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};

/// One page of a source PDF, as produced by the loader.
///
/// `source` is the file's path relative to the corpus directory and `page`
/// is 0-based. Provenance travels with the content from here on: every chunk
/// and every stored row carries these two fields.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub source: String,
    pub page: i64,
}

/// A passage cut from exactly one page at a semantic boundary.
///
/// The splitter leaves `chunk_index` and `id` as placeholders (`0`, `""`);
/// [`crate::ids::assign_chunk_ids`] fills both before anything downstream
/// sees the chunk. A chunk never spans two pages.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub content: String,
    pub source: String,
    pub page: i64,
    pub chunk_index: i64,
    pub id: String,
}

/// One turn of the conversation handed to the generation layer.
///
/// Content is immutable once constructed; the role is the enum variant, not
/// a mutable string field. Serializes with an explicit `role` tag so the
/// consumer never has to guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum ChatMessage {
    Human(String),
    Assistant(String),
}

impl ChatMessage {
    pub fn human(text: impl Into<String>) -> Self {
        ChatMessage::Human(text.into())
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        ChatMessage::Assistant(text.into())
    }

    /// The message text, regardless of role.
    pub fn content(&self) -> &str {
        match self {
            ChatMessage::Human(text) | ChatMessage::Assistant(text) => text,
        }
    }
}

/// A ranked passage returned from similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub id: String,
    pub content: String,
    pub source: String,
    pub page: i64,
    pub chunk_index: i64,
    pub score: f32,
}
