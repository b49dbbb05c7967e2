//! # Paperstack
//!
//! A local-first PDF ingestion and retrieval backend for research
//! assistants.
//!
//! Paperstack walks a directory of PDFs, splits each page into
//! semantically coherent chunks, embeds them, and stores the result in a
//! SQLite vector store keyed by positional ids. Re-running ingestion is
//! idempotent: chunks whose ids are already stored are skipped, so a
//! growing paper collection only pays for what is new. Retrieval embeds a
//! question and returns the six closest passages for an assistant to cite.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌──────────┐
//! │  Loader   │──▶│   Pipeline    │──▶│  SQLite   │
//! │ PDF pages │   │ Split+Id+Diff │   │ Vec blobs │
//! └──────────┘   └───────────────┘   └────┬─────┘
//!                                         │
//!                                         ▼
//!                                   ┌───────────┐
//!                                   │ Retriever │
//!                                   │  (k = 6)  │
//!                                   └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! paper init                    # create the store
//! paper ingest                  # load, split, embed, dedup, insert
//! paper query "what is RAG?"    # top-6 passages
//! paper status                  # store contents by source
//! paper clear --yes             # drop the store wholesale
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy |
//! | [`loader`] | PDF directory loading |
//! | [`splitter`] | Semantic page splitting |
//! | [`ids`] | Positional chunk ids |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | SQLite vector store |
//! | [`ingest`] | Ingestion pipeline |
//! | [`retriever`] | Fixed-k retrieval |

pub mod config;
pub mod embedding;
pub mod error;
pub mod ids;
pub mod ingest;
pub mod loader;
pub mod models;
pub mod retriever;
pub mod splitter;
pub mod store;
