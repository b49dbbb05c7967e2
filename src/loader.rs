//! Corpus loader: PDF directory to per-page [`Document`]s.
//!
//! Walks the corpus directory, keeps files matching the configured include
//! globs, and extracts text page by page. Files are visited in sorted
//! relative-path order so two runs over the same corpus see the same
//! document sequence, which positional chunk ids depend on.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::error::{Error, Result};
use crate::models::Document;

/// Enumerate corpus files matching the include globs.
///
/// Returns `(absolute path, source)` pairs where `source` is the path
/// relative to the corpus directory, sorted ascending. Fails if the corpus
/// directory does not exist; an empty or non-matching directory is fine.
pub fn list_corpus_files(config: &CorpusConfig) -> Result<Vec<(PathBuf, String)>> {
    let root = &config.dir;
    if !root.exists() {
        return Err(Error::Config(format!(
            "corpus directory does not exist: {}",
            root.display()
        )));
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| Error::Config(format!("corpus walk failed: {e}")))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if !include_set.is_match(&rel_str) {
            continue;
        }

        files.push((path.to_path_buf(), rel_str));
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.1.cmp(&b.1));

    Ok(files)
}

/// Load every matching file in the corpus directory as per-page documents.
///
/// Each page of each PDF becomes one [`Document`] with a 0-based page
/// number. A page with no extractable text still yields a document (with
/// empty content); a file that cannot be parsed fails the whole load.
pub fn load_directory(config: &CorpusConfig) -> Result<Vec<Document>> {
    let files = list_corpus_files(config)?;

    let mut documents = Vec::new();
    for (path, source) in &files {
        let pages = extract_pages(path, source)?;
        tracing::debug!(source = %source, pages = pages.len(), "extracted pdf");

        for (page, content) in pages.into_iter().enumerate() {
            documents.push(Document {
                content,
                source: source.clone(),
                page: page as i64,
            });
        }
    }

    Ok(documents)
}

fn extract_pages(path: &Path, source: &str) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).map_err(|e| Error::Extract {
        path: source.to_string(),
        reason: e.to_string(),
    })?;

    pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| Error::Extract {
        path: source.to_string(),
        reason: e.to_string(),
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::Validation(format!("invalid corpus glob '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::Validation(format!("invalid corpus globs: {e}")))
}
