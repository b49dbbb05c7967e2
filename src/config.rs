use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub splitter: SplitterConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Directory scanned for source PDFs. Existence is checked at load time,
    /// not here, so a config can be written before the corpus exists.
    pub dir: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.pdf".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Directory owned by the vector store. Treated as opaque: `paper clear`
    /// deletes it wholesale and the next open recreates it.
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            endpoint: default_endpoint(),
            batch_size: 64,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SplitterConfig {
    /// Cosine distance between adjacent sentence embeddings above which a new
    /// chunk starts. Valid range is (0, 2].
    #[serde(default = "default_breakpoint_threshold")]
    pub breakpoint_threshold: f32,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            breakpoint_threshold: default_breakpoint_threshold(),
        }
    }
}

fn default_breakpoint_threshold() -> f32 {
    0.35
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read config file {}: {e}", path.display())))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| Error::Validation(format!("malformed config: {e}")))?;

    // Validate corpus
    if config.corpus.include_globs.is_empty() {
        return Err(Error::Validation(
            "corpus.include_globs must not be empty".to_string(),
        ));
    }

    // Validate splitter
    let threshold = config.splitter.breakpoint_threshold;
    if !(threshold > 0.0 && threshold <= 2.0) {
        return Err(Error::Validation(format!(
            "splitter.breakpoint_threshold must be in (0, 2], got {threshold}"
        )));
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "disabled" | "gemini" | "mock" => {}
        other => {
            return Err(Error::Validation(format!(
                "unknown embedding provider: '{other}'. Must be disabled, gemini, or mock."
            )))
        }
    }

    if config.embedding.provider == "gemini" {
        if config.embedding.model.is_none() {
            return Err(Error::Validation(
                "embedding.model must be specified when provider is 'gemini'".to_string(),
            ));
        }
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            return Err(Error::Validation(
                "embedding.dims must be > 0 when provider is 'gemini'".to_string(),
            ));
        }
    }

    Ok(config)
}
