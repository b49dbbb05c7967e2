//! Error taxonomy shared by the library.
//!
//! Each variant carries a policy, not just a message:
//! - [`Error::Config`] and [`Error::Validation`] are fatal at startup.
//! - [`Error::Extract`] is fatal during ingestion.
//! - [`Error::Provider`] is fatal during ingestion but fail-soft at query
//!   time: the retriever catches it and the caller answers without context.
//!
//! There are no automatic retries anywhere in the library. A failed provider
//! or store call surfaces immediately; ingestion is idempotent, so the remedy
//! for a partial write is simply to run it again.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration paths or values.
    #[error("config error: {0}")]
    Config(String),

    /// Unsupported provider or model name, or a malformed config value.
    #[error("validation error: {0}")]
    Validation(String),

    /// The embedding provider or the store backend is unreachable or erroring.
    #[error("provider error: {0}")]
    Provider(String),

    /// A source file that cannot be parsed.
    #[error("extraction failed for {path}: {reason}")]
    Extract { path: String, reason: String },
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Provider(format!("store: {err}"))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Provider(format!("http: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes_carry_the_class() {
        let err = Error::Validation("unknown embedding provider: 'x'".to_string());
        assert!(err.to_string().starts_with("validation error:"));

        let err = Error::Extract {
            path: "docs/a.pdf".to_string(),
            reason: "bad xref".to_string(),
        };
        assert!(err.to_string().contains("docs/a.pdf"));
    }

    #[test]
    fn test_sqlx_errors_map_to_provider() {
        let err: Error = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, Error::Provider(_)));
    }
}
