use std::path::PathBuf;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no parquet files match '{0}'")]
    InputNotFound(String),

    #[error("{adapter} is required to read '{uri}' (rebuild with `--features {feature}`)")]
    DependencyMissing {
        adapter: &'static str,
        feature: &'static str,
        uri: String,
    },

    #[error("failed to read '{path}'")]
    ReadError {
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to write '{}'", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    pub(crate) fn read(path: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ReadError {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::WriteError {
            path: path.into(),
            source: source.into(),
        }
    }
}
