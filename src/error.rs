use std::path::PathBuf;

use thiserror::Error;

/// Why a single input document yielded nothing.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unexpected document shape: {0}")]
    Shape(String),
}

impl ProcessError {
    /// Unreadable files fail the run; bad content only empties it.
    pub fn is_io(&self) -> bool {
        matches!(self, ProcessError::Io { .. })
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
}
