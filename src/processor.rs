use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::detect::Detector;
use crate::error::ProcessError;
use crate::gateway::GatewayRecord;
use crate::settings::Settings;

/// Reads one input document from disk and mines it.
#[derive(Debug, Clone)]
pub struct FileProcessor {
    detector: Detector,
}

impl FileProcessor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            detector: Detector::new(settings),
        }
    }

    pub fn process_file(&self, path: &Path) -> Result<Vec<GatewayRecord>, ProcessError> {
        let text = fs::read_to_string(path).map_err(|source| ProcessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: Value = serde_json::from_str(&text).map_err(|source| ProcessError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        self.detector.scan_document(&doc)
    }
}
