use std::path::{Path, PathBuf};

use super::raster::data_url_bytes;
use crate::error::ExportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadPayload {
    Blob { mime: &'static str, bytes: Vec<u8> },
    DataUrl(String),
}

impl DownloadPayload {
    pub fn into_bytes(self) -> Result<Vec<u8>, ExportError> {
        match self {
            Self::Blob { bytes, .. } => Ok(bytes),
            Self::DataUrl(url) => data_url_bytes(&url),
        }
    }
}

/// Receives a finished export under a suggested file name.
pub trait DownloadSink: Send + Sync {
    fn deliver(&self, file_name: &str, payload: DownloadPayload) -> Result<(), ExportError>;
}

/// Writes exports into a directory, creating it when missing.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&self, file_name: &str, payload: DownloadPayload) -> Result<(), ExportError> {
        let path = self.dir.join(file_name);
        let bytes = payload.into_bytes()?;
        std::fs::create_dir_all(&self.dir).map_err(|source| ExportError::Write {
            path: self.dir.clone(),
            source,
        })?;
        std::fs::write(&path, bytes).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "export written");
        Ok(())
    }
}
