use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to decode artifact image: {message}")]
    Decode { message: String },
    #[error("failed to allocate {width}x{height} raster surface")]
    SurfaceAlloc { width: u32, height: u32 },
    #[error("{strategy} serialization failed: {message}")]
    Serialize {
        strategy: &'static str,
        message: String,
    },
    #[error("malformed data URL")]
    DataUrl,
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn serialize(strategy: &'static str, message: impl ToString) -> Self {
        Self::Serialize {
            strategy,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("failed to write to clipboard: {0}")]
    Write(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
