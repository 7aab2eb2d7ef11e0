//! Rasterized download of the displayed artifact.
//!
//! Export works on the markup as rendered, never on a transformed view: the artifact is decoded,
//! drawn at [`ExportOptions::scale`] times its natural size over an opaque background, serialized
//! by the first [`RasterStrategy`] that succeeds, and handed to a [`DownloadSink`]. Failures are
//! logged and reported through [`ExportOutcome`]; nothing here panics or retries.

pub mod raster;
pub mod sink;
pub mod strategy;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use raster::{DecodedImage, decode_svg_data_url, parse_color, rasterize, svg_data_url};
pub use sink::{DirectorySink, DownloadPayload, DownloadSink};
pub use strategy::{PngBlobStrategy, PngDataUrlStrategy, RasterStrategy, default_strategies};

pub const DEFAULT_FILE_STEM: &str = "mermaid-diagram";
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    pub scale: f32,
    pub quality: f32,
    pub background: String,
    pub file_stem: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            quality: 0.95,
            background: "#ffffff".to_string(),
            file_stem: DEFAULT_FILE_STEM.to_string(),
        }
    }
}

impl ExportOptions {
    fn background_color(&self) -> tiny_skia::Color {
        parse_color(&self.background).unwrap_or_else(|| {
            tracing::warn!(background = %self.background, "unparseable export background, using white");
            tiny_skia::Color::WHITE
        })
    }

    fn effective_scale(&self) -> f32 {
        if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            ExportOptions::default().scale
        }
    }
}

/// `<stem>-YYYY-MM-DDTHH-MM-SS.png`, the ISO-8601 timestamp with `:` swapped for `-` and
/// fractional seconds dropped.
pub fn export_file_name(stem: &str, at: DateTime<Utc>) -> String {
    format!("{stem}-{}.png", at.format(FILE_TIMESTAMP_FORMAT))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// There was nothing to export.
    Empty,
    DecodeFailed,
    RasterFailed,
    /// Every strategy failed to serialize the surface.
    SerializeFailed,
    DeliveryFailed { file_name: String },
    Delivered {
        file_name: String,
        strategy: &'static str,
    },
}

impl ExportOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

pub struct ArtifactExporter {
    options: ExportOptions,
    strategies: Vec<Box<dyn RasterStrategy>>,
    sink: Box<dyn DownloadSink>,
}

impl ArtifactExporter {
    pub fn new(sink: impl DownloadSink + 'static) -> Self {
        Self::with_options(sink, ExportOptions::default())
    }

    pub fn with_options(sink: impl DownloadSink + 'static, options: ExportOptions) -> Self {
        Self {
            options,
            strategies: default_strategies(),
            sink: Box::new(sink),
        }
    }

    /// Replaces the ordered fallback chain.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn RasterStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn export(&self, markup: &str) -> ExportOutcome {
        self.export_at(markup, Utc::now())
    }

    pub fn export_at(&self, markup: &str, at: DateTime<Utc>) -> ExportOutcome {
        if markup.trim().is_empty() {
            return ExportOutcome::Empty;
        }

        let image = match decode_svg_data_url(&svg_data_url(markup)) {
            Ok(image) => image,
            Err(err) => {
                tracing::error!(error = %err, "artifact image failed to load");
                return ExportOutcome::DecodeFailed;
            }
        };

        let pixmap = match rasterize(
            &image,
            self.options.effective_scale(),
            self.options.background_color(),
        ) {
            Ok(pixmap) => pixmap,
            Err(err) => {
                tracing::error!(error = %err, "failed to draw artifact");
                return ExportOutcome::RasterFailed;
            }
        };

        let file_name = export_file_name(&self.options.file_stem, at);
        for strategy in &self.strategies {
            let payload = match strategy.serialize(&pixmap, self.options.quality) {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::warn!(strategy = strategy.name(), error = %err, "export strategy failed");
                    continue;
                }
            };
            return match self.sink.deliver(&file_name, payload) {
                Ok(()) => {
                    tracing::debug!(%file_name, strategy = strategy.name(), "export delivered");
                    ExportOutcome::Delivered {
                        file_name,
                        strategy: strategy.name(),
                    }
                }
                Err(err) => {
                    tracing::error!(%file_name, error = %err, "export delivery failed");
                    ExportOutcome::DeliveryFailed { file_name }
                }
            };
        }

        tracing::error!("no export strategy could serialize the artifact");
        ExportOutcome::SerializeFailed
    }
}

impl std::fmt::Debug for ArtifactExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("ArtifactExporter")
            .field("options", &self.options)
            .field("strategies", &names)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    #[test]
    fn file_name_uses_dashed_timestamp() {
        let at = Utc
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
            .single()
            .expect("valid date");
        assert_eq!(
            export_file_name(DEFAULT_FILE_STEM, at),
            "mermaid-diagram-2024-03-09T14-05-07.png"
        );
    }

    #[test]
    fn options_deserialize_partially() {
        let opts: ExportOptions =
            serde_json::from_str(r#"{"scale": 3, "fileStem": "flow"}"#).expect("json");
        assert_eq!(opts.scale, 3.0);
        assert_eq!(opts.file_stem, "flow");
        assert_eq!(opts.background, "#ffffff");
        assert_eq!(opts.quality, 0.95);
    }

    #[test]
    fn nonpositive_scale_falls_back_to_default() {
        let opts = ExportOptions {
            scale: 0.0,
            ..ExportOptions::default()
        };
        assert_eq!(opts.effective_scale(), 2.0);
    }
}
