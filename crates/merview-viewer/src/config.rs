use std::path::Path;

use merview_core::PipelineOptions;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::export::ExportOptions;
use crate::toolbar::ToolbarConfig;
use crate::viewport::ViewportOptions;

/// Everything a host can configure, in one camelCase document.
///
/// Pipeline keys (`throttleMs`, `renderIdPrefix`, `theme`, `engine`) sit at the top level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    #[serde(flatten)]
    pub pipeline: PipelineOptions,
    pub viewport: ViewportOptions,
    pub toolbar: ToolbarConfig,
    pub export: ExportOptions,
}

impl ViewerConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// `.yaml`/`.yml` files are read as YAML, anything else as JSON.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        if is_yaml {
            Self::from_yaml_str(&text)
        } else {
            Self::from_json_str(&text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_is_all_defaults() {
        assert_eq!(
            ViewerConfig::from_json_str("{}").expect("json"),
            ViewerConfig::default()
        );
    }

    #[test]
    fn yaml_mixes_pipeline_and_viewer_sections() {
        let cfg = ViewerConfig::from_yaml_str(
            r#"
throttleMs: 50
theme:
  dark: true
engine:
  flowchart:
    curve: linear
viewport:
  maxScale: 4
toolbar:
  showReset: false
export:
  fileStem: chart
"#,
        )
        .expect("yaml");

        assert_eq!(cfg.pipeline.throttle_ms, 50);
        assert_eq!(cfg.pipeline.theme.resolve(), "dark");
        assert_eq!(
            cfg.pipeline.engine.get_str("flowchart.curve"),
            Some("linear")
        );
        assert_eq!(cfg.viewport.max_scale, 4.0);
        assert_eq!(cfg.viewport.min_scale, 0.1);
        assert!(!cfg.toolbar.show_reset);
        assert!(cfg.toolbar.show_download);
        assert_eq!(cfg.export.file_stem, "chart");
        assert_eq!(cfg.export.scale, 2.0);
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            ViewerConfig::from_json_str("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn from_path_picks_format_by_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let yaml = dir.path().join("viewer.yml");
        std::fs::write(&yaml, "renderIdPrefix: doc\n").expect("write");
        assert_eq!(
            ViewerConfig::from_path(&yaml)
                .expect("yaml")
                .pipeline
                .render_id_prefix,
            "doc"
        );

        let json = dir.path().join("viewer.json");
        std::fs::write(&json, r#"{"renderIdPrefix": "page"}"#).expect("write");
        assert_eq!(
            ViewerConfig::from_path(&json)
                .expect("json")
                .pipeline
                .render_id_prefix,
            "page"
        );

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            ViewerConfig::from_path(&missing),
            Err(ConfigError::Read { .. })
        ));
    }
}
