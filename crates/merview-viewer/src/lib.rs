#![forbid(unsafe_code)]

//! Display-side pieces for rendered Mermaid diagrams: an interactive viewport, PNG export,
//! toolbar settings and the [`DiagramView`] composite that ties them to a render pipeline.

pub mod config;
pub mod error;
pub mod export;
pub mod toolbar;
pub mod view;
pub mod viewport;

pub use config::ViewerConfig;
pub use error::{ClipboardError, ConfigError, ExportError};
pub use export::{
    ArtifactExporter, DirectorySink, DownloadPayload, DownloadSink, ExportOptions, ExportOutcome,
    RasterStrategy, export_file_name,
};
pub use toolbar::{ToolbarConfig, ToolbarControl};
pub use view::{Clipboard, DiagramView};
pub use viewport::{
    InputHub, RawInput, Transform, ViewportController, ViewportOptions, ViewportState,
    ViewportSurface,
};
