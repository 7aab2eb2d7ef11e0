#![forbid(unsafe_code)]

//! `merview` renders Mermaid diagram text into interactive, exportable views.
//!
//! This is the facade crate. It re-exports [`merview_core`] (engine loading, the offscreen host
//! and the throttled render pipeline) and [`merview_viewer`] (viewport, PNG export, toolbar
//! settings and the [`DiagramView`] composite).
//!
//! # Features
//!
//! - `merman`: a pure Rust engine backed by the headless `merman` renderer
//!   ([`engine::MermanEngine`])
//! - `clipboard`: a system clipboard for [`DiagramView::copy_source_to_clipboard`]
//!   ([`clipboard::ArboardClipboard`])
//!
//! Without `merman`, [`default_loader`] reports no visual surface and pipelines degrade to
//! showing the raw source text.

use std::sync::Arc;

pub use merview_core::*;
pub use merview_viewer::{
    ArtifactExporter, Clipboard, ClipboardError, ConfigError, DiagramView, DirectorySink,
    DownloadPayload, DownloadSink, ExportError, ExportOptions, ExportOutcome, InputHub, RawInput,
    RasterStrategy, ToolbarConfig, ToolbarControl, Transform, ViewerConfig, ViewportController,
    ViewportOptions, ViewportState, ViewportSurface, export_file_name,
};

pub mod viewer {
    pub use merview_viewer::{config, error, export, toolbar, view, viewport};
}

#[cfg(feature = "clipboard")]
pub mod clipboard;
#[cfg(feature = "merman")]
pub mod engine;

/// The loader the process-wide engine handle should use for this build.
pub fn default_loader() -> Arc<dyn EngineLoader> {
    #[cfg(feature = "merman")]
    let loader: Arc<dyn EngineLoader> = Arc::new(engine::MermanLoader);
    #[cfg(not(feature = "merman"))]
    let loader: Arc<dyn EngineLoader> = Arc::new(merview_core::engine::NoSurface);
    loader
}

/// The process-wide engine handle, created with [`default_loader`] on first use.
pub fn shared_engine() -> Arc<EngineHandle> {
    merview_core::engine::global_handle(default_loader)
}
