//! The composite a host view binds its toolbar and display to.

use merview_core::{PipelineHandle, RenderError, RenderState};
use tokio::sync::watch;

use crate::error::ClipboardError;
use crate::export::{ArtifactExporter, ExportOutcome};
use crate::toolbar::ToolbarConfig;
use crate::viewport::{ViewportController, ViewportSurface};

/// System clipboard, or whatever the host uses instead.
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// One displayed diagram: pipeline state, viewport, source toggle, clipboard copy and download.
///
/// The view is single-threaded. Call [`refresh`](Self::refresh) (or await
/// [`changed`](Self::changed)) to pull new render results into the surface.
pub struct DiagramView<S: ViewportSurface + 'static> {
    pipeline: PipelineHandle,
    state: watch::Receiver<RenderState>,
    viewport: ViewportController<S>,
    exporter: ArtifactExporter,
    clipboard: Box<dyn Clipboard>,
    toolbar: ToolbarConfig,
    show_source: bool,
    shown: String,
}

impl<S: ViewportSurface + 'static> DiagramView<S> {
    pub fn new(
        pipeline: PipelineHandle,
        viewport: ViewportController<S>,
        exporter: ArtifactExporter,
        clipboard: impl Clipboard + 'static,
        toolbar: ToolbarConfig,
    ) -> Self {
        let state = pipeline.subscribe();
        let mut view = Self {
            pipeline,
            state,
            viewport,
            exporter,
            clipboard: Box::new(clipboard),
            toolbar,
            show_source: false,
            shown: String::new(),
        };
        view.refresh();
        view
    }

    /// Mounts the latest artifact if it differs from the one shown and re-initializes the
    /// viewport for it. Returns whether anything changed.
    pub fn refresh(&mut self) -> bool {
        let artifact = self.state.borrow_and_update().artifact().to_string();
        if artifact == self.shown {
            return false;
        }
        self.shown = artifact;
        self.artifact_changed();
        true
    }

    /// Waits for the pipeline to publish, then refreshes. Returns `false` once the pipeline is
    /// gone.
    pub async fn changed(&mut self) -> bool {
        if self.state.changed().await.is_err() {
            return false;
        }
        self.refresh();
        true
    }

    fn artifact_changed(&mut self) {
        if self.show_source {
            return;
        }
        self.mount_shown();
        self.viewport.initialize();
    }

    fn mount_shown(&self) {
        let markup = (!self.shown.is_empty()).then_some(self.shown.as_str());
        self.viewport.with_surface_mut(|surface| surface.set_artifact(markup));
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn reset(&mut self) {
        self.viewport.reset();
    }

    pub fn fullscreen(&mut self) {
        self.viewport.fullscreen();
    }

    /// Flips between the rendered artifact and the raw source text.
    pub fn toggle_source_view(&mut self) {
        self.show_source = !self.show_source;
        if self.show_source {
            self.viewport.destroy();
            self.viewport
                .with_surface_mut(|surface| surface.set_artifact(None));
        } else {
            self.mount_shown();
            self.viewport.initialize();
        }
    }

    pub fn copy_source_to_clipboard(&mut self) -> Result<(), ClipboardError> {
        let source = self.raw_source();
        self.clipboard.set_text(&source).inspect_err(|err| {
            tracing::error!(error = %err, "failed to copy diagram source");
        })
    }

    /// Exports the artifact as currently rendered, ignoring the viewport transform.
    pub fn download(&self) -> ExportOutcome {
        self.exporter.export(&self.artifact())
    }

    pub fn artifact(&self) -> String {
        self.state.borrow().artifact().to_string()
    }

    pub fn error(&self) -> Option<RenderError> {
        self.state.borrow().error().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn show_source(&self) -> bool {
        self.show_source
    }

    pub fn raw_source(&self) -> String {
        self.pipeline.source().current()
    }

    pub fn toolbar_config(&self) -> &ToolbarConfig {
        &self.toolbar
    }

    pub fn viewport(&self) -> &ViewportController<S> {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportController<S> {
        &mut self.viewport
    }

    pub fn pipeline(&self) -> &PipelineHandle {
        &self.pipeline
    }
}
