//! Engine backed by the headless `merman` renderer.

use std::sync::{Arc, PoisonError, RwLock};

use futures::FutureExt;
use futures::future::BoxFuture;
use merman::render::HeadlessRenderer;

pub use merview_core::engine::*;

use crate::{EngineConfig, EngineError, HostSurface};

/// [`DiagramEngine`] running Mermaid in-process.
///
/// All work is CPU-bound and synchronous; the returned futures are already resolved.
pub struct MermanEngine {
    renderer: RwLock<HeadlessRenderer>,
}

impl Default for MermanEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MermanEngine {
    pub fn new() -> Self {
        Self {
            renderer: RwLock::new(HeadlessRenderer::new()),
        }
    }

    fn check(&self, text: &str) -> bool {
        let renderer = self
            .renderer
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match renderer.parse_diagram_sync(text) {
            Ok(Some(_)) => true,
            Ok(None) => {
                tracing::debug!("no diagram detected");
                false
            }
            Err(err) => {
                tracing::debug!(error = %err, "diagram failed to parse");
                false
            }
        }
    }

    fn render_sync(&self, id: &str, text: &str, host: &mut HostSurface) -> Result<String, EngineError> {
        let renderer = self
            .renderer
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let svg = renderer
            .render_svg_readable_sync_with_diagram_id(text, id)
            .map_err(|e| EngineError::render(e.to_string()))?
            .ok_or_else(|| EngineError::render("no diagram detected"))?;
        host.mount(svg.clone());
        Ok(svg)
    }
}

impl DiagramEngine for MermanEngine {
    fn parse<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<bool, EngineError>> {
        futures::future::ready(Ok(self.check(text))).boxed()
    }

    fn configure(&self, config: &EngineConfig) {
        let site_config = merman::MermaidConfig::from_value(config.as_value().clone());
        let mut renderer = self
            .renderer
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *renderer = HeadlessRenderer::new().with_site_config(site_config);
    }

    fn render<'a>(
        &'a self,
        id: &'a str,
        text: &'a str,
        host: &'a mut HostSurface,
    ) -> BoxFuture<'a, Result<String, EngineError>> {
        futures::future::ready(self.render_sync(id, text, host)).boxed()
    }
}

/// Builds a fresh [`MermanEngine`] on first load.
#[derive(Debug, Default, Clone, Copy)]
pub struct MermanLoader;

impl EngineLoader for MermanLoader {
    fn load(&self) -> BoxFuture<'static, Result<SharedEngine, EngineError>> {
        let engine: SharedEngine = Arc::new(MermanEngine::new());
        futures::future::ready(Ok(engine)).boxed()
    }
}
