//! Source text -> rendered SVG, throttled and published as observable state.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::{EngineConfig, PipelineOptions};
use crate::engine::{EngineHandle, render_id};
use crate::error::RenderError;
use crate::host::offscreen_host;
use crate::throttle::{Throttle, ThrottleDecision};

/// Outcome of the most recent render. A new render replaces it entirely.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RenderResult {
    /// No (or blank) source.
    #[default]
    Empty,
    /// SVG markup, or the raw source text when no engine is available.
    Success(String),
    Failure(RenderError),
}

impl RenderResult {
    /// The displayable artifact; empty unless the render succeeded.
    pub fn artifact(&self) -> &str {
        match self {
            Self::Success(artifact) => artifact,
            Self::Empty | Self::Failure(_) => "",
        }
    }

    pub fn error(&self) -> Option<&RenderError> {
        match self {
            Self::Failure(err) => Some(err),
            Self::Empty | Self::Success(_) => None,
        }
    }
}

/// What views subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderState {
    pub result: RenderResult,
    /// A render is in flight.
    pub loading: bool,
}

impl RenderState {
    pub fn artifact(&self) -> &str {
        self.result.artifact()
    }

    pub fn error(&self) -> Option<&RenderError> {
        self.result.error()
    }
}

/// Diagram text, either fixed or observed through a watch channel.
#[derive(Debug, Clone)]
pub enum DiagramSource {
    Static(String),
    Watch(watch::Receiver<String>),
}

impl DiagramSource {
    pub fn current(&self) -> String {
        match self {
            Self::Static(text) => text.clone(),
            Self::Watch(rx) => rx.borrow().clone(),
        }
    }

    fn current_and_mark_seen(&mut self) -> String {
        match self {
            Self::Static(text) => text.clone(),
            Self::Watch(rx) => rx.borrow_and_update().clone(),
        }
    }

    /// Waits for the next change. Static sources never change; the future never resolves.
    async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        match self {
            Self::Static(_) => futures::future::pending().await,
            Self::Watch(rx) => rx.changed().await,
        }
    }

    fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }
}

impl From<String> for DiagramSource {
    fn from(value: String) -> Self {
        Self::Static(value)
    }
}

impl From<&str> for DiagramSource {
    fn from(value: &str) -> Self {
        Self::Static(value.to_string())
    }
}

impl From<watch::Receiver<String>> for DiagramSource {
    fn from(value: watch::Receiver<String>) -> Self {
        Self::Watch(value)
    }
}

pub struct DiagramRenderPipeline {
    engine: Arc<EngineHandle>,
    options: PipelineOptions,
    engine_config: EngineConfig,
}

impl DiagramRenderPipeline {
    pub fn new(engine: Arc<EngineHandle>, options: PipelineOptions) -> Self {
        let engine_config = options.effective_engine_config();
        Self {
            engine,
            options,
            engine_config,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// The config passed to `configure` before every render.
    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine_config
    }

    /// One unthrottled execution of the render algorithm.
    ///
    /// Never fails: errors are folded into [`RenderResult::Failure`].
    pub async fn render_once(&self, text: &str) -> RenderResult {
        if text.trim().is_empty() {
            return RenderResult::Empty;
        }
        match self.try_render(text).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(error = %err, "Mermaid render error");
                RenderResult::Failure(err)
            }
        }
    }

    async fn try_render(&self, text: &str) -> Result<RenderResult, RenderError> {
        let Some(engine) = self.engine.load().await? else {
            // Nothing can draw the diagram here; show the source instead.
            return Ok(RenderResult::Success(text.to_string()));
        };

        if !engine.parse(text.trim()).await? {
            tracing::debug!("Mermaid parse error: Invalid syntax");
            return Err(RenderError::InvalidSyntax);
        }

        engine.configure(&self.engine_config);
        let id = render_id(&self.options.render_id_prefix);
        let mut host = offscreen_host().acquire().await;
        tracing::debug!(%id, "rendering diagram");
        let svg = engine.render(&id, text, &mut host).await?;
        Ok(RenderResult::Success(svg))
    }

    /// Starts the throttled driver on the current tokio runtime.
    ///
    /// The initial source value renders immediately. Later changes go through a leading +
    /// trailing throttle; every execution reads the latest source value. Renders are not
    /// cancelled when superseded: whichever finishes last wins.
    pub fn spawn(self, source: impl Into<DiagramSource>) -> PipelineHandle {
        let source = source.into();
        let (tx, rx) = watch::channel(RenderState::default());
        let shared = Arc::new(DriverState {
            pipeline: self,
            state: tx,
            in_flight: AtomicUsize::new(0),
        });
        let driver = tokio::spawn(drive(Arc::clone(&shared), source.clone()));
        PipelineHandle {
            state: rx,
            source,
            driver,
        }
    }
}

struct DriverState {
    pipeline: DiagramRenderPipeline,
    state: watch::Sender<RenderState>,
    in_flight: AtomicUsize,
}

impl DriverState {
    fn start_render(self: &Arc<Self>, text: String) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|state| state.loading = true);

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let result = this.pipeline.render_once(&text).await;
            let remaining = this.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
            this.state.send_modify(|state| {
                state.result = result;
                state.loading = remaining > 0;
            });
        });
    }
}

async fn drive(shared: Arc<DriverState>, mut source: DiagramSource) {
    let mut throttle = Throttle::new(shared.pipeline.options.throttle_window());
    let mut observed = source.current_and_mark_seen();
    throttle.call(Instant::now());
    shared.start_render(observed.clone());

    let mut closed = source.is_static();
    loop {
        let deadline = throttle.deadline();
        if closed && deadline.is_none() {
            break;
        }

        tokio::select! {
            changed = source.changed(), if !closed => {
                if changed.is_err() {
                    // Sender dropped; still flush an armed trailing render.
                    closed = true;
                    continue;
                }
                let value = source.current_and_mark_seen();
                if value == observed {
                    continue;
                }
                observed = value;
                match throttle.call(Instant::now()) {
                    ThrottleDecision::InvokeNow => shared.start_render(observed.clone()),
                    ThrottleDecision::Schedule(_) | ThrottleDecision::Coalesced => {}
                }
            }
            () = sleep_until(deadline) => {
                if throttle.fire(Instant::now()) {
                    observed = source.current_and_mark_seen();
                    shared.start_render(observed.clone());
                }
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => futures::future::pending().await,
    }
}

/// Owner side of a spawned pipeline. Dropping it stops the driver; renders already in flight
/// still complete.
pub struct PipelineHandle {
    state: watch::Receiver<RenderState>,
    source: DiagramSource,
    driver: JoinHandle<()>,
}

impl PipelineHandle {
    pub fn subscribe(&self) -> watch::Receiver<RenderState> {
        self.state.clone()
    }

    pub fn state(&self) -> RenderState {
        self.state.borrow().clone()
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

    /// The source text as currently observed.
    pub fn source(&self) -> &DiagramSource {
        &self.source
    }

    pub fn shutdown(&self) {
        self.driver.abort();
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
