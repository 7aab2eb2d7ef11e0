#![forbid(unsafe_code)]

//! Render pipeline for Mermaid diagrams embedded in interactive views.
//!
//! The crate does not parse the diagram language itself. It coordinates an external
//! [`engine::DiagramEngine`]:
//! - the engine is loaded lazily, once per process, behind a single-flight [`EngineHandle`]
//! - renders target a hidden, process-wide [`host::OffscreenHost`]
//! - source updates are rate limited by a leading + trailing [`throttle::Throttle`]
//! - the current [`RenderResult`] is published through a `tokio::sync::watch` channel
//!
//! Async APIs only need a tokio runtime for [`DiagramRenderPipeline::spawn`]; a single
//! [`DiagramRenderPipeline::render_once`] call is executor-agnostic.

pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod throttle;

pub use config::{EngineConfig, PipelineOptions, ThemeSelection};
pub use engine::{DiagramEngine, EngineHandle, EngineLoader};
pub use error::{EngineError, RenderError, Result};
pub use host::{HostSurface, OffscreenHost, offscreen_host};
pub use pipeline::{
    DiagramRenderPipeline, DiagramSource, PipelineHandle, RenderResult, RenderState,
};
pub use throttle::{Throttle, ThrottleDecision};
