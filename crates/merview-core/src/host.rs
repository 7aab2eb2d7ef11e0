//! The hidden render target shared by every pipeline in the process.
//!
//! Engines need a real layout context to measure text and size the SVG viewport. The host
//! provides one without ever being shown: it has no height, no opacity, clips its overflow and
//! is hidden from accessibility trees.

use std::sync::OnceLock;

use tokio::sync::{Mutex, MutexGuard};

pub const HOST_CLASS: &str = "merview-offscreen-host";
pub const DEFAULT_LAYOUT_WIDTH: f64 = 800.0;
pub const DEFAULT_LAYOUT_HEIGHT: f64 = 600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    Visible,
    Hidden,
}

/// The element an engine renders into.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSurface {
    class_name: &'static str,
    aria_hidden: bool,
    max_height: f64,
    opacity: f64,
    overflow: Overflow,
    layout_width: f64,
    layout_height: f64,
    mounted: Option<String>,
}

impl HostSurface {
    fn hidden() -> Self {
        Self {
            class_name: HOST_CLASS,
            aria_hidden: true,
            max_height: 0.0,
            opacity: 0.0,
            overflow: Overflow::Hidden,
            layout_width: DEFAULT_LAYOUT_WIDTH,
            layout_height: DEFAULT_LAYOUT_HEIGHT,
            mounted: None,
        }
    }

    pub fn class_name(&self) -> &str {
        self.class_name
    }

    pub fn aria_hidden(&self) -> bool {
        self.aria_hidden
    }

    pub fn is_visible(&self) -> bool {
        !self.aria_hidden && self.max_height > 0.0 && self.opacity > 0.0
    }

    pub fn overflow(&self) -> Overflow {
        self.overflow
    }

    /// Width/height engines may lay out against.
    pub fn layout_size(&self) -> (f64, f64) {
        (self.layout_width, self.layout_height)
    }

    pub fn set_layout_size(&mut self, width: f64, height: f64) {
        if width.is_finite() && width > 0.0 {
            self.layout_width = width;
        }
        if height.is_finite() && height > 0.0 {
            self.layout_height = height;
        }
    }

    /// Engines may leave their last output mounted; it is replaced by the next render.
    pub fn mount(&mut self, markup: impl Into<String>) {
        self.mounted = Some(markup.into());
    }

    pub fn mounted(&self) -> Option<&str> {
        self.mounted.as_deref()
    }

    pub fn clear(&mut self) {
        self.mounted = None;
    }
}

/// Process-wide owner of the [`HostSurface`]. Renders hold it exclusively for their duration.
#[derive(Debug)]
pub struct OffscreenHost {
    surface: Mutex<HostSurface>,
}

impl OffscreenHost {
    fn new() -> Self {
        Self {
            surface: Mutex::new(HostSurface::hidden()),
        }
    }

    pub async fn acquire(&self) -> MutexGuard<'_, HostSurface> {
        self.surface.lock().await
    }
}

/// Returns the process-wide host, creating it on first use.
pub fn offscreen_host() -> &'static OffscreenHost {
    static HOST: OnceLock<OffscreenHost> = OnceLock::new();
    HOST.get_or_init(|| {
        tracing::debug!(class = HOST_CLASS, "creating offscreen render host");
        OffscreenHost::new()
    })
}
