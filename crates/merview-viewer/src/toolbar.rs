use serde::{Deserialize, Serialize};

fn yes() -> bool {
    true
}

/// Host-facing toolbar settings. Everything passes through untouched apart from the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolbarConfig {
    #[serde(default = "yes")]
    pub show_toolbar: bool,
    #[serde(default = "yes")]
    pub show_fullscreen: bool,
    #[serde(default = "yes")]
    pub show_zoom_in: bool,
    #[serde(default = "yes")]
    pub show_zoom_out: bool,
    #[serde(default = "yes")]
    pub show_reset: bool,
    #[serde(default = "yes")]
    pub show_download: bool,
    /// Inline style object, forwarded as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolbar_style: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolbar_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_active_background_color: Option<String>,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            show_toolbar: true,
            show_fullscreen: true,
            show_zoom_in: true,
            show_zoom_out: true,
            show_reset: true,
            show_download: true,
            toolbar_style: None,
            toolbar_class: None,
            icon_color: None,
            tab_text_color: None,
            hover_background_color: None,
            tab_active_background_color: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarControl {
    Fullscreen,
    ZoomIn,
    ZoomOut,
    Reset,
    Download,
}

impl ToolbarControl {
    pub const ALL: [ToolbarControl; 5] = [
        Self::Fullscreen,
        Self::ZoomIn,
        Self::ZoomOut,
        Self::Reset,
        Self::Download,
    ];
}

impl ToolbarConfig {
    /// `show_toolbar` hides every control at once.
    pub fn is_visible(&self, control: ToolbarControl) -> bool {
        if !self.show_toolbar {
            return false;
        }
        match control {
            ToolbarControl::Fullscreen => self.show_fullscreen,
            ToolbarControl::ZoomIn => self.show_zoom_in,
            ToolbarControl::ZoomOut => self.show_zoom_out,
            ToolbarControl::Reset => self.show_reset,
            ToolbarControl::Download => self.show_download,
        }
    }

    pub fn visible_controls(&self) -> Vec<ToolbarControl> {
        ToolbarControl::ALL
            .into_iter()
            .filter(|c| self.is_visible(*c))
            .collect()
    }
}
