use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_THEME: &str = "default";
pub const DEFAULT_DARK_THEME: &str = "dark";
pub const DEFAULT_THROTTLE_MS: u64 = 300;
pub const DEFAULT_RENDER_ID_PREFIX: &str = "mermaid";

/// Engine options as a free-form JSON object (Mermaid's `initialize()` shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineConfig(Value);

impl Default for EngineConfig {
    fn default() -> Self {
        Self::empty_object()
    }
}

impl EngineConfig {
    pub fn empty_object() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// The options every render starts from before caller overrides are applied.
    pub fn defaults(theme: &str) -> Self {
        let mut cfg = Self::empty_object();
        cfg.set_value("suppressErrorRendering", Value::Bool(true));
        cfg.set_value("startOnLoad", Value::Bool(false));
        cfg.set_value("securityLevel", Value::String("loose".to_string()));
        cfg.set_value("theme", Value::String(theme.to_string()));
        cfg
    }

    /// [`EngineConfig::defaults`] with `overrides` merged on top; overrides win on collision.
    pub fn with_overrides(theme: &str, overrides: &EngineConfig) -> Self {
        let mut cfg = Self::defaults(theme);
        cfg.deep_merge(overrides.as_value());
        cfg
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.get(dotted_path)?.as_str()
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        self.get(dotted_path)?.as_bool()
    }

    pub fn get(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        // Configs deserialized from user files may be any JSON value; coerce to an object so
        // this never panics on user input.
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }

        let Value::Object(ref mut root) = self.0 else {
            return;
        };
        let mut cur: &mut Map<String, Value> = root;
        let mut segments = dotted_path.split('.').peekable();
        while let Some(seg) = segments.next() {
            if segments.peek().is_none() {
                cur.insert(seg.to_string(), value);
                return;
            }
            let slot = cur.entry(seg).or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Some(next) = slot.as_object_mut() else {
                return;
            };
            cur = next;
        }
    }

    pub fn deep_merge(&mut self, other: &Value) {
        deep_merge_value(&mut self.0, other);
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}

/// Light/dark theme pair; the active one is picked by [`ThemeSelection::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeSelection {
    pub dark: bool,
    pub light_theme: String,
    pub dark_theme: String,
}

impl Default for ThemeSelection {
    fn default() -> Self {
        Self {
            dark: false,
            light_theme: DEFAULT_THEME.to_string(),
            dark_theme: DEFAULT_DARK_THEME.to_string(),
        }
    }
}

impl ThemeSelection {
    pub fn named(theme: impl Into<String>) -> Self {
        Self {
            light_theme: theme.into(),
            ..Self::default()
        }
    }

    pub fn resolve(&self) -> &str {
        let (picked, fallback) = if self.dark {
            (self.dark_theme.trim(), DEFAULT_DARK_THEME)
        } else {
            (self.light_theme.trim(), DEFAULT_THEME)
        };
        if picked.is_empty() { fallback } else { picked }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineOptions {
    pub throttle_ms: u64,
    pub render_id_prefix: String,
    pub theme: ThemeSelection,
    /// Caller overrides applied on top of [`EngineConfig::defaults`].
    pub engine: EngineConfig,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            throttle_ms: DEFAULT_THROTTLE_MS,
            render_id_prefix: DEFAULT_RENDER_ID_PREFIX.to_string(),
            theme: ThemeSelection::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl PipelineOptions {
    pub fn throttle_window(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn effective_engine_config(&self) -> EngineConfig {
        EngineConfig::with_overrides(self.theme.resolve(), &self.engine)
    }
}
