//! Facade over the external diagram engine and its lazy, single-flight loading.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::host::HostSurface;

/// Parse/configure/render entry points of a diagram engine.
///
/// `parse` must be called before `render`: engines are allowed to leave the host in an
/// unusable state when asked to render invalid source.
pub trait DiagramEngine: Send + Sync {
    fn parse<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<bool, EngineError>>;

    fn configure(&self, config: &EngineConfig);

    fn render<'a>(
        &'a self,
        id: &'a str,
        text: &'a str,
        host: &'a mut HostSurface,
    ) -> BoxFuture<'a, Result<String, EngineError>>;
}

pub type SharedEngine = Arc<dyn DiagramEngine>;

type LoadFuture = Shared<BoxFuture<'static, Result<SharedEngine, EngineError>>>;

/// Produces the engine. Called at most once per successful load.
pub trait EngineLoader: Send + Sync {
    /// Engines are only loaded where there is a surface to lay out against. When this returns
    /// `false`, [`EngineHandle::load`] short-circuits to `None` without calling [`Self::load`].
    fn has_visual_surface(&self) -> bool {
        true
    }

    fn load(&self) -> BoxFuture<'static, Result<SharedEngine, EngineError>>;
}

/// Loader for an engine that is already constructed.
pub struct StaticLoader {
    engine: SharedEngine,
}

impl StaticLoader {
    pub fn new(engine: SharedEngine) -> Self {
        Self { engine }
    }
}

impl EngineLoader for StaticLoader {
    fn load(&self) -> BoxFuture<'static, Result<SharedEngine, EngineError>> {
        futures::future::ready(Ok(Arc::clone(&self.engine))).boxed()
    }
}

/// Loader for environments without a visual surface (no engine is ever produced).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSurface;

impl EngineLoader for NoSurface {
    fn has_visual_surface(&self) -> bool {
        false
    }

    fn load(&self) -> BoxFuture<'static, Result<SharedEngine, EngineError>> {
        futures::future::ready(Err(EngineError::load("no visual surface"))).boxed()
    }
}

enum LoadState {
    Absent,
    Loading { generation: u64, future: LoadFuture },
    Loaded(SharedEngine),
}

struct HandleState {
    load: LoadState,
    generation: u64,
}

/// Lazily loaded engine reference.
///
/// absent -> loading -> loaded, or back to absent when the load fails. Callers that arrive
/// while a load is in flight await the same future and observe the same outcome.
pub struct EngineHandle {
    loader: Arc<dyn EngineLoader>,
    state: Mutex<HandleState>,
}

impl EngineHandle {
    pub fn new(loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            loader,
            state: Mutex::new(HandleState {
                load: LoadState::Absent,
                generation: 0,
            }),
        }
    }

    pub fn with_engine(engine: SharedEngine) -> Self {
        Self::new(Arc::new(StaticLoader::new(engine)))
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.lock().load, LoadState::Loaded(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.lock().load, LoadState::Loading { .. })
    }

    /// Returns the engine, loading it on first use.
    ///
    /// `Ok(None)` means the environment has no visual surface; that is not an error.
    pub async fn load(&self) -> Result<Option<SharedEngine>, EngineError> {
        if !self.loader.has_visual_surface() {
            return Ok(None);
        }

        let (generation, future) = {
            let mut state = self.lock();
            match &state.load {
                LoadState::Loaded(engine) => return Ok(Some(Arc::clone(engine))),
                LoadState::Loading { generation, future } => (*generation, future.clone()),
                LoadState::Absent => {
                    state.generation += 1;
                    let generation = state.generation;
                    tracing::debug!(generation, "loading diagram engine");
                    let future = self.loader.load().shared();
                    state.load = LoadState::Loading {
                        generation,
                        future: future.clone(),
                    };
                    (generation, future)
                }
            }
        };

        let outcome = future.await;

        let mut state = self.lock();
        // Only the load that is still current may settle the state.
        let settles = matches!(
            &state.load,
            LoadState::Loading { generation: g, .. } if *g == generation
        );
        if settles {
            state.load = match &outcome {
                Ok(engine) => LoadState::Loaded(Arc::clone(engine)),
                Err(err) => {
                    tracing::warn!(error = %err, "diagram engine failed to load");
                    LoadState::Absent
                }
            };
        }
        outcome.map(Some)
    }

    fn lock(&self) -> MutexGuard<'_, HandleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the process-wide handle, creating it with `loader` on first use.
///
/// Later calls ignore their `loader` argument and return the existing handle.
pub fn global_handle(loader: impl FnOnce() -> Arc<dyn EngineLoader>) -> Arc<EngineHandle> {
    static HANDLE: OnceLock<Arc<EngineHandle>> = OnceLock::new();
    Arc::clone(HANDLE.get_or_init(|| Arc::new(EngineHandle::new(loader()))))
}

const RENDER_ID_SUFFIX_LEN: usize = 9;

/// Builds a fresh render id: the sanitized `prefix`, a dash, and 9 random base-36 characters.
///
/// Engines keep per-id bookkeeping (marker ids, style scopes); reusing an id across renders
/// lets a previous render's leftovers collide with the new one.
pub fn render_id(prefix: &str) -> String {
    let mut n = uuid::Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(RENDER_ID_SUFFIX_LEN);
    for _ in 0..RENDER_ID_SUFFIX_LEN {
        let digit = (n % 36) as u32;
        n /= 36;
        suffix.push(char::from_digit(digit, 36).unwrap_or('0'));
    }
    format!("{}-{suffix}", sanitize_id_prefix(prefix))
}

/// Converts an arbitrary string into a conservative SVG `id` token.
///
/// - trims whitespace
/// - replaces unsupported characters with `-`
/// - ensures the id starts with an ASCII letter by prefixing `m-` when needed
///
/// The result is a prefix that gets `-<suffix>` appended and is reused inside CSS selectors,
/// so `:` and `.` are replaced too.
pub fn sanitize_id_prefix(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "mermaid".to_string();
    }

    let mut out = String::with_capacity(raw.len() + 2);
    for ch in raw.chars() {
        let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_';
        out.push(if ok { ch } else { '-' });
    }
    if !out.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        out.insert_str(0, "m-");
    }
    while out.contains("--") {
        out = out.replace("--", "-");
    }
    let out = out.trim_matches('-');
    if out.is_empty() || out == "m" {
        return "mermaid".to_string();
    }
    out.to_string()
}
