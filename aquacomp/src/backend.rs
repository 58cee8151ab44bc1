//! Choosing the native rendering service to draw widgets with.
//!
//! Three services may be available: drawing through views (`View`), the
//! system appearance library (`CoreUi`), and the runtime's own widget
//! renderer (`Jrs`). Which ones exist is only known at run time, so they are
//! supplied as [`NativeBackends`] and the choice is made once per
//! [`RenderingContext`].
use bitflags::bitflags;
use log::{debug, warn};
use once_cell::sync::{Lazy, OnceCell};
use quick_error::quick_error;
use std::{collections::HashMap, env, fmt, str::FromStr, sync::Arc, sync::Mutex};

use crate::{
    description::RendererDescription,
    renderer::{BasicRenderer, FallibleRenderer, Renderer},
};

/// The oldest runtime widget renderer version that is usable.
pub const MIN_JRS_VERSION: u32 = 15;

quick_error! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum BackendError {
        /// No usable backend was found.
        Unavailable {
            display("no native rendering backend is available")
        }
        /// The backend requested by the settings is not available.
        NotAvailable(kind: BackendKind) {
            display("the {} backend is not available", kind)
        }
        UnknownBackend(name: String) {
            display("unknown backend name: {:?}", name)
        }
    }
}

quick_error! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum NativeError {
        /// The native call reported a failure status.
        Failed(status: i32) {
            display("native rendering failed with status {}", status)
        }
        Unsupported(widget: String) {
            display("widget {:?} is not supported by this backend", widget)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    View,
    CoreUi,
    Jrs,
}

impl BackendKind {
    fn capability(self) -> Capabilities {
        match self {
            BackendKind::View => Capabilities::VIEW,
            BackendKind::CoreUi => Capabilities::CORE_UI,
            BackendKind::Jrs => Capabilities::JRS,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::View => "view",
            BackendKind::CoreUi => "coreui",
            BackendKind::Jrs => "jrs",
        })
    }
}

impl FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "view" => Ok(BackendKind::View),
            "coreui" => Ok(BackendKind::CoreUi),
            "jrs" => Ok(BackendKind::Jrs),
            _ => Err(BackendError::UnknownBackend(s.to_owned())),
        }
    }
}

bitflags! {
    /// The set of usable backends.
    pub struct Capabilities: u8 {
        const VIEW = 0x1;
        const CORE_UI = 0x2;
        const JRS = 0x4;
    }
}

/// A native drawing call: render `widget` into a premultiplied ARGB raster
/// of the given raster size, which covers the given size in points.
pub type NativeEntry =
    Arc<dyn Fn(&str, &mut [u32], usize, usize, f32, f32) -> Result<(), NativeError> + Send + Sync>;

/// The native entry points found in the running process.
#[derive(Clone, Default)]
pub struct NativeBackends {
    pub view: Option<NativeEntry>,
    pub core_ui: Option<NativeEntry>,
    pub jrs: Option<NativeEntry>,
    /// The major version of the runtime widget renderer, or `0` if unknown.
    pub jrs_version: u32,
}

impl fmt::Debug for NativeBackends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBackends")
            .field("capabilities", &self.capabilities())
            .field("jrs_version", &self.jrs_version)
            .finish()
    }
}

impl NativeBackends {
    /// No native services. Nothing can be selected.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether the runtime widget renderer is recent enough to be used at
    /// all, either directly or underneath `CoreUi`.
    pub fn use_jrs(&self) -> bool {
        self.jrs_version >= MIN_JRS_VERSION
    }

    pub fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::empty();
        caps.set(Capabilities::VIEW, self.view.is_some());
        caps.set(Capabilities::CORE_UI, self.core_ui.is_some());
        caps.set(Capabilities::JRS, self.jrs.is_some() && self.use_jrs());
        caps
    }

    /// The entry point `CoreUi` renders through. The appearance library is
    /// reached via the runtime widget renderer when that one is usable.
    fn core_ui_entry(&self) -> Option<NativeEntry> {
        let core_ui = self.core_ui.as_ref()?;
        match (&self.jrs, self.use_jrs()) {
            (Some(jrs), true) => Some(Arc::clone(jrs)),
            _ => Some(Arc::clone(core_ui)),
        }
    }

    fn entry(&self, kind: BackendKind) -> Option<NativeEntry> {
        if !self.capabilities().contains(kind.capability()) {
            return None;
        }
        match kind {
            BackendKind::View => self.view.clone(),
            BackendKind::CoreUi => self.core_ui_entry(),
            BackendKind::Jrs => self.jrs.clone(),
        }
    }
}

/// The outcome of backend selection.
#[derive(Clone)]
pub enum Selection {
    /// Views and `CoreUi` are both available; each widget is drawn by the
    /// best service for it.
    Hybrid {
        view: NativeEntry,
        core_ui: NativeEntry,
        jrs: Option<NativeEntry>,
    },
    Single { kind: BackendKind, entry: NativeEntry },
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Hybrid { jrs, .. } => f
                .debug_struct("Hybrid")
                .field("jrs", &jrs.is_some())
                .finish(),
            Selection::Single { kind, .. } => f.debug_struct("Single").field("kind", kind).finish(),
        }
    }
}

impl Selection {
    pub fn is_hybrid(&self) -> bool {
        match self {
            Selection::Hybrid { .. } => true,
            Selection::Single { .. } => false,
        }
    }

    /// The backends this selection can draw with.
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Selection::Hybrid { jrs, .. } => {
                let mut caps = Capabilities::VIEW | Capabilities::CORE_UI;
                caps.set(Capabilities::JRS, jrs.is_some());
                caps
            }
            Selection::Single { kind, .. } => kind.capability(),
        }
    }

    /// The entry point to draw with, given the backend best suited to the
    /// widget. A hybrid selection falls back to `CoreUi`; a single backend
    /// ignores the preference.
    pub fn entry_for(&self, preferred: BackendKind) -> &NativeEntry {
        match self {
            Selection::Hybrid { view, core_ui, jrs } => match preferred {
                BackendKind::View => view,
                BackendKind::Jrs => jrs.as_ref().unwrap_or(core_ui),
                BackendKind::CoreUi => core_ui,
            },
            Selection::Single { entry, .. } => entry,
        }
    }
}

/// Pick the backend(s) to use.
///
/// Without a forced choice the preference is: views and `CoreUi` together,
/// then `CoreUi`, then views, and the runtime widget renderer last because
/// it covers the fewest widgets.
pub fn select_backend(
    backends: &NativeBackends,
    forced: Option<BackendKind>,
) -> Result<Selection, BackendError> {
    if let Some(kind) = forced {
        return match backends.entry(kind) {
            Some(entry) => Ok(Selection::Single { kind, entry }),
            None => Err(BackendError::NotAvailable(kind)),
        };
    }

    let view = backends.entry(BackendKind::View);
    let core_ui = backends.entry(BackendKind::CoreUi);
    let jrs = backends.entry(BackendKind::Jrs);

    Ok(match (view, core_ui, jrs) {
        (Some(view), Some(core_ui), jrs) => Selection::Hybrid { view, core_ui, jrs },
        (_, Some(entry), _) => Selection::Single {
            kind: BackendKind::CoreUi,
            entry,
        },
        (Some(entry), None, _) => Selection::Single {
            kind: BackendKind::View,
            entry,
        },
        (None, None, Some(entry)) => Selection::Single {
            kind: BackendKind::Jrs,
            entry,
        },
        (None, None, None) => return Err(BackendError::Unavailable),
    })
}

/// Run-time options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Reuse the native renderer built for a widget instead of building a
    /// new one per request.
    pub caching: bool,
    /// Use only this backend.
    pub backend: Option<BackendKind>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            caching: true,
            backend: None,
        }
    }
}

impl Settings {
    /// Read `AQUACOMP_BACKEND` and `AQUACOMP_DISABLE_CACHE`. Caching is
    /// disabled if the latter is set to anything but an empty string or `0`.
    ///
    /// An unrecognized backend name is logged and ignored.
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var("AQUACOMP_BACKEND").ok().as_deref(),
            env::var_os("AQUACOMP_DISABLE_CACHE").map_or(false, |v| !v.is_empty() && v != "0"),
        )
    }

    fn from_vars(backend: Option<&str>, disable_cache: bool) -> Self {
        let backend = backend.filter(|s| !s.is_empty()).and_then(|s| match s.parse() {
            Ok(kind) => Some(kind),
            Err(e) => {
                warn!("AQUACOMP_BACKEND: {}", e);
                None
            }
        });
        Self {
            caching: !disable_cache,
            backend,
        }
    }
}

/// Backend selection state shared by everything rendering with the same
/// native services.
pub struct RenderingContext {
    settings: Settings,
    backends: NativeBackends,
    selection: OnceCell<Result<Selection, BackendError>>,
    cache: Mutex<HashMap<(String, BackendKind), Arc<dyn BasicRenderer>>>,
}

impl fmt::Debug for RenderingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderingContext")
            .field("settings", &self.settings)
            .field("backends", &self.backends)
            .field("selection", &self.selection.get())
            .finish()
    }
}

static GLOBAL: Lazy<RenderingContext> =
    Lazy::new(|| RenderingContext::new(Settings::from_env(), NativeBackends::none()));

impl RenderingContext {
    pub fn new(settings: Settings, backends: NativeBackends) -> Self {
        Self {
            settings,
            backends,
            selection: OnceCell::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide context. It is configured from the environment and
    /// has no native services; use [`RenderingContext::new`] to supply them.
    pub fn global() -> &'static RenderingContext {
        &GLOBAL
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The backend selection, made on first use.
    pub fn selection(&self) -> Result<&Selection, BackendError> {
        self.selection
            .get_or_init(|| {
                let selection = select_backend(&self.backends, self.settings.backend);
                debug!("RenderingContext: selected {:?}", selection);
                selection
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Build a renderer that draws `widget` natively. A failing native call
    /// leaves the layer empty.
    pub fn native_renderer(
        &self,
        widget: &str,
        preferred: BackendKind,
        description: RendererDescription,
    ) -> Result<Renderer, BackendError> {
        let renderer = if self.settings.caching {
            let key = (widget.to_owned(), preferred);
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            match cache.get(&key) {
                Some(r) => Arc::clone(r),
                None => {
                    let r = self.build_native(widget, preferred)?;
                    cache.insert(key, Arc::clone(&r));
                    r
                }
            }
        } else {
            self.build_native(widget, preferred)?
        };
        Ok(Renderer::Basic {
            renderer,
            description,
        })
    }

    /// Drop every cached native renderer. Renderers already handed out stay
    /// usable; later requests build new ones.
    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        debug!("RenderingContext: dropping {} cached renderers", cache.len());
        cache.clear();
    }

    /// The number of cached native renderers.
    pub fn cached_renderers(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn build_native(
        &self,
        widget: &str,
        preferred: BackendKind,
    ) -> Result<Arc<dyn BasicRenderer>, BackendError> {
        let entry = Arc::clone(self.selection()?.entry_for(preferred));
        let name = widget.to_owned();
        let call = move |data: &mut [u32], rw: usize, rh: usize, w: f32, h: f32| {
            entry(&name, data, rw, rh, w, h)
        };
        Ok(Arc::new(FallibleRenderer::new(widget, call)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::ReusableCompositor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn filler(color: u32) -> NativeEntry {
        Arc::new(move |_: &str, data: &mut [u32], _: usize, _: usize, _: f32, _: f32| -> Result<(), NativeError> {
            for p in data.iter_mut() {
                *p = color;
            }
            Ok(())
        })
    }

    fn all(jrs_version: u32) -> NativeBackends {
        NativeBackends {
            view: Some(filler(0xff000001)),
            core_ui: Some(filler(0xff000002)),
            jrs: Some(filler(0xff000003)),
            jrs_version,
        }
    }

    fn run(entry: &NativeEntry) -> u32 {
        let mut data = [0u32; 1];
        entry("button", &mut data, 1, 1, 1.0, 1.0).unwrap();
        data[0]
    }

    #[test]
    fn hybrid_when_view_and_core_ui() {
        let sel = select_backend(&all(15), None).unwrap();
        assert!(sel.is_hybrid());
        assert_eq!(sel.capabilities(), Capabilities::all());
        assert_eq!(run(sel.entry_for(BackendKind::View)), 0xff000001);
        // CoreUi goes through the runtime renderer
        assert_eq!(run(sel.entry_for(BackendKind::CoreUi)), 0xff000003);
    }

    #[test]
    fn old_jrs_is_ignored() {
        let backends = all(14);
        assert_eq!(
            backends.capabilities(),
            Capabilities::VIEW | Capabilities::CORE_UI
        );
        let sel = select_backend(&backends, None).unwrap();
        assert_eq!(run(sel.entry_for(BackendKind::CoreUi)), 0xff000002);
        assert_eq!(run(sel.entry_for(BackendKind::Jrs)), 0xff000002);
    }

    #[test]
    fn preference_order() {
        let mut backends = all(15);
        backends.view = None;
        let sel = select_backend(&backends, None).unwrap();
        assert_eq!(sel.capabilities(), Capabilities::CORE_UI);

        backends.core_ui = None;
        backends.view = Some(filler(1));
        let sel = select_backend(&backends, None).unwrap();
        assert_eq!(sel.capabilities(), Capabilities::VIEW);

        backends.view = None;
        let sel = select_backend(&backends, None).unwrap();
        assert_eq!(sel.capabilities(), Capabilities::JRS);

        backends.jrs_version = 10;
        assert_eq!(
            select_backend(&backends, None).unwrap_err(),
            BackendError::Unavailable
        );
    }

    #[test]
    fn forced_backend() {
        let sel = select_backend(&all(15), Some(BackendKind::View)).unwrap();
        assert_eq!(sel.capabilities(), Capabilities::VIEW);
        assert_eq!(
            select_backend(&all(3), Some(BackendKind::Jrs)).unwrap_err(),
            BackendError::NotAvailable(BackendKind::Jrs)
        );
    }

    #[test]
    fn settings_from_vars() {
        assert_eq!(Settings::from_vars(None, false), Settings::default());
        let s = Settings::from_vars(Some("CoreUI"), true);
        assert_eq!(s.backend, Some(BackendKind::CoreUi));
        assert!(!s.caching);
        assert_eq!(Settings::from_vars(Some("bogus"), false).backend, None);
    }

    #[test]
    fn native_renderer_is_cached() {
        let builds = Arc::new(AtomicUsize::new(0));
        let calls = Arc::clone(&builds);
        let entry: NativeEntry = Arc::new(move |_: &str, data: &mut [u32], _: usize, _: usize, _: f32, _: f32| -> Result<(), NativeError> {
            calls.fetch_add(1, Ordering::Relaxed);
            data[0] = 0xffffffff;
            Ok(())
        });
        let backends = NativeBackends {
            core_ui: Some(entry),
            ..NativeBackends::none()
        };
        let cx = RenderingContext::new(Settings::default(), backends);
        let a = cx
            .native_renderer("button", BackendKind::CoreUi, RendererDescription::Trivial)
            .unwrap();
        let b = cx
            .native_renderer("button", BackendKind::CoreUi, RendererDescription::Trivial)
            .unwrap();
        match (&a, &b) {
            (Renderer::Basic { renderer: ra, .. }, Renderer::Basic { renderer: rb, .. }) => {
                assert!(Arc::ptr_eq(ra, rb))
            }
            _ => panic!("expected basic renderers"),
        }

        let mut c = ReusableCompositor::with_size(2, 2, 1).unwrap();
        c.compose(&a);
        assert_eq!(builds.load(Ordering::Relaxed), 1);
        assert_eq!(c.image().unwrap().pixel(0, 0), Some(0xffffffff));
    }

    #[test]
    fn clear_cache_drops_renderers() {
        let backends = NativeBackends {
            core_ui: Some(filler(0xff00ff00)),
            ..NativeBackends::none()
        };
        let cx = RenderingContext::new(Settings::default(), backends);
        let basic = |r: &Renderer| match r {
            Renderer::Basic { renderer, .. } => Arc::clone(renderer),
            _ => panic!("expected a basic renderer"),
        };

        let a = cx
            .native_renderer("button", BackendKind::CoreUi, RendererDescription::Trivial)
            .unwrap();
        cx.native_renderer("slider", BackendKind::CoreUi, RendererDescription::Trivial)
            .unwrap();
        assert_eq!(cx.cached_renderers(), 2);

        cx.clear_cache();
        assert_eq!(cx.cached_renderers(), 0);

        let b = cx
            .native_renderer("button", BackendKind::CoreUi, RendererDescription::Trivial)
            .unwrap();
        assert!(!Arc::ptr_eq(&basic(&a), &basic(&b)));
        assert_eq!(cx.cached_renderers(), 1);

        // The renderer handed out before clearing still works
        let mut c = ReusableCompositor::with_size(1, 1, 1).unwrap();
        c.compose(&a);
        assert_eq!(c.image().unwrap().pixel(0, 0), Some(0xff00ff00));
    }

    #[test]
    fn uncached_context_keeps_nothing() {
        let backends = NativeBackends {
            core_ui: Some(filler(0xffffffff)),
            ..NativeBackends::none()
        };
        let settings = Settings {
            caching: false,
            ..Settings::default()
        };
        let cx = RenderingContext::new(settings, backends);
        cx.native_renderer("button", BackendKind::CoreUi, RendererDescription::Trivial)
            .unwrap();
        assert_eq!(cx.cached_renderers(), 0);
    }

    #[test]
    fn failing_native_call_skips_layer() {
        let entry: NativeEntry = Arc::new(|_: &str, _: &mut [u32], _: usize, _: usize, _: f32, _: f32| -> Result<(), NativeError> {
            Err(NativeError::Failed(-1))
        });
        let backends = NativeBackends {
            view: Some(entry),
            ..NativeBackends::none()
        };
        let cx = RenderingContext::new(Settings::default(), backends);
        let r = cx
            .native_renderer("slider", BackendKind::View, RendererDescription::Trivial)
            .unwrap();
        let mut c = ReusableCompositor::with_size(2, 2, 1).unwrap();
        c.compose(&r);
        assert!(c.image().unwrap().pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn no_backends() {
        let cx = RenderingContext::new(Settings::default(), NativeBackends::none());
        assert_eq!(cx.selection().unwrap_err(), BackendError::Unavailable);
        assert!(cx
            .native_renderer("button", BackendKind::View, RendererDescription::Trivial)
            .is_err());
    }
}
