//! Lazy Class Autoloader
//!
//! Resolves a class name to a file the first time the class is needed:
//! - Ordered search paths and extensions (insertion order = priority)
//! - Path-major, extension-minor search; first readable candidate wins
//! - Loaded cache: a class is loaded at most once per autoloader
//! - Registration on a [`ResolverChain`] via `enable` / `disable`
//!
//! # Resolution
//!
//! For each search path, for each extension, the candidate
//! `path + class_name + extension` is probed. The first readable candidate is
//! handed to the [`FileLoader`] and, if that succeeds, recorded as loaded.
//! If no candidate is readable the class is reported as not found and nothing
//! is recorded, so a later reference fails through the host's normal
//! undefined-class path.
//!
//! # Locking
//!
//! Paths, extensions, the loaded cache and the in-flight set share one mutex.
//! The search and the in-flight mark happen under that lock; the load step
//! runs without it so a loaded file can reference further classes. A class
//! that is in flight is never searched or loaded a second time:
//! - the loading thread re-entering gets [`Resolution::InProgress`]
//! - any other thread waits on a condvar until the load settles, then sees
//!   the class as loaded, or searches again if the load failed
//! - a wait that would close a cycle between loading threads returns
//!   `InProgress` instead of blocking

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, trace, warn};

use super::path::{
    candidate_path, normalize_extension, normalize_path, push_unique, remove_item,
    DEFAULT_EXTENSION,
};
use super::probe::{FileProbe, OsProbe, Probe};
use super::source::{FileLoader, ReadLoader};
use crate::config::AutoloadConfig;
use crate::error::{AutoloadError, AutoloadResult};
use crate::hook::{ClassResolver, HookId, ResolverChain};

/// Successful outcome of [`Autoloader::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The class file was found and loaded by this call.
    Loaded(PathBuf),
    /// The class had been loaded before; nothing was touched.
    AlreadyLoaded(PathBuf),
    /// The class is being loaded further up this thread's own call stack.
    InProgress,
}

impl Resolution {
    /// Path of the class file, when known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Resolution::Loaded(path) | Resolution::AlreadyLoaded(path) => Some(path.as_path()),
            Resolution::InProgress => None,
        }
    }
}

/// Everything guarded by the autoloader's single lock.
#[derive(Debug, Clone, Default)]
struct LoaderState {
    paths: Vec<String>,
    extensions: Vec<String>,
    loaded: HashMap<String, PathBuf>,
    /// Class being loaded -> thread running its load step.
    in_flight: HashMap<String, ThreadId>,
    /// Thread blocked in `resolve` -> class it is waiting for.
    waiting: HashMap<ThreadId, String>,
}

enum Search {
    Found(PathBuf),
    Exhausted(Vec<PathBuf>),
}

impl LoaderState {
    fn candidates(&self, class_name: &str) -> Vec<PathBuf> {
        self.paths
            .iter()
            .flat_map(|path| {
                self.extensions
                    .iter()
                    .map(move |ext| candidate_path(path, class_name, ext))
            })
            .collect()
    }

    /// Whether waiting on a load owned by `owner` would lead back to `me`.
    fn would_deadlock(&self, owner: ThreadId, me: ThreadId) -> bool {
        let mut current = owner;
        for _ in 0..=self.waiting.len() {
            if current == me {
                return true;
            }
            match self
                .waiting
                .get(&current)
                .and_then(|class| self.in_flight.get(class))
            {
                Some(next) => current = *next,
                None => return false,
            }
        }
        false
    }

    fn search(&self, class_name: &str, probe: &dyn FileProbe) -> Search {
        let mut tried = Vec::new();
        for candidate in self.candidates(class_name) {
            match probe.probe(&candidate) {
                Probe::Readable => {
                    trace!(class = class_name, candidate = %candidate.display(), "candidate readable");
                    return Search::Found(candidate);
                }
                Probe::Missing => {
                    trace!(class = class_name, candidate = %candidate.display(), "candidate missing");
                }
                Probe::Error(err) => {
                    warn!(class = class_name, candidate = %candidate.display(), error = %err, "candidate check failed, skipping");
                }
            }
            tried.push(candidate);
        }
        Search::Exhausted(tried)
    }
}

/// Lazy class-file loader.
pub struct Autoloader {
    id: HookId,
    chain: Arc<ResolverChain>,
    probe: Arc<dyn FileProbe>,
    file_loader: RwLock<Arc<dyn FileLoader>>,
    state: Mutex<LoaderState>,
    /// Signalled whenever an in-flight load settles.
    load_settled: Condvar,
}

/// Clears an in-flight mark when the load step ends, even by unwinding.
struct InFlightGuard<'a> {
    owner: &'a Autoloader,
    class_name: &'a str,
    loaded: Option<PathBuf>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.owner.state.lock();
        state.in_flight.remove(self.class_name);
        if let Some(path) = self.loaded.take() {
            state.loaded.insert(self.class_name.to_string(), path);
        }
        self.owner.load_settled.notify_all();
    }
}

impl Autoloader {
    /// Create an independent autoloader on its own, empty chain.
    pub fn new() -> Arc<Self> {
        Self::builder().build()
    }

    pub fn builder() -> AutoloaderBuilder {
        AutoloaderBuilder::new()
    }

    /// Build an autoloader from configuration, registering it on `chain` if
    /// the configuration enables it.
    pub fn from_config(config: &AutoloadConfig, chain: Arc<ResolverChain>) -> Arc<Self> {
        let loader = AutoloaderBuilder::from_config(config).chain(chain).build();
        if config.enabled {
            loader.enable();
        }
        loader
    }

    /// The process-wide autoloader.
    ///
    /// Created on first call, seeded with `path` and attached to
    /// [`ResolverChain::global`] (but not enabled). Later calls return the
    /// same instance and ignore `path`.
    pub fn get_ready(path: Option<&str>) -> Arc<Self> {
        static INSTANCE: OnceLock<Arc<Autoloader>> = OnceLock::new();

        let mut created = false;
        let instance = INSTANCE.get_or_init(|| {
            created = true;
            let mut builder = Autoloader::builder().chain(ResolverChain::global());
            if let Some(path) = path {
                builder = builder.path(path);
            }
            builder.build()
        });
        if !created {
            if let Some(path) = path {
                debug!(path, "autoloader already initialized, ignoring path");
            }
        }
        Arc::clone(instance)
    }

    /// Identity of this autoloader on its chain.
    pub fn id(&self) -> HookId {
        self.id
    }

    pub fn chain(&self) -> &Arc<ResolverChain> {
        &self.chain
    }

    /// Replace the load step.
    pub fn set_file_loader(&self, loader: Arc<dyn FileLoader>) -> &Self {
        *self.file_loader.write() = loader;
        self
    }

    // ------------------------------------------------------------------
    // Paths
    // ------------------------------------------------------------------

    pub fn add_path(&self, path: impl AsRef<str>) -> &Self {
        self.add_paths([path])
    }

    /// Add several search paths, in order. Duplicates are skipped.
    pub fn add_paths<I, S>(&self, paths: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state.lock();
        for path in paths {
            let normalized = normalize_path(path.as_ref());
            if push_unique(&mut state.paths, normalized) {
                trace!(path = path.as_ref(), "search path added");
            }
        }
        self
    }

    /// Search paths in priority order.
    pub fn paths(&self) -> Vec<String> {
        self.state.lock().paths.clone()
    }

    pub fn remove_path(&self, path: impl AsRef<str>) -> &Self {
        self.remove_paths([path])
    }

    /// Remove search paths. Paths that are not registered are ignored.
    pub fn remove_paths<I, S>(&self, paths: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state.lock();
        for path in paths {
            remove_item(&mut state.paths, &normalize_path(path.as_ref()));
        }
        self
    }

    // ------------------------------------------------------------------
    // Extensions
    // ------------------------------------------------------------------

    pub fn add_extension(&self, extension: impl AsRef<str>) -> &Self {
        self.add_extensions([extension])
    }

    /// Add several extensions, in order. Duplicates are skipped.
    pub fn add_extensions<I, S>(&self, extensions: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state.lock();
        for ext in extensions {
            if push_unique(&mut state.extensions, normalize_extension(ext.as_ref())) {
                trace!(extension = ext.as_ref(), "extension added");
            }
        }
        self
    }

    /// Extensions in priority order.
    pub fn extensions(&self) -> Vec<String> {
        self.state.lock().extensions.clone()
    }

    pub fn remove_extension(&self, extension: impl AsRef<str>) -> &Self {
        self.remove_extensions([extension])
    }

    pub fn remove_extensions<I, S>(&self, extensions: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state.lock();
        for ext in extensions {
            remove_item(&mut state.extensions, &normalize_extension(ext.as_ref()));
        }
        self
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Attach to the chain. Returns false if already attached.
    ///
    /// The chain keeps the autoloader alive until [`disable`](Self::disable).
    pub fn enable(self: &Arc<Self>) -> bool {
        let resolver: Arc<dyn ClassResolver> = Arc::clone(self) as Arc<dyn ClassResolver>;
        self.chain.register(resolver)
    }

    /// Detach from the chain. Returns false if it was not attached.
    pub fn disable(&self) -> bool {
        self.chain.unregister(self.id)
    }

    pub fn is_enabled(&self) -> bool {
        self.chain.contains(self.id)
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Every candidate for `class_name`, in search order, without probing.
    pub fn candidates(&self, class_name: &str) -> Vec<PathBuf> {
        self.state.lock().candidates(class_name)
    }

    /// Find and load the file for `class_name`, once.
    ///
    /// Blocks while another thread is loading the same class.
    pub fn resolve(&self, class_name: &str) -> AutoloadResult<Resolution> {
        let me = thread::current().id();
        let path = {
            let mut state = self.state.lock();

            loop {
                if let Some(path) = state.loaded.get(class_name) {
                    trace!(class = class_name, "already loaded");
                    return Ok(Resolution::AlreadyLoaded(path.clone()));
                }
                let owner = match state.in_flight.get(class_name) {
                    Some(owner) => *owner,
                    None => break,
                };
                if owner == me || state.would_deadlock(owner, me) {
                    trace!(class = class_name, "load in progress");
                    return Ok(Resolution::InProgress);
                }
                trace!(class = class_name, "waiting for load on another thread");
                state.waiting.insert(me, class_name.to_string());
                self.load_settled.wait(&mut state);
                state.waiting.remove(&me);
            }

            match state.search(class_name, self.probe.as_ref()) {
                Search::Found(path) => {
                    state.in_flight.insert(class_name.to_string(), me);
                    path
                }
                Search::Exhausted(candidates) => {
                    debug!(class = class_name, tried = candidates.len(), "no readable candidate");
                    return Err(AutoloadError::ClassNotFound {
                        class: class_name.to_string(),
                        candidates,
                    });
                }
            }
        };

        let mut guard = InFlightGuard {
            owner: self,
            class_name,
            loaded: None,
        };
        let loader = Arc::clone(&*self.file_loader.read());
        match loader.load(class_name, &path) {
            Ok(()) => {
                debug!(class = class_name, path = %path.display(), "class loaded");
                guard.loaded = Some(path.clone());
                Ok(Resolution::Loaded(path))
            }
            Err(err) => {
                warn!(class = class_name, path = %path.display(), error = %err, "class load failed");
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn is_loaded(&self, class_name: &str) -> bool {
        self.state.lock().loaded.contains_key(class_name)
    }

    /// Snapshot of loaded classes and the files that satisfied them.
    pub fn loaded(&self) -> HashMap<String, PathBuf> {
        self.state.lock().loaded.clone()
    }

    pub fn loaded_path(&self, class_name: &str) -> Option<PathBuf> {
        self.state.lock().loaded.get(class_name).cloned()
    }
}

impl ClassResolver for Autoloader {
    fn hook_id(&self) -> HookId {
        self.id
    }

    fn resolve_class(&self, class_name: &str) -> AutoloadResult<Resolution> {
        self.resolve(class_name)
    }
}

impl fmt::Debug for Autoloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Autoloader")
            .field("id", &self.id)
            .field("paths", &state.paths)
            .field("extensions", &state.extensions)
            .field("loaded_count", &state.loaded.len())
            .field("enabled", &self.chain.contains(self.id))
            .finish()
    }
}

/// Configures and builds an [`Autoloader`].
pub struct AutoloaderBuilder {
    chain: Option<Arc<ResolverChain>>,
    probe: Arc<dyn FileProbe>,
    file_loader: Arc<dyn FileLoader>,
    paths: Vec<String>,
    extensions: Vec<String>,
    default_extensions: bool,
}

impl AutoloaderBuilder {
    pub fn new() -> Self {
        Self {
            chain: None,
            probe: Arc::new(OsProbe),
            file_loader: Arc::new(ReadLoader),
            paths: Vec::new(),
            extensions: Vec::new(),
            default_extensions: true,
        }
    }

    pub fn from_config(config: &AutoloadConfig) -> Self {
        Self::new()
            .paths(&config.paths)
            .extensions(&config.extensions)
            .default_extensions(config.default_extensions)
    }

    /// Chain to register on. Defaults to a fresh, private chain.
    pub fn chain(mut self, chain: Arc<ResolverChain>) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn FileProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn file_loader(mut self, loader: Arc<dyn FileLoader>) -> Self {
        self.file_loader = loader;
        self
    }

    pub fn path(mut self, path: impl AsRef<str>) -> Self {
        self.paths.push(path.as_ref().to_string());
        self
    }

    pub fn paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.paths
            .extend(paths.into_iter().map(|p| p.as_ref().to_string()));
        self
    }

    pub fn extension(mut self, extension: impl AsRef<str>) -> Self {
        self.extensions.push(extension.as_ref().to_string());
        self
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions
            .extend(extensions.into_iter().map(|e| e.as_ref().to_string()));
        self
    }

    /// Whether to seed the extension list with the default `.php`.
    pub fn default_extensions(mut self, enabled: bool) -> Self {
        self.default_extensions = enabled;
        self
    }

    pub fn build(self) -> Arc<Autoloader> {
        let mut state = LoaderState::default();
        if self.default_extensions {
            state.extensions.push(DEFAULT_EXTENSION.to_string());
        }
        for path in &self.paths {
            push_unique(&mut state.paths, normalize_path(path));
        }
        for ext in &self.extensions {
            push_unique(&mut state.extensions, normalize_extension(ext));
        }

        Arc::new(Autoloader {
            id: HookId::next(),
            chain: self
                .chain
                .unwrap_or_else(|| Arc::new(ResolverChain::new())),
            probe: self.probe,
            file_loader: RwLock::new(self.file_loader),
            state: Mutex::new(state),
            load_settled: Condvar::new(),
        })
    }
}

impl Default for AutoloaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
