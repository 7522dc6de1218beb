//! Handle resolution and caching.
//!
//! A [`Bridge`] connects the glue to one [`NativeRuntime`]. Every class tag,
//! method bind and singleton the glue needs is resolved through the bridge
//! the first time it is used and served from the bridge's cache afterwards.
//!
//! # Cache Model
//!
//! - **Classes**: keyed by [`BindHash::from_class`]
//! - **Methods**: keyed by [`MethodKey::key`], which folds the class, method
//!   name and compatibility hash into one [`BindHash`]
//! - **Singletons**: keyed by [`BindHash::from_singleton`]
//!
//! Two threads racing on the first resolution of the same handle both ask
//! the runtime; the runtime returns the same handle to both, and the first
//! insert wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use enginebridge_core::{BindHash, ClassTag, MethodBind, NativeRuntime, ObjectId, StringName};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::object::RawObject;
use crate::{BindError, BridgeConfig, EngineClass, MethodKey};

/// Cache hit and miss counts of a [`Bridge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub class_hits: u64,
    pub class_misses: u64,
    pub method_hits: u64,
    pub method_misses: u64,
}

#[derive(Default)]
struct CacheCounters {
    class_hits: AtomicU64,
    class_misses: AtomicU64,
    method_hits: AtomicU64,
    method_misses: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Connection to a native runtime, with its handle caches.
pub struct Bridge {
    runtime: Arc<dyn NativeRuntime>,
    config: BridgeConfig,
    classes: RwLock<FxHashMap<BindHash, ClassTag>>,
    methods: RwLock<FxHashMap<BindHash, MethodBind>>,
    singletons: RwLock<FxHashMap<BindHash, ObjectId>>,
    counters: CacheCounters,
}

impl Bridge {
    /// Create a bridge with the default configuration.
    pub fn new(runtime: Arc<dyn NativeRuntime>) -> Arc<Self> {
        Self::with_config(runtime, BridgeConfig::default())
    }

    pub fn with_config(runtime: Arc<dyn NativeRuntime>, config: BridgeConfig) -> Arc<Self> {
        let capacity = config.cache_capacity;
        Arc::new(Self {
            runtime,
            config,
            classes: RwLock::new(FxHashMap::default()),
            methods: RwLock::new(FxHashMap::with_capacity_and_hasher(capacity, Default::default())),
            singletons: RwLock::new(FxHashMap::default()),
            counters: CacheCounters::default(),
        })
    }

    pub fn runtime(&self) -> &dyn NativeRuntime {
        self.runtime.as_ref()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // ==========================================================================
    // Resolution
    // ==========================================================================

    /// Resolve a class tag, from the cache if possible.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn try_class_tag(&self, class: &str) -> Result<ClassTag, BindError> {
        let key = BindHash::from_class(class);
        if let Some(tag) = self.classes.read().get(&key).copied() {
            bump(&self.counters.class_hits);
            return Ok(tag);
        }

        bump(&self.counters.class_misses);
        let tag = self
            .runtime
            .classdb_get_class_tag(&StringName::new(class))
            .ok_or_else(|| BindError::ClassNotFound(class.to_string()))?;
        log::debug!("resolved class {class} -> {tag:?}");
        Ok(*self.classes.write().entry(key).or_insert(tag))
    }

    /// Resolve a class tag. A missing class means the glue does not match the
    /// running engine, so this logs the failure and panics.
    pub fn class_tag(&self, class: &str) -> ClassTag {
        self.try_class_tag(class).unwrap_or_else(|err| bind_failed(&err))
    }

    /// Resolve a method bind, from the cache if possible.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn try_method_bind(&self, key: &MethodKey) -> Result<MethodBind, BindError> {
        if let Some(bind) = self.methods.read().get(&key.key).copied() {
            bump(&self.counters.method_hits);
            return Ok(bind);
        }

        bump(&self.counters.method_misses);
        let bind = self
            .runtime
            .classdb_get_method_bind(&StringName::new(key.class), &StringName::new(key.method), key.hash)
            .ok_or(BindError::MethodNotFound {
                class: key.class,
                method: key.method,
                hash: key.hash,
            })?;
        log::debug!("resolved {}::{} (hash {:#010x}) -> {bind:?}", key.class, key.method, key.hash);
        Ok(*self.methods.write().entry(key.key).or_insert(bind))
    }

    /// Resolve a method bind. Like [`class_tag`](Self::class_tag), failure
    /// is logged and panics.
    pub fn method_bind(&self, key: &MethodKey) -> MethodBind {
        self.try_method_bind(key).unwrap_or_else(|err| bind_failed(&err))
    }

    /// Resolve a singleton's instance id.
    pub fn try_singleton_id(&self, name: &str) -> Result<ObjectId, BindError> {
        let key = BindHash::from_singleton(name);
        if let Some(id) = self.singletons.read().get(&key).copied() {
            return Ok(id);
        }
        let id = self
            .runtime
            .global_get_singleton(&StringName::new(name))
            .ok_or_else(|| BindError::SingletonNotFound(name.to_string()))?;
        log::debug!("resolved singleton {name} -> {id}");
        Ok(*self.singletons.write().entry(key).or_insert(id))
    }

    /// Resolve the class tag and every method bind of `T` up front.
    ///
    /// Returns the number of methods resolved, or the first failure.
    pub fn preload<T: EngineClass>(&self) -> Result<usize, BindError> {
        self.try_class_tag(T::CLASS_NAME)?;
        for key in T::METHOD_KEYS {
            self.try_method_bind(key)?;
        }
        Ok(T::METHOD_KEYS.len())
    }

    /// Number of cached method binds.
    pub fn cached_methods(&self) -> usize {
        self.methods.read().len()
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            class_hits: self.counters.class_hits.load(Ordering::Relaxed),
            class_misses: self.counters.class_misses.load(Ordering::Relaxed),
            method_hits: self.counters.method_hits.load(Ordering::Relaxed),
            method_misses: self.counters.method_misses.load(Ordering::Relaxed),
        }
    }

    // ==========================================================================
    // Objects
    // ==========================================================================

    /// Construct a new engine object of class `T`.
    ///
    /// Reference-counted objects start with the one reference held by the
    /// returned wrapper.
    pub fn try_construct<T: EngineClass>(self: &Arc<Self>) -> Result<T, BindError> {
        let tag = self.try_class_tag(T::CLASS_NAME)?;
        let id = self.runtime.classdb_construct_object(tag)?;
        let raw = RawObject::adopt(self.clone(), id, T::IS_REFCOUNTED)?;
        log::trace!("constructed {} ({id})", T::CLASS_NAME);
        Ok(T::from_raw(raw))
    }

    /// Construct a new engine object, panicking if the class is unavailable.
    pub fn construct<T: EngineClass>(self: &Arc<Self>) -> T {
        self.try_construct().unwrap_or_else(|err| bind_failed(&err))
    }

    /// The engine singleton of class `T`.
    pub fn try_singleton<T: EngineClass>(self: &Arc<Self>) -> Result<T, BindError> {
        let id = self.try_singleton_id(T::CLASS_NAME)?;
        Ok(T::from_raw(RawObject::new(self.clone(), id, T::IS_REFCOUNTED)))
    }

    pub fn singleton<T: EngineClass>(self: &Arc<Self>) -> T {
        self.try_singleton().unwrap_or_else(|err| bind_failed(&err))
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("classes", &self.classes.read().len())
            .field("methods", &self.methods.read().len())
            .finish_non_exhaustive()
    }
}

fn bind_failed(err: &BindError) -> ! {
    log::error!("engine binding failed: {err}");
    panic!("engine binding failed: {err}");
}

// ============================================================================
// Process-wide bridge
// ============================================================================

static GLOBAL: OnceLock<Arc<Bridge>> = OnceLock::new();

/// Install the process-wide bridge. Fails if one is already installed.
pub fn initialize(runtime: Arc<dyn NativeRuntime>, config: BridgeConfig) -> Result<Arc<Bridge>, BindError> {
    let bridge = Bridge::with_config(runtime, config);
    GLOBAL
        .set(bridge.clone())
        .map_err(|_| BindError::AlreadyInitialized)?;
    log::debug!("global bridge initialized");
    Ok(bridge)
}

/// The process-wide bridge, if [`initialize`] has run.
pub fn global() -> Option<Arc<Bridge>> {
    GLOBAL.get().cloned()
}
