//! ClassDb - an in-process native class database.
//!
//! This module provides [`ClassDb`], a self-contained implementation of
//! [`NativeRuntime`]. It stores registered native classes and their method
//! binds, owns every live object, and routes script callbacks through the
//! instance bindings attached to those objects.
//!
//! # Storage Model
//!
//! - **Classes**: stored by name, with a reverse index from [`ClassTag`].
//!   Each class keeps its own methods, properties and signals; lookups walk
//!   the parent chain.
//! - **Method binds**: one shared list. A [`MethodBind`] is the bind's
//!   position in that list plus one, so it is never zero.
//! - **Objects**: a generational [`ObjectHeap`] keyed by [`ObjectId`].
//!
//! # Thread Safety
//!
//! All state sits behind `parking_lot` locks. No lock is held while a native
//! implementation or a script binding runs, so natives may call back into the
//! database freely.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use enginebridge_core::native::{self, ArgPtr, NativeBox, RetPtr};
use enginebridge_core::{
    BindHash, CallError, Callable, ClassTag, ConnectFlags, EngineError, InstanceBinding, MethodBind, NativeRuntime,
    ObjectId, StringName, Variant,
};
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::call_context::{CallArgs, CallRet};
use crate::info::DataFactory;
use crate::object_heap::{Connection, ObjectData, ObjectHeap, ObjectRecord};
use crate::{CallContext, ClassInfo, MethodInfo, NativeFn, PropertyInfo, RegistrationError};

// ============================================================================
// Records
// ============================================================================

/// How a logged call arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallConvention {
    /// Typed native arguments.
    Ptr,
    /// Variant arguments.
    Var,
}

/// One native method invocation, as seen by the database.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    /// Class that registered the method.
    pub class: StringName,
    pub method: StringName,
    pub instance: Option<ObjectId>,
    /// Arguments converted to variants, defaults not included.
    pub args: Vec<Variant>,
    pub convention: CallConvention,
}

/// Snapshot of the database's lookup and call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassDbStats {
    /// Class handle resolutions through [`NativeRuntime`].
    pub class_lookups: u64,
    /// Method handle resolutions through [`NativeRuntime`].
    pub method_lookups: u64,
    pub ptrcalls: u64,
    pub varcalls: u64,
}

#[derive(Default)]
struct Counters {
    class_lookups: AtomicU64,
    method_lookups: AtomicU64,
    ptrcalls: AtomicU64,
    varcalls: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ClassDbStats {
        ClassDbStats {
            class_lookups: self.class_lookups.load(Ordering::Relaxed),
            method_lookups: self.method_lookups.load(Ordering::Relaxed),
            ptrcalls: self.ptrcalls.load(Ordering::Relaxed),
            varcalls: self.varcalls.load(Ordering::Relaxed),
        }
    }
}

/// Work queued for [`ClassDb::flush_deferred`].
#[derive(Debug)]
enum Deferred {
    Call { callable: Callable, args: Vec<Variant> },
    Free(ObjectId),
}

// ============================================================================
// Class Table
// ============================================================================

pub(crate) struct MethodEntry {
    pub class: StringName,
    pub info: MethodInfo,
    pub func: NativeFn,
}

struct ClassEntry {
    name: StringName,
    parent: Option<StringName>,
    tag: ClassTag,
    refcounted: bool,
    instantiable: bool,
    data: Option<DataFactory>,
    /// Local binds by method name, with their compatibility hashes.
    methods: FxHashMap<StringName, Vec<(u32, MethodBind)>>,
    properties: FxHashMap<StringName, PropertyInfo>,
    signals: FxHashSet<StringName>,
}

#[derive(Default)]
struct ClassTable {
    by_name: FxHashMap<StringName, ClassEntry>,
    by_tag: FxHashMap<ClassTag, StringName>,
}

impl ClassTable {
    /// The class and its ancestors, leaf first.
    fn chain<'a>(&'a self, class: &StringName) -> impl Iterator<Item = &'a ClassEntry> + 'a {
        std::iter::successors(self.by_name.get(class), move |entry| {
            entry.parent.as_ref().and_then(|parent| self.by_name.get(parent))
        })
    }

    fn inherits(&self, class: &StringName, ancestor: &StringName) -> bool {
        self.chain(class).any(|entry| &entry.name == ancestor)
    }

    fn find_method(&self, class: &StringName, method: &StringName, hash: Option<u32>) -> Option<MethodBind> {
        self.chain(class).find_map(|entry| {
            let binds = entry.methods.get(method)?;
            match hash {
                Some(hash) => binds.iter().find(|(h, _)| *h == hash).map(|(_, bind)| *bind),
                None => binds.first().map(|(_, bind)| *bind),
            }
        })
    }

    fn property(&self, class: &StringName, name: &StringName) -> Option<PropertyInfo> {
        self.chain(class).find_map(|entry| entry.properties.get(name).cloned())
    }

    fn has_signal(&self, class: &StringName, signal: &StringName) -> bool {
        self.chain(class).any(|entry| entry.signals.contains(signal))
    }
}

// ============================================================================
// ClassDb
// ============================================================================

/// In-process native class database.
///
/// ```ignore
/// let db = ClassDb::with_core_classes()?;
/// db.register_class(ClassInfo::new("Sprite").inherits("Node"))?;
/// let sprite = db.instantiate("Sprite").unwrap();
/// assert!(db.inherits("Sprite", "Object"));
/// ```
pub struct ClassDb {
    classes: RwLock<ClassTable>,
    binds: RwLock<Vec<Arc<MethodEntry>>>,
    objects: RwLock<ObjectHeap>,
    singletons: RwLock<FxHashMap<StringName, ObjectId>>,
    deferred: Mutex<VecDeque<Deferred>>,
    calls: Mutex<Vec<CallRecord>>,
    record_calls: AtomicBool,
    counters: Counters,
}

impl ClassDb {
    /// Create an empty database.
    ///
    /// The call log starts enabled and keeps every native call until it is
    /// drained with [`take_calls`](Self::take_calls) or
    /// [`clear_calls`](Self::clear_calls). Long-running hosts should turn it
    /// off with [`set_record_calls`](Self::set_record_calls).
    pub fn new() -> Self {
        Self {
            classes: RwLock::new(ClassTable::default()),
            binds: RwLock::new(Vec::new()),
            objects: RwLock::new(ObjectHeap::new()),
            singletons: RwLock::new(FxHashMap::default()),
            deferred: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            record_calls: AtomicBool::new(true),
            counters: Counters::default(),
        }
    }

    /// Create a database with `Object`, `RefCounted`, `Resource` and `Node`
    /// registered.
    pub fn with_core_classes() -> Result<Self, RegistrationError> {
        let db = Self::new();
        crate::core_classes::register_core_classes(&db)?;
        Ok(db)
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a class. Its parent must already be registered.
    pub fn register_class(&self, info: ClassInfo) -> Result<ClassTag, RegistrationError> {
        let mut classes = self.classes.write();
        if classes.by_name.contains_key(&info.name) {
            return Err(RegistrationError::DuplicateClass(info.name.to_string()));
        }

        let mut refcounted = info.refcounted;
        if let Some(parent) = &info.parent {
            let parent = classes
                .by_name
                .get(parent)
                .ok_or_else(|| RegistrationError::UnknownClass(parent.to_string()))?;
            refcounted |= parent.refcounted;
        }

        let tag = ClassTag::from_raw(BindHash::from_class(info.name.as_str()).as_u64());
        log::debug!("registered class {} (parent: {:?}, tag: {tag:?})", info.name, info.parent);

        classes.by_tag.insert(tag, info.name.clone());
        classes.by_name.insert(
            info.name.clone(),
            ClassEntry {
                name: info.name,
                parent: info.parent,
                tag,
                refcounted,
                instantiable: info.instantiable,
                data: info.data,
                methods: FxHashMap::default(),
                properties: FxHashMap::default(),
                signals: FxHashSet::default(),
            },
        );
        Ok(tag)
    }

    /// Register a native method on `class`.
    ///
    /// Methods with the same name but different signatures coexist; each is
    /// found by its own compatibility hash.
    pub fn register_method<F>(&self, class: &str, info: MethodInfo, f: F) -> Result<MethodBind, RegistrationError>
    where
        F: Fn(&mut CallContext<'_>) -> Result<(), CallError> + Send + Sync + 'static,
    {
        if info.defaults.len() > info.args.len() {
            return Err(RegistrationError::TooManyDefaults {
                method: info.name.to_string(),
                defaults: info.defaults.len(),
                params: info.args.len(),
            });
        }

        let class = StringName::new(class);
        let hash = info.compat_hash();

        let mut classes = self.classes.write();
        let entry = classes
            .by_name
            .get_mut(&class)
            .ok_or_else(|| RegistrationError::UnknownClass(class.to_string()))?;

        let overloads = entry.methods.entry(info.name.clone()).or_default();
        if overloads.iter().any(|(h, _)| *h == hash) {
            return Err(RegistrationError::DuplicateMethod {
                class: class.to_string(),
                method: info.name.to_string(),
                hash,
            });
        }

        let mut binds = self.binds.write();
        let bind = MethodBind::from_raw(binds.len() as u64 + 1);
        overloads.push((hash, bind));
        log::debug!("registered method {class}::{} (hash {hash:#010x})", info.name);
        binds.push(Arc::new(MethodEntry {
            class,
            info,
            func: NativeFn::new(f),
        }));
        Ok(bind)
    }

    /// Register a property whose setter and getter are existing methods.
    pub fn register_property(&self, class: &str, info: PropertyInfo) -> Result<(), RegistrationError> {
        let class = StringName::new(class);
        let mut classes = self.classes.write();
        let entry = classes
            .by_name
            .get_mut(&class)
            .ok_or_else(|| RegistrationError::UnknownClass(class.to_string()))?;
        entry.properties.insert(info.name.clone(), info);
        Ok(())
    }

    /// Register a property together with setter and getter methods that keep
    /// the value in per-object storage.
    ///
    /// Missing accessor names default to `set_<name>` and `get_<name>`.
    pub fn register_property_accessors(&self, class: &str, info: PropertyInfo) -> Result<(), RegistrationError> {
        let setter = info
            .setter
            .clone()
            .unwrap_or_else(|| StringName::new(&format!("set_{}", info.name)));
        let getter = info
            .getter
            .clone()
            .unwrap_or_else(|| StringName::new(&format!("get_{}", info.name)));
        let ty = info.ty;

        let name = info.name.clone();
        self.register_method(
            class,
            MethodInfo::new(setter.as_str()).arg("value", ty),
            move |ctx| {
                let value = ctx.arg_variant(0)?;
                ctx.db().store_property(ctx.instance()?, &name, value);
                Ok(())
            },
        )?;

        let name = info.name.clone();
        self.register_method(class, MethodInfo::new(getter.as_str()).returns(ty), move |ctx| {
            let stored = ctx.db().load_property(ctx.instance()?, &name);
            let value = stored.unwrap_or_else(|| {
                let empty = native::box_default(ty);
                native::variant_from_native(ty, empty.as_ref()).unwrap_or_default()
            });
            ctx.set_return_variant(value)
        })?;

        self.register_property(
            class,
            PropertyInfo {
                setter: Some(setter),
                getter: Some(getter),
                ..info
            },
        )
    }

    pub fn register_signal(&self, class: &str, signal: &str) -> Result<(), RegistrationError> {
        let class = StringName::new(class);
        let mut classes = self.classes.write();
        let entry = classes
            .by_name
            .get_mut(&class)
            .ok_or_else(|| RegistrationError::UnknownClass(class.to_string()))?;
        entry.signals.insert(StringName::new(signal));
        Ok(())
    }

    /// Create the singleton instance of `class`, published under the class name.
    pub fn register_singleton(&self, class: &str) -> Result<ObjectId, RegistrationError> {
        let name = StringName::new(class);
        if self.singletons.read().contains_key(&name) {
            return Err(RegistrationError::DuplicateSingleton(class.to_string()));
        }
        let id = self
            .instantiate(class)
            .ok_or_else(|| RegistrationError::UnknownClass(class.to_string()))?;
        self.singletons.write().insert(name, id);
        log::debug!("registered singleton {class} ({id})");
        Ok(id)
    }

    // ==========================================================================
    // Class Queries
    // ==========================================================================

    pub fn class_exists(&self, class: &str) -> bool {
        self.classes.read().by_name.contains_key(class)
    }

    pub fn parent_class(&self, class: &str) -> Option<StringName> {
        self.classes.read().by_name.get(class).and_then(|entry| entry.parent.clone())
    }

    /// Whether `class` is `ancestor` or derives from it.
    pub fn inherits(&self, class: &str, ancestor: &str) -> bool {
        self.classes
            .read()
            .inherits(&StringName::new(class), &StringName::new(ancestor))
    }

    /// Whether `class` declares `signal` itself or through an ancestor.
    pub fn class_has_signal(&self, class: &str, signal: &str) -> bool {
        self.classes
            .read()
            .has_signal(&StringName::new(class), &StringName::new(signal))
    }

    /// First bind named `method` on `class` or an ancestor, whatever its signature.
    pub fn find_method_by_name(&self, class: &StringName, method: &StringName) -> Option<MethodBind> {
        self.classes.read().find_method(class, method, None)
    }

    /// Signature of a registered bind.
    pub fn method_info(&self, bind: MethodBind) -> Option<MethodInfo> {
        self.method_entry(bind).map(|entry| entry.info.clone())
    }

    fn method_entry(&self, bind: MethodBind) -> Option<Arc<MethodEntry>> {
        let index = usize::try_from(bind.raw()).ok()?.checked_sub(1)?;
        self.binds.read().get(index).cloned()
    }

    // ==========================================================================
    // Objects
    // ==========================================================================

    /// Create an instance of `class`, ignoring whether it is instantiable.
    pub fn instantiate(&self, class: &str) -> Option<ObjectId> {
        let class = StringName::new(class);
        let (refcounted, factories) = {
            let classes = self.classes.read();
            let leaf = classes.by_name.get(&class)?;
            let factories: Vec<DataFactory> = classes.chain(&class).filter_map(|entry| entry.data.clone()).collect();
            (leaf.refcounted, factories)
        };

        let data: Vec<ObjectData> = factories
            .iter()
            .map(|factory| Arc::new(Mutex::new(factory())))
            .collect();
        let mut record = ObjectRecord::new(class.clone(), refcounted, data);
        record.node.name = class.clone();

        let id = self.objects.write().allocate(record);
        log::trace!("instantiated {class} ({id})");
        Some(id)
    }

    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.objects.read().is_alive(id)
    }

    /// Class of a live object.
    pub fn class_of(&self, id: ObjectId) -> Option<StringName> {
        self.objects.read().get(id).map(|record| record.class.clone())
    }

    /// Whether a live object's class is or derives from `ancestor`.
    pub fn is_instance_of(&self, id: ObjectId, ancestor: &str) -> bool {
        self.class_of(id)
            .is_some_and(|class| self.inherits(class.as_str(), ancestor))
    }

    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }

    pub fn singleton(&self, name: &str) -> Option<ObjectId> {
        self.singletons.read().get(name).copied()
    }

    pub(crate) fn object_data(&self, id: ObjectId) -> Option<Vec<ObjectData>> {
        self.objects.read().get(id).map(|record| record.data.clone())
    }

    /// Destroy an object. Nodes take their children with them.
    pub fn destroy(&self, id: ObjectId) {
        let (parent, children) = match self.objects.read().get(id) {
            Some(record) => (record.node.parent, record.node.children.clone()),
            None => return,
        };

        for child in children {
            self.destroy(child);
        }
        if let Some(parent) = parent {
            self.unlink_child(parent, id);
        }

        let record = self.objects.write().free(id);
        self.singletons.write().retain(|_, singleton| *singleton != id);
        if let Some(record) = record {
            log::trace!("destroyed {} ({id})", record.class);
        }
    }

    // ==========================================================================
    // Reference Counting
    // ==========================================================================

    /// Take a reference. Returns the new count, or `None` if the object is
    /// dead or not reference counted.
    pub fn reference(&self, id: ObjectId) -> Option<u32> {
        let mut objects = self.objects.write();
        if !objects.get(id)?.refcounted {
            return None;
        }
        objects.add_ref(id)
    }

    /// Release a reference. Returns the new count; the object is left alive
    /// for the owner to destroy once the count reaches zero.
    pub fn unreference(&self, id: ObjectId) -> Option<u32> {
        let mut objects = self.objects.write();
        if !objects.get(id)?.refcounted {
            return None;
        }
        objects.release(id)
    }

    pub fn reference_count(&self, id: ObjectId) -> Option<u32> {
        self.objects.read().ref_count(id)
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    fn check_receiver(&self, entry: &MethodEntry, instance: Option<ObjectId>) -> Result<(), CallError> {
        if entry.info.is_static() {
            return Ok(());
        }
        let id = instance.ok_or(CallError::InstanceIsNull)?;
        let class = self.class_of(id).ok_or(CallError::InstanceIsNull)?;
        if self.classes.read().inherits(&class, &entry.class) {
            Ok(())
        } else {
            log::error!("{}::{} called on instance {id} of class {class}", entry.class, entry.info.name);
            Err(CallError::InvalidMethod)
        }
    }

    fn record(&self, entry: &MethodEntry, instance: Option<ObjectId>, args: Vec<Variant>, convention: CallConvention) {
        if !self.record_calls.load(Ordering::Relaxed) {
            return;
        }
        self.calls.lock().push(CallRecord {
            class: entry.class.clone(),
            method: entry.info.name.clone(),
            instance,
            args,
            convention,
        });
    }

    /// Call a bind with typed native arguments.
    pub fn ptrcall(
        &self,
        bind: MethodBind,
        instance: Option<ObjectId>,
        args: &[ArgPtr<'_>],
        ret: RetPtr<'_>,
    ) -> Result<(), CallError> {
        Counters::bump(&self.counters.ptrcalls);
        let entry = self.method_entry(bind).ok_or(CallError::InvalidMethod)?;
        self.check_receiver(&entry, instance)?;

        let info = &entry.info;
        if info.is_vararg() {
            log::error!("{}::{} is vararg and cannot be pointer-called", entry.class, info.name);
            return Err(CallError::InvalidMethod);
        }
        CallError::check_arg_count(args.len(), info.args.len(), info.args.len())?;

        if self.record_calls.load(Ordering::Relaxed) {
            let logged = info
                .args
                .iter()
                .zip(args)
                .map(|(param, arg)| native::variant_from_native(param.ty, *arg).unwrap_or_default())
                .collect();
            self.record(&entry, instance, logged, CallConvention::Ptr);
        }

        let mut ctx = CallContext::new(self, info, instance, CallArgs::Ptr(args), CallRet::Ptr(ret));
        entry.func.call(&mut ctx)
    }

    /// Call a bind with variant arguments, filling in defaults.
    pub fn varcall(&self, bind: MethodBind, instance: Option<ObjectId>, args: &[&Variant]) -> Result<Variant, CallError> {
        Counters::bump(&self.counters.varcalls);
        let entry = self.method_entry(bind).ok_or(CallError::InvalidMethod)?;
        self.check_receiver(&entry, instance)?;
        if self.record_calls.load(Ordering::Relaxed) {
            let logged = args.iter().map(|arg| (*arg).clone()).collect();
            self.record(&entry, instance, logged, CallConvention::Var);
        }

        let info = &entry.info;
        if info.is_vararg() {
            CallError::check_arg_count(args.len(), info.args.len(), usize::MAX)?;
            let mut ret = Variant::Nil;
            {
                let mut ctx = CallContext::new(self, info, instance, CallArgs::Var(args), CallRet::Var(&mut ret));
                entry.func.call(&mut ctx)?;
            }
            return Ok(ret);
        }

        CallError::check_arg_count(args.len(), info.required_args(), info.args.len())?;
        let mut boxed: Vec<NativeBox> = Vec::with_capacity(info.args.len());
        for (index, param) in info.args.iter().enumerate() {
            let value = match args.get(index) {
                Some(value) => *value,
                None => info.default_for(index).ok_or(CallError::TooFewArguments {
                    expected: info.required_args(),
                    got: args.len(),
                })?,
            };
            let native = native::box_from_variant(param.ty, value)
                .map_err(|source| CallError::InvalidArgument { index, source })?;
            boxed.push(native);
        }
        let ptrs: Vec<ArgPtr<'_>> = boxed.iter().map(|native| &**native as ArgPtr<'_>).collect();

        let mut ret: NativeBox = match info.ret {
            Some(ty) => native::box_default(ty),
            None => Box::new(()),
        };
        {
            let mut ctx = CallContext::new(self, info, instance, CallArgs::Ptr(&ptrs), CallRet::Ptr(ret.as_mut()));
            entry.func.call(&mut ctx)?;
        }

        Ok(match info.ret {
            Some(ty) => native::variant_from_native(ty, ret.as_ref()).unwrap_or_default(),
            None => Variant::Nil,
        })
    }

    /// Whether `method` can be called on the object, natively or by its script.
    pub fn has_method(&self, id: ObjectId, method: &StringName) -> bool {
        if self.binding(id).is_some_and(|binding| binding.has_method(method)) {
            return true;
        }
        self.class_of(id)
            .is_some_and(|class| self.find_method_by_name(&class, method).is_some())
    }

    /// Call a method by name. The script instance gets the first chance to
    /// handle it, then the native class.
    pub fn call_method(&self, id: ObjectId, method: &StringName, args: &[Variant]) -> Result<Variant, CallError> {
        if let Some(binding) = self.binding(id)
            && binding.has_method(method)
        {
            return binding.call(method, args);
        }

        let class = self.class_of(id).ok_or(CallError::InstanceIsNull)?;
        let bind = self.find_method_by_name(&class, method).ok_or(CallError::InvalidMethod)?;
        let refs: Vec<&Variant> = args.iter().collect();
        self.varcall(bind, Some(id), &refs)
    }

    /// Run a script override of a native callback. `Ok(None)` when the object
    /// has no script or the script does not define `method`.
    pub fn call_virtual(&self, id: ObjectId, method: &str, args: &[Variant]) -> Result<Option<Variant>, CallError> {
        let Some(binding) = self.binding(id) else {
            return Ok(None);
        };
        let method = StringName::new(method);
        if !binding.has_method(&method) {
            return Ok(None);
        }
        binding.call(&method, args).map(Some)
    }

    /// Script instance attached to the object.
    pub fn binding(&self, id: ObjectId) -> Option<Arc<dyn InstanceBinding>> {
        self.objects.read().get(id).and_then(|record| record.binding.clone())
    }

    /// Native calls seen so far.
    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().clone()
    }

    /// Drain the call log.
    pub fn take_calls(&self) -> Vec<CallRecord> {
        std::mem::take(&mut *self.calls.lock())
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Turn the call log on or off. On by default; while on, the log grows
    /// with every call.
    pub fn set_record_calls(&self, enabled: bool) {
        self.record_calls.store(enabled, Ordering::Relaxed);
    }

    pub fn stats(&self) -> ClassDbStats {
        self.counters.snapshot()
    }

    // ==========================================================================
    // Properties
    // ==========================================================================

    pub(crate) fn store_property(&self, id: ObjectId, name: &StringName, value: Variant) {
        if let Some(record) = self.objects.write().get_mut(id) {
            record.properties.insert(name.clone(), value);
        }
    }

    pub(crate) fn load_property(&self, id: ObjectId, name: &StringName) -> Option<Variant> {
        self.objects.read().get(id).and_then(|record| record.properties.get(name).cloned())
    }

    /// Set a property through its setter, the script's `_set`, or dynamic storage.
    pub fn set_property(&self, id: ObjectId, name: &StringName, value: Variant) -> Result<(), CallError> {
        let class = self.class_of(id).ok_or(CallError::InstanceIsNull)?;
        let property = self.classes.read().property(&class, name);
        if let Some(setter) = property.and_then(|p| p.setter) {
            return self.call_method(id, &setter, &[value]).map(|_| ());
        }

        let handled = self.call_virtual(id, "_set", &[Variant::StringName(name.clone()), value.clone()])?;
        if handled.is_some_and(|v| v.booleanize()) {
            return Ok(());
        }
        self.store_property(id, name, value);
        Ok(())
    }

    /// Read a property through its getter, the script's `_get`, or dynamic storage.
    pub fn get_property(&self, id: ObjectId, name: &StringName) -> Result<Option<Variant>, CallError> {
        let class = self.class_of(id).ok_or(CallError::InstanceIsNull)?;
        let property = self.classes.read().property(&class, name);
        if let Some(getter) = property.and_then(|p| p.getter) {
            return self.call_method(id, &getter, &[]).map(Some);
        }

        match self.call_virtual(id, "_get", &[Variant::StringName(name.clone())])? {
            Some(value) if !value.is_nil() => Ok(Some(value)),
            _ => Ok(self.load_property(id, name)),
        }
    }

    // ==========================================================================
    // Signals
    // ==========================================================================

    /// Whether the object's class or script declares `signal`.
    pub fn has_signal(&self, id: ObjectId, signal: &StringName) -> bool {
        let Some(class) = self.class_of(id) else {
            return false;
        };
        self.classes.read().has_signal(&class, signal)
            || self.binding(id).is_some_and(|binding| binding.has_signal(signal))
    }

    pub fn connect(
        &self,
        id: ObjectId,
        signal: &StringName,
        callable: Callable,
        flags: ConnectFlags,
    ) -> Result<(), EngineError> {
        if !self.has_signal(id, signal) {
            log::error!("connect: instance {id} has no signal {signal}");
            return Err(EngineError::InvalidParameter);
        }
        if !callable.is_valid() {
            return Err(EngineError::InvalidParameter);
        }

        let mut objects = self.objects.write();
        let record = objects.get_mut(id).ok_or(EngineError::InvalidParameter)?;
        if record
            .connections
            .iter()
            .any(|c| &c.signal == signal && c.callable == callable)
        {
            return Err(EngineError::AlreadyExists);
        }
        record.connections.push(Connection {
            signal: signal.clone(),
            callable,
            flags,
        });
        Ok(())
    }

    pub fn disconnect(&self, id: ObjectId, signal: &StringName, callable: &Callable) -> Result<(), EngineError> {
        let mut objects = self.objects.write();
        let record = objects.get_mut(id).ok_or(EngineError::InvalidParameter)?;
        let before = record.connections.len();
        record
            .connections
            .retain(|c| !(&c.signal == signal && &c.callable == callable));
        if record.connections.len() == before {
            return Err(EngineError::DoesNotExist);
        }
        Ok(())
    }

    pub fn is_connected(&self, id: ObjectId, signal: &StringName, callable: &Callable) -> bool {
        self.objects.read().get(id).is_some_and(|record| {
            record
                .connections
                .iter()
                .any(|c| &c.signal == signal && &c.callable == callable)
        })
    }

    /// Emit a signal. Immediate connections run before this returns; deferred
    /// ones wait for [`flush_deferred`](Self::flush_deferred).
    pub fn emit_signal(&self, id: ObjectId, signal: &StringName, args: &[Variant]) -> Result<(), EngineError> {
        if !self.is_alive(id) {
            return Err(EngineError::InvalidParameter);
        }
        if !self.has_signal(id, signal) {
            log::error!("emit_signal: instance {id} has no signal {signal}");
            return Err(EngineError::Unavailable);
        }

        let connections: Vec<Connection> = {
            let mut objects = self.objects.write();
            let Some(record) = objects.get_mut(id) else {
                return Err(EngineError::InvalidParameter);
            };
            let fired: Vec<Connection> = record
                .connections
                .iter()
                .filter(|c| &c.signal == signal)
                .cloned()
                .collect();
            record
                .connections
                .retain(|c| !(&c.signal == signal && c.flags.contains(ConnectFlags::ONE_SHOT)));
            fired
        };

        for connection in connections {
            if connection.flags.contains(ConnectFlags::DEFERRED) {
                self.deferred.lock().push_back(Deferred::Call {
                    callable: connection.callable,
                    args: args.to_vec(),
                });
            } else {
                self.invoke_callable(&connection.callable, args);
            }
        }
        Ok(())
    }

    fn invoke_callable(&self, callable: &Callable, args: &[Variant]) {
        let Some(target) = callable.target() else {
            return;
        };
        if !self.is_alive(target) {
            log::warn!("signal target {target} is gone");
            return;
        }
        if let Err(err) = self.call_method(target, callable.method(), args) {
            log::error!("signal callback {}::{} failed: {err}", target, callable.method());
        }
    }

    /// Free the object at the next [`flush_deferred`](Self::flush_deferred).
    pub fn queue_free(&self, id: ObjectId) {
        self.deferred.lock().push_back(Deferred::Free(id));
    }

    /// Run deferred signal calls and frees, including any queued while
    /// flushing. Returns how many items ran.
    pub fn flush_deferred(&self) -> usize {
        let mut ran = 0;
        loop {
            let Some(item) = self.deferred.lock().pop_front() else {
                break;
            };
            match item {
                Deferred::Call { callable, args } => self.invoke_callable(&callable, &args),
                Deferred::Free(id) => self.destroy(id),
            }
            ran += 1;
        }
        ran
    }

    // ==========================================================================
    // Node Tree
    // ==========================================================================

    /// Attach `child` under `parent`. Both must be nodes, the child must not
    /// already have a parent, and it must not be an ancestor of `parent`.
    pub fn add_child(&self, parent: ObjectId, child: ObjectId) -> Result<(), EngineError> {
        if parent == child || !self.is_instance_of(parent, "Node") || !self.is_instance_of(child, "Node") {
            return Err(EngineError::InvalidParameter);
        }
        {
            let mut objects = self.objects.write();
            let current = objects.get(child).and_then(|record| record.node.parent);
            if let Some(current) = current {
                log::error!("add_child: node {child} already has parent {current}");
                return Err(EngineError::AlreadyExists);
            }
            let mut ancestor = Some(parent);
            while let Some(id) = ancestor {
                if id == child {
                    log::error!("add_child: node {child} is an ancestor of {parent}");
                    return Err(EngineError::InvalidParameter);
                }
                ancestor = objects.get(id).and_then(|record| record.node.parent);
            }
            if let Some(record) = objects.get_mut(child) {
                record.node.parent = Some(parent);
            }
            if let Some(record) = objects.get_mut(parent) {
                record.node.children.push(child);
            }
        }

        self.log_virtual(child, "_enter_tree", &[]);
        self.emit_quiet(child, "tree_entered", &[]);
        self.emit_quiet(parent, "child_entered_tree", &[Variant::Object(Some(child))]);
        Ok(())
    }

    pub fn remove_child(&self, parent: ObjectId, child: ObjectId) -> Result<(), EngineError> {
        if self.get_parent(child) != Some(parent) {
            return Err(EngineError::InvalidParameter);
        }
        self.log_virtual(child, "_exit_tree", &[]);
        self.emit_quiet(child, "tree_exiting", &[]);
        self.unlink_child(parent, child);
        self.emit_quiet(child, "tree_exited", &[]);
        Ok(())
    }

    fn unlink_child(&self, parent: ObjectId, child: ObjectId) {
        let mut objects = self.objects.write();
        if let Some(record) = objects.get_mut(parent) {
            record.node.children.retain(|c| *c != child);
        }
        if let Some(record) = objects.get_mut(child) {
            record.node.parent = None;
        }
    }

    pub fn get_parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.objects.read().get(id).and_then(|record| record.node.parent)
    }

    pub fn children(&self, id: ObjectId) -> Vec<ObjectId> {
        self.objects
            .read()
            .get(id)
            .map(|record| record.node.children.clone())
            .unwrap_or_default()
    }

    /// Child at `index`; negative indices count from the end.
    pub fn get_child(&self, id: ObjectId, index: i64) -> Option<ObjectId> {
        let children = self.children(id);
        let index = if index < 0 {
            children.len().checked_sub(usize::try_from(index.unsigned_abs()).ok()?)?
        } else {
            usize::try_from(index).ok()?
        };
        children.get(index).copied()
    }

    pub fn node_name(&self, id: ObjectId) -> Option<StringName> {
        self.objects.read().get(id).map(|record| record.node.name.clone())
    }

    pub fn set_node_name(&self, id: ObjectId, name: StringName) {
        if let Some(record) = self.objects.write().get_mut(id) {
            record.node.name = name;
        }
    }

    /// Deliver `_ready` to a subtree, children before their parent, then
    /// emit `ready` on each node.
    pub fn notify_ready(&self, id: ObjectId) {
        for child in self.children(id) {
            self.notify_ready(child);
        }
        self.log_virtual(id, "_ready", &[]);
        self.emit_quiet(id, "ready", &[]);
    }

    /// Deliver `_process(delta)` to a subtree, parents first.
    pub fn notify_process(&self, id: ObjectId, delta: f64) {
        self.log_virtual(id, "_process", &[Variant::Float(delta)]);
        for child in self.children(id) {
            self.notify_process(child, delta);
        }
    }

    fn log_virtual(&self, id: ObjectId, method: &str, args: &[Variant]) {
        if let Err(err) = self.call_virtual(id, method, args) {
            log::error!("{method} on instance {id} failed: {err}");
        }
    }

    fn emit_quiet(&self, id: ObjectId, signal: &str, args: &[Variant]) {
        let signal = StringName::new(signal);
        if self.has_signal(id, &signal) {
            // Only fails for dead objects, which have no listeners left.
            let _ = self.emit_signal(id, &signal, args);
        }
    }
}

impl Default for ClassDb {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClassDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassDb")
            .field("classes", &self.classes.read().by_name.len())
            .field("binds", &self.binds.read().len())
            .field("objects", &*self.objects.read())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// NativeRuntime
// ============================================================================

impl NativeRuntime for ClassDb {
    fn classdb_get_class_tag(&self, class: &StringName) -> Option<ClassTag> {
        Counters::bump(&self.counters.class_lookups);
        self.classes.read().by_name.get(class).map(|entry| entry.tag)
    }

    fn classdb_get_method_bind(&self, class: &StringName, method: &StringName, hash: u32) -> Option<MethodBind> {
        Counters::bump(&self.counters.method_lookups);
        let bind = self.classes.read().find_method(class, method, Some(hash));
        if bind.is_none() {
            log::debug!("no bind for {class}::{method} with hash {hash:#010x}");
        }
        bind
    }

    fn classdb_construct_object(&self, class: ClassTag) -> Result<ObjectId, CallError> {
        let (name, instantiable) = {
            let classes = self.classes.read();
            let name = classes.by_tag.get(&class).ok_or(CallError::InvalidMethod)?;
            let instantiable = classes.by_name.get(name).is_some_and(|entry| entry.instantiable);
            (name.clone(), instantiable)
        };
        if !instantiable {
            log::error!("class {name} cannot be instantiated");
            return Err(CallError::InvalidMethod);
        }
        self.instantiate(name.as_str()).ok_or(CallError::InvalidMethod)
    }

    fn global_get_singleton(&self, name: &StringName) -> Option<ObjectId> {
        self.singleton(name.as_str())
    }

    fn object_method_bind_ptrcall(
        &self,
        bind: MethodBind,
        instance: Option<ObjectId>,
        args: &[ArgPtr<'_>],
        ret: RetPtr<'_>,
    ) -> Result<(), CallError> {
        self.ptrcall(bind, instance, args, ret)
    }

    fn object_method_bind_call(
        &self,
        bind: MethodBind,
        instance: Option<ObjectId>,
        args: &[&Variant],
    ) -> Result<Variant, CallError> {
        self.varcall(bind, instance, args)
    }

    fn object_is_alive(&self, id: ObjectId) -> bool {
        self.is_alive(id)
    }

    fn object_destroy(&self, id: ObjectId) {
        self.destroy(id);
    }

    fn object_set_instance_binding(&self, id: ObjectId, binding: Arc<dyn InstanceBinding>) -> Result<(), CallError> {
        let mut objects = self.objects.write();
        let record = objects.get_mut(id).ok_or(CallError::InstanceIsNull)?;
        log::debug!("attached {} script to {} ({id})", binding.class_name(), record.class);
        record.binding = Some(binding);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enginebridge_core::{VariantType, Vector3, method_compat_hash};

    /// Script stand-in that records every call it receives.
    struct Recorder {
        methods: Vec<&'static str>,
        signals: Vec<&'static str>,
        log: Mutex<Vec<(String, Vec<Variant>)>>,
    }

    impl Recorder {
        fn new(methods: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                methods: methods.to_vec(),
                signals: Vec::new(),
                log: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.log.lock().iter().map(|(name, _)| name.clone()).collect()
        }
    }

    impl InstanceBinding for Recorder {
        fn class_name(&self) -> &str {
            "Recorder"
        }

        fn has_method(&self, method: &StringName) -> bool {
            self.methods.iter().any(|m| *m == method.as_str())
        }

        fn call(&self, method: &StringName, args: &[Variant]) -> Result<Variant, CallError> {
            if !self.has_method(method) {
                return Err(CallError::InvalidMethod);
            }
            self.log.lock().push((method.to_string(), args.to_vec()));
            Ok(Variant::Nil)
        }

        fn has_signal(&self, signal: &StringName) -> bool {
            self.signals.iter().any(|s| *s == signal.as_str())
        }
    }

    #[derive(Default)]
    struct Position(Vector3);

    fn db() -> ClassDb {
        let db = ClassDb::with_core_classes().unwrap();
        db.register_class(ClassInfo::new("Spatial").inherits("Node").with_data::<Position>())
            .unwrap();
        db.register_method(
            "Spatial",
            MethodInfo::new("set_position").arg("position", VariantType::Vector3),
            |ctx| {
                let position: Vector3 = ctx.arg(0)?;
                ctx.with_data(|data: &mut Position| data.0 = position)
            },
        )
        .unwrap();
        db.register_method(
            "Spatial",
            MethodInfo::new("get_position").returns(VariantType::Vector3),
            |ctx| {
                let position = ctx.with_data(|data: &mut Position| data.0)?;
                ctx.set_return(position)
            },
        )
        .unwrap();
        db
    }

    fn bind(db: &ClassDb, class: &str, method: &str, args: &[VariantType], ret: Option<VariantType>) -> MethodBind {
        db.classdb_get_method_bind(
            &StringName::new(class),
            &StringName::new(method),
            method_compat_hash(method, args, ret),
        )
        .unwrap()
    }

    #[test]
    fn duplicate_class_is_rejected() {
        let db = db();
        let err = db.register_class(ClassInfo::new("Spatial")).unwrap_err();
        assert_eq!(err, RegistrationError::DuplicateClass("Spatial".into()));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let db = ClassDb::new();
        let err = db.register_class(ClassInfo::new("Child").inherits("Missing")).unwrap_err();
        assert_eq!(err, RegistrationError::UnknownClass("Missing".into()));
    }

    #[test]
    fn refcounting_is_inherited() {
        let db = db();
        db.register_class(ClassInfo::new("Texture").inherits("Resource")).unwrap();
        let texture = db.instantiate("Texture").unwrap();
        assert_eq!(db.reference(texture), Some(1));

        let node = db.instantiate("Node").unwrap();
        assert_eq!(db.reference(node), None);
    }

    #[test]
    fn overloads_resolve_by_hash() {
        let db = db();
        db.register_method(
            "Spatial",
            MethodInfo::new("scale").arg("factor", VariantType::Float),
            |_| Ok(()),
        )
        .unwrap();
        db.register_method(
            "Spatial",
            MethodInfo::new("scale").arg("factor", VariantType::Vector3),
            |_| Ok(()),
        )
        .unwrap();

        let by_float = bind(&db, "Spatial", "scale", &[VariantType::Float], None);
        let by_vector = bind(&db, "Spatial", "scale", &[VariantType::Vector3], None);
        assert_ne!(by_float, by_vector);

        let missing = db.classdb_get_method_bind(
            &StringName::new("Spatial"),
            &StringName::new("scale"),
            method_compat_hash("scale", &[VariantType::Int], None),
        );
        assert_eq!(missing, None);
    }

    #[test]
    fn duplicate_signature_is_rejected() {
        let db = db();
        let err = db
            .register_method(
                "Spatial",
                MethodInfo::new("get_position").returns(VariantType::Vector3),
                |_| Ok(()),
            )
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateMethod { .. }));
    }

    #[test]
    fn inherited_methods_resolve_on_subclass() {
        let db = db();
        let bind = db.classdb_get_method_bind(
            &StringName::new("Spatial"),
            &StringName::new("get_class"),
            method_compat_hash("get_class", &[], Some(VariantType::String)),
        );
        assert!(bind.is_some());
    }

    #[test]
    fn ptrcall_reads_and_writes_native_storage() {
        let db = db();
        let spatial = db.instantiate("Spatial").unwrap();
        let set = bind(&db, "Spatial", "set_position", &[VariantType::Vector3], None);
        let get = bind(&db, "Spatial", "get_position", &[], Some(VariantType::Vector3));

        let position = Vector3::new(1.0, 2.0, 3.0);
        db.ptrcall(set, Some(spatial), &[&position], &mut ()).unwrap();

        let mut out = Vector3::ZERO;
        db.ptrcall(get, Some(spatial), &[], &mut out).unwrap();
        assert_eq!(out, position);

        let calls = db.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args, vec![Variant::Vector3(position)]);
        assert_eq!(calls[0].convention, CallConvention::Ptr);
    }

    #[test]
    fn ptrcall_rejects_wrong_return_storage() {
        let db = db();
        let spatial = db.instantiate("Spatial").unwrap();
        let get = bind(&db, "Spatial", "get_position", &[], Some(VariantType::Vector3));
        let mut wrong = 0i64;
        let err = db.ptrcall(get, Some(spatial), &[], &mut wrong).unwrap_err();
        assert!(matches!(err, CallError::ReturnTypeMismatch { .. }));
    }

    #[test]
    fn ptrcall_checks_argument_count() {
        let db = db();
        let spatial = db.instantiate("Spatial").unwrap();
        let set = bind(&db, "Spatial", "set_position", &[VariantType::Vector3], None);
        let err = db.ptrcall(set, Some(spatial), &[], &mut ()).unwrap_err();
        assert_eq!(err, CallError::TooFewArguments { expected: 1, got: 0 });
    }

    #[test]
    fn calls_on_wrong_class_fail() {
        let db = db();
        let resource = db.instantiate("Resource").unwrap();
        let get = bind(&db, "Spatial", "get_position", &[], Some(VariantType::Vector3));
        let mut out = Vector3::ZERO;
        assert_eq!(
            db.ptrcall(get, Some(resource), &[], &mut out),
            Err(CallError::InvalidMethod)
        );
        assert_eq!(db.ptrcall(get, None, &[], &mut out), Err(CallError::InstanceIsNull));
    }

    #[test]
    fn varcall_fills_defaults() {
        let db = db();
        db.register_method(
            "Spatial",
            MethodInfo::new("offset")
                .arg("amount", VariantType::Float)
                .arg("scale", VariantType::Float)
                .default_arg(Variant::Float(2.0))
                .returns(VariantType::Float),
            |ctx| {
                let amount: f64 = ctx.arg(0)?;
                let scale: f64 = ctx.arg(1)?;
                ctx.set_return(amount * scale)
            },
        )
        .unwrap();
        let spatial = db.instantiate("Spatial").unwrap();
        let offset = bind(&db, "Spatial", "offset", &[VariantType::Float, VariantType::Float], Some(VariantType::Float));

        assert_eq!(db.varcall(offset, Some(spatial), &[&Variant::Float(1.5)]), Ok(Variant::Float(3.0)));
        assert_eq!(
            db.varcall(offset, Some(spatial), &[&Variant::Int(1), &Variant::Float(4.0)]),
            Ok(Variant::Float(4.0))
        );
        assert!(matches!(
            db.varcall(offset, Some(spatial), &[]),
            Err(CallError::TooFewArguments { .. })
        ));
        assert!(matches!(
            db.varcall(offset, Some(spatial), &[&Variant::String("x".into())]),
            Err(CallError::InvalidArgument { index: 0, .. })
        ));
    }

    #[test]
    fn vararg_methods_reject_ptrcall() {
        let db = db();
        let node = db.instantiate("Node").unwrap();
        let call = bind(&db, "Object", "call", &[VariantType::StringName], Some(VariantType::Nil));
        let method = StringName::new("get_class");
        let mut out = Variant::Nil;
        assert_eq!(
            db.ptrcall(call, Some(node), &[&method], &mut out),
            Err(CallError::InvalidMethod)
        );
        assert_eq!(
            db.varcall(call, Some(node), &[&Variant::StringName(method)]),
            Ok(Variant::String("Node".into()))
        );
    }

    #[test]
    fn lookups_are_counted() {
        let db = db();
        db.classdb_get_class_tag(&StringName::new("Node"));
        db.classdb_get_class_tag(&StringName::new("Missing"));
        bind(&db, "Spatial", "get_position", &[], Some(VariantType::Vector3));
        let stats = db.stats();
        assert_eq!(stats.class_lookups, 2);
        assert_eq!(stats.method_lookups, 1);
    }

    #[test]
    fn non_instantiable_classes_are_not_constructed() {
        let db = db();
        let tag = db
            .register_class(ClassInfo::new("Server").inherits("Object").not_instantiable())
            .unwrap();
        assert_eq!(db.classdb_construct_object(tag), Err(CallError::InvalidMethod));

        let singleton = db.register_singleton("Server").unwrap();
        assert_eq!(db.global_get_singleton(&StringName::new("Server")), Some(singleton));
        assert_eq!(
            db.register_singleton("Server"),
            Err(RegistrationError::DuplicateSingleton("Server".into()))
        );
    }

    #[test]
    fn script_methods_take_priority() {
        let db = db();
        let node = db.instantiate("Node").unwrap();
        let script = Recorder::new(&["_ready", "get_class"]);
        db.object_set_instance_binding(node, script.clone()).unwrap();

        assert_eq!(db.call_method(node, &StringName::new("get_class"), &[]), Ok(Variant::Nil));
        assert_eq!(script.calls(), vec!["get_class".to_string()]);
    }

    #[test]
    fn call_virtual_skips_undefined_overrides() {
        let db = db();
        let node = db.instantiate("Node").unwrap();
        assert_eq!(db.call_virtual(node, "_ready", &[]), Ok(None));

        let script = Recorder::new(&["_ready"]);
        db.object_set_instance_binding(node, script.clone()).unwrap();
        assert_eq!(db.call_virtual(node, "_process", &[Variant::Float(0.1)]), Ok(None));
        assert_eq!(db.call_virtual(node, "_ready", &[]), Ok(Some(Variant::Nil)));
        assert_eq!(script.calls(), vec!["_ready".to_string()]);
    }

    #[test]
    fn signals_reach_connected_callables() {
        let db = db();
        let emitter = db.instantiate("Node").unwrap();
        let listener = db.instantiate("Node").unwrap();
        let script = Recorder::new(&["on_renamed"]);
        db.object_set_instance_binding(listener, script.clone()).unwrap();

        let renamed = StringName::new("renamed");
        let callable = Callable::new(listener, "on_renamed");
        db.connect(emitter, &renamed, callable.clone(), ConnectFlags::empty())
            .unwrap();
        assert_eq!(
            db.connect(emitter, &renamed, callable.clone(), ConnectFlags::empty()),
            Err(EngineError::AlreadyExists)
        );
        assert!(db.is_connected(emitter, &renamed, &callable));

        db.emit_signal(emitter, &renamed, &[]).unwrap();
        db.emit_signal(emitter, &renamed, &[]).unwrap();
        assert_eq!(script.calls().len(), 2);

        db.disconnect(emitter, &renamed, &callable).unwrap();
        assert_eq!(
            db.disconnect(emitter, &renamed, &callable),
            Err(EngineError::DoesNotExist)
        );
    }

    #[test]
    fn unknown_signals_are_rejected() {
        let db = db();
        let node = db.instantiate("Node").unwrap();
        let missing = StringName::new("missing");
        assert_eq!(
            db.connect(node, &missing, Callable::new(node, "x"), ConnectFlags::empty()),
            Err(EngineError::InvalidParameter)
        );
        assert_eq!(db.emit_signal(node, &missing, &[]), Err(EngineError::Unavailable));
    }

    #[test]
    fn one_shot_and_deferred_connections() {
        let db = db();
        let emitter = db.instantiate("Node").unwrap();
        let listener = db.instantiate("Node").unwrap();
        let script = Recorder::new(&["once", "later"]);
        db.object_set_instance_binding(listener, script.clone()).unwrap();

        let ready = StringName::new("ready");
        db.connect(emitter, &ready, Callable::new(listener, "once"), ConnectFlags::ONE_SHOT)
            .unwrap();
        db.connect(emitter, &ready, Callable::new(listener, "later"), ConnectFlags::DEFERRED)
            .unwrap();

        db.emit_signal(emitter, &ready, &[]).unwrap();
        assert_eq!(script.calls(), vec!["once".to_string()]);

        assert_eq!(db.flush_deferred(), 1);
        assert_eq!(script.calls(), vec!["once".to_string(), "later".to_string()]);

        db.emit_signal(emitter, &ready, &[]).unwrap();
        db.flush_deferred();
        assert_eq!(script.calls().len(), 3);
    }

    #[test]
    fn destroying_a_node_destroys_its_subtree() {
        let db = db();
        let root = db.instantiate("Node").unwrap();
        let child = db.instantiate("Node").unwrap();
        let grandchild = db.instantiate("Node").unwrap();
        db.add_child(root, child).unwrap();
        db.add_child(child, grandchild).unwrap();

        db.destroy(child);
        assert!(db.is_alive(root));
        assert!(!db.is_alive(child));
        assert!(!db.is_alive(grandchild));
        assert!(db.children(root).is_empty());
    }

    #[test]
    fn add_child_refuses_second_parent() {
        let db = db();
        let a = db.instantiate("Node").unwrap();
        let b = db.instantiate("Node").unwrap();
        let child = db.instantiate("Node").unwrap();
        db.add_child(a, child).unwrap();
        assert_eq!(db.add_child(b, child), Err(EngineError::AlreadyExists));
        assert_eq!(db.get_parent(child), Some(a));
    }

    #[test]
    fn add_child_refuses_cycles() {
        let db = db();
        let before = db.object_count();
        let root = db.instantiate("Node").unwrap();
        let child = db.instantiate("Node").unwrap();
        let grandchild = db.instantiate("Node").unwrap();
        db.add_child(root, child).unwrap();
        db.add_child(child, grandchild).unwrap();

        assert_eq!(db.add_child(child, root), Err(EngineError::InvalidParameter));
        assert_eq!(db.add_child(grandchild, root), Err(EngineError::InvalidParameter));
        assert_eq!(db.get_parent(root), None);
        assert!(db.children(grandchild).is_empty());

        db.destroy(root);
        assert_eq!(db.object_count(), before);
    }

    #[test]
    fn ready_runs_children_first() {
        let db = db();
        let parent = db.instantiate("Node").unwrap();
        let child = db.instantiate("Node").unwrap();
        db.add_child(parent, child).unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        for (id, label) in [(parent, "parent"), (child, "child")] {
            let script = Arc::new(Labelled {
                label,
                order: order.clone(),
            });
            db.object_set_instance_binding(id, script).unwrap();
        }

        db.notify_ready(parent);
        assert_eq!(*order.lock(), vec!["child", "parent"]);
    }

    struct Labelled {
        label: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl InstanceBinding for Labelled {
        fn class_name(&self) -> &str {
            self.label
        }

        fn has_method(&self, method: &StringName) -> bool {
            method == "_ready"
        }

        fn call(&self, _method: &StringName, _args: &[Variant]) -> Result<Variant, CallError> {
            self.order.lock().push(self.label);
            Ok(Variant::Nil)
        }

        fn has_signal(&self, _signal: &StringName) -> bool {
            false
        }
    }

    #[test]
    fn dynamic_properties_round_through_storage() {
        let db = db();
        let object = db.instantiate("Object").unwrap();
        let health = StringName::new("health");
        assert_eq!(db.get_property(object, &health), Ok(None));
        db.set_property(object, &health, Variant::Int(10)).unwrap();
        assert_eq!(db.get_property(object, &health), Ok(Some(Variant::Int(10))));
    }

    #[test]
    fn call_log_can_be_disabled() {
        let db = db();
        let node = db.instantiate("Node").unwrap();
        db.set_record_calls(false);
        db.call_method(node, &StringName::new("get_class"), &[]).unwrap();
        assert!(db.calls().is_empty());

        db.set_record_calls(true);
        db.call_method(node, &StringName::new("get_class"), &[]).unwrap();
        assert_eq!(db.take_calls().len(), 1);
        assert!(db.calls().is_empty());
    }
}
