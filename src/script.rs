//! Script classes: managed types that extend an engine class.
//!
//! A script class is a plain Rust struct attached to a native object of its
//! base class. The engine reaches it through the object's
//! [`InstanceBinding`], which is [`ScriptBinding`] here:
//!
//! 1. the engine asks `has_method(name)`, answered from the script's declared
//!    overrides and methods without running any script code;
//! 2. if that succeeds the engine calls `call(name, args)`, which routes
//!    virtual callbacks through the base class's [`DispatchVirtual`] chain
//!    and everything else through [`ScriptClass::call_method`].
//!
//! Scripts are usually declared with `#[derive(ScriptClass)]`:
//!
//! ```
//! use enginebridge::classes::{Node, NodeVirtual, ObjectVirtual};
//! use enginebridge::{Base, ScriptClass};
//!
//! #[derive(ScriptClass)]
//! #[script(base = Node, overrides(_ready))]
//! struct Player {
//!     base: Base<Node>,
//!     ready: bool,
//! }
//!
//! impl ObjectVirtual for Player {}
//!
//! impl NodeVirtual for Player {
//!     fn _ready(&mut self) {
//!         self.ready = true;
//!     }
//! }
//!
//! assert_eq!(Player::OVERRIDES, &["_ready"]);
//! ```

use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use enginebridge_core::{CallError, ConversionError, FromVariant, InstanceBinding, ObjectId, StringName, Variant};
use parking_lot::{Mutex, MutexGuard};

use crate::names::script_names;
use crate::object::RawObject;
use crate::{BindError, Bridge, EngineClass, NameTable};

// ============================================================================
// Traits
// ============================================================================

/// A managed class extending an engine class.
pub trait ScriptClass: Sized + Send + 'static {
    /// Engine class the script extends.
    type Base: EngineClass + DispatchVirtual<Self>;

    /// Name the engine sees for the script class.
    const CLASS_NAME: &'static str;

    /// Virtual callbacks of the base class the script implements.
    const OVERRIDES: &'static [&'static str];

    /// Signals the script declares.
    const SIGNALS: &'static [&'static str];

    /// Script-defined methods callable by name.
    const METHODS: &'static [&'static str];

    /// Call a script-defined method. `Ok(None)` means the method is unknown.
    fn call_method(&mut self, _method: &StringName, _args: &[Variant]) -> Result<Option<Variant>, CallError> {
        Ok(None)
    }
}

/// Dispatch for the methods listed in `#[script(methods(...))]`.
pub trait ScriptMethods {
    fn call_method(&mut self, method: &StringName, args: &[Variant]) -> Result<Option<Variant>, CallError>;
}

/// Virtual callback dispatch of an engine class, for scripts of type `T`.
///
/// Each class handles its own override points and hands every other name
/// to its base class. `Object` ends the chain with `Ok(None)`.
pub trait DispatchVirtual<T> {
    /// Whether `method` is an override point of this class or an ancestor.
    fn is_virtual(method: &str) -> bool;

    /// Invoke the override for `method` if the script declares it in
    /// `overrides` and `args` has the right length.
    fn invoke_virtual(
        this: &mut T,
        overrides: &[&str],
        method: &StringName,
        args: &[Variant],
    ) -> Result<Option<Variant>, CallError>;
}

/// Whether a script declares `method` as an override.
pub fn is_declared(overrides: &[&str], method: &str) -> bool {
    overrides.iter().any(|declared| *declared == method)
}

/// Convert argument `index` of a virtual call.
///
/// A mismatch means the engine called the override with the wrong
/// signature; it is logged and reported as an invalid argument.
pub fn virtual_arg<A: FromVariant>(method: &StringName, args: &[Variant], index: usize) -> Result<A, CallError> {
    let arg = args.get(index).ok_or(CallError::TooFewArguments {
        expected: index + 1,
        got: args.len(),
    })?;
    A::from_variant(arg).map_err(|source: ConversionError| {
        log::error!("virtual {method}: argument {index}: {source}");
        CallError::InvalidArgument { index, source }
    })
}

// ============================================================================
// Base
// ============================================================================

/// Non-owning reference from a script instance to its engine object.
pub struct Base<B> {
    id: ObjectId,
    bridge: Arc<Bridge>,
    _class: PhantomData<fn() -> B>,
}

impl<B: EngineClass> Base<B> {
    pub fn instance_id(&self) -> ObjectId {
        self.id
    }

    /// A wrapper for the engine object, for calling base class methods.
    pub fn object(&self) -> B {
        B::from_raw(RawObject::new(self.bridge.clone(), self.id, B::IS_REFCOUNTED))
    }
}

impl<B> std::fmt::Debug for Base<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Base").field("id", &self.id).finish()
    }
}

// ============================================================================
// Instance Binding
// ============================================================================

/// [`InstanceBinding`] of a script instance.
pub struct ScriptBinding<T> {
    instance: Arc<Mutex<T>>,
}

impl<T: ScriptClass> InstanceBinding for ScriptBinding<T> {
    fn class_name(&self) -> &str {
        T::CLASS_NAME
    }

    fn has_method(&self, method: &StringName) -> bool {
        is_declared(T::OVERRIDES, method.as_str()) || is_declared(T::METHODS, method.as_str())
    }

    fn call(&self, method: &StringName, args: &[Variant]) -> Result<Variant, CallError> {
        let Some(mut instance) = self.instance.try_lock() else {
            log::warn!("{}::{method} called while the instance is busy", T::CLASS_NAME);
            return Err(CallError::InstanceBusy);
        };

        if let Some(ret) = <T::Base as DispatchVirtual<T>>::invoke_virtual(&mut instance, T::OVERRIDES, method, args)? {
            return Ok(ret);
        }
        if is_declared(T::METHODS, method.as_str())
            && let Some(ret) = ScriptClass::call_method(&mut *instance, method, args)?
        {
            return Ok(ret);
        }
        Err(CallError::InvalidMethod)
    }

    fn has_signal(&self, signal: &StringName) -> bool {
        is_declared(T::SIGNALS, signal.as_str())
    }
}

// ============================================================================
// Script Object
// ============================================================================

/// Handle to a script instance and the engine object it is attached to.
///
/// Derefs to the base class wrapper.
pub struct ScriptObject<T: ScriptClass> {
    base: T::Base,
    instance: Arc<Mutex<T>>,
}

impl<T: ScriptClass> ScriptObject<T> {
    /// Construct the base object and attach a new script instance to it.
    pub fn try_new(bridge: &Arc<Bridge>, init: impl FnOnce(Base<T::Base>) -> T) -> Result<Self, BindError> {
        for method in T::OVERRIDES {
            if <T::Base as DispatchVirtual<T>>::is_virtual(method) {
                continue;
            }
            if bridge.config().strict_overrides {
                return Err(BindError::UnknownOverride {
                    class: T::CLASS_NAME,
                    method: *method,
                });
            }
            log::warn!(
                "{} overrides {method}, which {} does not declare",
                T::CLASS_NAME,
                <T::Base as EngineClass>::CLASS_NAME
            );
        }

        let base: T::Base = bridge.try_construct()?;
        let id = base.instance_id();
        let instance = Arc::new(Mutex::new(init(Base {
            id,
            bridge: bridge.clone(),
            _class: PhantomData,
        })));

        let binding = Arc::new(ScriptBinding {
            instance: instance.clone(),
        });
        bridge.runtime().object_set_instance_binding(id, binding)?;
        log::debug!("attached {} to {id}", T::CLASS_NAME);
        Ok(Self { base, instance })
    }

    /// Like [`try_new`](Self::try_new), panicking on failure.
    pub fn new(bridge: &Arc<Bridge>, init: impl FnOnce(Base<T::Base>) -> T) -> Self {
        Self::try_new(bridge, init).unwrap_or_else(|err| {
            log::error!("could not create {}: {err}", T::CLASS_NAME);
            panic!("could not create {}: {err}", T::CLASS_NAME);
        })
    }

    /// Lock the script instance. Blocks while the engine is calling into it.
    pub fn bind(&self) -> MutexGuard<'_, T> {
        self.instance.lock()
    }

    /// Lock the script instance, or `None` if it is executing a call.
    pub fn try_bind(&self) -> Option<MutexGuard<'_, T>> {
        self.instance.try_lock()
    }

    pub fn base(&self) -> &T::Base {
        &self.base
    }

    pub fn names() -> &'static NameTable {
        script_names::<T>()
    }
}

impl<T: ScriptClass> Deref for ScriptObject<T> {
    type Target = T::Base;

    fn deref(&self) -> &T::Base {
        &self.base
    }
}

impl<T: ScriptClass> Clone for ScriptObject<T> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            instance: self.instance.clone(),
        }
    }
}

impl<T: ScriptClass> std::fmt::Debug for ScriptObject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptObject")
            .field("class", &T::CLASS_NAME)
            .field("base", &self.base)
            .finish()
    }
}
