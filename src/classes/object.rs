//! `Object`, the root of the class hierarchy.

use std::fmt;
use std::sync::{Arc, OnceLock};

use enginebridge_core::{CallError, Callable, ConnectFlags, EngineError, StringName, ToVariant, Variant};

use crate::marshal::{ptrcall_0, ptrcall_1, ptrcall_2, ptrcall_3, varcall};
use crate::object::{RawObject, object_conversions};
use crate::script::{DispatchVirtual, is_declared, virtual_arg};
use crate::{Bridge, EngineClass, NameTable};

pub mod method_name {
    pub const GET_CLASS: &str = "get_class";
    pub const IS_CLASS: &str = "is_class";
    pub const GET_INSTANCE_ID: &str = "get_instance_id";
    pub const HAS_METHOD: &str = "has_method";
    pub const HAS_SIGNAL: &str = "has_signal";
    pub const SET: &str = "set";
    pub const GET: &str = "get";
    pub const CALL: &str = "call";
    pub const EMIT_SIGNAL: &str = "emit_signal";
    pub const CONNECT: &str = "connect";
    pub const DISCONNECT: &str = "disconnect";
    pub const IS_CONNECTED: &str = "is_connected";
    pub const NOTIFICATION: &str = "notification";
    pub const TO_STRING: &str = "to_string";
    pub const _NOTIFICATION: &str = "_notification";
    pub const _TO_STRING: &str = "_to_string";
    pub const _GET: &str = "_get";
    pub const _SET: &str = "_set";
}

pub mod signal_name {
    pub const SCRIPT_CHANGED: &str = "script_changed";
    pub const PROPERTY_LIST_CHANGED: &str = "property_list_changed";
}

pub mod keys {
    use enginebridge_core::VariantType as V;

    use crate::MethodKey;

    pub const GET_CLASS: MethodKey = MethodKey::new("Object", "get_class", &[], Some(V::String));
    pub const IS_CLASS: MethodKey = MethodKey::new("Object", "is_class", &[V::String], Some(V::Bool));
    pub const GET_INSTANCE_ID: MethodKey = MethodKey::new("Object", "get_instance_id", &[], Some(V::Int));
    pub const HAS_METHOD: MethodKey = MethodKey::new("Object", "has_method", &[V::StringName], Some(V::Bool));
    pub const HAS_SIGNAL: MethodKey = MethodKey::new("Object", "has_signal", &[V::StringName], Some(V::Bool));
    pub const SET: MethodKey = MethodKey::new("Object", "set", &[V::StringName, V::Nil], None);
    pub const GET: MethodKey = MethodKey::new("Object", "get", &[V::StringName], Some(V::Nil));
    pub const CALL: MethodKey = MethodKey::new("Object", "call", &[V::StringName], Some(V::Nil));
    pub const EMIT_SIGNAL: MethodKey = MethodKey::new("Object", "emit_signal", &[V::StringName], Some(V::Int));
    pub const CONNECT: MethodKey =
        MethodKey::new("Object", "connect", &[V::StringName, V::Callable, V::Int], Some(V::Int));
    pub const DISCONNECT: MethodKey = MethodKey::new("Object", "disconnect", &[V::StringName, V::Callable], None);
    pub const IS_CONNECTED: MethodKey =
        MethodKey::new("Object", "is_connected", &[V::StringName, V::Callable], Some(V::Bool));
    pub const NOTIFICATION: MethodKey = MethodKey::new("Object", "notification", &[V::Int, V::Bool], None);
    pub const TO_STRING: MethodKey = MethodKey::new("Object", "to_string", &[], Some(V::String));

    pub const ALL: &[MethodKey] = &[
        GET_CLASS,
        IS_CLASS,
        GET_INSTANCE_ID,
        HAS_METHOD,
        HAS_SIGNAL,
        SET,
        GET,
        CALL,
        EMIT_SIGNAL,
        CONNECT,
        DISCONNECT,
        IS_CONNECTED,
        NOTIFICATION,
        TO_STRING,
    ];
}

const VIRTUALS: &[&str] = &[
    method_name::_NOTIFICATION,
    method_name::_TO_STRING,
    method_name::_GET,
    method_name::_SET,
];

pub fn names() -> &'static NameTable {
    static TABLE: OnceLock<NameTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let methods: Vec<&str> = keys::ALL.iter().map(|key| key.method).chain(VIRTUALS.iter().copied()).collect();
        NameTable::new("Object", None)
            .with_methods(&methods)
            .with_signals(&[signal_name::SCRIPT_CHANGED, signal_name::PROPERTY_LIST_CHANGED])
    })
}

/// Base class of every engine object.
#[derive(Clone)]
pub struct Object {
    raw: RawObject,
}

impl EngineClass for Object {
    const CLASS_NAME: &'static str = "Object";
    const IS_REFCOUNTED: bool = false;
    const METHOD_KEYS: &'static [crate::MethodKey] = keys::ALL;

    fn names() -> &'static NameTable {
        names()
    }

    fn from_raw(raw: RawObject) -> Self {
        Self { raw }
    }

    fn raw(&self) -> &RawObject {
        &self.raw
    }
}

object_conversions!(Object);

impl Object {
    pub fn new(bridge: &Arc<Bridge>) -> Self {
        bridge.construct()
    }

    pub fn get_class(&self) -> String {
        ptrcall_0(self.raw.bridge(), self.raw.bind(&keys::GET_CLASS), self.raw.instance())
    }

    /// Whether the object's class is `class` or derives from it.
    pub fn is_class(&self, class: &str) -> bool {
        ptrcall_1(self.raw.bridge(), self.raw.bind(&keys::IS_CLASS), self.raw.instance(), class)
    }

    pub fn get_instance_id(&self) -> i64 {
        ptrcall_0(self.raw.bridge(), self.raw.bind(&keys::GET_INSTANCE_ID), self.raw.instance())
    }

    pub fn has_method(&self, method: impl Into<StringName>) -> bool {
        let method = method.into();
        ptrcall_1(self.raw.bridge(), self.raw.bind(&keys::HAS_METHOD), self.raw.instance(), &method)
    }

    pub fn has_signal(&self, signal: impl Into<StringName>) -> bool {
        let signal = signal.into();
        ptrcall_1(self.raw.bridge(), self.raw.bind(&keys::HAS_SIGNAL), self.raw.instance(), &signal)
    }

    pub fn set(&self, property: impl Into<StringName>, value: impl ToVariant) {
        let property = property.into();
        let value = value.to_variant();
        ptrcall_2(self.raw.bridge(), self.raw.bind(&keys::SET), self.raw.instance(), &property, &value)
    }

    /// Property value, or nil if the object has no such property.
    pub fn get(&self, property: impl Into<StringName>) -> Variant {
        let property = property.into();
        ptrcall_1(self.raw.bridge(), self.raw.bind(&keys::GET), self.raw.instance(), &property)
    }

    /// Call any method by name, native or script-defined.
    pub fn call(&self, method: impl Into<StringName>, args: &[Variant]) -> Result<Variant, CallError> {
        let method = Variant::StringName(method.into());
        let mut all: Vec<&Variant> = Vec::with_capacity(args.len() + 1);
        all.push(&method);
        all.extend(args);
        varcall(self.raw.bridge(), self.raw.bind(&keys::CALL), self.raw.instance(), &all)
    }

    pub fn emit_signal(&self, signal: impl Into<StringName>, args: &[Variant]) -> Result<(), EngineError> {
        let signal = signal.into();
        let name = Variant::StringName(signal.clone());
        let mut all: Vec<&Variant> = Vec::with_capacity(args.len() + 1);
        all.push(&name);
        all.extend(args);
        match varcall(self.raw.bridge(), self.raw.bind(&keys::EMIT_SIGNAL), self.raw.instance(), &all) {
            Ok(Variant::Int(code)) => EngineError::check(code),
            Ok(other) => {
                log::error!("emit_signal {signal} returned {}", other.type_name());
                Err(EngineError::Failed)
            }
            Err(err) => {
                log::error!("emit_signal {signal} on {}: {err}", self.raw.id());
                Err(EngineError::Failed)
            }
        }
    }

    /// Connect `signal` to `callable`. `flags` defaults to none.
    pub fn connect(
        &self,
        signal: impl Into<StringName>,
        callable: &Callable,
        flags: Option<ConnectFlags>,
    ) -> Result<(), EngineError> {
        let signal = signal.into();
        let flags = flags.unwrap_or(ConnectFlags::empty());
        let code: i64 = ptrcall_3(
            self.raw.bridge(),
            self.raw.bind(&keys::CONNECT),
            self.raw.instance(),
            &signal,
            callable,
            &flags,
        );
        EngineError::check(code)
    }

    pub fn disconnect(&self, signal: impl Into<StringName>, callable: &Callable) {
        let signal = signal.into();
        ptrcall_2(self.raw.bridge(), self.raw.bind(&keys::DISCONNECT), self.raw.instance(), &signal, callable)
    }

    pub fn is_connected(&self, signal: impl Into<StringName>, callable: &Callable) -> bool {
        let signal = signal.into();
        ptrcall_2(self.raw.bridge(), self.raw.bind(&keys::IS_CONNECTED), self.raw.instance(), &signal, callable)
    }

    /// Send a notification. `reversed` defaults to `false`.
    pub fn notification(&self, what: i32, reversed: Option<bool>) {
        let reversed = reversed.unwrap_or(false);
        ptrcall_2(self.raw.bridge(), self.raw.bind(&keys::NOTIFICATION), self.raw.instance(), &what, &reversed)
    }

    /// A callable targeting `method` on this object.
    pub fn callable(&self, method: impl Into<StringName>) -> Callable {
        Callable::new(self.raw.id(), method)
    }

    /// Destroy the object now. Reference-counted objects are freed by
    /// dropping their last wrapper instead.
    pub fn free(&self) {
        if self.raw.is_counted() {
            log::error!("free() called on reference-counted object {}", self.raw.id());
            return;
        }
        self.raw.bridge().runtime().object_destroy(self.raw.id());
    }

    /// Whether the native object still exists.
    pub fn is_instance_valid(&self) -> bool {
        self.raw.is_alive()
    }

    /// View the object as class `U`, if it is one.
    pub fn try_cast<U: EngineClass>(&self) -> Option<U> {
        if !self.is_instance_valid() || !self.is_class(U::CLASS_NAME) {
            return None;
        }
        Some(U::from_raw(RawObject::new(self.raw.bridge().clone(), self.raw.id(), U::IS_REFCOUNTED)))
    }

    /// Like [`try_cast`](Self::try_cast), panicking if the object is not a `U`.
    pub fn cast<U: EngineClass>(&self) -> U {
        self.try_cast().unwrap_or_else(|| {
            log::error!("{} is not a {}", self.raw.id(), U::CLASS_NAME);
            panic!("{} is not a {}", self.raw.id(), U::CLASS_NAME);
        })
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object").field("id", &self.raw.id()).finish()
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: String = ptrcall_0(self.raw.bridge(), self.raw.bind(&keys::TO_STRING), self.raw.instance());
        f.write_str(&text)
    }
}

// ============================================================================
// Virtual Methods
// ============================================================================

/// Overridable callbacks of `Object`.
#[allow(unused_variables)]
pub trait ObjectVirtual {
    fn _notification(&mut self, what: i32) {}

    /// Text for `to_string()`.
    fn _to_string(&mut self) -> String {
        String::new()
    }

    /// Value of a script-handled property; nil leaves it to the engine.
    fn _get(&mut self, property: StringName) -> Variant {
        Variant::Nil
    }

    /// Set a script-handled property; `false` leaves it to the engine.
    fn _set(&mut self, property: StringName, value: Variant) -> bool {
        false
    }
}

impl<T: ObjectVirtual> DispatchVirtual<T> for Object {
    fn is_virtual(method: &str) -> bool {
        is_declared(VIRTUALS, method)
    }

    fn invoke_virtual(
        this: &mut T,
        overrides: &[&str],
        method: &StringName,
        args: &[Variant],
    ) -> Result<Option<Variant>, CallError> {
        let name = method.as_str();
        if !is_declared(overrides, name) {
            return Ok(None);
        }
        match (name, args.len()) {
            ("_notification", 1) => {
                this._notification(virtual_arg(method, args, 0)?);
                Ok(Some(Variant::Nil))
            }
            ("_to_string", 0) => Ok(Some(this._to_string().to_variant())),
            ("_get", 1) => Ok(Some(this._get(virtual_arg(method, args, 0)?))),
            ("_set", 2) => {
                let handled = this._set(virtual_arg(method, args, 0)?, virtual_arg(method, args, 1)?);
                Ok(Some(Variant::Bool(handled)))
            }
            _ => Ok(None),
        }
    }
}
