//! Engine object wrappers.
//!
//! Every bound class is a thin wrapper around a [`RawObject`]: the native
//! instance id plus the bridge it was obtained through. Classes nest their
//! base class and deref to it, so a `Node3D` can be used wherever a `&Node`
//! or `&Object` is expected.
//!
//! # Ownership
//!
//! Wrappers of reference-counted classes hold one native reference each.
//! Cloning takes another, dropping releases it, and the last release
//! destroys the native object. Wrappers of other classes own nothing; those
//! objects live until `free()` or `queue_free()`.

use std::sync::Arc;

use enginebridge_core::{MethodBind, ObjectId};

use crate::classes::ref_counted::keys as ref_keys;
use crate::{BindError, Bridge, MethodKey, NameTable};

/// Native instance handle owned by a wrapper.
pub struct RawObject {
    id: ObjectId,
    bridge: Arc<Bridge>,
    counted: bool,
}

impl RawObject {
    /// Take ownership of a freshly constructed object. Reference-counted
    /// objects get their first reference here.
    pub(crate) fn adopt(bridge: Arc<Bridge>, id: ObjectId, refcounted: bool) -> Result<Self, BindError> {
        if refcounted {
            let bind = bridge.try_method_bind(&ref_keys::INIT_REF)?;
            let mut taken = false;
            bridge
                .runtime()
                .object_method_bind_ptrcall(bind, Some(id), &[], &mut taken)?;
        }
        Ok(Self {
            id,
            bridge,
            counted: refcounted,
        })
    }

    /// Wrap an existing object, taking a reference if it is reference-counted.
    pub fn new(bridge: Arc<Bridge>, id: ObjectId, refcounted: bool) -> Self {
        let counted = refcounted && Self::take_reference(&bridge, id);
        Self { id, bridge, counted }
    }

    fn take_reference(bridge: &Bridge, id: ObjectId) -> bool {
        let result = bridge.try_method_bind(&ref_keys::REFERENCE).and_then(|bind| {
            let mut taken = false;
            bridge
                .runtime()
                .object_method_bind_ptrcall(bind, Some(id), &[], &mut taken)?;
            Ok(taken)
        });
        match result {
            Ok(taken) => taken,
            Err(err) => {
                log::error!("could not take a reference to {id}: {err}");
                false
            }
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }

    /// Receiver for native calls.
    pub fn instance(&self) -> Option<ObjectId> {
        Some(self.id)
    }

    /// Whether this wrapper holds a native reference.
    pub fn is_counted(&self) -> bool {
        self.counted
    }

    /// Cached bind for `key`.
    pub fn bind(&self, key: &MethodKey) -> MethodBind {
        self.bridge.method_bind(key)
    }

    pub fn is_alive(&self) -> bool {
        self.bridge.runtime().object_is_alive(self.id)
    }
}

impl Clone for RawObject {
    fn clone(&self) -> Self {
        Self::new(self.bridge.clone(), self.id, self.counted)
    }
}

impl Drop for RawObject {
    fn drop(&mut self) {
        if !self.counted || !self.is_alive() {
            return;
        }

        let bind = match self.bridge.try_method_bind(&ref_keys::UNREFERENCE) {
            Ok(bind) => bind,
            Err(err) => {
                log::error!("could not release {}: {err}", self.id);
                return;
            }
        };
        let mut last = false;
        let runtime = self.bridge.runtime();
        if let Err(err) = runtime.object_method_bind_ptrcall(bind, Some(self.id), &[], &mut last) {
            log::error!("could not release {}: {err}", self.id);
            return;
        }
        if last {
            log::trace!("last reference to {} released", self.id);
            runtime.object_destroy(self.id);
        }
    }
}

impl std::fmt::Debug for RawObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawObject")
            .field("id", &self.id)
            .field("counted", &self.counted)
            .finish()
    }
}

/// A bound engine class.
pub trait EngineClass: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Name of the native class.
    const CLASS_NAME: &'static str;

    /// Whether instances are reference-counted.
    const IS_REFCOUNTED: bool;

    /// Every method bind the class's accessors use.
    const METHOD_KEYS: &'static [MethodKey];

    /// Property, method and signal names of the class and its ancestors.
    fn names() -> &'static NameTable;

    fn from_raw(raw: RawObject) -> Self;

    fn raw(&self) -> &RawObject;

    fn instance_id(&self) -> ObjectId {
        self.raw().id()
    }

    fn bridge(&self) -> &Arc<Bridge> {
        self.raw().bridge()
    }
}

/// Marshaling for a class wrapper: the wrapper passes as its instance id, a
/// null return is an error, and `Option<Class>` admits null.
macro_rules! object_conversions {
    ($name:ident) => {
        impl $crate::marshal::ToNative for $name {
            type Native = Option<$crate::ObjectId>;

            fn to_native(&self) -> Self::Native {
                Some($crate::EngineClass::instance_id(self))
            }
        }

        impl $crate::marshal::ToNative for Option<$name> {
            type Native = Option<$crate::ObjectId>;

            fn to_native(&self) -> Self::Native {
                self.as_ref().map($crate::EngineClass::instance_id)
            }
        }

        impl $crate::marshal::FromNative for $name {
            type Native = Option<$crate::ObjectId>;

            fn from_native(
                native: Self::Native,
                bridge: &::std::sync::Arc<$crate::Bridge>,
            ) -> Result<Self, $crate::ConversionError> {
                let id = native.ok_or($crate::ConversionError::NullObject {
                    expected: <$name as $crate::EngineClass>::CLASS_NAME,
                })?;
                Ok(<$name as $crate::EngineClass>::from_raw($crate::RawObject::new(
                    bridge.clone(),
                    id,
                    <$name as $crate::EngineClass>::IS_REFCOUNTED,
                )))
            }
        }

        impl $crate::marshal::FromNative for Option<$name> {
            type Native = Option<$crate::ObjectId>;

            fn from_native(
                native: Self::Native,
                bridge: &::std::sync::Arc<$crate::Bridge>,
            ) -> Result<Self, $crate::ConversionError> {
                native
                    .map(|id| <$name as $crate::marshal::FromNative>::from_native(Some(id), bridge))
                    .transpose()
            }
        }
    };
}

/// Declare a bound class deriving from `$base`.
///
/// The invoking module must define `keys::ALL` and `fn names()`.
macro_rules! engine_class {
    (@define $(#[$attr:meta])* $name:ident : $base:ty, $refcounted:expr) => {
        $(#[$attr])*
        #[derive(Clone)]
        pub struct $name {
            base: $base,
        }

        impl $crate::EngineClass for $name {
            const CLASS_NAME: &'static str = stringify!($name);
            const IS_REFCOUNTED: bool = $refcounted;
            const METHOD_KEYS: &'static [$crate::MethodKey] = keys::ALL;

            fn names() -> &'static $crate::NameTable {
                names()
            }

            fn from_raw(raw: $crate::RawObject) -> Self {
                Self {
                    base: <$base as $crate::EngineClass>::from_raw(raw),
                }
            }

            fn raw(&self) -> &$crate::RawObject {
                <$base as $crate::EngineClass>::raw(&self.base)
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $base;

            fn deref(&self) -> &$base {
                &self.base
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("id", &$crate::EngineClass::instance_id(self))
                    .finish()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.base, f)
            }
        }

        $crate::object::object_conversions!($name);
    };
    ($(#[$attr:meta])* $name:ident : $base:ty, refcounted) => {
        $crate::object::engine_class!(@define $(#[$attr])* $name : $base, true);
    };
    ($(#[$attr:meta])* $name:ident : $base:ty) => {
        $crate::object::engine_class!(
            @define $(#[$attr])* $name : $base,
            <$base as $crate::EngineClass>::IS_REFCOUNTED
        );
    };
}

pub(crate) use {engine_class, object_conversions};
