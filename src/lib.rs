//! Managed-side glue for a native game engine.
//!
//! `enginebridge` lets Rust code drive engine objects and lets the engine
//! call back into Rust script classes. It is organised in layers:
//!
//! - [`Bridge`]: resolves class tags, method binds and singletons through a
//!   [`NativeRuntime`] and caches them by name hash.
//! - [`marshal`]: typed pointer calls (`ptrcall_0` to `ptrcall_6`) and the
//!   variant call convention.
//! - [`classes`]: typed wrappers for engine classes, with literal defaults
//!   for optional parameters.
//! - [`ScriptClass`] / [`ScriptObject`]: managed classes extending an engine
//!   class, dispatched from the engine through their instance binding.
//! - [`NameTable`]: interned property, method and signal names with
//!   inherited lookup.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use enginebridge::classes::Node;
//! use enginebridge::Bridge;
//! use enginebridge_classdb::ClassDb;
//!
//! let db = Arc::new(ClassDb::with_core_classes().expect("core classes"));
//! let bridge = Bridge::new(db);
//!
//! let parent = Node::new(&bridge);
//! let child = Node::new(&bridge);
//! parent.add_child(&child, None, None);
//!
//! assert_eq!(parent.get_child_count(None), 1);
//! ```

extern crate self as enginebridge;

mod bridge;
pub mod classes;
mod config;
mod error;
pub mod marshal;
mod names;
mod object;
mod script;

pub use bridge::{Bridge, BridgeStats, global, initialize};
pub use config::BridgeConfig;
pub use error::BindError;
pub use marshal::{FromNative, MethodKey, ToNative};
pub use names::{NameTable, script_names};
pub use object::{EngineClass, RawObject};
pub use script::{Base, DispatchVirtual, ScriptBinding, ScriptClass, ScriptMethods, ScriptObject, is_declared, virtual_arg};

pub use enginebridge_core::{
    Basis, BindHash, CallError, CallErrorKind, Callable, ClassTag, Color, ConnectFlags, ConversionError, Dictionary,
    EngineError, FromVariant, InstanceBinding, MethodBind, MethodFlags, NativeRuntime, NodePath, ObjectId, Rect2,
    Rect2i, Rid, StringName, ToVariant, Transform2D, Transform3D, Variant, VariantType, Vector2, Vector2i, Vector3,
    Vector3i, method_compat_hash,
};
pub use enginebridge_macros::ScriptClass;

/// Everything a script class usually needs.
pub mod prelude {
    pub use crate::classes::*;
    pub use crate::{
        Base, Bridge, BridgeConfig, CallError, EngineClass, FromVariant, ScriptClass, ScriptMethods, ScriptObject,
        StringName, ToVariant, Transform3D, Variant, Vector2, Vector2i, Vector3,
    };
}
