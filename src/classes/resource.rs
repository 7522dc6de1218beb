//! `Resource`: reference-counted engine data.

use std::sync::{Arc, OnceLock};

use enginebridge_core::{CallError, StringName, Variant};

use super::object::ObjectVirtual;
use super::ref_counted::RefCounted;
use crate::marshal::{ptrcall_0, ptrcall_1};
use crate::object::engine_class;
use crate::script::{DispatchVirtual, is_declared};
use crate::{Bridge, EngineClass, NameTable};

pub mod property_name {
    pub const RESOURCE_NAME: &str = "resource_name";
    pub const RESOURCE_PATH: &str = "resource_path";
}

pub mod method_name {
    pub const SET_NAME: &str = "set_name";
    pub const GET_NAME: &str = "get_name";
    pub const SET_PATH: &str = "set_path";
    pub const GET_PATH: &str = "get_path";
    pub const EMIT_CHANGED: &str = "emit_changed";
    pub const SETUP_LOCAL_TO_SCENE: &str = "setup_local_to_scene";
    pub const _SETUP_LOCAL_TO_SCENE: &str = "_setup_local_to_scene";
}

pub mod signal_name {
    pub const CHANGED: &str = "changed";
    pub const SETUP_LOCAL_TO_SCENE_REQUESTED: &str = "setup_local_to_scene_requested";
}

pub mod keys {
    use enginebridge_core::VariantType as V;

    use crate::MethodKey;

    pub const SET_NAME: MethodKey = MethodKey::new("Resource", "set_name", &[V::String], None);
    pub const GET_NAME: MethodKey = MethodKey::new("Resource", "get_name", &[], Some(V::String));
    pub const SET_PATH: MethodKey = MethodKey::new("Resource", "set_path", &[V::String], None);
    pub const GET_PATH: MethodKey = MethodKey::new("Resource", "get_path", &[], Some(V::String));
    pub const EMIT_CHANGED: MethodKey = MethodKey::new("Resource", "emit_changed", &[], None);
    pub const SETUP_LOCAL_TO_SCENE: MethodKey = MethodKey::new("Resource", "setup_local_to_scene", &[], None);

    pub const ALL: &[MethodKey] = &[SET_NAME, GET_NAME, SET_PATH, GET_PATH, EMIT_CHANGED, SETUP_LOCAL_TO_SCENE];
}

const VIRTUALS: &[&str] = &[method_name::_SETUP_LOCAL_TO_SCENE];

pub fn names() -> &'static NameTable {
    static TABLE: OnceLock<NameTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        NameTable::new("Resource", Some(super::ref_counted::names()))
            .with_properties(&[property_name::RESOURCE_NAME, property_name::RESOURCE_PATH])
            .with_methods(&[
                method_name::SET_NAME,
                method_name::GET_NAME,
                method_name::SET_PATH,
                method_name::GET_PATH,
                method_name::EMIT_CHANGED,
                method_name::SETUP_LOCAL_TO_SCENE,
                method_name::_SETUP_LOCAL_TO_SCENE,
            ])
            .with_signals(&[signal_name::CHANGED, signal_name::SETUP_LOCAL_TO_SCENE_REQUESTED])
    })
}

engine_class! {
    /// Serializable, shareable engine data.
    Resource: RefCounted
}

impl Resource {
    pub fn new(bridge: &Arc<Bridge>) -> Self {
        bridge.construct()
    }

    pub fn set_name(&self, name: &str) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::SET_NAME), raw.instance(), name)
    }

    pub fn get_name(&self) -> String {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_NAME), raw.instance())
    }

    pub fn set_path(&self, path: &str) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::SET_PATH), raw.instance(), path)
    }

    pub fn get_path(&self) -> String {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_PATH), raw.instance())
    }

    /// Emit `changed`.
    pub fn emit_changed(&self) {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::EMIT_CHANGED), raw.instance())
    }

    pub fn setup_local_to_scene(&self) {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::SETUP_LOCAL_TO_SCENE), raw.instance())
    }
}

/// Overridable callbacks of `Resource`.
pub trait ResourceVirtual: ObjectVirtual {
    /// Called when a scene-local copy of the resource is set up.
    fn _setup_local_to_scene(&mut self) {}
}

impl<T: ResourceVirtual> DispatchVirtual<T> for Resource {
    fn is_virtual(method: &str) -> bool {
        is_declared(VIRTUALS, method) || <RefCounted as DispatchVirtual<T>>::is_virtual(method)
    }

    fn invoke_virtual(
        this: &mut T,
        overrides: &[&str],
        method: &StringName,
        args: &[Variant],
    ) -> Result<Option<Variant>, CallError> {
        if is_declared(overrides, method.as_str())
            && let ("_setup_local_to_scene", 0) = (method.as_str(), args.len())
        {
            this._setup_local_to_scene();
            return Ok(Some(Variant::Nil));
        }
        <RefCounted as DispatchVirtual<T>>::invoke_virtual(this, overrides, method, args)
    }
}
