//! `AudioServer`: the engine's audio bus layout.

use std::sync::{Arc, OnceLock};

use enginebridge_core::{CallError, StringName, Variant};

use super::object::{Object, ObjectVirtual};
use crate::marshal::{ptrcall_0, ptrcall_1, ptrcall_2};
use crate::object::engine_class;
use crate::script::DispatchVirtual;
use crate::{Bridge, EngineClass, NameTable};

pub mod property_name {
    pub const BUS_COUNT: &str = "bus_count";
}

pub mod method_name {
    pub const SET_BUS_COUNT: &str = "set_bus_count";
    pub const GET_BUS_COUNT: &str = "get_bus_count";
    pub const ADD_BUS: &str = "add_bus";
    pub const REMOVE_BUS: &str = "remove_bus";
    pub const SET_BUS_NAME: &str = "set_bus_name";
    pub const GET_BUS_NAME: &str = "get_bus_name";
    pub const GET_BUS_INDEX: &str = "get_bus_index";
    pub const SET_BUS_VOLUME_DB: &str = "set_bus_volume_db";
    pub const GET_BUS_VOLUME_DB: &str = "get_bus_volume_db";
    pub const SET_BUS_MUTE: &str = "set_bus_mute";
    pub const IS_BUS_MUTE: &str = "is_bus_mute";
    pub const SET_BUS_SEND: &str = "set_bus_send";
    pub const GET_BUS_SEND: &str = "get_bus_send";
}

pub mod signal_name {
    pub const BUS_LAYOUT_CHANGED: &str = "bus_layout_changed";
    pub const BUS_RENAMED: &str = "bus_renamed";
}

pub mod keys {
    use enginebridge_core::VariantType as V;

    use crate::MethodKey;

    const CLASS: &str = "AudioServer";

    pub const SET_BUS_COUNT: MethodKey = MethodKey::new(CLASS, "set_bus_count", &[V::Int], None);
    pub const GET_BUS_COUNT: MethodKey = MethodKey::new(CLASS, "get_bus_count", &[], Some(V::Int));
    pub const ADD_BUS: MethodKey = MethodKey::new(CLASS, "add_bus", &[V::Int], None);
    pub const REMOVE_BUS: MethodKey = MethodKey::new(CLASS, "remove_bus", &[V::Int], None);
    pub const SET_BUS_NAME: MethodKey = MethodKey::new(CLASS, "set_bus_name", &[V::Int, V::String], None);
    pub const GET_BUS_NAME: MethodKey = MethodKey::new(CLASS, "get_bus_name", &[V::Int], Some(V::String));
    pub const GET_BUS_INDEX: MethodKey = MethodKey::new(CLASS, "get_bus_index", &[V::StringName], Some(V::Int));
    pub const SET_BUS_VOLUME_DB: MethodKey = MethodKey::new(CLASS, "set_bus_volume_db", &[V::Int, V::Float], None);
    pub const GET_BUS_VOLUME_DB: MethodKey = MethodKey::new(CLASS, "get_bus_volume_db", &[V::Int], Some(V::Float));
    pub const SET_BUS_MUTE: MethodKey = MethodKey::new(CLASS, "set_bus_mute", &[V::Int, V::Bool], None);
    pub const IS_BUS_MUTE: MethodKey = MethodKey::new(CLASS, "is_bus_mute", &[V::Int], Some(V::Bool));
    pub const SET_BUS_SEND: MethodKey = MethodKey::new(CLASS, "set_bus_send", &[V::Int, V::StringName], None);
    pub const GET_BUS_SEND: MethodKey = MethodKey::new(CLASS, "get_bus_send", &[V::Int], Some(V::StringName));

    pub const ALL: &[MethodKey] = &[
        SET_BUS_COUNT,
        GET_BUS_COUNT,
        ADD_BUS,
        REMOVE_BUS,
        SET_BUS_NAME,
        GET_BUS_NAME,
        GET_BUS_INDEX,
        SET_BUS_VOLUME_DB,
        GET_BUS_VOLUME_DB,
        SET_BUS_MUTE,
        IS_BUS_MUTE,
        SET_BUS_SEND,
        GET_BUS_SEND,
    ];
}

pub fn names() -> &'static NameTable {
    static TABLE: OnceLock<NameTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let methods: Vec<&str> = keys::ALL.iter().map(|key| key.method).collect();
        NameTable::new("AudioServer", Some(super::object::names()))
            .with_properties(&[property_name::BUS_COUNT])
            .with_methods(&methods)
            .with_signals(&[signal_name::BUS_LAYOUT_CHANGED, signal_name::BUS_RENAMED])
    })
}

engine_class! {
    /// Server for audio buses. Bus 0 is always `Master`.
    AudioServer: Object
}

impl AudioServer {
    pub fn singleton(bridge: &Arc<Bridge>) -> Self {
        bridge.singleton()
    }

    pub fn set_bus_count(&self, amount: i32) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::SET_BUS_COUNT), raw.instance(), &amount)
    }

    pub fn get_bus_count(&self) -> i32 {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_BUS_COUNT), raw.instance())
    }

    /// Insert a bus at `at_position`. The default of `-1` appends.
    pub fn add_bus(&self, at_position: Option<i32>) {
        let at_position = at_position.unwrap_or(-1);
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::ADD_BUS), raw.instance(), &at_position)
    }

    pub fn remove_bus(&self, index: i32) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::REMOVE_BUS), raw.instance(), &index)
    }

    pub fn set_bus_name(&self, bus_idx: i32, name: &str) {
        let raw = self.raw();
        ptrcall_2(raw.bridge(), raw.bind(&keys::SET_BUS_NAME), raw.instance(), &bus_idx, name)
    }

    pub fn get_bus_name(&self, bus_idx: i32) -> String {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::GET_BUS_NAME), raw.instance(), &bus_idx)
    }

    /// Index of the bus called `bus_name`, or `-1`.
    pub fn get_bus_index(&self, bus_name: impl Into<StringName>) -> i32 {
        let bus_name = bus_name.into();
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::GET_BUS_INDEX), raw.instance(), &bus_name)
    }

    pub fn set_bus_volume_db(&self, bus_idx: i32, volume_db: f32) {
        let raw = self.raw();
        ptrcall_2(raw.bridge(), raw.bind(&keys::SET_BUS_VOLUME_DB), raw.instance(), &bus_idx, &volume_db)
    }

    pub fn get_bus_volume_db(&self, bus_idx: i32) -> f32 {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::GET_BUS_VOLUME_DB), raw.instance(), &bus_idx)
    }

    pub fn set_bus_mute(&self, bus_idx: i32, enable: bool) {
        let raw = self.raw();
        ptrcall_2(raw.bridge(), raw.bind(&keys::SET_BUS_MUTE), raw.instance(), &bus_idx, &enable)
    }

    pub fn is_bus_mute(&self, bus_idx: i32) -> bool {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::IS_BUS_MUTE), raw.instance(), &bus_idx)
    }

    /// Route the output of `bus_idx` into the bus named `send`.
    pub fn set_bus_send(&self, bus_idx: i32, send: impl Into<StringName>) {
        let send = send.into();
        let raw = self.raw();
        ptrcall_2(raw.bridge(), raw.bind(&keys::SET_BUS_SEND), raw.instance(), &bus_idx, &send)
    }

    pub fn get_bus_send(&self, bus_idx: i32) -> StringName {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::GET_BUS_SEND), raw.instance(), &bus_idx)
    }
}

impl<T: ObjectVirtual> DispatchVirtual<T> for AudioServer {
    fn is_virtual(method: &str) -> bool {
        <Object as DispatchVirtual<T>>::is_virtual(method)
    }

    fn invoke_virtual(
        this: &mut T,
        overrides: &[&str],
        method: &StringName,
        args: &[Variant],
    ) -> Result<Option<Variant>, CallError> {
        <Object as DispatchVirtual<T>>::invoke_virtual(this, overrides, method, args)
    }
}
