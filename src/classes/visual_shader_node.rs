//! `VisualShaderNode`: base of all nodes in a visual shader graph.

use std::sync::{Arc, OnceLock};

use enginebridge_core::{CallError, StringName, ToVariant, Variant};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use super::resource::{Resource, ResourceVirtual};
use crate::marshal::{native_enum, ptrcall_0, ptrcall_1, ptrcall_3};
use crate::object::engine_class;
use crate::script::DispatchVirtual;
use crate::{Bridge, EngineClass, NameTable};

pub mod property_name {
    pub const OUTPUT_PORT_FOR_PREVIEW: &str = "output_port_for_preview";
    pub const DEFAULT_INPUT_VALUES: &str = "default_input_values";
}

pub mod method_name {
    pub const SET_OUTPUT_PORT_FOR_PREVIEW: &str = "set_output_port_for_preview";
    pub const GET_OUTPUT_PORT_FOR_PREVIEW: &str = "get_output_port_for_preview";
    pub const SET_INPUT_PORT_DEFAULT_VALUE: &str = "set_input_port_default_value";
    pub const GET_INPUT_PORT_DEFAULT_VALUE: &str = "get_input_port_default_value";
    pub const REMOVE_INPUT_PORT_DEFAULT_VALUE: &str = "remove_input_port_default_value";
    pub const CLEAR_DEFAULT_INPUT_VALUES: &str = "clear_default_input_values";
}

pub mod signal_name {
    pub const EDITOR_REFRESH_REQUEST: &str = "editor_refresh_request";
}

pub mod keys {
    use enginebridge_core::VariantType as V;

    use crate::MethodKey;

    const CLASS: &str = "VisualShaderNode";

    pub const SET_OUTPUT_PORT_FOR_PREVIEW: MethodKey =
        MethodKey::new(CLASS, "set_output_port_for_preview", &[V::Int], None);
    pub const GET_OUTPUT_PORT_FOR_PREVIEW: MethodKey =
        MethodKey::new(CLASS, "get_output_port_for_preview", &[], Some(V::Int));
    pub const SET_INPUT_PORT_DEFAULT_VALUE: MethodKey =
        MethodKey::new(CLASS, "set_input_port_default_value", &[V::Int, V::Nil, V::Nil], None);
    pub const GET_INPUT_PORT_DEFAULT_VALUE: MethodKey =
        MethodKey::new(CLASS, "get_input_port_default_value", &[V::Int], Some(V::Nil));
    pub const REMOVE_INPUT_PORT_DEFAULT_VALUE: MethodKey =
        MethodKey::new(CLASS, "remove_input_port_default_value", &[V::Int], None);
    pub const CLEAR_DEFAULT_INPUT_VALUES: MethodKey = MethodKey::new(CLASS, "clear_default_input_values", &[], None);

    pub const ALL: &[MethodKey] = &[
        SET_OUTPUT_PORT_FOR_PREVIEW,
        GET_OUTPUT_PORT_FOR_PREVIEW,
        SET_INPUT_PORT_DEFAULT_VALUE,
        GET_INPUT_PORT_DEFAULT_VALUE,
        REMOVE_INPUT_PORT_DEFAULT_VALUE,
        CLEAR_DEFAULT_INPUT_VALUES,
    ];
}

pub fn names() -> &'static NameTable {
    static TABLE: OnceLock<NameTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let methods: Vec<&str> = keys::ALL.iter().map(|key| key.method).collect();
        NameTable::new("VisualShaderNode", Some(super::resource::names()))
            .with_properties(&[
                property_name::OUTPUT_PORT_FOR_PREVIEW,
                property_name::DEFAULT_INPUT_VALUES,
            ])
            .with_methods(&methods)
            .with_signals(&[signal_name::EDITOR_REFRESH_REQUEST])
    })
}

/// Data type carried by a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(i64)]
pub enum PortType {
    #[default]
    Scalar = 0,
    ScalarInt = 1,
    ScalarUint = 2,
    Vector2d = 3,
    Vector3d = 4,
    Vector4d = 5,
    Boolean = 6,
    Transform = 7,
    Sampler = 8,
    Max = 9,
}

native_enum!(PortType);

engine_class! {
    /// A node of a visual shader graph.
    VisualShaderNode: Resource
}

impl VisualShaderNode {
    pub fn new(bridge: &Arc<Bridge>) -> Self {
        bridge.construct()
    }

    /// Output port shown in the editor preview, or `-1` for none.
    pub fn set_output_port_for_preview(&self, port: i32) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::SET_OUTPUT_PORT_FOR_PREVIEW), raw.instance(), &port)
    }

    pub fn get_output_port_for_preview(&self) -> i32 {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_OUTPUT_PORT_FOR_PREVIEW), raw.instance())
    }

    /// Value used by `port` while nothing is connected to it.
    /// `prev_value` defaults to nil.
    pub fn set_input_port_default_value(&self, port: i32, value: impl ToVariant, prev_value: Option<Variant>) {
        let value = value.to_variant();
        let prev_value = prev_value.unwrap_or(Variant::Nil);
        let raw = self.raw();
        ptrcall_3(
            raw.bridge(),
            raw.bind(&keys::SET_INPUT_PORT_DEFAULT_VALUE),
            raw.instance(),
            &port,
            &value,
            &prev_value,
        )
    }

    pub fn get_input_port_default_value(&self, port: i32) -> Variant {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::GET_INPUT_PORT_DEFAULT_VALUE), raw.instance(), &port)
    }

    pub fn remove_input_port_default_value(&self, port: i32) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::REMOVE_INPUT_PORT_DEFAULT_VALUE), raw.instance(), &port)
    }

    pub fn clear_default_input_values(&self) {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::CLEAR_DEFAULT_INPUT_VALUES), raw.instance())
    }
}

impl<T: ResourceVirtual> DispatchVirtual<T> for VisualShaderNode {
    fn is_virtual(method: &str) -> bool {
        <Resource as DispatchVirtual<T>>::is_virtual(method)
    }

    fn invoke_virtual(
        this: &mut T,
        overrides: &[&str],
        method: &StringName,
        args: &[Variant],
    ) -> Result<Option<Variant>, CallError> {
        <Resource as DispatchVirtual<T>>::invoke_virtual(this, overrides, method, args)
    }
}
