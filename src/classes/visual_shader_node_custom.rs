//! `VisualShaderNodeCustom`: visual shader nodes defined by scripts.
//!
//! The engine asks the script for the node's ports and generated code
//! through the virtual methods of [`VisualShaderNodeCustomVirtual`].

use std::sync::{Arc, OnceLock};

use enginebridge_core::{CallError, StringName, ToVariant, Variant};

use super::resource::ResourceVirtual;
use super::visual_shader_node::{PortType, VisualShaderNode};
use crate::marshal::ptrcall_1;
use crate::object::engine_class;
use crate::script::{DispatchVirtual, is_declared, virtual_arg};
use crate::{Bridge, EngineClass, NameTable};

pub mod method_name {
    pub const GET_OPTION_INDEX: &str = "get_option_index";
    pub const _GET_NAME: &str = "_get_name";
    pub const _GET_DESCRIPTION: &str = "_get_description";
    pub const _GET_CATEGORY: &str = "_get_category";
    pub const _GET_RETURN_ICON_TYPE: &str = "_get_return_icon_type";
    pub const _GET_INPUT_PORT_COUNT: &str = "_get_input_port_count";
    pub const _GET_INPUT_PORT_NAME: &str = "_get_input_port_name";
    pub const _GET_INPUT_PORT_TYPE: &str = "_get_input_port_type";
    pub const _GET_OUTPUT_PORT_COUNT: &str = "_get_output_port_count";
    pub const _GET_OUTPUT_PORT_NAME: &str = "_get_output_port_name";
    pub const _GET_OUTPUT_PORT_TYPE: &str = "_get_output_port_type";
    pub const _GET_CODE: &str = "_get_code";
    pub const _IS_AVAILABLE: &str = "_is_available";
}

pub mod keys {
    use enginebridge_core::VariantType as V;

    use crate::MethodKey;

    pub const GET_OPTION_INDEX: MethodKey =
        MethodKey::new("VisualShaderNodeCustom", "get_option_index", &[V::Int], Some(V::Int));

    pub const ALL: &[MethodKey] = &[GET_OPTION_INDEX];
}

const VIRTUALS: &[&str] = &[
    method_name::_GET_NAME,
    method_name::_GET_DESCRIPTION,
    method_name::_GET_CATEGORY,
    method_name::_GET_RETURN_ICON_TYPE,
    method_name::_GET_INPUT_PORT_COUNT,
    method_name::_GET_INPUT_PORT_NAME,
    method_name::_GET_INPUT_PORT_TYPE,
    method_name::_GET_OUTPUT_PORT_COUNT,
    method_name::_GET_OUTPUT_PORT_NAME,
    method_name::_GET_OUTPUT_PORT_TYPE,
    method_name::_GET_CODE,
    method_name::_IS_AVAILABLE,
];

pub fn names() -> &'static NameTable {
    static TABLE: OnceLock<NameTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let methods: Vec<&str> = keys::ALL.iter().map(|key| key.method).chain(VIRTUALS.iter().copied()).collect();
        NameTable::new("VisualShaderNodeCustom", Some(super::visual_shader_node::names())).with_methods(&methods)
    })
}

engine_class! {
    /// Base for script-defined visual shader nodes.
    VisualShaderNodeCustom: VisualShaderNode
}

impl VisualShaderNodeCustom {
    pub fn new(bridge: &Arc<Bridge>) -> Self {
        bridge.construct()
    }

    /// Selected index of the drop-down option at `option`.
    pub fn get_option_index(&self, option: i32) -> i32 {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::GET_OPTION_INDEX), raw.instance(), &option)
    }
}

/// Overridable callbacks of `VisualShaderNodeCustom`.
#[allow(unused_variables)]
pub trait VisualShaderNodeCustomVirtual: ResourceVirtual {
    /// Name shown in the member dialog and graph.
    fn _get_name(&mut self) -> String {
        String::new()
    }

    fn _get_description(&mut self) -> String {
        String::new()
    }

    /// Slash-separated path in the member dialog, e.g. `"Color/Adjust"`.
    fn _get_category(&mut self) -> String {
        String::new()
    }

    fn _get_return_icon_type(&mut self) -> PortType {
        PortType::Max
    }

    fn _get_input_port_count(&mut self) -> i32 {
        0
    }

    fn _get_input_port_name(&mut self, port: i32) -> String {
        String::new()
    }

    fn _get_input_port_type(&mut self, port: i32) -> PortType {
        PortType::Scalar
    }

    fn _get_output_port_count(&mut self) -> i32 {
        0
    }

    fn _get_output_port_name(&mut self, port: i32) -> String {
        String::new()
    }

    fn _get_output_port_type(&mut self, port: i32) -> PortType {
        PortType::Scalar
    }

    /// Shader code for the node. `input_vars` and `output_vars` hold the
    /// variable names bound to each port.
    fn _get_code(&mut self, input_vars: Vec<String>, output_vars: Vec<String>, mode: i64, shader_type: i64) -> String {
        String::new()
    }

    /// Whether the node is offered for the given shader mode and type.
    fn _is_available(&mut self, mode: i64, shader_type: i64) -> bool {
        true
    }
}

impl<T: VisualShaderNodeCustomVirtual> DispatchVirtual<T> for VisualShaderNodeCustom {
    fn is_virtual(method: &str) -> bool {
        is_declared(VIRTUALS, method) || <VisualShaderNode as DispatchVirtual<T>>::is_virtual(method)
    }

    fn invoke_virtual(
        this: &mut T,
        overrides: &[&str],
        method: &StringName,
        args: &[Variant],
    ) -> Result<Option<Variant>, CallError> {
        if is_declared(overrides, method.as_str()) {
            let ret = match (method.as_str(), args.len()) {
                ("_get_name", 0) => Some(this._get_name().to_variant()),
                ("_get_description", 0) => Some(this._get_description().to_variant()),
                ("_get_category", 0) => Some(this._get_category().to_variant()),
                ("_get_return_icon_type", 0) => Some(this._get_return_icon_type().to_variant()),
                ("_get_input_port_count", 0) => Some(this._get_input_port_count().to_variant()),
                ("_get_input_port_name", 1) => Some(this._get_input_port_name(virtual_arg(method, args, 0)?).to_variant()),
                ("_get_input_port_type", 1) => Some(this._get_input_port_type(virtual_arg(method, args, 0)?).to_variant()),
                ("_get_output_port_count", 0) => Some(this._get_output_port_count().to_variant()),
                ("_get_output_port_name", 1) => {
                    Some(this._get_output_port_name(virtual_arg(method, args, 0)?).to_variant())
                }
                ("_get_output_port_type", 1) => {
                    Some(this._get_output_port_type(virtual_arg(method, args, 0)?).to_variant())
                }
                ("_get_code", 4) => Some(
                    this._get_code(
                        virtual_arg(method, args, 0)?,
                        virtual_arg(method, args, 1)?,
                        virtual_arg(method, args, 2)?,
                        virtual_arg(method, args, 3)?,
                    )
                    .to_variant(),
                ),
                ("_is_available", 2) => {
                    Some(this._is_available(virtual_arg(method, args, 0)?, virtual_arg(method, args, 1)?).to_variant())
                }
                _ => None,
            };
            if ret.is_some() {
                return Ok(ret);
            }
        }
        <VisualShaderNode as DispatchVirtual<T>>::invoke_virtual(this, overrides, method, args)
    }
}
