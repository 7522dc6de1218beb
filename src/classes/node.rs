//! `Node`: an element of the scene tree.

use std::sync::{Arc, OnceLock};

use enginebridge_core::{CallError, StringName, ToVariant, Variant};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use super::object::{Object, ObjectVirtual};
use crate::marshal::{native_enum, ptrcall_0, ptrcall_1, ptrcall_2, ptrcall_3};
use crate::object::engine_class;
use crate::script::{DispatchVirtual, is_declared, virtual_arg};
use crate::{Bridge, EngineClass, NameTable};

pub mod property_name {
    pub const NAME: &str = "name";
}

pub mod method_name {
    pub const SET_NAME: &str = "set_name";
    pub const GET_NAME: &str = "get_name";
    pub const ADD_CHILD: &str = "add_child";
    pub const REMOVE_CHILD: &str = "remove_child";
    pub const GET_CHILD_COUNT: &str = "get_child_count";
    pub const GET_CHILD: &str = "get_child";
    pub const GET_PARENT: &str = "get_parent";
    pub const QUEUE_FREE: &str = "queue_free";
    pub const _READY: &str = "_ready";
    pub const _PROCESS: &str = "_process";
    pub const _PHYSICS_PROCESS: &str = "_physics_process";
    pub const _ENTER_TREE: &str = "_enter_tree";
    pub const _EXIT_TREE: &str = "_exit_tree";
    pub const _GET_CONFIGURATION_WARNINGS: &str = "_get_configuration_warnings";
}

pub mod signal_name {
    pub const READY: &str = "ready";
    pub const TREE_ENTERED: &str = "tree_entered";
    pub const TREE_EXITING: &str = "tree_exiting";
    pub const TREE_EXITED: &str = "tree_exited";
    pub const CHILD_ENTERED_TREE: &str = "child_entered_tree";
    pub const RENAMED: &str = "renamed";
}

pub mod keys {
    use enginebridge_core::VariantType as V;

    use crate::MethodKey;

    pub const SET_NAME: MethodKey = MethodKey::new("Node", "set_name", &[V::StringName], None);
    pub const GET_NAME: MethodKey = MethodKey::new("Node", "get_name", &[], Some(V::StringName));
    pub const ADD_CHILD: MethodKey = MethodKey::new("Node", "add_child", &[V::Object, V::Bool, V::Int], None);
    pub const REMOVE_CHILD: MethodKey = MethodKey::new("Node", "remove_child", &[V::Object], None);
    pub const GET_CHILD_COUNT: MethodKey = MethodKey::new("Node", "get_child_count", &[V::Bool], Some(V::Int));
    pub const GET_CHILD: MethodKey = MethodKey::new("Node", "get_child", &[V::Int, V::Bool], Some(V::Object));
    pub const GET_PARENT: MethodKey = MethodKey::new("Node", "get_parent", &[], Some(V::Object));
    pub const QUEUE_FREE: MethodKey = MethodKey::new("Node", "queue_free", &[], None);

    pub const ALL: &[MethodKey] = &[
        SET_NAME,
        GET_NAME,
        ADD_CHILD,
        REMOVE_CHILD,
        GET_CHILD_COUNT,
        GET_CHILD,
        GET_PARENT,
        QUEUE_FREE,
    ];
}

const VIRTUALS: &[&str] = &[
    method_name::_READY,
    method_name::_PROCESS,
    method_name::_PHYSICS_PROCESS,
    method_name::_ENTER_TREE,
    method_name::_EXIT_TREE,
    method_name::_GET_CONFIGURATION_WARNINGS,
];

pub fn names() -> &'static NameTable {
    static TABLE: OnceLock<NameTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let methods: Vec<&str> = keys::ALL.iter().map(|key| key.method).chain(VIRTUALS.iter().copied()).collect();
        NameTable::new("Node", Some(super::object::names()))
            .with_properties(&[property_name::NAME])
            .with_methods(&methods)
            .with_signals(&[
                signal_name::READY,
                signal_name::TREE_ENTERED,
                signal_name::TREE_EXITING,
                signal_name::TREE_EXITED,
                signal_name::CHILD_ENTERED_TREE,
                signal_name::RENAMED,
            ])
    })
}

/// Where `add_child` places a child among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(i64)]
pub enum InternalMode {
    #[default]
    Disabled = 0,
    Front = 1,
    Back = 2,
}

native_enum!(InternalMode);

engine_class! {
    /// Scene tree element. Owned by the tree; freed with `queue_free()` or
    /// `free()`.
    Node: Object
}

impl Node {
    pub fn new(bridge: &Arc<Bridge>) -> Self {
        bridge.construct()
    }

    pub fn set_name(&self, name: impl Into<StringName>) {
        let name = name.into();
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::SET_NAME), raw.instance(), &name)
    }

    pub fn get_name(&self) -> StringName {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_NAME), raw.instance())
    }

    /// Add `node` as the last child. `force_readable_name` defaults to
    /// `false` and `internal` to [`InternalMode::Disabled`].
    pub fn add_child(&self, node: &Node, force_readable_name: Option<bool>, internal: Option<InternalMode>) {
        let force_readable_name = force_readable_name.unwrap_or(false);
        let internal = internal.unwrap_or(InternalMode::Disabled);
        let raw = self.raw();
        ptrcall_3(
            raw.bridge(),
            raw.bind(&keys::ADD_CHILD),
            raw.instance(),
            node,
            &force_readable_name,
            &internal,
        )
    }

    pub fn remove_child(&self, node: &Node) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::REMOVE_CHILD), raw.instance(), node)
    }

    /// `include_internal` defaults to `false`.
    pub fn get_child_count(&self, include_internal: Option<bool>) -> i32 {
        let include_internal = include_internal.unwrap_or(false);
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::GET_CHILD_COUNT), raw.instance(), &include_internal)
    }

    /// Child at `idx`; negative indices count from the end.
    pub fn get_child(&self, idx: i32, include_internal: Option<bool>) -> Option<Node> {
        let include_internal = include_internal.unwrap_or(false);
        let raw = self.raw();
        ptrcall_2(raw.bridge(), raw.bind(&keys::GET_CHILD), raw.instance(), &idx, &include_internal)
    }

    pub fn get_parent(&self) -> Option<Node> {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_PARENT), raw.instance())
    }

    /// Free the node at the end of the frame.
    pub fn queue_free(&self) {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::QUEUE_FREE), raw.instance())
    }
}

/// Overridable callbacks of `Node`.
#[allow(unused_variables)]
pub trait NodeVirtual: ObjectVirtual {
    /// Called once the node and all its children are in the tree.
    fn _ready(&mut self) {}

    fn _process(&mut self, delta: f64) {}

    fn _physics_process(&mut self, delta: f64) {}

    fn _enter_tree(&mut self) {}

    fn _exit_tree(&mut self) {}

    /// Warnings shown for the node in the editor.
    fn _get_configuration_warnings(&mut self) -> Vec<String> {
        Vec::new()
    }
}

impl<T: NodeVirtual> DispatchVirtual<T> for Node {
    fn is_virtual(method: &str) -> bool {
        is_declared(VIRTUALS, method) || <Object as DispatchVirtual<T>>::is_virtual(method)
    }

    fn invoke_virtual(
        this: &mut T,
        overrides: &[&str],
        method: &StringName,
        args: &[Variant],
    ) -> Result<Option<Variant>, CallError> {
        if is_declared(overrides, method.as_str()) {
            match (method.as_str(), args.len()) {
                ("_ready", 0) => {
                    this._ready();
                    return Ok(Some(Variant::Nil));
                }
                ("_process", 1) => {
                    this._process(virtual_arg(method, args, 0)?);
                    return Ok(Some(Variant::Nil));
                }
                ("_physics_process", 1) => {
                    this._physics_process(virtual_arg(method, args, 0)?);
                    return Ok(Some(Variant::Nil));
                }
                ("_enter_tree", 0) => {
                    this._enter_tree();
                    return Ok(Some(Variant::Nil));
                }
                ("_exit_tree", 0) => {
                    this._exit_tree();
                    return Ok(Some(Variant::Nil));
                }
                ("_get_configuration_warnings", 0) => {
                    return Ok(Some(this._get_configuration_warnings().to_variant()));
                }
                _ => {}
            }
        }
        <Object as DispatchVirtual<T>>::invoke_virtual(this, overrides, method, args)
    }
}
