//! `Node3D`: a node with a 3D transform.

use std::sync::{Arc, OnceLock};

use enginebridge_core::{CallError, StringName, Transform3D, Variant, Vector3};

use super::node::{Node, NodeVirtual};
use crate::marshal::{ptrcall_0, ptrcall_1, ptrcall_3};
use crate::object::engine_class;
use crate::script::DispatchVirtual;
use crate::{Bridge, EngineClass, NameTable};

pub mod property_name {
    pub const POSITION: &str = "position";
    pub const ROTATION: &str = "rotation";
    pub const SCALE: &str = "scale";
    pub const TRANSFORM: &str = "transform";
    pub const VISIBLE: &str = "visible";
}

pub mod method_name {
    pub const SET_POSITION: &str = "set_position";
    pub const GET_POSITION: &str = "get_position";
    pub const SET_ROTATION: &str = "set_rotation";
    pub const GET_ROTATION: &str = "get_rotation";
    pub const SET_SCALE: &str = "set_scale";
    pub const GET_SCALE: &str = "get_scale";
    pub const SET_TRANSFORM: &str = "set_transform";
    pub const GET_TRANSFORM: &str = "get_transform";
    pub const SET_VISIBLE: &str = "set_visible";
    pub const IS_VISIBLE: &str = "is_visible";
    pub const TRANSLATE: &str = "translate";
    pub const LOOK_AT: &str = "look_at";
}

pub mod signal_name {
    pub const VISIBILITY_CHANGED: &str = "visibility_changed";
}

pub mod keys {
    use enginebridge_core::VariantType as V;

    use crate::MethodKey;

    pub const SET_POSITION: MethodKey = MethodKey::new("Node3D", "set_position", &[V::Vector3], None);
    pub const GET_POSITION: MethodKey = MethodKey::new("Node3D", "get_position", &[], Some(V::Vector3));
    pub const SET_ROTATION: MethodKey = MethodKey::new("Node3D", "set_rotation", &[V::Vector3], None);
    pub const GET_ROTATION: MethodKey = MethodKey::new("Node3D", "get_rotation", &[], Some(V::Vector3));
    pub const SET_SCALE: MethodKey = MethodKey::new("Node3D", "set_scale", &[V::Vector3], None);
    pub const GET_SCALE: MethodKey = MethodKey::new("Node3D", "get_scale", &[], Some(V::Vector3));
    pub const SET_TRANSFORM: MethodKey = MethodKey::new("Node3D", "set_transform", &[V::Transform3D], None);
    pub const GET_TRANSFORM: MethodKey = MethodKey::new("Node3D", "get_transform", &[], Some(V::Transform3D));
    pub const SET_VISIBLE: MethodKey = MethodKey::new("Node3D", "set_visible", &[V::Bool], None);
    pub const IS_VISIBLE: MethodKey = MethodKey::new("Node3D", "is_visible", &[], Some(V::Bool));
    pub const TRANSLATE: MethodKey = MethodKey::new("Node3D", "translate", &[V::Vector3], None);
    pub const LOOK_AT: MethodKey = MethodKey::new("Node3D", "look_at", &[V::Vector3, V::Vector3, V::Bool], None);

    pub const ALL: &[MethodKey] = &[
        SET_POSITION,
        GET_POSITION,
        SET_ROTATION,
        GET_ROTATION,
        SET_SCALE,
        GET_SCALE,
        SET_TRANSFORM,
        GET_TRANSFORM,
        SET_VISIBLE,
        IS_VISIBLE,
        TRANSLATE,
        LOOK_AT,
    ];
}

pub fn names() -> &'static NameTable {
    static TABLE: OnceLock<NameTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let methods: Vec<&str> = keys::ALL.iter().map(|key| key.method).collect();
        NameTable::new("Node3D", Some(super::node::names()))
            .with_properties(&[
                property_name::POSITION,
                property_name::ROTATION,
                property_name::SCALE,
                property_name::TRANSFORM,
                property_name::VISIBLE,
            ])
            .with_methods(&methods)
            .with_signals(&[signal_name::VISIBILITY_CHANGED])
    })
}

engine_class! {
    /// A node placed in 3D space.
    Node3D: Node
}

impl Node3D {
    pub fn new(bridge: &Arc<Bridge>) -> Self {
        bridge.construct()
    }

    pub fn set_position(&self, position: Vector3) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::SET_POSITION), raw.instance(), &position)
    }

    pub fn get_position(&self) -> Vector3 {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_POSITION), raw.instance())
    }

    /// Euler angles in radians.
    pub fn set_rotation(&self, rotation: Vector3) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::SET_ROTATION), raw.instance(), &rotation)
    }

    pub fn get_rotation(&self) -> Vector3 {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_ROTATION), raw.instance())
    }

    pub fn set_scale(&self, scale: Vector3) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::SET_SCALE), raw.instance(), &scale)
    }

    pub fn get_scale(&self) -> Vector3 {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_SCALE), raw.instance())
    }

    pub fn set_transform(&self, transform: Transform3D) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::SET_TRANSFORM), raw.instance(), &transform)
    }

    pub fn get_transform(&self) -> Transform3D {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_TRANSFORM), raw.instance())
    }

    pub fn set_visible(&self, visible: bool) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::SET_VISIBLE), raw.instance(), &visible)
    }

    pub fn is_visible(&self) -> bool {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::IS_VISIBLE), raw.instance())
    }

    /// Move by `offset` in local space.
    pub fn translate(&self, offset: Vector3) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::TRANSLATE), raw.instance(), &offset)
    }

    /// Rotate to face `target`. `up` defaults to [`Vector3::UP`] and
    /// `use_model_front` to `false`.
    pub fn look_at(&self, target: Vector3, up: Option<Vector3>, use_model_front: Option<bool>) {
        let up = up.unwrap_or(Vector3::UP);
        let use_model_front = use_model_front.unwrap_or(false);
        let raw = self.raw();
        ptrcall_3(
            raw.bridge(),
            raw.bind(&keys::LOOK_AT),
            raw.instance(),
            &target,
            &up,
            &use_model_front,
        )
    }
}

impl<T: NodeVirtual> DispatchVirtual<T> for Node3D {
    fn is_virtual(method: &str) -> bool {
        <Node as DispatchVirtual<T>>::is_virtual(method)
    }

    fn invoke_virtual(
        this: &mut T,
        overrides: &[&str],
        method: &StringName,
        args: &[Variant],
    ) -> Result<Option<Variant>, CallError> {
        <Node as DispatchVirtual<T>>::invoke_virtual(this, overrides, method, args)
    }
}
