//! `PhysicsServer3D`: the engine's 3D physics backend.
//!
//! A singleton. Bodies and shapes live on the server and are addressed by
//! [`Rid`].

use std::sync::{Arc, OnceLock};

use bitflags::bitflags;
use enginebridge_core::{CallError, Rid, StringName, ToVariant, Transform3D, Variant};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use super::object::{Object, ObjectVirtual};
use crate::marshal::{native_bitflags, native_enum, ptrcall_0, ptrcall_1, ptrcall_2, ptrcall_3, ptrcall_4};
use crate::object::engine_class;
use crate::script::DispatchVirtual;
use crate::{Bridge, EngineClass, NameTable};

pub mod method_name {
    pub const BODY_CREATE: &str = "body_create";
    pub const BODY_SET_MODE: &str = "body_set_mode";
    pub const BODY_GET_MODE: &str = "body_get_mode";
    pub const BODY_ADD_SHAPE: &str = "body_add_shape";
    pub const BODY_GET_SHAPE_COUNT: &str = "body_get_shape_count";
    pub const BODY_GET_SHAPE_TRANSFORM: &str = "body_get_shape_transform";
    pub const BODY_SET_SHAPE_DISABLED: &str = "body_set_shape_disabled";
    pub const BODY_SET_AXIS_LOCK: &str = "body_set_axis_lock";
    pub const BODY_IS_AXIS_LOCKED: &str = "body_is_axis_locked";
    pub const BOX_SHAPE_CREATE: &str = "box_shape_create";
    pub const SPHERE_SHAPE_CREATE: &str = "sphere_shape_create";
    pub const SHAPE_SET_DATA: &str = "shape_set_data";
    pub const SHAPE_GET_DATA: &str = "shape_get_data";
    pub const FREE_RID: &str = "free_rid";
}

pub mod keys {
    use enginebridge_core::VariantType as V;

    use crate::MethodKey;

    const CLASS: &str = "PhysicsServer3D";

    pub const BODY_CREATE: MethodKey = MethodKey::new(CLASS, "body_create", &[], Some(V::Rid));
    pub const BODY_SET_MODE: MethodKey = MethodKey::new(CLASS, "body_set_mode", &[V::Rid, V::Int], None);
    pub const BODY_GET_MODE: MethodKey = MethodKey::new(CLASS, "body_get_mode", &[V::Rid], Some(V::Int));
    pub const BODY_ADD_SHAPE: MethodKey =
        MethodKey::new(CLASS, "body_add_shape", &[V::Rid, V::Rid, V::Transform3D, V::Bool], None);
    pub const BODY_GET_SHAPE_COUNT: MethodKey = MethodKey::new(CLASS, "body_get_shape_count", &[V::Rid], Some(V::Int));
    pub const BODY_GET_SHAPE_TRANSFORM: MethodKey =
        MethodKey::new(CLASS, "body_get_shape_transform", &[V::Rid, V::Int], Some(V::Transform3D));
    pub const BODY_SET_SHAPE_DISABLED: MethodKey =
        MethodKey::new(CLASS, "body_set_shape_disabled", &[V::Rid, V::Int, V::Bool], None);
    pub const BODY_SET_AXIS_LOCK: MethodKey =
        MethodKey::new(CLASS, "body_set_axis_lock", &[V::Rid, V::Int, V::Bool], None);
    pub const BODY_IS_AXIS_LOCKED: MethodKey =
        MethodKey::new(CLASS, "body_is_axis_locked", &[V::Rid, V::Int], Some(V::Bool));
    pub const BOX_SHAPE_CREATE: MethodKey = MethodKey::new(CLASS, "box_shape_create", &[], Some(V::Rid));
    pub const SPHERE_SHAPE_CREATE: MethodKey = MethodKey::new(CLASS, "sphere_shape_create", &[], Some(V::Rid));
    pub const SHAPE_SET_DATA: MethodKey = MethodKey::new(CLASS, "shape_set_data", &[V::Rid, V::Nil], None);
    pub const SHAPE_GET_DATA: MethodKey = MethodKey::new(CLASS, "shape_get_data", &[V::Rid], Some(V::Nil));
    pub const FREE_RID: MethodKey = MethodKey::new(CLASS, "free_rid", &[V::Rid], None);

    pub const ALL: &[MethodKey] = &[
        BODY_CREATE,
        BODY_SET_MODE,
        BODY_GET_MODE,
        BODY_ADD_SHAPE,
        BODY_GET_SHAPE_COUNT,
        BODY_GET_SHAPE_TRANSFORM,
        BODY_SET_SHAPE_DISABLED,
        BODY_SET_AXIS_LOCK,
        BODY_IS_AXIS_LOCKED,
        BOX_SHAPE_CREATE,
        SPHERE_SHAPE_CREATE,
        SHAPE_SET_DATA,
        SHAPE_GET_DATA,
        FREE_RID,
    ];
}

pub fn names() -> &'static NameTable {
    static TABLE: OnceLock<NameTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let methods: Vec<&str> = keys::ALL.iter().map(|key| key.method).collect();
        NameTable::new("PhysicsServer3D", Some(super::object::names())).with_methods(&methods)
    })
}

/// How a body responds to forces and collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(i64)]
pub enum BodyMode {
    Static = 0,
    Kinematic = 1,
    #[default]
    Rigid = 2,
    RigidLinear = 3,
}

native_enum!(BodyMode);

bitflags! {
    /// Axes of a body's motion.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BodyAxis: u32 {
        const LINEAR_X = 1 << 0;
        const LINEAR_Y = 1 << 1;
        const LINEAR_Z = 1 << 2;
        const ANGULAR_X = 1 << 3;
        const ANGULAR_Y = 1 << 4;
        const ANGULAR_Z = 1 << 5;
    }
}

native_bitflags!(BodyAxis);

engine_class! {
    /// Server for 3D physics bodies and shapes.
    PhysicsServer3D: Object
}

impl PhysicsServer3D {
    /// The engine's physics server.
    pub fn singleton(bridge: &Arc<Bridge>) -> Self {
        bridge.singleton()
    }

    pub fn body_create(&self) -> Rid {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::BODY_CREATE), raw.instance())
    }

    pub fn body_set_mode(&self, body: Rid, mode: BodyMode) {
        let raw = self.raw();
        ptrcall_2(raw.bridge(), raw.bind(&keys::BODY_SET_MODE), raw.instance(), &body, &mode)
    }

    pub fn body_get_mode(&self, body: Rid) -> BodyMode {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::BODY_GET_MODE), raw.instance(), &body)
    }

    /// Attach `shape` to `body`. `transform` defaults to
    /// [`Transform3D::IDENTITY`] and `disabled` to `false`.
    pub fn body_add_shape(&self, body: Rid, shape: Rid, transform: Option<Transform3D>, disabled: Option<bool>) {
        let transform = transform.unwrap_or(Transform3D::IDENTITY);
        let disabled = disabled.unwrap_or(false);
        let raw = self.raw();
        ptrcall_4(
            raw.bridge(),
            raw.bind(&keys::BODY_ADD_SHAPE),
            raw.instance(),
            &body,
            &shape,
            &transform,
            &disabled,
        )
    }

    pub fn body_get_shape_count(&self, body: Rid) -> i32 {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::BODY_GET_SHAPE_COUNT), raw.instance(), &body)
    }

    pub fn body_get_shape_transform(&self, body: Rid, shape_idx: i32) -> Transform3D {
        let raw = self.raw();
        ptrcall_2(raw.bridge(), raw.bind(&keys::BODY_GET_SHAPE_TRANSFORM), raw.instance(), &body, &shape_idx)
    }

    pub fn body_set_shape_disabled(&self, body: Rid, shape_idx: i32, disabled: bool) {
        let raw = self.raw();
        ptrcall_3(
            raw.bridge(),
            raw.bind(&keys::BODY_SET_SHAPE_DISABLED),
            raw.instance(),
            &body,
            &shape_idx,
            &disabled,
        )
    }

    /// Lock or unlock motion along `axis`.
    pub fn body_set_axis_lock(&self, body: Rid, axis: BodyAxis, lock: bool) {
        let raw = self.raw();
        ptrcall_3(raw.bridge(), raw.bind(&keys::BODY_SET_AXIS_LOCK), raw.instance(), &body, &axis, &lock)
    }

    pub fn body_is_axis_locked(&self, body: Rid, axis: BodyAxis) -> bool {
        let raw = self.raw();
        ptrcall_2(raw.bridge(), raw.bind(&keys::BODY_IS_AXIS_LOCKED), raw.instance(), &body, &axis)
    }

    pub fn box_shape_create(&self) -> Rid {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::BOX_SHAPE_CREATE), raw.instance())
    }

    pub fn sphere_shape_create(&self) -> Rid {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::SPHERE_SHAPE_CREATE), raw.instance())
    }

    /// Shape parameters: half extents for boxes, radius for spheres.
    pub fn shape_set_data(&self, shape: Rid, data: impl ToVariant) {
        let data = data.to_variant();
        let raw = self.raw();
        ptrcall_2(raw.bridge(), raw.bind(&keys::SHAPE_SET_DATA), raw.instance(), &shape, &data)
    }

    pub fn shape_get_data(&self, shape: Rid) -> Variant {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::SHAPE_GET_DATA), raw.instance(), &shape)
    }

    /// Destroy a body or shape.
    pub fn free_rid(&self, rid: Rid) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::FREE_RID), raw.instance(), &rid)
    }
}

impl<T: ObjectVirtual> DispatchVirtual<T> for PhysicsServer3D {
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
