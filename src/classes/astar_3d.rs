//! `AStar3D`: A* pathfinding over a graph of points in 3D space.
//!
//! The search itself runs in the engine. Scripts can replace the cost
//! heuristics by overriding `_estimate_cost` and `_compute_cost`.

use std::sync::{Arc, OnceLock};

use enginebridge_core::{CallError, StringName, ToVariant, Variant, Vector3};

use super::object::ObjectVirtual;
use super::ref_counted::RefCounted;
use crate::marshal::{ptrcall_0, ptrcall_1, ptrcall_2, ptrcall_3};
use crate::object::engine_class;
use crate::script::{DispatchVirtual, is_declared, virtual_arg};
use crate::{Bridge, EngineClass, NameTable};

pub mod method_name {
    pub const ADD_POINT: &str = "add_point";
    pub const GET_POINT_POSITION: &str = "get_point_position";
    pub const SET_POINT_POSITION: &str = "set_point_position";
    pub const GET_POINT_WEIGHT_SCALE: &str = "get_point_weight_scale";
    pub const SET_POINT_WEIGHT_SCALE: &str = "set_point_weight_scale";
    pub const REMOVE_POINT: &str = "remove_point";
    pub const HAS_POINT: &str = "has_point";
    pub const GET_POINT_IDS: &str = "get_point_ids";
    pub const CONNECT_POINTS: &str = "connect_points";
    pub const DISCONNECT_POINTS: &str = "disconnect_points";
    pub const ARE_POINTS_CONNECTED: &str = "are_points_connected";
    pub const GET_AVAILABLE_POINT_ID: &str = "get_available_point_id";
    pub const GET_POINT_COUNT: &str = "get_point_count";
    pub const GET_CLOSEST_POINT: &str = "get_closest_point";
    pub const GET_ID_PATH: &str = "get_id_path";
    pub const GET_POINT_PATH: &str = "get_point_path";
    pub const SET_POINT_DISABLED: &str = "set_point_disabled";
    pub const IS_POINT_DISABLED: &str = "is_point_disabled";
    pub const CLEAR: &str = "clear";
    pub const _ESTIMATE_COST: &str = "_estimate_cost";
    pub const _COMPUTE_COST: &str = "_compute_cost";
}

pub mod keys {
    use enginebridge_core::VariantType as V;

    use crate::MethodKey;

    const CLASS: &str = "AStar3D";

    pub const ADD_POINT: MethodKey = MethodKey::new(CLASS, "add_point", &[V::Int, V::Vector3, V::Float], None);
    pub const GET_POINT_POSITION: MethodKey =
        MethodKey::new(CLASS, "get_point_position", &[V::Int], Some(V::Vector3));
    pub const SET_POINT_POSITION: MethodKey = MethodKey::new(CLASS, "set_point_position", &[V::Int, V::Vector3], None);
    pub const GET_POINT_WEIGHT_SCALE: MethodKey =
        MethodKey::new(CLASS, "get_point_weight_scale", &[V::Int], Some(V::Float));
    pub const SET_POINT_WEIGHT_SCALE: MethodKey =
        MethodKey::new(CLASS, "set_point_weight_scale", &[V::Int, V::Float], None);
    pub const REMOVE_POINT: MethodKey = MethodKey::new(CLASS, "remove_point", &[V::Int], None);
    pub const HAS_POINT: MethodKey = MethodKey::new(CLASS, "has_point", &[V::Int], Some(V::Bool));
    pub const GET_POINT_IDS: MethodKey = MethodKey::new(CLASS, "get_point_ids", &[], Some(V::PackedInt64Array));
    pub const CONNECT_POINTS: MethodKey = MethodKey::new(CLASS, "connect_points", &[V::Int, V::Int, V::Bool], None);
    pub const DISCONNECT_POINTS: MethodKey =
        MethodKey::new(CLASS, "disconnect_points", &[V::Int, V::Int, V::Bool], None);
    pub const ARE_POINTS_CONNECTED: MethodKey =
        MethodKey::new(CLASS, "are_points_connected", &[V::Int, V::Int, V::Bool], Some(V::Bool));
    pub const GET_AVAILABLE_POINT_ID: MethodKey =
        MethodKey::new(CLASS, "get_available_point_id", &[], Some(V::Int));
    pub const GET_POINT_COUNT: MethodKey = MethodKey::new(CLASS, "get_point_count", &[], Some(V::Int));
    pub const GET_CLOSEST_POINT: MethodKey =
        MethodKey::new(CLASS, "get_closest_point", &[V::Vector3, V::Bool], Some(V::Int));
    pub const GET_ID_PATH: MethodKey =
        MethodKey::new(CLASS, "get_id_path", &[V::Int, V::Int, V::Bool], Some(V::PackedInt64Array));
    pub const GET_POINT_PATH: MethodKey =
        MethodKey::new(CLASS, "get_point_path", &[V::Int, V::Int, V::Bool], Some(V::PackedVector3Array));
    pub const SET_POINT_DISABLED: MethodKey = MethodKey::new(CLASS, "set_point_disabled", &[V::Int, V::Bool], None);
    pub const IS_POINT_DISABLED: MethodKey = MethodKey::new(CLASS, "is_point_disabled", &[V::Int], Some(V::Bool));
    pub const CLEAR: MethodKey = MethodKey::new(CLASS, "clear", &[], None);

    pub const ALL: &[MethodKey] = &[
        ADD_POINT,
        GET_POINT_POSITION,
        SET_POINT_POSITION,
        GET_POINT_WEIGHT_SCALE,
        SET_POINT_WEIGHT_SCALE,
        REMOVE_POINT,
        HAS_POINT,
        GET_POINT_IDS,
        CONNECT_POINTS,
        DISCONNECT_POINTS,
        ARE_POINTS_CONNECTED,
        GET_AVAILABLE_POINT_ID,
        GET_POINT_COUNT,
        GET_CLOSEST_POINT,
        GET_ID_PATH,
        GET_POINT_PATH,
        SET_POINT_DISABLED,
        IS_POINT_DISABLED,
        CLEAR,
    ];
}

const VIRTUALS: &[&str] = &[method_name::_ESTIMATE_COST, method_name::_COMPUTE_COST];

pub fn names() -> &'static NameTable {
    static TABLE: OnceLock<NameTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let methods: Vec<&str> = keys::ALL.iter().map(|key| key.method).chain(VIRTUALS.iter().copied()).collect();
        NameTable::new("AStar3D", Some(super::ref_counted::names())).with_methods(&methods)
    })
}

engine_class! {
    /// Graph of weighted points searched with A*.
    AStar3D: RefCounted
}

impl AStar3D {
    pub fn new(bridge: &Arc<Bridge>) -> Self {
        bridge.construct()
    }

    /// Add a point, or move an existing one. `weight_scale` defaults to `1.0`.
    pub fn add_point(&self, id: i64, position: Vector3, weight_scale: Option<f32>) {
        let weight_scale = weight_scale.unwrap_or(1.0);
        let raw = self.raw();
        ptrcall_3(raw.bridge(), raw.bind(&keys::ADD_POINT), raw.instance(), &id, &position, &weight_scale)
    }

    pub fn get_point_position(&self, id: i64) -> Vector3 {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::GET_POINT_POSITION), raw.instance(), &id)
    }

    pub fn set_point_position(&self, id: i64, position: Vector3) {
        let raw = self.raw();
        ptrcall_2(raw.bridge(), raw.bind(&keys::SET_POINT_POSITION), raw.instance(), &id, &position)
    }

    pub fn get_point_weight_scale(&self, id: i64) -> f32 {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::GET_POINT_WEIGHT_SCALE), raw.instance(), &id)
    }

    pub fn set_point_weight_scale(&self, id: i64, weight_scale: f32) {
        let raw = self.raw();
        ptrcall_2(raw.bridge(), raw.bind(&keys::SET_POINT_WEIGHT_SCALE), raw.instance(), &id, &weight_scale)
    }

    pub fn remove_point(&self, id: i64) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::REMOVE_POINT), raw.instance(), &id)
    }

    pub fn has_point(&self, id: i64) -> bool {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::HAS_POINT), raw.instance(), &id)
    }

    pub fn get_point_ids(&self) -> Vec<i64> {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_POINT_IDS), raw.instance())
    }

    /// Connect two points. `bidirectional` defaults to `true`.
    pub fn connect_points(&self, id: i64, to_id: i64, bidirectional: Option<bool>) {
        let bidirectional = bidirectional.unwrap_or(true);
        let raw = self.raw();
        ptrcall_3(raw.bridge(), raw.bind(&keys::CONNECT_POINTS), raw.instance(), &id, &to_id, &bidirectional)
    }

    /// `bidirectional` defaults to `true`.
    pub fn disconnect_points(&self, id: i64, to_id: i64, bidirectional: Option<bool>) {
        let bidirectional = bidirectional.unwrap_or(true);
        let raw = self.raw();
        ptrcall_3(raw.bridge(), raw.bind(&keys::DISCONNECT_POINTS), raw.instance(), &id, &to_id, &bidirectional)
    }

    /// `bidirectional` defaults to `true`.
    pub fn are_points_connected(&self, id: i64, to_id: i64, bidirectional: Option<bool>) -> bool {
        let bidirectional = bidirectional.unwrap_or(true);
        let raw = self.raw();
        ptrcall_3(
            raw.bridge(),
            raw.bind(&keys::ARE_POINTS_CONNECTED),
            raw.instance(),
            &id,
            &to_id,
            &bidirectional,
        )
    }

    pub fn get_available_point_id(&self) -> i64 {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_AVAILABLE_POINT_ID), raw.instance())
    }

    pub fn get_point_count(&self) -> i64 {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_POINT_COUNT), raw.instance())
    }

    /// Id of the point nearest to `to_position`. `include_disabled`
    /// defaults to `false`.
    pub fn get_closest_point(&self, to_position: Vector3, include_disabled: Option<bool>) -> i64 {
        let include_disabled = include_disabled.unwrap_or(false);
        let raw = self.raw();
        ptrcall_2(
            raw.bridge(),
            raw.bind(&keys::GET_CLOSEST_POINT),
            raw.instance(),
            &to_position,
            &include_disabled,
        )
    }

    /// Point ids along the shortest path. `allow_partial_path` defaults to
    /// `false`.
    ///
    /// Not thread-safe: concurrent path queries on the same graph race in
    /// the engine.
    pub fn get_id_path(&self, from_id: i64, to_id: i64, allow_partial_path: Option<bool>) -> Vec<i64> {
        let allow_partial_path = allow_partial_path.unwrap_or(false);
        let raw = self.raw();
        ptrcall_3(
            raw.bridge(),
            raw.bind(&keys::GET_ID_PATH),
            raw.instance(),
            &from_id,
            &to_id,
            &allow_partial_path,
        )
    }

    /// Point positions along the shortest path. `allow_partial_path`
    /// defaults to `false`.
    ///
    /// Not thread-safe, like [`get_id_path`](Self::get_id_path).
    pub fn get_point_path(&self, from_id: i64, to_id: i64, allow_partial_path: Option<bool>) -> Vec<Vector3> {
        let allow_partial_path = allow_partial_path.unwrap_or(false);
        let raw = self.raw();
        ptrcall_3(
            raw.bridge(),
            raw.bind(&keys::GET_POINT_PATH),
            raw.instance(),
            &from_id,
            &to_id,
            &allow_partial_path,
        )
    }

    /// Exclude a point from searches. `disabled` defaults to `true`.
    pub fn set_point_disabled(&self, id: i64, disabled: Option<bool>) {
        let disabled = disabled.unwrap_or(true);
        let raw = self.raw();
        ptrcall_2(raw.bridge(), raw.bind(&keys::SET_POINT_DISABLED), raw.instance(), &id, &disabled)
    }

    pub fn is_point_disabled(&self, id: i64) -> bool {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::IS_POINT_DISABLED), raw.instance(), &id)
    }

    pub fn clear(&self) {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::CLEAR), raw.instance())
    }
}

/// Overridable cost functions of `AStar3D`.
#[allow(unused_variables)]
pub trait AStar3DVirtual: ObjectVirtual {
    /// Heuristic cost from a point to the search goal.
    fn _estimate_cost(&mut self, from_id: i64, end_id: i64) -> f64 {
        0.0
    }

    /// Cost of moving between two connected points.
    fn _compute_cost(&mut self, from_id: i64, to_id: i64) -> f64 {
        0.0
    }
}

impl<T: AStar3DVirtual> DispatchVirtual<T> for AStar3D {
    fn is_virtual(method: &str) -> bool {
        is_declared(VIRTUALS, method) || <RefCounted as DispatchVirtual<T>>::is_virtual(method)
    }

    fn invoke_virtual(
        this: &mut T,
        overrides: &[&str],
        method: &StringName,
        args: &[Variant],
    ) -> Result<Option<Variant>, CallError> {
        if is_declared(overrides, method.as_str()) {
            match (method.as_str(), args.len()) {
                ("_estimate_cost", 2) => {
                    let cost = this._estimate_cost(virtual_arg(method, args, 0)?, virtual_arg(method, args, 1)?);
                    return Ok(Some(cost.to_variant()));
                }
                ("_compute_cost", 2) => {
                    let cost = this._compute_cost(virtual_arg(method, args, 0)?, virtual_arg(method, args, 1)?);
                    return Ok(Some(cost.to_variant()));
                }
                _ => {}
            }
        }
        <RefCounted as DispatchVirtual<T>>::invoke_virtual(this, overrides, method, args)
    }
}
