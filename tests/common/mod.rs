//! Shared fixture for the integration tests: an in-process engine with every
//! class the glue wraps, backed by small native implementations.

#![allow(dead_code)]

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::sync::Arc;

use enginebridge::VariantType as V;
use enginebridge::{Bridge, BridgeConfig, CallError, Rect2i, Rid, StringName, Transform3D, Variant, Vector2i, Vector3};
use enginebridge_classdb::{CallContext, ClassDb, ClassInfo, MethodInfo, PropertyInfo, RegistrationError};
use ordered_float::OrderedFloat;

/// Engine with all classes registered, and a bridge over it.
pub fn engine() -> (Arc<ClassDb>, Arc<Bridge>) {
    engine_with_config(BridgeConfig::default())
}

pub fn engine_with_config(config: BridgeConfig) -> (Arc<ClassDb>, Arc<Bridge>) {
    let db = Arc::new(class_db());
    let bridge = Bridge::with_config(db.clone(), config);
    (db, bridge)
}

pub fn class_db() -> ClassDb {
    let db = ClassDb::with_core_classes().expect("core classes");
    register_all(&db).expect("fixture classes");
    db
}

fn register_all(db: &ClassDb) -> Result<(), RegistrationError> {
    register_node_3d(db)?;
    register_astar_3d(db)?;
    register_physics_server_3d(db)?;
    register_audio_server(db)?;
    register_tile_set_atlas_source(db)?;
    register_visual_shader_nodes(db)?;
    Ok(())
}

/// Names of the calls in the log, in order.
pub fn call_names(db: &ClassDb) -> Vec<String> {
    db.calls().iter().map(|call| call.method.to_string()).collect()
}

// ============================================================================
// Node3D
// ============================================================================

fn register_node_3d(db: &ClassDb) -> Result<(), RegistrationError> {
    db.register_class(ClassInfo::new("Node3D").inherits("Node"))?;

    for (name, ty) in [("position", V::Vector3), ("rotation", V::Vector3), ("scale", V::Vector3)] {
        db.register_property_accessors("Node3D", PropertyInfo::new(name, ty))?;
    }
    db.register_property_accessors("Node3D", PropertyInfo::new("transform", V::Transform3D))?;
    db.register_property_accessors(
        "Node3D",
        PropertyInfo::new("visible", V::Bool).setter("set_visible").getter("is_visible"),
    )?;

    db.register_method("Node3D", MethodInfo::new("translate").arg("offset", V::Vector3), |ctx| {
        let offset: Vector3 = ctx.arg(0)?;
        let id = ctx.instance()?;
        let position = StringName::new("position");
        let current = match ctx.db().get_property(id, &position)? {
            Some(Variant::Vector3(v)) => v,
            _ => Vector3::ZERO,
        };
        ctx.db().set_property(id, &position, Variant::Vector3(current + offset))
    })?;

    db.register_method(
        "Node3D",
        MethodInfo::new("look_at")
            .arg("target", V::Vector3)
            .arg("up", V::Vector3)
            .default_arg(Variant::Vector3(Vector3::UP))
            .arg("use_model_front", V::Bool)
            .default_arg(Variant::Bool(false)),
        |_ctx| Ok(()),
    )?;

    db.register_signal("Node3D", "visibility_changed")?;
    Ok(())
}

// ============================================================================
// AStar3D
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Graph {
    points: BTreeMap<i64, GraphPoint>,
    edges: BTreeSet<(i64, i64)>,
}

#[derive(Debug, Clone, Copy)]
struct GraphPoint {
    position: Vector3,
    weight_scale: f64,
    disabled: bool,
}

impl Graph {
    fn connect(&mut self, from: i64, to: i64, bidirectional: bool) {
        self.edges.insert((from, to));
        if bidirectional {
            self.edges.insert((to, from));
        }
    }

    fn disconnect(&mut self, from: i64, to: i64, bidirectional: bool) {
        self.edges.remove(&(from, to));
        if bidirectional {
            self.edges.remove(&(to, from));
        }
    }

    fn neighbours(&self, id: i64) -> impl Iterator<Item = i64> + '_ {
        self.edges.range((id, i64::MIN)..=(id, i64::MAX)).map(|&(_, to)| to)
    }
}

/// Dijkstra over the graph. Edge costs come from the script's
/// `_compute_cost` when it overrides it.
fn shortest_path(ctx: &CallContext<'_>, graph: &Graph, from: i64, to: i64) -> Result<Vec<i64>, CallError> {
    if !graph.points.contains_key(&from) || !graph.points.contains_key(&to) {
        return Ok(Vec::new());
    }

    let mut best: BTreeMap<i64, (f64, Option<i64>)> = BTreeMap::new();
    let mut queue = BinaryHeap::new();
    best.insert(from, (0.0, None));
    queue.push(Reverse((OrderedFloat(0.0), from)));

    while let Some(Reverse((OrderedFloat(cost), id))) = queue.pop() {
        if id == to {
            break;
        }
        if best.get(&id).is_some_and(|&(known, _)| cost > known) {
            continue;
        }
        for next in graph.neighbours(id) {
            let Some(point) = graph.points.get(&next) else { continue };
            if point.disabled {
                continue;
            }
            let step = match ctx.call_virtual("_compute_cost", &[Variant::Int(id), Variant::Int(next)])? {
                Some(Variant::Float(step)) => step,
                _ => f64::from(graph.points[&id].position.distance_to(point.position)),
            };
            let total = cost + step * point.weight_scale;
            if best.get(&next).is_none_or(|&(known, _)| total < known) {
                best.insert(next, (total, Some(id)));
                queue.push(Reverse((OrderedFloat(total), next)));
            }
        }
    }

    if !best.contains_key(&to) {
        return Ok(Vec::new());
    }
    let mut path = vec![to];
    let mut current = to;
    while let Some(&(_, Some(previous))) = best.get(&current) {
        path.push(previous);
        current = previous;
    }
    path.reverse();
    Ok(path)
}

fn register_astar_3d(db: &ClassDb) -> Result<(), RegistrationError> {
    db.register_class(ClassInfo::new("AStar3D").inherits("RefCounted").with_data::<Graph>())?;

    db.register_method(
        "AStar3D",
        MethodInfo::new("add_point")
            .arg("id", V::Int)
            .arg("position", V::Vector3)
            .arg("weight_scale", V::Float)
            .default_arg(Variant::Float(1.0)),
        |ctx| {
            let id: i64 = ctx.arg(0)?;
            let position: Vector3 = ctx.arg(1)?;
            let weight_scale: f64 = ctx.arg(2)?;
            ctx.with_data(|graph: &mut Graph| {
                let disabled = graph.points.get(&id).is_some_and(|p| p.disabled);
                graph.points.insert(id, GraphPoint { position, weight_scale, disabled });
            })
        },
    )?;

    db.register_method(
        "AStar3D",
        MethodInfo::new("get_point_position").arg("id", V::Int).returns(V::Vector3),
        |ctx| {
            let id: i64 = ctx.arg(0)?;
            let position = ctx.with_data(|graph: &mut Graph| graph.points.get(&id).map(|p| p.position))?;
            ctx.set_return(position.unwrap_or_default())
        },
    )?;

    db.register_method(
        "AStar3D",
        MethodInfo::new("set_point_position").arg("id", V::Int).arg("position", V::Vector3),
        |ctx| {
            let id: i64 = ctx.arg(0)?;
            let position: Vector3 = ctx.arg(1)?;
            ctx.with_data(|graph: &mut Graph| {
                if let Some(point) = graph.points.get_mut(&id) {
                    point.position = position;
                }
            })
        },
    )?;

    db.register_method(
        "AStar3D",
        MethodInfo::new("get_point_weight_scale").arg("id", V::Int).returns(V::Float),
        |ctx| {
            let id: i64 = ctx.arg(0)?;
            let weight = ctx.with_data(|graph: &mut Graph| graph.points.get(&id).map(|p| p.weight_scale))?;
            ctx.set_return(weight.unwrap_or_default())
        },
    )?;

    db.register_method(
        "AStar3D",
        MethodInfo::new("set_point_weight_scale").arg("id", V::Int).arg("weight_scale", V::Float),
        |ctx| {
            let id: i64 = ctx.arg(0)?;
            let weight_scale: f64 = ctx.arg(1)?;
            ctx.with_data(|graph: &mut Graph| {
                if let Some(point) = graph.points.get_mut(&id) {
                    point.weight_scale = weight_scale;
                }
            })
        },
    )?;

    db.register_method("AStar3D", MethodInfo::new("remove_point").arg("id", V::Int), |ctx| {
        let id: i64 = ctx.arg(0)?;
        ctx.with_data(|graph: &mut Graph| {
            graph.points.remove(&id);
            graph.edges.retain(|&(from, to)| from != id && to != id);
        })
    })?;

    db.register_method(
        "AStar3D",
        MethodInfo::new("has_point").arg("id", V::Int).returns(V::Bool),
        |ctx| {
            let id: i64 = ctx.arg(0)?;
            let found = ctx.with_data(|graph: &mut Graph| graph.points.contains_key(&id))?;
            ctx.set_return(found)
        },
    )?;

    db.register_method(
        "AStar3D",
        MethodInfo::new("get_point_ids").returns(V::PackedInt64Array),
        |ctx| {
            let ids: Vec<i64> = ctx.with_data(|graph: &mut Graph| graph.points.keys().copied().collect())?;
            ctx.set_return(ids)
        },
    )?;

    for name in ["connect_points", "disconnect_points"] {
        let connect = name == "connect_points";
        db.register_method(
            "AStar3D",
            MethodInfo::new(name)
                .arg("id", V::Int)
                .arg("to_id", V::Int)
                .arg("bidirectional", V::Bool)
                .default_arg(Variant::Bool(true)),
            move |ctx| {
                let from: i64 = ctx.arg(0)?;
                let to: i64 = ctx.arg(1)?;
                let bidirectional: bool = ctx.arg(2)?;
                ctx.with_data(|graph: &mut Graph| {
                    if connect {
                        graph.connect(from, to, bidirectional);
                    } else {
                        graph.disconnect(from, to, bidirectional);
                    }
                })
            },
        )?;
    }

    db.register_method(
        "AStar3D",
        MethodInfo::new("are_points_connected")
            .arg("id", V::Int)
            .arg("to_id", V::Int)
            .arg("bidirectional", V::Bool)
            .default_arg(Variant::Bool(true))
            .returns(V::Bool),
        |ctx| {
            let from: i64 = ctx.arg(0)?;
            let to: i64 = ctx.arg(1)?;
            let bidirectional: bool = ctx.arg(2)?;
            let connected = ctx.with_data(|graph: &mut Graph| {
                let forward = graph.edges.contains(&(from, to));
                let backward = graph.edges.contains(&(to, from));
                if bidirectional { forward && backward } else { forward || backward }
            })?;
            ctx.set_return(connected)
        },
    )?;

    db.register_method(
        "AStar3D",
        MethodInfo::new("get_available_point_id").returns(V::Int),
        |ctx| {
            let id = ctx.with_data(|graph: &mut Graph| graph.points.keys().next_back().map_or(0, |last| last + 1))?;
            ctx.set_return(id)
        },
    )?;

    db.register_method("AStar3D", MethodInfo::new("get_point_count").returns(V::Int), |ctx| {
        let count = ctx.with_data(|graph: &mut Graph| graph.points.len() as i64)?;
        ctx.set_return(count)
    })?;

    db.register_method(
        "AStar3D",
        MethodInfo::new("get_closest_point")
            .arg("to_position", V::Vector3)
            .arg("include_disabled", V::Bool)
            .default_arg(Variant::Bool(false))
            .returns(V::Int),
        |ctx| {
            let target: Vector3 = ctx.arg(0)?;
            let include_disabled: bool = ctx.arg(1)?;
            let closest = ctx.with_data(|graph: &mut Graph| {
                graph
                    .points
                    .iter()
                    .filter(|(_, point)| include_disabled || !point.disabled)
                    .min_by(|(_, a), (_, b)| {
                        a.position
                            .distance_to(target)
                            .total_cmp(&b.position.distance_to(target))
                    })
                    .map_or(-1, |(&id, _)| id)
            })?;
            ctx.set_return(closest)
        },
    )?;

    db.register_method(
        "AStar3D",
        MethodInfo::new("get_id_path")
            .arg("from_id", V::Int)
            .arg("to_id", V::Int)
            .arg("allow_partial_path", V::Bool)
            .default_arg(Variant::Bool(false))
            .returns(V::PackedInt64Array),
        |ctx| {
            let from: i64 = ctx.arg(0)?;
            let to: i64 = ctx.arg(1)?;
            let graph = ctx.with_data(|graph: &mut Graph| graph.clone())?;
            let path = shortest_path(ctx, &graph, from, to)?;
            ctx.set_return(path)
        },
    )?;

    db.register_method(
        "AStar3D",
        MethodInfo::new("get_point_path")
            .arg("from_id", V::Int)
            .arg("to_id", V::Int)
            .arg("allow_partial_path", V::Bool)
            .default_arg(Variant::Bool(false))
            .returns(V::PackedVector3Array),
        |ctx| {
            let from: i64 = ctx.arg(0)?;
            let to: i64 = ctx.arg(1)?;
            let graph = ctx.with_data(|graph: &mut Graph| graph.clone())?;
            let path: Vec<Vector3> = shortest_path(ctx, &graph, from, to)?
                .iter()
                .map(|id| graph.points[id].position)
                .collect();
            ctx.set_return(path)
        },
    )?;

    db.register_method(
        "AStar3D",
        MethodInfo::new("set_point_disabled")
            .arg("id", V::Int)
            .arg("disabled", V::Bool)
            .default_arg(Variant::Bool(true)),
        |ctx| {
            let id: i64 = ctx.arg(0)?;
            let disabled: bool = ctx.arg(1)?;
            ctx.with_data(|graph: &mut Graph| {
                if let Some(point) = graph.points.get_mut(&id) {
                    point.disabled = disabled;
                }
            })
        },
    )?;

    db.register_method(
        "AStar3D",
        MethodInfo::new("is_point_disabled").arg("id", V::Int).returns(V::Bool),
        |ctx| {
            let id: i64 = ctx.arg(0)?;
            let disabled = ctx.with_data(|graph: &mut Graph| graph.points.get(&id).is_some_and(|p| p.disabled))?;
            ctx.set_return(disabled)
        },
    )?;

    db.register_method("AStar3D", MethodInfo::new("clear"), |ctx| {
        ctx.with_data(|graph: &mut Graph| *graph = Graph::default())
    })?;
    Ok(())
}

// ============================================================================
// PhysicsServer3D
// ============================================================================

#[derive(Debug, Default)]
struct PhysicsState {
    next_rid: u64,
    bodies: BTreeMap<Rid, Body>,
    shapes: BTreeMap<Rid, Variant>,
}

#[derive(Debug, Default)]
struct Body {
    mode: i64,
    shapes: Vec<(Rid, Transform3D, bool)>,
    axis_lock: i64,
}

impl PhysicsState {
    fn allocate(&mut self) -> Rid {
        self.next_rid += 1;
        Rid::new(self.next_rid)
    }
}

fn register_physics_server_3d(db: &ClassDb) -> Result<(), RegistrationError> {
    const CLASS: &str = "PhysicsServer3D";
    db.register_class(
        ClassInfo::new(CLASS)
            .inherits("Object")
            .not_instantiable()
            .with_data::<PhysicsState>(),
    )?;

    db.register_method(CLASS, MethodInfo::new("body_create").returns(V::Rid), |ctx| {
        let rid = ctx.with_data(|state: &mut PhysicsState| {
            let rid = state.allocate();
            state.bodies.insert(rid, Body { mode: 2, ..Body::default() });
            rid
        })?;
        ctx.set_return(rid)
    })?;

    for name in ["box_shape_create", "sphere_shape_create"] {
        db.register_method(CLASS, MethodInfo::new(name).returns(V::Rid), |ctx| {
            let rid = ctx.with_data(|state: &mut PhysicsState| {
                let rid = state.allocate();
                state.shapes.insert(rid, Variant::Nil);
                rid
            })?;
            ctx.set_return(rid)
        })?;
    }

    db.register_method(
        CLASS,
        MethodInfo::new("body_set_mode").arg("body", V::Rid).arg("mode", V::Int),
        |ctx| {
            let body: Rid = ctx.arg(0)?;
            let mode: i64 = ctx.arg(1)?;
            ctx.with_data(|state: &mut PhysicsState| {
                if let Some(body) = state.bodies.get_mut(&body) {
                    body.mode = mode;
                }
            })
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("body_get_mode").arg("body", V::Rid).returns(V::Int),
        |ctx| {
            let body: Rid = ctx.arg(0)?;
            let mode = ctx.with_data(|state: &mut PhysicsState| state.bodies.get(&body).map_or(0, |b| b.mode))?;
            ctx.set_return(mode)
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("body_add_shape")
            .arg("body", V::Rid)
            .arg("shape", V::Rid)
            .arg("transform", V::Transform3D)
            .default_arg(Variant::Transform3D(Transform3D::IDENTITY))
            .arg("disabled", V::Bool)
            .default_arg(Variant::Bool(false)),
        |ctx| {
            let body: Rid = ctx.arg(0)?;
            let shape: Rid = ctx.arg(1)?;
            let transform: Transform3D = ctx.arg(2)?;
            let disabled: bool = ctx.arg(3)?;
            ctx.with_data(|state: &mut PhysicsState| {
                if let Some(body) = state.bodies.get_mut(&body) {
                    body.shapes.push((shape, transform, disabled));
                }
            })
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("body_get_shape_count").arg("body", V::Rid).returns(V::Int),
        |ctx| {
            let body: Rid = ctx.arg(0)?;
            let count =
                ctx.with_data(|state: &mut PhysicsState| state.bodies.get(&body).map_or(0, |b| b.shapes.len() as i64))?;
            ctx.set_return(count)
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("body_get_shape_transform")
            .arg("body", V::Rid)
            .arg("shape_idx", V::Int)
            .returns(V::Transform3D),
        |ctx| {
            let body: Rid = ctx.arg(0)?;
            let index: i64 = ctx.arg(1)?;
            let transform = ctx.with_data(|state: &mut PhysicsState| {
                let body = state.bodies.get(&body)?;
                let index = usize::try_from(index).ok()?;
                body.shapes.get(index).map(|&(_, transform, _)| transform)
            })?;
            ctx.set_return(transform.unwrap_or(Transform3D::IDENTITY))
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("body_set_shape_disabled")
            .arg("body", V::Rid)
            .arg("shape_idx", V::Int)
            .arg("disabled", V::Bool),
        |ctx| {
            let body: Rid = ctx.arg(0)?;
            let index: i64 = ctx.arg(1)?;
            let disabled: bool = ctx.arg(2)?;
            ctx.with_data(|state: &mut PhysicsState| {
                let shape = state
                    .bodies
                    .get_mut(&body)
                    .zip(usize::try_from(index).ok())
                    .and_then(|(body, index)| body.shapes.get_mut(index));
                if let Some(shape) = shape {
                    shape.2 = disabled;
                }
            })
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("body_set_axis_lock")
            .arg("body", V::Rid)
            .arg("axis", V::Int)
            .arg("lock", V::Bool),
        |ctx| {
            let body: Rid = ctx.arg(0)?;
            let axis: i64 = ctx.arg(1)?;
            let lock: bool = ctx.arg(2)?;
            ctx.with_data(|state: &mut PhysicsState| {
                if let Some(body) = state.bodies.get_mut(&body) {
                    if lock {
                        body.axis_lock |= axis;
                    } else {
                        body.axis_lock &= !axis;
                    }
                }
            })
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("body_is_axis_locked")
            .arg("body", V::Rid)
            .arg("axis", V::Int)
            .returns(V::Bool),
        |ctx| {
            let body: Rid = ctx.arg(0)?;
            let axis: i64 = ctx.arg(1)?;
            let locked = ctx.with_data(|state: &mut PhysicsState| {
                state.bodies.get(&body).is_some_and(|b| axis != 0 && b.axis_lock & axis == axis)
            })?;
            ctx.set_return(locked)
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("shape_set_data").arg("shape", V::Rid).arg("data", V::Nil),
        |ctx| {
            let shape: Rid = ctx.arg(0)?;
            let data: Variant = ctx.arg(1)?;
            ctx.with_data(|state: &mut PhysicsState| {
                if let Some(slot) = state.shapes.get_mut(&shape) {
                    *slot = data;
                }
            })
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("shape_get_data").arg("shape", V::Rid).returns(V::Nil),
        |ctx| {
            let shape: Rid = ctx.arg(0)?;
            let data = ctx.with_data(|state: &mut PhysicsState| state.shapes.get(&shape).cloned())?;
            ctx.set_return(data.unwrap_or_default())
        },
    )?;

    db.register_method(CLASS, MethodInfo::new("free_rid").arg("rid", V::Rid), |ctx| {
        let rid: Rid = ctx.arg(0)?;
        ctx.with_data(|state: &mut PhysicsState| {
            state.bodies.remove(&rid);
            state.shapes.remove(&rid);
        })
    })?;

    db.register_singleton(CLASS)?;
    Ok(())
}

// ============================================================================
// AudioServer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Bus {
    name: String,
    volume_db: f64,
    mute: bool,
    send: StringName,
}

impl Bus {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            volume_db: 0.0,
            mute: false,
            send: StringName::default(),
        }
    }
}

#[derive(Debug)]
struct Buses(Vec<Bus>);

impl Default for Buses {
    fn default() -> Self {
        Buses(vec![Bus::named("Master")])
    }
}

impl Buses {
    fn get_mut(&mut self, index: i64) -> Option<&mut Bus> {
        usize::try_from(index).ok().and_then(|index| self.0.get_mut(index))
    }

    fn get(&self, index: i64) -> Option<&Bus> {
        usize::try_from(index).ok().and_then(|index| self.0.get(index))
    }
}

fn register_audio_server(db: &ClassDb) -> Result<(), RegistrationError> {
    const CLASS: &str = "AudioServer";
    db.register_class(ClassInfo::new(CLASS).inherits("Object").not_instantiable().with_data::<Buses>())?;

    db.register_method(CLASS, MethodInfo::new("set_bus_count").arg("amount", V::Int), |ctx| {
        let amount = usize::try_from(ctx.arg::<i64>(0)?).unwrap_or(1).max(1);
        ctx.with_data(|buses: &mut Buses| {
            let mut index = buses.0.len();
            buses.0.resize_with(amount, || {
                index += 1;
                Bus::named(&format!("New Bus {}", index - 1))
            });
        })?;
        emit_layout_changed(ctx);
        Ok(())
    })?;

    db.register_method(CLASS, MethodInfo::new("get_bus_count").returns(V::Int), |ctx| {
        let count = ctx.with_data(|buses: &mut Buses| buses.0.len() as i64)?;
        ctx.set_return(count)
    })?;

    db.register_method(
        CLASS,
        MethodInfo::new("add_bus").arg("at_position", V::Int).default_arg(Variant::Int(-1)),
        |ctx| {
            let at: i64 = ctx.arg(0)?;
            ctx.with_data(|buses: &mut Buses| {
                let bus = Bus::named(&format!("New Bus {}", buses.0.len()));
                match usize::try_from(at).ok().filter(|&at| at < buses.0.len()) {
                    Some(at) => buses.0.insert(at, bus),
                    None => buses.0.push(bus),
                }
            })?;
            emit_layout_changed(ctx);
            Ok(())
        },
    )?;

    db.register_method(CLASS, MethodInfo::new("remove_bus").arg("index", V::Int), |ctx| {
        let index: i64 = ctx.arg(0)?;
        ctx.with_data(|buses: &mut Buses| {
            if let Some(index) = usize::try_from(index).ok().filter(|&i| i > 0 && i < buses.0.len()) {
                buses.0.remove(index);
            }
        })?;
        emit_layout_changed(ctx);
        Ok(())
    })?;

    db.register_method(
        CLASS,
        MethodInfo::new("set_bus_name").arg("bus_idx", V::Int).arg("name", V::String),
        |ctx| {
            let index: i64 = ctx.arg(0)?;
            let name: String = ctx.arg(1)?;
            let old = ctx.with_data(|buses: &mut Buses| {
                buses.get_mut(index).map(|bus| std::mem::replace(&mut bus.name, name.clone()))
            })?;
            if let Some(old) = old {
                let args = [Variant::Int(index), Variant::String(old), Variant::String(name)];
                if let Err(err) = ctx.emit_signal("bus_renamed", &args) {
                    log::error!("bus_renamed: {err}");
                }
            }
            Ok(())
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("get_bus_name").arg("bus_idx", V::Int).returns(V::String),
        |ctx| {
            let index: i64 = ctx.arg(0)?;
            let name = ctx.with_data(|buses: &mut Buses| buses.get(index).map(|bus| bus.name.clone()))?;
            ctx.set_return(name.unwrap_or_default())
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("get_bus_index").arg("bus_name", V::StringName).returns(V::Int),
        |ctx| {
            let name: StringName = ctx.arg(0)?;
            let index = ctx.with_data(|buses: &mut Buses| {
                buses
                    .0
                    .iter()
                    .position(|bus| bus.name == name.as_str())
                    .map_or(-1, |i| i as i64)
            })?;
            ctx.set_return(index)
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("set_bus_volume_db").arg("bus_idx", V::Int).arg("volume_db", V::Float),
        |ctx| {
            let index: i64 = ctx.arg(0)?;
            let volume: f64 = ctx.arg(1)?;
            ctx.with_data(|buses: &mut Buses| {
                if let Some(bus) = buses.get_mut(index) {
                    bus.volume_db = volume;
                }
            })
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("get_bus_volume_db").arg("bus_idx", V::Int).returns(V::Float),
        |ctx| {
            let index: i64 = ctx.arg(0)?;
            let volume = ctx.with_data(|buses: &mut Buses| buses.get(index).map_or(0.0, |bus| bus.volume_db))?;
            ctx.set_return(volume)
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("set_bus_mute").arg("bus_idx", V::Int).arg("enable", V::Bool),
        |ctx| {
            let index: i64 = ctx.arg(0)?;
            let mute: bool = ctx.arg(1)?;
            ctx.with_data(|buses: &mut Buses| {
                if let Some(bus) = buses.get_mut(index) {
                    bus.mute = mute;
                }
            })
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("is_bus_mute").arg("bus_idx", V::Int).returns(V::Bool),
        |ctx| {
            let index: i64 = ctx.arg(0)?;
            let mute = ctx.with_data(|buses: &mut Buses| buses.get(index).is_some_and(|bus| bus.mute))?;
            ctx.set_return(mute)
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("set_bus_send").arg("bus_idx", V::Int).arg("send", V::StringName),
        |ctx| {
            let index: i64 = ctx.arg(0)?;
            let send: StringName = ctx.arg(1)?;
            ctx.with_data(|buses: &mut Buses| {
                if let Some(bus) = buses.get_mut(index) {
                    bus.send = send;
                }
            })
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("get_bus_send").arg("bus_idx", V::Int).returns(V::StringName),
        |ctx| {
            let index: i64 = ctx.arg(0)?;
            let send = ctx.with_data(|buses: &mut Buses| buses.get(index).map(|bus| bus.send.clone()))?;
            ctx.set_return(send.unwrap_or_default())
        },
    )?;

    db.register_property(
        CLASS,
        PropertyInfo::new("bus_count", V::Int).setter("set_bus_count").getter("get_bus_count"),
    )?;
    db.register_signal(CLASS, "bus_layout_changed")?;
    db.register_signal(CLASS, "bus_renamed")?;
    db.register_singleton(CLASS)?;
    Ok(())
}

fn emit_layout_changed(ctx: &CallContext<'_>) {
    if let Err(err) = ctx.emit_signal("bus_layout_changed", &[]) {
        log::error!("bus_layout_changed: {err}");
    }
}

// ============================================================================
// TileSetAtlasSource
// ============================================================================

#[derive(Debug, Default)]
struct Atlas {
    tiles: BTreeMap<(i32, i32), Vector2i>,
}

fn coords_key(coords: Vector2i) -> (i32, i32) {
    (coords.y, coords.x)
}

fn register_tile_set_atlas_source(db: &ClassDb) -> Result<(), RegistrationError> {
    const CLASS: &str = "TileSetAtlasSource";
    db.register_class(ClassInfo::new(CLASS).inherits("Resource").with_data::<Atlas>())?;

    for name in ["texture_region_size", "margins", "separation"] {
        db.register_property_accessors(CLASS, PropertyInfo::new(name, V::Vector2i))?;
    }

    db.register_method(
        CLASS,
        MethodInfo::new("create_tile")
            .arg("atlas_coords", V::Vector2i)
            .arg("size", V::Vector2i)
            .default_arg(Variant::Vector2i(Vector2i::ONE)),
        |ctx| {
            let coords: Vector2i = ctx.arg(0)?;
            let size: Vector2i = ctx.arg(1)?;
            let created = ctx.with_data(|atlas: &mut Atlas| atlas.tiles.insert(coords_key(coords), size).is_none())?;
            if !created {
                log::error!("create_tile: a tile already exists at {coords:?}");
            }
            Ok(())
        },
    )?;

    db.register_method(CLASS, MethodInfo::new("remove_tile").arg("atlas_coords", V::Vector2i), |ctx| {
        let coords: Vector2i = ctx.arg(0)?;
        ctx.with_data(|atlas: &mut Atlas| {
            atlas.tiles.remove(&coords_key(coords));
        })
    })?;

    db.register_method(
        CLASS,
        MethodInfo::new("has_tile").arg("atlas_coords", V::Vector2i).returns(V::Bool),
        |ctx| {
            let coords: Vector2i = ctx.arg(0)?;
            let found = ctx.with_data(|atlas: &mut Atlas| atlas.tiles.contains_key(&coords_key(coords)))?;
            ctx.set_return(found)
        },
    )?;

    db.register_method(CLASS, MethodInfo::new("get_tiles_count").returns(V::Int), |ctx| {
        let count = ctx.with_data(|atlas: &mut Atlas| atlas.tiles.len() as i64)?;
        ctx.set_return(count)
    })?;

    db.register_method(
        CLASS,
        MethodInfo::new("get_tile_id").arg("index", V::Int).returns(V::Vector2i),
        |ctx| {
            let index: i64 = ctx.arg(0)?;
            let coords = ctx.with_data(|atlas: &mut Atlas| {
                let index = usize::try_from(index).ok()?;
                atlas.tiles.keys().nth(index).map(|&(y, x)| Vector2i::new(x, y))
            })?;
            ctx.set_return(coords.unwrap_or(Vector2i::new(-1, -1)))
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("get_tile_size_in_atlas")
            .arg("atlas_coords", V::Vector2i)
            .returns(V::Vector2i),
        |ctx| {
            let coords: Vector2i = ctx.arg(0)?;
            let size = ctx.with_data(|atlas: &mut Atlas| atlas.tiles.get(&coords_key(coords)).copied())?;
            ctx.set_return(size.unwrap_or(Vector2i::new(-1, -1)))
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("get_tile_texture_region")
            .arg("atlas_coords", V::Vector2i)
            .arg("frame", V::Int)
            .default_arg(Variant::Int(0))
            .returns(V::Rect2i),
        |ctx| {
            let coords: Vector2i = ctx.arg(0)?;
            let id = ctx.instance()?;
            let read = |name: &str| match ctx.db().get_property(id, &StringName::new(name)) {
                Ok(Some(Variant::Vector2i(v))) => v,
                _ => Vector2i::ZERO,
            };
            let (region, margins, separation) = (read("texture_region_size"), read("margins"), read("separation"));
            let size = ctx.with_data(|atlas: &mut Atlas| atlas.tiles.get(&coords_key(coords)).copied())?;
            let rect = match size {
                Some(size) => Rect2i::new(
                    Vector2i::new(
                        margins.x + coords.x * (region.x + separation.x),
                        margins.y + coords.y * (region.y + separation.y),
                    ),
                    Vector2i::new(
                        size.x * region.x + (size.x - 1) * separation.x,
                        size.y * region.y + (size.y - 1) * separation.y,
                    ),
                ),
                None => Rect2i::default(),
            };
            ctx.set_return(rect)
        },
    )?;
    Ok(())
}

// ============================================================================
// VisualShaderNode / VisualShaderNodeCustom
// ============================================================================

#[derive(Debug, Default)]
struct PortDefaults(BTreeMap<i64, Variant>);

fn register_visual_shader_nodes(db: &ClassDb) -> Result<(), RegistrationError> {
    const CLASS: &str = "VisualShaderNode";
    db.register_class(
        ClassInfo::new(CLASS)
            .inherits("Resource")
            .not_instantiable()
            .with_data::<PortDefaults>(),
    )?;

    db.register_property_accessors(CLASS, PropertyInfo::new("output_port_for_preview", V::Int))?;

    db.register_method(
        CLASS,
        MethodInfo::new("set_input_port_default_value")
            .arg("port", V::Int)
            .arg("value", V::Nil)
            .arg("prev_value", V::Nil)
            .default_arg(Variant::Nil),
        |ctx| {
            let port: i64 = ctx.arg(0)?;
            let value: Variant = ctx.arg(1)?;
            ctx.with_data(|defaults: &mut PortDefaults| {
                defaults.0.insert(port, value);
            })?;
            if let Err(err) = ctx.emit_signal("changed", &[]) {
                log::error!("changed: {err}");
            }
            Ok(())
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("get_input_port_default_value").arg("port", V::Int).returns(V::Nil),
        |ctx| {
            let port: i64 = ctx.arg(0)?;
            let value = ctx.with_data(|defaults: &mut PortDefaults| defaults.0.get(&port).cloned())?;
            ctx.set_return(value.unwrap_or_default())
        },
    )?;

    db.register_method(
        CLASS,
        MethodInfo::new("remove_input_port_default_value").arg("port", V::Int),
        |ctx| {
            let port: i64 = ctx.arg(0)?;
            ctx.with_data(|defaults: &mut PortDefaults| {
                defaults.0.remove(&port);
            })
        },
    )?;

    db.register_method(CLASS, MethodInfo::new("clear_default_input_values"), |ctx| {
        ctx.with_data(|defaults: &mut PortDefaults| defaults.0.clear())
    })?;

    db.register_signal(CLASS, "editor_refresh_request")?;

    db.register_class(ClassInfo::new("VisualShaderNodeCustom").inherits(CLASS))?;
    db.register_method(
        "VisualShaderNodeCustom",
        MethodInfo::new("get_option_index").arg("option", V::Int).returns(V::Int),
        |ctx| {
            let option: i64 = ctx.arg(0)?;
            ctx.set_return(option.max(0))
        },
    )?;
    Ok(())
}
