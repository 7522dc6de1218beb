//! Typed wrappers for engine classes.
//!
//! Each module holds one class: its name constants, the [`MethodKey`]s of
//! its native methods, its [`NameTable`], the wrapper type and, where the
//! class has overridable callbacks, a `*Virtual` trait for script classes.
//!
//! [`MethodKey`]: crate::MethodKey
//! [`NameTable`]: crate::NameTable

pub mod astar_3d;
pub mod audio_server;
pub mod node;
pub mod node_3d;
pub mod object;
pub mod physics_server_3d;
pub mod ref_counted;
pub mod resource;
pub mod tile_set_atlas_source;
pub mod visual_shader_node;
pub mod visual_shader_node_custom;

pub use astar_3d::{AStar3D, AStar3DVirtual};
pub use audio_server::AudioServer;
pub use node::{InternalMode, Node, NodeVirtual};
pub use node_3d::Node3D;
pub use object::{Object, ObjectVirtual};
pub use physics_server_3d::{BodyAxis, BodyMode, PhysicsServer3D};
pub use ref_counted::RefCounted;
pub use resource::{Resource, ResourceVirtual};
pub use tile_set_atlas_source::TileSetAtlasSource;
pub use visual_shader_node::{PortType, VisualShaderNode};
pub use visual_shader_node_custom::{VisualShaderNodeCustom, VisualShaderNodeCustomVirtual};
