//! Core types shared between the enginebridge glue and native runtimes.
//!
//! - [`BindHash`] and [`method_compat_hash`] identify classes and method binds
//! - [`Variant`] is the tagged value container, with [`FromVariant`] / [`ToVariant`]
//! - [`native`] describes the typed storage used by pointer calls
//! - [`NativeRuntime`] and [`InstanceBinding`] are the two directions of the boundary

mod bind_hash;
mod convert;
mod error;
mod flags;
mod handles;
mod math;
pub mod native;
mod runtime;
mod string_name;
mod variant;

pub use bind_hash::{BindHash, hash_constants, method_compat_hash};
pub use convert::{FromVariant, ToVariant};
pub use error::{CallError, CallErrorKind, ConversionError, EngineError};
pub use flags::{ConnectFlags, MethodFlags};
pub use handles::{Callable, ClassTag, MethodBind, ObjectId, Rid};
pub use math::{Basis, Color, Rect2, Rect2i, Transform2D, Transform3D, Vector2, Vector2i, Vector3, Vector3i};
pub use native::{ArgPtr, NativeType, RetPtr};
pub use runtime::{InstanceBinding, NativeRuntime};
pub use string_name::{NodePath, StringName, interned_count};
pub use variant::{Dictionary, Variant, VariantType};
