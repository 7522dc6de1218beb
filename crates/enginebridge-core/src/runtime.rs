//! The interface between the glue and a native engine runtime.
//!
//! [`NativeRuntime`] is what the glue calls into: class and method handle
//! resolution, object construction and destruction, and the two call
//! conventions. [`InstanceBinding`] is what the engine calls back into: the
//! override points of a managed instance attached to a native object.

use std::sync::Arc;

use crate::error::CallError;
use crate::native::{ArgPtr, RetPtr};
use crate::{ClassTag, MethodBind, ObjectId, StringName, Variant};

/// Entry points exposed by the native engine.
///
/// Implementations must be usable from any thread; serialising access to
/// engine state that is not thread-safe is the implementation's concern.
pub trait NativeRuntime: Send + Sync {
    /// Resolve a class handle by name.
    fn classdb_get_class_tag(&self, class: &StringName) -> Option<ClassTag>;

    /// Resolve a method handle by class, method name and compatibility hash.
    ///
    /// The lookup includes methods inherited from ancestor classes.
    fn classdb_get_method_bind(&self, class: &StringName, method: &StringName, hash: u32) -> Option<MethodBind>;

    /// Create a new native instance of the class.
    fn classdb_construct_object(&self, class: ClassTag) -> Result<ObjectId, CallError>;

    /// Look up an engine singleton by name.
    fn global_get_singleton(&self, name: &StringName) -> Option<ObjectId>;

    /// Call a method with arguments and result in native representation.
    ///
    /// `ret` must be the native storage of the method's return type (or `()`
    /// for methods returning nothing).
    fn object_method_bind_ptrcall(
        &self,
        bind: MethodBind,
        instance: Option<ObjectId>,
        args: &[ArgPtr<'_>],
        ret: RetPtr<'_>,
    ) -> Result<(), CallError>;

    /// Call a method with variant arguments and result. Works for vararg
    /// methods and applies the method's default arguments.
    fn object_method_bind_call(
        &self,
        bind: MethodBind,
        instance: Option<ObjectId>,
        args: &[&Variant],
    ) -> Result<Variant, CallError>;

    /// Whether `id` refers to a live object.
    fn object_is_alive(&self, id: ObjectId) -> bool;

    /// Destroy a native object immediately.
    fn object_destroy(&self, id: ObjectId);

    /// Attach a managed instance to a native object. The engine routes script
    /// callbacks for that object through `binding` until the object dies.
    fn object_set_instance_binding(&self, id: ObjectId, binding: Arc<dyn InstanceBinding>) -> Result<(), CallError>;
}

/// Override points of a managed instance, as seen by the engine.
pub trait InstanceBinding: Send + Sync {
    /// Name of the managed class.
    fn class_name(&self) -> &str;

    /// Whether the instance defines `method`. Never invokes anything.
    fn has_method(&self, method: &StringName) -> bool;

    /// Invoke `method`. Returns `CallError::InvalidMethod` if the instance
    /// does not handle it.
    fn call(&self, method: &StringName, args: &[Variant]) -> Result<Variant, CallError>;

    /// Whether the instance declares `signal`.
    fn has_signal(&self, signal: &StringName) -> bool;
}
