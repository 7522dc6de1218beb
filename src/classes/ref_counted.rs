//! `RefCounted`: base of every reference-counted class.

use std::sync::{Arc, OnceLock};

use enginebridge_core::{CallError, StringName, Variant};

use super::object::{Object, ObjectVirtual};
use crate::marshal::ptrcall_0;
use crate::object::engine_class;
use crate::script::DispatchVirtual;
use crate::{Bridge, EngineClass, NameTable};

pub mod method_name {
    pub const INIT_REF: &str = "init_ref";
    pub const REFERENCE: &str = "reference";
    pub const UNREFERENCE: &str = "unreference";
    pub const GET_REFERENCE_COUNT: &str = "get_reference_count";
}

pub mod keys {
    use enginebridge_core::VariantType as V;

    use crate::MethodKey;

    pub const INIT_REF: MethodKey = MethodKey::new("RefCounted", "init_ref", &[], Some(V::Bool));
    pub const REFERENCE: MethodKey = MethodKey::new("RefCounted", "reference", &[], Some(V::Bool));
    /// Returns `true` when the last reference was released.
    pub const UNREFERENCE: MethodKey = MethodKey::new("RefCounted", "unreference", &[], Some(V::Bool));
    pub const GET_REFERENCE_COUNT: MethodKey = MethodKey::new("RefCounted", "get_reference_count", &[], Some(V::Int));

    pub const ALL: &[MethodKey] = &[INIT_REF, REFERENCE, UNREFERENCE, GET_REFERENCE_COUNT];
}

pub fn names() -> &'static NameTable {
    static TABLE: OnceLock<NameTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        NameTable::new("RefCounted", Some(super::object::names())).with_methods(&[
            method_name::INIT_REF,
            method_name::REFERENCE,
            method_name::UNREFERENCE,
            method_name::GET_REFERENCE_COUNT,
        ])
    })
}

engine_class! {
    /// An object freed when its last reference is released.
    RefCounted: Object, refcounted
}

impl RefCounted {
    pub fn new(bridge: &Arc<Bridge>) -> Self {
        bridge.construct()
    }

    /// Number of live references, this wrapper's included.
    pub fn get_reference_count(&self) -> i32 {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_REFERENCE_COUNT), raw.instance())
    }
}

impl<T: ObjectVirtual> DispatchVirtual<T> for RefCounted {
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
