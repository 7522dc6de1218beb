//! Generic call marshaling.
//!
//! Every typed accessor funnels into one of the `ptrcall_N` functions, which
//! differ only in arity. Each converts its arguments to their native storage
//! through [`ToNative`], hands the runtime an array of argument addresses and
//! a default-initialised return slot, then converts the slot back through
//! [`FromNative`]. Vararg engine methods go through [`varcall`] instead.
//!
//! A failed pointer call means the glue and the engine disagree about a
//! signature. That is not recoverable, so it is logged and panics.

use std::any::Any;
use std::sync::Arc;

use enginebridge_core::{
    ArgPtr, BindHash, Basis, Callable, CallError, Color, ConnectFlags, ConversionError, Dictionary, MethodBind,
    NodePath, ObjectId, Rect2, Rect2i, Rid, StringName, Transform2D, Transform3D, Variant, VariantType, Vector2,
    Vector2i, Vector3, Vector3i, method_compat_hash,
};

use crate::Bridge;

// ============================================================================
// Method Keys
// ============================================================================

/// Compile-time identity of one native method bind.
///
/// ```
/// use enginebridge::MethodKey;
/// use enginebridge::VariantType;
///
/// const GET_NAME: MethodKey = MethodKey::new("Node", "get_name", &[], Some(VariantType::StringName));
/// assert_eq!(GET_NAME.method, "get_name");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodKey {
    /// Class that declares the method.
    pub class: &'static str,
    pub method: &'static str,
    pub args: &'static [VariantType],
    pub ret: Option<VariantType>,
    /// Compatibility hash of the signature.
    pub hash: u32,
    /// Cache key folding class, method and hash.
    pub key: BindHash,
}

impl MethodKey {
    pub const fn new(
        class: &'static str,
        method: &'static str,
        args: &'static [VariantType],
        ret: Option<VariantType>,
    ) -> Self {
        let hash = method_compat_hash(method, args, ret);
        Self {
            class,
            method,
            args,
            ret,
            hash,
            key: BindHash::from_method(BindHash::from_class(class), method, hash),
        }
    }
}

// ============================================================================
// Native Conversion Traits
// ============================================================================

/// A managed value that can be passed to a pointer call.
pub trait ToNative {
    /// Native storage the engine reads.
    type Native: Any + Send + Sync;

    fn to_native(&self) -> Self::Native;
}

/// A managed value that can be read back from a pointer call's return slot.
pub trait FromNative: Sized {
    /// Native storage the engine writes.
    type Native: Any + Default + Send + Sync;

    /// Convert the written slot. Object wrappers need the bridge to take
    /// their references.
    fn from_native(native: Self::Native, bridge: &Arc<Bridge>) -> Result<Self, ConversionError>;
}

macro_rules! identity_native {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToNative for $ty {
                type Native = $ty;

                fn to_native(&self) -> $ty {
                    <$ty as Clone>::clone(self)
                }
            }

            impl FromNative for $ty {
                type Native = $ty;

                fn from_native(native: $ty, _bridge: &Arc<Bridge>) -> Result<Self, ConversionError> {
                    Ok(native)
                }
            }
        )*
    };
}

identity_native!(
    bool,
    i64,
    f64,
    String,
    Vector2,
    Vector2i,
    Rect2,
    Rect2i,
    Vector3,
    Vector3i,
    Transform2D,
    Basis,
    Transform3D,
    Color,
    StringName,
    NodePath,
    Rid,
    Callable,
    Variant,
    Dictionary,
    Vec<Variant>,
    Vec<u8>,
    Vec<i32>,
    Vec<i64>,
    Vec<f32>,
    Vec<f64>,
    Vec<String>,
    Vec<Vector2>,
    Vec<Vector3>,
    Vec<Color>,
    Option<ObjectId>,
);

macro_rules! narrow_int_native {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToNative for $ty {
                type Native = i64;

                fn to_native(&self) -> i64 {
                    i64::from(*self)
                }
            }

            impl FromNative for $ty {
                type Native = i64;

                fn from_native(native: i64, _bridge: &Arc<Bridge>) -> Result<Self, ConversionError> {
                    <$ty>::try_from(native).map_err(|_| ConversionError::IntegerOverflow {
                        value: native,
                        target_type: stringify!($ty),
                    })
                }
            }
        )*
    };
}

narrow_int_native!(i8, i16, i32, u8, u16, u32);

impl ToNative for f32 {
    type Native = f64;

    fn to_native(&self) -> f64 {
        f64::from(*self)
    }
}

impl FromNative for f32 {
    type Native = f64;

    fn from_native(native: f64, _bridge: &Arc<Bridge>) -> Result<Self, ConversionError> {
        let narrowed = native as f32;
        if native.is_finite() && !narrowed.is_finite() {
            return Err(ConversionError::FloatConversion {
                value: native,
                target_type: "f32",
            });
        }
        Ok(narrowed)
    }
}

impl ToNative for str {
    type Native = String;

    fn to_native(&self) -> String {
        self.to_string()
    }
}

impl FromNative for () {
    type Native = ();

    fn from_native(_native: (), _bridge: &Arc<Bridge>) -> Result<Self, ConversionError> {
        Ok(())
    }
}

/// Pass a `num_enum` engine enum (`#[repr(i64)]`) as its integer value.
///
/// Also implements the variant conversions, so the enum can appear in
/// virtual method signatures.
macro_rules! native_enum {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::marshal::ToNative for $ty {
                type Native = i64;

                fn to_native(&self) -> i64 {
                    i64::from(*self)
                }
            }

            impl $crate::marshal::FromNative for $ty {
                type Native = i64;

                fn from_native(
                    native: i64,
                    _bridge: &::std::sync::Arc<$crate::Bridge>,
                ) -> Result<Self, $crate::ConversionError> {
                    <$ty>::try_from(native).map_err(|_| $crate::ConversionError::InvalidEnum {
                        value: native,
                        enum_name: stringify!($ty),
                    })
                }
            }

            impl $crate::ToVariant for $ty {
                fn to_variant(&self) -> $crate::Variant {
                    $crate::Variant::Int(i64::from(*self))
                }
            }

            impl $crate::FromVariant for $ty {
                fn from_variant(variant: &$crate::Variant) -> Result<Self, $crate::ConversionError> {
                    let value = <i64 as $crate::FromVariant>::from_variant(variant)?;
                    <$ty>::try_from(value).map_err(|_| $crate::ConversionError::InvalidEnum {
                        value,
                        enum_name: stringify!($ty),
                    })
                }
            }
        )*
    };
}

/// Pass a `u32` bitflags set as its integer value. Unknown bits are dropped.
macro_rules! native_bitflags {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::marshal::ToNative for $ty {
                type Native = i64;

                fn to_native(&self) -> i64 {
                    i64::from(self.bits())
                }
            }

            impl $crate::marshal::FromNative for $ty {
                type Native = i64;

                fn from_native(
                    native: i64,
                    _bridge: &::std::sync::Arc<$crate::Bridge>,
                ) -> Result<Self, $crate::ConversionError> {
                    u32::try_from(native)
                        .map(<$ty>::from_bits_truncate)
                        .map_err(|_| $crate::ConversionError::IntegerOverflow {
                            value: native,
                            target_type: stringify!($ty),
                        })
                }
            }
        )*
    };
}

pub(crate) use {native_bitflags, native_enum};

native_bitflags!(ConnectFlags);

// ============================================================================
// Pointer Calls
// ============================================================================

#[cold]
fn call_failed(bind: MethodBind, instance: Option<ObjectId>, err: &CallError) -> ! {
    log::error!("native call {bind:?} on {instance:?} failed: {err}");
    panic!("native call {bind:?} failed: {err}");
}

#[cold]
fn return_failed(bind: MethodBind, err: &ConversionError) -> ! {
    log::error!("native call {bind:?} returned an unconvertible value: {err}");
    panic!("native call {bind:?} returned an unconvertible value: {err}");
}

fn invoke<R: FromNative>(bridge: &Arc<Bridge>, bind: MethodBind, instance: Option<ObjectId>, args: &[ArgPtr<'_>]) -> R {
    let mut ret = R::Native::default();
    if bridge.config().trace_calls {
        log::trace!("ptrcall {bind:?} on {instance:?} ({} args)", args.len());
    }
    if let Err(err) = bridge
        .runtime()
        .object_method_bind_ptrcall(bind, instance, args, &mut ret)
    {
        call_failed(bind, instance, &err);
    }
    R::from_native(ret, bridge).unwrap_or_else(|err| return_failed(bind, &err))
}

macro_rules! ptrcall_fns {
    ($($(#[$doc:meta])* $name:ident($($arg:ident: $ty:ident),*);)*) => {
        $(
            $(#[$doc])*
            #[cfg_attr(feature = "profiling", profiling::function)]
            pub fn $name<R, $($ty),*>(
                bridge: &Arc<Bridge>,
                bind: MethodBind,
                instance: Option<ObjectId>,
                $($arg: &$ty),*
            ) -> R
            where
                R: FromNative,
                $($ty: ToNative + ?Sized,)*
            {
                $(let $arg = $arg.to_native();)*
                let args: &[ArgPtr<'_>] = &[$(&$arg),*];
                invoke(bridge, bind, instance, args)
            }
        )*
    };
}

ptrcall_fns! {
    /// Call a method taking no arguments.
    ptrcall_0();
    ptrcall_1(a0: A0);
    ptrcall_2(a0: A0, a1: A1);
    ptrcall_3(a0: A0, a1: A1, a2: A2);
    ptrcall_4(a0: A0, a1: A1, a2: A2, a3: A3);
    ptrcall_5(a0: A0, a1: A1, a2: A2, a3: A3, a4: A4);
    ptrcall_6(a0: A0, a1: A1, a2: A2, a3: A3, a4: A4, a5: A5);
}

/// Call a method with variant arguments. Errors are returned, not raised.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn varcall(
    bridge: &Arc<Bridge>,
    bind: MethodBind,
    instance: Option<ObjectId>,
    args: &[&Variant],
) -> Result<Variant, CallError> {
    if bridge.config().trace_calls {
        log::trace!("varcall {bind:?} on {instance:?} ({} args)", args.len());
    }
    bridge.runtime().object_method_bind_call(bind, instance, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_key_hash_matches_signature() {
        const KEY: MethodKey = MethodKey::new("Node3D", "set_position", &[VariantType::Vector3], None);
        assert_eq!(KEY.hash, method_compat_hash("set_position", &[VariantType::Vector3], None));
        assert_eq!(
            KEY.key,
            BindHash::from_method(BindHash::from_class("Node3D"), "set_position", KEY.hash)
        );
    }

    #[test]
    fn method_keys_differ_by_declaring_class() {
        let node = MethodKey::new("Node", "get_name", &[], Some(VariantType::StringName));
        let resource = MethodKey::new("Resource", "get_name", &[], Some(VariantType::StringName));
        assert_eq!(node.hash, resource.hash);
        assert_ne!(node.key, resource.key);
    }

    #[test]
    fn narrow_ints_widen_to_i64() {
        assert_eq!(42i32.to_native(), 42i64);
        assert_eq!(7u8.to_native(), 7i64);
        assert_eq!((-3i16).to_native(), -3i64);
    }

    #[test]
    fn floats_widen_to_f64() {
        assert_eq!(1.5f32.to_native(), 1.5f64);
    }

    #[test]
    fn str_passes_as_string() {
        assert_eq!("bus".to_native(), String::from("bus"));
    }

    #[test]
    fn connect_flags_pass_as_bits() {
        let flags = ConnectFlags::DEFERRED | ConnectFlags::ONE_SHOT;
        assert_eq!(flags.to_native(), i64::from(flags.bits()));
    }
}
