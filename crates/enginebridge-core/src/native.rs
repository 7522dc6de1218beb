//! Typed native storage for the pointer-call convention.
//!
//! A pointer call passes every argument as the address of a value in its
//! native representation ([`ArgPtr`]) and receives the result by writing into
//! caller-provided storage ([`RetPtr`]). Here the addresses are type-erased
//! references, and the callee recovers the concrete type by downcasting.
//!
//! [`NativeType`] lists the representations that can cross the boundary. The
//! `box_*` helpers let a runtime materialise that storage from [`Variant`]s
//! when a call arrives through the variant convention instead.

use std::any::Any;

use crate::convert::{FromVariant, ToVariant};
use crate::error::ConversionError;
use crate::{
    Basis, Callable, Color, Dictionary, NodePath, ObjectId, Rect2, Rect2i, Rid, StringName, Transform2D, Transform3D,
    Variant, VariantType, Vector2, Vector2i, Vector3, Vector3i,
};

/// Address of an argument in native representation.
pub type ArgPtr<'a> = &'a (dyn Any + Send + Sync);

/// Address of caller-owned return storage.
pub type RetPtr<'a> = &'a mut (dyn Any + Send + Sync);

/// Owned native storage of a dynamically chosen type.
pub type NativeBox = Box<dyn Any + Send + Sync>;

/// A Rust type that is the native representation of one [`VariantType`].
pub trait NativeType: FromVariant + ToVariant + Any + Clone + Default + Send + Sync {
    const VARIANT_TYPE: VariantType;
}

macro_rules! native_types {
    ($($ty:ty => $case:ident),* $(,)?) => {
        $(
            impl NativeType for $ty {
                const VARIANT_TYPE: VariantType = VariantType::$case;
            }
        )*

        /// Convert a variant into boxed native storage of type `ty`.
        pub fn box_from_variant(ty: VariantType, variant: &Variant) -> Result<NativeBox, ConversionError> {
            match ty {
                $( VariantType::$case => Ok(Box::new(<$ty>::from_variant(variant)?)), )*
            }
        }

        /// Default-initialised native storage of type `ty`.
        pub fn box_default(ty: VariantType) -> NativeBox {
            match ty {
                $( VariantType::$case => Box::new(<$ty>::default()), )*
            }
        }

        /// Read native storage of type `ty` back into a variant.
        ///
        /// Returns `None` if `value` is not the native representation of `ty`.
        pub fn variant_from_native(ty: VariantType, value: &(dyn Any + Send + Sync)) -> Option<Variant> {
            match ty {
                $( VariantType::$case => value.downcast_ref::<$ty>().map(|v| v.to_variant()), )*
            }
        }

        /// Convert `variant` to type `ty` and write it into native storage.
        ///
        /// Returns `Ok(false)` if `slot` is not the native representation of `ty`.
        pub fn store_variant(ty: VariantType, slot: RetPtr<'_>, variant: &Variant) -> Result<bool, ConversionError> {
            match ty {
                $(
                    VariantType::$case => match slot.downcast_mut::<$ty>() {
                        Some(slot) => {
                            *slot = <$ty>::from_variant(variant)?;
                            Ok(true)
                        }
                        None => Ok(false),
                    },
                )*
            }
        }

        /// Rust type name of the native representation of `ty`.
        pub fn native_type_name(ty: VariantType) -> &'static str {
            match ty {
                $( VariantType::$case => std::any::type_name::<$ty>(), )*
            }
        }
    };
}

native_types! {
    Variant => Nil,
    bool => Bool,
    i64 => Int,
    f64 => Float,
    String => String,
    Vector2 => Vector2,
    Vector2i => Vector2i,
    Rect2 => Rect2,
    Rect2i => Rect2i,
    Vector3 => Vector3,
    Vector3i => Vector3i,
    Transform2D => Transform2D,
    Basis => Basis,
    Transform3D => Transform3D,
    Color => Color,
    StringName => StringName,
    NodePath => NodePath,
    Rid => Rid,
    Option<ObjectId> => Object,
    Callable => Callable,
    Dictionary => Dictionary,
    Vec<Variant> => Array,
    Vec<u8> => PackedByteArray,
    Vec<i32> => PackedInt32Array,
    Vec<i64> => PackedInt64Array,
    Vec<f32> => PackedFloat32Array,
    Vec<f64> => PackedFloat64Array,
    Vec<String> => PackedStringArray,
    Vec<Vector2> => PackedVector2Array,
    Vec<Vector3> => PackedVector3Array,
    Vec<Color> => PackedColorArray,
}

/// Downcast an argument address to its native type.
pub fn arg_as<'a, T: Any>(arg: ArgPtr<'a>) -> Option<&'a T> {
    arg.downcast_ref::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxed_storage_matches_variant_type() {
        let boxed = box_from_variant(VariantType::Vector3, &Variant::Vector3(Vector3::UP)).unwrap();
        assert_eq!(boxed.downcast_ref::<Vector3>(), Some(&Vector3::UP));

        let back = variant_from_native(VariantType::Vector3, boxed.as_ref());
        assert_eq!(back, Some(Variant::Vector3(Vector3::UP)));
    }

    #[test]
    fn int_storage_is_i64() {
        let boxed = box_from_variant(VariantType::Int, &Variant::Int(-7)).unwrap();
        assert_eq!(boxed.downcast_ref::<i64>(), Some(&-7));
        assert!(boxed.downcast_ref::<i32>().is_none());
    }

    #[test]
    fn nil_type_stores_any_variant() {
        let boxed = box_from_variant(VariantType::Nil, &Variant::Bool(true)).unwrap();
        assert_eq!(boxed.downcast_ref::<Variant>(), Some(&Variant::Bool(true)));
    }

    #[test]
    fn mismatched_variant_is_rejected() {
        let err = box_from_variant(VariantType::Transform3D, &Variant::Int(1)).err();
        assert_eq!(err, Some(ConversionError::mismatch(VariantType::Transform3D, VariantType::Int)));
    }

    #[test]
    fn defaults() {
        let boxed = box_default(VariantType::Transform3D);
        assert_eq!(boxed.downcast_ref::<Transform3D>(), Some(&Transform3D::IDENTITY));
        let boxed = box_default(VariantType::Object);
        assert_eq!(boxed.downcast_ref::<Option<ObjectId>>(), Some(&None));
    }

    #[test]
    fn wrong_storage_reads_as_none() {
        let value: i64 = 5;
        assert_eq!(variant_from_native(VariantType::Float, &value), None);
        assert_eq!(variant_from_native(VariantType::Int, &value), Some(Variant::Int(5)));
    }

    #[test]
    fn store_variant_writes_typed_slot() {
        let mut slot = Vector3::ZERO;
        let stored = store_variant(VariantType::Vector3, &mut slot, &Variant::Vector3(Vector3::UP));
        assert_eq!(stored, Ok(true));
        assert_eq!(slot, Vector3::UP);

        let mut wrong = 0i64;
        assert_eq!(store_variant(VariantType::Vector3, &mut wrong, &Variant::Vector3(Vector3::UP)), Ok(false));
    }

    #[test]
    fn argument_addresses_downcast() {
        let position = Vector3::new(1.0, 2.0, 3.0);
        let args: [ArgPtr<'_>; 1] = [&position];
        assert_eq!(arg_as::<Vector3>(args[0]), Some(&position));
        assert_eq!(native_type_name(VariantType::Int), "i64");
    }
}
