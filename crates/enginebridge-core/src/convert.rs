//! Conversions between Rust values and [`Variant`].
//!
//! - [`FromVariant`]: extract a Rust value from a variant
//! - [`ToVariant`]: wrap a Rust value into a variant
//!
//! Narrowing integer conversions are bounds-checked; `float` accepts `int`
//! values, but not the other way around.

use crate::error::ConversionError;
use crate::{
    Basis, Callable, Color, Dictionary, NodePath, ObjectId, Rect2, Rect2i, Rid, StringName, Transform2D, Transform3D,
    Variant, VariantType, Vector2, Vector2i, Vector3, Vector3i,
};

/// Extract a value from a [`Variant`].
pub trait FromVariant: Sized {
    /// Returns a `ConversionError` if the variant holds an incompatible kind.
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError>;
}

/// Convert a value into a [`Variant`].
pub trait ToVariant {
    fn to_variant(&self) -> Variant;
}

impl FromVariant for Variant {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        Ok(variant.clone())
    }
}

impl ToVariant for Variant {
    fn to_variant(&self) -> Variant {
        self.clone()
    }
}

impl ToVariant for () {
    fn to_variant(&self) -> Variant {
        Variant::Nil
    }
}

impl FromVariant for () {
    fn from_variant(_variant: &Variant) -> Result<Self, ConversionError> {
        Ok(())
    }
}

fn mismatch(expected: VariantType, actual: &Variant) -> ConversionError {
    ConversionError::mismatch(expected, actual.get_type())
}

// ============================================================================
// Integer implementations
// ============================================================================

macro_rules! impl_variant_int {
    ($($ty:ty),*) => {
        $(
            impl FromVariant for $ty {
                fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
                    match variant {
                        Variant::Int(v) => <$ty>::try_from(*v).map_err(|_| ConversionError::IntegerOverflow {
                            value: *v,
                            target_type: stringify!($ty),
                        }),
                        other => Err(mismatch(VariantType::Int, other)),
                    }
                }
            }

            impl ToVariant for $ty {
                fn to_variant(&self) -> Variant {
                    Variant::Int(*self as i64)
                }
            }
        )*
    };
}

impl_variant_int!(i8, i16, i32, i64, u8, u16, u32);

// ============================================================================
// Float implementations
// ============================================================================

impl FromVariant for f64 {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        match variant {
            Variant::Float(v) => Ok(*v),
            Variant::Int(v) => Ok(*v as f64),
            other => Err(mismatch(VariantType::Float, other)),
        }
    }
}

impl ToVariant for f64 {
    fn to_variant(&self) -> Variant {
        Variant::Float(*self)
    }
}

impl FromVariant for f32 {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        let value = f64::from_variant(variant)?;
        if value.is_finite() && (value < f32::MIN as f64 || value > f32::MAX as f64) {
            return Err(ConversionError::FloatConversion {
                value,
                target_type: "f32",
            });
        }
        Ok(value as f32)
    }
}

impl ToVariant for f32 {
    fn to_variant(&self) -> Variant {
        Variant::Float(*self as f64)
    }
}

// ============================================================================
// Strings
// ============================================================================

impl FromVariant for String {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        match variant {
            Variant::String(s) => Ok(s.clone()),
            Variant::StringName(s) => Ok(s.as_str().to_owned()),
            Variant::NodePath(p) => Ok(p.as_str().to_owned()),
            other => Err(mismatch(VariantType::String, other)),
        }
    }
}

impl ToVariant for String {
    fn to_variant(&self) -> Variant {
        Variant::String(self.clone())
    }
}

impl ToVariant for str {
    fn to_variant(&self) -> Variant {
        Variant::String(self.to_owned())
    }
}

impl FromVariant for StringName {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        match variant {
            Variant::StringName(s) => Ok(s.clone()),
            Variant::String(s) => Ok(StringName::new(s)),
            other => Err(mismatch(VariantType::StringName, other)),
        }
    }
}

impl FromVariant for NodePath {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        match variant {
            Variant::NodePath(p) => Ok(p.clone()),
            Variant::String(s) => Ok(NodePath::new(s.as_str())),
            other => Err(mismatch(VariantType::NodePath, other)),
        }
    }
}

// ============================================================================
// Same-kind payloads
// ============================================================================

/// Types stored directly in one `Variant` case.
macro_rules! impl_variant_direct {
    ($($ty:ty => $case:ident),* $(,)?) => {
        $(
            impl ToVariant for $ty {
                fn to_variant(&self) -> Variant {
                    Variant::$case(self.clone())
                }
            }
        )*
    };
}

/// Same-kind payloads that are extracted only from their own case.
macro_rules! impl_from_variant_direct {
    ($($ty:ty => $case:ident),* $(,)?) => {
        $(
            impl FromVariant for $ty {
                fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
                    match variant {
                        Variant::$case(v) => Ok(v.clone()),
                        other => Err(mismatch(VariantType::$case, other)),
                    }
                }
            }
        )*
    };
}

impl_variant_direct! {
    bool => Bool,
    StringName => StringName,
    NodePath => NodePath,
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
    Rid => Rid,
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

impl_from_variant_direct! {
    bool => Bool,
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
    Rid => Rid,
    Callable => Callable,
    Dictionary => Dictionary,
    Vec<Variant> => Array,
    Vec<u8> => PackedByteArray,
    Vec<i32> => PackedInt32Array,
    Vec<i64> => PackedInt64Array,
    Vec<f32> => PackedFloat32Array,
    Vec<f64> => PackedFloat64Array,
    Vec<Vector2> => PackedVector2Array,
    Vec<Vector3> => PackedVector3Array,
    Vec<Color> => PackedColorArray,
}

impl FromVariant for Vec<String> {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        match variant {
            Variant::PackedStringArray(v) => Ok(v.clone()),
            Variant::Array(items) => items.iter().map(String::from_variant).collect(),
            other => Err(mismatch(VariantType::PackedStringArray, other)),
        }
    }
}

// ============================================================================
// Objects
// ============================================================================

impl FromVariant for Option<ObjectId> {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        match variant {
            Variant::Object(id) => Ok(*id),
            Variant::Nil => Ok(None),
            other => Err(mismatch(VariantType::Object, other)),
        }
    }
}

impl ToVariant for Option<ObjectId> {
    fn to_variant(&self) -> Variant {
        Variant::Object(*self)
    }
}

impl FromVariant for ObjectId {
    fn from_variant(variant: &Variant) -> Result<Self, ConversionError> {
        Option::<ObjectId>::from_variant(variant)?.ok_or(ConversionError::NullObject { expected: "Object" })
    }
}

impl ToVariant for ObjectId {
    fn to_variant(&self) -> Variant {
        Variant::Object(Some(*self))
    }
}

impl<T: ToVariant + ?Sized> ToVariant for &T {
    fn to_variant(&self) -> Variant {
        (**self).to_variant()
    }
}
