//! The engine's tagged value container.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    Basis, Callable, Color, NodePath, ObjectId, Rect2, Rect2i, Rid, StringName, Transform2D, Transform3D, Vector2,
    Vector2i, Vector3, Vector3i,
};

/// Kind tag of a [`Variant`]. Discriminants follow the engine's numbering.
///
/// In method signatures `Nil` stands for "any value" when used as an argument
/// or return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum VariantType {
    Nil = 0,
    Bool = 1,
    Int = 2,
    Float = 3,
    String = 4,
    Vector2 = 5,
    Vector2i = 6,
    Rect2 = 7,
    Rect2i = 8,
    Vector3 = 9,
    Vector3i = 10,
    Transform2D = 11,
    Basis = 17,
    Transform3D = 18,
    Color = 20,
    StringName = 21,
    NodePath = 22,
    Rid = 23,
    Object = 24,
    Callable = 25,
    Dictionary = 27,
    Array = 28,
    PackedByteArray = 29,
    PackedInt32Array = 30,
    PackedInt64Array = 31,
    PackedFloat32Array = 32,
    PackedFloat64Array = 33,
    PackedStringArray = 34,
    PackedVector2Array = 35,
    PackedVector3Array = 36,
    PackedColorArray = 37,
}

impl VariantType {
    /// Engine-facing name of the type.
    pub const fn name(self) -> &'static str {
        match self {
            VariantType::Nil => "Nil",
            VariantType::Bool => "bool",
            VariantType::Int => "int",
            VariantType::Float => "float",
            VariantType::String => "String",
            VariantType::Vector2 => "Vector2",
            VariantType::Vector2i => "Vector2i",
            VariantType::Rect2 => "Rect2",
            VariantType::Rect2i => "Rect2i",
            VariantType::Vector3 => "Vector3",
            VariantType::Vector3i => "Vector3i",
            VariantType::Transform2D => "Transform2D",
            VariantType::Basis => "Basis",
            VariantType::Transform3D => "Transform3D",
            VariantType::Color => "Color",
            VariantType::StringName => "StringName",
            VariantType::NodePath => "NodePath",
            VariantType::Rid => "RID",
            VariantType::Object => "Object",
            VariantType::Callable => "Callable",
            VariantType::Dictionary => "Dictionary",
            VariantType::Array => "Array",
            VariantType::PackedByteArray => "PackedByteArray",
            VariantType::PackedInt32Array => "PackedInt32Array",
            VariantType::PackedInt64Array => "PackedInt64Array",
            VariantType::PackedFloat32Array => "PackedFloat32Array",
            VariantType::PackedFloat64Array => "PackedFloat64Array",
            VariantType::PackedStringArray => "PackedStringArray",
            VariantType::PackedVector2Array => "PackedVector2Array",
            VariantType::PackedVector3Array => "PackedVector3Array",
            VariantType::PackedColorArray => "PackedColorArray",
        }
    }
}

/// An owned engine value of any supported kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Variant {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Vector2(Vector2),
    Vector2i(Vector2i),
    Rect2(Rect2),
    Rect2i(Rect2i),
    Vector3(Vector3),
    Vector3i(Vector3i),
    Transform2D(Transform2D),
    Basis(Basis),
    Transform3D(Transform3D),
    Color(Color),
    StringName(StringName),
    NodePath(NodePath),
    Rid(Rid),
    /// Object pointer; `None` is a null object.
    Object(Option<ObjectId>),
    Callable(Callable),
    Dictionary(Dictionary),
    Array(Vec<Variant>),
    PackedByteArray(Vec<u8>),
    PackedInt32Array(Vec<i32>),
    PackedInt64Array(Vec<i64>),
    PackedFloat32Array(Vec<f32>),
    PackedFloat64Array(Vec<f64>),
    PackedStringArray(Vec<String>),
    PackedVector2Array(Vec<Vector2>),
    PackedVector3Array(Vec<Vector3>),
    PackedColorArray(Vec<Color>),
}

impl Variant {
    /// The kind tag of this value.
    pub fn get_type(&self) -> VariantType {
        match self {
            Variant::Nil => VariantType::Nil,
            Variant::Bool(_) => VariantType::Bool,
            Variant::Int(_) => VariantType::Int,
            Variant::Float(_) => VariantType::Float,
            Variant::String(_) => VariantType::String,
            Variant::Vector2(_) => VariantType::Vector2,
            Variant::Vector2i(_) => VariantType::Vector2i,
            Variant::Rect2(_) => VariantType::Rect2,
            Variant::Rect2i(_) => VariantType::Rect2i,
            Variant::Vector3(_) => VariantType::Vector3,
            Variant::Vector3i(_) => VariantType::Vector3i,
            Variant::Transform2D(_) => VariantType::Transform2D,
            Variant::Basis(_) => VariantType::Basis,
            Variant::Transform3D(_) => VariantType::Transform3D,
            Variant::Color(_) => VariantType::Color,
            Variant::StringName(_) => VariantType::StringName,
            Variant::NodePath(_) => VariantType::NodePath,
            Variant::Rid(_) => VariantType::Rid,
            Variant::Object(_) => VariantType::Object,
            Variant::Callable(_) => VariantType::Callable,
            Variant::Dictionary(_) => VariantType::Dictionary,
            Variant::Array(_) => VariantType::Array,
            Variant::PackedByteArray(_) => VariantType::PackedByteArray,
            Variant::PackedInt32Array(_) => VariantType::PackedInt32Array,
            Variant::PackedInt64Array(_) => VariantType::PackedInt64Array,
            Variant::PackedFloat32Array(_) => VariantType::PackedFloat32Array,
            Variant::PackedFloat64Array(_) => VariantType::PackedFloat64Array,
            Variant::PackedStringArray(_) => VariantType::PackedStringArray,
            Variant::PackedVector2Array(_) => VariantType::PackedVector2Array,
            Variant::PackedVector3Array(_) => VariantType::PackedVector3Array,
            Variant::PackedColorArray(_) => VariantType::PackedColorArray,
        }
    }

    /// Human-readable name of this value's type.
    pub fn type_name(&self) -> &'static str {
        self.get_type().name()
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Variant::Nil)
    }

    /// Nil or a null object.
    pub fn is_null(&self) -> bool {
        matches!(self, Variant::Nil | Variant::Object(None))
    }

    /// Truthiness following the engine's rules: zero, empty and null are false.
    pub fn booleanize(&self) -> bool {
        match self {
            Variant::Nil | Variant::Object(None) => false,
            Variant::Bool(b) => *b,
            Variant::Int(i) => *i != 0,
            Variant::Float(f) => *f != 0.0,
            Variant::String(s) => !s.is_empty(),
            Variant::StringName(s) => !s.is_empty(),
            Variant::Array(a) => !a.is_empty(),
            Variant::Dictionary(d) => !d.is_empty(),
            _ => true,
        }
    }
}

/// An insertion-ordered map of variants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    entries: Vec<(Variant, Variant)>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Variant) -> Option<&Variant> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &Variant) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace, returning the previous value. Keeps the original
    /// position of a replaced key.
    pub fn insert(&mut self, key: Variant, value: Variant) -> Option<Variant> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &Variant) -> Option<Variant> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variant, &Variant)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl FromIterator<(Variant, Variant)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (Variant, Variant)>>(iter: I) -> Self {
        let mut dict = Dictionary::new();
        for (k, v) in iter {
            dict.insert(k, v);
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tags_match_engine_numbering() {
        assert_eq!(u32::from(VariantType::Vector3), 9);
        assert_eq!(u32::from(VariantType::Transform3D), 18);
        assert_eq!(u32::from(VariantType::Object), 24);
        assert_eq!(VariantType::try_from(21u32).ok(), Some(VariantType::StringName));
        assert!(VariantType::try_from(12u32).is_err());
    }

    #[test]
    fn get_type_reports_payload_kind() {
        assert_eq!(Variant::Nil.get_type(), VariantType::Nil);
        assert_eq!(Variant::Int(3).get_type(), VariantType::Int);
        assert_eq!(Variant::Vector3(Vector3::UP).get_type(), VariantType::Vector3);
        assert_eq!(Variant::Object(None).get_type(), VariantType::Object);
        assert_eq!(Variant::PackedInt64Array(vec![1, 2]).type_name(), "PackedInt64Array");
    }

    #[test]
    fn null_and_truthiness() {
        assert!(Variant::Nil.is_null());
        assert!(Variant::Object(None).is_null());
        assert!(!Variant::Int(0).booleanize());
        assert!(Variant::Int(-1).booleanize());
        assert!(!Variant::String(String::new()).booleanize());
        assert!(Variant::Vector3(Vector3::ZERO).booleanize());
    }

    #[test]
    fn dictionary_keeps_insertion_order() {
        let mut dict = Dictionary::new();
        dict.insert(Variant::String("b".into()), Variant::Int(1));
        dict.insert(Variant::String("a".into()), Variant::Int(2));
        assert_eq!(dict.insert(Variant::String("b".into()), Variant::Int(3)), Some(Variant::Int(1)));

        let keys: Vec<_> = dict.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![Variant::String("b".into()), Variant::String("a".into())]);
        assert_eq!(dict.get(&Variant::String("b".into())), Some(&Variant::Int(3)));
    }

    #[test]
    fn dictionary_remove() {
        let mut dict: Dictionary = [(Variant::Int(1), Variant::Bool(true))].into_iter().collect();
        assert!(dict.contains_key(&Variant::Int(1)));
        assert_eq!(dict.remove(&Variant::Int(1)), Some(Variant::Bool(true)));
        assert!(dict.is_empty());
    }
}
