//! Registration descriptors for classes, methods and properties.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use enginebridge_core::{MethodFlags, StringName, Variant, VariantType, method_compat_hash};

/// Creates the per-instance native state of a class.
pub(crate) type DataFactory = Arc<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;

/// Description of a native class.
#[derive(Clone)]
pub struct ClassInfo {
    pub(crate) name: StringName,
    pub(crate) parent: Option<StringName>,
    pub(crate) refcounted: bool,
    pub(crate) instantiable: bool,
    pub(crate) data: Option<DataFactory>,
}

impl ClassInfo {
    /// A root class with no parent.
    pub fn new(name: &str) -> Self {
        Self {
            name: StringName::new(name),
            parent: None,
            refcounted: false,
            instantiable: true,
            data: None,
        }
    }

    /// Set the parent class. Reference counting is inherited from the parent.
    pub fn inherits(mut self, parent: &str) -> Self {
        self.parent = Some(StringName::new(parent));
        self
    }

    /// Mark instances as reference counted.
    pub fn refcounted(mut self) -> Self {
        self.refcounted = true;
        self
    }

    /// Forbid construction through the class database. Singletons of the
    /// class can still be registered.
    pub fn not_instantiable(mut self) -> Self {
        self.instantiable = false;
        self
    }

    /// Give each instance a default-constructed native state of type `T`.
    pub fn with_data<T: Any + Send + Default>(mut self) -> Self {
        self.data = Some(Arc::new(|| Box::new(T::default()) as Box<dyn Any + Send>));
        self
    }

    pub fn name(&self) -> &StringName {
        &self.name
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("refcounted", &self.refcounted)
            .field("instantiable", &self.instantiable)
            .field("has_data", &self.data.is_some())
            .finish()
    }
}

/// A named, typed method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgInfo {
    pub name: StringName,
    pub ty: VariantType,
}

/// Signature and calling properties of a native method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub name: StringName,
    pub args: Vec<ArgInfo>,
    /// Defaults for the trailing parameters, in parameter order.
    pub defaults: Vec<Variant>,
    /// `None` for methods returning nothing; `Some(Nil)` returns any value.
    pub ret: Option<VariantType>,
    pub flags: MethodFlags,
}

impl MethodInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: StringName::new(name),
            args: Vec::new(),
            defaults: Vec::new(),
            ret: None,
            flags: MethodFlags::DEFAULT,
        }
    }

    pub fn arg(mut self, name: &str, ty: VariantType) -> Self {
        self.args.push(ArgInfo {
            name: StringName::new(name),
            ty,
        });
        self
    }

    /// Default for the next trailing parameter. Call in parameter order.
    pub fn default_arg(mut self, value: Variant) -> Self {
        self.defaults.push(value);
        self
    }

    pub fn returns(mut self, ty: VariantType) -> Self {
        self.ret = Some(ty);
        self
    }

    pub fn flags(mut self, flags: MethodFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Accept extra arguments beyond the declared ones, as variants.
    pub fn vararg(self) -> Self {
        self.flags(MethodFlags::VARARG)
    }

    pub fn is_vararg(&self) -> bool {
        self.flags.contains(MethodFlags::VARARG)
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    /// Number of parameters without a default.
    pub fn required_args(&self) -> usize {
        self.args.len().saturating_sub(self.defaults.len())
    }

    /// Default value of parameter `index`, if it has one.
    pub fn default_for(&self, index: usize) -> Option<&Variant> {
        let first_default = self.required_args();
        index.checked_sub(first_default).and_then(|i| self.defaults.get(i))
    }

    /// Compatibility hash of this signature.
    pub fn compat_hash(&self) -> u32 {
        let types: Vec<VariantType> = self.args.iter().map(|a| a.ty).collect();
        method_compat_hash(self.name.as_str(), &types, self.ret)
    }
}

/// A class property backed by setter and getter methods.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    pub name: StringName,
    pub ty: VariantType,
    pub setter: Option<StringName>,
    pub getter: Option<StringName>,
}

impl PropertyInfo {
    pub fn new(name: &str, ty: VariantType) -> Self {
        Self {
            name: StringName::new(name),
            ty,
            setter: None,
            getter: None,
        }
    }

    pub fn setter(mut self, method: &str) -> Self {
        self.setter = Some(StringName::new(method));
        self
    }

    pub fn getter(mut self, method: &str) -> Self {
        self.getter = Some(StringName::new(method));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_trailing_parameters() {
        let info = MethodInfo::new("add_point")
            .arg("id", VariantType::Int)
            .arg("position", VariantType::Vector3)
            .arg("weight_scale", VariantType::Float)
            .default_arg(Variant::Float(1.0));

        assert_eq!(info.required_args(), 2);
        assert_eq!(info.default_for(1), None);
        assert_eq!(info.default_for(2), Some(&Variant::Float(1.0)));
    }

    #[test]
    fn compat_hash_matches_free_function() {
        let info = MethodInfo::new("get_position").returns(VariantType::Vector3);
        assert_eq!(
            info.compat_hash(),
            method_compat_hash("get_position", &[], Some(VariantType::Vector3))
        );
    }

    #[test]
    fn vararg_flag() {
        let info = MethodInfo::new("call").arg("method", VariantType::StringName).vararg();
        assert!(info.is_vararg());
        assert!(!info.is_static());
    }
}
