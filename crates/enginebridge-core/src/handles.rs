//! Opaque native handles.
//!
//! These identifiers are only meaningful to the native runtime that issued
//! them. The glue stores and forwards them, never interprets them.

use std::fmt;
use std::num::NonZeroU64;

use crate::StringName;

/// Handle to a native class, resolved by name.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ClassTag(u64);

impl ClassTag {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        ClassTag(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ClassTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassTag({:#x})", self.0)
    }
}

/// Handle to a native method implementation, resolved by
/// (class, method, compatibility hash).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct MethodBind(u64);

impl MethodBind {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        MethodBind(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for MethodBind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodBind({})", self.0)
    }
}

/// Engine instance id of a native object.
///
/// Never zero, so `Option<ObjectId>` is the nullable object pointer the
/// engine passes around.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ObjectId(NonZeroU64);

impl ObjectId {
    /// Build an id from its raw value. Returns `None` for zero.
    #[inline]
    pub const fn from_raw(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(id) => Some(ObjectId(id)),
            None => None,
        }
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Id of a resource owned by an engine server (physics bodies, shapes, buses).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Rid(u64);

impl Rid {
    /// The invalid resource id.
    pub const INVALID: Rid = Rid(0);

    #[inline]
    pub const fn new(raw: u64) -> Self {
        Rid(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// A method bound to a target object, used as a signal connection target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Callable {
    target: Option<ObjectId>,
    method: StringName,
}

impl Callable {
    pub fn new(target: ObjectId, method: impl Into<StringName>) -> Self {
        Self {
            target: Some(target),
            method: method.into(),
        }
    }

    /// A callable with no target. Calling it always fails.
    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<ObjectId> {
        self.target
    }

    pub fn method(&self) -> &StringName {
        &self.method
    }

    pub fn is_valid(&self) -> bool {
        self.target.is_some() && !self.method.is_empty()
    }
}
