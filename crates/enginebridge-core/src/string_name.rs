//! Interned engine names.
//!
//! [`StringName`] is the identifier type used for class, method, property and
//! signal names. Every distinct name is stored once in a process-wide interner,
//! so names are cheap to clone and compare.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use rustc_hash::FxHashSet;

fn interner() -> &'static RwLock<FxHashSet<Arc<str>>> {
    static INTERNER: OnceLock<RwLock<FxHashSet<Arc<str>>>> = OnceLock::new();
    INTERNER.get_or_init(|| RwLock::new(FxHashSet::default()))
}

/// Number of distinct names interned so far. It only grows.
pub fn interned_count() -> usize {
    interner().read().len()
}

/// An immutable, interned name.
#[derive(Clone)]
pub struct StringName(Arc<str>);

impl StringName {
    /// Intern `name`, returning the shared instance.
    ///
    /// Interned names are never released. Every distinct name passed here,
    /// including names built at runtime for dynamic calls, stays in memory
    /// until the process exits.
    pub fn new(name: &str) -> Self {
        if let Some(existing) = interner().read().get(name) {
            return StringName(Arc::clone(existing));
        }

        let mut set = interner().write();
        // Another thread may have interned it between the two locks.
        if let Some(existing) = set.get(name) {
            return StringName(Arc::clone(existing));
        }
        let interned: Arc<str> = Arc::from(name);
        set.insert(Arc::clone(&interned));
        StringName(interned)
    }

    /// The name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether two names share the same interned storage.
    #[inline]
    pub fn ptr_eq(&self, other: &StringName) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for StringName {
    fn default() -> Self {
        StringName::new("")
    }
}

impl PartialEq for StringName {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Eq for StringName {}

impl PartialEq<str> for StringName {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for StringName {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Hash for StringName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must agree with `str`'s hash for the `Borrow<str>` impl.
        self.as_str().hash(state);
    }
}

impl PartialOrd for StringName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StringName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Borrow<str> for StringName {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for StringName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for StringName {
    fn from(name: &str) -> Self {
        StringName::new(name)
    }
}

impl From<&String> for StringName {
    fn from(name: &String) -> Self {
        StringName::new(name)
    }
}

impl From<String> for StringName {
    fn from(name: String) -> Self {
        StringName::new(&name)
    }
}

impl From<&StringName> for StringName {
    fn from(name: &StringName) -> Self {
        name.clone()
    }
}

impl fmt::Debug for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{:?}", self.as_str())
    }
}

impl fmt::Display for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path to a node in the scene tree, such as `"Player/Camera3D"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(String);

impl NodePath {
    pub fn new(path: impl Into<String>) -> Self {
        NodePath(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the path starts at the scene root (`/root/...`).
    pub fn is_absolute(&self) -> bool {
        self.0.starts_with('/')
    }

    /// Path segments separated by `/`, skipping empty ones.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|segment| !segment.is_empty())
    }
}

impl From<&str> for NodePath {
    fn from(path: &str) -> Self {
        NodePath::new(path)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
