//! Deterministic hash identities for native classes and method binds.
//!
//! [`BindHash`] is the key of every handle cache in the bridge. It is computed
//! from names (and, for methods, the compatibility hash) so glue code can build
//! lookup keys in `const` context without consulting the engine.
//!
//! The compatibility hash ([`method_compat_hash`]) is a 32-bit tag derived from
//! a method's name and signature. Generated glue and the native class database
//! compute it the same way, so a signature drift between the two shows up as a
//! failed method lookup rather than a mismatched call.
//!
//! # Examples
//!
//! ```
//! use enginebridge_core::{BindHash, VariantType, method_compat_hash};
//!
//! let node = BindHash::from_class("Node");
//! assert_eq!(node, BindHash::from_class("Node"));
//!
//! let a = method_compat_hash("add_point", &[VariantType::Int, VariantType::Vector3], None);
//! let b = method_compat_hash("add_point", &[VariantType::Vector3, VariantType::Int], None);
//! assert_ne!(a, b);
//! ```

use std::fmt;

use xxhash_rust::const_xxh64::xxh64;

use crate::VariantType;

/// Domain-specific mixing constants for hash computation.
///
/// Classes, methods and plain names hash into separate domains so that a class
/// called `foo` never collides with a method called `foo`.
pub mod hash_constants {
    /// Separator constant used when chaining components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for class hashes.
    pub const CLASS: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for method bind hashes.
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for singleton hashes.
    pub const SINGLETON: u64 = 0x9a7f3d5e2b8c4601;

    /// Domain marker for plain identifier hashes.
    pub const IDENT: u64 = 0x1a095090689d4647;

    /// Domain marker for method return types in compatibility hashes.
    pub const RETURN: u64 = 0x3e9f5d2a8c7b1403;

    /// Parameter position mixing constants.
    /// Each parameter position gets a unique constant so parameter order matters.
    pub const PARAM_MARKERS: [u64; 16] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
        0x7c3e9f2a5b8d1403,
        0x5d8c7b4a3e9f2106,
        0x3f1e9d8c7b5a4203,
        0x1a2b3c4d5e6f7089,
        0x9f8e7d6c5b4a3210,
        0x2468ace013579bdf,
        0xfdb97531eca86420,
        0x123456789abcdef0,
    ];
}

/// A deterministic 64-bit hash identifying a class, method bind, or name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BindHash(pub u64);

impl BindHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: BindHash = BindHash(0);

    /// Hash of a native class name.
    #[inline]
    pub const fn from_class(name: &str) -> Self {
        BindHash(hash_constants::CLASS ^ xxh64(name.as_bytes(), 0))
    }

    /// Hash of a method bind: owning class, method name and compatibility hash.
    ///
    /// Two binds of the same method that differ in compatibility hash are
    /// distinct cache entries.
    #[inline]
    pub const fn from_method(class: BindHash, method: &str, compat: u32) -> Self {
        let hash = hash_constants::METHOD ^ class.0 ^ xxh64(method.as_bytes(), 0);
        BindHash(hash.wrapping_mul(hash_constants::SEP).wrapping_add(compat as u64))
    }

    /// Hash of an engine singleton name.
    #[inline]
    pub const fn from_singleton(name: &str) -> Self {
        BindHash(hash_constants::SINGLETON ^ xxh64(name.as_bytes(), 0))
    }

    /// Hash of a plain identifier.
    #[inline]
    pub const fn from_name(name: &str) -> Self {
        BindHash(hash_constants::IDENT ^ xxh64(name.as_bytes(), 0))
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for BindHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BindHash({:#018x})", self.0)
    }
}

impl fmt::Display for BindHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Compatibility hash of a method signature.
///
/// `ret` is `None` for methods returning nothing. Parameters typed as
/// "any value" use [`VariantType::Nil`].
pub const fn method_compat_hash(method: &str, args: &[VariantType], ret: Option<VariantType>) -> u32 {
    let mut hash = hash_constants::METHOD ^ xxh64(method.as_bytes(), 0);
    let mut i = 0;
    while i < args.len() {
        let marker = if i < hash_constants::PARAM_MARKERS.len() {
            hash_constants::PARAM_MARKERS[i]
        } else {
            hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64)
        };
        hash = hash.wrapping_mul(hash_constants::SEP).wrapping_add(marker ^ (args[i] as u64));
        i += 1;
    }
    let ret_marker = match ret {
        Some(ty) => ty as u64 + 1,
        None => 0,
    };
    hash = hash.wrapping_mul(hash_constants::SEP).wrapping_add(hash_constants::RETURN ^ ret_marker);
    (hash ^ (hash >> 32)) as u32
}
