//! Engine bit flags.

use bitflags::bitflags;

bitflags! {
    /// Properties of a native method bind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodFlags: u32 {
        const NORMAL = 1 << 0;
        const EDITOR = 1 << 1;
        const CONST = 1 << 2;
        const VIRTUAL = 1 << 3;
        const VARARG = 1 << 4;
        const STATIC = 1 << 5;
    }
}

bitflags! {
    /// Options for a signal connection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ConnectFlags: u32 {
        /// Queue the call until the engine flushes deferred calls.
        const DEFERRED = 1 << 0;
        const PERSIST = 1 << 1;
        /// Disconnect after the first emission.
        const ONE_SHOT = 1 << 2;
        const REFERENCE_COUNTED = 1 << 3;
    }
}

impl MethodFlags {
    /// Flags of an ordinary method.
    pub const DEFAULT: MethodFlags = MethodFlags::NORMAL;
}
