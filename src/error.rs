use enginebridge_core::CallError;
use thiserror::Error;

/// Failure to bind the glue to the running engine.
///
/// These mean the glue and the engine disagree about what exists, usually
/// because they were built from different API versions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    /// The engine has no class with this name.
    #[error("class not found: {0}")]
    ClassNotFound(String),

    /// The engine has no method matching the name and compatibility hash.
    #[error("method not found: {class}::{method} (hash {hash:#010x})")]
    MethodNotFound {
        class: &'static str,
        method: &'static str,
        /// Compatibility hash the glue asked for.
        hash: u32,
    },

    /// The engine has no singleton with this name.
    #[error("singleton not found: {0}")]
    SingletonNotFound(String),

    /// [`initialize`](crate::initialize) was called twice.
    #[error("the global bridge is already initialized")]
    AlreadyInitialized,

    /// A script class lists an override its base class does not have.
    #[error("script class {class} overrides unknown method {method}")]
    UnknownOverride {
        class: &'static str,
        method: &'static str,
    },

    /// The engine rejected a call made while binding.
    #[error(transparent)]
    Call(#[from] CallError),
}
