use thiserror::Error;

/// Errors raised while registering classes, methods, properties and signals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A class with this name already exists.
    #[error("duplicate class: {0}")]
    DuplicateClass(String),

    /// A referenced class (owner or parent) was not registered.
    #[error("unknown class: {0}")]
    UnknownClass(String),

    /// A method with the same name and compatibility hash already exists on the class.
    #[error("duplicate method: {class}::{method} (hash {hash:#010x})")]
    DuplicateMethod {
        /// Owning class.
        class: String,
        /// Method name.
        method: String,
        /// Compatibility hash of the signature.
        hash: u32,
    },

    /// More default arguments than parameters.
    #[error("method {method} declares {defaults} defaults for {params} parameters")]
    TooManyDefaults {
        method: String,
        defaults: usize,
        params: usize,
    },

    /// A singleton with this name already exists.
    #[error("duplicate singleton: {0}")]
    DuplicateSingleton(String),
}
