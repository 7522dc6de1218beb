//! enginebridge proc macros
//!
//! # Macros
//!
//! - `#[derive(ScriptClass)]` - Declare a script class extending an engine class
//!
//! # Example
//!
//! ```ignore
//! use enginebridge::prelude::*;
//!
//! #[derive(ScriptClass)]
//! #[script(base = Node3D, overrides(_ready, _process), signals(hit))]
//! pub struct Player {
//!     base: Base<Node3D>,
//!     speed: f64,
//! }
//! ```

use proc_macro::TokenStream;

mod attrs;
mod derive_script_class;

/// Derive `ScriptClass` for a struct.
///
/// # Attributes
///
/// - `#[script(base = Path)]` - Engine class being extended (required)
/// - `#[script(name = "...")]` - Class name seen by the engine (default: struct name)
/// - `#[script(overrides(_ready, ...))]` - Engine callbacks the class overrides
/// - `#[script(signals(name, ...))]` - Signals the class declares
/// - `#[script(methods(name, ...))]` - Methods callable by name; the type must
///   also implement `ScriptMethods`
///
/// Override names are checked against the base class's callbacks when an
/// instance is created, not at compile time.
#[proc_macro_derive(ScriptClass, attributes(script))]
pub fn derive_script_class(input: TokenStream) -> TokenStream {
    derive_script_class::derive_script_class_impl(input)
}
