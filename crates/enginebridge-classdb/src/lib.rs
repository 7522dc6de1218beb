//! In-process native class database.
//!
//! [`ClassDb`] implements [`NativeRuntime`](enginebridge_core::NativeRuntime)
//! without a real engine behind it. Classes, methods, properties and signals
//! are registered at runtime and native method bodies are plain closures over
//! a [`CallContext`]. It backs the glue's tests and benchmarks, and serves as
//! a reference for what an engine-side runtime has to provide.
//!
//! # Example
//!
//! ```
//! use enginebridge_classdb::{ClassDb, ClassInfo, MethodInfo};
//! use enginebridge_core::{StringName, Variant, VariantType};
//!
//! let db = ClassDb::with_core_classes().unwrap();
//! db.register_class(ClassInfo::new("Counter").inherits("Object")).unwrap();
//! db.register_method(
//!     "Counter",
//!     MethodInfo::new("double").arg("value", VariantType::Int).returns(VariantType::Int),
//!     |ctx| {
//!         let value: i64 = ctx.arg(0)?;
//!         ctx.set_return(value * 2)
//!     },
//! )
//! .unwrap();
//!
//! let counter = db.instantiate("Counter").unwrap();
//! let result = db.call_method(counter, &StringName::new("double"), &[Variant::Int(21)]);
//! assert_eq!(result, Ok(Variant::Int(42)));
//! ```

mod call_context;
mod class_db;
mod core_classes;
mod error;
mod info;
mod native_fn;
mod object_heap;

pub use call_context::CallContext;
pub use class_db::{CallConvention, CallRecord, ClassDb, ClassDbStats};
pub use core_classes::register_core_classes;
pub use error::RegistrationError;
pub use info::{ArgInfo, ClassInfo, MethodInfo, PropertyInfo};
pub use native_fn::{NativeCallable, NativeFn};
