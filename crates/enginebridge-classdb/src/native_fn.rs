//! Native method implementations.

use std::fmt;
use std::sync::Arc;

use enginebridge_core::CallError;

use crate::CallContext;

/// Type-erased native method implementation.
///
/// Cloning shares the underlying callable.
#[derive(Clone)]
pub struct NativeFn {
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl NativeFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut CallContext<'_>) -> Result<(), CallError> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Run the implementation against a call context.
    pub fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), CallError> {
        self.inner.call(ctx)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn").finish_non_exhaustive()
    }
}

/// Anything that can serve as a native method body.
pub trait NativeCallable {
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), CallError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut CallContext<'_>) -> Result<(), CallError>,
{
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), CallError> {
        (self)(ctx)
    }
}
