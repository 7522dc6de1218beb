//! Call context passed to native method implementations.

use std::any::{Any, type_name};

use enginebridge_core::native::{self, ArgPtr, RetPtr};
use enginebridge_core::{CallError, ConversionError, EngineError, NativeType, ObjectId, StringName, Variant};

use crate::{ClassDb, MethodInfo};

/// Arguments as they arrived at the method.
pub(crate) enum CallArgs<'a> {
    /// Typed native storage, one entry per declared parameter.
    Ptr(&'a [ArgPtr<'a>]),
    /// Variants, for vararg methods.
    Var(&'a [&'a Variant]),
}

/// Where the method writes its result.
pub(crate) enum CallRet<'a> {
    Ptr(RetPtr<'a>),
    Var(&'a mut Variant),
}

/// Context for one native method invocation.
///
/// Gives the implementation its receiver, typed arguments and return slot,
/// plus access back into the class database.
///
/// ```ignore
/// db.register_method("AStar3D", info, |ctx| {
///     let id: i64 = ctx.arg(0)?;
///     let found = ctx.with_data(|points: &mut Points| points.contains_key(&id))?;
///     ctx.set_return(found)
/// })?;
/// ```
pub struct CallContext<'a> {
    db: &'a ClassDb,
    info: &'a MethodInfo,
    instance: Option<ObjectId>,
    args: CallArgs<'a>,
    ret: CallRet<'a>,
}

impl<'a> CallContext<'a> {
    pub(crate) fn new(
        db: &'a ClassDb,
        info: &'a MethodInfo,
        instance: Option<ObjectId>,
        args: CallArgs<'a>,
        ret: CallRet<'a>,
    ) -> Self {
        Self {
            db,
            info,
            instance,
            args,
            ret,
        }
    }

    /// The class database handling this call.
    pub fn db(&self) -> &'a ClassDb {
        self.db
    }

    /// Name of the method being called.
    pub fn method(&self) -> &StringName {
        &self.info.name
    }

    /// The receiver, or `InstanceIsNull` for calls without one.
    pub fn instance(&self) -> Result<ObjectId, CallError> {
        self.instance.ok_or(CallError::InstanceIsNull)
    }

    pub fn arg_count(&self) -> usize {
        match &self.args {
            CallArgs::Ptr(args) => args.len(),
            CallArgs::Var(args) => args.len(),
        }
    }

    /// Typed argument at `index`.
    ///
    /// `T` must be the native representation of the declared parameter type.
    pub fn arg<T: NativeType>(&self, index: usize) -> Result<T, CallError> {
        match &self.args {
            CallArgs::Ptr(args) => {
                let arg = args.get(index).ok_or(CallError::TooFewArguments {
                    expected: index + 1,
                    got: args.len(),
                })?;
                native::arg_as::<T>(*arg).cloned().ok_or(CallError::InvalidArgument {
                    index,
                    source: ConversionError::TypeMismatch {
                        expected: type_name::<T>(),
                        actual: "other native storage",
                    },
                })
            }
            CallArgs::Var(args) => {
                let arg = args.get(index).ok_or(CallError::TooFewArguments {
                    expected: index + 1,
                    got: args.len(),
                })?;
                T::from_variant(arg).map_err(|source| CallError::InvalidArgument { index, source })
            }
        }
    }

    /// Argument at `index` as a variant, using the declared parameter type.
    pub fn arg_variant(&self, index: usize) -> Result<Variant, CallError> {
        match &self.args {
            CallArgs::Var(args) => args.get(index).map(|v| (*v).clone()).ok_or(CallError::TooFewArguments {
                expected: index + 1,
                got: args.len(),
            }),
            CallArgs::Ptr(args) => {
                let arg = args.get(index).ok_or(CallError::TooFewArguments {
                    expected: index + 1,
                    got: args.len(),
                })?;
                let ty = self.info.args.get(index).map(|a| a.ty).ok_or(CallError::TooManyArguments {
                    expected: self.info.args.len(),
                    got: index + 1,
                })?;
                native::variant_from_native(ty, *arg).ok_or(CallError::InvalidArgument {
                    index,
                    source: ConversionError::TypeMismatch {
                        expected: native::native_type_name(ty),
                        actual: "other native storage",
                    },
                })
            }
        }
    }

    /// All arguments as variants.
    pub fn args_as_variants(&self) -> Result<Vec<Variant>, CallError> {
        (0..self.arg_count()).map(|i| self.arg_variant(i)).collect()
    }

    /// Write a typed return value.
    pub fn set_return<T: NativeType>(&mut self, value: T) -> Result<(), CallError> {
        match &mut self.ret {
            CallRet::Var(slot) => {
                **slot = value.to_variant();
                Ok(())
            }
            CallRet::Ptr(slot) => {
                let slot: &mut (dyn Any + Send + Sync) = &mut **slot;
                match slot.downcast_mut::<T>() {
                    Some(slot) => {
                        *slot = value;
                        Ok(())
                    }
                    // Caller asked for a variant result from a typed method.
                    None => match slot.downcast_mut::<Variant>() {
                        Some(slot) => {
                            *slot = value.to_variant();
                            Ok(())
                        }
                        None => Err(CallError::ReturnTypeMismatch {
                            expected: type_name::<T>(),
                        }),
                    },
                }
            }
        }
    }

    /// Write a return value given as a variant, converting it to the declared
    /// return type.
    pub fn set_return_variant(&mut self, value: Variant) -> Result<(), CallError> {
        match &mut self.ret {
            CallRet::Var(slot) => {
                **slot = value;
                Ok(())
            }
            CallRet::Ptr(slot) => {
                let Some(ty) = self.info.ret else {
                    return Ok(());
                };
                let stored = native::store_variant(ty, &mut **slot, &value).map_err(|source| {
                    log::error!("{}: cannot return {}: {source}", self.info.name, value.type_name());
                    CallError::ReturnTypeMismatch {
                        expected: native::native_type_name(ty),
                    }
                })?;
                if stored {
                    Ok(())
                } else {
                    Err(CallError::ReturnTypeMismatch {
                        expected: native::native_type_name(ty),
                    })
                }
            }
        }
    }

    /// Run `f` on the receiver's native state of type `D`.
    pub fn with_data<D: Any, R>(&self, f: impl FnOnce(&mut D) -> R) -> Result<R, CallError> {
        let id = self.instance()?;
        let data = self.db.object_data(id).ok_or(CallError::InstanceIsNull)?;
        for slot in &data {
            let mut guard = slot.lock();
            if let Some(state) = guard.downcast_mut::<D>() {
                return Ok(f(state));
            }
        }
        log::error!("{}: instance {id} has no native state of type {}", self.info.name, type_name::<D>());
        Err(CallError::InvalidMethod)
    }

    /// Give the receiver's script a chance to handle a virtual callback.
    /// `Ok(None)` means no script override exists.
    pub fn call_virtual(&self, method: &str, args: &[Variant]) -> Result<Option<Variant>, CallError> {
        self.db.call_virtual(self.instance()?, method, args)
    }

    /// Emit a signal from the receiver.
    pub fn emit_signal(&self, signal: &str, args: &[Variant]) -> Result<(), EngineError> {
        let id = self.instance().map_err(|_| EngineError::InvalidParameter)?;
        self.db.emit_signal(id, &StringName::new(signal), args)
    }
}
