//! Error types shared by the glue and the native runtime.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

use crate::VariantType;

// ============================================================================
// Conversion Errors
// ============================================================================

/// A value could not be converted between its managed and native forms.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The value has a different kind than the one expected.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Actual type name.
        actual: &'static str,
    },

    /// Integer value doesn't fit in the target type.
    #[error("integer overflow: {value} doesn't fit in {target_type}")]
    IntegerOverflow {
        /// The value that overflowed.
        value: i64,
        /// The target type name.
        target_type: &'static str,
    },

    /// Float value can't be represented in the target type.
    #[error("float conversion error: {value} can't be converted to {target_type}")]
    FloatConversion {
        /// The float value.
        value: f64,
        /// The target type name.
        target_type: &'static str,
    },

    /// A null object was received where an instance is required.
    #[error("null object where {expected} is required")]
    NullObject {
        /// Expected class name.
        expected: &'static str,
    },

    /// An integer does not name a variant of the target enum.
    #[error("{value} is not a valid {enum_name}")]
    InvalidEnum {
        /// The integer received.
        value: i64,
        /// The enum type name.
        enum_name: &'static str,
    },
}

impl ConversionError {
    pub fn mismatch(expected: VariantType, actual: VariantType) -> Self {
        ConversionError::TypeMismatch {
            expected: expected.name(),
            actual: actual.name(),
        }
    }
}

// ============================================================================
// Call Errors
// ============================================================================

/// Engine numbering of call error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum CallErrorKind {
    InvalidMethod = 1,
    InvalidArgument = 2,
    TooManyArguments = 3,
    TooFewArguments = 4,
    InstanceIsNull = 5,
    MethodNotConst = 6,
    /// Not an engine code; reported when an instance is already executing.
    InstanceBusy = 100,
}

/// A call through the native boundary failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// No method with that name (or handle) exists on the target.
    #[error("invalid method")]
    InvalidMethod,

    /// An argument could not be converted to the parameter type.
    #[error("invalid argument {index}: {source}")]
    InvalidArgument {
        /// Zero-based argument position.
        index: usize,
        /// Why the conversion failed.
        source: ConversionError,
    },

    #[error("too many arguments: expected {expected}, got {got}")]
    TooManyArguments { expected: usize, got: usize },

    #[error("too few arguments: expected {expected}, got {got}")]
    TooFewArguments { expected: usize, got: usize },

    /// The target object does not exist (never created or already freed).
    #[error("instance is null")]
    InstanceIsNull,

    #[error("method is not const")]
    MethodNotConst,

    /// The target script instance is already executing a call.
    #[error("instance is busy")]
    InstanceBusy,

    /// The caller's return storage does not match the method's return type.
    #[error("return type mismatch: method returns {expected}")]
    ReturnTypeMismatch {
        /// Type the method writes.
        expected: &'static str,
    },
}

impl CallError {
    /// Engine error kind for this error.
    pub fn kind(&self) -> CallErrorKind {
        match self {
            CallError::InvalidMethod | CallError::ReturnTypeMismatch { .. } => CallErrorKind::InvalidMethod,
            CallError::InvalidArgument { .. } => CallErrorKind::InvalidArgument,
            CallError::TooManyArguments { .. } => CallErrorKind::TooManyArguments,
            CallError::TooFewArguments { .. } => CallErrorKind::TooFewArguments,
            CallError::InstanceIsNull => CallErrorKind::InstanceIsNull,
            CallError::MethodNotConst => CallErrorKind::MethodNotConst,
            CallError::InstanceBusy => CallErrorKind::InstanceBusy,
        }
    }

    /// Check an argument count against a method's parameter range.
    pub fn check_arg_count(got: usize, min: usize, max: usize) -> Result<(), CallError> {
        if got < min {
            Err(CallError::TooFewArguments { expected: min, got })
        } else if got > max {
            Err(CallError::TooManyArguments { expected: max, got })
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Engine Status Codes
// ============================================================================

/// Status codes returned by engine methods such as `connect` and `emit_signal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, TryFromPrimitive, IntoPrimitive)]
#[repr(i64)]
pub enum EngineError {
    #[error("generic failure")]
    Failed = 1,
    #[error("unavailable")]
    Unavailable = 2,
    #[error("invalid parameter")]
    InvalidParameter = 31,
    #[error("already exists")]
    AlreadyExists = 32,
    #[error("does not exist")]
    DoesNotExist = 33,
    #[error("busy")]
    Busy = 44,
}

impl EngineError {
    /// The success code.
    pub const OK: i64 = 0;

    /// Interpret an engine status code. Unknown non-zero codes map to `Failed`.
    pub fn check(code: i64) -> Result<(), EngineError> {
        if code == Self::OK {
            return Ok(());
        }
        Err(EngineError::try_from(code).unwrap_or(EngineError::Failed))
    }

    pub fn code(self) -> i64 {
        self.into()
    }
}
