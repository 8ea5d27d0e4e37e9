//! Error handling for the bridge.
//!
//! `BridgeError` is what the safe Rust wrappers return. At the C boundary it
//! is flattened into the `#[repr(C)]` `AlpmBridgeError` out-parameter.
//!
//! A lookup miss is never an error: `Database::get_pkg` returns `Ok(None)`
//! and the C entry point returns NULL with the code left at `Ok`.

use std::ffi::CString;
use std::os::raw::c_char;

use thiserror::Error;

/// Errors raised while marshalling native records into the host.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The caller supplied an argument of the wrong shape. No native call
    /// was made.
    #[error("{0}")]
    Type(String),

    /// The wrapper's native handle is null.
    #[error("data is not initialized")]
    NotInitialized,

    /// The library returned no value for a scalar field.
    #[error("unable to get {field}")]
    FieldUnavailable { field: &'static str },

    /// Host-side resource exhaustion while building a wrapper or sequence.
    #[error("{0}")]
    Allocation(String),

    /// A native value could not be converted into a host value.
    #[error("unable to convert {context}: {reason}")]
    Conversion {
        context: &'static str,
        reason: String,
    },

    /// No property with this name exists on the wrapper type.
    #[error("'{type_name}' object has no attribute '{name}'")]
    UnknownAttribute {
        type_name: &'static str,
        name: String,
    },

    /// A wrapper pointer passed across the C ABI was null.
    #[error("invalid or null handle")]
    InvalidHandle,

    /// A required out-parameter or argument pointer was null.
    #[error("null pointer passed for parameter: {0}")]
    NullPointer(&'static str),

    /// The linked libalpm lays out package lists differently from
    /// `AlpmFunctions`.
    #[error("unsupported libalpm version {version}: package lists are not string lists")]
    UnsupportedAbi { version: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Error codes for C ABI functions.
///
/// These codes are stable and can be matched by host bindings.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlpmBridgeErrorCode {
    /// No error
    Ok = 0,

    // Caller errors (1-9)
    /// Argument of the wrong type
    Type = 1,
    /// Unknown attribute name
    UnknownAttribute = 2,

    // Record access errors (10-19)
    /// Wrapper handle is null
    NotInitialized = 10,
    /// Scalar field not available from the library
    FieldUnavailable = 11,
    /// Native value could not be converted
    Conversion = 12,

    // Runtime errors (20-29)
    /// Wrapper or sequence allocation failed
    Allocation = 20,
    /// JSON serialization failed
    Json = 21,
    /// Linked libalpm does not match the entry-point table
    UnsupportedAbi = 22,

    // FFI-specific errors (100+)
    /// Null pointer passed
    NullPointer = 100,
    /// Invalid wrapper handle
    InvalidHandle = 103,
}

/// Error structure returned via out-parameter.
///
/// # Memory Ownership
///
/// The `message` field is owned by the bridge when non-null.
/// Call `alpm_bridge_error_free()` to release it.
///
/// Every call that takes an error out-parameter overwrites it without
/// reading it, so a message left in the struct leaks. When one struct is
/// reused across calls, free it after each failure.
#[repr(C)]
pub struct AlpmBridgeError {
    /// Error code
    pub code: AlpmBridgeErrorCode,
    /// Error message (NULL if code == Ok)
    pub message: *mut c_char,
}

impl AlpmBridgeError {
    /// Create a success result (no error).
    pub fn ok() -> Self {
        Self {
            code: AlpmBridgeErrorCode::Ok,
            message: std::ptr::null_mut(),
        }
    }

    fn with_message(code: AlpmBridgeErrorCode, msg: String) -> Self {
        Self {
            code,
            message: CString::new(msg)
                .map(CString::into_raw)
                .unwrap_or(std::ptr::null_mut()),
        }
    }
}

impl From<BridgeError> for AlpmBridgeError {
    fn from(e: BridgeError) -> Self {
        let code = error_code(&e);
        Self::with_message(code, e.to_string())
    }
}

fn error_code(e: &BridgeError) -> AlpmBridgeErrorCode {
    match e {
        BridgeError::Type(_) => AlpmBridgeErrorCode::Type,
        BridgeError::NotInitialized => AlpmBridgeErrorCode::NotInitialized,
        BridgeError::FieldUnavailable { .. } => AlpmBridgeErrorCode::FieldUnavailable,
        BridgeError::Allocation(_) => AlpmBridgeErrorCode::Allocation,
        BridgeError::Conversion { .. } => AlpmBridgeErrorCode::Conversion,
        BridgeError::UnknownAttribute { .. } => AlpmBridgeErrorCode::UnknownAttribute,
        BridgeError::InvalidHandle => AlpmBridgeErrorCode::InvalidHandle,
        BridgeError::NullPointer(_) => AlpmBridgeErrorCode::NullPointer,
        BridgeError::Json(_) => AlpmBridgeErrorCode::Json,
        BridgeError::UnsupportedAbi { .. } => AlpmBridgeErrorCode::UnsupportedAbi,
    }
}

/// Free error message memory.
///
/// Safe to call with NULL error or NULL message.
///
/// # Safety
///
/// The error pointer must be valid or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_error_free(error: *mut AlpmBridgeError) {
    if error.is_null() {
        return;
    }
    unsafe {
        let err = &mut *error;
        if !err.message.is_null() {
            drop(CString::from_raw(err.message));
            err.message = std::ptr::null_mut();
        }
    }
}
