//! Utility functions for FFI operations.

use crate::error::{AlpmBridgeError, BridgeError, Result};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Copy a string owned by libalpm into a Rust String.
///
/// `context` names the value in conversion errors.
///
/// # Safety
///
/// `ptr` must be non-null and point to a valid null-terminated C string.
pub unsafe fn native_string(ptr: *const c_char, context: &'static str) -> Result<String> {
    let cstr = unsafe { CStr::from_ptr(ptr) };
    match cstr.to_str() {
        Ok(s) => Ok(s.to_owned()),
        Err(e) => Err(BridgeError::Conversion {
            context,
            reason: e.to_string(),
        }),
    }
}

/// Convert a C string argument to a Rust String.
///
/// NULL and invalid UTF-8 are both reported as a type error with `type_msg`,
/// since the host passed something that is not a string.
///
/// # Safety
///
/// The caller must ensure `ptr` is either null or points to a valid
/// null-terminated C string.
pub unsafe fn cstr_to_string(ptr: *const c_char, type_msg: &str) -> Result<String> {
    if ptr.is_null() {
        return Err(BridgeError::Type(type_msg.to_owned()));
    }

    let cstr = unsafe { CStr::from_ptr(ptr) };
    match cstr.to_str() {
        Ok(s) => Ok(s.to_owned()),
        Err(_) => Err(BridgeError::Type(type_msg.to_owned())),
    }
}

/// Convert a Rust string to a C string, returning an owned pointer.
///
/// The caller is responsible for freeing the returned pointer with
/// `alpm_bridge_string_free`. Returns null if the string contains internal
/// null bytes.
pub fn string_to_cstr(s: String) -> *mut c_char {
    CString::new(s)
        .map(CString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

/// Set an error in the out-parameter and return null.
///
/// # Safety
///
/// The caller must ensure `error` is either null or a valid pointer.
pub unsafe fn set_error_null<T>(error: *mut AlpmBridgeError, err: BridgeError) -> *mut T {
    if let Some(e) = unsafe { error.as_mut() } {
        *e = err.into();
    }
    std::ptr::null_mut()
}

/// Set success in the out-parameter error.
///
/// # Safety
///
/// The caller must ensure `error` is either null or a valid pointer.
pub unsafe fn set_ok(error: *mut AlpmBridgeError) {
    if let Some(e) = unsafe { error.as_mut() } {
        *e = AlpmBridgeError::ok();
    }
}

/// Free a string returned by the bridge.
///
/// # Safety
///
/// - `str` must be a string returned by an `alpm_bridge_*` function, or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_string_free(str: *mut c_char) {
    if !str.is_null() {
        unsafe {
            drop(CString::from_raw(str));
        }
    }
}
