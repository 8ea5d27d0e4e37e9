//! Non-owning bridge between libalpm records and a managed host runtime.
//!
//! This crate exposes libalpm database and package records to host languages
//! (Python, Ruby, Crystal, ...) through thin wrapper objects, without copying
//! or owning the records themselves.
//!
//! # Ownership
//!
//! - The library owns every `alpm_db_t`, `alpm_pkg_t` and list it hands out.
//!   Wrappers hold borrowed pointers and never free them.
//! - A database reload or transaction may free records out from under live
//!   wrappers. Callers must not run those concurrently with wrapper use. The
//!   only detected symptom is a NULL handle, reported as `NotInitialized`.
//! - Nothing is cached: every accessor re-reads the record.
//!
//! # Thread Safety
//!
//! Wrappers are NOT `Send` or `Sync`. All calls must happen on the thread
//! that owns the libalpm session.
//!
//! # Memory Management
//!
//! - Sessions from `alpm_bridge_session_new` are freed with `alpm_bridge_session_free`
//! - Database wrappers are freed with `alpm_bridge_db_free`
//! - Package wrappers are freed with `alpm_bridge_pkg_free`
//! - Package arrays are freed with `alpm_bridge_pkg_array_free`
//! - Strings returned by functions must be freed with `alpm_bridge_string_free`
//! - Error messages must be freed with `alpm_bridge_error_free`
//!
//! # Feature Flags
//!
//! - `system-alpm`: link against the system libalpm and enable
//!   `AlpmFunctions::system()` / `alpm_bridge_session_system()`. Both
//!   refuse a libalpm newer than `LAST_STRING_LIST_ABI`.

#![allow(clippy::missing_safety_doc)]

mod db;
mod error;
mod handle;
mod lifecycle;
mod list;
mod package;
mod sys;
mod util;

#[cfg(test)]
mod fake;

pub use db::{
    Database, alpm_bridge_db_get_pkg, alpm_bridge_db_get_pkgcache, alpm_bridge_db_name,
    alpm_bridge_pkg_array_free,
};
pub use error::{AlpmBridgeError, AlpmBridgeErrorCode, BridgeError, Result, alpm_bridge_error_free};
pub use handle::ForeignHandle;
#[cfg(feature = "system-alpm")]
pub use lifecycle::alpm_bridge_session_system;
pub use lifecycle::{
    Session, alpm_bridge_check_abi, alpm_bridge_db_free, alpm_bridge_db_wrap,
    alpm_bridge_pkg_free, alpm_bridge_pkg_wrap, alpm_bridge_session_free,
    alpm_bridge_session_new,
};
pub use list::{AlpmListIter, depend_element, marshal_list, string_element};
pub use package::{
    PACKAGE_PROPERTIES, Package, PackageProperty, PropertyValue, alpm_bridge_pkg_get,
    alpm_bridge_pkg_get_str, alpm_bridge_pkg_invalidate, alpm_bridge_pkg_property_count,
    alpm_bridge_pkg_property_doc, alpm_bridge_pkg_property_name,
};
pub use sys::{
    AlpmFunctions, LAST_STRING_LIST_ABI, alpm_db_t, alpm_depend_t, alpm_list_t, alpm_pkg_t,
    check_abi,
};
pub use util::alpm_bridge_string_free;

use std::os::raw::c_char;

/// Library version string.
///
/// # Returns
///
/// Static string containing the version (e.g., "0.1.0").
/// Do not free this string.
#[unsafe(no_mangle)]
pub extern "C" fn alpm_bridge_version() -> *const c_char {
    // Include null terminator in the static string
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
