//! Database wrapper: package lookup and listing over one `alpm_db_t`.

use std::ffi::CString;
use std::fmt;
use std::os::raw::c_char;
use std::sync::Arc;

use crate::error::{AlpmBridgeError, BridgeError, Result};
use crate::handle::ForeignHandle;
use crate::list::marshal_list;
use crate::package::Package;
use crate::sys::{AlpmFunctions, alpm_db_t, alpm_pkg_t};
use crate::util::{cstr_to_string, native_string, set_error_null, set_ok, string_to_cstr};

const GET_PKG_TYPE_ERROR: &str = "get_pkg() takes a string argument";

/// Non-owning wrapper around a libalpm database record.
///
/// Unlike `Package`, operations do not run the null-handle guard: the
/// library's own lookups tolerate a NULL database and report no result.
pub struct Database {
    handle: ForeignHandle<alpm_db_t>,
    lib: Arc<AlpmFunctions>,
}

impl Database {
    pub(crate) fn new(lib: Arc<AlpmFunctions>, db: *mut alpm_db_t) -> Self {
        Self {
            handle: ForeignHandle::from_raw(db),
            lib,
        }
    }

    /// Get the handle to the native database record.
    pub fn handle(&self) -> &ForeignHandle<alpm_db_t> {
        &self.handle
    }

    /// Forget the native record.
    pub fn invalidate(&mut self) {
        self.handle.invalidate();
    }

    /// Repository name, e.g. `core` or `local`.
    pub fn name(&self) -> Result<String> {
        let name = unsafe { (self.lib.db_get_name)(self.handle.as_ptr()) };
        if name.is_null() {
            return Err(BridgeError::FieldUnavailable { field: "name" });
        }
        unsafe { native_string(name, "name") }
    }

    /// Find a package by exact name.
    ///
    /// `Ok(None)` means the database has no such package. Names that cannot
    /// be passed to C (interior NUL) are rejected before any lookup.
    pub fn get_pkg(&self, name: &str) -> Result<Option<Package>> {
        let c_name = CString::new(name).map_err(|_| BridgeError::Type(GET_PKG_TYPE_ERROR.into()))?;

        let pkg = unsafe { (self.lib.db_get_pkg)(self.handle.as_ptr(), c_name.as_ptr()) };
        if pkg.is_null() {
            tracing::debug!(name, "package not found");
            return Ok(None);
        }

        tracing::debug!(name, "package found");
        Ok(Some(Package::new(Arc::clone(&self.lib), pkg)))
    }

    /// Wrap every package in the database's package cache.
    ///
    /// Order is whatever the library enumerates; callers must not assume
    /// it is sorted.
    pub fn get_pkgcache(&self) -> Result<Vec<Package>> {
        let head = unsafe { (self.lib.db_get_pkgcache)(self.handle.as_ptr()) };
        let pkgs = unsafe {
            marshal_list(head, |data| {
                Ok(Package::new(Arc::clone(&self.lib), data as *mut alpm_pkg_t))
            })
        }?;

        tracing::debug!(count = pkgs.len(), "wrapped package cache");
        Ok(pkgs)
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

/// Look up a package by name.
///
/// # Parameters
///
/// - `db`: Database wrapper
/// - `name`: Package name (null-terminated UTF-8 string)
/// - `error`: Out-parameter for error information
///
/// # Returns
///
/// A new package wrapper on success. NULL with `error->code == Ok` when the
/// database has no such package; NULL with an error code on failure.
/// Caller owns the wrapper and must free it with `alpm_bridge_pkg_free()`.
///
/// # Safety
///
/// - `db` must be a wrapper returned by this library, or NULL
/// - `name` must be a valid null-terminated string or NULL
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_db_get_pkg(
    db: *const Database,
    name: *const c_char,
    error: *mut AlpmBridgeError,
) -> *mut Package {
    let db = match unsafe { db.as_ref() } {
        Some(d) => d,
        None => return unsafe { set_error_null(error, BridgeError::InvalidHandle) },
    };

    let name = match unsafe { cstr_to_string(name, GET_PKG_TYPE_ERROR) } {
        Ok(s) => s,
        Err(e) => return unsafe { set_error_null(error, e) },
    };

    match db.get_pkg(&name) {
        Ok(Some(pkg)) => {
            unsafe { set_ok(error) };
            Box::into_raw(Box::new(pkg))
        }
        Ok(None) => {
            unsafe { set_ok(error) };
            std::ptr::null_mut()
        }
        Err(e) => unsafe { set_error_null(error, e) },
    }
}

/// List the database's package cache.
///
/// # Parameters
///
/// - `db`: Database wrapper
/// - `out_len`: Receives the number of packages (must not be NULL)
/// - `error`: Out-parameter for error information
///
/// # Returns
///
/// Array of `*out_len` package wrappers in library order. An empty cache
/// returns NULL with `*out_len == 0` and `error->code == Ok`.
///
/// # Ownership
///
/// Each wrapper is freed with `alpm_bridge_pkg_free()`; the array itself
/// with `alpm_bridge_pkg_array_free()`.
///
/// # Safety
///
/// - `db` must be a wrapper returned by this library, or NULL
/// - `out_len` must be a valid pointer
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_db_get_pkgcache(
    db: *const Database,
    out_len: *mut usize,
    error: *mut AlpmBridgeError,
) -> *mut *mut Package {
    let db = match unsafe { db.as_ref() } {
        Some(d) => d,
        None => return unsafe { set_error_null(error, BridgeError::InvalidHandle) },
    };

    let out_len = match unsafe { out_len.as_mut() } {
        Some(l) => l,
        None => return unsafe { set_error_null(error, BridgeError::NullPointer("out_len")) },
    };
    *out_len = 0;

    let pkgs = match db.get_pkgcache() {
        Ok(p) => p,
        Err(e) => return unsafe { set_error_null(error, e) },
    };

    unsafe { set_ok(error) };
    if pkgs.is_empty() {
        return std::ptr::null_mut();
    }

    let array: Box<[*mut Package]> = pkgs
        .into_iter()
        .map(|p| Box::into_raw(Box::new(p)))
        .collect();
    *out_len = array.len();
    Box::into_raw(array) as *mut *mut Package
}

/// Free an array returned by `alpm_bridge_db_get_pkgcache`.
///
/// The package wrappers it holds are not freed.
///
/// # Safety
///
/// `array` and `len` must come from the same `alpm_bridge_db_get_pkgcache`
/// call, or `array` must be NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_pkg_array_free(array: *mut *mut Package, len: usize) {
    if array.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(array, len)));
    }
}

/// Get the database name.
///
/// Caller must free the result with `alpm_bridge_string_free()`.
///
/// # Safety
///
/// - `db` must be a wrapper returned by this library, or NULL
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_db_name(
    db: *const Database,
    error: *mut AlpmBridgeError,
) -> *mut c_char {
    let db = match unsafe { db.as_ref() } {
        Some(d) => d,
        None => return unsafe { set_error_null(error, BridgeError::InvalidHandle) },
    };

    match db.name() {
        Ok(name) => {
            unsafe { set_ok(error) };
            string_to_cstr(name)
        }
        Err(e) => unsafe { set_error_null(error, e) },
    }
}
