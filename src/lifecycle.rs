//! Session and wrapper lifecycle (create, wrap, free).
//!
//! Wrappers are only ever created here, from handles the surrounding
//! library session already produced. Freeing a wrapper releases the wrapper
//! alone; the native record is left to the library.

use std::os::raw::c_char;
use std::sync::Arc;

use crate::db::Database;
#[cfg(feature = "system-alpm")]
use crate::error::Result;
use crate::error::{AlpmBridgeError, BridgeError};
use crate::package::Package;
use crate::sys::{AlpmFunctions, alpm_db_t, alpm_pkg_t, check_abi};
use crate::util::{cstr_to_string, set_error_null, set_ok};

/// Library entry points shared by every wrapper created from it.
#[derive(Debug, Clone)]
pub struct Session {
    lib: Arc<AlpmFunctions>,
}

impl Session {
    /// Create a session from a table of library entry points.
    ///
    /// # Safety
    ///
    /// Every entry of `functions` must behave as documented on
    /// `AlpmFunctions`; the safe accessors call them without further checks.
    pub unsafe fn new(functions: AlpmFunctions) -> Self {
        Self {
            lib: Arc::new(functions),
        }
    }

    /// Session over the linked system libalpm.
    ///
    /// Fails with `BridgeError::UnsupportedAbi` when the linked library's
    /// package lists are not plain string lists.
    #[cfg(feature = "system-alpm")]
    pub fn system() -> Result<Self> {
        let functions = AlpmFunctions::system()?;
        // SAFETY: the table is bound to the linked libalpm and its ABI was
        // checked above.
        Ok(unsafe { Self::new(functions) })
    }

    /// Wrap a database handle owned by the library.
    ///
    /// # Safety
    ///
    /// `db` must be NULL or a live database record of the library behind
    /// this session, and must stay alive while the wrapper reads it.
    pub unsafe fn wrap_db(&self, db: *mut alpm_db_t) -> Database {
        tracing::debug!(?db, "wrapping database handle");
        Database::new(Arc::clone(&self.lib), db)
    }

    /// Wrap a package handle owned by the library.
    ///
    /// A NULL handle is accepted and yields an uninitialized wrapper.
    ///
    /// # Safety
    ///
    /// `pkg` must be NULL or a live package record of the library behind
    /// this session, and must stay alive while the wrapper reads it.
    ///
    /// ```compile_fail
    /// use alpm_bridge::{Session, alpm_pkg_t};
    ///
    /// fn wrap_unchecked(session: &Session, pkg: *mut alpm_pkg_t) {
    ///     let _ = session.wrap_pkg(pkg);
    /// }
    /// ```
    pub unsafe fn wrap_pkg(&self, pkg: *mut alpm_pkg_t) -> Package {
        tracing::debug!(?pkg, "wrapping package handle");
        Package::new(Arc::clone(&self.lib), pkg)
    }
}

/// Create a session from a table of library entry points.
///
/// # Parameters
///
/// - `functions`: Entry points resolved by the host (copied)
/// - `error`: Out-parameter for error information
///
/// # Returns
///
/// Session on success, NULL on failure.
///
/// # Ownership
///
/// Caller owns the returned session. Must call `alpm_bridge_session_free()`.
/// Wrappers created from it stay usable after the session is freed.
///
/// # Safety
///
/// - `functions` must point to a fully populated table or be NULL, and every
///   entry must behave as documented on `AlpmFunctions`
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_session_new(
    functions: *const AlpmFunctions,
    error: *mut AlpmBridgeError,
) -> *mut Session {
    let functions = match unsafe { functions.as_ref() } {
        Some(f) => *f,
        None => return unsafe { set_error_null(error, BridgeError::NullPointer("functions")) },
    };

    unsafe { set_ok(error) };
    Box::into_raw(Box::new(unsafe { Session::new(functions) }))
}

/// Check a libalpm version string against the entry-point table.
///
/// Hosts that resolve symbols at runtime pass the result of
/// `alpm_version()` here before filling an `AlpmFunctions` table.
///
/// # Returns
///
/// `true` if the version's package lists match the table. `false` with
/// `UnsupportedAbi` (or `Type` for a NULL or non-UTF-8 argument) otherwise.
///
/// # Safety
///
/// - `version` must be a valid null-terminated string or NULL
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_check_abi(
    version: *const c_char,
    error: *mut AlpmBridgeError,
) -> bool {
    let result = unsafe { cstr_to_string(version, "version must be a string") }
        .and_then(|version| check_abi(&version));

    match result {
        Ok(()) => {
            unsafe { set_ok(error) };
            true
        }
        Err(e) => {
            let _: *mut u8 = unsafe { set_error_null(error, e) };
            false
        }
    }
}

/// Create a session over the linked system libalpm.
///
/// Returns NULL with `UnsupportedAbi` when the linked libalpm is too new
/// for the string-list table.
///
/// # Safety
///
/// `error` must be a valid pointer or NULL.
#[cfg(feature = "system-alpm")]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_session_system(error: *mut AlpmBridgeError) -> *mut Session {
    match Session::system() {
        Ok(session) => {
            unsafe { set_ok(error) };
            Box::into_raw(Box::new(session))
        }
        Err(e) => unsafe { set_error_null(error, e) },
    }
}

/// Free a session. Safe to pass NULL.
///
/// # Safety
///
/// `session` must be a session returned by this library, or NULL, and must
/// not be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_session_free(session: *mut Session) {
    if session.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(session));
    }
}

/// Wrap a native database handle.
///
/// # Returns
///
/// Database wrapper on success, NULL if `session` is NULL.
/// Caller must free it with `alpm_bridge_db_free()`.
///
/// # Safety
///
/// - `session` must be a session returned by this library, or NULL
/// - `db` must be NULL or a database handle of the library the session
///   was created for
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_db_wrap(
    session: *const Session,
    db: *mut alpm_db_t,
    error: *mut AlpmBridgeError,
) -> *mut Database {
    let session = match unsafe { session.as_ref() } {
        Some(s) => s,
        None => return unsafe { set_error_null(error, BridgeError::InvalidHandle) },
    };

    unsafe { set_ok(error) };
    Box::into_raw(Box::new(unsafe { session.wrap_db(db) }))
}

/// Free a database wrapper. The native record is not touched.
///
/// # Safety
///
/// `db` must be a wrapper returned by this library, or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_db_free(db: *mut Database) {
    if db.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(db));
    }
}

/// Wrap a native package handle, e.g. one loaded from a package file.
///
/// A NULL `pkg` produces an uninitialized wrapper whose reads fail with
/// `NotInitialized`.
///
/// # Safety
///
/// - `session` must be a session returned by this library, or NULL
/// - `pkg` must be NULL or a package handle of the library the session
///   was created for
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_pkg_wrap(
    session: *const Session,
    pkg: *mut alpm_pkg_t,
    error: *mut AlpmBridgeError,
) -> *mut Package {
    let session = match unsafe { session.as_ref() } {
        Some(s) => s,
        None => return unsafe { set_error_null(error, BridgeError::InvalidHandle) },
    };

    unsafe { set_ok(error) };
    Box::into_raw(Box::new(unsafe { session.wrap_pkg(pkg) }))
}

/// Free a package wrapper. The native record is not touched.
///
/// # Safety
///
/// `pkg` must be a wrapper returned by this library, or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_pkg_free(pkg: *mut Package) {
    if pkg.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(pkg));
    }
}
