//! Raw libalpm types and the table of library entry points the bridge calls.
//!
//! The bridge never links against symbols directly except through
//! `AlpmFunctions::system()` (feature `system-alpm`). Hosts that load the
//! library at runtime fill an `AlpmFunctions` table with the resolved
//! symbols instead.

#![allow(non_camel_case_types)]

use std::marker::{PhantomData, PhantomPinned};
use std::os::raw::{c_char, c_void};

use crate::error::{BridgeError, Result};

/// libalpm list node.
///
/// Layout matches `alpm_list_t`. The bridge only walks `next`.
#[repr(C)]
#[derive(Debug)]
pub struct alpm_list_t {
    pub data: *mut c_void,
    pub prev: *mut alpm_list_t,
    pub next: *mut alpm_list_t,
}

/// Opaque database record.
#[repr(C)]
pub struct alpm_db_t {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

/// Opaque package record.
#[repr(C)]
pub struct alpm_pkg_t {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

/// Opaque dependency descriptor.
#[repr(C)]
pub struct alpm_depend_t {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

pub type DbGetPkgFn = unsafe extern "C" fn(*mut alpm_db_t, *const c_char) -> *mut alpm_pkg_t;
pub type DbListFn = unsafe extern "C" fn(*mut alpm_db_t) -> *mut alpm_list_t;
pub type DbStrFn = unsafe extern "C" fn(*mut alpm_db_t) -> *const c_char;
pub type PkgStrFn = unsafe extern "C" fn(*mut alpm_pkg_t) -> *const c_char;
pub type PkgListFn = unsafe extern "C" fn(*mut alpm_pkg_t) -> *mut alpm_list_t;
pub type DepComputeStringFn = unsafe extern "C" fn(*const alpm_depend_t) -> *mut c_char;

/// Entry points of the package library consumed by the bridge.
///
/// Every field is required. String getters return NULL when the library
/// cannot supply the field; list getters return NULL for an empty list.
/// `dep_compute_string` returns a `malloc`ed buffer the bridge releases
/// with `free`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AlpmFunctions {
    pub db_get_pkg: DbGetPkgFn,
    pub db_get_pkgcache: DbListFn,
    pub db_get_name: DbStrFn,

    pub pkg_get_filename: PkgStrFn,
    pub pkg_get_name: PkgStrFn,
    pub pkg_get_version: PkgStrFn,
    pub pkg_get_desc: PkgStrFn,
    pub pkg_get_url: PkgStrFn,
    pub pkg_get_packager: PkgStrFn,
    pub pkg_get_md5sum: PkgStrFn,
    pub pkg_get_arch: PkgStrFn,

    pub pkg_get_licenses: PkgListFn,
    pub pkg_get_groups: PkgListFn,
    pub pkg_get_depends: PkgListFn,
    pub pkg_get_optdepends: PkgListFn,
    pub pkg_get_conflicts: PkgListFn,
    pub pkg_get_provides: PkgListFn,
    pub pkg_get_replaces: PkgListFn,
    pub pkg_get_files: PkgListFn,

    pub dep_compute_string: DepComputeStringFn,
}

/// Last libalpm major version whose package lists are all string lists.
///
/// From libalpm 7 on, `files` is an `alpm_filelist_t` and the relation
/// lists hold `alpm_depend_t` records, which the table above cannot
/// describe.
pub const LAST_STRING_LIST_ABI: u32 = 6;

/// Check a libalpm version string (as returned by `alpm_version()`)
/// against the table layout.
pub fn check_abi(version: &str) -> Result<()> {
    let major = version
        .split('.')
        .next()
        .and_then(|major| major.trim().parse::<u32>().ok());

    match major {
        Some(major) if major <= LAST_STRING_LIST_ABI => Ok(()),
        _ => {
            tracing::warn!(version, "rejecting libalpm ABI");
            Err(BridgeError::UnsupportedAbi {
                version: version.to_owned(),
            })
        }
    }
}

#[cfg(feature = "system-alpm")]
mod system {
    use super::*;

    unsafe extern "C" {
        pub fn alpm_version() -> *const c_char;

        pub fn alpm_db_get_pkg(db: *mut alpm_db_t, name: *const c_char) -> *mut alpm_pkg_t;
        pub fn alpm_db_get_pkgcache(db: *mut alpm_db_t) -> *mut alpm_list_t;
        pub fn alpm_db_get_name(db: *mut alpm_db_t) -> *const c_char;

        pub fn alpm_pkg_get_filename(pkg: *mut alpm_pkg_t) -> *const c_char;
        pub fn alpm_pkg_get_name(pkg: *mut alpm_pkg_t) -> *const c_char;
        pub fn alpm_pkg_get_version(pkg: *mut alpm_pkg_t) -> *const c_char;
        pub fn alpm_pkg_get_desc(pkg: *mut alpm_pkg_t) -> *const c_char;
        pub fn alpm_pkg_get_url(pkg: *mut alpm_pkg_t) -> *const c_char;
        pub fn alpm_pkg_get_packager(pkg: *mut alpm_pkg_t) -> *const c_char;
        pub fn alpm_pkg_get_md5sum(pkg: *mut alpm_pkg_t) -> *const c_char;
        pub fn alpm_pkg_get_arch(pkg: *mut alpm_pkg_t) -> *const c_char;

        pub fn alpm_pkg_get_licenses(pkg: *mut alpm_pkg_t) -> *mut alpm_list_t;
        pub fn alpm_pkg_get_groups(pkg: *mut alpm_pkg_t) -> *mut alpm_list_t;
        pub fn alpm_pkg_get_depends(pkg: *mut alpm_pkg_t) -> *mut alpm_list_t;
        pub fn alpm_pkg_get_optdepends(pkg: *mut alpm_pkg_t) -> *mut alpm_list_t;
        pub fn alpm_pkg_get_conflicts(pkg: *mut alpm_pkg_t) -> *mut alpm_list_t;
        pub fn alpm_pkg_get_provides(pkg: *mut alpm_pkg_t) -> *mut alpm_list_t;
        pub fn alpm_pkg_get_replaces(pkg: *mut alpm_pkg_t) -> *mut alpm_list_t;
        pub fn alpm_pkg_get_files(pkg: *mut alpm_pkg_t) -> *mut alpm_list_t;

        pub fn alpm_dep_compute_string(dep: *const alpm_depend_t) -> *mut c_char;
    }
}

#[cfg(feature = "system-alpm")]
impl AlpmFunctions {
    /// Table bound to the libalpm the crate was linked against.
    ///
    /// Fails with `BridgeError::UnsupportedAbi` unless the linked library
    /// reports a version up to `LAST_STRING_LIST_ABI`.
    pub fn system() -> Result<Self> {
        use system::*;

        let version = unsafe { alpm_version() };
        if version.is_null() {
            return Err(BridgeError::UnsupportedAbi {
                version: "unknown".into(),
            });
        }
        check_abi(&unsafe { crate::util::native_string(version, "version") }?)?;

        Ok(Self {
            db_get_pkg: alpm_db_get_pkg,
            db_get_pkgcache: alpm_db_get_pkgcache,
            db_get_name: alpm_db_get_name,
            pkg_get_filename: alpm_pkg_get_filename,
            pkg_get_name: alpm_pkg_get_name,
            pkg_get_version: alpm_pkg_get_version,
            pkg_get_desc: alpm_pkg_get_desc,
            pkg_get_url: alpm_pkg_get_url,
            pkg_get_packager: alpm_pkg_get_packager,
            pkg_get_md5sum: alpm_pkg_get_md5sum,
            pkg_get_arch: alpm_pkg_get_arch,
            pkg_get_licenses: alpm_pkg_get_licenses,
            pkg_get_groups: alpm_pkg_get_groups,
            pkg_get_depends: alpm_pkg_get_depends,
            pkg_get_optdepends: alpm_pkg_get_optdepends,
            pkg_get_conflicts: alpm_pkg_get_conflicts,
            pkg_get_provides: alpm_pkg_get_provides,
            pkg_get_replaces: alpm_pkg_get_replaces,
            pkg_get_files: alpm_pkg_get_files,
            dep_compute_string: alpm_dep_compute_string,
        })
    }
}
