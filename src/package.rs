//! Package wrapper: read-only view of one `alpm_pkg_t`.
//!
//! Every accessor re-reads the native record. Nothing is cached, so a
//! wrapper reflects the record's current state for as long as the library
//! keeps it alive.

use std::ffi::CStr;
use std::fmt;
use std::os::raw::c_char;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{AlpmBridgeError, BridgeError, Result};
use crate::handle::ForeignHandle;
use crate::list::{depend_element, marshal_list, string_element};
use crate::sys::{AlpmFunctions, PkgListFn, PkgStrFn, alpm_pkg_t};
use crate::util::{cstr_to_string, native_string, set_error_null, set_ok, string_to_cstr};

/// Non-owning wrapper around a libalpm package record.
///
/// The handle may be NULL; that is a valid, distinguishable state in which
/// every accessor fails with `BridgeError::NotInitialized`.
pub struct Package {
    handle: ForeignHandle<alpm_pkg_t>,
    lib: Arc<AlpmFunctions>,
}

impl Package {
    pub(crate) fn new(lib: Arc<AlpmFunctions>, pkg: *mut alpm_pkg_t) -> Self {
        Self {
            handle: ForeignHandle::from_raw(pkg),
            lib,
        }
    }

    /// Get the handle to the native package record.
    pub fn handle(&self) -> &ForeignHandle<alpm_pkg_t> {
        &self.handle
    }

    /// Whether the wrapper still points at a native record.
    pub fn is_initialized(&self) -> bool {
        !self.handle.is_null()
    }

    /// Forget the native record, e.g. before the database is reloaded.
    pub fn invalidate(&mut self) {
        self.handle.invalidate();
    }

    fn scalar(&self, field: &'static str, getter: PkgStrFn) -> Result<String> {
        let pkg = self.handle.guard()?;
        tracing::trace!(field, "reading package field");

        // SAFETY: the handle is non-null; keeping the record alive is the
        // caller's obligation.
        let value = unsafe { getter(pkg.as_ptr()) };
        if value.is_null() {
            return Err(BridgeError::FieldUnavailable { field });
        }
        unsafe { native_string(value, field) }
    }

    fn strings(&self, field: &'static str, getter: PkgListFn) -> Result<Vec<String>> {
        let pkg = self.handle.guard()?;
        tracing::trace!(field, "reading package list");

        let head = unsafe { getter(pkg.as_ptr()) };
        unsafe { marshal_list(head, |data| string_element(data)) }
    }

    /// Package file name, e.g. `foo-1.0-1-x86_64.pkg.tar.zst`.
    pub fn filename(&self) -> Result<String> {
        self.scalar("filename", self.lib.pkg_get_filename)
    }

    /// Package name.
    pub fn name(&self) -> Result<String> {
        self.scalar("name", self.lib.pkg_get_name)
    }

    /// Full version string including the release, e.g. `2.1-3`.
    pub fn version(&self) -> Result<String> {
        self.scalar("version", self.lib.pkg_get_version)
    }

    /// One-line package description.
    pub fn desc(&self) -> Result<String> {
        self.scalar("desc", self.lib.pkg_get_desc)
    }

    /// Upstream URL.
    pub fn url(&self) -> Result<String> {
        self.scalar("url", self.lib.pkg_get_url)
    }

    /// Who built the package.
    pub fn packager(&self) -> Result<String> {
        self.scalar("packager", self.lib.pkg_get_packager)
    }

    /// MD5 checksum of the package file.
    pub fn md5sum(&self) -> Result<String> {
        self.scalar("md5sum", self.lib.pkg_get_md5sum)
    }

    /// Target architecture.
    pub fn arch(&self) -> Result<String> {
        self.scalar("arch", self.lib.pkg_get_arch)
    }

    /// License identifiers.
    pub fn licenses(&self) -> Result<Vec<String>> {
        self.strings("licenses", self.lib.pkg_get_licenses)
    }

    /// Groups the package belongs to.
    pub fn groups(&self) -> Result<Vec<String>> {
        self.strings("groups", self.lib.pkg_get_groups)
    }

    /// Dependencies in their textual form, e.g. `glibc>=2.33`.
    pub fn depends(&self) -> Result<Vec<String>> {
        let pkg = self.handle.guard()?;
        tracing::trace!(field = "depends", "reading package list");

        let head = unsafe { (self.lib.pkg_get_depends)(pkg.as_ptr()) };
        let lib = &*self.lib;
        unsafe { marshal_list(head, |data| depend_element(lib, data)) }
    }

    /// Optional dependencies, usually `name: reason`.
    pub fn optdepends(&self) -> Result<Vec<String>> {
        self.strings("optdepends", self.lib.pkg_get_optdepends)
    }

    /// Packages this one conflicts with.
    pub fn conflicts(&self) -> Result<Vec<String>> {
        self.strings("conflicts", self.lib.pkg_get_conflicts)
    }

    /// Virtual names the package provides.
    pub fn provides(&self) -> Result<Vec<String>> {
        self.strings("provides", self.lib.pkg_get_provides)
    }

    /// Packages this one replaces.
    pub fn replaces(&self) -> Result<Vec<String>> {
        self.strings("replaces", self.lib.pkg_get_replaces)
    }

    /// Installed paths, relative to the root.
    pub fn files(&self) -> Result<Vec<String>> {
        self.strings("files", self.lib.pkg_get_files)
    }

    /// Look up a property by name and read it.
    pub fn get(&self, attr: &str) -> Result<PropertyValue> {
        let property = PackageProperty::find(attr).ok_or_else(|| BridgeError::UnknownAttribute {
            type_name: "Package",
            name: attr.to_owned(),
        })?;
        (property.getter)(self)
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

/// Value of a package property as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Str(String),
    List(Vec<String>),
}

/// Entry of the static attribute table.
pub struct PackageProperty {
    pub name: &'static str,
    pub c_name: &'static CStr,
    pub doc: &'static CStr,
    pub getter: fn(&Package) -> Result<PropertyValue>,
}

impl PackageProperty {
    /// Look up a table entry by attribute name.
    pub fn find(name: &str) -> Option<&'static PackageProperty> {
        PACKAGE_PROPERTIES.iter().find(|p| p.name == name)
    }
}

/// Read-only attributes of `Package`, in registration order.
pub static PACKAGE_PROPERTIES: &[PackageProperty] = &[
    PackageProperty {
        name: "name",
        c_name: c"name",
        doc: c"package name",
        getter: |p| p.name().map(PropertyValue::Str),
    },
    PackageProperty {
        name: "version",
        c_name: c"version",
        doc: c"package version",
        getter: |p| p.version().map(PropertyValue::Str),
    },
    PackageProperty {
        name: "desc",
        c_name: c"desc",
        doc: c"package desc",
        getter: |p| p.desc().map(PropertyValue::Str),
    },
    PackageProperty {
        name: "url",
        c_name: c"url",
        doc: c"package URL",
        getter: |p| p.url().map(PropertyValue::Str),
    },
    PackageProperty {
        name: "packager",
        c_name: c"packager",
        doc: c"packager name",
        getter: |p| p.packager().map(PropertyValue::Str),
    },
    PackageProperty {
        name: "md5sum",
        c_name: c"md5sum",
        doc: c"package md5sum",
        getter: |p| p.md5sum().map(PropertyValue::Str),
    },
    PackageProperty {
        name: "arch",
        c_name: c"arch",
        doc: c"target architecture",
        getter: |p| p.arch().map(PropertyValue::Str),
    },
    PackageProperty {
        name: "filename",
        c_name: c"filename",
        doc: c"package filename",
        getter: |p| p.filename().map(PropertyValue::Str),
    },
    PackageProperty {
        name: "licenses",
        c_name: c"licenses",
        doc: c"list of licenses",
        getter: |p| p.licenses().map(PropertyValue::List),
    },
    PackageProperty {
        name: "groups",
        c_name: c"groups",
        doc: c"list of package groups",
        getter: |p| p.groups().map(PropertyValue::List),
    },
    PackageProperty {
        name: "depends",
        c_name: c"depends",
        doc: c"list of dependencies",
        getter: |p| p.depends().map(PropertyValue::List),
    },
    PackageProperty {
        name: "optdepends",
        c_name: c"optdepends",
        doc: c"list of optional dependencies",
        getter: |p| p.optdepends().map(PropertyValue::List),
    },
    PackageProperty {
        name: "conflicts",
        c_name: c"conflicts",
        doc: c"list of conflicts",
        getter: |p| p.conflicts().map(PropertyValue::List),
    },
    PackageProperty {
        name: "provides",
        c_name: c"provides",
        doc: c"list of provided package names",
        getter: |p| p.provides().map(PropertyValue::List),
    },
    PackageProperty {
        name: "replaces",
        c_name: c"replaces",
        doc: c"list of replaced packages",
        getter: |p| p.replaces().map(PropertyValue::List),
    },
    PackageProperty {
        name: "files",
        c_name: c"files",
        doc: c"list of installed files",
        getter: |p| p.files().map(PropertyValue::List),
    },
];

/// # Safety
///
/// `pkg` and `attr` follow the contract of `alpm_bridge_pkg_get`.
unsafe fn read_attr(pkg: *const Package, attr: *const c_char) -> Result<PropertyValue> {
    let pkg = unsafe { pkg.as_ref() }.ok_or(BridgeError::InvalidHandle)?;
    let attr = unsafe { cstr_to_string(attr, "attribute name must be a string") }?;
    pkg.get(&attr)
}

/// Read a package attribute as JSON.
///
/// # Parameters
///
/// - `pkg`: Package wrapper
/// - `attr`: Attribute name (see `alpm_bridge_pkg_property_name`)
/// - `error`: Out-parameter for error information
///
/// # Returns
///
/// A JSON string (`"1.0-1"`) for scalar attributes or a JSON array
/// (`["GPL", "MIT"]`) for list attributes. NULL on failure.
/// Caller must free with `alpm_bridge_string_free()`.
///
/// # Safety
///
/// - `pkg` must be a wrapper returned by this library, or NULL
/// - `attr` must be a valid null-terminated string or NULL
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_pkg_get(
    pkg: *const Package,
    attr: *const c_char,
    error: *mut AlpmBridgeError,
) -> *mut c_char {
    let value = match unsafe { read_attr(pkg, attr) } {
        Ok(v) => v,
        Err(e) => return unsafe { set_error_null(error, e) },
    };

    match serde_json::to_string(&value) {
        Ok(json) => {
            unsafe { set_ok(error) };
            string_to_cstr(json)
        }
        Err(e) => unsafe { set_error_null(error, e.into()) },
    }
}

/// Read a scalar package attribute as a plain string.
///
/// List attributes fail with a type error; use `alpm_bridge_pkg_get`.
///
/// # Safety
///
/// Same as `alpm_bridge_pkg_get`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_pkg_get_str(
    pkg: *const Package,
    attr: *const c_char,
    error: *mut AlpmBridgeError,
) -> *mut c_char {
    match unsafe { read_attr(pkg, attr) } {
        Ok(PropertyValue::Str(s)) => {
            unsafe { set_ok(error) };
            string_to_cstr(s)
        }
        Ok(PropertyValue::List(_)) => unsafe {
            set_error_null(
                error,
                BridgeError::Type("attribute is a list; use alpm_bridge_pkg_get".into()),
            )
        },
        Err(e) => unsafe { set_error_null(error, e) },
    }
}

/// Number of package attributes.
#[unsafe(no_mangle)]
pub extern "C" fn alpm_bridge_pkg_property_count() -> usize {
    PACKAGE_PROPERTIES.len()
}

/// Name of the attribute at `index`, or NULL past the end.
///
/// Static string; do not free.
#[unsafe(no_mangle)]
pub extern "C" fn alpm_bridge_pkg_property_name(index: usize) -> *const c_char {
    PACKAGE_PROPERTIES
        .get(index)
        .map_or(std::ptr::null(), |p| p.c_name.as_ptr())
}

/// Description of the attribute at `index`, or NULL past the end.
///
/// Static string; do not free.
#[unsafe(no_mangle)]
pub extern "C" fn alpm_bridge_pkg_property_doc(index: usize) -> *const c_char {
    PACKAGE_PROPERTIES
        .get(index)
        .map_or(std::ptr::null(), |p| p.doc.as_ptr())
}

/// Drop the wrapper's reference to its native record.
///
/// Later reads fail with `NotInitialized`. Safe to pass NULL.
///
/// # Safety
///
/// `pkg` must be a wrapper returned by this library, or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn alpm_bridge_pkg_invalidate(pkg: *mut Package) {
    if let Some(pkg) = unsafe { pkg.as_mut() } {
        pkg.invalidate();
    }
}
