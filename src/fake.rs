//! In-process stand-in for libalpm used by the unit tests.
//!
//! Records are plain Rust structs whose addresses are handed out as the
//! opaque `alpm_*_t` pointers; the `extern "C"` getters cast them back.
//! Lists are real `alpm_list_t` chains and `dep_compute_string` returns
//! `malloc`ed buffers, so the bridge's `free` path is exercised for real.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::ptr;

use crate::sys::{AlpmFunctions, alpm_db_t, alpm_depend_t, alpm_list_t, alpm_pkg_t};

/// Owned `alpm_list_t` chain. Node addresses stay fixed while it lives.
pub struct NativeList {
    nodes: Vec<alpm_list_t>,
}

impl NativeList {
    pub fn new(items: impl IntoIterator<Item = *mut c_void>) -> Self {
        let mut nodes: Vec<alpm_list_t> = items
            .into_iter()
            .map(|data| alpm_list_t {
                data,
                prev: ptr::null_mut(),
                next: ptr::null_mut(),
            })
            .collect();

        let len = nodes.len();
        let base = nodes.as_mut_ptr();
        for i in 0..len {
            // SAFETY: i and its neighbours are in bounds of `nodes`.
            unsafe {
                let node = &mut *base.add(i);
                node.prev = if i > 0 { base.add(i - 1) } else { ptr::null_mut() };
                node.next = if i + 1 < len { base.add(i + 1) } else { ptr::null_mut() };
            }
        }
        Self { nodes }
    }

    pub fn empty() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn head(&self) -> *mut alpm_list_t {
        if self.nodes.is_empty() {
            ptr::null_mut()
        } else {
            self.nodes.as_ptr() as *mut alpm_list_t
        }
    }
}

/// List of C strings plus the storage backing it.
pub struct StrList {
    _items: Vec<CString>,
    list: NativeList,
}

impl StrList {
    pub fn new(items: &[&str]) -> Self {
        let items: Vec<CString> = items.iter().map(|s| CString::new(*s).unwrap()).collect();
        let list = NativeList::new(items.iter().map(|c| c.as_ptr() as *mut c_void));
        Self {
            _items: items,
            list,
        }
    }

    pub fn empty() -> Self {
        Self {
            _items: Vec::new(),
            list: NativeList::empty(),
        }
    }
}

pub struct FakeDepend {
    name: CString,
    constraint: Option<(CString, CString)>,
    formattable: bool,
}

impl FakeDepend {
    pub fn new(name: &str, constraint: Option<(&str, &str)>) -> Box<Self> {
        Box::new(Self {
            name: CString::new(name).unwrap(),
            constraint: constraint
                .map(|(op, ver)| (CString::new(op).unwrap(), CString::new(ver).unwrap())),
            formattable: true,
        })
    }

    /// A descriptor the formatter refuses, returning NULL.
    pub fn unformattable() -> Box<Self> {
        let mut dep = Self::new("broken", None);
        dep.formattable = false;
        dep
    }

    pub fn as_data(&self) -> *mut c_void {
        self as *const Self as *mut c_void
    }
}

pub struct FakePkg {
    pub filename: Option<CString>,
    pub name: Option<CString>,
    pub version: Option<CString>,
    pub desc: Option<CString>,
    pub url: Option<CString>,
    pub packager: Option<CString>,
    pub md5sum: Option<CString>,
    pub arch: Option<CString>,

    pub licenses: StrList,
    pub groups: StrList,
    pub optdepends: StrList,
    pub conflicts: StrList,
    pub provides: StrList,
    pub replaces: StrList,
    pub files: StrList,

    _depends: Vec<Box<FakeDepend>>,
    depends_list: NativeList,
}

fn cs(s: &str) -> Option<CString> {
    Some(CString::new(s).unwrap())
}

impl FakePkg {
    pub fn new(name: &str, version: &str) -> Box<Self> {
        Box::new(Self {
            filename: cs(&format!("{name}-{version}-x86_64.pkg.tar.zst")),
            name: cs(name),
            version: cs(version),
            desc: cs(""),
            url: cs(""),
            packager: cs("Unknown Packager"),
            md5sum: cs(""),
            arch: cs("x86_64"),
            licenses: StrList::empty(),
            groups: StrList::empty(),
            optdepends: StrList::empty(),
            conflicts: StrList::empty(),
            provides: StrList::empty(),
            replaces: StrList::empty(),
            files: StrList::empty(),
            _depends: Vec::new(),
            depends_list: NativeList::empty(),
        })
    }

    pub fn set_depends(&mut self, deps: Vec<Box<FakeDepend>>) {
        self.depends_list = NativeList::new(deps.iter().map(|d| d.as_data()));
        self._depends = deps;
    }

    pub fn set_version(&mut self, version: &str) {
        self.version = cs(version);
    }

    pub fn as_ptr(&self) -> *mut alpm_pkg_t {
        self as *const Self as *mut alpm_pkg_t
    }
}

pub struct FakeDb {
    name: CString,
    pkgs: Vec<Box<FakePkg>>,
    cache: NativeList,
}

impl FakeDb {
    pub fn new(name: &str, pkgs: Vec<Box<FakePkg>>) -> Box<Self> {
        let cache = NativeList::new(pkgs.iter().map(|p| p.as_ptr() as *mut c_void));
        Box::new(Self {
            name: CString::new(name).unwrap(),
            pkgs,
            cache,
        })
    }

    pub fn pkg(&self, name: &str) -> &FakePkg {
        self.pkgs
            .iter()
            .find(|p| p.name.as_deref().and_then(|n| n.to_str().ok()) == Some(name))
            .unwrap()
    }

    pub fn pkg_mut(&mut self, name: &str) -> &mut FakePkg {
        self.pkgs
            .iter_mut()
            .find(|p| p.name.as_deref().and_then(|n| n.to_str().ok()) == Some(name))
            .unwrap()
    }

    pub fn as_ptr(&self) -> *mut alpm_db_t {
        self as *const Self as *mut alpm_db_t
    }
}

unsafe extern "C" fn db_get_pkg(db: *mut alpm_db_t, name: *const c_char) -> *mut alpm_pkg_t {
    let Some(db) = (unsafe { (db as *const FakeDb).as_ref() }) else {
        return ptr::null_mut();
    };
    let name = unsafe { CStr::from_ptr(name) };
    db.pkgs
        .iter()
        .find(|p| p.name.as_deref() == Some(name))
        .map_or(ptr::null_mut(), |p| p.as_ptr())
}

unsafe extern "C" fn db_get_pkgcache(db: *mut alpm_db_t) -> *mut alpm_list_t {
    match unsafe { (db as *const FakeDb).as_ref() } {
        Some(db) => db.cache.head(),
        None => ptr::null_mut(),
    }
}

unsafe extern "C" fn db_get_name(db: *mut alpm_db_t) -> *const c_char {
    match unsafe { (db as *const FakeDb).as_ref() } {
        Some(db) => db.name.as_ptr(),
        None => ptr::null(),
    }
}

macro_rules! pkg_str_getter {
    ($func:ident, $field:ident) => {
        unsafe extern "C" fn $func(pkg: *mut alpm_pkg_t) -> *const c_char {
            match unsafe { (pkg as *const FakePkg).as_ref() } {
                Some(p) => p.$field.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
                None => ptr::null(),
            }
        }
    };
}

macro_rules! pkg_list_getter {
    ($func:ident, $field:ident) => {
        unsafe extern "C" fn $func(pkg: *mut alpm_pkg_t) -> *mut alpm_list_t {
            match unsafe { (pkg as *const FakePkg).as_ref() } {
                Some(p) => p.$field.list.head(),
                None => ptr::null_mut(),
            }
        }
    };
}

pkg_str_getter!(pkg_get_filename, filename);
pkg_str_getter!(pkg_get_name, name);
pkg_str_getter!(pkg_get_version, version);
pkg_str_getter!(pkg_get_desc, desc);
pkg_str_getter!(pkg_get_url, url);
pkg_str_getter!(pkg_get_packager, packager);
pkg_str_getter!(pkg_get_md5sum, md5sum);
pkg_str_getter!(pkg_get_arch, arch);

pkg_list_getter!(pkg_get_licenses, licenses);
pkg_list_getter!(pkg_get_groups, groups);
pkg_list_getter!(pkg_get_optdepends, optdepends);
pkg_list_getter!(pkg_get_conflicts, conflicts);
pkg_list_getter!(pkg_get_provides, provides);
pkg_list_getter!(pkg_get_replaces, replaces);
pkg_list_getter!(pkg_get_files, files);

unsafe extern "C" fn pkg_get_depends(pkg: *mut alpm_pkg_t) -> *mut alpm_list_t {
    match unsafe { (pkg as *const FakePkg).as_ref() } {
        Some(p) => p.depends_list.head(),
        None => ptr::null_mut(),
    }
}

unsafe extern "C" fn dep_compute_string(dep: *const alpm_depend_t) -> *mut c_char {
    let dep = unsafe { &*(dep as *const FakeDepend) };
    if !dep.formattable {
        return ptr::null_mut();
    }

    let mut text = dep.name.to_bytes().to_vec();
    if let Some((op, ver)) = &dep.constraint {
        text.extend_from_slice(op.to_bytes());
        text.extend_from_slice(ver.to_bytes());
    }
    let text = CString::new(text).unwrap();
    unsafe { libc::strdup(text.as_ptr()) }
}

pub fn functions() -> AlpmFunctions {
    AlpmFunctions {
        db_get_pkg,
        db_get_pkgcache,
        db_get_name,
        pkg_get_filename,
        pkg_get_name,
        pkg_get_version,
        pkg_get_desc,
        pkg_get_url,
        pkg_get_packager,
        pkg_get_md5sum,
        pkg_get_arch,
        pkg_get_licenses,
        pkg_get_groups,
        pkg_get_depends,
        pkg_get_optdepends,
        pkg_get_conflicts,
        pkg_get_provides,
        pkg_get_replaces,
        pkg_get_files,
        dep_compute_string,
    }
}

/// Database "core" holding "foo" 1.0 (GPL, no dependencies) and "bar" 2.1-3
/// with two dependencies and a handful of list fields.
pub fn sample_db() -> Box<FakeDb> {
    let mut foo = FakePkg::new("foo", "1.0");
    foo.licenses = StrList::new(&["GPL"]);

    let mut bar = FakePkg::new("bar", "2.1-3");
    bar.desc = cs("the bar utility");
    bar.url = cs("https://example.org/bar");
    bar.packager = cs("Jane Doe <jane@example.org>");
    bar.md5sum = cs("d41d8cd98f00b204e9800998ecf8427e");
    bar.licenses = StrList::new(&["MIT", "Apache"]);
    bar.groups = StrList::new(&["base-devel"]);
    bar.optdepends = StrList::new(&["python: scripting support"]);
    bar.conflicts = StrList::new(&["bar-git"]);
    bar.provides = StrList::new(&["libbar.so"]);
    bar.replaces = StrList::new(&["oldbar"]);
    bar.files = StrList::new(&["usr/", "usr/bin/", "usr/bin/bar"]);
    bar.set_depends(vec![
        FakeDepend::new("foo", Some((">=", "1.0"))),
        FakeDepend::new("glibc", None),
    ]);

    FakeDb::new("core", vec![foo, bar])
}
