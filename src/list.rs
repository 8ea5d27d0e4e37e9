//! Conversion of native `alpm_list_t` chains into host sequences.

use std::marker::PhantomData;
use std::os::raw::{c_char, c_void};

use crate::error::{BridgeError, Result};
use crate::sys::{AlpmFunctions, alpm_depend_t, alpm_list_t};
use crate::util::native_string;

/// Iterator over the `data` pointers of a native list, following `next`.
pub struct AlpmListIter<'a> {
    node: *const alpm_list_t,
    _list: PhantomData<&'a alpm_list_t>,
}

impl AlpmListIter<'_> {
    /// # Safety
    ///
    /// `head` must be NULL or the first node of a well-formed list that
    /// stays alive and unmodified while the iterator is used.
    pub unsafe fn new(head: *const alpm_list_t) -> Self {
        Self {
            node: head,
            _list: PhantomData,
        }
    }
}

impl Iterator for AlpmListIter<'_> {
    type Item = *mut c_void;

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: guaranteed by the contract of `AlpmListIter::new`.
        let node = unsafe { self.node.as_ref()? };
        self.node = node.next;
        Some(node.data)
    }
}

/// Convert a native list into a `Vec`, one converted element per node.
///
/// A NULL head is an empty list and `convert` is never called. The first
/// conversion failure is returned and the partially built vector dropped.
///
/// # Safety
///
/// Same contract as `AlpmListIter::new`. `convert` receives the raw `data`
/// pointer of each node and must uphold whatever that element type needs.
pub unsafe fn marshal_list<T, F>(head: *const alpm_list_t, mut convert: F) -> Result<Vec<T>>
where
    F: FnMut(*mut c_void) -> Result<T>,
{
    if head.is_null() {
        return Ok(Vec::new());
    }

    let len = unsafe { AlpmListIter::new(head) }.count();
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|e| BridgeError::Allocation(format!("unable to create list: {e}")))?;

    for data in unsafe { AlpmListIter::new(head) } {
        out.push(convert(data)?);
    }
    Ok(out)
}

/// Element converter for lists of C strings.
///
/// # Safety
///
/// `data` must be NULL or a valid null-terminated C string.
pub unsafe fn string_element(data: *mut c_void) -> Result<String> {
    if data.is_null() {
        return Err(BridgeError::Conversion {
            context: "list element",
            reason: "null entry".into(),
        });
    }
    unsafe { native_string(data as *const c_char, "list element") }
}

/// Element converter for lists of dependency descriptors.
///
/// Formats the descriptor with the library (`name>=version`), copies the
/// text and releases the library's buffer.
///
/// # Safety
///
/// `data` must be NULL or a valid `alpm_depend_t` owned by the library
/// behind `lib`.
pub unsafe fn depend_element(lib: &AlpmFunctions, data: *mut c_void) -> Result<String> {
    if data.is_null() {
        return Err(BridgeError::Conversion {
            context: "dependency",
            reason: "null entry".into(),
        });
    }

    let buf = unsafe { (lib.dep_compute_string)(data as *const alpm_depend_t) };
    if buf.is_null() {
        return Err(BridgeError::Conversion {
            context: "dependency",
            reason: "formatter returned NULL".into(),
        });
    }

    let text = unsafe { native_string(buf, "dependency") };
    unsafe { libc::free(buf.cast()) };
    text
}
