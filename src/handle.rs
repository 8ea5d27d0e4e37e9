//! Non-owning handles to records owned by libalpm.

use std::fmt;
use std::ptr::NonNull;

use crate::error::{BridgeError, Result};

/// Borrowed pointer to a native record.
///
/// The handle never frees what it points to. The record's lifetime belongs
/// to the library session: a database reload or transaction can free it
/// without the handle noticing. The only invalidation the bridge can detect
/// is a null handle, which `guard()` turns into `BridgeError::NotInitialized`.
///
/// # Thread Safety
///
/// Not `Send` or `Sync`. libalpm records must only be read from the thread
/// that owns the library session.
pub struct ForeignHandle<T> {
    ptr: Option<NonNull<T>>,
}

impl<T> ForeignHandle<T> {
    /// Wrap a raw pointer. NULL yields an uninitialized handle.
    pub fn from_raw(ptr: *mut T) -> Self {
        Self {
            ptr: NonNull::new(ptr),
        }
    }

    /// Check the handle before dereferencing it.
    pub fn guard(&self) -> Result<NonNull<T>> {
        match self.ptr {
            Some(ptr) => Ok(ptr),
            None => {
                tracing::warn!("rejected access through a null native handle");
                Err(BridgeError::NotInitialized)
            }
        }
    }

    /// Raw pointer, possibly NULL, for calls the library itself null-checks.
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.map_or(std::ptr::null_mut(), NonNull::as_ptr)
    }

    /// Whether the handle is NULL, either from the start or after
    /// `invalidate()`.
    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// Drop the reference to the native record.
    ///
    /// Call this when the library has freed or is about to free the record.
    pub fn invalidate(&mut self) {
        self.ptr = None;
    }
}

impl<T> Clone for ForeignHandle<T> {
    fn clone(&self) -> Self {
        Self { ptr: self.ptr }
    }
}

impl<T> fmt::Debug for ForeignHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ForeignHandle").field(&self.as_ptr()).finish()
    }
}
