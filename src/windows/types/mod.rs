//! Owned HANDLE wrapper with RAII cleanup

use std::ptr;
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::winnt::HANDLE;

/// Owns a Windows HANDLE and closes it on drop.
///
/// Both the null handle and `INVALID_HANDLE_VALUE` count as invalid; some
/// APIs (snapshots) report failure with the latter, most with the former.
pub struct Handle {
    raw: HANDLE,
}

impl Handle {
    pub fn new(raw: HANDLE) -> Self {
        Handle { raw }
    }

    pub fn null() -> Self {
        Handle {
            raw: ptr::null_mut(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.raw.is_null() && self.raw != INVALID_HANDLE_VALUE
    }

    /// The raw HANDLE, valid only while this wrapper lives
    pub fn raw(&self) -> HANDLE {
        self.raw
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if self.is_valid() {
            // Nothing useful to do with a close failure during teardown
            unsafe {
                CloseHandle(self.raw);
            }
        }
    }
}

// HANDLEs are process-local kernel object references
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handle_is_invalid() {
        let handle = Handle::null();
        assert!(!handle.is_valid());
        assert_eq!(handle.raw(), ptr::null_mut());
    }

    #[test]
    fn invalid_handle_value_is_invalid() {
        let handle = Handle::new(INVALID_HANDLE_VALUE);
        assert!(!handle.is_valid());
        // Drop must not attempt to close it
    }

    #[test]
    fn dropping_invalid_handles_is_safe() {
        {
            let _a = Handle::null();
            let _b = Handle::new(INVALID_HANDLE_VALUE);
        }
    }
}
