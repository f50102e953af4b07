//! Best-effort debug privilege elevation
//!
//! Attaching to processes owned by other users needs SeDebugPrivilege on
//! the caller's token. Enabling it fails harmlessly for non-admin callers;
//! they can still attach to their own processes.

use std::mem;
use std::ptr;
use std::sync::Once;
use tracing::debug;
use winapi::shared::minwindef::FALSE;
use winapi::um::handleapi::CloseHandle;
use winapi::um::processthreadsapi::{GetCurrentProcess, OpenProcessToken};
use winapi::um::securitybaseapi::AdjustTokenPrivileges;
use winapi::um::winbase::LookupPrivilegeValueW;
use winapi::um::winnt::{
    HANDLE, LUID, SE_PRIVILEGE_ENABLED, TOKEN_ADJUST_PRIVILEGES, TOKEN_PRIVILEGES, TOKEN_QUERY,
};

static DEBUG_PRIVILEGE: Once = Once::new();

/// Requests SeDebugPrivilege for this process once; later calls are free
pub fn ensure_debug_privilege() {
    DEBUG_PRIVILEGE.call_once(|| {
        if let Err(reason) = enable_debug_privilege() {
            debug!(reason, "debug privilege not enabled");
        }
    });
}

fn enable_debug_privilege() -> Result<(), &'static str> {
    let privilege_name: Vec<u16> = "SeDebugPrivilege\0".encode_utf16().collect();

    unsafe {
        let mut token: HANDLE = ptr::null_mut();
        if OpenProcessToken(
            GetCurrentProcess(),
            TOKEN_ADJUST_PRIVILEGES | TOKEN_QUERY,
            &mut token,
        ) == FALSE
        {
            return Err("OpenProcessToken failed");
        }

        let mut luid: LUID = mem::zeroed();
        if LookupPrivilegeValueW(ptr::null(), privilege_name.as_ptr(), &mut luid) == FALSE {
            CloseHandle(token);
            return Err("LookupPrivilegeValueW failed");
        }

        let mut privileges: TOKEN_PRIVILEGES = mem::zeroed();
        privileges.PrivilegeCount = 1;
        privileges.Privileges[0].Luid = luid;
        privileges.Privileges[0].Attributes = SE_PRIVILEGE_ENABLED;

        let adjusted = AdjustTokenPrivileges(
            token,
            FALSE,
            &mut privileges,
            0,
            ptr::null_mut(),
            ptr::null_mut(),
        );
        CloseHandle(token);

        if adjusted == FALSE {
            Err("AdjustTokenPrivileges failed")
        } else {
            Ok(())
        }
    }
}
