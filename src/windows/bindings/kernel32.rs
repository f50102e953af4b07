//! kernel32.dll wrappers for process, memory and remote-thread operations
//!
//! Every function converts a failed call into `windows::core::Error` via
//! the thread's last-error value; callers map these onto the typed error
//! taxonomy.

use std::mem;
use std::ptr;
use winapi::shared::minwindef::{DWORD, FALSE, LPVOID};
use winapi::um::libloaderapi::{GetModuleHandleA, GetProcAddress};
use winapi::um::memoryapi::{
    ReadProcessMemory, VirtualAllocEx, VirtualFreeEx, VirtualQueryEx, WriteProcessMemory,
};
use winapi::um::processthreadsapi::{
    CreateRemoteThread, GetExitCodeProcess, GetExitCodeThread, OpenProcess,
};
use winapi::um::synchapi::WaitForSingleObject;
use winapi::um::winnt::{HANDLE, MEMORY_BASIC_INFORMATION, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE};
use winapi::um::wow64apiset::IsWow64Process;

/// Result alias for raw Win32 calls
pub type WinResult<T> = Result<T, windows::core::Error>;

fn last_error<T>() -> WinResult<T> {
    Err(windows::core::Error::from_win32())
}

/// Opens a process with the given access mask
pub fn open_process(pid: u32, desired_access: DWORD) -> WinResult<HANDLE> {
    let handle = unsafe { OpenProcess(desired_access, FALSE, pid) };
    if handle.is_null() {
        last_error()
    } else {
        Ok(handle)
    }
}

/// Reads target memory into `buffer`, returning the transferred byte count
///
/// # Safety
/// `handle` must be a live process handle opened with VM_READ.
pub unsafe fn read_process_memory(
    handle: HANDLE,
    address: usize,
    buffer: &mut [u8],
) -> WinResult<usize> {
    let mut bytes_read = 0;
    let ok = ReadProcessMemory(
        handle,
        address as LPVOID,
        buffer.as_mut_ptr() as LPVOID,
        buffer.len(),
        &mut bytes_read,
    );
    if ok == FALSE {
        last_error()
    } else {
        Ok(bytes_read)
    }
}

/// Writes `data` into target memory, returning the transferred byte count
///
/// # Safety
/// `handle` must be a live process handle opened with VM_WRITE | VM_OPERATION.
pub unsafe fn write_process_memory(handle: HANDLE, address: usize, data: &[u8]) -> WinResult<usize> {
    let mut bytes_written = 0;
    let ok = WriteProcessMemory(
        handle,
        address as LPVOID,
        data.as_ptr() as LPVOID,
        data.len(),
        &mut bytes_written,
    );
    if ok == FALSE {
        last_error()
    } else {
        Ok(bytes_written)
    }
}

/// Queries the region containing `address` in the target's address space
///
/// # Safety
/// `handle` must be a live process handle opened with QUERY_INFORMATION.
pub unsafe fn virtual_query_ex(
    handle: HANDLE,
    address: usize,
) -> WinResult<MEMORY_BASIC_INFORMATION> {
    let mut mbi: MEMORY_BASIC_INFORMATION = mem::zeroed();
    let written = VirtualQueryEx(
        handle,
        address as LPVOID,
        &mut mbi,
        mem::size_of::<MEMORY_BASIC_INFORMATION>(),
    );
    if written == 0 {
        last_error()
    } else {
        Ok(mbi)
    }
}

/// Commits `size` bytes in the target at a system-chosen address
///
/// # Safety
/// `handle` must be a live process handle opened with VM_OPERATION.
pub unsafe fn virtual_alloc_ex(handle: HANDLE, size: usize, protection: DWORD) -> WinResult<usize> {
    let base = VirtualAllocEx(
        handle,
        ptr::null_mut(),
        size,
        MEM_COMMIT | MEM_RESERVE,
        protection,
    );
    if base.is_null() {
        last_error()
    } else {
        Ok(base as usize)
    }
}

/// Releases an allocation made with [`virtual_alloc_ex`]
///
/// # Safety
/// `address` must be the base of a live allocation in the target.
pub unsafe fn virtual_free_ex(handle: HANDLE, address: usize) -> WinResult<()> {
    if VirtualFreeEx(handle, address as LPVOID, 0, MEM_RELEASE) == FALSE {
        last_error()
    } else {
        Ok(())
    }
}

/// Starts a thread in the target at `entry` with `argument` as its parameter
///
/// # Safety
/// `handle` must be a live process handle opened with CREATE_THREAD and
/// `entry` must point at executable code in the target.
pub unsafe fn create_remote_thread(handle: HANDLE, entry: usize, argument: usize) -> WinResult<HANDLE> {
    let thread = CreateRemoteThread(
        handle,
        ptr::null_mut(),
        0,
        Some(mem::transmute::<
            usize,
            unsafe extern "system" fn(LPVOID) -> DWORD,
        >(entry)),
        argument as LPVOID,
        0,
        ptr::null_mut(),
    );
    if thread.is_null() {
        last_error()
    } else {
        Ok(thread)
    }
}

/// Waits on a handle; returns the raw wait status (WAIT_OBJECT_0, WAIT_TIMEOUT, ...)
///
/// # Safety
/// `handle` must be a live waitable handle.
pub unsafe fn wait_for_single_object(handle: HANDLE, timeout_ms: u32) -> DWORD {
    WaitForSingleObject(handle, timeout_ms)
}

/// Fetches a thread's exit code
///
/// # Safety
/// `handle` must be a live thread handle.
pub unsafe fn get_exit_code_thread(handle: HANDLE) -> WinResult<u32> {
    let mut code: DWORD = 0;
    if GetExitCodeThread(handle, &mut code) == FALSE {
        last_error()
    } else {
        Ok(code)
    }
}

/// Fetches a process's exit code; `STILL_ACTIVE` (259) while running
///
/// # Safety
/// `handle` must be a live process handle.
pub unsafe fn get_exit_code_process(handle: HANDLE) -> WinResult<u32> {
    let mut code: DWORD = 0;
    if GetExitCodeProcess(handle, &mut code) == FALSE {
        last_error()
    } else {
        Ok(code)
    }
}

/// Whether the target is a 32-bit process on 64-bit Windows
///
/// # Safety
/// `handle` must be a live process handle opened with QUERY_INFORMATION.
pub unsafe fn is_wow64_process(handle: HANDLE) -> WinResult<bool> {
    let mut wow64 = FALSE;
    if IsWow64Process(handle, &mut wow64) == FALSE {
        last_error()
    } else {
        Ok(wow64 != FALSE)
    }
}

/// Resolves an export of the local kernel32.dll by NUL-terminated name.
///
/// System DLLs load at the same base in every process of the same
/// architecture, so the local address is valid in the target too; this is
/// what makes loader-based injection work.
pub fn kernel32_symbol(symbol: &'static [u8]) -> WinResult<usize> {
    debug_assert!(symbol.ends_with(b"\0"));
    unsafe {
        let module = GetModuleHandleA(b"kernel32.dll\0".as_ptr() as *const i8);
        if module.is_null() {
            return last_error();
        }
        let address = GetProcAddress(module, symbol.as_ptr() as *const i8);
        if address.is_null() {
            last_error()
        } else {
            Ok(address as usize)
        }
    }
}
