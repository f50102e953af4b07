//! psapi.dll wrappers for module enumeration and process memory counters

use super::kernel32::WinResult;
use crate::windows::utils::wide_to_string;
use std::mem;
use winapi::shared::minwindef::{DWORD, FALSE, HMODULE, MAX_PATH};
use winapi::um::psapi::{
    EnumProcessModules, GetModuleBaseNameW, GetModuleFileNameExW, GetModuleInformation,
    GetProcessMemoryInfo, MODULEINFO, PROCESS_MEMORY_COUNTERS,
};
use winapi::um::winnt::HANDLE;

fn last_error<T>() -> WinResult<T> {
    Err(windows::core::Error::from_win32())
}

/// Lists the module handles mapped into the target process
///
/// # Safety
/// `handle` must be a live process handle opened with QUERY_INFORMATION | VM_READ.
pub unsafe fn enum_process_modules(handle: HANDLE) -> WinResult<Vec<HMODULE>> {
    let mut modules: Vec<HMODULE> = vec![std::ptr::null_mut(); 1024];
    let mut needed: DWORD = 0;

    let ok = EnumProcessModules(
        handle,
        modules.as_mut_ptr(),
        (modules.len() * mem::size_of::<HMODULE>()) as DWORD,
        &mut needed,
    );
    if ok == FALSE {
        return last_error();
    }

    let count = (needed as usize / mem::size_of::<HMODULE>()).min(modules.len());
    modules.truncate(count);
    Ok(modules)
}

/// Fetches a module's base file name (e.g. "kernel32.dll")
///
/// # Safety
/// `handle` and `module` must be live and belong to the same process.
pub unsafe fn module_base_name(handle: HANDLE, module: HMODULE) -> WinResult<String> {
    let mut name = [0u16; MAX_PATH];
    let len = GetModuleBaseNameW(handle, module, name.as_mut_ptr(), MAX_PATH as DWORD);
    if len == 0 {
        last_error()
    } else {
        Ok(wide_to_string(&name[..len as usize]))
    }
}

/// Fetches a module's full on-disk path, if one is known
///
/// # Safety
/// `handle` and `module` must be live and belong to the same process.
pub unsafe fn module_file_name(handle: HANDLE, module: HMODULE) -> Option<String> {
    let mut path = [0u16; MAX_PATH];
    let len = GetModuleFileNameExW(handle, module, path.as_mut_ptr(), MAX_PATH as DWORD);
    if len == 0 {
        None
    } else {
        Some(wide_to_string(&path[..len as usize]))
    }
}

/// Fetches a module's base address and image size
///
/// # Safety
/// `handle` and `module` must be live and belong to the same process.
pub unsafe fn module_information(handle: HANDLE, module: HMODULE) -> WinResult<MODULEINFO> {
    let mut info: MODULEINFO = mem::zeroed();
    let ok = GetModuleInformation(
        handle,
        module,
        &mut info,
        mem::size_of::<MODULEINFO>() as DWORD,
    );
    if ok == FALSE {
        last_error()
    } else {
        Ok(info)
    }
}

/// Fetches working-set and pagefile counters for a process
///
/// # Safety
/// `handle` must be a live process handle opened with QUERY_INFORMATION.
pub unsafe fn process_memory_counters(handle: HANDLE) -> WinResult<PROCESS_MEMORY_COUNTERS> {
    let mut counters: PROCESS_MEMORY_COUNTERS = mem::zeroed();
    counters.cb = mem::size_of::<PROCESS_MEMORY_COUNTERS>() as DWORD;
    let ok = GetProcessMemoryInfo(handle, &mut counters, counters.cb);
    if ok == FALSE {
        last_error()
    } else {
        Ok(counters)
    }
}
