//! Module enumeration for a target process

use crate::core::types::{Address, ModuleInfo};
use crate::process::ProcessHandle;
use crate::windows::bindings::psapi;
use crate::windows::bindings::WinResult;
use std::path::PathBuf;

/// Lists every module mapped into the target process
pub fn enumerate(handle: &ProcessHandle) -> WinResult<Vec<ModuleInfo>> {
    let raw_handle = unsafe { handle.raw() };
    let modules = unsafe { psapi::enum_process_modules(raw_handle) }?;

    let mut infos = Vec::with_capacity(modules.len());
    for module in modules {
        let name = match unsafe { psapi::module_base_name(raw_handle, module) } {
            Ok(name) => name,
            Err(_) => continue,
        };
        let details = match unsafe { psapi::module_information(raw_handle, module) } {
            Ok(details) => details,
            Err(_) => continue,
        };

        let mut info = ModuleInfo::new(
            name,
            Address::new(details.lpBaseOfDll as usize),
            details.SizeOfImage as usize,
        );
        if let Some(path) = unsafe { psapi::module_file_name(raw_handle, module) } {
            info.path = PathBuf::from(path);
        }
        infos.push(info);
    }
    Ok(infos)
}

/// Finds a module in the target by name, case-insensitively
pub fn find_by_name(handle: &ProcessHandle, name: &str) -> WinResult<Option<ModuleInfo>> {
    Ok(enumerate(handle)?
        .into_iter()
        .find(|m| m.name.eq_ignore_ascii_case(name)))
}

/// Lists modules whose on-disk path carries a shared-library extension.
/// Returns an empty list, not an error, when enumeration is denied.
pub fn loaded_libraries(handle: &ProcessHandle, extension: &str) -> Vec<ModuleInfo> {
    enumerate(handle)
        .map(|modules| {
            modules
                .into_iter()
                .filter(|m| m.has_extension(extension))
                .collect()
        })
        .unwrap_or_default()
}
