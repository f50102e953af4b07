//! Running-process catalog
//!
//! Enumerates processes via a ToolHelp32 snapshot and resolves the
//! name/pid pairs users pick to attach targets. Architecture detection is
//! best-effort: processes we cannot open stay `Unknown`.

use crate::core::types::{CatalogError, ProcessArchitecture, ProcessInfo};
use crate::windows::bindings::{kernel32, toolhelp};
use crate::windows::types::Handle;
use winapi::um::winnt::PROCESS_QUERY_LIMITED_INFORMATION;

/// Enumerates all running processes, sorted by name then pid
pub fn enumerate_processes() -> Result<Vec<ProcessInfo>, CatalogError> {
    let snapshot = toolhelp::ProcessSnapshot::take()?;
    let mut processes: Vec<ProcessInfo> = snapshot
        .map(|entry| {
            let mut info = ProcessInfo::new(entry.pid, entry.name);
            info.parent_pid = Some(entry.parent_pid);
            info.thread_count = entry.thread_count;
            info.architecture = detect_architecture(entry.pid);
            info
        })
        .collect();

    processes.sort_by(|a, b| {
        a.name
            .to_ascii_lowercase()
            .cmp(&b.name.to_ascii_lowercase())
            .then(a.pid.cmp(&b.pid))
    });
    Ok(processes)
}

/// Finds every process with the given name, case-insensitively
pub fn find_by_name(name: &str) -> Result<Vec<ProcessInfo>, CatalogError> {
    Ok(enumerate_processes()?
        .into_iter()
        .filter(|p| p.name_matches(name))
        .collect())
}

/// Finds a process by pid
pub fn find_by_pid(pid: u32) -> Result<Option<ProcessInfo>, CatalogError> {
    Ok(enumerate_processes()?.into_iter().find(|p| p.pid == pid))
}

fn detect_architecture(pid: u32) -> ProcessArchitecture {
    let raw = match kernel32::open_process(pid, PROCESS_QUERY_LIMITED_INFORMATION) {
        Ok(raw) => raw,
        Err(_) => return ProcessArchitecture::Unknown,
    };
    let handle = Handle::new(raw);
    match unsafe { kernel32::is_wow64_process(handle.raw()) } {
        Ok(true) => ProcessArchitecture::X86,
        Ok(false) => ProcessArchitecture::X64,
        Err(_) => ProcessArchitecture::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn enumeration_contains_current_process() {
        let own = std::process::id();
        let processes = enumerate_processes().expect("enumerate");
        assert!(processes.iter().any(|p| p.pid == own));
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn output_is_sorted_by_name() {
        let processes = enumerate_processes().expect("enumerate");
        let names: Vec<String> = processes
            .iter()
            .map(|p| p.name.to_ascii_lowercase())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn find_by_pid_misses_unknown_pid() {
        assert!(find_by_pid(0xFFFF_FFFE).expect("enumerate").is_none());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn find_by_name_is_case_insensitive() {
        let own = std::process::id();
        let me = find_by_pid(own).expect("enumerate").expect("own entry");
        let upper = me.name.to_ascii_uppercase();
        let hits = find_by_name(&upper).expect("find");
        assert!(hits.iter().any(|p| p.pid == own));
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn current_process_architecture_is_known() {
        let own = std::process::id();
        let me = find_by_pid(own).expect("enumerate").expect("own entry");
        assert_ne!(me.architecture, ProcessArchitecture::Unknown);
    }
}
