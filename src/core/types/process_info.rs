//! Process and module description types

use super::{Address, ProcessId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A running process as reported by the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: ProcessId,
    pub name: String,
    pub parent_pid: Option<ProcessId>,
    pub thread_count: u32,
    pub architecture: ProcessArchitecture,
}

impl ProcessInfo {
    pub fn new(pid: ProcessId, name: String) -> Self {
        ProcessInfo {
            pid,
            name,
            parent_pid: None,
            thread_count: 0,
            architecture: ProcessArchitecture::Unknown,
        }
    }

    /// Case-insensitive name comparison, the way users type process names
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// System idle / System pseudo-processes that cannot be attached
    pub fn is_system_process(&self) -> bool {
        self.pid == 0 || self.pid == 4
    }
}

/// Architecture of a target process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessArchitecture {
    X86,
    X64,
    Unknown,
}

impl ProcessArchitecture {
    pub fn pointer_size(&self) -> usize {
        match self {
            ProcessArchitecture::X86 => 4,
            ProcessArchitecture::X64 => 8,
            ProcessArchitecture::Unknown => std::mem::size_of::<usize>(),
        }
    }
}

/// A module mapped into a process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub name: String,
    pub path: PathBuf,
    pub base: Address,
    pub size: usize,
}

impl ModuleInfo {
    pub fn new(name: String, base: Address, size: usize) -> Self {
        ModuleInfo {
            name,
            path: PathBuf::new(),
            base,
            size,
        }
    }

    pub fn end(&self) -> Address {
        self.base.add(self.size)
    }

    pub fn contains(&self, address: Address) -> bool {
        address >= self.base && address < self.end()
    }

    /// Whether the module's on-disk path carries the given extension
    pub fn has_extension(&self, extension: &str) -> bool {
        self.path
            .extension()
            .map(|e| e.eq_ignore_ascii_case(extension))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_matching_is_case_insensitive() {
        let info = ProcessInfo::new(42, "Notepad.exe".to_string());
        assert!(info.name_matches("notepad.exe"));
        assert!(info.name_matches("NOTEPAD.EXE"));
        assert!(!info.name_matches("notepad"));
    }

    #[test]
    fn system_processes() {
        assert!(ProcessInfo::new(0, "Idle".into()).is_system_process());
        assert!(ProcessInfo::new(4, "System".into()).is_system_process());
        assert!(!ProcessInfo::new(1234, "app.exe".into()).is_system_process());
    }

    #[test]
    fn pointer_sizes() {
        assert_eq!(ProcessArchitecture::X86.pointer_size(), 4);
        assert_eq!(ProcessArchitecture::X64.pointer_size(), 8);
    }

    #[test]
    fn module_bounds() {
        let module = ModuleInfo::new("kernel32.dll".into(), Address::new(0x10000), 0x1000);
        assert!(module.contains(Address::new(0x10800)));
        assert!(!module.contains(Address::new(0x11000)));
        assert_eq!(module.end(), Address::new(0x11000));
    }

    #[test]
    fn extension_check_uses_path() {
        let mut module = ModuleInfo::new("thing.dll".into(), Address::new(0x1000), 0x100);
        assert!(!module.has_extension("dll"));
        module.path = PathBuf::from(r"C:\Windows\System32\thing.DLL");
        assert!(module.has_extension("dll"));
        assert!(!module.has_extension("so"));
    }
}
