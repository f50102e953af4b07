//! ToolHelp32 snapshot wrappers for process and thread enumeration

use super::kernel32::WinResult;
use crate::windows::types::Handle;
use std::mem;
use winapi::shared::minwindef::FALSE;
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Process32First, Process32Next, Thread32First, Thread32Next,
    PROCESSENTRY32, TH32CS_SNAPPROCESS, TH32CS_SNAPTHREAD, THREADENTRY32,
};

/// One row of a process snapshot
#[derive(Debug, Clone)]
pub struct ProcessEntry {
    pub pid: u32,
    pub parent_pid: u32,
    pub thread_count: u32,
    pub name: String,
}

/// One row of a thread snapshot
#[derive(Debug, Clone, Copy)]
pub struct ThreadEntry {
    pub tid: u32,
    pub owner_pid: u32,
    pub base_priority: i32,
}

fn snapshot(flags: u32) -> WinResult<Handle> {
    let raw = unsafe { CreateToolhelp32Snapshot(flags, 0) };
    let handle = Handle::new(raw);
    if handle.is_valid() {
        Ok(handle)
    } else {
        Err(windows::core::Error::from_win32())
    }
}

fn entry_name(raw: &[i8]) -> String {
    let terminator = raw.iter().position(|&c| c == 0).unwrap_or(raw.len());
    let bytes: Vec<u8> = raw[..terminator].iter().map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Iterates over a system-wide process snapshot
pub struct ProcessSnapshot {
    handle: Handle,
    first_taken: bool,
}

impl ProcessSnapshot {
    pub fn take() -> WinResult<Self> {
        Ok(ProcessSnapshot {
            handle: snapshot(TH32CS_SNAPPROCESS)?,
            first_taken: false,
        })
    }
}

impl Iterator for ProcessSnapshot {
    type Item = ProcessEntry;

    fn next(&mut self) -> Option<Self::Item> {
        unsafe {
            let mut entry: PROCESSENTRY32 = mem::zeroed();
            entry.dwSize = mem::size_of::<PROCESSENTRY32>() as u32;

            let ok = if self.first_taken {
                Process32Next(self.handle.raw(), &mut entry)
            } else {
                self.first_taken = true;
                Process32First(self.handle.raw(), &mut entry)
            };
            if ok == FALSE {
                return None;
            }

            Some(ProcessEntry {
                pid: entry.th32ProcessID,
                parent_pid: entry.th32ParentProcessID,
                thread_count: entry.cntThreads,
                name: entry_name(&entry.szExeFile),
            })
        }
    }
}

/// Iterates over a system-wide thread snapshot
pub struct ThreadSnapshot {
    handle: Handle,
    first_taken: bool,
}

impl ThreadSnapshot {
    pub fn take() -> WinResult<Self> {
        Ok(ThreadSnapshot {
            handle: snapshot(TH32CS_SNAPTHREAD)?,
            first_taken: false,
        })
    }
}

impl Iterator for ThreadSnapshot {
    type Item = ThreadEntry;

    fn next(&mut self) -> Option<Self::Item> {
        unsafe {
            let mut entry: THREADENTRY32 = mem::zeroed();
            entry.dwSize = mem::size_of::<THREADENTRY32>() as u32;

            let ok = if self.first_taken {
                Thread32Next(self.handle.raw(), &mut entry)
            } else {
                self.first_taken = true;
                Thread32First(self.handle.raw(), &mut entry)
            };
            if ok == FALSE {
                return None;
            }

            Some(ThreadEntry {
                tid: entry.th32ThreadID,
                owner_pid: entry.th32OwnerProcessID,
                base_priority: entry.tpBasePri,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_name_stops_at_terminator() {
        let raw: [i8; 8] = [b'a' as i8, b'b' as i8, 0, b'x' as i8, 0, 0, 0, 0];
        assert_eq!(entry_name(&raw), "ab");
    }

    #[test]
    fn entry_name_without_terminator() {
        let raw: [i8; 3] = [b'a' as i8, b'b' as i8, b'c' as i8];
        assert_eq!(entry_name(&raw), "abc");
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn process_snapshot_includes_self() {
        let own = std::process::id();
        let found = ProcessSnapshot::take()
            .expect("snapshot")
            .any(|p| p.pid == own);
        assert!(found);
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn thread_snapshot_includes_own_threads() {
        let own = std::process::id();
        let count = ThreadSnapshot::take()
            .expect("snapshot")
            .filter(|t| t.owner_pid == own)
            .count();
        assert!(count >= 1);
    }
}
