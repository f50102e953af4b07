//! Owned handle to an attached target process
//!
//! The handle carries every access right the engine needs up front: memory
//! read/write, allocation, and remote thread creation. It is the single
//! gateway for all target-process I/O; the scanner and injector never talk
//! to the OS directly.

use crate::core::types::{Address, AttachError, ReadError, WriteError};
use crate::core::types::{MemoryRegion, RegionKind, RegionState};
use crate::process::privileges;
use crate::windows::bindings::kernel32::{self, WinResult};
use crate::windows::types::Handle;
use std::time::Duration;
use tracing::debug;
use winapi::shared::minwindef::DWORD;
use winapi::um::winnt::{
    HANDLE, PROCESS_CREATE_THREAD, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION,
    PROCESS_VM_READ, PROCESS_VM_WRITE,
};

const STILL_ACTIVE: u32 = 259;
const WAIT_OBJECT_0: DWORD = 0;

/// Access mask required for scanning, editing and injection
const ENGINE_ACCESS: DWORD = PROCESS_QUERY_INFORMATION
    | PROCESS_VM_READ
    | PROCESS_VM_WRITE
    | PROCESS_VM_OPERATION
    | PROCESS_CREATE_THREAD;

/// Outcome of waiting on a remote thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    Finished,
    TimedOut,
}

/// An owned OS handle to a target process
pub struct ProcessHandle {
    handle: Handle,
    pid: u32,
}

impl ProcessHandle {
    /// Opens `pid` with the full engine access mask.
    ///
    /// Debug privilege is requested once per process, best-effort; without
    /// it, attaching to processes owned by other users fails with
    /// [`AttachError::AccessDenied`].
    pub fn attach(pid: u32) -> Result<Self, AttachError> {
        privileges::ensure_debug_privilege();

        match kernel32::open_process(pid, ENGINE_ACCESS) {
            Ok(raw) => Ok(ProcessHandle {
                handle: Handle::new(raw),
                pid,
            }),
            Err(source) => {
                if source.code() == windows::Win32::Foundation::ERROR_ACCESS_DENIED.to_hresult() {
                    Err(AttachError::AccessDenied { pid, source })
                } else {
                    Err(AttachError::NotFound { pid })
                }
            }
        }
    }

    /// The target's process id
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// The raw HANDLE, valid only while this wrapper lives
    ///
    /// # Safety
    /// The caller must not close the handle or outlive this wrapper with it.
    pub unsafe fn raw(&self) -> HANDLE {
        self.handle.raw()
    }

    /// Whether the target process is still running
    pub fn is_alive(&self) -> bool {
        match unsafe { kernel32::get_exit_code_process(self.handle.raw()) } {
            Ok(code) => code == STILL_ACTIVE,
            Err(_) => false,
        }
    }

    /// Reads exactly `length` bytes at `address`; short reads are errors
    pub fn read_bytes(&self, address: Address, length: usize) -> Result<Vec<u8>, ReadError> {
        if length == 0 {
            return Ok(Vec::new());
        }
        let mut buffer = vec![0u8; length];
        match unsafe {
            kernel32::read_process_memory(self.handle.raw(), address.as_usize(), &mut buffer)
        } {
            Ok(n) if n == length => Ok(buffer),
            Ok(n) => Err(ReadError::Incomplete {
                address,
                expected: length,
                actual: n,
            }),
            Err(_) => Err(ReadError::InaccessibleMemory { address }),
        }
    }

    /// Writes all of `data` at `address`; short writes are errors.
    ///
    /// A failure on a committed but non-writable page is reported as
    /// [`WriteError::ReadOnlyMemory`].
    pub fn write_bytes(&self, address: Address, data: &[u8]) -> Result<(), WriteError> {
        if data.is_empty() {
            return Ok(());
        }
        match unsafe {
            kernel32::write_process_memory(self.handle.raw(), address.as_usize(), data)
        } {
            Ok(n) if n == data.len() => Ok(()),
            Ok(n) => Err(WriteError::Incomplete {
                address,
                expected: data.len(),
                actual: n,
            }),
            Err(_) => Err(self.classify_write_failure(address)),
        }
    }

    fn classify_write_failure(&self, address: Address) -> WriteError {
        match self.query_region(address) {
            Some(region) if region.is_committed() && !region.is_writable() => {
                WriteError::ReadOnlyMemory { address }
            }
            _ => WriteError::InaccessibleMemory { address },
        }
    }

    /// Queries the region containing `address`, if the OS will say
    pub fn query_region(&self, address: Address) -> Option<MemoryRegion> {
        let mbi = unsafe { kernel32::virtual_query_ex(self.handle.raw(), address.as_usize()) }.ok()?;
        Some(MemoryRegion {
            base: Address::new(mbi.BaseAddress as usize),
            size: mbi.RegionSize,
            state: RegionState::from_raw(mbi.State),
            kind: RegionKind::from_raw(mbi.Type),
            protection: mbi.Protect,
        })
    }

    /// Commits `size` bytes in the target, returning the allocation base
    pub fn allocate(&self, size: usize, protection: u32) -> WinResult<Address> {
        unsafe { kernel32::virtual_alloc_ex(self.handle.raw(), size, protection) }
            .map(Address::new)
    }

    /// Releases an allocation made with [`ProcessHandle::allocate`]
    pub fn free(&self, address: Address) {
        if let Err(err) = unsafe { kernel32::virtual_free_ex(self.handle.raw(), address.as_usize()) }
        {
            debug!(%address, %err, "failed to free remote allocation");
        }
    }

    /// Starts a thread in the target at `entry` with `argument`
    pub fn create_remote_thread(&self, entry: Address, argument: Address) -> WinResult<RemoteThread> {
        let raw = unsafe {
            kernel32::create_remote_thread(self.handle.raw(), entry.as_usize(), argument.as_usize())
        }?;
        Ok(RemoteThread {
            handle: Handle::new(raw),
        })
    }
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("valid", &self.handle.is_valid())
            .finish()
    }
}

/// A thread started in the target process; the handle closes on drop
pub struct RemoteThread {
    handle: Handle,
}

impl RemoteThread {
    /// Waits for the thread to finish within `timeout`
    pub fn wait(&self, timeout: Duration) -> WaitStatus {
        let millis = timeout.as_millis().min(u128::from(u32::MAX - 1)) as u32;
        let status = unsafe { kernel32::wait_for_single_object(self.handle.raw(), millis) };
        if status == WAIT_OBJECT_0 {
            WaitStatus::Finished
        } else {
            WaitStatus::TimedOut
        }
    }

    /// The thread's exit code; for loader threads this is the module base
    pub fn exit_code(&self) -> WinResult<u32> {
        unsafe { kernel32::get_exit_code_thread(self.handle.raw()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn attach_to_missing_pid_is_not_found() {
        match ProcessHandle::attach(0) {
            Err(AttachError::NotFound { pid }) => assert_eq!(pid, 0),
            other => panic!("expected NotFound, got {:?}", other.map(|h| h.pid())),
        }
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn attach_to_self_reads_own_memory() {
        let marker: u32 = 0xC0FFEE;
        let handle = ProcessHandle::attach(std::process::id()).expect("attach self");
        assert!(handle.is_alive());

        let bytes = handle
            .read_bytes(Address::from(&marker as *const u32 as *const u8), 4)
            .expect("read marker");
        assert_eq!(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), marker);
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn read_of_unmapped_address_fails_cleanly() {
        let handle = ProcessHandle::attach(std::process::id()).expect("attach self");
        let result = handle.read_bytes(Address::new(8), 4);
        assert!(matches!(
            result,
            Err(ReadError::InaccessibleMemory { .. }) | Err(ReadError::Incomplete { .. })
        ));
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn write_round_trips_in_own_memory() {
        let slot = Box::new(0u32);
        let address = Address::from(&*slot as *const u32 as *const u8);
        let handle = ProcessHandle::attach(std::process::id()).expect("attach self");

        handle
            .write_bytes(address, &777u32.to_le_bytes())
            .expect("write");
        let bytes = handle.read_bytes(address, 4).expect("read back");
        assert_eq!(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 777);
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn zero_length_transfers_are_noops() {
        let handle = ProcessHandle::attach(std::process::id()).expect("attach self");
        assert!(handle.read_bytes(Address::new(0x10), 0).unwrap().is_empty());
        assert!(handle.write_bytes(Address::new(0x10), &[]).is_ok());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn allocate_and_free_in_self() {
        use winapi::um::winnt::PAGE_READWRITE;
        let handle = ProcessHandle::attach(std::process::id()).expect("attach self");
        let base = handle.allocate(4096, PAGE_READWRITE).expect("allocate");
        assert!(!base.is_null());

        handle.write_bytes(base, &[1, 2, 3, 4]).expect("write");
        assert_eq!(handle.read_bytes(base, 4).expect("read"), vec![1, 2, 3, 4]);
        handle.free(base);
    }
}
