//! Library injection and ejection via remote loader threads
//!
//! Loading works by staging the library path inside the target and running
//! the target's own loader on it from a remote thread: the thread's exit
//! code is the loader's return value, so a null result means the target
//! rejected the library (wrong architecture, missing dependency), not that
//! the transport failed. The staged buffer and the thread handle are
//! reclaimed on every exit path.

use crate::core::types::{Address, EjectError, InjectError, ModuleInfo};
use crate::process::{modules, ProcessHandle, WaitStatus};
use crate::windows::bindings::kernel32;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use winapi::um::winnt::PAGE_READWRITE;

/// Extension a loadable library must carry
pub const LIBRARY_EXTENSION: &str = "dll";

/// Default bound on how long a remote loader thread may run
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

const LOAD_LIBRARY: &[u8] = b"LoadLibraryA\0";
const FREE_LIBRARY: &[u8] = b"FreeLibrary\0";

/// Lifecycle of the most recent injection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectState {
    Unloaded,
    Injecting,
    Loaded,
    InjectFailed,
    Ejecting,
    EjectFailed,
}

/// Frees the staged path buffer in the target when the attempt ends
struct RemoteBuffer<'a> {
    handle: &'a ProcessHandle,
    base: Address,
}

impl Drop for RemoteBuffer<'_> {
    fn drop(&mut self) {
        self.handle.free(self.base);
    }
}

/// Drives library load/unload in an attached target
pub struct InjectionEngine {
    state: InjectState,
    wait_timeout: Duration,
}

impl Default for InjectionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT_TIMEOUT)
    }
}

impl InjectionEngine {
    pub fn new(wait_timeout: Duration) -> Self {
        InjectionEngine {
            state: InjectState::Unloaded,
            wait_timeout,
        }
    }

    pub fn state(&self) -> InjectState {
        self.state
    }

    /// Loads the library at `library_path` into the target, returning the
    /// module base the target's loader reported.
    pub fn inject(
        &mut self,
        handle: &ProcessHandle,
        library_path: &Path,
    ) -> Result<Address, InjectError> {
        self.state = InjectState::Injecting;
        let outcome = validate_library_path(library_path)
            .and_then(|_| run_inject(handle, library_path, self.wait_timeout));
        self.state = match outcome {
            Ok(_) => InjectState::Loaded,
            Err(_) => InjectState::InjectFailed,
        };
        outcome
    }

    /// Unloads the named module from the target
    pub fn eject(&mut self, handle: &ProcessHandle, module_name: &str) -> Result<(), EjectError> {
        self.state = InjectState::Ejecting;
        let outcome = run_eject(handle, module_name, self.wait_timeout);
        self.state = match outcome {
            Ok(()) => InjectState::Unloaded,
            Err(_) => InjectState::EjectFailed,
        };
        outcome
    }

    /// Libraries currently mapped into the target; empty when enumeration
    /// is denied
    pub fn list_modules(&self, handle: &ProcessHandle) -> Vec<ModuleInfo> {
        modules::loaded_libraries(handle, LIBRARY_EXTENSION)
    }
}

fn validate_library_path(path: &Path) -> Result<(), InjectError> {
    let has_extension = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case(LIBRARY_EXTENSION))
        .unwrap_or(false);
    if !has_extension || !path.is_file() {
        return Err(InjectError::InvalidLibraryPath(path.to_path_buf()));
    }
    Ok(())
}

fn run_inject(
    handle: &ProcessHandle,
    library_path: &Path,
    timeout: Duration,
) -> Result<Address, InjectError> {
    let entry = kernel32::kernel32_symbol(LOAD_LIBRARY)
        .map_err(|e| InjectError::RemoteThread(format!("resolving LoadLibraryA: {e}")))?;

    // Path string staged into the target, NUL-terminated for the loader
    let mut path_bytes = library_path.to_string_lossy().into_owned().into_bytes();
    path_bytes.push(0);

    let base = handle
        .allocate(path_bytes.len(), PAGE_READWRITE)
        .map_err(|source| InjectError::AllocationFailed {
            size: path_bytes.len(),
            source,
        })?;
    let staged = RemoteBuffer { handle, base };

    handle.write_bytes(staged.base, &path_bytes)?;
    debug!(path = %library_path.display(), buffer = %staged.base, "staged library path");

    let thread = handle
        .create_remote_thread(Address::new(entry), staged.base)
        .map_err(|e| InjectError::RemoteThread(e.to_string()))?;

    if thread.wait(timeout) == WaitStatus::TimedOut {
        return Err(InjectError::Timeout(timeout.as_millis() as u64));
    }

    let module_base = thread
        .exit_code()
        .map_err(|e| InjectError::RemoteThread(e.to_string()))?;
    if module_base == 0 {
        return Err(InjectError::LoadFailed);
    }

    let loaded = Address::new(module_base as usize);
    info!(path = %library_path.display(), base = %loaded, "library loaded");
    Ok(loaded)
}

fn run_eject(
    handle: &ProcessHandle,
    module_name: &str,
    timeout: Duration,
) -> Result<(), EjectError> {
    let module = modules::find_by_name(handle, module_name)
        .ok()
        .flatten()
        .ok_or_else(|| EjectError::ModuleNotFound(module_name.to_string()))?;

    let entry = kernel32::kernel32_symbol(FREE_LIBRARY)
        .map_err(|e| EjectError::RemoteThread(format!("resolving FreeLibrary: {e}")))?;

    let thread = handle
        .create_remote_thread(Address::new(entry), module.base)
        .map_err(|e| EjectError::RemoteThread(e.to_string()))?;

    if thread.wait(timeout) == WaitStatus::TimedOut {
        return Err(EjectError::Timeout(timeout.as_millis() as u64));
    }

    let freed = thread
        .exit_code()
        .map_err(|e| EjectError::RemoteThread(e.to_string()))?;
    if freed == 0 {
        return Err(EjectError::UnloadFailed);
    }

    info!(module = module_name, base = %module.base, "library unloaded");
    Ok(())
}
