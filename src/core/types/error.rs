//! Typed error taxonomy for engine operations
//!
//! Every fallible operation returns one of the enums below; OS failures are
//! converted at the `windows` layer and never bubble up as raw status codes.
//! Per-region and per-address failures inside a scan are not represented
//! here at all: the scanner logs and skips them.

use super::{Address, ValueType};
use std::path::PathBuf;
use thiserror::Error;

/// Failure to open a target process
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("process {pid} not found")]
    NotFound { pid: u32 },

    #[error("access denied to process {pid}, elevation may be required: {source}")]
    AccessDenied {
        pid: u32,
        source: windows::core::Error,
    },
}

/// Failure reading target memory
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("memory at {address} is not committed or not readable")]
    InaccessibleMemory { address: Address },

    #[error("short read at {address}: wanted {expected} bytes, got {actual}")]
    Incomplete {
        address: Address,
        expected: usize,
        actual: usize,
    },
}

/// Failure writing target memory
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("memory at {address} is write-protected")]
    ReadOnlyMemory { address: Address },

    #[error("memory at {address} is not committed or not writable")]
    InaccessibleMemory { address: Address },

    #[error("short write at {address}: wanted {expected} bytes, wrote {actual}")]
    Incomplete {
        address: Address,
        expected: usize,
        actual: usize,
    },
}

/// Failure encoding or parsing a typed value
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("cannot parse {text:?} as {value_type}")]
    InvalidFormat { text: String, value_type: ValueType },

    #[error("{text:?} is outside the range of {value_type}")]
    OutOfRange { text: String, value_type: ValueType },
}

/// Failure starting or running a scan
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    InvalidValueFormat(#[from] CodecError),

    #[error("no previous results to narrow; run a first scan")]
    EmptyScan,

    #[error("a scan is already in progress")]
    ScanInProgress,

    #[error("target process exited during the scan")]
    ProcessGone,
}

/// Failure loading a library into the target process
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("not a loadable library path: {0}")]
    InvalidLibraryPath(PathBuf),

    #[error("failed to allocate {size} bytes in target: {source}")]
    AllocationFailed {
        size: usize,
        source: windows::core::Error,
    },

    #[error("failed to stage library path in target: {0}")]
    StagingFailed(#[from] WriteError),

    #[error("remote loader thread failed: {0}")]
    RemoteThread(String),

    #[error("loader thread did not finish within {0} ms")]
    Timeout(u64),

    #[error("target loader rejected the library (returned null)")]
    LoadFailed,
}

/// Failure unloading a library from the target process
#[derive(Debug, Error)]
pub enum EjectError {
    #[error("module {0:?} not loaded in target")]
    ModuleNotFound(String),

    #[error("remote unload thread failed: {0}")]
    RemoteThread(String),

    #[error("unload thread did not finish within {0} ms")]
    Timeout(u64),

    #[error("target failed to unload the module")]
    UnloadFailed,
}

/// Failure enumerating running processes
#[derive(Debug, Error)]
#[error("process enumeration failed: {0}")]
pub struct CatalogError(#[from] pub windows::core::Error);

/// Failure answering a self-inspection query
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("{0} is not available on this platform")]
    Unsupported(&'static str),

    #[error("inspection query failed: {0}")]
    Query(String),
}

/// Aggregate error for the engine facade
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no process attached")]
    NotAttached,

    #[error("no watched address at index {0}")]
    UnknownWatch(usize),

    #[error(transparent)]
    Attach(#[from] AttachError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Inject(#[from] InjectError),

    #[error(transparent)]
    Eject(#[from] EjectError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Inspect(#[from] InspectError),
}

/// Result alias for engine facade operations
pub type EngineResult<T> = Result<T, EngineError>;
