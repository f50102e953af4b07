//! Core module containing the fundamental types of the engine

pub mod types;

pub use types::{
    Address, EngineError, EngineResult, MemoryRegion, ModuleInfo, ProcessInfo, ScanValue,
    ValueType,
};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Platform verification at compile time
#[cfg(not(target_os = "windows"))]
compile_error!("memedit only supports Windows");

#[cfg(not(target_pointer_width = "64"))]
compile_error!("memedit requires a 64-bit build");
