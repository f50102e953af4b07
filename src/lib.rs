//! memedit: process memory scanning, editing and DLL injection for Windows
//!
//! The engine attaches to a running process, searches its committed memory
//! for typed values, narrows the hits across successive scans, edits the
//! survivors in place, and can load or unload a DLL in the target via a
//! remote loader thread. A separate inspector reports on the hosting
//! process itself.

pub mod config;
pub mod core;
pub mod engine;
pub mod inject;
pub mod inspect;
pub mod memory;
pub mod process;
pub mod windows;

// Primary surface re-exports
pub use crate::core::types::{
    Address, AttachError, CodecError, EjectError, EngineError, EngineResult, InjectError,
    InspectError, MemoryRegion, ModuleInfo, ProcessInfo, ReadError, ScanError, ScanValue,
    ValueType, WriteError,
};
pub use engine::MemoryEngine;
pub use inject::{InjectState, InjectionEngine};
pub use inspect::SelfInspector;
pub use memory::{ScanEngine, ScanEvent, ScanProgress};
pub use process::ProcessHandle;
