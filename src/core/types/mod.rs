//! Core type definitions shared by every engine component

mod address;
mod error;
mod process_info;
mod region;
mod value;

pub use address::{Address, ParseAddressError};
pub use error::{
    AttachError, CatalogError, CodecError, EjectError, EngineError, EngineResult, InjectError,
    InspectError, ReadError, ScanError, WriteError,
};
pub use process_info::{ModuleInfo, ProcessArchitecture, ProcessInfo};
pub use region::{MemoryRegion, RegionKind, RegionState};
pub use value::{ScanValue, ValueType};

// Common type aliases
pub type ProcessId = u32;
pub type ThreadId = u32;
