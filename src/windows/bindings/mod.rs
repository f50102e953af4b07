//! Thin safe wrappers over the Win32 APIs the engine uses

pub mod kernel32;
pub mod psapi;
pub mod toolhelp;

pub use kernel32::WinResult;
