//! Windows API layer
//!
//! All unsafe FFI calls live below this module; failures are converted to
//! `windows::core::Error` and mapped onto the typed taxonomy by callers.

pub mod bindings;
pub mod types;
pub mod utils;

pub use bindings::{kernel32, psapi, toolhelp};
pub use types::Handle;
