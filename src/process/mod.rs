//! Process discovery, attachment and module inspection

pub mod catalog;
pub mod handle;
pub mod modules;
pub mod privileges;

pub use catalog::{enumerate_processes, find_by_name, find_by_pid};
pub use handle::{ProcessHandle, RemoteThread, WaitStatus};
