//! Shared helpers for integration tests
//!
//! Scan scenarios run against a disposable child process rather than the
//! test process itself: scanning your own address space also finds the
//! scanner's working buffers, which makes exact-match assertions
//! meaningless.

// Not every test crate uses every helper
#![allow(dead_code)]

use memedit::core::types::{Address, ScanValue};
use memedit::process::ProcessHandle;
use std::process::{Child, Command, Stdio};

const PAGE_READWRITE: u32 = 0x04;

/// A console child parked on piped stdin; killed on drop
pub struct ChildTarget {
    child: Child,
}

impl ChildTarget {
    pub fn spawn() -> Self {
        let child = Command::new("cmd.exe")
            .args(["/C", "pause"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn child target");
        ChildTarget { child }
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

impl Drop for ChildTarget {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Allocates a slot in the target and writes `value` into it
pub fn plant_value(handle: &ProcessHandle, value: ScanValue) -> Address {
    let base = handle
        .allocate(value.width().max(16), PAGE_READWRITE)
        .expect("allocate in target");
    handle
        .write_bytes(base, &value.to_bytes())
        .expect("write planted value");
    base
}
