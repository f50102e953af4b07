//! Engine facade: the call contract a presentation layer consumes
//!
//! One engine instance owns at most one attached process at a time,
//! together with the scan session, the watch table and the injector.
//! Everything a UI needs goes through here; the submodules stay usable
//! on their own for callers that want the non-blocking task API.

use crate::config::Config;
use crate::core::types::{
    Address, EngineError, EngineResult, ModuleInfo, ProcessInfo, ScanValue, ValueType,
};
use crate::inject::InjectionEngine;
use crate::memory::scanner::{ScanEngine, ScanEvent, ScanProgress};
use crate::memory::table::{self, AddressTable};
use crate::process::{catalog, ProcessHandle};
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Top-level engine instance
pub struct MemoryEngine {
    handle: Option<Arc<ProcessHandle>>,
    scanner: ScanEngine,
    table: AddressTable,
    injector: InjectionEngine,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::with_config(&Config::default())
    }
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &Config) -> Self {
        MemoryEngine {
            handle: None,
            scanner: ScanEngine::new(config.scanner.chunk_size),
            table: AddressTable::new(),
            injector: InjectionEngine::new(Duration::from_millis(
                config.injection.wait_timeout_ms,
            )),
        }
    }

    /// Running processes a user can pick an attach target from
    pub fn list_processes(&self) -> EngineResult<Vec<ProcessInfo>> {
        Ok(catalog::enumerate_processes()?)
    }

    /// Attaches to `pid`, replacing any previous attachment. The old
    /// scan session and watch table do not survive a re-attach.
    pub fn attach(&mut self, pid: u32) -> EngineResult<()> {
        self.detach();
        let handle = ProcessHandle::attach(pid)?;
        info!(pid, "attached");
        self.handle = Some(Arc::new(handle));
        Ok(())
    }

    /// Detaches from the target, first cancelling and joining any running
    /// scan so the OS handle is never released under a live worker.
    /// Idempotent.
    pub fn detach(&mut self) {
        if self.handle.is_none() {
            return;
        }
        self.scanner.stop();
        let _ = self.scanner.join();
        self.scanner.reset();
        self.table.clear();
        if let Some(handle) = self.handle.take() {
            info!(pid = handle.pid(), "detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    pub fn attached_pid(&self) -> Option<u32> {
        self.handle.as_ref().map(|h| h.pid())
    }

    fn require_handle(&self) -> EngineResult<&Arc<ProcessHandle>> {
        self.handle.as_ref().ok_or(EngineError::NotAttached)
    }

    /// Starts a first scan without blocking; events arrive on the
    /// returned channel and the result set lands in the session on
    /// completion.
    pub fn start_first_scan(
        &self,
        value_text: &str,
        value_type: ValueType,
    ) -> EngineResult<Receiver<ScanEvent>> {
        let handle = Arc::clone(self.require_handle()?);
        Ok(self
            .scanner
            .start_first_scan(handle, value_text, value_type)?)
    }

    /// Starts a narrowing scan without blocking
    pub fn start_next_scan(
        &self,
        value_text: &str,
        value_type: ValueType,
    ) -> EngineResult<Receiver<ScanEvent>> {
        let handle = Arc::clone(self.require_handle()?);
        Ok(self
            .scanner
            .start_next_scan(handle, value_text, value_type)?)
    }

    /// Waits for the running scan and returns the result set
    pub fn join_scan(&self) -> EngineResult<Vec<Address>> {
        Ok(self.scanner.join()?)
    }

    /// Convenience: runs a first scan to completion, forwarding progress
    /// snapshots to `on_progress`
    pub fn scan_first_with_progress(
        &mut self,
        value_text: &str,
        value_type: ValueType,
        on_progress: impl FnMut(ScanProgress),
    ) -> EngineResult<Vec<Address>> {
        let events = self.start_first_scan(value_text, value_type)?;
        drain(events, on_progress);
        self.join_scan()
    }

    /// Convenience: runs a first scan to completion
    pub fn scan_first(
        &mut self,
        value_text: &str,
        value_type: ValueType,
    ) -> EngineResult<Vec<Address>> {
        self.scan_first_with_progress(value_text, value_type, |_| {})
    }

    /// Convenience: runs a narrowing scan to completion, forwarding
    /// progress snapshots to `on_progress`
    pub fn scan_next_with_progress(
        &mut self,
        value_text: &str,
        value_type: ValueType,
        on_progress: impl FnMut(ScanProgress),
    ) -> EngineResult<Vec<Address>> {
        let events = self.start_next_scan(value_text, value_type)?;
        drain(events, on_progress);
        self.join_scan()
    }

    /// Convenience: runs a narrowing scan to completion
    pub fn scan_next(
        &mut self,
        value_text: &str,
        value_type: ValueType,
    ) -> EngineResult<Vec<Address>> {
        self.scan_next_with_progress(value_text, value_type, |_| {})
    }

    /// Requests cancellation of the running scan, from any thread
    pub fn stop_scan(&self) {
        self.scanner.stop();
    }

    pub fn is_scanning(&self) -> bool {
        self.scanner.is_scanning()
    }

    /// Addresses found by the most recent scan
    pub fn scan_results(&self) -> Vec<Address> {
        self.scanner.results()
    }

    /// Reads a typed value at an arbitrary address
    pub fn read_value(&self, address: Address, value_type: ValueType) -> EngineResult<ScanValue> {
        let handle = self.require_handle()?;
        Ok(table::read_value(handle, address, value_type)?)
    }

    /// Parses and writes a typed value at an arbitrary address; watch
    /// entries on the same address and type see the new value immediately
    pub fn write_value(
        &mut self,
        address: Address,
        value_type: ValueType,
        value_text: &str,
    ) -> EngineResult<()> {
        let handle = Arc::clone(self.require_handle()?);
        let value = ScanValue::parse(value_text, value_type)?;
        table::write_value(&handle, address, value)?;
        for index in 0..self.table.len() {
            if let Some(entry) = self.table.entry_mut(index) {
                if entry.address == address && entry.value_type == value_type {
                    entry.last_value = value;
                }
            }
        }
        Ok(())
    }

    /// Promotes a scan hit into the watch table, returning its index
    pub fn promote(&mut self, address: Address, value_type: ValueType) -> EngineResult<usize> {
        let handle = Arc::clone(self.require_handle()?);
        Ok(self.table.promote(&handle, address, value_type)?)
    }

    /// The watch table, for rendering
    pub fn watches(&self) -> &AddressTable {
        &self.table
    }

    /// Re-reads one watch entry
    pub fn refresh_watch(&mut self, index: usize) -> EngineResult<ScanValue> {
        let handle = Arc::clone(self.require_handle()?);
        let entry = self
            .table
            .entry_mut(index)
            .ok_or(EngineError::UnknownWatch(index))?;
        Ok(entry.refresh(&handle)?)
    }

    /// Parses and writes through one watch entry
    pub fn write_watch(&mut self, index: usize, value_text: &str) -> EngineResult<()> {
        let handle = Arc::clone(self.require_handle()?);
        let entry = self
            .table
            .entry_mut(index)
            .ok_or(EngineError::UnknownWatch(index))?;
        entry.write(&handle, value_text)
    }

    /// Drops a watch entry
    pub fn remove_watch(&mut self, index: usize) -> EngineResult<()> {
        self.table
            .remove(index)
            .map(|_| ())
            .ok_or(EngineError::UnknownWatch(index))
    }

    /// Loads a library into the target, returning its module base
    pub fn inject_library(&mut self, path: &Path) -> EngineResult<Address> {
        let handle = Arc::clone(self.require_handle()?);
        Ok(self.injector.inject(&handle, path)?)
    }

    /// Unloads a named module from the target
    pub fn eject_library(&mut self, module_name: &str) -> EngineResult<()> {
        let handle = Arc::clone(self.require_handle()?);
        Ok(self.injector.eject(&handle, module_name)?)
    }

    /// Libraries currently loaded in the target
    pub fn list_modules(&self) -> EngineResult<Vec<ModuleInfo>> {
        let handle = self.require_handle()?;
        Ok(self.injector.list_modules(handle))
    }
}

impl Drop for MemoryEngine {
    fn drop(&mut self) {
        self.detach();
    }
}

fn drain(events: Receiver<ScanEvent>, mut on_progress: impl FnMut(ScanProgress)) {
    for event in events {
        if let ScanEvent::Progress(progress) = event {
            on_progress(progress);
        }
    }
}
