//! Value scanning over a target's address space
//!
//! A scan runs on its own worker thread and reports progress through a
//! channel of immutable snapshots, so callers can render progress without
//! sharing any engine state. One scan may be in flight at a time per
//! engine; cancellation is cooperative via an atomic flag checked at
//! region and address-batch boundaries, never by interrupting the worker,
//! so remote reads always complete cleanly.

use crate::core::types::{Address, ScanError, ScanValue, ValueType};
use crate::memory::regions::readable_regions;
use crate::process::ProcessHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Default per-read chunk size; caps peak memory use during a first scan
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// How many previous addresses a narrowing scan re-checks between
/// cancellation checks and progress reports
const NARROW_BATCH: usize = 1024;

/// Immutable progress snapshot delivered to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ScanProgress {
    pub percent: u8,
    pub matches: usize,
}

/// Event stream of a running scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEvent {
    Progress(ScanProgress),
    Finished { matches: usize, cancelled: bool },
}

/// Clears the in-flight flag when the worker exits, however it exits
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The scan session: spawns workers, owns the current result set
pub struct ScanEngine {
    chunk_size: usize,
    cancel: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    results: Arc<Mutex<Vec<Address>>>,
    worker: Mutex<Option<JoinHandle<Result<(), ScanError>>>>,
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ScanEngine {
    pub fn new(chunk_size: usize) -> Self {
        ScanEngine {
            chunk_size: chunk_size.max(1),
            cancel: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicBool::new(false)),
            results: Arc::new(Mutex::new(Vec::new())),
            worker: Mutex::new(None),
        }
    }

    /// Whether a worker is currently scanning
    pub fn is_scanning(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Snapshot of the most recent scan's addresses, ascending and unique
    pub fn results(&self) -> Vec<Address> {
        self.results.lock().unwrap().clone()
    }

    /// Number of addresses in the current result set
    pub fn result_count(&self) -> usize {
        self.results.lock().unwrap().len()
    }

    /// Discards the current result set
    pub fn reset(&self) {
        self.results.lock().unwrap().clear();
    }

    /// Requests cancellation; may be called from any thread. The running
    /// scan stops at the next boundary and keeps its partial results.
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Starts a full address-space scan for `value_text` interpreted as
    /// `value_type`. Returns the event stream immediately; the scan runs
    /// on a dedicated worker.
    pub fn start_first_scan(
        &self,
        handle: Arc<ProcessHandle>,
        value_text: &str,
        value_type: ValueType,
    ) -> Result<Receiver<ScanEvent>, ScanError> {
        let value = ScanValue::parse(value_text, value_type)?;
        let chunk_size = self.chunk_size;
        self.spawn(move |ctx| first_scan_worker(&handle, value, chunk_size, &ctx))
    }

    /// Starts a narrowing scan over the previous results. Fails with
    /// [`ScanError::EmptyScan`] when there is nothing to narrow.
    pub fn start_next_scan(
        &self,
        handle: Arc<ProcessHandle>,
        value_text: &str,
        value_type: ValueType,
    ) -> Result<Receiver<ScanEvent>, ScanError> {
        let previous = self.results();
        if previous.is_empty() {
            return Err(ScanError::EmptyScan);
        }
        let value = ScanValue::parse(value_text, value_type)?;
        self.spawn(move |ctx| next_scan_worker(&handle, value, previous, &ctx))
    }

    /// Waits for the running worker, if any, and returns the result set
    pub fn join(&self) -> Result<Vec<Address>, ScanError> {
        let worker = self.worker.lock().unwrap().take();
        if let Some(worker) = worker {
            match worker.join() {
                Ok(outcome) => outcome?,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        Ok(self.results())
    }

    /// Cancels any running scan and waits for the worker to finish
    pub fn stop_and_join(&self) -> Result<Vec<Address>, ScanError> {
        self.stop();
        self.join()
    }

    fn spawn<F>(&self, job: F) -> Result<Receiver<ScanEvent>, ScanError>
    where
        F: FnOnce(WorkerContext) -> Result<(), ScanError> + Send + 'static,
    {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ScanError::ScanInProgress)?;
        self.cancel.store(false, Ordering::Release);

        let (events, receiver) = channel();
        let ctx = WorkerContext {
            cancel: Arc::clone(&self.cancel),
            results: Arc::clone(&self.results),
            events,
            _active: ActiveGuard(Arc::clone(&self.active)),
        };

        let worker = thread::Builder::new()
            .name("memedit-scan".to_string())
            .spawn(move || job(ctx))
            .expect("failed to spawn scan worker");

        // A finished worker that was never joined is replaced here
        *self.worker.lock().unwrap() = Some(worker);
        Ok(receiver)
    }
}

/// Everything a worker needs, moved onto its thread
struct WorkerContext {
    cancel: Arc<AtomicBool>,
    results: Arc<Mutex<Vec<Address>>>,
    events: Sender<ScanEvent>,
    _active: ActiveGuard,
}

impl WorkerContext {
    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    fn store(&self, addresses: Vec<Address>) {
        *self.results.lock().unwrap() = addresses;
    }

    fn progress(&self, percent: u8, matches: usize) {
        // The receiver may be gone; the scan finishes regardless
        let _ = self
            .events
            .send(ScanEvent::Progress(ScanProgress { percent, matches }));
    }

    fn finished(&self, matches: usize, cancelled: bool) {
        let _ = self.events.send(ScanEvent::Finished { matches, cancelled });
    }
}

fn first_scan_worker(
    handle: &ProcessHandle,
    value: ScanValue,
    chunk_size: usize,
    ctx: &WorkerContext,
) -> Result<(), ScanError> {
    let pattern = value.to_bytes();
    let stride = pattern.len();
    let chunk = aligned_chunk(chunk_size, stride);

    let regions: Vec<_> = readable_regions(handle).collect();
    let total_bytes: usize = regions.iter().map(|r| r.size).sum();

    let mut found: Vec<Address> = Vec::new();
    let mut scanned_bytes = 0usize;
    let mut cancelled = false;

    for region in &regions {
        if ctx.cancelled() {
            cancelled = true;
            break;
        }

        let mut offset = 0usize;
        while offset < region.size {
            let length = chunk.min(region.size - offset);
            if length < stride {
                break;
            }
            let base = region.base.add(offset);
            match handle.read_bytes(base, length) {
                Ok(data) => {
                    for hit in scan_chunk(&data, &pattern, stride) {
                        found.push(base.add(hit));
                    }
                }
                Err(err) => {
                    if !handle.is_alive() {
                        ctx.store(found);
                        return Err(ScanError::ProcessGone);
                    }
                    // Regions can legitimately vanish mid-scan; skip the rest
                    debug!(%base, %err, "skipping unreadable region");
                    break;
                }
            }
            offset += length;
        }

        scanned_bytes += region.size;
        let percent = if total_bytes == 0 {
            100
        } else {
            ((scanned_bytes as u128 * 100) / total_bytes as u128) as u8
        };
        ctx.progress(percent, found.len());
    }

    let matches = found.len();
    ctx.store(found);
    ctx.finished(matches, cancelled);
    Ok(())
}

fn next_scan_worker(
    handle: &ProcessHandle,
    value: ScanValue,
    previous: Vec<Address>,
    ctx: &WorkerContext,
) -> Result<(), ScanError> {
    let value_type = value.value_type();
    let width = value_type.width();
    let total = previous.len();

    let mut kept: Vec<Address> = Vec::new();
    let mut cancelled = false;

    for (index, address) in previous.iter().enumerate() {
        if index % NARROW_BATCH == 0 {
            if ctx.cancelled() {
                cancelled = true;
                break;
            }
            if index > 0 {
                let percent = ((index as u128 * 100) / total as u128) as u8;
                ctx.progress(percent, kept.len());
            }
        }

        match handle.read_bytes(*address, width) {
            Ok(bytes) => {
                if let Some(current) = ScanValue::from_bytes(&bytes, value_type) {
                    if current.matches(value) {
                        kept.push(*address);
                    }
                }
            }
            Err(err) => {
                if !handle.is_alive() {
                    ctx.store(kept);
                    return Err(ScanError::ProcessGone);
                }
                debug!(%address, %err, "skipping unreadable address");
            }
        }
    }

    let matches = kept.len();
    ctx.store(kept);
    ctx.finished(matches, cancelled);
    Ok(())
}

/// Largest multiple of `stride` no bigger than `chunk_size`, at least one
/// stride. Width-strided matches then never straddle a chunk boundary.
fn aligned_chunk(chunk_size: usize, stride: usize) -> usize {
    let chunk = chunk_size.max(stride);
    chunk - chunk % stride
}

/// Finds every `stride`-aligned offset in `data` where `pattern` occurs.
/// Pure; also exercised by the benches.
pub fn scan_chunk(data: &[u8], pattern: &[u8], stride: usize) -> Vec<usize> {
    let mut hits = Vec::new();
    if pattern.is_empty() || stride == 0 || data.len() < pattern.len() {
        return hits;
    }
    let mut offset = 0;
    let last = data.len() - pattern.len();
    while offset <= last {
        if &data[offset..offset + pattern.len()] == pattern {
            hits.push(offset);
        }
        offset += stride;
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_alignment() {
        assert_eq!(aligned_chunk(65536, 4), 65536);
        assert_eq!(aligned_chunk(65537, 4), 65536);
        assert_eq!(aligned_chunk(10, 8), 8);
        assert_eq!(aligned_chunk(2, 8), 8);
    }

    #[test]
    fn scan_chunk_finds_aligned_hits() {
        let mut data = vec![0u8; 64];
        data[8..12].copy_from_slice(&100i32.to_le_bytes());
        data[40..44].copy_from_slice(&100i32.to_le_bytes());
        let pattern = 100i32.to_le_bytes();
        assert_eq!(scan_chunk(&data, &pattern, 4), vec![8, 40]);
    }

    #[test]
    fn scan_chunk_ignores_misaligned_occurrences() {
        let mut data = vec![0u8; 32];
        // Place the pattern off the 4-byte grid
        data[5..9].copy_from_slice(&100i32.to_le_bytes());
        let pattern = 100i32.to_le_bytes();
        assert!(scan_chunk(&data, &pattern, 4).is_empty());
    }

    #[test]
    fn scan_chunk_matches_at_final_position() {
        let mut data = vec![0u8; 16];
        data[12..16].copy_from_slice(&7i32.to_le_bytes());
        let pattern = 7i32.to_le_bytes();
        assert_eq!(scan_chunk(&data, &pattern, 4), vec![12]);
    }

    #[test]
    fn scan_chunk_degenerate_inputs() {
        assert!(scan_chunk(&[], &[1], 1).is_empty());
        assert!(scan_chunk(&[1, 2, 3], &[], 1).is_empty());
        assert!(scan_chunk(&[1, 2], &[1, 2, 3], 1).is_empty());
        assert!(scan_chunk(&[1, 2], &[1], 0).is_empty());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn parse_failure_precedes_any_worker() {
        let engine = ScanEngine::default();
        let handle =
            Arc::new(ProcessHandle::attach(std::process::id()).expect("attach self"));
        let err = engine
            .start_first_scan(handle, "not-a-number", ValueType::Int32)
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidValueFormat(_)));
        assert!(!engine.is_scanning());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn next_scan_without_results_is_empty_scan() {
        let engine = ScanEngine::default();
        let handle =
            Arc::new(ProcessHandle::attach(std::process::id()).expect("attach self"));
        let err = engine
            .start_next_scan(handle, "1", ValueType::Int32)
            .unwrap_err();
        assert!(matches!(err, ScanError::EmptyScan));
    }
}
