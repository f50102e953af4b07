//! Read-only diagnostics for the current process
//!
//! Everything here queries the hosting process itself: identity, resource
//! usage, a memory-map summary, threads, the parent/child tree and loaded
//! modules. No engine state is involved and nothing is mutated.

use crate::core::types::{InspectError, ModuleInfo, ProcessId, RegionKind, ThreadId};
use crate::memory::regions::RegionEnumerator;
use crate::process::{modules, ProcessHandle};
use crate::windows::bindings::{psapi, toolhelp};
use serde::Serialize;
use std::path::PathBuf;

/// Identity of the inspected process
#[derive(Debug, Clone, Serialize)]
pub struct SelfIdentity {
    pub pid: ProcessId,
    pub name: String,
    pub executable: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

/// Memory and thread usage of the inspected process
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResourceUsage {
    pub working_set_bytes: u64,
    pub peak_working_set_bytes: u64,
    pub pagefile_bytes: u64,
    pub thread_count: u32,
}

/// Aggregated view of the process's committed address space
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MemorySummary {
    pub region_count: usize,
    pub committed_bytes: u64,
    pub image_bytes: u64,
    pub mapped_bytes: u64,
    pub private_bytes: u64,
}

/// One thread of the inspected process
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThreadInfo {
    pub tid: ThreadId,
    pub base_priority: i32,
}

/// A node in the process tree
#[derive(Debug, Clone, Serialize)]
pub struct ProcessNode {
    pub pid: ProcessId,
    pub name: String,
}

/// Parent and descendants of the inspected process
#[derive(Debug, Clone, Serialize)]
pub struct ProcessTree {
    pub current: ProcessNode,
    pub parent: Option<ProcessNode>,
    pub children: Vec<ProcessNode>,
}

/// Read-only inspector bound to the current process
pub struct SelfInspector {
    handle: ProcessHandle,
    pid: ProcessId,
}

impl SelfInspector {
    pub fn new() -> Result<Self, InspectError> {
        let pid = std::process::id();
        let handle = ProcessHandle::attach(pid)
            .map_err(|e| InspectError::Query(format!("opening own process: {e}")))?;
        Ok(SelfInspector { handle, pid })
    }

    pub fn identity(&self) -> SelfIdentity {
        let executable = std::env::current_exe().ok();
        let name = executable
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("pid-{}", self.pid));
        SelfIdentity {
            pid: self.pid,
            name,
            executable,
            working_dir: std::env::current_dir().ok(),
        }
    }

    pub fn resource_usage(&self) -> Result<ResourceUsage, InspectError> {
        let counters = unsafe { psapi::process_memory_counters(self.handle.raw()) }
            .map_err(|e| InspectError::Query(e.to_string()))?;
        let thread_count = self.threads()?.len() as u32;
        Ok(ResourceUsage {
            working_set_bytes: counters.WorkingSetSize as u64,
            peak_working_set_bytes: counters.PeakWorkingSetSize as u64,
            pagefile_bytes: counters.PagefileUsage as u64,
            thread_count,
        })
    }

    pub fn memory_summary(&self) -> MemorySummary {
        let mut summary = MemorySummary::default();
        for region in RegionEnumerator::new(&self.handle) {
            if !region.is_committed() {
                continue;
            }
            summary.region_count += 1;
            summary.committed_bytes += region.size as u64;
            match region.kind {
                RegionKind::Image => summary.image_bytes += region.size as u64,
                RegionKind::Mapped => summary.mapped_bytes += region.size as u64,
                RegionKind::Private => summary.private_bytes += region.size as u64,
            }
        }
        summary
    }

    pub fn threads(&self) -> Result<Vec<ThreadInfo>, InspectError> {
        let snapshot = toolhelp::ThreadSnapshot::take()
            .map_err(|e| InspectError::Query(e.to_string()))?;
        Ok(snapshot
            .filter(|t| t.owner_pid == self.pid)
            .map(|t| ThreadInfo {
                tid: t.tid,
                base_priority: t.base_priority,
            })
            .collect())
    }

    pub fn process_tree(&self) -> Result<ProcessTree, InspectError> {
        let entries: Vec<toolhelp::ProcessEntry> = toolhelp::ProcessSnapshot::take()
            .map_err(|e| InspectError::Query(e.to_string()))?
            .collect();

        let current = entries
            .iter()
            .find(|e| e.pid == self.pid)
            .map(|e| ProcessNode {
                pid: e.pid,
                name: e.name.clone(),
            })
            .ok_or_else(|| InspectError::Query("own process missing from snapshot".into()))?;

        let parent_pid = entries
            .iter()
            .find(|e| e.pid == self.pid)
            .map(|e| e.parent_pid);
        let parent = parent_pid.and_then(|ppid| {
            entries.iter().find(|e| e.pid == ppid).map(|e| ProcessNode {
                pid: e.pid,
                name: e.name.clone(),
            })
        });

        // Breadth-first walk picks up grandchildren too; the visited set
        // guards against parent-pid cycles from pid reuse
        let mut children = Vec::new();
        let mut visited = std::collections::HashSet::from([self.pid]);
        let mut frontier = vec![self.pid];
        while let Some(pid) = frontier.pop() {
            for entry in entries.iter().filter(|e| e.parent_pid == pid && e.pid != pid) {
                if !visited.insert(entry.pid) {
                    continue;
                }
                frontier.push(entry.pid);
                children.push(ProcessNode {
                    pid: entry.pid,
                    name: entry.name.clone(),
                });
            }
        }

        Ok(ProcessTree {
            current,
            parent,
            children,
        })
    }

    pub fn loaded_modules(&self) -> Result<Vec<ModuleInfo>, InspectError> {
        modules::enumerate(&self.handle).map_err(|e| InspectError::Query(e.to_string()))
    }
}
