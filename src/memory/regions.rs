//! Virtual address space walking for a target process
//!
//! Regions are discovered by querying the OS from the bottom of the address
//! space upward, advancing by each region's reported size. The walk is the
//! only source of scan targets; nothing in the engine assumes fixed address
//! ranges.

use crate::core::types::{Address, MemoryRegion};
use crate::process::ProcessHandle;

/// Highest user-mode address on x64 Windows
pub const MAX_USER_ADDRESS: usize = 0x7FFF_FFFF_FFFF;

const PAGE_SIZE: usize = 4096;

/// Walks the target's regions from the lowest address upward.
///
/// Each instance is a fresh walk; construct a new one to restart.
pub struct RegionEnumerator<'a> {
    handle: &'a ProcessHandle,
    cursor: Address,
}

impl<'a> RegionEnumerator<'a> {
    pub fn new(handle: &'a ProcessHandle) -> Self {
        RegionEnumerator {
            handle,
            cursor: Address::null(),
        }
    }
}

impl Iterator for RegionEnumerator<'_> {
    type Item = MemoryRegion;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.as_usize() >= MAX_USER_ADDRESS {
            return None;
        }

        // A failed query past the last region means the walk is done
        let region = self.handle.query_region(self.cursor)?;

        let next = region.end();
        self.cursor = if next > self.cursor {
            next
        } else {
            // Defend against a zero-sized answer so the walk always advances
            self.cursor.add(PAGE_SIZE)
        };

        Some(region)
    }
}

/// Committed regions the target will let us read; guard pages excluded
pub fn readable_regions<'a>(
    handle: &'a ProcessHandle,
) -> impl Iterator<Item = MemoryRegion> + 'a {
    RegionEnumerator::new(handle).filter(MemoryRegion::is_readable)
}

/// Committed regions that accept writes
pub fn writable_regions<'a>(
    handle: &'a ProcessHandle,
) -> impl Iterator<Item = MemoryRegion> + 'a {
    RegionEnumerator::new(handle).filter(MemoryRegion::is_writable)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn own_handle() -> ProcessHandle {
        ProcessHandle::attach(std::process::id()).expect("attach self")
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn walk_yields_ascending_disjoint_regions() {
        let handle = own_handle();
        let mut last_end = Address::null();
        for region in RegionEnumerator::new(&handle).take(64) {
            assert!(region.base >= last_end);
            assert!(region.size > 0);
            last_end = region.end();
        }
        assert!(!last_end.is_null(), "walk found no regions");
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn walk_is_restartable() {
        let handle = own_handle();
        let first: Vec<_> = RegionEnumerator::new(&handle)
            .take(16)
            .map(|r| r.base)
            .collect();
        let second: Vec<_> = RegionEnumerator::new(&handle)
            .take(16)
            .map(|r| r.base)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn readable_regions_are_committed() {
        let handle = own_handle();
        for region in readable_regions(&handle).take(64) {
            assert!(region.is_committed());
            assert!(!region.is_guarded());
        }
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn own_stack_is_discovered_as_writable() {
        let handle = own_handle();
        let on_stack = 0u8;
        let probe = Address::from(&on_stack as *const u8);
        let found = writable_regions(&handle).any(|r| r.contains(probe));
        assert!(found);
    }
}
