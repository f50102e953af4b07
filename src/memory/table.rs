//! User-curated table of watched addresses
//!
//! Entries are promoted from scan results and carry the last value seen at
//! their address. The table is session-scoped: nothing is persisted, and
//! detaching clears it.

use crate::core::types::{Address, EngineError, ReadError, ScanValue, ValueType, WriteError};
use crate::process::ProcessHandle;

/// Reads one typed value from the target
pub fn read_value(
    handle: &ProcessHandle,
    address: Address,
    value_type: ValueType,
) -> Result<ScanValue, ReadError> {
    let bytes = handle.read_bytes(address, value_type.width())?;
    ScanValue::from_bytes(&bytes, value_type).ok_or(ReadError::Incomplete {
        address,
        expected: value_type.width(),
        actual: bytes.len(),
    })
}

/// Writes one typed value to the target
pub fn write_value(
    handle: &ProcessHandle,
    address: Address,
    value: ScanValue,
) -> Result<(), WriteError> {
    handle.write_bytes(address, &value.to_bytes())
}

/// One watched address with its cached last-known value
#[derive(Debug, Clone)]
pub struct WatchedAddress {
    pub address: Address,
    pub value_type: ValueType,
    pub last_value: ScanValue,
}

impl WatchedAddress {
    /// Promotes an address into a watch entry, seeding the cached value
    /// with one read
    pub fn promote(
        handle: &ProcessHandle,
        address: Address,
        value_type: ValueType,
    ) -> Result<Self, ReadError> {
        let last_value = read_value(handle, address, value_type)?;
        Ok(WatchedAddress {
            address,
            value_type,
            last_value,
        })
    }

    /// Re-reads the address and updates the cached value
    pub fn refresh(&mut self, handle: &ProcessHandle) -> Result<ScanValue, ReadError> {
        self.last_value = read_value(handle, self.address, self.value_type)?;
        Ok(self.last_value)
    }

    /// Parses and writes a new value. On success the cache reflects the
    /// written value directly; re-reading here would race other writers
    /// and hide what the user just asked for.
    pub fn write(&mut self, handle: &ProcessHandle, value_text: &str) -> Result<(), EngineError> {
        let value = ScanValue::parse(value_text, self.value_type)?;
        write_value(handle, self.address, value)?;
        self.last_value = value;
        Ok(())
    }
}

/// Ordered collection of watch entries
#[derive(Debug, Default)]
pub struct AddressTable {
    entries: Vec<WatchedAddress>,
}

impl AddressTable {
    pub fn new() -> Self {
        AddressTable::default()
    }

    /// Promotes an address and appends it; returns the new entry's index
    pub fn promote(
        &mut self,
        handle: &ProcessHandle,
        address: Address,
        value_type: ValueType,
    ) -> Result<usize, ReadError> {
        let entry = WatchedAddress::promote(handle, address, value_type)?;
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    pub fn entry(&self, index: usize) -> Option<&WatchedAddress> {
        self.entries.get(index)
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut WatchedAddress> {
        self.entries.get_mut(index)
    }

    /// Removes and returns an entry; later entries shift down
    pub fn remove(&mut self, index: usize) -> Option<WatchedAddress> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchedAddress> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Refreshes every entry, returning how many reads succeeded.
    /// Entries whose addresses became unreadable keep their stale value.
    pub fn refresh_all(&mut self, handle: &ProcessHandle) -> usize {
        self.entries
            .iter_mut()
            .map(|entry| entry.refresh(handle).is_ok())
            .filter(|ok| *ok)
            .count()
    }
}
