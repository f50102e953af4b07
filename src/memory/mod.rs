//! Memory discovery, scanning and editing for an attached target

pub mod regions;
pub mod scanner;
pub mod table;

pub use regions::{readable_regions, writable_regions, RegionEnumerator, MAX_USER_ADDRESS};
pub use scanner::{ScanEngine, ScanEvent, ScanProgress, DEFAULT_CHUNK_SIZE};
pub use table::{read_value, write_value, AddressTable, WatchedAddress};
