//! Default configuration values

use crate::inject::DEFAULT_WAIT_TIMEOUT;
use crate::memory::DEFAULT_CHUNK_SIZE;

pub fn chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

pub fn wait_timeout_ms() -> u64 {
    DEFAULT_WAIT_TIMEOUT.as_millis() as u64
}

pub fn log_level() -> String {
    "info".to_string()
}
