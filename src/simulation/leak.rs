//! Deliberate, unbounded memory retention.
//!
//! Objects pushed into a `LeakStore` live until the process exits. There is
//! no removal API.

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// Size of each leaked buffer (1 MiB).
pub const LEAK_CHUNK_BYTES: usize = 1024 * 1024;

// Non-zero so every page is written and stays resident.
const FILL_BYTE: u8 = 0xA5;

/// One retained allocation.
pub struct LeakedObject {
    created_at: DateTime<Utc>,
    data: Box<[u8]>,
}

impl LeakedObject {
    fn new() -> Self {
        Self {
            created_at: Utc::now(),
            data: vec![FILL_BYTE; LEAK_CHUNK_BYTES].into_boxed_slice(),
        }
    }
}

impl fmt::Debug for LeakedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeakedObject")
            .field("created_at", &self.created_at)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Process-wide list of leaked objects.
#[derive(Debug, Default)]
pub struct LeakStore {
    objects: Mutex<Vec<LeakedObject>>,
}

impl LeakStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retain one more 1 MiB buffer. Returns the number of buffers now held.
    pub fn leak(&self) -> usize {
        // Allocate outside the lock.
        let object = LeakedObject::new();
        let mut objects = self.objects.lock().expect("leak store mutex poisoned");
        objects.push(object);
        objects.len()
    }

    pub fn count(&self) -> usize {
        self.objects.lock().expect("leak store mutex poisoned").len()
    }

    /// Total bytes held by leaked buffers.
    pub fn retained_bytes(&self) -> usize {
        self.objects
            .lock()
            .expect("leak store mutex poisoned")
            .iter()
            .map(|object| object.data.len())
            .sum()
    }
}
