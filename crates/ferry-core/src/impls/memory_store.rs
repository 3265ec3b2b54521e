//! MemoryQueueStore - keeps the queue in process memory.

use std::sync::Mutex;

use crate::error::FerryError;
use crate::queue::{Queue, QueueStore};

/// In-memory `QueueStore`. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryQueueStore {
    queue: Mutex<Queue>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue(queue: Queue) -> Self {
        Self {
            queue: Mutex::new(queue),
        }
    }

    /// Copy of the last saved queue.
    pub fn snapshot(&self) -> Queue {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl QueueStore for MemoryQueueStore {
    fn load(&self) -> Result<Queue, FerryError> {
        Ok(self.snapshot())
    }

    fn save(&self, queue: &Queue) -> Result<(), FerryError> {
        *self.queue.lock().unwrap_or_else(|e| e.into_inner()) = queue.clone();
        Ok(())
    }
}
