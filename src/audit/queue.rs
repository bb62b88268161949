use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::audit::record::AuditRecord;

/// Unbounded FIFO of records waiting to be persisted.
///
/// Any number of sessions push; exactly one drain worker pops.
#[derive(Debug, Default)]
pub struct AuditQueue {
    records: Mutex<VecDeque<AuditRecord>>,
    ready: Notify,
}

impl AuditQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record and wakes the drain worker.
    pub fn push(&self, record: AuditRecord) {
        self.lock().push_back(record);
        self.ready.notify_one();
    }

    /// Removes the oldest record, or `None` when the queue is empty.
    pub fn pop_oldest(&self) -> Option<AuditRecord> {
        self.lock().pop_front()
    }

    /// Waits until a record is available and removes it.
    ///
    /// Meant for the single consumer; a wake-up that races a push is kept
    /// as a stored permit, so nothing is missed.
    pub async fn next(&self) -> AuditRecord {
        loop {
            if let Some(record) = self.pop_oldest() {
                return record;
            }
            self.ready.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the deque half-updated.
    fn lock(&self) -> MutexGuard<'_, VecDeque<AuditRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
