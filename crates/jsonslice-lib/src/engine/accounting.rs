//! Batched native-memory notifications for the host.
//!
//! Producers on any thread add signed byte deltas to one pending counter.
//! The scheduler reads and resets it once per drain and reports the sum
//! through an [`AccountingHook`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Receives the net change in retained native memory.
pub trait AccountingHook {
    fn report_delta(&mut self, bytes: i64);
}

impl<F: FnMut(i64)> AccountingHook for F {
    fn report_delta(&mut self, bytes: i64) {
        self(bytes)
    }
}

/// Pending byte delta shared between producers and the scheduler.
#[derive(Debug, Default)]
pub struct MemoryAccounting {
    pending: Mutex<i64>,
}

impl MemoryAccounting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adjust(&self, bytes: i64) {
        let mut pending = self.lock();
        *pending = pending.saturating_add(bytes);
    }

    /// Read and reset the pending delta.
    pub fn take(&self) -> i64 {
        std::mem::take(&mut *self.lock())
    }

    pub fn peek(&self) -> i64 {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, i64> {
        // A panicking producer cannot leave the counter half-written.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Accounts `+bytes` while alive and `-bytes` when dropped.
#[derive(Debug)]
pub struct Retention {
    accounting: Arc<MemoryAccounting>,
    bytes: i64,
}

impl Retention {
    pub fn retain(accounting: &Arc<MemoryAccounting>, bytes: usize) -> Self {
        let retention = Self::adopt(accounting, bytes);
        accounting.adjust(retention.bytes);
        retention
    }

    /// Take over bytes a producer already reported.
    pub fn adopt(accounting: &Arc<MemoryAccounting>, bytes: usize) -> Self {
        Self {
            accounting: Arc::clone(accounting),
            bytes: i64::try_from(bytes).unwrap_or(i64::MAX),
        }
    }

    pub fn bytes(&self) -> i64 {
        self.bytes
    }
}

impl Drop for Retention {
    fn drop(&mut self) {
        self.accounting.adjust(-self.bytes);
    }
}
