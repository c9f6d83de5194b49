//! Swap-the-reference cells for sharing solver output across threads.
//!
//! A [`SwapCell`] holds an `Arc<T>` behind a mutex. Writers build a
//! complete new value and replace the reference; readers clone the `Arc`
//! and keep reading it for as long as they like. The lock is held only
//! for the pointer swap, so a reader never sees a half-written array.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use riskfield_pde::CoefficientFields;

use crate::snapshot::RiskSnapshot;

/// Latest published risk snapshot.
pub type SharedSnapshot = SwapCell<RiskSnapshot>;

/// Coefficient fields currently in use by the solver.
pub type SharedCoefficients = SwapCell<CoefficientFields>;

/// Single-writer, multi-reader holder of an immutable value.
#[derive(Debug)]
pub struct SwapCell<T> {
    slot: Mutex<Arc<T>>,
    version: AtomicU64,
}

// Compile-time assertion: cells can be shared across threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SharedSnapshot>();
    assert::<SharedCoefficients>();
};

impl<T> SwapCell<T> {
    /// Cell holding `value` at version 0.
    pub fn new(value: Arc<T>) -> Self {
        Self {
            slot: Mutex::new(value),
            version: AtomicU64::new(0),
        }
    }

    /// Replace the held value, returning the previous one.
    pub fn store(&self, value: Arc<T>) -> Arc<T> {
        let prev = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *slot, value)
        };
        // Release pairs with the Acquire in `version` so a reader that
        // sees the new version also sees the new value.
        self.version.fetch_add(1, Ordering::Release);
        prev
    }

    /// Current value.
    pub fn load(&self) -> Arc<T> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&slot)
    }

    /// Number of stores so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}
