//! Fixed-capacity, non-blocking admission gate for action dispatch.

use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub const DEFAULT_CONCURRENCY_LIMIT: usize = 128;

#[derive(Debug, Clone)]
/// Counting gate shared by every dispatch. Clones share the same pool.
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

#[derive(Debug)]
/// Outstanding gate token. Dropping it returns the token to the pool.
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            bail!("concurrency gate capacity must be greater than 0");
        }
        if capacity > Semaphore::MAX_PERMITS {
            bail!(
                "concurrency gate capacity {capacity} exceeds maximum {}",
                Semaphore::MAX_PERMITS
            );
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn outstanding(&self) -> usize {
        self.capacity
            .saturating_sub(self.semaphore.available_permits())
    }

    /// Takes a token without waiting; `None` when all `capacity` tokens are outstanding.
    pub fn try_acquire(&self) -> Option<GatePermit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| GatePermit { _permit: permit })
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(DEFAULT_CONCURRENCY_LIMIT)),
            capacity: DEFAULT_CONCURRENCY_LIMIT,
        }
    }
}
