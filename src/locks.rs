use crate::domain::order::OrderId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = Arc<Mutex<HashMap<OrderId, Arc<AsyncMutex<()>>>>>;

/// Per-order async locks, created on first use and dropped again once no
/// holder or waiter is left.
#[derive(Default, Clone)]
pub struct OrderLocks {
    locks: LockMap,
}

/// Holds one order's lock until dropped.
pub struct OrderLockGuard {
    order_id: OrderId,
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockMap,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, order_id: OrderId) -> OrderLockGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(order_id).or_default().clone()
        };
        OrderLockGuard {
            order_id,
            guard: Some(lock.lock_owned().await),
            locks: self.locks.clone(),
        }
    }

    /// Number of orders that currently have a lock entry.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for OrderLockGuard {
    fn drop(&mut self) {
        // Waiters clone the entry under the map lock, so a count of one
        // here means nobody else can still reach it.
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        self.guard.take();
        if let Some(lock) = locks.get(&self.order_id)
            && Arc::strong_count(lock) == 1
        {
            locks.remove(&self.order_id);
        }
    }
}
