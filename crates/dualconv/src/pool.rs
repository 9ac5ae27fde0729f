//! Reuse of reader and writer instances.
//!
//! A pool hands out instances made by its factory and takes them back after
//! [`Recycle::recycle`] has cut them loose from the data they last touched.
//! Instances bound to chunk lists or streams report that they cannot be
//! reused and are dropped on release, as is anything released into a pool
//! that already holds `max_idle` instances.

use std::{
    fmt,
    ops::{Deref, DerefMut},
};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{options::PoolOptions, store::Recycle};

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// A bounded stack of idle instances, safe to share between threads.
pub struct Pool<T> {
    idle: Mutex<Vec<T>>,
    factory: Factory<T>,
    max_idle: usize,
}

impl<T: Recycle> Pool<T> {
    pub fn new(factory: impl Fn() -> T + Send + Sync + 'static, options: PoolOptions) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            factory: Box::new(factory),
            max_idle: options.max_idle,
        }
    }

    /// An idle instance, or a fresh one when none is left. The instance
    /// goes back to the pool when the guard drops.
    pub fn acquire(&self) -> Pooled<'_, T> {
        // The lock is released before the factory runs.
        let reused = self.idle.lock().pop();
        let item = reused.unwrap_or_else(|| {
            trace!("pool empty, creating a new instance");
            (self.factory)()
        });
        Pooled {
            pool: self,
            item: Some(item),
        }
    }

    /// Recycles `item` and keeps it for the next [`Pool::acquire`].
    ///
    /// Returns whether the instance was kept.
    pub fn release(&self, mut item: T) -> bool {
        if !item.recycle() {
            trace!("dropping instance bound to external storage");
            return false;
        }
        let mut idle = self.idle.lock();
        if idle.len() >= self.max_idle {
            debug!(max_idle = self.max_idle, "pool full, dropping instance");
            return false;
        }
        idle.push(item);
        true
    }

    /// Runs `f` with a pooled instance and releases it afterwards.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut item = self.acquire();
        f(&mut item)
    }

    /// Instances currently waiting to be reused.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }
}

/// An instance on loan from a [`Pool`].
pub struct Pooled<'p, T: Recycle> {
    pool: &'p Pool<T>,
    item: Option<T>,
}

impl<T: Recycle> Pooled<'_, T> {
    /// Takes the instance out of the pool's custody for good.
    #[must_use]
    pub fn detach(mut self) -> T {
        match self.item.take() {
            Some(item) => item,
            None => unreachable!("pooled instance taken twice"),
        }
    }
}

impl<T: Recycle> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.item {
            Some(item) => item,
            None => unreachable!("pooled instance already returned"),
        }
    }
}

impl<T: Recycle> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.item {
            Some(item) => item,
            None => unreachable!("pooled instance already returned"),
        }
    }
}

impl<T: Recycle> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.release(item);
        }
    }
}

impl<T: Recycle + fmt::Debug> fmt::Debug for Pooled<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pooled").field(&self.item).finish()
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("idle", &self.idle.lock().len())
            .field("max_idle", &self.max_idle)
            .finish_non_exhaustive()
    }
}
