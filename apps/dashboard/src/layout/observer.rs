//! Layout-change observation.
//!
//! The host environment (whatever actually lays the hidden measurement copy
//! out) calls [`LayoutMonitor::report`] whenever the watched element's height
//! changes. Subscribers receive a [`HeightChange`] carrying a sequence number
//! so they can discard notifications that arrive out of order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightChange {
    /// `None` when the element is not mounted or cannot be measured yet.
    pub height_px: Option<f64>,
    pub sequence: u64,
}

pub type HeightHandler = Arc<dyn Fn(HeightChange) + Send + Sync>;

#[derive(Clone, Default)]
pub struct LayoutMonitor {
    inner: Arc<MonitorInner>,
}

#[derive(Default)]
struct MonitorInner {
    handlers: Mutex<BTreeMap<u64, HeightHandler>>,
    next_id: AtomicU64,
    sequence: AtomicU64,
    last_height: Mutex<Option<Option<f64>>>,
}

impl LayoutMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler`. It stays registered until the returned
    /// [`Subscription`] is dropped.
    ///
    /// If a height was already reported, `handler` receives it immediately so
    /// a late subscriber starts from the current layout.
    pub fn subscribe(&self, handler: HeightHandler) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.handlers.lock().insert(id, Arc::clone(&handler));

        let replay = {
            let last = self.inner.last_height.lock();
            (*last).map(|height_px| HeightChange {
                height_px,
                sequence: self.inner.sequence.load(Ordering::SeqCst),
            })
        };
        if let Some(change) = replay {
            trace!(?change, "Replaying last height to new subscriber");
            handler(change);
        }

        Subscription {
            id,
            monitor: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.handlers.lock().len()
    }

    /// Publishes a height observation. Repeats of the last reported value are
    /// swallowed. Returns whether subscribers were notified.
    pub fn report(&self, height_px: Option<f64>) -> bool {
        {
            let mut last = self.inner.last_height.lock();
            if *last == Some(height_px) {
                return false;
            }
            *last = Some(height_px);
        }

        let change = HeightChange {
            height_px,
            sequence: self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1,
        };
        trace!(?change, "Layout height changed");

        // Handlers run outside the lock so they may subscribe or drop subscriptions.
        let handlers: Vec<HeightHandler> = self.inner.handlers.lock().values().cloned().collect();
        for handler in handlers {
            handler(change);
        }
        true
    }
}

/// Registration handle; unsubscribes on drop.
pub struct Subscription {
    id: u64,
    monitor: Weak<MonitorInner>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.monitor.upgrade() {
            inner.handlers.lock().remove(&self.id);
        }
    }
}
