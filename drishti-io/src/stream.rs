//! Reference-counted stream requests.
//!
//! Hardware streams are enabled lazily: the first consumer to ask for a
//! stream fires the start hook, the last one to let go fires the stop
//! hook. The count lives inside the sensor collaborator, not inside the
//! mapping core, so the engine never has to know who is listening.

use parking_lot::Mutex;
use std::sync::Arc;

type Hook = Box<dyn FnMut() + Send>;

struct StreamStateInner {
    count: usize,
    on_start: Option<Hook>,
    on_stop: Option<Hook>,
}

/// Reference count for one hardware stream (depth, color, ...).
#[derive(Clone)]
pub struct StreamRequests {
    inner: Arc<Mutex<StreamStateInner>>,
}

impl StreamRequests {
    /// Create a counter with no hooks.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StreamStateInner {
                count: 0,
                on_start: None,
                on_stop: None,
            })),
        }
    }

    /// Create a counter with start/stop hooks.
    ///
    /// `on_start` runs on the 0 -> 1 transition, `on_stop` on 1 -> 0.
    pub fn with_hooks(
        on_start: impl FnMut() + Send + 'static,
        on_stop: impl FnMut() + Send + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StreamStateInner {
                count: 0,
                on_start: Some(Box::new(on_start)),
                on_stop: Some(Box::new(on_stop)),
            })),
        }
    }

    /// Request the stream; it stays active while the guard lives.
    pub fn acquire(&self) -> StreamGuard {
        let mut inner = self.inner.lock();
        inner.count += 1;
        if inner.count == 1 {
            log::debug!("StreamRequests: first consumer, starting stream");
            if let Some(hook) = inner.on_start.as_mut() {
                hook();
            }
        }
        StreamGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// True while at least one consumer holds a guard.
    pub fn active(&self) -> bool {
        self.inner.lock().count > 0
    }

    /// Number of live consumers.
    pub fn count(&self) -> usize {
        self.inner.lock().count
    }
}

impl Default for StreamRequests {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII stream request; dropping it releases the stream.
pub struct StreamGuard {
    inner: Arc<Mutex<StreamStateInner>>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        inner.count -= 1;
        if inner.count == 0 {
            log::debug!("StreamRequests: last consumer gone, stopping stream");
            if let Some(hook) = inner.on_stop.as_mut() {
                hook();
            }
        }
    }
}
