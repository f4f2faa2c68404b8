//! Listener contract and registry
//!
//! Consumers register a [`TuioListener`] to receive lifecycle events.
//! Callbacks run synchronously on the decode thread, in registration
//! order, and must not block or re-enter the decoder. Registration itself
//! is safe from any thread and never fires events.

use std::sync::Arc;

use parking_lot::Mutex;
use tacto_core::{TuioCursor, TuioObject, TuioTime};

/// Callback set for TUIO lifecycle events
///
/// All methods default to no-ops so implementors only override what they
/// consume.
pub trait TuioListener: Send + Sync {
    /// A new object entered the surface
    fn add_tuio_object(&self, _object: &TuioObject) {}

    /// An active object moved or rotated
    fn update_tuio_object(&self, _object: &TuioObject) {}

    /// An object left the surface
    fn remove_tuio_object(&self, _object: &TuioObject) {}

    /// A new cursor touched down
    fn add_tuio_cursor(&self, _cursor: &TuioCursor) {}

    /// An active cursor moved
    fn update_tuio_cursor(&self, _cursor: &TuioCursor) {}

    /// A cursor lifted off
    fn remove_tuio_cursor(&self, _cursor: &TuioCursor) {}

    /// A frame was committed at the given session time
    fn refresh(&self, _time: TuioTime) {}
}

/// Ordered listener registry
///
/// Delivery order among listeners is registration order.
#[derive(Default)]
pub struct Listeners {
    inner: Mutex<Vec<Arc<dyn TuioListener>>>,
}

impl Listeners {
    pub fn new() -> Self {
        Listeners {
            inner: Mutex::new(Vec::new()),
        }
    }

    pub fn add(&self, listener: Arc<dyn TuioListener>) {
        self.inner.lock().push(listener);
    }

    /// Remove a previously registered listener (pointer identity)
    pub fn remove(&self, listener: &Arc<dyn TuioListener>) {
        self.inner.lock().retain(|l| !Arc::ptr_eq(l, listener));
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Snapshot the current registration list for dispatch outside the lock
    pub fn snapshot(&self) -> Vec<Arc<dyn TuioListener>> {
        self.inner.lock().clone()
    }
}
