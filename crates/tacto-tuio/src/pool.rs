//! Cursor handle pooling
//!
//! Cursors get a small non-negative integer handle independent of their
//! session ID so that consumers mapping handles to external resources
//! (touch slots, pointer IDs) see dense, low-churn values. Freed handles
//! below the high-water mark are recycled to the spatially closest new
//! cursor; the mark itself shrinks when its holder lifts off.

use tacto_core::TuioPoint;

/// A reclaimed handle and the position its cursor was last seen at
#[derive(Clone, Copy, Debug)]
struct FreeHandle {
    id: i32,
    last: TuioPoint,
}

/// Dense small-integer handle pool
///
/// INVARIANT: every free handle is strictly below the high-water mark,
/// and the mark is -1 exactly when no cursor is active.
#[derive(Debug)]
pub struct CursorIdPool {
    max_cursor_id: i32,
    free: Vec<FreeHandle>,
}

impl Default for CursorIdPool {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorIdPool {
    pub fn new() -> Self {
        CursorIdPool {
            max_cursor_id: -1,
            free: Vec::new(),
        }
    }

    /// Handle for a new cursor at the given position.
    ///
    /// Recycles the free handle closest to the touch-down point while the
    /// active count sits below the high-water mark; otherwise mints the
    /// next dense handle and raises the mark.
    pub fn acquire(&mut self, active_count: usize, at: TuioPoint) -> i32 {
        if (active_count as i32) <= self.max_cursor_id && !self.free.is_empty() {
            let mut closest = 0;
            for i in 1..self.free.len() {
                if self.free[i].last.distance_to(&at) < self.free[closest].last.distance_to(&at) {
                    closest = i;
                }
            }
            self.free.remove(closest).id
        } else {
            let id = active_count as i32;
            self.max_cursor_id = id;
            id
        }
    }

    /// Return a handle whose cursor was removed. `remaining` yields the
    /// handles still active after the removal.
    pub fn release(
        &mut self,
        id: i32,
        last: TuioPoint,
        remaining: impl Iterator<Item = i32>,
    ) {
        if id == self.max_cursor_id {
            self.max_cursor_id = -1;
            let mut any_active = false;
            for handle in remaining {
                any_active = true;
                if handle > self.max_cursor_id {
                    self.max_cursor_id = handle;
                }
            }
            if any_active {
                let max = self.max_cursor_id;
                self.free.retain(|h| h.id < max);
            } else {
                self.free.clear();
            }
        } else if id < self.max_cursor_id {
            self.free.push(FreeHandle { id, last });
        }
    }

    /// Largest handle ever concurrently in use, -1 when no cursor is active
    #[inline]
    pub fn max_cursor_id(&self) -> i32 {
        self.max_cursor_id
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Drop all pool state
    pub fn reset(&mut self) {
        self.max_cursor_id = -1;
        self.free.clear();
    }
}
