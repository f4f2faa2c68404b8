//! Per-channel TUIO state machines
//!
//! Each addressed channel (2Dobj, 2Dcur) independently tracks its active
//! entities, the previously committed alive set, a staged buffer of
//! add/update/remove entries, and a frame gate. `set` and `alive` only
//! stage; nothing becomes visible until `fseq` commits the frame.
//!
//! Commit processing emits events in the guaranteed order: removals, then
//! adds, then updates (arrival order within each kind), then exactly one
//! refresh carrying the commit time.

use std::collections::HashMap;
use std::mem;

use tacto_core::{TuioCursor, TuioObject, TuioPoint, TuioTime};

use crate::CursorIdPool;

/// Frames older than the current counter by more than this are treated as
/// a new source epoch rather than late deliveries.
const FRAME_RESYNC_GAP: i32 = 100;

/// Session-time advance threshold for untagged (fseq <= 0) frames, ms.
const UNTAGGED_REFRESH_MS: i64 = 100;

/// Frame-sequence gate: decides whether a commit is current or stale and
/// owns the channel's commit time.
#[derive(Debug)]
pub(crate) struct FrameGate {
    current_frame: i32,
    current_time: TuioTime,
}

impl FrameGate {
    fn new() -> Self {
        FrameGate {
            current_frame: 0,
            current_time: TuioTime::ZERO,
        }
    }

    /// Admit a frame, returning its commit time, or `None` for a late
    /// frame that must be discarded.
    ///
    /// Positive frame numbers advance the commit time whenever they exceed
    /// the counter and are accepted when not older than it, or when older
    /// by more than [`FRAME_RESYNC_GAP`] (source restarted). Non-positive
    /// frame numbers are always eligible but only advance the commit time
    /// after [`UNTAGGED_REFRESH_MS`] of session time.
    fn admit(&mut self, fseq: i32, now: TuioTime) -> Option<TuioTime> {
        if fseq > 0 {
            if fseq > self.current_frame {
                self.current_time = now;
            }
            if fseq >= self.current_frame || self.current_frame - fseq > FRAME_RESYNC_GAP {
                self.current_frame = fseq;
            } else {
                return None;
            }
        } else if (now - self.current_time).total_millis() > UNTAGGED_REFRESH_MS {
            self.current_time = now;
        }
        Some(self.current_time)
    }

    fn reset(&mut self) {
        self.current_frame = 0;
        self.current_time = TuioTime::ZERO;
    }
}

/// Committed lifecycle event for the object channel
#[derive(Clone, Debug)]
pub enum ObjectEvent {
    Added(TuioObject),
    Updated(TuioObject),
    Removed(TuioObject),
    Refreshed(TuioTime),
}

/// Committed lifecycle event for the cursor channel
#[derive(Clone, Debug)]
pub enum CursorEvent {
    Added(TuioCursor),
    Updated(TuioCursor),
    Removed(TuioCursor),
    Refreshed(TuioTime),
}

enum StagedObject {
    Add {
        session_id: i64,
        symbol_id: i32,
        x: f32,
        y: f32,
        angle: f32,
    },
    Update {
        session_id: i64,
        x: f32,
        y: f32,
        angle: f32,
        x_speed: f32,
        y_speed: f32,
        rotation_speed: f32,
        motion_accel: f32,
        rotation_accel: f32,
    },
    Remove {
        session_id: i64,
    },
}

enum StagedCursor {
    Add {
        session_id: i64,
        x: f32,
        y: f32,
    },
    Update {
        session_id: i64,
        x: f32,
        y: f32,
        x_speed: f32,
        y_speed: f32,
        motion_accel: f32,
    },
    Remove {
        session_id: i64,
    },
}

/// State machine for the `/tuio/2Dobj` profile
pub struct ObjectChannel {
    active: HashMap<i64, TuioObject>,
    previous_alive: Vec<i64>,
    pending_alive: Option<Vec<i64>>,
    staged: Vec<StagedObject>,
    gate: FrameGate,
}

impl ObjectChannel {
    pub fn new() -> Self {
        ObjectChannel {
            active: HashMap::new(),
            previous_alive: Vec::new(),
            pending_alive: None,
            staged: Vec::new(),
            gate: FrameGate::new(),
        }
    }

    /// Stage a `set` report: an add for an unseen session ID, an update
    /// when any field differs from the active entity, nothing otherwise.
    #[allow(clippy::too_many_arguments)]
    pub fn set(
        &mut self,
        session_id: i64,
        symbol_id: i32,
        x: f32,
        y: f32,
        angle: f32,
        x_speed: f32,
        y_speed: f32,
        rotation_speed: f32,
        motion_accel: f32,
        rotation_accel: f32,
    ) {
        match self.active.get(&session_id) {
            None => self.staged.push(StagedObject::Add {
                session_id,
                symbol_id,
                x,
                y,
                angle,
            }),
            Some(object) => {
                let changed = object.x() != x
                    || object.y() != y
                    || object.angle() != angle
                    || object.container().x_speed() != x_speed
                    || object.container().y_speed() != y_speed
                    || object.rotation_speed() != rotation_speed
                    || object.container().motion_accel() != motion_accel
                    || object.rotation_accel() != rotation_accel;
                if changed {
                    self.staged.push(StagedObject::Update {
                        session_id,
                        x,
                        y,
                        angle,
                        x_speed,
                        y_speed,
                        rotation_speed,
                        motion_accel,
                        rotation_accel,
                    });
                }
            }
        }
    }

    /// Stage removals for every previously alive session ID missing from
    /// the new alive set, and hold the new set for the coming commit.
    pub fn alive(&mut self, ids: &[i64]) {
        for &session_id in &self.previous_alive {
            if !ids.contains(&session_id) && self.active.contains_key(&session_id) {
                self.staged.push(StagedObject::Remove { session_id });
            }
        }
        self.pending_alive = Some(ids.to_vec());
    }

    /// Commit the staged frame. Returns the events to dispatch, in order;
    /// empty (and state untouched) for a rejected late frame.
    pub fn commit(&mut self, fseq: i32, now: TuioTime) -> Vec<ObjectEvent> {
        let Some(time) = self.gate.admit(fseq, now) else {
            tracing::debug!(fseq, "2Dobj: late frame rejected");
            self.staged.clear();
            self.pending_alive = None;
            return Vec::new();
        };

        let staged = mem::take(&mut self.staged);
        let mut events = Vec::new();

        for entry in &staged {
            if let StagedObject::Remove { session_id } = entry {
                if let Some(mut object) = self.active.remove(session_id) {
                    object.remove(time);
                    events.push(ObjectEvent::Removed(object));
                }
            }
        }

        for entry in &staged {
            if let StagedObject::Add {
                session_id,
                symbol_id,
                x,
                y,
                angle,
            } = *entry
            {
                if !self.active.contains_key(&session_id) {
                    let object = TuioObject::new(time, session_id, symbol_id, x, y, angle);
                    self.active.insert(session_id, object.clone());
                    events.push(ObjectEvent::Added(object));
                }
            }
        }

        for entry in &staged {
            if let StagedObject::Update {
                session_id,
                x,
                y,
                angle,
                x_speed,
                y_speed,
                rotation_speed,
                motion_accel,
                rotation_accel,
            } = *entry
            {
                if let Some(object) = self.active.get_mut(&session_id) {
                    // a moved position with a zero reported speed means the
                    // source does not compute kinematics; derive them here
                    if (x != object.x() && x_speed == 0.0) || (y != object.y() && y_speed == 0.0)
                    {
                        object.update_derived(time, x, y, angle);
                    } else {
                        object.update_reported(
                            time,
                            x,
                            y,
                            angle,
                            x_speed,
                            y_speed,
                            rotation_speed,
                            motion_accel,
                            rotation_accel,
                        );
                    }
                    events.push(ObjectEvent::Updated(object.clone()));
                }
            }
        }

        events.push(ObjectEvent::Refreshed(time));

        if let Some(new_alive) = self.pending_alive.take() {
            self.previous_alive = new_alive;
        }
        events
    }

    /// Defensive copy of the active set
    pub fn snapshot(&self) -> Vec<TuioObject> {
        self.active.values().cloned().collect()
    }

    pub fn get(&self, session_id: i64) -> Option<TuioObject> {
        self.active.get(&session_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Drop all channel state, staged and committed
    pub fn clear(&mut self) {
        self.active.clear();
        self.previous_alive.clear();
        self.pending_alive = None;
        self.staged.clear();
        self.gate.reset();
    }
}

impl Default for ObjectChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// State machine for the `/tuio/2Dcur` profile
///
/// Identical commit discipline to the object channel, plus cursor handle
/// pooling: adds acquire a handle at commit time, removals return it.
pub struct CursorChannel {
    active: HashMap<i64, TuioCursor>,
    previous_alive: Vec<i64>,
    pending_alive: Option<Vec<i64>>,
    staged: Vec<StagedCursor>,
    gate: FrameGate,
    pool: CursorIdPool,
}

impl CursorChannel {
    pub fn new() -> Self {
        CursorChannel {
            active: HashMap::new(),
            previous_alive: Vec::new(),
            pending_alive: None,
            staged: Vec::new(),
            gate: FrameGate::new(),
            pool: CursorIdPool::new(),
        }
    }

    /// Stage a `set` report: an add for an unseen session ID, an update
    /// when any field differs from the active entity, nothing otherwise.
    pub fn set(
        &mut self,
        session_id: i64,
        x: f32,
        y: f32,
        x_speed: f32,
        y_speed: f32,
        motion_accel: f32,
    ) {
        match self.active.get(&session_id) {
            None => self.staged.push(StagedCursor::Add { session_id, x, y }),
            Some(cursor) => {
                let changed = cursor.x() != x
                    || cursor.y() != y
                    || cursor.container().x_speed() != x_speed
                    || cursor.container().y_speed() != y_speed
                    || cursor.container().motion_accel() != motion_accel;
                if changed {
                    self.staged.push(StagedCursor::Update {
                        session_id,
                        x,
                        y,
                        x_speed,
                        y_speed,
                        motion_accel,
                    });
                }
            }
        }
    }

    /// Stage removals for every previously alive session ID missing from
    /// the new alive set, and hold the new set for the coming commit.
    pub fn alive(&mut self, ids: &[i64]) {
        for &session_id in &self.previous_alive {
            if !ids.contains(&session_id) && self.active.contains_key(&session_id) {
                self.staged.push(StagedCursor::Remove { session_id });
            }
        }
        self.pending_alive = Some(ids.to_vec());
    }

    /// Commit the staged frame. Returns the events to dispatch, in order;
    /// empty (and state untouched) for a rejected late frame.
    pub fn commit(&mut self, fseq: i32, now: TuioTime) -> Vec<CursorEvent> {
        let Some(time) = self.gate.admit(fseq, now) else {
            tracing::debug!(fseq, "2Dcur: late frame rejected");
            self.staged.clear();
            self.pending_alive = None;
            return Vec::new();
        };

        let staged = mem::take(&mut self.staged);
        let mut events = Vec::new();

        for entry in &staged {
            if let StagedCursor::Remove { session_id } = entry {
                if let Some(mut cursor) = self.active.remove(session_id) {
                    cursor.remove(time);
                    self.pool.release(
                        cursor.cursor_id(),
                        cursor.container().position(),
                        self.active.values().map(|c| c.cursor_id()),
                    );
                    events.push(CursorEvent::Removed(cursor));
                }
            }
        }

        for entry in &staged {
            if let StagedCursor::Add { session_id, x, y } = *entry {
                if !self.active.contains_key(&session_id) {
                    let cursor_id = self.pool.acquire(self.active.len(), TuioPoint::new(x, y));
                    let cursor = TuioCursor::new(time, session_id, cursor_id, x, y);
                    self.active.insert(session_id, cursor.clone());
                    events.push(CursorEvent::Added(cursor));
                }
            }
        }

        for entry in &staged {
            if let StagedCursor::Update {
                session_id,
                x,
                y,
                x_speed,
                y_speed,
                motion_accel,
            } = *entry
            {
                if let Some(cursor) = self.active.get_mut(&session_id) {
                    if (x != cursor.x() && x_speed == 0.0) || (y != cursor.y() && y_speed == 0.0)
                    {
                        cursor.container_mut().update_derived(time, x, y);
                    } else {
                        cursor
                            .container_mut()
                            .update_reported(time, x, y, x_speed, y_speed, motion_accel);
                    }
                    events.push(CursorEvent::Updated(cursor.clone()));
                }
            }
        }

        events.push(CursorEvent::Refreshed(time));

        if let Some(new_alive) = self.pending_alive.take() {
            self.previous_alive = new_alive;
        }
        events
    }

    /// Defensive copy of the active set
    pub fn snapshot(&self) -> Vec<TuioCursor> {
        self.active.values().cloned().collect()
    }

    pub fn get(&self, session_id: i64) -> Option<TuioCursor> {
        self.active.get(&session_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Drop all channel state, staged and committed, and the handle pool
    pub fn clear(&mut self) {
        self.active.clear();
        self.previous_alive.clear();
        self.pending_alive = None;
        self.staged.clear();
        self.gate.reset();
        self.pool.reset();
    }
}

impl Default for CursorChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tacto_core::TuioState;

    fn ms(millis: i64) -> TuioTime {
        TuioTime::from_millis(millis)
    }

    fn commit_cursor_frame(ch: &mut CursorChannel, alive: &[i64], fseq: i32, now: TuioTime) {
        ch.alive(alive);
        ch.commit(fseq, now);
    }

    #[test]
    fn test_add_invisible_until_commit() {
        let mut ch = CursorChannel::new();
        ch.set(1, 0.5, 0.5, 0.0, 0.0, 0.0);
        ch.alive(&[1]);
        assert!(ch.is_empty());

        let events = ch.commit(1, ms(10));
        assert_eq!(ch.len(), 1);
        assert!(matches!(events[0], CursorEvent::Added(ref c) if c.session_id() == 1));
        assert!(matches!(events[1], CursorEvent::Refreshed(t) if t == ms(10)));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_alive_diff_stages_exactly_the_dropped() {
        let mut ch = CursorChannel::new();
        for sid in 1..=3 {
            ch.set(sid, 0.1 * sid as f32, 0.5, 0.0, 0.0, 0.0);
        }
        commit_cursor_frame(&mut ch, &[1, 2, 3], 1, ms(10));
        assert_eq!(ch.len(), 3);

        // 2 drops out; 1 and 3 survive
        let events = {
            ch.alive(&[1, 3]);
            ch.commit(2, ms(20))
        };
        let removed: Vec<i64> = events
            .iter()
            .filter_map(|e| match e {
                CursorEvent::Removed(c) => Some(c.session_id()),
                _ => None,
            })
            .collect();
        assert_eq!(removed, [2]);
        assert_eq!(ch.len(), 2);
        assert!(ch.get(2).is_none());
    }

    #[test]
    fn test_late_frame_rejected_within_gap() {
        let mut ch = CursorChannel::new();
        ch.set(1, 0.5, 0.5, 0.0, 0.0, 0.0);
        commit_cursor_frame(&mut ch, &[1], 50, ms(10));

        // frame 49 is late by 1 (< resync gap): state untouched, no events
        ch.set(1, 0.9, 0.9, 0.0, 0.0, 0.0);
        ch.alive(&[]);
        let events = ch.commit(49, ms(20));
        assert!(events.is_empty());
        assert_eq!(ch.len(), 1);
        let cursor = ch.get(1).unwrap();
        assert_eq!(cursor.x(), 0.5);
        assert_eq!(cursor.state(), TuioState::Added);
    }

    #[test]
    fn test_large_rollback_accepted_as_resync() {
        let mut ch = CursorChannel::new();
        ch.set(1, 0.5, 0.5, 0.0, 0.0, 0.0);
        commit_cursor_frame(&mut ch, &[1], 500, ms(10));

        // the source restarted: frame 10 is older by 490 (> gap)
        ch.set(2, 0.2, 0.2, 0.0, 0.0, 0.0);
        let events = {
            ch.alive(&[1, 2]);
            ch.commit(10, ms(20))
        };
        assert!(events
            .iter()
            .any(|e| matches!(e, CursorEvent::Added(c) if c.session_id() == 2)));
        assert_eq!(ch.len(), 2);
    }

    #[test]
    fn test_events_ordered_remove_add_update_refresh() {
        let mut ch = CursorChannel::new();
        ch.set(1, 0.1, 0.1, 0.0, 0.0, 0.0);
        ch.set(2, 0.9, 0.9, 0.0, 0.0, 0.0);
        commit_cursor_frame(&mut ch, &[1, 2], 1, ms(10));

        // one frame with an update (1), an add (3) and a removal (2),
        // staged in set/alive arrival order
        ch.set(1, 0.15, 0.1, 0.5, 0.0, 0.0);
        ch.set(3, 0.5, 0.5, 0.0, 0.0, 0.0);
        ch.alive(&[1, 3]);
        let events = ch.commit(2, ms(20));

        let kinds: Vec<&str> = events
            .iter()
            .map(|e| match e {
                CursorEvent::Removed(_) => "remove",
                CursorEvent::Added(_) => "add",
                CursorEvent::Updated(_) => "update",
                CursorEvent::Refreshed(_) => "refresh",
            })
            .collect();
        assert_eq!(kinds, ["remove", "add", "update", "refresh"]);
    }

    #[test]
    fn test_unchanged_set_stages_nothing() {
        let mut ch = CursorChannel::new();
        ch.set(1, 0.5, 0.5, 0.0, 0.0, 0.0);
        commit_cursor_frame(&mut ch, &[1], 1, ms(10));

        ch.set(1, 0.5, 0.5, 0.0, 0.0, 0.0);
        ch.alive(&[1]);
        let events = ch.commit(2, ms(20));
        // only the refresh
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], CursorEvent::Refreshed(_)));
    }

    #[test]
    fn test_freed_handle_reused_for_nearest_touch() {
        let mut ch = CursorChannel::new();
        ch.set(10, 0.1, 0.1, 0.0, 0.0, 0.0);
        ch.set(11, 0.5, 0.5, 0.0, 0.0, 0.0);
        ch.set(12, 0.9, 0.9, 0.0, 0.0, 0.0);
        commit_cursor_frame(&mut ch, &[10, 11, 12], 1, ms(10));
        assert_eq!(ch.get(11).unwrap().cursor_id(), 1);

        // handle 1 (below the mark) lifts off and enters the free list
        commit_cursor_frame(&mut ch, &[10, 12], 2, ms(20));

        // a new session touching down near its last position gets it back
        ch.set(13, 0.55, 0.5, 0.0, 0.0, 0.0);
        commit_cursor_frame(&mut ch, &[10, 12, 13], 3, ms(30));
        assert_eq!(ch.get(13).unwrap().cursor_id(), 1);
    }

    #[test]
    fn test_highest_handle_reassigned_after_removal() {
        let mut ch = CursorChannel::new();
        ch.set(10, 0.1, 0.1, 0.0, 0.0, 0.0);
        ch.set(11, 0.5, 0.5, 0.0, 0.0, 0.0);
        ch.set(12, 0.9, 0.9, 0.0, 0.0, 0.0);
        commit_cursor_frame(&mut ch, &[10, 11, 12], 1, ms(10));
        assert_eq!(ch.get(12).unwrap().cursor_id(), 2);

        // the mark holder lifts off, shrinking the mark to 1
        commit_cursor_frame(&mut ch, &[10, 11], 2, ms(20));

        // the next touch mints a dense handle: 2 again
        ch.set(13, 0.85, 0.9, 0.0, 0.0, 0.0);
        commit_cursor_frame(&mut ch, &[10, 11, 13], 3, ms(30));
        assert_eq!(ch.get(13).unwrap().cursor_id(), 2);
    }

    #[test]
    fn test_untagged_fseq_always_commits() {
        let mut ch = ObjectChannel::new();
        ch.set(1, 7, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        ch.alive(&[1]);
        let events = ch.commit(-1, ms(10));
        assert!(events
            .iter()
            .any(|e| matches!(e, ObjectEvent::Added(o) if o.symbol_id() == 7)));

        // and again immediately, still eligible
        ch.set(1, 7, 0.6, 0.5, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        ch.alive(&[1]);
        let events = ch.commit(-1, ms(20));
        assert!(events
            .iter()
            .any(|e| matches!(e, ObjectEvent::Updated(_))));
    }

    #[test]
    fn test_derived_update_when_reported_speed_zero() {
        let mut ch = CursorChannel::new();
        ch.set(1, 0.5, 0.5, 0.0, 0.0, 0.0);
        commit_cursor_frame(&mut ch, &[1], 1, ms(0));

        // position moved but the source reports zero speed: derive
        ch.set(1, 0.6, 0.5, 0.0, 0.0, 0.0);
        ch.alive(&[1]);
        let events = ch.commit(2, ms(100));
        let updated = events
            .iter()
            .find_map(|e| match e {
                CursorEvent::Updated(c) => Some(c.clone()),
                _ => None,
            })
            .unwrap();
        assert!((updated.container().x_speed() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_reported_velocities_passed_through() {
        let mut ch = CursorChannel::new();
        ch.set(1, 0.5, 0.5, 0.0, 0.0, 0.0);
        commit_cursor_frame(&mut ch, &[1], 1, ms(0));

        ch.set(1, 0.6, 0.5, 2.5, 0.0, 0.1);
        ch.alive(&[1]);
        let events = ch.commit(2, ms(100));
        let updated = events
            .iter()
            .find_map(|e| match e {
                CursorEvent::Updated(c) => Some(c.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(updated.container().x_speed(), 2.5);
        assert_eq!(updated.container().motion_accel(), 0.1);
    }

    #[test]
    fn test_object_angle_fields_flow_through_commit() {
        let mut ch = ObjectChannel::new();
        ch.set(1, 42, 0.5, 0.5, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0);
        ch.alive(&[1]);
        ch.commit(1, ms(0));

        // the object drifts with zero reported speed (derive branch) while
        // its angle crosses the 0/2pi seam: wrap keeps rotation small
        ch.set(1, 42, 0.51, 0.5, 6.2, 0.0, 0.0, 0.0, 0.0, 0.0);
        ch.alive(&[1]);
        let events = ch.commit(2, ms(100));
        let updated = events
            .iter()
            .find_map(|e| match e {
                ObjectEvent::Updated(o) => Some(o.clone()),
                _ => None,
            })
            .unwrap();
        assert!(updated.rotation_speed().abs() < 0.5);
    }
}
