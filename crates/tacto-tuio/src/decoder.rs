//! TUIO session decoder
//!
//! Routes decoded OSC messages to the per-profile channels and fans the
//! committed events out to registered listeners. All decode/stage/commit
//! work happens on the caller's thread (the receive loop); consumers on
//! other threads read defensively copied snapshots through short-lived
//! per-channel locks. The two channel locks are independent and never
//! acquired nested.

use std::sync::Arc;

use parking_lot::Mutex;
use tacto_core::{MonotonicClock, SessionClock, TactoResult, TuioCursor, TuioObject};
use tacto_osc::{OscAtom, OscMessage, OscPacket};

use crate::channel::{CursorChannel, CursorEvent, ObjectChannel, ObjectEvent};
use crate::listener::{Listeners, TuioListener};

/// OSC address of the 2D object profile
pub const OBJECT_ADDRESS: &str = "/tuio/2Dobj";
/// OSC address of the 2D cursor profile
pub const CURSOR_ADDRESS: &str = "/tuio/2Dcur";

/// The central TUIO protocol decoder
///
/// Feed it raw datagrams (or decoded messages) from a receive loop;
/// register [`TuioListener`]s to observe entity lifecycles; query the
/// snapshot accessors from any thread.
pub struct TuioDecoder {
    clock: Arc<dyn SessionClock>,
    listeners: Listeners,
    objects: Mutex<ObjectChannel>,
    cursors: Mutex<CursorChannel>,
}

impl TuioDecoder {
    /// Create a decoder driven by the given session clock
    pub fn new(clock: Arc<dyn SessionClock>) -> Self {
        TuioDecoder {
            clock,
            listeners: Listeners::new(),
            objects: Mutex::new(ObjectChannel::new()),
            cursors: Mutex::new(CursorChannel::new()),
        }
    }

    /// Create a decoder whose session epoch is "now"
    pub fn with_session_clock() -> Self {
        Self::new(Arc::new(MonotonicClock::new()))
    }

    /// Register a listener; fires no events itself
    pub fn add_listener(&self, listener: Arc<dyn TuioListener>) {
        self.listeners.add(listener);
    }

    /// Unregister a previously added listener
    pub fn remove_listener(&self, listener: &Arc<dyn TuioListener>) {
        self.listeners.remove(listener);
    }

    /// Unregister all listeners
    pub fn clear_listeners(&self) {
        self.listeners.clear();
    }

    /// Decode one datagram and run it through the stage/commit pipeline.
    ///
    /// A malformed buffer is a local failure: the error is returned for
    /// the caller to log and the session state is left as it was.
    pub fn process_datagram(&self, bytes: &[u8]) -> TactoResult<()> {
        let packet = OscPacket::decode(bytes)?;
        for message in packet.messages() {
            self.process_message(&message);
        }
        Ok(())
    }

    /// Interpret one decoded OSC message as a TUIO command.
    ///
    /// Messages with an unrecognized address or command, or with malformed
    /// arguments, are ignored.
    pub fn process_message(&self, message: &OscMessage) {
        let Some(command) = message.args.first().and_then(OscAtom::as_str) else {
            return;
        };
        tracing::trace!(address = %message.address, command, "tuio message");

        match message.address.as_str() {
            OBJECT_ADDRESS => self.object_command(command, &message.args),
            CURSOR_ADDRESS => self.cursor_command(command, &message.args),
            _ => {}
        }
    }

    fn object_command(&self, command: &str, args: &[OscAtom]) {
        match command {
            "set" => {
                let Some((session_id, symbol_id, f)) = object_set_args(args) else {
                    tracing::trace!("2Dobj: malformed set arguments");
                    return;
                };
                self.objects.lock().set(
                    session_id, symbol_id, f[0], f[1], f[2], f[3], f[4], f[5], f[6], f[7],
                );
            }
            "alive" => {
                let ids = alive_args(args);
                self.objects.lock().alive(&ids);
            }
            "fseq" => {
                let Some(fseq) = args.get(1).and_then(OscAtom::as_i32) else {
                    return;
                };
                let now = self.clock.now();
                let events = self.objects.lock().commit(fseq, now);
                let listeners = self.listeners.snapshot();
                for event in &events {
                    for listener in &listeners {
                        match event {
                            ObjectEvent::Removed(o) => listener.remove_tuio_object(o),
                            ObjectEvent::Added(o) => listener.add_tuio_object(o),
                            ObjectEvent::Updated(o) => listener.update_tuio_object(o),
                            ObjectEvent::Refreshed(t) => listener.refresh(*t),
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn cursor_command(&self, command: &str, args: &[OscAtom]) {
        match command {
            "set" => {
                let Some((session_id, f)) = cursor_set_args(args) else {
                    tracing::trace!("2Dcur: malformed set arguments");
                    return;
                };
                self.cursors
                    .lock()
                    .set(session_id, f[0], f[1], f[2], f[3], f[4]);
            }
            "alive" => {
                let ids = alive_args(args);
                self.cursors.lock().alive(&ids);
            }
            "fseq" => {
                let Some(fseq) = args.get(1).and_then(OscAtom::as_i32) else {
                    return;
                };
                let now = self.clock.now();
                let events = self.cursors.lock().commit(fseq, now);
                let listeners = self.listeners.snapshot();
                for event in &events {
                    for listener in &listeners {
                        match event {
                            CursorEvent::Removed(c) => listener.remove_tuio_cursor(c),
                            CursorEvent::Added(c) => listener.add_tuio_cursor(c),
                            CursorEvent::Updated(c) => listener.update_tuio_cursor(c),
                            CursorEvent::Refreshed(t) => listener.refresh(*t),
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Snapshot of all currently active objects
    pub fn objects(&self) -> Vec<TuioObject> {
        self.objects.lock().snapshot()
    }

    /// Snapshot of all currently active cursors
    pub fn cursors(&self) -> Vec<TuioCursor> {
        self.cursors.lock().snapshot()
    }

    /// The active object with the given session ID, if any
    pub fn object(&self, session_id: i64) -> Option<TuioObject> {
        self.objects.lock().get(session_id)
    }

    /// The active cursor with the given session ID, if any
    pub fn cursor(&self, session_id: i64) -> Option<TuioCursor> {
        self.cursors.lock().get(session_id)
    }

    /// Discard all session state: active maps, staged buffers, alive
    /// sets, frame gates, and the cursor handle pool
    pub fn reset(&self) {
        self.objects.lock().clear();
        self.cursors.lock().clear();
    }
}

fn object_set_args(args: &[OscAtom]) -> Option<(i64, i32, [f32; 8])> {
    let session_id = args.get(1)?.as_i32()? as i64;
    let symbol_id = args.get(2)?.as_i32()?;
    let mut f = [0.0f32; 8];
    for (i, slot) in f.iter_mut().enumerate() {
        *slot = args.get(3 + i)?.as_f32()?;
    }
    Some((session_id, symbol_id, f))
}

fn cursor_set_args(args: &[OscAtom]) -> Option<(i64, [f32; 5])> {
    let session_id = args.get(1)?.as_i32()? as i64;
    let mut f = [0.0f32; 5];
    for (i, slot) in f.iter_mut().enumerate() {
        *slot = args.get(2 + i)?.as_f32()?;
    }
    Some((session_id, f))
}

fn alive_args(args: &[OscAtom]) -> Vec<i64> {
    args[1..]
        .iter()
        .filter_map(|a| a.as_i32().map(i64::from))
        .collect()
}
