//! Entity and kinematics model
//!
//! Tracked entities form a composition hierarchy: a shared kinematic
//! [`Container`] (position, velocity, acceleration, path history) embedded
//! by the two profile-specific kinds, [`TuioObject`] (tagged fiducial with
//! rotation) and [`TuioCursor`] (untagged touch point with a pooled
//! handle).
//!
//! Positions are normalized [0,1] screen space. Velocities are reported in
//! position units per second; rotation velocities in full turns per second.

use std::collections::VecDeque;
use std::f32::consts::PI;

use crate::TuioTime;

/// Path history retention, in points. TUIO trackers report at 30-100 Hz,
/// so this keeps roughly the last few seconds of trail.
pub const MAX_PATH_LEN: usize = 128;

/// A position in normalized [0,1] screen space
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct TuioPoint {
    pub x: f32,
    pub y: f32,
}

impl TuioPoint {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        TuioPoint { x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance_to(&self, other: &TuioPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Angle of the line towards another point, in radians [0, 2pi)
    pub fn angle_to(&self, other: &TuioPoint) -> f32 {
        let side = other.x - self.x;
        let height = other.y - self.y;
        let distance = self.distance_to(other);

        let angle = (side / distance).asin() + PI / 2.0;
        if height < 0.0 {
            2.0 * PI - angle
        } else {
            angle
        }
    }

    /// Project onto a screen of the given width
    #[inline]
    pub fn screen_x(&self, width: u32) -> i32 {
        (self.x * width as f32).round() as i32
    }

    /// Project onto a screen of the given height
    #[inline]
    pub fn screen_y(&self, height: u32) -> i32 {
        (self.y * height as f32).round() as i32
    }
}

/// One historical sample of an entity's path
#[derive(Clone, Copy, Debug)]
pub struct PathPoint {
    pub time: TuioTime,
    pub point: TuioPoint,
}

/// Lifecycle state of a tracked entity
///
/// Transitions are monotonic within a lifecycle: `Added`, then any of the
/// moving states, then `Removed`, which is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TuioState {
    Added,
    Accelerating,
    Decelerating,
    Stopped,
    /// Objects only: angular acceleration is non-zero
    Rotating,
    Removed,
}

/// Shared kinematic core of objects and cursors
///
/// Holds the transport-assigned session ID (unique for the entity's
/// lifetime, never reused within a session), the current position and
/// timestamps, velocity and acceleration, and a bounded path history.
#[derive(Clone, Debug)]
pub struct Container {
    session_id: i64,
    position: TuioPoint,
    start_time: TuioTime,
    time: TuioTime,
    x_speed: f32,
    y_speed: f32,
    motion_speed: f32,
    motion_accel: f32,
    path: VecDeque<PathPoint>,
    state: TuioState,
}

impl Container {
    /// Create a container at its first reported position
    pub fn new(time: TuioTime, session_id: i64, x: f32, y: f32) -> Self {
        let position = TuioPoint::new(x, y);
        let mut path = VecDeque::with_capacity(8);
        path.push_back(PathPoint { time, point: position });
        Container {
            session_id,
            position,
            start_time: time,
            time,
            x_speed: 0.0,
            y_speed: 0.0,
            motion_speed: 0.0,
            motion_accel: 0.0,
            path,
            state: TuioState::Added,
        }
    }

    /// Update from a position-only report, deriving velocity as
    /// displacement over elapsed time and acceleration as the change in
    /// scalar speed over elapsed time
    pub fn update_derived(&mut self, time: TuioTime, x: f32, y: f32) {
        let dt = (time - self.time).total_millis() as f32 / 1000.0;
        let dx = x - self.position.x;
        let dy = y - self.position.y;
        let dist = (dx * dx + dy * dy).sqrt();
        let last_motion_speed = self.motion_speed;

        self.x_speed = dx / dt;
        self.y_speed = dy / dt;
        self.motion_speed = dist / dt;
        self.motion_accel = (self.motion_speed - last_motion_speed) / dt;

        self.move_to(time, x, y);
        self.classify();
    }

    /// Update from a report carrying upstream-computed velocity and
    /// acceleration; values are stored, not derived
    pub fn update_reported(
        &mut self,
        time: TuioTime,
        x: f32,
        y: f32,
        x_speed: f32,
        y_speed: f32,
        motion_accel: f32,
    ) {
        self.x_speed = x_speed;
        self.y_speed = y_speed;
        self.motion_speed = (x_speed * x_speed + y_speed * y_speed).sqrt();
        self.motion_accel = motion_accel;

        self.move_to(time, x, y);
        self.classify();
    }

    /// Report the entity as holding still at its current position
    pub fn stop(&mut self, time: TuioTime) {
        let TuioPoint { x, y } = self.position;
        self.update_derived(time, x, y);
    }

    /// Mark the entity removed at the given time; terminal
    pub fn remove(&mut self, time: TuioTime) {
        self.time = time;
        self.state = TuioState::Removed;
    }

    fn move_to(&mut self, time: TuioTime, x: f32, y: f32) {
        self.position = TuioPoint::new(x, y);
        self.time = time;
        if self.path.len() == MAX_PATH_LEN {
            self.path.pop_front();
        }
        self.path.push_back(PathPoint {
            time,
            point: self.position,
        });
    }

    fn classify(&mut self) {
        self.state = if self.motion_accel > 0.0 {
            TuioState::Accelerating
        } else if self.motion_accel < 0.0 {
            TuioState::Decelerating
        } else {
            TuioState::Stopped
        };
    }

    #[inline]
    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    #[inline]
    pub fn position(&self) -> TuioPoint {
        self.position
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.position.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.position.y
    }

    /// Creation timestamp
    #[inline]
    pub fn start_time(&self) -> TuioTime {
        self.start_time
    }

    /// Last-update timestamp
    #[inline]
    pub fn time(&self) -> TuioTime {
        self.time
    }

    #[inline]
    pub fn x_speed(&self) -> f32 {
        self.x_speed
    }

    #[inline]
    pub fn y_speed(&self) -> f32 {
        self.y_speed
    }

    #[inline]
    pub fn motion_speed(&self) -> f32 {
        self.motion_speed
    }

    #[inline]
    pub fn motion_accel(&self) -> f32 {
        self.motion_accel
    }

    /// Path history, oldest first
    #[inline]
    pub fn path(&self) -> &VecDeque<PathPoint> {
        &self.path
    }

    #[inline]
    pub fn state(&self) -> TuioState {
        self.state
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.state, TuioState::Accelerating | TuioState::Decelerating)
    }
}

/// A tracked touch point
///
/// Carries a small non-negative handle assigned by the cursor pool,
/// independent of the session ID, so downstream consumers see dense,
/// low-churn identifiers.
#[derive(Clone, Debug)]
pub struct TuioCursor {
    container: Container,
    cursor_id: i32,
}

impl TuioCursor {
    pub fn new(time: TuioTime, session_id: i64, cursor_id: i32, x: f32, y: f32) -> Self {
        TuioCursor {
            container: Container::new(time, session_id, x, y),
            cursor_id,
        }
    }

    /// Pooled cursor handle, unique among active cursors
    #[inline]
    pub fn cursor_id(&self) -> i32 {
        self.cursor_id
    }

    pub fn stop(&mut self, time: TuioTime) {
        self.container.stop(time);
    }

    pub fn remove(&mut self, time: TuioTime) {
        self.container.remove(time);
    }

    #[inline]
    pub fn container(&self) -> &Container {
        &self.container
    }

    #[inline]
    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    #[inline]
    pub fn session_id(&self) -> i64 {
        self.container.session_id
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.container.x()
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.container.y()
    }

    #[inline]
    pub fn state(&self) -> TuioState {
        self.container.state
    }
}

/// A tracked tangible object (fiducial marker)
#[derive(Clone, Debug)]
pub struct TuioObject {
    container: Container,
    symbol_id: i32,
    angle: f32,
    rotation_speed: f32,
    rotation_accel: f32,
}

impl TuioObject {
    pub fn new(
        time: TuioTime,
        session_id: i64,
        symbol_id: i32,
        x: f32,
        y: f32,
        angle: f32,
    ) -> Self {
        TuioObject {
            container: Container::new(time, session_id, x, y),
            symbol_id,
            angle,
            rotation_speed: 0.0,
            rotation_accel: 0.0,
        }
    }

    /// Update from a position+angle report, deriving linear and angular
    /// kinematics. The angular delta is normalized to full turns and
    /// wrapped to the shortest direction so a pass through 0/2pi does not
    /// register as a near-full-turn spin.
    pub fn update_derived(&mut self, time: TuioTime, x: f32, y: f32, angle: f32) {
        let dt = (time - self.container.time).total_millis() as f32 / 1000.0;
        let last_angle = self.angle;
        let last_rotation_speed = self.rotation_speed;

        self.container.update_derived(time, x, y);
        self.angle = angle;

        let mut da = (angle - last_angle) / (2.0 * PI);
        if da > 0.75 {
            da -= 1.0;
        } else if da < -0.75 {
            da += 1.0;
        }
        self.rotation_speed = da / dt;
        self.rotation_accel = (self.rotation_speed - last_rotation_speed) / dt;
        self.classify_rotation();
    }

    /// Update from a full 2Dobj field vector with upstream-computed
    /// velocities and accelerations
    #[allow(clippy::too_many_arguments)]
    pub fn update_reported(
        &mut self,
        time: TuioTime,
        x: f32,
        y: f32,
        angle: f32,
        x_speed: f32,
        y_speed: f32,
        rotation_speed: f32,
        motion_accel: f32,
        rotation_accel: f32,
    ) {
        self.container
            .update_reported(time, x, y, x_speed, y_speed, motion_accel);
        self.angle = angle;
        self.rotation_speed = rotation_speed;
        self.rotation_accel = rotation_accel;
        self.classify_rotation();
    }

    pub fn stop(&mut self, time: TuioTime) {
        let TuioPoint { x, y } = self.container.position;
        let angle = self.angle;
        self.update_derived(time, x, y, angle);
    }

    pub fn remove(&mut self, time: TuioTime) {
        self.container.remove(time);
    }

    fn classify_rotation(&mut self) {
        if self.rotation_accel != 0.0 && self.container.state != TuioState::Stopped {
            self.container.state = TuioState::Rotating;
        }
    }

    /// Symbol (tag) identity of the fiducial
    #[inline]
    pub fn symbol_id(&self) -> i32 {
        self.symbol_id
    }

    /// Rotation angle in radians
    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    #[inline]
    pub fn angle_degrees(&self) -> f32 {
        self.angle / PI * 180.0
    }

    /// Rotation speed in full turns per second
    #[inline]
    pub fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }

    #[inline]
    pub fn rotation_accel(&self) -> f32 {
        self.rotation_accel
    }

    #[inline]
    pub fn container(&self) -> &Container {
        &self.container
    }

    #[inline]
    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    #[inline]
    pub fn session_id(&self) -> i64 {
        self.container.session_id
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.container.x()
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.container.y()
    }

    #[inline]
    pub fn state(&self) -> TuioState {
        self.container.state
    }

    pub fn is_moving(&self) -> bool {
        matches!(
            self.container.state,
            TuioState::Accelerating | TuioState::Decelerating | TuioState::Rotating
        )
    }
}
