//! Loopback backend: an in-process flat world behind the protocol seam.
//!
//! Used by the binary's demo mode and by the integration tests. The session
//! integrates simple walk kinematics from the held controls, so a ticking
//! patrol visibly moves the bot; tests can also inject arbitrary lifecycle
//! events (kick, death, transport end) to drive the supervisor.

use crate::adapter::{Connector, Control, GameSession, ServerConfig, SessionEvent};
use crate::types::{BotError, Vec3};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::Instant;

/// Blocks per second, matching vanilla walk/sprint speeds.
const WALK_SPEED: f64 = 4.317;
const SPRINT_SPEED: f64 = 5.612;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

struct SessionState {
    position: Vec3,
    yaw: f64,
    spawned: bool,
    forward: bool,
    sprint: bool,
    jump: bool,
    last_step: Instant,
    look_calls: u64,
}

/// Flat-ground session. Position integrates lazily on read: each
/// [`GameSession::position`] call advances the kinematics by the elapsed
/// time, so no background task is needed.
pub struct LoopbackSession {
    inner: Mutex<SessionState>,
}

impl LoopbackSession {
    fn new(spawn: Vec3) -> Self {
        Self {
            inner: Mutex::new(SessionState {
                position: spawn,
                yaw: 0.0,
                spawned: true,
                forward: false,
                sprint: false,
                jump: false,
                last_step: Instant::now(),
                look_calls: 0,
            }),
        }
    }

    /// Simulate the entity disappearing (pre-spawn, mid-respawn).
    pub fn set_spawned(&self, spawned: bool) {
        self.inner.lock().spawned = spawned;
    }

    /// Teleport, as a server respawn would.
    pub fn set_position(&self, position: Vec3) {
        let mut state = self.inner.lock();
        state.position = position;
        state.last_step = Instant::now();
    }

    pub fn yaw(&self) -> f64 {
        self.inner.lock().yaw
    }

    pub fn control(&self, control: Control) -> bool {
        let state = self.inner.lock();
        match control {
            Control::Forward => state.forward,
            Control::Sprint => state.sprint,
            Control::Jump => state.jump,
        }
    }

    /// Number of `look` signals received; lets tests observe tick cadence.
    pub fn look_calls(&self) -> u64 {
        self.inner.lock().look_calls
    }

    fn step(state: &mut SessionState) {
        let now = Instant::now();
        let dt = now.duration_since(state.last_step).as_secs_f64();
        state.last_step = now;

        if !state.forward || !state.spawned {
            return;
        }

        // Yaw 0 faces -Z; forward is (-sin yaw, 0, -cos yaw).
        let speed = if state.sprint { SPRINT_SPEED } else { WALK_SPEED };
        state.position.x += -state.yaw.sin() * speed * dt;
        state.position.z += -state.yaw.cos() * speed * dt;
    }
}

impl GameSession for LoopbackSession {
    fn position(&self) -> Option<Vec3> {
        let mut state = self.inner.lock();
        Self::step(&mut state);
        state.spawned.then_some(state.position)
    }

    fn on_ground(&self) -> bool {
        true
    }

    fn set_control(&self, control: Control, active: bool) {
        let mut state = self.inner.lock();
        Self::step(&mut state);
        match control {
            Control::Forward => state.forward = active,
            Control::Sprint => state.sprint = active,
            Control::Jump => state.jump = active,
        }
    }

    fn look(&self, yaw: f64, _pitch: f64, _force: bool) {
        let mut state = self.inner.lock();
        Self::step(&mut state);
        state.yaw = yaw;
        state.look_calls += 1;
    }
}

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

struct ConnectorState {
    session: Option<Arc<LoopbackSession>>,
    events: Option<UnboundedSender<SessionEvent>>,
    connects: u64,
}

/// Hands out [`LoopbackSession`]s that spawn at a fixed point.
///
/// `Login` and `Spawn` are queued immediately on connect. The most recent
/// session and its event sender stay reachable so tests can inject events
/// and inspect the world.
pub struct LoopbackConnector {
    spawn: Vec3,
    state: Mutex<ConnectorState>,
}

impl LoopbackConnector {
    pub fn new(spawn: Vec3) -> Self {
        Self {
            spawn,
            state: Mutex::new(ConnectorState {
                session: None,
                events: None,
                connects: 0,
            }),
        }
    }

    /// How many sessions have been opened.
    pub fn connects(&self) -> u64 {
        self.state.lock().connects
    }

    /// The most recently opened session, if any.
    pub fn session(&self) -> Option<Arc<LoopbackSession>> {
        self.state.lock().session.clone()
    }

    /// Inject a lifecycle event into the most recent session's channel.
    pub fn inject(&self, event: SessionEvent) {
        if let Some(tx) = &self.state.lock().events {
            let _ = tx.send(event);
        }
    }
}

impl Connector for LoopbackConnector {
    fn connect(
        &self,
        _config: &ServerConfig,
    ) -> Result<(Arc<dyn GameSession>, mpsc::UnboundedReceiver<SessionEvent>), BotError> {
        let session = Arc::new(LoopbackSession::new(self.spawn));
        let (tx, rx) = mpsc::unbounded_channel();

        let _ = tx.send(SessionEvent::Login);
        let _ = tx.send(SessionEvent::Spawn);

        let mut state = self.state.lock();
        state.connects += 1;
        state.session = Some(session.clone());
        state.events = Some(tx);

        Ok((session, rx))
    }
}
