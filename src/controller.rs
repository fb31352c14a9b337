//! Motion controller: periodic tick tasks that drive the patrol.
//!
//! Two independent cadences run against the session:
//!
//! | Task       | Period   | Work                                        |
//! |------------|----------|---------------------------------------------|
//! | motion     | 100 ms   | advance patrol, issue look + hold forward   |
//! | jump check | 1000 ms  | jump pulse whenever the bot is grounded     |
//!
//! Both cadences touch the jump control; last write wins, which is
//! tolerated. Jump pulses release through detached one-shot tasks that
//! outlive [`MotionController::stop`] harmlessly.

use crate::adapter::{Control, GameSession};
use crate::patrol::Patrol;
use crate::types::{PatrolConfig, PatrolStats, Vec3};
use log::{debug, info};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Owns the motion-tick and jump-check tasks for one patrol run.
///
/// At most one of each exists; [`MotionController::start`] replaces any
/// running pair, [`MotionController::stop`] cancels them before returning.
pub struct MotionController {
    motion: Option<JoinHandle<()>>,
    jump_check: Option<JoinHandle<()>>,
    stats: Arc<RwLock<Option<PatrolStats>>>,
}

impl MotionController {
    pub fn new() -> Self {
        Self {
            motion: None,
            jump_check: None,
            stats: Arc::new(RwLock::new(None)),
        }
    }

    /// Whether the tick tasks are currently running.
    pub fn is_running(&self) -> bool {
        self.motion.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Counters of the current (or most recent) patrol run.
    pub fn stats(&self) -> Option<PatrolStats> {
        *self.stats.read()
    }

    /// Begin a fresh patrol around `origin`.
    ///
    /// Stops any previous run first, so calling this twice never leaves two
    /// motion tasks ticking. The sprint modifier stays held for the whole
    /// run.
    pub fn start(&mut self, session: Arc<dyn GameSession>, origin: Vec3, config: PatrolConfig) {
        self.stop();

        let mut patrol = Patrol::new(origin, config);
        *self.stats.write() = Some(patrol.stats());

        session.set_control(Control::Sprint, true);

        let motion_session = session.clone();
        let stats = self.stats.clone();
        self.motion = Some(tokio::spawn(async move {
            let mut timer = tokio::time::interval(config.tick_period);
            loop {
                timer.tick().await;

                // No entity yet (pre-spawn, mid-respawn): skip the tick.
                let Some(current) = motion_session.position() else {
                    continue;
                };

                let step = patrol.advance(current);
                *stats.write() = Some(patrol.stats());

                motion_session.look(step.yaw, 0.0, true);
                motion_session.set_control(Control::Forward, true);

                if step.jump {
                    pulse_jump(&motion_session, config.jump_hold);
                }
            }
        }));

        let jump_session = session;
        self.jump_check = Some(tokio::spawn(async move {
            let mut timer = tokio::time::interval(config.jump_check_period);
            loop {
                timer.tick().await;
                if jump_session.on_ground() {
                    pulse_jump(&jump_session, config.jump_hold);
                }
            }
        }));

        info!("Circular movement started around {}", origin);
    }

    /// Cancel both tick tasks. Idempotent; no tick fires after this returns.
    pub fn stop(&mut self) {
        if let Some(handle) = self.motion.take() {
            handle.abort();
        }
        if let Some(handle) = self.jump_check.take() {
            handle.abort();
        }
        debug!("Movement stopped");
    }
}

impl Default for MotionController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MotionController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Press jump now, release it after `hold`.
///
/// The release runs in a detached task; if the controls were already
/// cleared by then the release is a no-op.
fn pulse_jump(session: &Arc<dyn GameSession>, hold: Duration) {
    session.set_control(Control::Jump, true);
    let session = session.clone();
    tokio::spawn(async move {
        tokio::time::sleep(hold).await;
        session.set_control(Control::Jump, false);
    });
}
