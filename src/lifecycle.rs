//! Session lifecycle: connect/disconnect state machine and reconnect policy.
//!
//! ## State machine
//!
//! ```text
//! Disconnected → Connecting → Idle → Patrolling
//!       ↑                                │ kicked / end / error
//!       └──────── Reconnecting ←─────────┘
//! ```
//!
//! Every connection failure is handled the same way: stop the patrol, mark
//! the process disconnected, retry after a fixed delay. There is no backoff
//! growth, no retry cap and no permanent-failure state; the bot is a
//! best-effort background presence, not an availability guarantee.
//!
//! Timer firings (respawn check, reconnect) come back into the state
//! machine as [`Command`] values over a channel, so the event dispatch
//! stays a plain method that tests can drive directly.

use crate::adapter::{Connector, GameSession, ServerConfig, SessionEvent};
use crate::controller::MotionController;
use crate::types::{ConnectionStatus, PatrolConfig, PatrolStats, StatusHandle};
use anyhow::Result;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Fixed delay before a reconnect attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(5000);
/// Fixed delay between death and the respawn position check.
pub const RESPAWN_CHECK_DELAY: Duration = Duration::from_millis(2000);

// ---------------------------------------------------------------------------
// States & internal commands
// ---------------------------------------------------------------------------

/// Supervisor-internal connection state.
///
/// `Patrolling` survives a death gap (the controller is stopped, the session
/// is still live); `Reconnecting` means a reconnect timer is pending or an
/// attempt is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotState {
    Disconnected,
    Connecting,
    Idle,
    Patrolling,
    Reconnecting,
}

/// Timer firings delivered back into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// The reconnect delay elapsed: attempt a fresh connect.
    Reconnect,
    /// The respawn-check delay elapsed: re-capture the origin and restart
    /// the patrol if a live position exists.
    RestartPatrol,
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// Owns the session, the motion controller, and every lifecycle timer.
///
/// One respawn-check timer and one reconnect timer may be pending at a
/// time; scheduling a new one always cancels its predecessor first.
pub struct BotSupervisor {
    connector: Arc<dyn Connector>,
    server: ServerConfig,
    patrol_config: PatrolConfig,
    status: StatusHandle,
    state: BotState,
    session: Option<Arc<dyn GameSession>>,
    events: Option<UnboundedReceiver<SessionEvent>>,
    controller: MotionController,
    cmd_tx: UnboundedSender<Command>,
    cmd_rx: UnboundedReceiver<Command>,
    respawn_check: Option<JoinHandle<()>>,
    reconnect: Option<JoinHandle<()>>,
}

impl BotSupervisor {
    pub fn new(
        connector: Arc<dyn Connector>,
        server: ServerConfig,
        patrol_config: PatrolConfig,
        status: StatusHandle,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        Self {
            connector,
            server,
            patrol_config,
            status,
            state: BotState::Disconnected,
            session: None,
            events: None,
            controller: MotionController::new(),
            cmd_tx,
            cmd_rx,
            respawn_check: None,
            reconnect: None,
        }
    }

    pub fn state(&self) -> BotState {
        self.state
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.get()
    }

    /// Whether a reconnect timer is currently pending.
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Whether the motion controller is ticking.
    pub fn patrolling(&self) -> bool {
        self.controller.is_running()
    }

    /// Counters of the current patrol run, if one has started.
    pub fn patrol_stats(&self) -> Option<PatrolStats> {
        self.controller.stats()
    }

    // -----------------------------------------------------------------------
    // Connecting
    // -----------------------------------------------------------------------

    /// Open a fresh session. A synchronous connector failure goes straight
    /// into the reconnect path; handshake failures arrive later as events.
    pub fn connect(&mut self) {
        info!(
            "Connecting to {}:{} as '{}' (protocol {})",
            self.server.host, self.server.port, self.server.username, self.server.version
        );
        self.state = BotState::Connecting;

        match self.connector.connect(&self.server) {
            Ok((session, events)) => {
                self.session = Some(session);
                self.events = Some(events);
            }
            Err(e) => {
                error!("Connect failed: {}", e);
                self.status.set(ConnectionStatus::Disconnected);
                self.schedule_reconnect();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Event dispatch
    // -----------------------------------------------------------------------

    /// Apply one session lifecycle event to the state machine.
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Login => {
                info!("Logged in as '{}'", self.server.username);
                self.status.set(ConnectionStatus::Connected);
                self.state = BotState::Idle;
            }
            SessionEvent::Spawn => self.on_spawn(),
            SessionEvent::Death => {
                warn!("Bot died, waiting to respawn");
                self.controller.stop();
                self.schedule_respawn_check();
            }
            SessionEvent::Kicked(reason) => {
                warn!("Kicked from server: {}", reason);
                self.on_connection_lost();
            }
            SessionEvent::End => {
                warn!("Connection ended");
                self.on_connection_lost();
            }
            SessionEvent::Error(message) => {
                error!("Session error: {}", message);
                self.on_connection_lost();
            }
        }
    }

    /// Apply one internal timer firing.
    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::Reconnect => {
                info!("Attempting to reconnect");
                self.status.set(ConnectionStatus::Reconnecting);
                self.connect();
            }
            Command::RestartPatrol => self.restart_patrol(),
        }
    }

    /// Dispatch every event and timer command that is already queued, then
    /// return. Lets embedders step the state machine without the full
    /// [`run`](Self::run) select loop.
    pub fn pump(&mut self) {
        loop {
            let event = match &mut self.events {
                Some(rx) => rx.try_recv().ok(),
                None => None,
            };
            if let Some(event) = event {
                self.handle_event(event);
                continue;
            }
            if let Ok(command) = self.cmd_rx.try_recv() {
                self.handle_command(command);
                continue;
            }
            break;
        }
    }

    fn on_spawn(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };
        let Some(origin) = session.position() else {
            warn!("Spawned without a live position; patrol not started");
            return;
        };

        info!("Spawned at {}", origin);
        info!(
            "Starting circular patrol: {} rounds clockwise, then {} counter-clockwise, repeating",
            self.patrol_config.rounds_per_direction, self.patrol_config.rounds_per_direction
        );
        self.controller.start(session, origin, self.patrol_config);
        self.state = BotState::Patrolling;
    }

    /// Post-respawn position check. The origin is re-captured from wherever
    /// the server respawned the bot; if no position exists yet (still dead,
    /// or the session dropped meanwhile) nothing happens.
    fn restart_patrol(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };
        let Some(origin) = session.position() else {
            return;
        };
        info!("Respawned, restarting patrol at {}", origin);
        self.controller.start(session, origin, self.patrol_config);
        self.state = BotState::Patrolling;
    }

    /// Uniform handling of kick, transport end and transport error. The
    /// dying session's channel is kept until the next connect so trailing
    /// events (an `End` right after a `Kicked`) still reach the state
    /// machine and replace the pending reconnect rather than stacking one.
    fn on_connection_lost(&mut self) {
        self.status.set(ConnectionStatus::Disconnected);
        self.controller.stop();
        if let Some(handle) = self.respawn_check.take() {
            handle.abort();
        }
        self.schedule_reconnect();
    }

    // -----------------------------------------------------------------------
    // Timers (cancel before replace)
    // -----------------------------------------------------------------------

    fn schedule_reconnect(&mut self) {
        if let Some(handle) = self.reconnect.take() {
            handle.abort();
        }

        info!("Reconnecting in {} seconds", RECONNECT_DELAY.as_secs());
        let tx = self.cmd_tx.clone();
        self.reconnect = Some(tokio::spawn(async move {
            tokio::time::sleep(RECONNECT_DELAY).await;
            let _ = tx.send(Command::Reconnect);
        }));
        self.state = BotState::Reconnecting;
    }

    fn schedule_respawn_check(&mut self) {
        if let Some(handle) = self.respawn_check.take() {
            handle.abort();
        }

        let tx = self.cmd_tx.clone();
        self.respawn_check = Some(tokio::spawn(async move {
            tokio::time::sleep(RESPAWN_CHECK_DELAY).await;
            let _ = tx.send(Command::RestartPatrol);
        }));
    }

    // -----------------------------------------------------------------------
    // Run loop
    // -----------------------------------------------------------------------

    /// Connect and run until ctrl-c.
    ///
    /// A closed event channel (backend task dropped its sender without
    /// saying goodbye) is treated as an `End` event.
    pub async fn run(mut self) -> Result<()> {
        self.connect();

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            let turn = tokio::select! {
                Some(command) = self.cmd_rx.recv() => Turn::Command(command),
                event = next_event(&mut self.events) => Turn::Event(event),
                _ = &mut shutdown => Turn::Shutdown,
            };

            match turn {
                Turn::Command(command) => self.handle_command(command),
                Turn::Event(Some(event)) => self.handle_event(event),
                Turn::Event(None) => {
                    self.events = None;
                    self.handle_event(SessionEvent::End);
                }
                Turn::Shutdown => {
                    info!("Shutting down (SIGINT)");
                    break;
                }
            }
        }

        self.controller.stop();
        self.status.set(ConnectionStatus::Disconnected);
        Ok(())
    }
}

enum Turn {
    Command(Command),
    Event(Option<SessionEvent>),
    Shutdown,
}

/// Receive from the session event channel, or park forever while no
/// session exists (the select loop then only sees commands and ctrl-c).
async fn next_event(
    events: &mut Option<UnboundedReceiver<SessionEvent>>,
) -> Option<SessionEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
