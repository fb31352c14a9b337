//! Game-protocol seam: session contract and lifecycle events.
//!
//! The wire protocol is an external collaborator. Anything that can expose a
//! live position, accept control-state and look signals, and emit lifecycle
//! events can drive the bot through these two traits.
//!
//! ## Event contract (session → supervisor)
//!
//! | Event      | Meaning                                      |
//! |------------|----------------------------------------------|
//! | `Login`    | Session authenticated; no world position yet |
//! | `Spawn`    | Bot placed in the world; position is live    |
//! | `Death`    | Bot died; position returns after respawn     |
//! | `Kicked`   | Server closed the session with a reason      |
//! | `End`      | Transport closed without a reason            |
//! | `Error`    | Transport-level failure                      |
//!
//! ## Design rules
//!
//! 1. `connect` returns immediately; backends do their IO in background
//!    tasks and report progress through the event channel, so a connect
//!    failure after the handshake starts arrives as `Error` or `End`.
//! 2. Control signals are fire-and-forget. Backends must tolerate signals
//!    sent while the session is tearing down.
//! 3. Events for one session are delivered in the order the underlying
//!    connection produced them.

use crate::types::{BotError, Vec3};
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Server configuration
// ---------------------------------------------------------------------------

/// Where and as whom to join the game server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Display name the bot joins under.
    pub username: String,
    /// Game protocol version string, e.g. `"1.21.10"`.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 25565,
            username: "KEEPER".into(),
            version: "1.21.10".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle events
// ---------------------------------------------------------------------------

/// Lifecycle events emitted by a live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Login,
    Spawn,
    Death,
    Kicked(String),
    End,
    Error(String),
}

// ---------------------------------------------------------------------------
// Control signals
// ---------------------------------------------------------------------------

/// Movement-intent controls the bot can hold down or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Forward,
    Sprint,
    Jump,
}

// ---------------------------------------------------------------------------
// Session & connector traits
// ---------------------------------------------------------------------------

/// A live connected representation of the bot inside the remote world.
pub trait GameSession: Send + Sync {
    /// Current position, or `None` while no entity exists (before spawn,
    /// during respawn).
    fn position(&self) -> Option<Vec3>;

    /// Whether the bot is currently standing on the ground.
    fn on_ground(&self) -> bool;

    /// Hold down or release a movement control.
    fn set_control(&self, control: Control, active: bool);

    /// Point the bot's head. Yaw 0 faces negative Z; `force` snaps instead
    /// of interpolating.
    fn look(&self, yaw: f64, pitch: f64, force: bool);
}

/// Creates sessions against a configured server.
///
/// The crate ships [`LoopbackConnector`](crate::loopback::LoopbackConnector)
/// for local runs and tests; a real server backend implements the same trait
/// on top of the wire protocol library.
pub trait Connector: Send + Sync {
    /// Open a new session. The handshake runs in the background; failures
    /// after this call returns are reported through the event channel.
    fn connect(
        &self,
        config: &ServerConfig,
    ) -> Result<(Arc<dyn GameSession>, mpsc::UnboundedReceiver<SessionEvent>), BotError>;
}
