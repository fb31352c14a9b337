//! Core bot types shared across all modules.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

/// World-space coordinate. The game protocol carries doubles, so `f64`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Horizontal (XZ-plane) distance to `other`. The patrol never leaves
    /// its Y level, so vertical separation is ignored.
    pub fn horizontal_distance(&self, other: &Vec3) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Connection status
// ---------------------------------------------------------------------------

/// Process-wide connection status as seen by the health endpoint.
///
/// Written only by the [`BotSupervisor`](crate::lifecycle::BotSupervisor) in
/// response to session lifecycle events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

/// Shared handle to the current [`ConnectionStatus`].
///
/// Cloned into the health server; the supervisor keeps the writing side.
#[derive(Clone)]
pub struct StatusHandle(Arc<RwLock<ConnectionStatus>>);

impl StatusHandle {
    pub fn new() -> Self {
        Self(Arc::new(RwLock::new(ConnectionStatus::Disconnected)))
    }

    pub fn get(&self) -> ConnectionStatus {
        *self.0.read()
    }

    pub fn set(&self, status: ConnectionStatus) {
        *self.0.write() = status;
    }
}

impl Default for StatusHandle {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Patrol configuration & stats
// ---------------------------------------------------------------------------

/// Direction of travel around the patrol circle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    /// Sign applied to the angular step: `+1` clockwise, `-1` counter-clockwise.
    pub fn signum(&self) -> f64 {
        match self {
            Direction::Clockwise => 1.0,
            Direction::CounterClockwise => -1.0,
        }
    }

    pub fn flipped(&self) -> Direction {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Clockwise => write!(f, "clockwise"),
            Direction::CounterClockwise => write!(f, "counter-clockwise"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PatrolConfig {
    /// Radius of the patrol circle in world units.
    pub radius: f64,
    /// Angular advance per motion tick, in radians.
    pub angular_speed: f64,
    /// Full rotations walked before the direction flips.
    pub rounds_per_direction: u32,
    /// Cadence of the motion tick.
    pub tick_period: Duration,
    /// Cadence of the grounded-jump check.
    pub jump_check_period: Duration,
    /// How long a jump pulse holds the control down.
    pub jump_hold: Duration,
    /// Per-motion-tick probability of a cosmetic jump.
    pub jump_chance: f64,
    /// Seed for the jump-jitter RNG.
    pub rng_seed: u64,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            radius: 5.0,
            angular_speed: 0.05,
            rounds_per_direction: 2,
            tick_period: Duration::from_millis(100),
            jump_check_period: Duration::from_millis(1000),
            jump_hold: Duration::from_millis(100),
            jump_chance: 0.1,
            rng_seed: 0,
        }
    }
}

/// Progress counters for the running patrol.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PatrolStats {
    /// Rounds completed in the current direction.
    pub rounds_in_direction: u32,
    /// Full rotations completed since the patrol started.
    pub total_rotations: u64,
    pub direction: Direction,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by a [`Connector`](crate::adapter::Connector).
///
/// Connection loss after a successful connect is not an error; it arrives
/// as a [`SessionEvent`](crate::adapter::SessionEvent) and feeds the
/// reconnect policy.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("failed to reach {host}:{port}: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },
}
