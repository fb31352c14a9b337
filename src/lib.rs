//! Keeper Bot
//!
//! A Minecraft presence bot that walks a circular patrol around its spawn
//! point, reverses direction every few rounds, exposes a liveness HTTP
//! endpoint, and reconnects forever on disconnect.
//!
//! ## Architecture
//!
//! ```text
//! BotSupervisor  (lifecycle.rs)  ← session state machine, reconnect policy
//!   └── MotionController (controller.rs) ← motion / jump-check tick tasks
//!         └── Patrol  (patrol.rs)        ← circle math, round bookkeeping
//! HealthServer   (health.rs)     ← GET /health liveness endpoint
//! GameSession / Connector (adapter.rs) ← protocol seam
//!   └── LoopbackConnector (loopback.rs) ← in-process flat-world backend
//! ```
//!
//! The wire protocol is deliberately out of tree: `BotSupervisor` drives any
//! backend implementing the [`adapter`] traits. The shipped loopback backend
//! serves local runs and the integration tests.

pub mod adapter;
pub mod controller;
pub mod health;
pub mod lifecycle;
pub mod loopback;
pub mod patrol;
pub mod types;

// Convenience re-exports
pub use adapter::{Connector, Control, GameSession, ServerConfig, SessionEvent};
pub use controller::MotionController;
pub use health::{HealthBody, HealthState};
pub use lifecycle::{BotState, BotSupervisor, Command};
pub use loopback::{LoopbackConnector, LoopbackSession};
pub use patrol::{Patrol, Step};
pub use types::{
    BotError, ConnectionStatus, Direction, PatrolConfig, PatrolStats, StatusHandle, Vec3,
};
