//! keeper-bot binary
//!
//! Starts the health endpoint and runs the patrol supervisor until ctrl-c.
//!
//! ## Configuration (environment, read once at startup)
//!
//! | Key                      | Default     | Description                  |
//! |--------------------------|-------------|------------------------------|
//! | `MINECRAFT_SERVER_HOST`  | `localhost` | Game server hostname         |
//! | `MINECRAFT_SERVER_PORT`  | `25565`     | Game server port             |
//! | `MINECRAFT_BOT_USERNAME` | `KEEPER`    | Bot display name             |
//! | `MINECRAFT_VERSION`      | `1.21.10`   | Protocol version string      |
//! | `PORT`                   | `3000`      | Health endpoint listen port  |
//! | `LOG_LEVEL`              | `info`      | Crate log verbosity          |
//!
//! The wire backend is pluggable behind [`keeper_bot::Connector`]; this
//! binary wires the in-process loopback backend, so it runs against a flat
//! demo world out of the box. A server backend slots in at the marked line.

use anyhow::Result;
use clap::Parser;
use keeper_bot::{
    health::{self, HealthState},
    BotSupervisor, Connector, LoopbackConnector, PatrolConfig, ServerConfig, StatusHandle, Vec3,
};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "keeper-bot", about = "Minecraft presence bot", version)]
struct Args {
    /// Game server hostname
    #[arg(long, env = "MINECRAFT_SERVER_HOST", default_value = "localhost")]
    host: String,

    /// Game server port
    #[arg(long, env = "MINECRAFT_SERVER_PORT", default_value_t = 25565)]
    port: u16,

    /// Bot display name
    #[arg(long, env = "MINECRAFT_BOT_USERNAME", default_value = "KEEPER")]
    username: String,

    /// Game protocol version
    #[arg(long, env = "MINECRAFT_VERSION", default_value = "1.21.10")]
    version: String,

    /// Health endpoint listen port
    #[arg(long, env = "PORT", default_value_t = 3000)]
    http_port: u16,

    /// Log verbosity for the keeper_bot crate
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

// Single-threaded by design: all work is short timer-driven callbacks, so
// one worker removes any tick/stop ordering races.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("keeper_bot={}", args.log_level).parse()?),
        )
        .init();

    let server = ServerConfig {
        host: args.host,
        port: args.port,
        username: args.username.clone(),
        version: args.version,
    };

    log::info!(
        "Starting keeper-bot (server={}:{}, user='{}', health port={})",
        server.host,
        server.port,
        server.username,
        args.http_port,
    );

    let status = StatusHandle::new();

    // Health endpoint runs for the life of the process, independent of the
    // connection state.
    let health_state = HealthState::new(status.clone(), args.username);
    tokio::spawn(async move {
        if let Err(e) = health::serve(args.http_port, health_state).await {
            log::error!("Health server exited: {}", e);
        }
    });

    // Swap in a wire-protocol backend here to join a real server.
    let connector: Arc<dyn Connector> = Arc::new(LoopbackConnector::new(Vec3::new(0.0, 64.0, 0.0)));

    BotSupervisor::new(connector, server, PatrolConfig::default(), status)
        .run()
        .await
}
