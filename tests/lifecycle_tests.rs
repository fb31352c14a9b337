//! Supervisor state machine tests (paused tokio clock)

#[cfg(test)]
mod tests {
    use keeper_bot::adapter::{Connector, GameSession, ServerConfig, SessionEvent};
    use keeper_bot::types::{BotError, ConnectionStatus, PatrolConfig, StatusHandle, Vec3};
    use keeper_bot::{BotState, BotSupervisor, LoopbackConnector};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::sleep;

    const SPAWN: Vec3 = Vec3 {
        x: 10.0,
        y: 64.0,
        z: 20.0,
    };

    fn make_supervisor() -> (BotSupervisor, Arc<LoopbackConnector>, StatusHandle) {
        let connector = Arc::new(LoopbackConnector::new(SPAWN));
        let status = StatusHandle::new();
        let config = PatrolConfig {
            jump_chance: 0.0,
            ..Default::default()
        };
        let supervisor = BotSupervisor::new(
            connector.clone(),
            ServerConfig::default(),
            config,
            status.clone(),
        );
        (supervisor, connector, status)
    }

    // -----------------------------------------------------------------------
    // Happy path
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn connect_login_spawn_starts_the_patrol() {
        let (mut supervisor, connector, status) = make_supervisor();
        assert_eq!(status.get(), ConnectionStatus::Disconnected);

        supervisor.connect();
        supervisor.pump();

        assert_eq!(supervisor.state(), BotState::Patrolling);
        assert_eq!(status.get(), ConnectionStatus::Connected);
        assert!(supervisor.patrolling());
        assert_eq!(connector.connects(), 1);

        // the patrol visibly moves the session
        sleep(Duration::from_secs(2)).await;
        let session = connector.session().unwrap();
        let position = session.position().expect("spawned");
        assert!(position.horizontal_distance(&SPAWN) > 0.5);
        assert!(session.look_calls() > 10);
    }

    // -----------------------------------------------------------------------
    // Reconnect policy
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn kick_stops_patrol_and_schedules_one_reconnect() {
        let (mut supervisor, connector, status) = make_supervisor();
        supervisor.connect();
        supervisor.pump();

        connector.inject(SessionEvent::Kicked("banned".into()));
        supervisor.pump();

        assert_eq!(status.get(), ConnectionStatus::Disconnected);
        assert!(!supervisor.patrolling());
        assert_eq!(supervisor.state(), BotState::Reconnecting);
        assert!(supervisor.reconnect_pending());

        // a trailing transport event replaces the pending timer, never stacks
        connector.inject(SessionEvent::Error("read error".into()));
        supervisor.pump();
        assert!(supervisor.reconnect_pending());
        assert_eq!(connector.connects(), 1);

        // after the fixed delay exactly one fresh connect happens
        sleep(Duration::from_millis(5100)).await;
        supervisor.pump();
        assert_eq!(connector.connects(), 2);
        assert_eq!(supervisor.state(), BotState::Patrolling);
        assert_eq!(status.get(), ConnectionStatus::Connected);

        // and nothing else is queued behind it
        sleep(Duration::from_secs(6)).await;
        supervisor.pump();
        assert_eq!(connector.connects(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_end_follows_the_same_path_as_kick() {
        let (mut supervisor, connector, status) = make_supervisor();
        supervisor.connect();
        supervisor.pump();

        connector.inject(SessionEvent::End);
        supervisor.pump();

        assert_eq!(status.get(), ConnectionStatus::Disconnected);
        assert!(supervisor.reconnect_pending());

        sleep(Duration::from_millis(5100)).await;
        supervisor.pump();
        assert_eq!(connector.connects(), 2);
    }

    // -----------------------------------------------------------------------
    // Connector failure
    // -----------------------------------------------------------------------

    struct FailingConnector {
        attempts: AtomicU64,
    }

    impl Connector for FailingConnector {
        fn connect(
            &self,
            config: &ServerConfig,
        ) -> Result<
            (
                Arc<dyn GameSession>,
                mpsc::UnboundedReceiver<SessionEvent>,
            ),
            BotError,
        > {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(BotError::Connect {
                host: config.host.clone(),
                port: config.port,
                reason: "connection refused".into(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn connect_failure_retries_forever() {
        let connector = Arc::new(FailingConnector {
            attempts: AtomicU64::new(0),
        });
        let status = StatusHandle::new();
        let mut supervisor = BotSupervisor::new(
            connector.clone(),
            ServerConfig::default(),
            PatrolConfig::default(),
            status.clone(),
        );

        supervisor.connect();
        assert_eq!(status.get(), ConnectionStatus::Disconnected);
        assert_eq!(supervisor.state(), BotState::Reconnecting);
        assert!(supervisor.reconnect_pending());
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);

        for attempt in 2..=4u64 {
            sleep(Duration::from_millis(5100)).await;
            supervisor.pump();
            assert_eq!(connector.attempts.load(Ordering::SeqCst), attempt);
            assert!(supervisor.reconnect_pending(), "retry chain broke");
        }
    }

    // -----------------------------------------------------------------------
    // Death & respawn
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn death_recaptures_origin_and_restarts_patrol() {
        let (mut supervisor, connector, status) = make_supervisor();
        supervisor.connect();
        supervisor.pump();
        let session = connector.session().unwrap();

        connector.inject(SessionEvent::Death);
        session.set_spawned(false);
        supervisor.pump();

        assert!(!supervisor.patrolling());
        // death is an in-session gap, not a disconnect
        assert_eq!(status.get(), ConnectionStatus::Connected);
        assert_eq!(supervisor.state(), BotState::Patrolling);

        // the server respawns the bot somewhere else before the check fires
        sleep(Duration::from_millis(2100)).await;
        session.set_spawned(true);
        session.set_position(Vec3::new(100.0, 64.0, -40.0));
        supervisor.pump();

        assert!(supervisor.patrolling());
        let stats = supervisor.patrol_stats().expect("patrol restarted");
        assert_eq!(stats.total_rotations, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn respawn_check_without_position_does_nothing() {
        let (mut supervisor, connector, _status) = make_supervisor();
        supervisor.connect();
        supervisor.pump();
        let session = connector.session().unwrap();

        connector.inject(SessionEvent::Death);
        session.set_spawned(false);
        supervisor.pump();

        sleep(Duration::from_millis(2100)).await;
        supervisor.pump();
        assert!(!supervisor.patrolling(), "patrol restarted without a position");
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_during_death_gap_cancels_the_respawn_check() {
        let (mut supervisor, connector, _status) = make_supervisor();
        supervisor.connect();
        supervisor.pump();

        connector.inject(SessionEvent::Death);
        supervisor.pump();
        connector.inject(SessionEvent::Kicked("server restart".into()));
        supervisor.pump();

        // past the respawn delay, before the reconnect delay
        sleep(Duration::from_millis(2500)).await;
        supervisor.pump();
        assert!(!supervisor.patrolling(), "respawn check fired after disconnect");

        // the reconnect still goes through
        sleep(Duration::from_millis(3000)).await;
        supervisor.pump();
        assert_eq!(connector.connects(), 2);
        assert!(supervisor.patrolling());
    }
}
