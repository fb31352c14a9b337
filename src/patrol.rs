//! Patrol path math: circle sampling, round bookkeeping, direction flips.

use crate::types::{Direction, PatrolConfig, PatrolStats, Vec3};
use log::info;

// ---------------------------------------------------------------------------
// Step result
// ---------------------------------------------------------------------------

/// Output of a single [`Patrol::advance`] call.
///
/// Callers (typically [`MotionController`](crate::controller::MotionController))
/// turn this into look/move signals on the session.
#[derive(Debug, Clone, Copy)]
pub struct Step {
    /// Next point on the circle. Y is carried over from the origin; the
    /// vertical axis is not patrolled.
    pub target: Vec3,
    /// Facing toward `target` from the live position, in the game's yaw
    /// convention (yaw 0 faces negative Z).
    pub yaw: f64,
    /// Whether this tick asks for a cosmetic jump pulse.
    pub jump: bool,
}

// ---------------------------------------------------------------------------
// Patrol
// ---------------------------------------------------------------------------

/// Walks the circle around a fixed origin, one angular step per motion tick.
///
/// Pure bookkeeping: no timers, no IO. A fresh instance always starts at
/// angle 0, clockwise, zero rounds.
pub struct Patrol {
    origin: Vec3,
    config: PatrolConfig,
    angle: f64,
    direction: Direction,
    rounds_in_direction: u32,
    total_rotations: u64,
    rng: fastrand::Rng,
}

impl Patrol {
    pub fn new(origin: Vec3, config: PatrolConfig) -> Self {
        Self {
            origin,
            config,
            angle: 0.0,
            direction: Direction::Clockwise,
            rounds_in_direction: 0,
            total_rotations: 0,
            rng: fastrand::Rng::with_seed(config.rng_seed),
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn stats(&self) -> PatrolStats {
        PatrolStats {
            rounds_in_direction: self.rounds_in_direction,
            total_rotations: self.total_rotations,
            direction: self.direction,
        }
    }

    /// Advance one motion tick from the bot's live position.
    ///
    /// The angle accumulates by `angular_speed` per tick and resets to
    /// exactly 0 once its magnitude reaches a full turn; the overshoot past
    /// 2π is discarded, so every round starts at phase 0. Direction flips
    /// only at round boundaries, never mid-tick.
    pub fn advance(&mut self, current: Vec3) -> Step {
        self.angle += self.config.angular_speed * self.direction.signum();

        if self.angle.abs() >= std::f64::consts::TAU {
            self.total_rotations += 1;
            self.rounds_in_direction += 1;
            self.angle = 0.0;

            info!(
                "Completed round {} ({}). Total rotations: {}",
                self.rounds_in_direction, self.direction, self.total_rotations
            );

            if self.rounds_in_direction >= self.config.rounds_per_direction {
                self.direction = self.direction.flipped();
                self.rounds_in_direction = 0;
                info!("Switching direction to {}", self.direction);
            }
        }

        let target = Vec3::new(
            self.origin.x + self.angle.cos() * self.config.radius,
            self.origin.y,
            self.origin.z + self.angle.sin() * self.config.radius,
        );

        // Yaw 0 faces -Z, increasing toward -X, hence the negated deltas.
        let yaw = f64::atan2(-(target.x - current.x), -(target.z - current.z));

        Step {
            target,
            yaw,
            jump: self.rng.f64() < self.config.jump_chance,
        }
    }
}
