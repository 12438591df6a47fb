//! A scripted runner standing in for a human player.

use rand::Rng;

/// Starting speed of a run (units per second).
pub const INIT_SPEED: f64 = 13.0;

/// Speed cap.
pub const MAX_SPEED: f64 = 42.0;

/// Speed gained per second of running.
pub const SPEED_ACCEL: f64 = 0.20;

/// Average number of collisions per second of running.
pub const COLLISION_RATE: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunnerStep {
    pub points: u64,
    pub collided: bool,
}

pub struct SimulatedRunner {
    speed: f64,
    /// Fractional score not yet reported.
    carry: f64,
    collision_rate: f64,
}

impl SimulatedRunner {
    pub fn new(collision_rate: f64) -> Self {
        Self {
            speed: INIT_SPEED,
            carry: 0.0,
            collision_rate,
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Run for `dt` seconds: accelerate, accrue score, maybe hit something.
    pub fn step(&mut self, dt: f64) -> RunnerStep {
        self.speed = (self.speed + SPEED_ACCEL * dt).min(MAX_SPEED);
        self.carry += self.speed * dt * 2.0;
        let points = self.carry.floor();
        self.carry -= points;

        let chance = (self.collision_rate * dt).clamp(0.0, 1.0);
        RunnerStep {
            points: points as u64,
            collided: rand::rng().random_bool(chance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_follows_speed() {
        let mut runner = SimulatedRunner::new(0.0);
        let step = runner.step(1.0);
        // (13 + 0.2) * 1 * 2
        assert_eq!(step.points, 26);
        assert!(!step.collided);
    }

    #[test]
    fn test_speed_is_capped() {
        let mut runner = SimulatedRunner::new(0.0);
        for _ in 0..1000 {
            runner.step(1.0);
        }
        assert_eq!(runner.speed(), MAX_SPEED);
    }

    #[test]
    fn test_certain_collision() {
        let mut runner = SimulatedRunner::new(1000.0);
        assert!(runner.step(0.05).collided);
    }
}
