//! Track environment for continuous-control training.

pub mod racecar;
pub mod track;

pub use racecar::{RacecarEnv, MAX_EPISODE_STEPS, SPEED_MULTIPLIER, STEERING_MULTIPLIER};
pub use track::{Track, TrackLayout};

/// Outcome of one environment step.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub obs: Vec<f32>,
    pub reward: f32,
    /// True terminal state (collision); cuts the TD bootstrap.
    pub terminal: bool,
    /// Time-limit cutoff; the bootstrap is kept.
    pub truncated: bool,
}

impl StepResult {
    pub fn done(&self) -> bool {
        self.terminal || self.truncated
    }
}

/// A single continuous-action environment.
pub trait Environment: Send {
    fn obs_size(&self) -> usize;

    fn action_dim(&self) -> usize;

    /// Per-dimension lower action bounds.
    fn action_low(&self) -> Vec<f32>;

    /// Per-dimension upper action bounds.
    fn action_high(&self) -> Vec<f32>;

    /// Reset to the start state and return the initial observation.
    fn reset(&mut self) -> Vec<f32>;

    /// Apply one action, already scaled to the environment's bounds.
    fn step(&mut self, action: &[f32]) -> StepResult;
}
