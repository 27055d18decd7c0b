//! # racecar_rl: Soft Actor-Critic on a 2D track
//!
//! SAC trainer for a kinematic car on a walled track. The agent reads seven
//! distance sensors plus a heading-error signal from the track's direction
//! field and outputs continuous throttle and steering.
//!
//! ## Layout
//!
//! - [`sac`]: the algorithm: losses, replay, temperature, the update step
//! - [`env`]: track geometry and the car environment
//! - [`models`]: concrete actor and twin-critic MLPs
//! - [`runner`]: the single-process training loop
//! - [`core`]: transitions and target-network maintenance
//! - [`checkpoint`] / [`metrics`]: persistence and logging
//!
//! ## Usage
//!
//! ```rust,ignore
//! use racecar_rl::env::{Environment, RacecarEnv, TrackLayout};
//! use racecar_rl::models::{ActorNet, CriticNet};
//! use racecar_rl::runner::SACRunner;
//! use racecar_rl::sac::SACConfig;
//!
//! let config = SACConfig::racecar().with_max_env_steps(500_000);
//! let env = RacecarEnv::new(TrackLayout::Map1);
//!
//! let actor = ActorNet::new(env.obs_size(), env.action_dim(), &config.hidden_sizes, &device);
//! let critic = CriticNet::new(env.obs_size(), env.action_dim(), &config.hidden_sizes, &device);
//!
//! let runner: SACRunner<B> = SACRunner::new(config, device);
//! let (actor, critic) = runner.run(actor, critic, env, &mut logger, None)?;
//! ```

pub mod algorithms;
pub mod checkpoint;
pub mod core;
pub mod env;
pub mod metrics;
pub mod models;
pub mod nn;
pub mod runner;
pub mod sac;

pub use checkpoint::{CheckpointError, Checkpointer, CheckpointerConfig};
pub use crate::core::{TargetNetworkConfig, TargetNetworkManager, Transition};
pub use env::{Environment, RacecarEnv, StepResult, TrackLayout};
pub use metrics::{ConsoleLogger, CsvLogger, MetricsLogger, MultiLogger, TrainingSnapshot};
pub use models::{ActorNet, CriticNet};
pub use runner::{evaluate_policy, SACRunner};
pub use sac::{ReplayBuffer, SACConfig, SACLearner, SACStats, UpdateStats};

/// Seed every RNG a training run draws from: `fastrand` covers replay
/// sampling and warmup actions, the backend RNG covers weight initialization
/// and policy noise.
pub fn set_seed<B: burn::tensor::backend::Backend>(seed: u64) {
    fastrand::seed(seed);
    B::seed(seed);
}
