//! Soft Actor-Critic with learned temperature.
//!
//! - `actor` / `critic`: network seams and the twin-Q minimum
//! - `losses`: critic, actor, and TD-target math
//! - `entropy`: log-parameterized temperature with analytic tuning
//! - `buffer`: uniform replay
//! - `update`: the composed gradient step
//! - `config`: hyperparameters and presets

pub mod actor;
pub mod buffer;
pub mod config;
pub mod critic;
pub mod entropy;
pub mod losses;
pub mod update;

pub use actor::{PolicyParams, SACActor};
pub use buffer::{ReplayBuffer, ReplayBufferConfig};
pub use config::{SACConfig, SACStats};
pub use critic::{CriticOutput, SACCritic};
pub use entropy::{target_entropy_continuous, target_entropy_discrete, EntropyTuner};
pub use losses::{actor_loss, critic_loss, td_targets};
pub use update::{batch_to_tensors, BatchTensors, SACLearner, UpdateStats};
