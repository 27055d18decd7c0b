//! SAC configuration and training statistics.

use serde::{Deserialize, Serialize};

/// Hyperparameters for the SAC trainer.
///
/// `SACConfig::continuous()` carries the SAC-paper defaults;
/// `SACConfig::racecar()` is tuned for the track environment.
/// The full config is serialized into the run directory so every
/// training run records the exact settings it used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SACConfig {
    // Replay buffer
    /// Maximum transitions to store in the replay buffer.
    pub buffer_capacity: usize,
    /// Batch size for gradient updates.
    pub batch_size: usize,
    /// Minimum buffer fill before training starts.
    pub min_buffer_size: usize,

    // Core hyperparameters
    /// Discount factor.
    pub gamma: f32,
    /// Polyak coefficient for soft target updates; 1.0 means hard copy.
    pub tau: f32,
    /// Actor learning rate.
    pub actor_lr: f64,
    /// Critic learning rate.
    pub critic_lr: f64,
    /// Temperature learning rate.
    pub alpha_lr: f64,

    // Entropy
    /// Learn alpha online; when false, alpha stays at `initial_alpha`.
    pub auto_entropy_tuning: bool,
    /// Starting temperature.
    pub initial_alpha: f32,
    /// Explicit target entropy; None computes -dim(A).
    pub target_entropy: Option<f32>,

    // Update cadence
    /// Gradient updates happen every this many environment steps.
    pub update_interval: usize,
    /// Target networks sync every this many gradient updates.
    pub target_update_interval: usize,
    /// Hard copy instead of Polyak interpolation.
    pub hard_target_update: bool,

    // Networks
    /// Hidden layer widths for actor and critics.
    pub hidden_sizes: Vec<usize>,

    // Training loop
    /// Maximum gradient norm; None disables clipping.
    pub max_grad_norm: Option<f32>,
    /// Total environment steps to run.
    pub max_env_steps: usize,
    /// Stop early once the rolling mean return reaches this.
    pub target_reward: Option<f32>,
    /// Console log cadence in environment steps.
    pub log_interval: usize,
    /// Checkpoint cadence in environment steps; 0 disables.
    pub checkpoint_interval: usize,
}

impl Default for SACConfig {
    fn default() -> Self {
        Self::continuous()
    }
}

impl SACConfig {
    /// SAC-paper defaults for continuous control (Haarnoja et al., 2018).
    pub fn continuous() -> Self {
        Self {
            buffer_capacity: 1_000_000,
            batch_size: 256,
            min_buffer_size: 5_000,

            gamma: 0.99,
            tau: 0.005,
            actor_lr: 3e-4,
            critic_lr: 3e-4,
            alpha_lr: 3e-4,

            auto_entropy_tuning: true,
            initial_alpha: 0.2,
            target_entropy: None,

            update_interval: 1,
            target_update_interval: 1,
            hard_target_update: false,

            hidden_sizes: vec![256, 256],

            max_grad_norm: None,
            max_env_steps: 1_000_000,
            target_reward: None,
            log_interval: 1_000,
            checkpoint_interval: 50_000,
        }
    }

    /// Settings tuned for the racecar track task.
    ///
    /// Short horizons dominate the reward signal there, hence the low gamma;
    /// alpha starts at 1.0 and anneals itself via auto tuning.
    pub fn racecar() -> Self {
        Self {
            buffer_capacity: 100_000,
            batch_size: 256,
            min_buffer_size: 256,

            gamma: 0.5,
            tau: 0.05,
            actor_lr: 1e-4,
            critic_lr: 1e-4,
            alpha_lr: 1e-4,

            auto_entropy_tuning: true,
            initial_alpha: 1.0,
            target_entropy: None,

            update_interval: 1,
            target_update_interval: 2,
            hard_target_update: false,

            hidden_sizes: vec![256, 256],

            max_grad_norm: None,
            max_env_steps: 1_000_000,
            target_reward: None,
            log_interval: 1_000,
            checkpoint_interval: 50_000,
        }
    }

    /// Target entropy for a continuous action space: explicit override or -dim(A).
    pub fn compute_target_entropy(&self, action_dim: usize) -> f32 {
        self.target_entropy
            .unwrap_or_else(|| -(action_dim as f32))
    }

    // Builder methods

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_min_buffer_size(mut self, min_size: usize) -> Self {
        self.min_buffer_size = min_size;
        self
    }

    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_tau(mut self, tau: f32) -> Self {
        self.tau = tau;
        self
    }

    /// Set the same learning rate for actor, critic, and temperature.
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.actor_lr = lr;
        self.critic_lr = lr;
        self.alpha_lr = lr;
        self
    }

    pub fn with_actor_lr(mut self, lr: f64) -> Self {
        self.actor_lr = lr;
        self
    }

    pub fn with_critic_lr(mut self, lr: f64) -> Self {
        self.critic_lr = lr;
        self
    }

    pub fn with_alpha_lr(mut self, lr: f64) -> Self {
        self.alpha_lr = lr;
        self
    }

    pub fn with_auto_entropy_tuning(mut self, enabled: bool) -> Self {
        self.auto_entropy_tuning = enabled;
        self
    }

    pub fn with_initial_alpha(mut self, alpha: f32) -> Self {
        self.initial_alpha = alpha;
        self
    }

    pub fn with_target_entropy(mut self, target: f32) -> Self {
        self.target_entropy = Some(target);
        self
    }

    pub fn with_update_interval(mut self, interval: usize) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn with_target_update_interval(mut self, interval: usize) -> Self {
        self.target_update_interval = interval;
        self
    }

    pub fn with_hard_target_update(mut self, hard: bool) -> Self {
        self.hard_target_update = hard;
        self
    }

    pub fn with_hidden_sizes(mut self, sizes: Vec<usize>) -> Self {
        self.hidden_sizes = sizes;
        self
    }

    pub fn with_max_grad_norm(mut self, norm: f32) -> Self {
        self.max_grad_norm = Some(norm);
        self
    }

    pub fn with_max_env_steps(mut self, steps: usize) -> Self {
        self.max_env_steps = steps;
        self
    }

    pub fn with_target_reward(mut self, reward: f32) -> Self {
        self.target_reward = Some(reward);
        self
    }

    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval;
        self
    }

    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = interval;
        self
    }
}

/// Rolling training statistics, updated by the runner.
#[derive(Debug, Clone, Default)]
pub struct SACStats {
    /// Total environment steps.
    pub env_steps: usize,
    /// Total gradient updates.
    pub train_steps: usize,
    /// Episodes completed.
    pub episodes: usize,
    /// Recent episode returns, capped window.
    pub recent_returns: Vec<f32>,
    /// Mean over `recent_returns`.
    pub mean_return: f32,
    /// Current temperature.
    pub alpha: f32,
    pub actor_loss: f32,
    pub critic_loss: f32,
    pub alpha_loss: f32,
    /// Replay fill fraction.
    pub buffer_utilization: f32,
    /// Environment steps per second.
    pub sps: f32,
    pub elapsed_secs: f32,
}

impl SACStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_episode_return(&mut self, return_val: f32, max_recent: usize) {
        self.recent_returns.push(return_val);
        if self.recent_returns.len() > max_recent {
            self.recent_returns.remove(0);
        }
        self.update_mean_return();
    }

    pub fn update_mean_return(&mut self) {
        if !self.recent_returns.is_empty() {
            self.mean_return =
                self.recent_returns.iter().sum::<f32>() / self.recent_returns.len() as f32;
        }
    }

    pub fn format(&self) -> String {
        format!(
            "steps={} | episodes={} | return={:.1} | alpha={:.3} | actor_loss={:.3} | critic_loss={:.3} | sps={:.0}",
            self.env_steps,
            self.episodes,
            self.mean_return,
            self.alpha,
            self.actor_loss,
            self.critic_loss,
            self.sps
        )
    }
}
