//! Single-process training loop.
//!
//! The runner owns the interaction loop: it steps the environment with the
//! non-autodiff copy of the actor, feeds transitions into the replay
//! buffer, and drives [`SACLearner`] updates at the configured cadence.
//! Until the buffer reaches its minimum fill the actions are uniform
//! random, which seeds the replay with broad coverage.

use std::time::Instant;

use burn::grad_clipping::GradientClippingConfig;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::Tensor;

use crate::checkpoint::{CheckpointError, Checkpointer};
use crate::core::Transition;
use crate::env::Environment;
use crate::metrics::{MetricsLogger, TrainingSnapshot};
use crate::sac::{ReplayBuffer, ReplayBufferConfig, SACActor, SACConfig, SACCritic, SACLearner, SACStats};

const RECENT_RETURNS_WINDOW: usize = 20;

/// Map a squashed action in (-1, 1) to the environment's bounds.
fn scale_to_bounds(squashed: &[f32], low: &[f32], high: &[f32]) -> Vec<f32> {
    squashed
        .iter()
        .zip(low.iter().zip(high))
        .map(|(&a, (&l, &h))| a * (h - l) / 2.0 + (h + l) / 2.0)
        .collect()
}

/// One stochastic action from the policy for a single observation.
fn sample_action<B: Backend, A: SACActor<B>>(
    actor: &A,
    obs: &[f32],
    device: &B::Device,
) -> Vec<f32> {
    let obs_t = Tensor::<B, 1>::from_floats(obs, device).reshape([1, obs.len()]);
    let (squashed, _) = actor.forward(obs_t).sample();
    squashed.into_data().iter::<f32>().collect()
}

/// Deterministic (mode) action for a single observation.
fn deterministic_action<B: Backend, A: SACActor<B>>(
    actor: &A,
    obs: &[f32],
    device: &B::Device,
) -> Vec<f32> {
    let obs_t = Tensor::<B, 1>::from_floats(obs, device).reshape([1, obs.len()]);
    let squashed = actor.forward(obs_t).deterministic();
    squashed.into_data().iter::<f32>().collect()
}

/// Run the deterministic policy for a number of episodes and collect the
/// episode returns.
pub fn evaluate_policy<B, A, E>(
    actor: &A,
    env: &mut E,
    episodes: usize,
    device: &B::Device,
) -> Vec<f32>
where
    B: Backend,
    A: SACActor<B>,
    E: Environment,
{
    let low = env.action_low();
    let high = env.action_high();

    let mut returns = Vec::with_capacity(episodes);
    for _ in 0..episodes {
        let mut obs = env.reset();
        let mut episode_return = 0.0;

        loop {
            let squashed = deterministic_action(actor, &obs, device);
            let result = env.step(&scale_to_bounds(&squashed, &low, &high));
            episode_return += result.reward;

            if result.done() {
                break;
            }
            obs = result.obs;
        }
        returns.push(episode_return);
    }
    returns
}

/// Drives SAC training against a single environment.
pub struct SACRunner<B: AutodiffBackend> {
    config: SACConfig,
    device: B::Device,
}

impl<B: AutodiffBackend> SACRunner<B> {
    pub fn new(config: SACConfig, device: B::Device) -> Self {
        Self { config, device }
    }

    pub fn config(&self) -> &SACConfig {
        &self.config
    }

    /// Adam with the shared epsilon, plus norm clipping when configured.
    pub fn create_optimizers<A, C>(&self) -> (impl Optimizer<A, B>, impl Optimizer<C, B>)
    where
        A: AutodiffModule<B>,
        C: AutodiffModule<B>,
    {
        let mut actor_config = AdamConfig::new().with_epsilon(1e-5);
        let mut critic_config = AdamConfig::new().with_epsilon(1e-5);

        if let Some(max_norm) = self.config.max_grad_norm {
            actor_config =
                actor_config.with_grad_clipping(Some(GradientClippingConfig::Norm(max_norm)));
            critic_config =
                critic_config.with_grad_clipping(Some(GradientClippingConfig::Norm(max_norm)));
        }

        (actor_config.init(), critic_config.init())
    }

    /// Train until `max_env_steps` or the target reward, whichever first.
    ///
    /// Returns the trained online actor and critic.
    pub fn run<A, C, E, L>(
        &self,
        actor: A,
        critic: C,
        mut env: E,
        logger: &mut L,
        mut checkpointer: Option<&mut Checkpointer>,
    ) -> Result<(A, C), CheckpointError>
    where
        A: SACActor<B> + AutodiffModule<B>,
        A::InnerModule: SACActor<B::InnerBackend>,
        C: SACCritic<B> + AutodiffModule<B>,
        E: Environment,
        L: MetricsLogger,
    {
        let action_dim = env.action_dim();
        let low = env.action_low();
        let high = env.action_high();

        let buffer = ReplayBuffer::new(ReplayBufferConfig::new(
            self.config.buffer_capacity,
            self.config.min_buffer_size,
            self.config.batch_size,
        ));

        let (actor_optimizer, critic_optimizer) = self.create_optimizers::<A, C>();
        let mut learner = SACLearner::new(
            actor,
            critic,
            actor_optimizer,
            critic_optimizer,
            self.config.clone(),
            self.device.clone(),
        );

        let mut stats = SACStats::new();
        stats.alpha = self.config.initial_alpha;
        let start = Instant::now();

        let mut obs = env.reset();
        let mut episode_return = 0.0;

        for step in 1..=self.config.max_env_steps {
            let squashed = if buffer.is_training_ready() {
                let policy = learner.actor.valid();
                sample_action(&policy, &obs, &self.device)
            } else {
                (0..action_dim).map(|_| fastrand::f32() * 2.0 - 1.0).collect()
            };

            let result = env.step(&scale_to_bounds(&squashed, &low, &high));
            episode_return += result.reward;

            buffer.push(Transition::new(
                obs,
                squashed,
                result.reward,
                result.obs.clone(),
                result.terminal,
                result.truncated,
            ));
            obs = result.obs;

            if result.terminal || result.truncated {
                stats.episodes += 1;
                stats.add_episode_return(episode_return, RECENT_RETURNS_WINDOW);
                episode_return = 0.0;
                obs = env.reset();
            }

            if buffer.is_training_ready() && step % self.config.update_interval == 0 {
                if let Some(batch) = buffer.sample_batch() {
                    let update = learner.update(&batch);
                    stats.train_steps += 1;
                    stats.actor_loss = update.actor_loss;
                    stats.critic_loss = update.critic_loss;
                    stats.alpha_loss = update.alpha_loss;
                    stats.alpha = update.alpha;
                }
            }

            stats.env_steps = step;
            stats.buffer_utilization = buffer.utilization();
            stats.elapsed_secs = start.elapsed().as_secs_f32();
            stats.sps = if stats.elapsed_secs > 0.0 {
                step as f32 / stats.elapsed_secs
            } else {
                0.0
            };

            if step % self.config.log_interval == 0 {
                logger.log(&self.snapshot(&stats));
            }

            if let Some(ckpt) = checkpointer.as_deref_mut() {
                if ckpt.should_save(step) {
                    ckpt.save::<B, A, C>(
                        &learner.actor,
                        &learner.critic,
                        &learner.target_actor,
                        &learner.target_critic,
                        learner.entropy.cached_alpha().ln(),
                        step,
                        Some(stats.mean_return),
                    )?;
                }
            }

            if let Some(target) = self.config.target_reward {
                if !stats.recent_returns.is_empty() && stats.mean_return >= target {
                    break;
                }
            }
        }

        logger.log(&self.snapshot(&stats));
        logger.flush();

        if let Some(ckpt) = checkpointer.as_deref_mut() {
            ckpt.save::<B, A, C>(
                &learner.actor,
                &learner.critic,
                &learner.target_actor,
                &learner.target_critic,
                learner.entropy.cached_alpha().ln(),
                stats.env_steps,
                Some(stats.mean_return),
            )?;
        }

        Ok((learner.actor, learner.critic))
    }

    fn snapshot(&self, stats: &SACStats) -> TrainingSnapshot {
        TrainingSnapshot::new(
            stats.env_steps,
            stats.train_steps,
            stats.episodes,
            stats.mean_return,
        )
        .with_losses(stats.actor_loss, stats.critic_loss, stats.alpha_loss)
        .with_alpha(stats.alpha)
        .with_buffer_utilization(stats.buffer_utilization)
    }
}
