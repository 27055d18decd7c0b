//! The composed SAC gradient step.
//!
//! One call to [`SACLearner::update`] performs, in order:
//! 1. critic update against a bootstrapped target built from the target
//!    actor and target critic,
//! 2. actor update on freshly resampled actions,
//! 3. analytic temperature step,
//! 4. target network sync when the interval is due.
//!
//! Target actor and target critic advance together off a single counter.

use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};

use crate::core::{TargetNetworkManager, Transition};
use crate::sac::config::SACConfig;
use crate::sac::critic::SACCritic;
use crate::sac::entropy::EntropyTuner;
use crate::sac::losses::{actor_loss, critic_loss, td_targets};
use crate::sac::SACActor;

/// Scalar diagnostics from one gradient step.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateStats {
    pub actor_loss: f32,
    pub critic_loss: f32,
    pub alpha_loss: f32,
    pub alpha: f32,
}

/// A replay batch lifted into backend tensors.
pub struct BatchTensors<B: AutodiffBackend> {
    pub states: Tensor<B, 2>,
    pub actions: Tensor<B, 2>,
    pub rewards: Tensor<B, 1>,
    pub next_states: Tensor<B, 2>,
    pub terminals: Tensor<B, 1>,
}

/// Flatten a transition batch into `[batch, dim]` tensors.
///
/// Truncations do not set the terminal flag; the TD target keeps its
/// bootstrap for them.
pub fn batch_to_tensors<B: AutodiffBackend>(
    batch: &[Transition],
    device: &B::Device,
) -> BatchTensors<B> {
    let n = batch.len();
    let obs_dim = batch.first().map_or(0, Transition::state_dim);
    let action_dim = batch.first().map_or(0, Transition::action_dim);

    let mut states = Vec::with_capacity(n * obs_dim);
    let mut actions = Vec::with_capacity(n * action_dim);
    let mut rewards = Vec::with_capacity(n);
    let mut next_states = Vec::with_capacity(n * obs_dim);
    let mut terminals = Vec::with_capacity(n);

    for t in batch {
        states.extend_from_slice(&t.state);
        actions.extend_from_slice(&t.action);
        rewards.push(t.reward);
        next_states.extend_from_slice(&t.next_state);
        terminals.push(if t.terminal { 1.0 } else { 0.0 });
    }

    BatchTensors {
        states: Tensor::<B, 1>::from_floats(states.as_slice(), device).reshape([n, obs_dim]),
        actions: Tensor::<B, 1>::from_floats(actions.as_slice(), device).reshape([n, action_dim]),
        rewards: Tensor::from_floats(rewards.as_slice(), device),
        next_states: Tensor::<B, 1>::from_floats(next_states.as_slice(), device)
            .reshape([n, obs_dim]),
        terminals: Tensor::from_floats(terminals.as_slice(), device),
    }
}

/// Owns the four networks, both optimizers, and the temperature.
pub struct SACLearner<B, A, C, OA, OC>
where
    B: AutodiffBackend,
    A: SACActor<B> + AutodiffModule<B>,
    C: SACCritic<B> + AutodiffModule<B>,
    OA: Optimizer<A, B>,
    OC: Optimizer<C, B>,
{
    pub actor: A,
    pub critic: C,
    pub target_actor: A,
    pub target_critic: C,
    pub entropy: EntropyTuner<B>,
    targets: TargetNetworkManager,
    actor_optimizer: OA,
    critic_optimizer: OC,
    config: SACConfig,
    device: B::Device,
}

impl<B, A, C, OA, OC> SACLearner<B, A, C, OA, OC>
where
    B: AutodiffBackend,
    A: SACActor<B> + AutodiffModule<B>,
    C: SACCritic<B> + AutodiffModule<B>,
    OA: Optimizer<A, B>,
    OC: Optimizer<C, B>,
{
    /// Targets start as exact copies of the online networks.
    pub fn new(
        actor: A,
        critic: C,
        actor_optimizer: OA,
        critic_optimizer: OC,
        config: SACConfig,
        device: B::Device,
    ) -> Self {
        let target_entropy = config.compute_target_entropy(actor.action_dim());
        let entropy = EntropyTuner::new(config.initial_alpha, target_entropy, &device);

        let targets = if config.hard_target_update {
            TargetNetworkManager::hard(config.target_update_interval)
        } else {
            TargetNetworkManager::soft(config.tau, config.target_update_interval)
        };

        Self {
            target_actor: actor.clone(),
            target_critic: critic.clone(),
            actor,
            critic,
            entropy,
            targets,
            actor_optimizer,
            critic_optimizer,
            config,
            device,
        }
    }

    pub fn config(&self) -> &SACConfig {
        &self.config
    }

    /// One full gradient step on a replay batch.
    pub fn update(&mut self, batch: &[Transition]) -> UpdateStats {
        let b = batch_to_tensors::<B>(batch, &self.device);
        let alpha = self.entropy.cached_alpha();

        // Critic: target actor proposes a', target critic scores it.
        let next_params = self.target_actor.forward(b.next_states.clone());
        let (next_actions, next_log_probs) = next_params.sample();
        let min_q_next = self
            .target_critic
            .forward(b.next_states, next_actions)
            .min_q();
        let targets = td_targets(
            b.rewards,
            b.terminals,
            min_q_next,
            next_log_probs,
            self.config.gamma,
            alpha,
        )
        .detach();

        let critic_out = self.critic.forward(b.states.clone(), b.actions);
        let c_loss = critic_loss(critic_out.q1, critic_out.q2, targets);
        let critic_loss_val: f32 = c_loss.clone().into_scalar().elem();

        let grads = GradientsParams::from_grads(c_loss.backward(), &self.critic);
        self.critic = self
            .critic_optimizer
            .step(self.config.critic_lr, self.critic.clone(), grads);

        // Actor: resample under the current policy, score with the fresh critic.
        let params = self.actor.forward(b.states.clone());
        let (actions, log_probs) = params.sample();
        let min_q = self.critic.forward(b.states, actions).min_q();
        let a_loss = actor_loss(min_q, log_probs.clone(), alpha);
        let actor_loss_val: f32 = a_loss.clone().into_scalar().elem();

        let grads = GradientsParams::from_grads(a_loss.backward(), &self.actor);
        self.actor = self
            .actor_optimizer
            .step(self.config.actor_lr, self.actor.clone(), grads);

        // Temperature: analytic step on detached log probs.
        let detached_log_probs = log_probs.detach();
        let mean_log_prob: f32 = detached_log_probs.clone().mean().into_scalar().elem();
        let alpha_loss_val: f32 = self.entropy.loss(detached_log_probs).into_scalar().elem();
        if self.config.auto_entropy_tuning {
            self.entropy.step(mean_log_prob, self.config.alpha_lr);
        }

        // Both targets move together when the interval is due.
        let (target_actor, target_critic) = self.targets.maybe_update_pair(
            &self.actor,
            self.target_actor.clone(),
            &self.critic,
            self.target_critic.clone(),
            &self.device,
        );
        self.target_actor = target_actor;
        self.target_critic = target_critic;

        UpdateStats {
            actor_loss: actor_loss_val,
            critic_loss: critic_loss_val,
            alpha_loss: alpha_loss_val,
            alpha: self.entropy.cached_alpha(),
        }
    }
}
