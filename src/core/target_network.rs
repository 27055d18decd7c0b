//! Lagged target copies of the actor and critic networks.
//!
//! TD targets bootstrap from value estimates; using the live network for
//! both prediction and target makes the target chase itself. The fix is a
//! separate target copy that trails the online network:
//!
//! ```text
//! θ_target = τ * θ_online + (1 - τ) * θ_target     (soft update)
//! θ_target = θ_online                              (hard update)
//! ```
//!
//! Target parameters never receive gradients. They change only through the
//! update rules here, applied on a fixed interval by [`TargetNetworkManager`].
//! Both the target actor (source of next actions for the TD target) and the
//! target critic go through the same manager.

use burn::module::{Module, ModuleMapper, ParamId};
use burn::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A parameter tensor flattened to 1D, shape kept implicit.
///
/// Flattening sidesteps the const-generic dimension problem of storing
/// tensors of mixed rank in one collection.
struct FlattenedParam<B: Backend> {
    tensor: Tensor<B, 1>,
}

/// Collects every float parameter of a module, in traversal order.
///
/// Traversal order is deterministic for a fixed architecture, so two
/// independently initialized models of the same shape line up index by index.
struct ParamExtractor<B: Backend> {
    params: Vec<FlattenedParam<B>>,
}

impl<B: Backend> ParamExtractor<B> {
    fn new() -> Self {
        Self { params: Vec::new() }
    }

    fn into_params(self) -> Vec<FlattenedParam<B>> {
        self.params
    }
}

impl<B: Backend> ModuleMapper<B> for ParamExtractor<B> {
    fn map_float<const D: usize>(&mut self, _id: ParamId, tensor: Tensor<B, D>) -> Tensor<B, D> {
        let total_size: usize = tensor.dims().iter().product();
        self.params.push(FlattenedParam {
            tensor: tensor.clone().reshape([total_size]),
        });
        tensor
    }
}

/// Applies Polyak averaging against a previously extracted parameter list.
///
/// Parameters are matched by traversal index, not ParamId, so the online and
/// target models may have been created independently.
struct SoftUpdateMapper<B: Backend> {
    online_params: Vec<FlattenedParam<B>>,
    tau: f32,
    index: usize,
}

impl<B: Backend> SoftUpdateMapper<B> {
    fn new(online_params: Vec<FlattenedParam<B>>, tau: f32) -> Self {
        Self {
            online_params,
            tau,
            index: 0,
        }
    }
}

impl<B: Backend> ModuleMapper<B> for SoftUpdateMapper<B> {
    fn map_float<const D: usize>(&mut self, _id: ParamId, tensor: Tensor<B, D>) -> Tensor<B, D> {
        let shape = tensor.dims();
        let total_size: usize = shape.iter().product();

        let idx = self.index;
        self.index += 1;

        match self.online_params.get(idx) {
            Some(online) => {
                let target_flat = tensor.reshape([total_size]);
                let interpolated = online.tensor.clone().mul_scalar(self.tau)
                    + target_flat.mul_scalar(1.0 - self.tau);
                interpolated.reshape(shape)
            }
            // Architectures do not match; leave the target parameter alone.
            None => tensor,
        }
    }
}

/// Polyak-average the target model toward the online model.
///
/// `tau = 1` degenerates to a hard copy, `tau = 0` to a no-op; both are
/// short-circuited without touching parameters.
pub fn soft_update<B, M>(online: &M, target: M, tau: f32, _device: &B::Device) -> M
where
    B: Backend,
    M: Module<B>,
{
    if (tau - 1.0).abs() < 1e-6 {
        return online.clone();
    }
    if tau.abs() < 1e-6 {
        return target;
    }

    let mut extractor = ParamExtractor::new();
    let _ = online.clone().map(&mut extractor);
    let online_params = extractor.into_params();

    let mut updater = SoftUpdateMapper::new(online_params, tau);
    target.map(&mut updater)
}

/// Full parameter copy (tau = 1).
pub fn hard_copy<B, M>(online: &M, _device: &B::Device) -> M
where
    B: Backend,
    M: Module<B> + Clone,
{
    online.clone()
}

/// How and when target networks track their online counterparts.
#[derive(Debug, Clone)]
pub struct TargetNetworkConfig {
    /// Polyak coefficient; larger moves the target faster.
    pub tau: f32,
    /// Update every N calls to `maybe_update`.
    pub update_interval: usize,
    /// Hard copy instead of interpolation.
    pub hard_update: bool,
}

impl Default for TargetNetworkConfig {
    fn default() -> Self {
        Self {
            tau: 0.05,
            update_interval: 1,
            hard_update: false,
        }
    }
}

impl TargetNetworkConfig {
    pub fn soft(tau: f32, update_interval: usize) -> Self {
        Self {
            tau,
            update_interval,
            hard_update: false,
        }
    }

    pub fn hard(update_interval: usize) -> Self {
        Self {
            tau: 1.0,
            update_interval,
            hard_update: true,
        }
    }
}

/// Counts update-step calls and syncs targets on the configured interval.
///
/// The step counter is an `AtomicUsize` so `maybe_update` takes `&self`;
/// the update step borrows the manager immutably alongside the models.
#[derive(Debug)]
pub struct TargetNetworkManager {
    config: TargetNetworkConfig,
    step_counter: AtomicUsize,
}

impl Clone for TargetNetworkManager {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            step_counter: AtomicUsize::new(self.step_counter.load(Ordering::Relaxed)),
        }
    }
}

impl TargetNetworkManager {
    pub fn new(config: TargetNetworkConfig) -> Self {
        Self {
            config,
            step_counter: AtomicUsize::new(0),
        }
    }

    pub fn soft(tau: f32, update_interval: usize) -> Self {
        Self::new(TargetNetworkConfig::soft(tau, update_interval))
    }

    pub fn hard(update_interval: usize) -> Self {
        Self::new(TargetNetworkConfig::hard(update_interval))
    }

    /// Advance the step counter; sync and return the target when the
    /// interval divides the step count, otherwise return it untouched.
    pub fn maybe_update<B, M>(&self, online: &M, target: M, device: &B::Device) -> M
    where
        B: Backend,
        M: Module<B>,
    {
        let step = self.step_counter.fetch_add(1, Ordering::Relaxed) + 1;

        if step % self.config.update_interval != 0 {
            return target;
        }

        if self.config.hard_update {
            hard_copy(online, device)
        } else {
            soft_update(online, target, self.config.tau, device)
        }
    }

    /// Like [`maybe_update`](Self::maybe_update), but syncs the target actor
    /// and target critic together off a single counter increment.
    pub fn maybe_update_pair<B, M, N>(
        &self,
        online_a: &M,
        target_a: M,
        online_b: &N,
        target_b: N,
        device: &B::Device,
    ) -> (M, N)
    where
        B: Backend,
        M: Module<B>,
        N: Module<B>,
    {
        let step = self.step_counter.fetch_add(1, Ordering::Relaxed) + 1;

        if step % self.config.update_interval != 0 {
            return (target_a, target_b);
        }

        if self.config.hard_update {
            (hard_copy(online_a, device), hard_copy(online_b, device))
        } else {
            (
                soft_update(online_a, target_a, self.config.tau, device),
                soft_update(online_b, target_b, self.config.tau, device),
            )
        }
    }

    pub fn steps(&self) -> usize {
        self.step_counter.load(Ordering::Relaxed)
    }

    pub fn reset(&mut self) {
        self.step_counter.store(0, Ordering::Relaxed);
    }

    pub fn config(&self) -> &TargetNetworkConfig {
        &self.config
    }
}
