//! Learned entropy temperature.
//!
//! The SAC objective trades reward against policy entropy:
//! ```text
//! J(π) = E[r + γV] + α * H(π)
//! ```
//! α is log-parameterized for positivity and tuned so the policy holds a
//! target entropy level:
//! ```text
//! L(α) = -E[log_alpha * (log π + H_target)]
//! ```
//! The gradient of this loss in log_alpha is analytic, so the update is a
//! plain first-order step rather than a full optimizer pass.

use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};
use std::sync::atomic::{AtomicU64, Ordering};

/// Manages the learnable log_alpha and its cached scalar value.
///
/// The cache lets the interaction loop read α without tensor ops; call
/// [`update_cache`](Self::update_cache) after every temperature step.
pub struct EntropyTuner<B: AutodiffBackend> {
    /// Learnable log of the temperature; exp keeps α positive.
    log_alpha: Tensor<B, 1>,
    /// Target entropy: -dim(A) continuous, 0.89 * ln|A| discrete.
    target_entropy: f32,
    /// α as f32 bits, readable without touching tensors.
    cached_alpha: AtomicU64,
}

impl<B: AutodiffBackend> EntropyTuner<B> {
    pub fn new(initial_alpha: f32, target_entropy: f32, device: &B::Device) -> Self {
        let log_alpha = Tensor::from_floats([initial_alpha.ln()], device);
        Self {
            log_alpha,
            target_entropy,
            cached_alpha: AtomicU64::new(initial_alpha.to_bits() as u64),
        }
    }

    /// Current α = exp(log_alpha), read from the tensor.
    pub fn alpha(&self) -> f32 {
        self.log_alpha.clone().exp().into_scalar().elem()
    }

    /// Cached α; cheap to read from the interaction loop.
    pub fn cached_alpha(&self) -> f32 {
        let bits = self.cached_alpha.load(Ordering::Relaxed);
        f32::from_bits(bits as u32)
    }

    /// Temperature loss: `-mean(log_alpha * (log π + H_target))`.
    ///
    /// `log_probs` must be detached; no gradient flows into the actor here.
    pub fn loss(&self, log_probs: Tensor<B, 1>) -> Tensor<B, 1> {
        let mean_log_prob = log_probs.mean();
        -(self.log_alpha.clone() * (mean_log_prob + self.target_entropy))
    }

    /// Analytic first-order step on log_alpha.
    ///
    /// `dL/dlog_alpha = -(mean_log_prob + H_target)`, so the descent step is
    /// `log_alpha += lr * (mean_log_prob + H_target)`: α grows while the
    /// policy is less random than the target, shrinks when it is more random.
    pub fn step(&mut self, mean_log_prob: f32, lr: f64) {
        let delta = lr as f32 * (mean_log_prob + self.target_entropy);
        self.log_alpha = self.log_alpha.clone().add_scalar(delta);
        self.update_cache();
    }

    /// Refresh the cached α from the tensor.
    pub fn update_cache(&self) {
        let alpha = self.alpha();
        self.cached_alpha.store(alpha.to_bits() as u64, Ordering::Relaxed);
    }

    /// The log_alpha tensor, for checkpointing.
    pub fn log_alpha_tensor(&self) -> Tensor<B, 1> {
        self.log_alpha.clone()
    }

    /// Replace log_alpha (checkpoint restore).
    pub fn set_log_alpha(&mut self, log_alpha: Tensor<B, 1>) {
        self.log_alpha = log_alpha;
        self.update_cache();
    }

    pub fn target_entropy(&self) -> f32 {
        self.target_entropy
    }
}

/// SAC-paper heuristic for continuous actions: `H_target = -dim(A)`.
pub fn target_entropy_continuous(action_dim: usize) -> f32 {
    -(action_dim as f32)
}

/// SAC-Discrete heuristic: `H_target = scale * ln|A|`, scale typically 0.89.
pub fn target_entropy_discrete(n_actions: usize, scale: f32) -> f32 {
    scale * (n_actions as f32).ln()
}
