//! SAC loss terms.
//!
//! Three losses, optimized independently:
//! - critic: MSE of both Q-networks against a shared bootstrapped target
//! - actor: negated soft value under the current critics
//! - temperature: handled in [`crate::sac::entropy`]
//!
//! TD targets are computed on detached inputs; no gradient ever flows
//! through the bootstrap.

use burn::tensor::backend::AutodiffBackend;
use burn::tensor::Tensor;

/// Critic loss: `MSE(Q1, y) + MSE(Q2, y)`.
///
/// Non-negative by construction; zero exactly when both critics predict the
/// target.
pub fn critic_loss<B: AutodiffBackend>(
    q1: Tensor<B, 1>,
    q2: Tensor<B, 1>,
    targets: Tensor<B, 1>,
) -> Tensor<B, 1> {
    let q1_loss = (q1 - targets.clone()).powf_scalar(2.0).mean();
    let q2_loss = (q2 - targets).powf_scalar(2.0).mean();
    q1_loss + q2_loss
}

/// Actor loss: `mean(α * log π(a|s) - min(Q1, Q2)(s, a))`.
///
/// Minimizing this maximizes the soft value `E[min_Q - α log π]` for actions
/// resampled from the current policy.
pub fn actor_loss<B: AutodiffBackend>(
    min_q: Tensor<B, 1>,
    log_probs: Tensor<B, 1>,
    alpha: f32,
) -> Tensor<B, 1> {
    (log_probs.mul_scalar(alpha) - min_q).mean()
}

/// Bootstrapped TD target:
///
/// ```text
/// y = r + γ * (1 - terminal) * (min_Q'(s', a') - α * log π(a'|s'))
/// ```
///
/// `a'` is drawn from the target actor; all inputs must already be detached.
/// Truncated episodes keep their bootstrap, only true terminals cut it.
pub fn td_targets<B: AutodiffBackend>(
    rewards: Tensor<B, 1>,
    terminals: Tensor<B, 1>,
    min_q_next: Tensor<B, 1>,
    next_log_probs: Tensor<B, 1>,
    gamma: f32,
    alpha: f32,
) -> Tensor<B, 1> {
    let v_next = min_q_next - next_log_probs.mul_scalar(alpha);
    let not_done = terminals.mul_scalar(-1.0).add_scalar(1.0);
    rewards + not_done.mul_scalar(gamma) * v_next
}
