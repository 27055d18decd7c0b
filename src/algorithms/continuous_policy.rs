//! Squashed-Gaussian policy math for continuous steering/throttle actions.
//!
//! The actor outputs a diagonal Gaussian over raw actions. Samples are drawn
//! via the reparameterization trick, squashed through `tanh` into [-1, 1],
//! then rescaled to the environment's action bounds.
//!
//! # Log Probability Correction
//!
//! The tanh change of variables requires subtracting the log-Jacobian:
//! ```text
//! log π(a|s) = log N(u; μ, σ) - Σ log(1 - tanh²(u) + ε)
//! ```
//! where `u` is the pre-squash sample and `a = tanh(u)`.

use burn::tensor::backend::Backend;
use burn::tensor::{activation::tanh, Distribution, Tensor};

/// Lower bound for log standard deviation.
pub const LOG_STD_MIN: f32 = -20.0;
/// Upper bound for log standard deviation.
pub const LOG_STD_MAX: f32 = 2.0;
/// Numerical-stability epsilon used in the Jacobian correction and atanh.
pub const EPSILON: f32 = 1e-6;

/// Clamp log standard deviation into the supported range.
pub fn clamp_log_std<B: Backend>(log_std: Tensor<B, 2>) -> Tensor<B, 2> {
    log_std.clamp(LOG_STD_MIN, LOG_STD_MAX)
}

/// Reparameterized draw from a diagonal Gaussian (no squashing).
///
/// Returns `(samples, log_probs)` with shapes `[batch, action_dim]` and
/// `[batch]` (log probability summed over action dimensions).
pub fn sample_gaussian<B: Backend>(
    mean: Tensor<B, 2>,
    log_std: Tensor<B, 2>,
) -> (Tensor<B, 2>, Tensor<B, 1>) {
    let device = mean.device();
    let [batch_size, action_dim] = mean.dims();

    let log_std = clamp_log_std(log_std);
    let std = log_std.clone().exp();

    let noise: Tensor<B, 2> =
        Tensor::random([batch_size, action_dim], Distribution::Normal(0.0, 1.0), &device);

    // sample = mean + std * noise
    let samples = mean + std * noise.clone();

    // log N(x; μ, σ) = -0.5 * ((x - μ)/σ)² - log σ - 0.5 * log(2π)
    let log_2pi = (2.0 * std::f32::consts::PI).ln();
    let log_prob_per_dim: Tensor<B, 2> =
        noise.powf_scalar(2.0).mul_scalar(-0.5) - log_std - 0.5 * log_2pi;
    let log_probs: Tensor<B, 1> = log_prob_per_dim.sum_dim(1).squeeze(1);

    (samples, log_probs)
}

/// Reparameterized draw squashed through tanh, with corrected log probability.
///
/// Returned samples lie strictly inside (-1, 1).
pub fn sample_squashed_gaussian<B: Backend>(
    mean: Tensor<B, 2>,
    log_std: Tensor<B, 2>,
) -> (Tensor<B, 2>, Tensor<B, 1>) {
    let (raw, gaussian_log_prob) = sample_gaussian(mean, log_std);

    let squashed = tanh(raw.clone());
    let log_probs = gaussian_log_prob - squash_correction(raw);

    (squashed, log_probs)
}

/// Log probability of an already-squashed action under the policy.
///
/// Inverts the squashing with atanh, evaluates the Gaussian density, and
/// applies the Jacobian correction.
pub fn log_prob_squashed_gaussian<B: Backend>(
    squashed_action: Tensor<B, 2>,
    mean: Tensor<B, 2>,
    log_std: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let log_std = clamp_log_std(log_std);

    let clamped = squashed_action.clamp(-1.0 + EPSILON, 1.0 - EPSILON);
    let raw = atanh(clamped);

    let std = log_std.clone().exp();
    let normalized = (raw.clone() - mean) / std;
    let log_2pi = (2.0 * std::f32::consts::PI).ln();
    let log_prob_per_dim: Tensor<B, 2> =
        normalized.powf_scalar(2.0).mul_scalar(-0.5) - log_std - 0.5 * log_2pi;
    let gaussian_log_prob: Tensor<B, 1> = log_prob_per_dim.sum_dim(1).squeeze(1);

    gaussian_log_prob - squash_correction(raw)
}

/// Affine map from [-1, 1] into [low, high].
///
/// `action = squashed * (high - low) / 2 + (high + low) / 2`
pub fn scale_action<B: Backend>(
    squashed: Tensor<B, 2>,
    low: &[f32],
    high: &[f32],
) -> Tensor<B, 2> {
    let (scale, bias) = bounds_tensors(&squashed.device(), low, high, squashed.dims()[1]);
    squashed * scale + bias
}

/// Inverse of [`scale_action`]: map from [low, high] back into [-1, 1].
pub fn unscale_action<B: Backend>(action: Tensor<B, 2>, low: &[f32], high: &[f32]) -> Tensor<B, 2> {
    let (scale, bias) = bounds_tensors(&action.device(), low, high, action.dims()[1]);
    (action - bias) / scale
}

fn bounds_tensors<B: Backend>(
    device: &B::Device,
    low: &[f32],
    high: &[f32],
    action_dim: usize,
) -> (Tensor<B, 2>, Tensor<B, 2>) {
    assert_eq!(low.len(), action_dim);
    assert_eq!(high.len(), action_dim);

    let scale: Vec<f32> = low.iter().zip(high).map(|(l, h)| (h - l) / 2.0).collect();
    let bias: Vec<f32> = low.iter().zip(high).map(|(l, h)| (h + l) / 2.0).collect();

    let scale: Tensor<B, 2> =
        Tensor::<B, 1>::from_floats(scale.as_slice(), device).unsqueeze_dim(0);
    let bias: Tensor<B, 2> = Tensor::<B, 1>::from_floats(bias.as_slice(), device).unsqueeze_dim(0);
    (scale, bias)
}

/// Tanh Jacobian term: Σ log(1 - tanh²(u)), clamped away from log(0).
fn squash_correction<B: Backend>(raw: Tensor<B, 2>) -> Tensor<B, 1> {
    let squashed = tanh(raw);
    let one_minus_sq = (-squashed.clone() * squashed + 1.0).clamp(EPSILON, 1.0);
    let log_det_per_dim: Tensor<B, 2> = one_minus_sq.log();
    log_det_per_dim.sum_dim(1).squeeze(1)
}

/// atanh(x) = 0.5 * log((1 + x) / (1 - x)), with inputs clamped inside (-1, 1).
fn atanh<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    let x = x.clamp(-1.0 + EPSILON, 1.0 - EPSILON);
    let one_plus = x.clone() + 1.0;
    let one_minus = -x + 1.0;
    (one_plus / one_minus).clamp(EPSILON, f32::MAX).log() * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_sample_gaussian_shapes_and_finite() {
        let device = Default::default();
        let mean: Tensor<TestBackend, 2> = Tensor::zeros([32, 2], &device);
        let log_std: Tensor<TestBackend, 2> = Tensor::zeros([32, 2], &device);

        let (samples, log_probs) = sample_gaussian(mean, log_std);

        assert_eq!(samples.dims(), [32, 2]);
        assert_eq!(log_probs.dims(), [32]);

        let lp_data = log_probs.into_data();
        for &lp in lp_data.as_slice::<f32>().unwrap() {
            assert!(lp.is_finite());
        }
    }

    #[test]
    fn test_squashed_samples_within_unit_bounds() {
        let device = Default::default();
        // Large std pushes raw samples far out; tanh must still bound them.
        let mean: Tensor<TestBackend, 2> = Tensor::zeros([64, 2], &device);
        let log_std: Tensor<TestBackend, 2> = Tensor::ones([64, 2], &device);

        let (squashed, _) = sample_squashed_gaussian(mean, log_std);

        let data = squashed.into_data();
        for &a in data.as_slice::<f32>().unwrap() {
            assert!(a > -1.0 && a < 1.0, "squashed sample out of range: {}", a);
        }
    }

    #[test]
    fn test_scaled_actions_within_env_bounds() {
        let device = Default::default();
        let mean: Tensor<TestBackend, 2> = Tensor::zeros([64, 2], &device);
        let log_std: Tensor<TestBackend, 2> = Tensor::ones([64, 2], &device);
        let low = [0.0, -1.0];
        let high = [1.0, 1.0];

        let (squashed, _) = sample_squashed_gaussian(mean, log_std);
        let scaled = scale_action(squashed, &low, &high);

        let data = scaled.into_data();
        for row in data.as_slice::<f32>().unwrap().chunks(2) {
            assert!(row[0] > low[0] && row[0] < high[0]);
            assert!(row[1] > low[1] && row[1] < high[1]);
        }
    }

    #[test]
    fn test_log_prob_matches_sampled_log_prob() {
        let device = Default::default();
        let mean: Tensor<TestBackend, 2> = Tensor::zeros([8, 2], &device);
        let log_std: Tensor<TestBackend, 2> = Tensor::zeros([8, 2], &device);

        let (squashed, sampled_lp) = sample_squashed_gaussian(mean.clone(), log_std.clone());
        let recomputed_lp = log_prob_squashed_gaussian(squashed, mean, log_std);

        let a = sampled_lp.into_data();
        let b = recomputed_lp.into_data();
        for (x, y) in a
            .as_slice::<f32>()
            .unwrap()
            .iter()
            .zip(b.as_slice::<f32>().unwrap())
        {
            assert!((x - y).abs() < 1e-4, "log prob mismatch: {} vs {}", x, y);
        }
    }

    #[test]
    fn test_scale_unscale_roundtrip() {
        let device = Default::default();
        let squashed: Tensor<TestBackend, 2> =
            Tensor::from_floats([[0.5, -0.5], [0.0, 1.0]], &device);
        let low = [0.0, -1.0];
        let high = [1.0, 1.0];

        let scaled = scale_action(squashed.clone(), &low, &high);
        let unscaled = unscale_action(scaled.clone(), &low, &high);

        let scaled_data = scaled.into_data();
        let scaled_slice = scaled_data.as_slice::<f32>().unwrap();
        // throttle 0.5 with [0, 1]: scale 0.5, bias 0.5 -> 0.75
        assert!((scaled_slice[0] - 0.75).abs() < 1e-5);
        // steering -0.5 with [-1, 1]: unchanged
        assert!((scaled_slice[1] + 0.5).abs() < 1e-5);

        let orig = squashed.into_data();
        let back = unscaled.into_data();
        for (o, u) in orig
            .as_slice::<f32>()
            .unwrap()
            .iter()
            .zip(back.as_slice::<f32>().unwrap())
        {
            assert!((o - u).abs() < 1e-5);
        }
    }

    #[test]
    fn test_clamp_log_std() {
        let device = Default::default();
        let log_std: Tensor<TestBackend, 2> =
            Tensor::from_floats([[-100.0, 100.0]], &device);
        let clamped = clamp_log_std(log_std);
        let data = clamped.into_data();
        let slice = data.as_slice::<f32>().unwrap();
        assert!((slice[0] - LOG_STD_MIN).abs() < 1e-6);
        assert!((slice[1] - LOG_STD_MAX).abs() < 1e-6);
    }
}
