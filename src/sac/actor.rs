//! Actor-side abstractions.
//!
//! SAC keeps the actor and critics as separate networks with separate
//! optimizers, so the actor seam is just "observations in, Gaussian
//! parameters out". Sampling, squashing, and log-prob correction live in
//! [`crate::algorithms::continuous_policy`] and are shared between the
//! interaction loop and the gradient step.

use burn::module::Module;
use burn::tensor::activation::tanh;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::algorithms::continuous_policy::{
    log_prob_squashed_gaussian, sample_squashed_gaussian,
};

/// Diagonal Gaussian parameters produced by one actor forward pass.
///
/// `log_std` is already clamped by the network.
#[derive(Clone)]
pub struct PolicyParams<B: Backend> {
    pub mean: Tensor<B, 2>,
    pub log_std: Tensor<B, 2>,
}

impl<B: Backend> PolicyParams<B> {
    pub fn new(mean: Tensor<B, 2>, log_std: Tensor<B, 2>) -> Self {
        Self { mean, log_std }
    }

    /// Reparameterized sample squashed into (-1, 1), with its log probability.
    pub fn sample(&self) -> (Tensor<B, 2>, Tensor<B, 1>) {
        sample_squashed_gaussian(self.mean.clone(), self.log_std.clone())
    }

    /// Log probability of already-squashed actions.
    pub fn log_prob(&self, squashed_actions: Tensor<B, 2>) -> Tensor<B, 1> {
        log_prob_squashed_gaussian(squashed_actions, self.mean.clone(), self.log_std.clone())
    }

    /// Mode of the squashed distribution, for evaluation.
    pub fn deterministic(&self) -> Tensor<B, 2> {
        tanh(self.mean.clone())
    }
}

/// Stochastic policy network.
///
/// Implementations work on any backend; the interaction loop runs the
/// non-autodiff copy obtained through `valid()`.
pub trait SACActor<B: Backend>: Module<B> + Clone + Send + 'static {
    /// Map observations [batch, obs_dim] to Gaussian parameters.
    fn forward(&self, obs: Tensor<B, 2>) -> PolicyParams<B>;

    fn obs_dim(&self) -> usize;

    fn action_dim(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_deterministic_is_squashed_mean() {
        let device = Default::default();
        let mean: Tensor<B, 2> = Tensor::from_floats([[0.0, 2.0]], &device);
        let log_std: Tensor<B, 2> = Tensor::zeros([1, 2], &device);

        let params = PolicyParams::new(mean, log_std);
        let action = params.deterministic().into_data();
        let slice = action.as_slice::<f32>().unwrap();

        assert!(slice[0].abs() < 1e-6);
        assert!((slice[1] - 2.0_f32.tanh()).abs() < 1e-6);
    }

    #[test]
    fn test_sample_within_unit_bounds() {
        let device = Default::default();
        let params: PolicyParams<B> = PolicyParams::new(
            Tensor::zeros([16, 2], &device),
            Tensor::ones([16, 2], &device),
        );

        let (actions, log_probs) = params.sample();
        assert_eq!(actions.dims(), [16, 2]);
        assert_eq!(log_probs.dims(), [16]);

        let data = actions.into_data();
        for &a in data.as_slice::<f32>().unwrap() {
            assert!(a > -1.0 && a < 1.0);
        }
    }
}
