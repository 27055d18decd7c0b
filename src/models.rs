//! Concrete actor and critic networks.
//!
//! Both are plain MLPs with tanh activations and orthogonal initialization.
//! Hidden widths come from [`SACConfig::hidden_sizes`]; the heads use small
//! policy gain (actor) and unit value gain (critics).
//!
//! [`SACConfig::hidden_sizes`]: crate::sac::SACConfig

use burn::module::Module;
use burn::tensor::activation::tanh;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::algorithms::continuous_policy::clamp_log_std;
use crate::nn::{OrthogonalLinear, OrthogonalLinearConfig, POLICY_GAIN, RELU_GAIN, VALUE_GAIN};
use crate::sac::{CriticOutput, PolicyParams, SACActor, SACCritic};

fn build_encoder<B: Backend>(
    input_dim: usize,
    hidden_sizes: &[usize],
    device: &B::Device,
) -> Vec<OrthogonalLinear<B>> {
    let mut layers = Vec::with_capacity(hidden_sizes.len());
    let mut d_in = input_dim;
    for &width in hidden_sizes {
        layers.push(
            OrthogonalLinearConfig::new(d_in, width)
                .with_gain(RELU_GAIN)
                .init(device),
        );
        d_in = width;
    }
    layers
}

fn encode<B: Backend>(layers: &[OrthogonalLinear<B>], mut x: Tensor<B, 2>) -> Tensor<B, 2> {
    for layer in layers {
        x = tanh(layer.forward(x));
    }
    x
}

/// Squashed-Gaussian policy network: obs → (mean, log_std).
#[derive(Module, Debug)]
pub struct ActorNet<B: Backend> {
    encoder: Vec<OrthogonalLinear<B>>,
    mean_head: OrthogonalLinear<B>,
    log_std_head: OrthogonalLinear<B>,
    obs_dim: usize,
    action_dim: usize,
}

impl<B: Backend> ActorNet<B> {
    pub fn new(
        obs_dim: usize,
        action_dim: usize,
        hidden_sizes: &[usize],
        device: &B::Device,
    ) -> Self {
        assert!(!hidden_sizes.is_empty(), "actor needs at least one hidden layer");
        let last = *hidden_sizes.last().unwrap_or(&obs_dim);

        Self {
            encoder: build_encoder(obs_dim, hidden_sizes, device),
            mean_head: OrthogonalLinearConfig::new(last, action_dim)
                .with_gain(POLICY_GAIN)
                .init(device),
            log_std_head: OrthogonalLinearConfig::new(last, action_dim)
                .with_gain(POLICY_GAIN)
                .init(device),
            obs_dim,
            action_dim,
        }
    }
}

impl<B: Backend> SACActor<B> for ActorNet<B> {
    fn forward(&self, obs: Tensor<B, 2>) -> PolicyParams<B> {
        let x = encode(&self.encoder, obs);
        let mean = self.mean_head.forward(x.clone());
        let log_std = clamp_log_std(self.log_std_head.forward(x));
        PolicyParams::new(mean, log_std)
    }

    fn obs_dim(&self) -> usize {
        self.obs_dim
    }

    fn action_dim(&self) -> usize {
        self.action_dim
    }
}

/// Twin Q-network: concat(obs, action) → scalar per critic.
#[derive(Module, Debug)]
pub struct CriticNet<B: Backend> {
    q1_encoder: Vec<OrthogonalLinear<B>>,
    q1_head: OrthogonalLinear<B>,
    q2_encoder: Vec<OrthogonalLinear<B>>,
    q2_head: OrthogonalLinear<B>,
    obs_dim: usize,
    action_dim: usize,
}

impl<B: Backend> CriticNet<B> {
    pub fn new(
        obs_dim: usize,
        action_dim: usize,
        hidden_sizes: &[usize],
        device: &B::Device,
    ) -> Self {
        assert!(!hidden_sizes.is_empty(), "critic needs at least one hidden layer");
        let input_dim = obs_dim + action_dim;
        let last = *hidden_sizes.last().unwrap_or(&input_dim);

        Self {
            q1_encoder: build_encoder(input_dim, hidden_sizes, device),
            q1_head: OrthogonalLinearConfig::new(last, 1)
                .with_gain(VALUE_GAIN)
                .init(device),
            q2_encoder: build_encoder(input_dim, hidden_sizes, device),
            q2_head: OrthogonalLinearConfig::new(last, 1)
                .with_gain(VALUE_GAIN)
                .init(device),
            obs_dim,
            action_dim,
        }
    }
}

impl<B: Backend> SACCritic<B> for CriticNet<B> {
    fn forward(&self, obs: Tensor<B, 2>, actions: Tensor<B, 2>) -> CriticOutput<B> {
        let x = Tensor::cat(vec![obs, actions], 1);

        let q1 = self.q1_head.forward(encode(&self.q1_encoder, x.clone()));
        let q2 = self.q2_head.forward(encode(&self.q2_encoder, x));

        CriticOutput::new(q1.squeeze(1), q2.squeeze(1))
    }

    fn obs_dim(&self) -> usize {
        self.obs_dim
    }

    fn action_dim(&self) -> usize {
        self.action_dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::continuous_policy::{LOG_STD_MAX, LOG_STD_MIN};
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type B = NdArray<f32>;

    fn device() -> <B as Backend>::Device {
        Default::default()
    }

    #[test]
    fn test_actor_output_shapes() {
        let device = device();
        let actor: ActorNet<B> = ActorNet::new(9, 2, &[64, 64], &device);

        let obs = Tensor::random([4, 9], Distribution::Normal(0.0, 1.0), &device);
        let params = actor.forward(obs);

        assert_eq!(params.mean.dims(), [4, 2]);
        assert_eq!(params.log_std.dims(), [4, 2]);
    }

    #[test]
    fn test_actor_log_std_clamped() {
        let device = device();
        let actor: ActorNet<B> = ActorNet::new(9, 2, &[32], &device);

        let obs = Tensor::random([8, 9], Distribution::Normal(0.0, 10.0), &device);
        let params = actor.forward(obs);

        let data = params.log_std.into_data();
        for &v in data.as_slice::<f32>().unwrap() {
            assert!(v >= LOG_STD_MIN && v <= LOG_STD_MAX);
        }
    }

    #[test]
    fn test_actor_initial_policy_near_zero() {
        let device = device();
        let actor: ActorNet<B> = ActorNet::new(9, 2, &[64, 64], &device);

        let obs = Tensor::random([16, 9], Distribution::Normal(0.0, 1.0), &device);
        let params = actor.forward(obs);

        // Policy head gain is 0.01, so the initial mean stays near zero.
        let mean_abs: f32 = params.mean.abs().mean().into_data().as_slice::<f32>().unwrap()[0];
        assert!(mean_abs < 0.5);
    }

    #[test]
    fn test_critic_output_shapes() {
        let device = device();
        let critic: CriticNet<B> = CriticNet::new(9, 2, &[64, 64], &device);

        let obs = Tensor::random([4, 9], Distribution::Normal(0.0, 1.0), &device);
        let actions = Tensor::random([4, 2], Distribution::Uniform(-1.0, 1.0), &device);
        let out = critic.forward(obs, actions);

        assert_eq!(out.q1.dims(), [4]);
        assert_eq!(out.q2.dims(), [4]);
        assert_eq!(out.min_q().dims(), [4]);
    }

    #[test]
    fn test_critics_are_independent() {
        let device = device();
        let critic: CriticNet<B> = CriticNet::new(9, 2, &[32], &device);

        let obs = Tensor::random([8, 9], Distribution::Normal(0.0, 1.0), &device);
        let actions = Tensor::random([8, 2], Distribution::Uniform(-1.0, 1.0), &device);
        let out = critic.forward(obs, actions);

        let q1 = out.q1.into_data();
        let q2 = out.q2.into_data();
        let diff: f32 = q1
            .as_slice::<f32>()
            .unwrap()
            .iter()
            .zip(q2.as_slice::<f32>().unwrap())
            .map(|(a, b)| (a - b).abs())
            .sum();
        assert!(diff > 1e-6, "twin critics should not be identical at init");
    }
}
