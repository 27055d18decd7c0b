//! Twin Q-network abstractions.
//!
//! SAC trains two independent Q-networks against the same target and takes
//! their elementwise minimum wherever a value estimate is consumed. The
//! minimum counteracts the overestimation bias that a single bootstrapped
//! Q-function accumulates.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Q-values from both critics for one (state, action) batch.
#[derive(Clone)]
pub struct CriticOutput<B: Backend> {
    pub q1: Tensor<B, 1>,
    pub q2: Tensor<B, 1>,
}

impl<B: Backend> CriticOutput<B> {
    pub fn new(q1: Tensor<B, 1>, q2: Tensor<B, 1>) -> Self {
        Self { q1, q2 }
    }

    /// Elementwise minimum of the two estimates.
    pub fn min_q(&self) -> Tensor<B, 1> {
        self.q1.clone().min_pair(self.q2.clone())
    }
}

/// Twin action-value network: Q(s, a) for continuous actions.
pub trait SACCritic<B: Backend>: Module<B> + Clone + Send + 'static {
    /// Evaluate both critics on [batch, obs_dim] observations and
    /// [batch, action_dim] squashed actions.
    fn forward(&self, obs: Tensor<B, 2>, actions: Tensor<B, 2>) -> CriticOutput<B>;

    fn obs_dim(&self) -> usize;

    fn action_dim(&self) -> usize;
}
