//! Linear layer with orthogonal weight initialization.
//!
//! Orthogonal weights preserve the norm of activations through depth, which
//! keeps early gradients well-scaled. Burn has no QR decomposition, so the
//! basis is built by Gram-Schmidt on a Gaussian matrix.
//!
//! Gains: 1.0 for value heads, sqrt(2) for ReLU stacks, 0.01 for policy
//! heads so the initial action distribution stays close to uniform.

use burn::module::{Module, Param};
use burn::prelude::*;
use burn::tensor::Distribution;

/// Configuration for [`OrthogonalLinear`].
#[derive(Debug, Clone)]
pub struct OrthogonalLinearConfig {
    pub d_input: usize,
    pub d_output: usize,
    /// Scale applied to the orthogonal basis.
    pub gain: f64,
    pub bias: bool,
}

impl OrthogonalLinearConfig {
    pub fn new(d_input: usize, d_output: usize) -> Self {
        Self {
            d_input,
            d_output,
            gain: 1.0,
            bias: true,
        }
    }

    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> OrthogonalLinear<B> {
        let weight =
            generate_orthogonal_weights::<B>(self.d_output, self.d_input, self.gain, device);

        let bias = if self.bias {
            Some(Param::from_tensor(Tensor::zeros([self.d_output], device)))
        } else {
            None
        };

        OrthogonalLinear {
            weight: Param::from_tensor(weight),
            bias,
        }
    }
}

/// Drop-in replacement for Burn's `Linear`, orthogonally initialized.
#[derive(Module, Debug)]
pub struct OrthogonalLinear<B: Backend> {
    /// Weight of shape [d_output, d_input].
    pub weight: Param<Tensor<B, 2>>,
    /// Bias of shape [d_output].
    pub bias: Option<Param<Tensor<B, 1>>>,
}

impl<B: Backend> OrthogonalLinear<B> {
    /// `y = x W^T + b` for input of shape [batch, d_input].
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let output = input.matmul(self.weight.val().transpose());

        match &self.bias {
            Some(bias) => output + bias.val().unsqueeze_dim(0),
            None => output,
        }
    }
}

/// Build a [rows, cols] matrix with orthonormal rows or columns
/// (whichever direction fits), scaled by `gain`.
pub fn generate_orthogonal_weights<B: Backend>(
    rows: usize,
    cols: usize,
    gain: f64,
    device: &B::Device,
) -> Tensor<B, 2> {
    let seed = Tensor::<B, 2>::random([rows, cols], Distribution::Normal(0.0, 1.0), device);

    // Orthonormality can only hold along the shorter side.
    let basis = if rows >= cols {
        orthonormalize_columns::<B>(seed, device)
    } else {
        orthonormalize_columns::<B>(seed.transpose(), device).transpose()
    };

    basis * (gain as f32)
}

/// Classical Gram-Schmidt over the columns of `matrix`.
fn orthonormalize_columns<B: Backend>(matrix: Tensor<B, 2>, device: &B::Device) -> Tensor<B, 2> {
    let [rows, cols] = matrix.dims();

    let mut basis: Vec<Tensor<B, 1>> = Vec::with_capacity(cols);
    for k in 0..cols {
        let mut v = matrix.clone().slice([0..rows, k..k + 1]).squeeze::<1>(1);

        // Remove the components already spanned by the basis.
        for b in &basis {
            let proj = dot::<B>(&v, b) / (dot::<B>(b, b) + 1e-10);
            v = v - b.clone() * proj;
        }

        basis.push(match unit(v) {
            Some(u) => u,
            // The column was linearly dependent; a random vector is almost
            // surely outside the current span.
            None => loop {
                let fresh = Tensor::random([rows], Distribution::Normal(0.0, 1.0), device);
                if let Some(u) = unit(fresh) {
                    break u;
                }
            },
        });
    }

    Tensor::cat(basis.into_iter().map(|b| b.unsqueeze_dim(1)).collect(), 1)
}

/// Normalize to unit length; None for (numerically) zero vectors.
fn unit<B: Backend>(v: Tensor<B, 1>) -> Option<Tensor<B, 1>> {
    let norm = v.clone().powf_scalar(2.0).sum().sqrt();
    let len: f32 = norm.clone().into_scalar().elem();
    (len > 1e-10).then(|| v / norm)
}

fn dot<B: Backend>(a: &Tensor<B, 1>, b: &Tensor<B, 1>) -> f32 {
    (a.clone() * b.clone()).sum().into_scalar().elem()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn get_device() -> <TestBackend as Backend>::Device {
        Default::default()
    }

    #[test]
    fn test_forward_shape() {
        let device = get_device();
        let linear: OrthogonalLinear<TestBackend> =
            OrthogonalLinearConfig::new(4, 3).init(&device);

        let input = Tensor::random([2, 4], Distribution::Normal(0.0, 1.0), &device);
        assert_eq!(linear.forward(input).dims(), [2, 3]);
    }

    #[test]
    fn test_square_matrix_is_orthogonal() {
        let device = get_device();
        let weights = generate_orthogonal_weights::<TestBackend>(4, 4, 1.0, &device);

        let product = weights.clone().matmul(weights.transpose());
        let identity = Tensor::<TestBackend, 2>::eye(4, &device);

        let diff = (product - identity).abs().mean().into_scalar();
        assert!(diff.elem::<f32>() < 0.1);
    }

    #[test]
    fn test_tall_matrix_has_orthonormal_columns() {
        let device = get_device();
        let weights = generate_orthogonal_weights::<TestBackend>(8, 4, 1.0, &device);

        let product = weights.clone().transpose().matmul(weights);
        let identity = Tensor::<TestBackend, 2>::eye(4, &device);

        let diff = (product - identity).abs().mean().into_scalar();
        assert!(diff.elem::<f32>() < 0.1);
    }

    #[test]
    fn test_wide_matrix_has_orthonormal_rows() {
        let device = get_device();
        let weights = generate_orthogonal_weights::<TestBackend>(4, 8, 1.0, &device);

        let product = weights.clone().matmul(weights.transpose());
        let identity = Tensor::<TestBackend, 2>::eye(4, &device);

        let diff = (product - identity).abs().mean().into_scalar();
        assert!(diff.elem::<f32>() < 0.1);
    }

    #[test]
    fn test_gain_scales_weights() {
        let device = get_device();

        let g1 = generate_orthogonal_weights::<TestBackend>(4, 4, 1.0, &device);
        let g2 = generate_orthogonal_weights::<TestBackend>(4, 4, 2.0, &device);

        let mean_g1: f32 = g1.abs().mean().into_scalar().elem();
        let mean_g2: f32 = g2.abs().mean().into_scalar().elem();
        assert!(mean_g2 > mean_g1 * 1.5);
    }

    #[test]
    fn test_no_bias() {
        let device = get_device();
        let linear: OrthogonalLinear<TestBackend> =
            OrthogonalLinearConfig::new(4, 3).with_bias(false).init(&device);
        assert!(linear.bias.is_none());
    }
}
