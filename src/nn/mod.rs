//! Network building blocks not covered by Burn's standard layers.

pub mod orthogonal;

pub use orthogonal::{generate_orthogonal_weights, OrthogonalLinear, OrthogonalLinearConfig};

/// Gain for ReLU hidden layers.
pub const RELU_GAIN: f64 = std::f64::consts::SQRT_2;
/// Gain for policy output heads; small values keep the initial policy near-uniform.
pub const POLICY_GAIN: f64 = 0.01;
/// Gain for value / Q output heads.
pub const VALUE_GAIN: f64 = 1.0;
