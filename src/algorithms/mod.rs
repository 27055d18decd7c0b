//! Policy math shared by the SAC components.

pub mod continuous_policy;

pub use continuous_policy::{
    clamp_log_std, log_prob_squashed_gaussian, sample_gaussian, sample_squashed_gaussian,
    scale_action, unscale_action, EPSILON, LOG_STD_MAX, LOG_STD_MIN,
};
