//! Core types shared across the trainer.

pub mod target_network;
pub mod transition;

pub use target_network::{
    hard_copy, soft_update, TargetNetworkConfig, TargetNetworkManager,
};
pub use transition::Transition;
