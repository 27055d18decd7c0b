//! Training-state persistence.
//!
//! ```rust,ignore
//! let config = CheckpointerConfig::new(run_dir.join("checkpoints"))
//!     .with_save_interval(50_000)
//!     .with_keep_last_n(5);
//! let mut checkpointer = Checkpointer::new(config)?;
//!
//! if checkpointer.should_save(step) {
//!     checkpointer.save::<B, _, _>(
//!         &actor, &critic, &target_actor, &target_critic,
//!         log_alpha, step, Some(mean_return),
//!     )?;
//! }
//! ```

pub mod checkpointer;

pub use checkpointer::{
    CheckpointError, CheckpointInfo, CheckpointState, Checkpointer, CheckpointerConfig,
    LoadedCheckpoint,
};
