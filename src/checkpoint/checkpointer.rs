//! Checkpointing for SAC training state.
//!
//! A checkpoint is a directory holding all four networks plus a small JSON
//! state file with the step, the learned log temperature, and the metric the
//! checkpoint was scored with. The checkpointer keeps the newest N
//! checkpoints and mirrors the best-scoring one into `best/`.

use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Configuration for the checkpointer.
#[derive(Debug, Clone)]
pub struct CheckpointerConfig {
    /// Directory to store checkpoints.
    pub checkpoint_dir: PathBuf,
    /// Environment steps between saves.
    pub save_interval: usize,
    /// Number of recent checkpoints to keep (0 = keep all).
    pub keep_last_n: usize,
    /// Mirror the best-scoring checkpoint into `best/`.
    pub save_best: bool,
}

impl Default for CheckpointerConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from("./checkpoints"),
            save_interval: 50_000,
            keep_last_n: 5,
            save_best: true,
        }
    }
}

impl CheckpointerConfig {
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_save_interval(mut self, interval: usize) -> Self {
        self.save_interval = interval;
        self
    }

    pub fn with_keep_last_n(mut self, n: usize) -> Self {
        self.keep_last_n = n;
        self
    }

    pub fn with_save_best(mut self, save_best: bool) -> Self {
        self.save_best = save_best;
        self
    }
}

/// Error type for checkpointing operations.
#[derive(Debug)]
pub enum CheckpointError {
    Io(io::Error),
    /// Burn recorder error.
    Recorder(String),
    /// State file (de)serialization error.
    State(serde_json::Error),
    NoCheckpoints,
}

impl std::fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointError::Io(e) => write!(f, "IO error: {}", e),
            CheckpointError::Recorder(e) => write!(f, "Recorder error: {}", e),
            CheckpointError::State(e) => write!(f, "State file error: {}", e),
            CheckpointError::NoCheckpoints => write!(f, "No checkpoints found"),
        }
    }
}

impl std::error::Error for CheckpointError {}

impl From<io::Error> for CheckpointError {
    fn from(e: io::Error) -> Self {
        CheckpointError::Io(e)
    }
}

impl From<serde_json::Error> for CheckpointError {
    fn from(e: serde_json::Error) -> Self {
        CheckpointError::State(e)
    }
}

/// Scalars saved alongside the network weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointState {
    pub step: usize,
    pub log_alpha: f32,
    pub metric: Option<f32>,
}

/// Checkpoint metadata.
#[derive(Debug, Clone)]
pub struct CheckpointInfo {
    /// Path to the checkpoint directory.
    pub path: PathBuf,
    pub step: usize,
    pub metric: Option<f32>,
}

/// Everything loaded back from one checkpoint.
pub struct LoadedCheckpoint<A, C> {
    pub actor: A,
    pub critic: C,
    pub target_actor: A,
    pub target_critic: C,
    pub state: CheckpointState,
}

/// Saves and restores the full SAC training state.
pub struct Checkpointer {
    config: CheckpointerConfig,
    best_metric: f32,
    checkpoint_history: Vec<CheckpointInfo>,
}

impl Checkpointer {
    /// Creates the checkpoint directory if it doesn't exist.
    ///
    /// Checkpoints already on disk (from a previous run over the same
    /// directory) are picked up into the pruning history.
    pub fn new(config: CheckpointerConfig) -> Result<Self, CheckpointError> {
        fs::create_dir_all(&config.checkpoint_dir)?;

        let mut checkpointer = Self {
            config,
            best_metric: f32::NEG_INFINITY,
            checkpoint_history: Vec::new(),
        };
        checkpointer.checkpoint_history = checkpointer.list_checkpoints()?;
        Ok(checkpointer)
    }

    pub fn config(&self) -> &CheckpointerConfig {
        &self.config
    }

    pub fn should_save(&self, step: usize) -> bool {
        self.config.save_interval > 0 && step > 0 && step % self.config.save_interval == 0
    }

    /// Save all four networks, the temperature, and the step.
    #[allow(clippy::too_many_arguments)]
    pub fn save<B, A, C>(
        &mut self,
        actor: &A,
        critic: &C,
        target_actor: &A,
        target_critic: &C,
        log_alpha: f32,
        step: usize,
        metric: Option<f32>,
    ) -> Result<PathBuf, CheckpointError>
    where
        B: Backend,
        A: Module<B>,
        C: Module<B>,
    {
        let dir = self
            .config
            .checkpoint_dir
            .join(format!("checkpoint_{:08}", step));

        let state = CheckpointState {
            step,
            log_alpha,
            metric,
        };
        write_checkpoint_dir(&dir, actor, critic, target_actor, target_critic, &state)?;

        self.checkpoint_history.push(CheckpointInfo {
            path: dir.clone(),
            step,
            metric,
        });

        if self.config.save_best {
            if let Some(m) = metric {
                if m > self.best_metric {
                    self.best_metric = m;
                    let best_dir = self.config.checkpoint_dir.join("best");
                    write_checkpoint_dir(
                        &best_dir,
                        actor,
                        critic,
                        target_actor,
                        target_critic,
                        &state,
                    )?;
                }
            }
        }

        self.cleanup_old_checkpoints();
        Ok(dir)
    }

    /// Load a checkpoint directory into the provided network templates.
    pub fn load<B, A, C>(
        &self,
        actor_template: A,
        critic_template: C,
        dir: &Path,
        device: &B::Device,
    ) -> Result<LoadedCheckpoint<A, C>, CheckpointError>
    where
        B: Backend,
        A: Module<B> + Clone,
        C: Module<B> + Clone,
    {
        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();

        let actor = actor_template
            .clone()
            .load_file(dir.join("actor"), &recorder, device)
            .map_err(|e| CheckpointError::Recorder(e.to_string()))?;
        let target_actor = actor_template
            .load_file(dir.join("target_actor"), &recorder, device)
            .map_err(|e| CheckpointError::Recorder(e.to_string()))?;
        let critic = critic_template
            .clone()
            .load_file(dir.join("critic"), &recorder, device)
            .map_err(|e| CheckpointError::Recorder(e.to_string()))?;
        let target_critic = critic_template
            .load_file(dir.join("target_critic"), &recorder, device)
            .map_err(|e| CheckpointError::Recorder(e.to_string()))?;

        let state: CheckpointState =
            serde_json::from_str(&fs::read_to_string(dir.join("state.json"))?)?;

        Ok(LoadedCheckpoint {
            actor,
            critic,
            target_actor,
            target_critic,
            state,
        })
    }

    /// Load the best-scoring checkpoint.
    pub fn load_best<B, A, C>(
        &self,
        actor_template: A,
        critic_template: C,
        device: &B::Device,
    ) -> Result<LoadedCheckpoint<A, C>, CheckpointError>
    where
        B: Backend,
        A: Module<B> + Clone,
        C: Module<B> + Clone,
    {
        let best_dir = self.config.checkpoint_dir.join("best");
        if !best_dir.exists() {
            return Err(CheckpointError::NoCheckpoints);
        }
        self.load(actor_template, critic_template, &best_dir, device)
    }

    /// Load the newest checkpoint.
    pub fn load_latest<B, A, C>(
        &self,
        actor_template: A,
        critic_template: C,
        device: &B::Device,
    ) -> Result<LoadedCheckpoint<A, C>, CheckpointError>
    where
        B: Backend,
        A: Module<B> + Clone,
        C: Module<B> + Clone,
    {
        let latest = self.find_latest_checkpoint()?;
        self.load(actor_template, critic_template, &latest.path, device)
    }

    /// Newest checkpoint directory by step number.
    pub fn find_latest_checkpoint(&self) -> Result<CheckpointInfo, CheckpointError> {
        let mut checkpoints = self.list_checkpoints()?;
        checkpoints.pop().ok_or(CheckpointError::NoCheckpoints)
    }

    /// All checkpoint directories, sorted by step.
    pub fn list_checkpoints(&self) -> Result<Vec<CheckpointInfo>, CheckpointError> {
        let mut checkpoints: Vec<CheckpointInfo> = fs::read_dir(&self.config.checkpoint_dir)?
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let path = e.path();
                if !path.is_dir() {
                    return None;
                }
                let name = path.file_name()?.to_str()?;
                let step = name.strip_prefix("checkpoint_")?.parse().ok()?;
                Some(CheckpointInfo {
                    path,
                    step,
                    metric: None,
                })
            })
            .collect();

        checkpoints.sort_by_key(|c| c.step);
        Ok(checkpoints)
    }

    pub fn best_metric(&self) -> f32 {
        self.best_metric
    }

    fn cleanup_old_checkpoints(&mut self) {
        if self.config.keep_last_n == 0 {
            return;
        }

        while self.checkpoint_history.len() > self.config.keep_last_n {
            let old = self.checkpoint_history.remove(0);
            let _ = fs::remove_dir_all(&old.path);
        }
    }
}

fn write_checkpoint_dir<B, A, C>(
    dir: &Path,
    actor: &A,
    critic: &C,
    target_actor: &A,
    target_critic: &C,
    state: &CheckpointState,
) -> Result<(), CheckpointError>
where
    B: Backend,
    A: Module<B>,
    C: Module<B>,
{
    fs::create_dir_all(dir)?;
    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();

    actor
        .clone()
        .save_file(dir.join("actor"), &recorder)
        .map_err(|e| CheckpointError::Recorder(e.to_string()))?;
    critic
        .clone()
        .save_file(dir.join("critic"), &recorder)
        .map_err(|e| CheckpointError::Recorder(e.to_string()))?;
    target_actor
        .clone()
        .save_file(dir.join("target_actor"), &recorder)
        .map_err(|e| CheckpointError::Recorder(e.to_string()))?;
    target_critic
        .clone()
        .save_file(dir.join("target_critic"), &recorder)
        .map_err(|e| CheckpointError::Recorder(e.to_string()))?;

    fs::write(dir.join("state.json"), serde_json::to_string_pretty(state)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActorNet, CriticNet};
    use burn::backend::NdArray;
    use tempfile::tempdir;

    type B = NdArray<f32>;

    #[test]
    fn test_config_builder() {
        let config = CheckpointerConfig::new("./ckpts")
            .with_save_interval(5_000)
            .with_keep_last_n(3)
            .with_save_best(false);

        assert_eq!(config.checkpoint_dir, PathBuf::from("./ckpts"));
        assert_eq!(config.save_interval, 5_000);
        assert_eq!(config.keep_last_n, 3);
        assert!(!config.save_best);
    }

    #[test]
    fn test_should_save() {
        let dir = tempdir().unwrap();
        let config = CheckpointerConfig::new(dir.path()).with_save_interval(100);
        let checkpointer = Checkpointer::new(config).unwrap();

        assert!(!checkpointer.should_save(0));
        assert!(!checkpointer.should_save(50));
        assert!(checkpointer.should_save(100));
        assert!(!checkpointer.should_save(150));
        assert!(checkpointer.should_save(200));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let device = Default::default();
        let mut checkpointer = Checkpointer::new(CheckpointerConfig::new(dir.path())).unwrap();

        let actor: ActorNet<B> = ActorNet::new(4, 2, &[8], &device);
        let critic: CriticNet<B> = CriticNet::new(4, 2, &[8], &device);

        let path = checkpointer
            .save::<B, _, _>(&actor, &critic, &actor, &critic, -0.7, 100, Some(3.5))
            .unwrap();
        assert!(path.join("state.json").exists());

        let template_actor: ActorNet<B> = ActorNet::new(4, 2, &[8], &device);
        let template_critic: CriticNet<B> = CriticNet::new(4, 2, &[8], &device);
        let loaded = checkpointer
            .load::<B, _, _>(template_actor, template_critic, &path, &device)
            .unwrap();

        assert_eq!(loaded.state.step, 100);
        assert!((loaded.state.log_alpha - (-0.7)).abs() < 1e-6);
        assert_eq!(loaded.state.metric, Some(3.5));
    }

    #[test]
    fn test_keep_last_n_prunes_old_dirs() {
        let dir = tempdir().unwrap();
        let device = Default::default();
        let mut checkpointer = Checkpointer::new(
            CheckpointerConfig::new(dir.path())
                .with_keep_last_n(2)
                .with_save_best(false),
        )
        .unwrap();

        let actor: ActorNet<B> = ActorNet::new(4, 2, &[8], &device);
        let critic: CriticNet<B> = CriticNet::new(4, 2, &[8], &device);

        for step in [100, 200, 300] {
            checkpointer
                .save::<B, _, _>(&actor, &critic, &actor, &critic, 0.0, step, None)
                .unwrap();
        }

        let listed = checkpointer.list_checkpoints().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].step, 200);
        assert_eq!(listed[1].step, 300);
    }

    #[test]
    fn test_reopened_dir_prunes_earlier_checkpoints() {
        let dir = tempdir().unwrap();
        let device = Default::default();
        let config = CheckpointerConfig::new(dir.path())
            .with_keep_last_n(2)
            .with_save_best(false);

        let actor: ActorNet<B> = ActorNet::new(4, 2, &[8], &device);
        let critic: CriticNet<B> = CriticNet::new(4, 2, &[8], &device);

        let mut first = Checkpointer::new(config.clone()).unwrap();
        for step in [100, 200] {
            first
                .save::<B, _, _>(&actor, &critic, &actor, &critic, 0.0, step, None)
                .unwrap();
        }
        drop(first);

        // A fresh checkpointer over the same directory must count the
        // checkpoints the earlier process left behind.
        let mut resumed = Checkpointer::new(config).unwrap();
        resumed
            .save::<B, _, _>(&actor, &critic, &actor, &critic, 0.0, 300, None)
            .unwrap();

        let listed = resumed.list_checkpoints().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].step, 200);
        assert_eq!(listed[1].step, 300);
    }

    #[test]
    fn test_best_tracks_highest_metric() {
        let dir = tempdir().unwrap();
        let device = Default::default();
        let mut checkpointer = Checkpointer::new(CheckpointerConfig::new(dir.path())).unwrap();

        let actor: ActorNet<B> = ActorNet::new(4, 2, &[8], &device);
        let critic: CriticNet<B> = CriticNet::new(4, 2, &[8], &device);

        checkpointer
            .save::<B, _, _>(&actor, &critic, &actor, &critic, 0.0, 100, Some(1.0))
            .unwrap();
        checkpointer
            .save::<B, _, _>(&actor, &critic, &actor, &critic, 0.0, 200, Some(5.0))
            .unwrap();
        checkpointer
            .save::<B, _, _>(&actor, &critic, &actor, &critic, 0.0, 300, Some(2.0))
            .unwrap();

        assert_eq!(checkpointer.best_metric(), 5.0);
        assert!(dir.path().join("best").join("state.json").exists());
    }

    #[test]
    fn test_latest_finds_highest_step() {
        let dir = tempdir().unwrap();
        let device = Default::default();
        let mut checkpointer = Checkpointer::new(CheckpointerConfig::new(dir.path())).unwrap();

        let actor: ActorNet<B> = ActorNet::new(4, 2, &[8], &device);
        let critic: CriticNet<B> = CriticNet::new(4, 2, &[8], &device);

        checkpointer
            .save::<B, _, _>(&actor, &critic, &actor, &critic, 0.0, 100, None)
            .unwrap();
        checkpointer
            .save::<B, _, _>(&actor, &critic, &actor, &critic, 0.0, 250, None)
            .unwrap();

        let latest = checkpointer.find_latest_checkpoint().unwrap();
        assert_eq!(latest.step, 250);
    }

    #[test]
    fn test_no_checkpoints_error() {
        let dir = tempdir().unwrap();
        let checkpointer = Checkpointer::new(CheckpointerConfig::new(dir.path())).unwrap();
        assert!(matches!(
            checkpointer.find_latest_checkpoint(),
            Err(CheckpointError::NoCheckpoints)
        ));
    }
}
