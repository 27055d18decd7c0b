//! Training loggers.
//!
//! Backends share the [`MetricsLogger`] trait so the runner can fan one
//! snapshot out to the console and a CSV file at once.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

/// One row of training metrics.
#[derive(Debug, Clone, Default)]
pub struct TrainingSnapshot {
    /// Total environment steps.
    pub env_steps: usize,
    /// Total gradient updates.
    pub train_steps: usize,
    /// Episodes completed.
    pub episodes: usize,
    /// Rolling mean episode return.
    pub mean_return: f32,
    pub actor_loss: f32,
    pub critic_loss: f32,
    pub alpha_loss: f32,
    /// Current temperature.
    pub alpha: f32,
    /// Replay buffer fill fraction.
    pub buffer_utilization: f32,
}

impl TrainingSnapshot {
    pub fn new(env_steps: usize, train_steps: usize, episodes: usize, mean_return: f32) -> Self {
        Self {
            env_steps,
            train_steps,
            episodes,
            mean_return,
            ..Default::default()
        }
    }

    pub fn with_losses(mut self, actor_loss: f32, critic_loss: f32, alpha_loss: f32) -> Self {
        self.actor_loss = actor_loss;
        self.critic_loss = critic_loss;
        self.alpha_loss = alpha_loss;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_buffer_utilization(mut self, utilization: f32) -> Self {
        self.buffer_utilization = utilization;
        self
    }
}

/// Logging backend.
pub trait MetricsLogger: Send {
    fn log(&mut self, snapshot: &TrainingSnapshot);

    fn flush(&mut self);
}

/// Column-aligned console output.
pub struct ConsoleLogger {
    /// Environment steps between printed rows.
    log_interval: usize,
    last_log_step: usize,
    start_time: Instant,
    show_header: bool,
}

impl ConsoleLogger {
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval,
            last_log_step: 0,
            start_time: Instant::now(),
            show_header: true,
        }
    }

    pub fn reset_timer(&mut self) {
        self.start_time = Instant::now();
    }

    fn print_header(&self) {
        println!(
            "{:>10} {:>8} {:>8} {:>10} {:>10} {:>10} {:>8} {:>7} {:>8}",
            "EnvSteps", "Updates", "Episodes", "Return", "ActorL", "CriticL", "Alpha", "Buffer", "FPS"
        );
        println!("{}", "-".repeat(88));
    }
}

impl MetricsLogger for ConsoleLogger {
    fn log(&mut self, snapshot: &TrainingSnapshot) {
        if snapshot.env_steps < self.last_log_step + self.log_interval {
            return;
        }

        if self.show_header {
            self.print_header();
            self.show_header = false;
        }

        let elapsed = self.start_time.elapsed().as_secs_f32();
        let fps = if elapsed > 0.0 {
            snapshot.env_steps as f32 / elapsed
        } else {
            0.0
        };

        println!(
            "{:>10} {:>8} {:>8} {:>10.2} {:>10.4} {:>10.4} {:>8.3} {:>6.1}% {:>8.0}",
            snapshot.env_steps,
            snapshot.train_steps,
            snapshot.episodes,
            snapshot.mean_return,
            snapshot.actor_loss,
            snapshot.critic_loss,
            snapshot.alpha,
            snapshot.buffer_utilization * 100.0,
            fps
        );

        self.last_log_step = snapshot.env_steps;
    }

    fn flush(&mut self) {
        // stdout is line-buffered
    }
}

/// CSV file output, one row per snapshot.
pub struct CsvLogger {
    writer: BufWriter<File>,
    start_time: Instant,
}

impl CsvLogger {
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "env_steps,train_steps,episodes,mean_return,actor_loss,critic_loss,alpha_loss,alpha,buffer_utilization,elapsed_secs"
        )?;

        Ok(Self {
            writer,
            start_time: Instant::now(),
        })
    }

    pub fn reset_timer(&mut self) {
        self.start_time = Instant::now();
    }
}

impl MetricsLogger for CsvLogger {
    fn log(&mut self, snapshot: &TrainingSnapshot) {
        let elapsed = self.start_time.elapsed().as_secs_f32();

        let _ = writeln!(
            self.writer,
            "{},{},{},{:.4},{:.6},{:.6},{:.6},{:.6},{:.4},{:.2}",
            snapshot.env_steps,
            snapshot.train_steps,
            snapshot.episodes,
            snapshot.mean_return,
            snapshot.actor_loss,
            snapshot.critic_loss,
            snapshot.alpha_loss,
            snapshot.alpha,
            snapshot.buffer_utilization,
            elapsed
        );
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}

impl Drop for CsvLogger {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Fans snapshots out to several backends.
pub struct MultiLogger {
    loggers: Vec<Box<dyn MetricsLogger>>,
}

impl MultiLogger {
    pub fn new() -> Self {
        Self {
            loggers: Vec::new(),
        }
    }

    pub fn add<L: MetricsLogger + 'static>(mut self, logger: L) -> Self {
        self.loggers.push(Box::new(logger));
        self
    }
}

impl Default for MultiLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsLogger for MultiLogger {
    fn log(&mut self, snapshot: &TrainingSnapshot) {
        for logger in &mut self.loggers {
            logger.log(snapshot);
        }
    }

    fn flush(&mut self) {
        for logger in &mut self.loggers {
            logger.flush();
        }
    }
}
