//! Train SAC on the track environment.
//!
//! Writes a timestamped run directory with `params.json`, a metrics CSV,
//! and periodic checkpoints.

use std::error::Error;
use std::path::PathBuf;

use burn::backend::ndarray::NdArray;
use burn::backend::Autodiff;
use structopt::StructOpt;

use racecar_rl::checkpoint::{Checkpointer, CheckpointerConfig};
use racecar_rl::env::{Environment, RacecarEnv, TrackLayout};
use racecar_rl::metrics::{create_run_dir, ConsoleLogger, CsvLogger, MultiLogger};
use racecar_rl::models::{ActorNet, CriticNet};
use racecar_rl::runner::SACRunner;
use racecar_rl::sac::SACConfig;

type B = Autodiff<NdArray<f32>>;

#[derive(Debug, StructOpt)]
#[structopt(name = "train", about = "Train SAC on the track environment")]
struct Opt {
    /// Track layout: map1 or map2.
    #[structopt(long, default_value = "map1")]
    map: String,

    /// Total environment steps.
    #[structopt(long, default_value = "1000000")]
    steps: usize,

    /// RNG seed.
    #[structopt(long, default_value = "42")]
    seed: u64,

    /// Base directory for run outputs.
    #[structopt(long, parse(from_os_str), default_value = "runs")]
    runs_dir: PathBuf,

    /// Learning rate for actor, critic, and temperature.
    #[structopt(long)]
    lr: Option<f64>,

    /// Discount factor.
    #[structopt(long)]
    gamma: Option<f32>,

    /// Batch size for gradient updates.
    #[structopt(long)]
    batch_size: Option<usize>,

    /// Stop early once the rolling mean return reaches this value.
    #[structopt(long)]
    target_reward: Option<f32>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let opt = Opt::from_args();

    let layout = TrackLayout::parse(&opt.map)
        .ok_or_else(|| format!("unknown map '{}', expected map1 or map2", opt.map))?;

    racecar_rl::set_seed::<B>(opt.seed);

    let mut config = SACConfig::racecar().with_max_env_steps(opt.steps);
    if let Some(lr) = opt.lr {
        config = config.with_learning_rate(lr);
    }
    if let Some(gamma) = opt.gamma {
        config = config.with_gamma(gamma);
    }
    if let Some(batch_size) = opt.batch_size {
        config = config.with_batch_size(batch_size);
    }
    if let Some(target) = opt.target_reward {
        config = config.with_target_reward(target);
    }

    let run_dir = create_run_dir(&opt.runs_dir, &config)?;
    println!("run directory: {}", run_dir.display());

    let mut logger = MultiLogger::new()
        .add(ConsoleLogger::new(config.log_interval))
        .add(CsvLogger::new(run_dir.join("metrics.csv"))?);

    let mut checkpointer = Checkpointer::new(
        CheckpointerConfig::new(run_dir.join("checkpoints"))
            .with_save_interval(config.checkpoint_interval),
    )?;

    let device = Default::default();
    let env = RacecarEnv::new(layout);

    let actor: ActorNet<B> = ActorNet::new(
        env.obs_size(),
        env.action_dim(),
        &config.hidden_sizes,
        &device,
    );
    let critic: CriticNet<B> = CriticNet::new(
        env.obs_size(),
        env.action_dim(),
        &config.hidden_sizes,
        &device,
    );

    let runner: SACRunner<B> = SACRunner::new(config, device);
    runner.run(actor, critic, env, &mut logger, Some(&mut checkpointer))?;

    println!("training finished; checkpoints in {}", run_dir.join("checkpoints").display());
    Ok(())
}
