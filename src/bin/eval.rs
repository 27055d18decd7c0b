//! Evaluate a trained policy deterministically.
//!
//! Reads `params.json` and the checkpoints from a run directory produced by
//! the train binary, then rolls out the squashed-mean policy.

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use burn::backend::ndarray::NdArray;
use structopt::StructOpt;

use racecar_rl::checkpoint::{Checkpointer, CheckpointerConfig};
use racecar_rl::env::{Environment, RacecarEnv, TrackLayout};
use racecar_rl::models::{ActorNet, CriticNet};
use racecar_rl::sac::{SACActor, SACConfig};

type B = NdArray<f32>;

#[derive(Debug, StructOpt)]
#[structopt(name = "eval", about = "Evaluate a trained policy")]
struct Opt {
    /// Run directory produced by the train binary.
    #[structopt(long, parse(from_os_str))]
    run_dir: PathBuf,

    /// Track layout: map1 or map2.
    #[structopt(long, default_value = "map1")]
    map: String,

    /// Number of evaluation episodes.
    #[structopt(long, default_value = "5")]
    episodes: usize,

    /// Load the best-scoring checkpoint instead of the latest.
    #[structopt(long)]
    best: bool,

    /// Print the reward of every step.
    #[structopt(long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let opt = Opt::from_args();

    let layout = TrackLayout::parse(&opt.map)
        .ok_or_else(|| format!("unknown map '{}', expected map1 or map2", opt.map))?;

    let config: SACConfig =
        serde_json::from_str(&fs::read_to_string(opt.run_dir.join("params.json"))?)?;

    let device = Default::default();
    let mut env = RacecarEnv::new(layout);

    let actor_template: ActorNet<B> = ActorNet::new(
        env.obs_size(),
        env.action_dim(),
        &config.hidden_sizes,
        &device,
    );
    let critic_template: CriticNet<B> = CriticNet::new(
        env.obs_size(),
        env.action_dim(),
        &config.hidden_sizes,
        &device,
    );

    let checkpointer =
        Checkpointer::new(CheckpointerConfig::new(opt.run_dir.join("checkpoints")))?;
    let loaded = if opt.best {
        checkpointer.load_best::<B, _, _>(actor_template, critic_template, &device)?
    } else {
        checkpointer.load_latest::<B, _, _>(actor_template, critic_template, &device)?
    };
    println!("loaded checkpoint from step {}", loaded.state.step);

    let actor = loaded.actor;
    let low = env.action_low();
    let high = env.action_high();

    let mut returns = Vec::with_capacity(opt.episodes);
    for episode in 0..opt.episodes {
        let mut obs = env.reset();
        let mut episode_return = 0.0;
        let mut steps = 0usize;

        loop {
            let obs_t = burn::tensor::Tensor::<B, 1>::from_floats(obs.as_slice(), &device)
                .reshape([1, obs.len()]);
            let squashed: Vec<f32> = actor
                .forward(obs_t)
                .deterministic()
                .into_data()
                .iter::<f32>()
                .collect();
            let action: Vec<f32> = squashed
                .iter()
                .zip(low.iter().zip(&high))
                .map(|(&a, (&l, &h))| a * (h - l) / 2.0 + (h + l) / 2.0)
                .collect();

            let result = env.step(&action);
            episode_return += result.reward;
            steps += 1;

            if opt.verbose {
                println!(
                    "episode {} step {}: reward {:.3}, return {:.3}",
                    episode, steps, result.reward, episode_return
                );
            }

            if result.done() {
                let end = if result.terminal { "collision" } else { "time limit" };
                println!(
                    "episode {}: return {:.2} over {} steps ({})",
                    episode, episode_return, steps, end
                );
                break;
            }
            obs = result.obs;
        }
        returns.push(episode_return);
    }

    let mean = returns.iter().sum::<f32>() / returns.len() as f32;
    println!("mean return over {} episodes: {:.2}", opt.episodes, mean);
    Ok(())
}
