//! Trains a DQN agent on a one-dimensional corridor.
//!
//! The agent starts in the middle of a corridor and must walk to the right
//! end. Moving costs a small penalty, reaching the goal pays 1. Run with
//! `RUST_LOG=info` to see the trainer's progress messages.
use anyhow::Result;
use coinop_core::{
    callback::{Callback, CsvLogger},
    memory::ReplayMemoryConfig,
    processor::VectorProcessor,
    Env, Trainer, TrainerConfig,
};
use coinop_dqn::{
    dqn::{Dqn, DqnConfig, DqnExplorer, EpsilonGreedy, SyncMode},
    mlp::{Mlp, MlpConfig},
};

const CORRIDOR_LENGTH: usize = 8;
const WINDOW_LENGTH: usize = 2;
const MAX_EPISODE_STEPS: usize = 50;

#[derive(Clone)]
struct CorridorConfig;

struct Corridor {
    pos: usize,
    t: usize,
    shape: Vec<usize>,
}

impl Corridor {
    fn obs(&self) -> Vec<f32> {
        vec![self.pos as f32 / CORRIDOR_LENGTH as f32]
    }
}

impl Env for Corridor {
    type Config = CorridorConfig;

    fn build(_config: &CorridorConfig, _seed: u64) -> Result<Self> {
        Ok(Self {
            pos: CORRIDOR_LENGTH / 2,
            t: 0,
            shape: vec![1],
        })
    }

    fn reset(&mut self) -> Result<Vec<f32>> {
        self.pos = CORRIDOR_LENGTH / 2;
        self.t = 0;
        Ok(self.obs())
    }

    fn step(&mut self, act: usize) -> (Vec<f32>, f32, bool) {
        self.t += 1;
        if act == 0 {
            self.pos = self.pos.saturating_sub(1);
        } else {
            self.pos = (self.pos + 1).min(CORRIDOR_LENGTH);
        }
        let at_goal = self.pos == CORRIDOR_LENGTH;
        let reward = if at_goal { 1. } else { -0.01 };
        let terminal = at_goal || self.pos == 0 || self.t >= MAX_EPISODE_STEPS;
        (self.obs(), reward, terminal)
    }

    fn action_space_size(&self) -> usize {
        2
    }

    fn observation_shape(&self) -> &[usize] {
        &self.shape
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mlp = Mlp::build(
        &MlpConfig::new(WINDOW_LENGTH, 32, 2)
            .learning_rate(0.01)
            .seed(42),
    );
    let mut agent = Dqn::new(
        mlp,
        DqnConfig::default()
            .batch_size(32)
            .discount_factor(0.99)
            .sync(SyncMode::Hard { interval: 100 })
            .explorer(DqnExplorer::EpsilonGreedy(
                EpsilonGreedy::new().anneal_steps(5_000),
            )),
    );

    let mut trainer = Trainer::<Corridor, _>::build(
        TrainerConfig::default()
            .max_steps(10_000)
            .warmup_period(500)
            .opt_interval(1)
            .eval_episodes(10)
            .model_dir("model/dqn_corridor"),
        CorridorConfig,
        ReplayMemoryConfig::default()
            .capacity(10_000)
            .window_length(WINDOW_LENGTH),
        VectorProcessor::new(1),
    );

    let mut callbacks: Vec<Box<dyn Callback>> =
        vec![Box::new(CsvLogger::new("dqn_corridor_episodes.csv")?)];
    let summary = trainer.train(&mut agent, &mut callbacks)?;

    println!(
        "{} steps, {} optimization steps, {} episodes",
        summary.env_steps, summary.opt_steps, summary.episodes
    );
    if let Some(eval_reward) = summary.eval_reward {
        println!("mean evaluation return: {:.3}", eval_reward);
    }
    Ok(())
}
