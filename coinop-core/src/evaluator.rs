//! Deterministic evaluation episodes for a trained agent.
use crate::{processor::Processor, Agent, Env, WindowBuffer};
use anyhow::Result;
use log::info;

/// Runs a fixed number of evaluation episodes and averages the returns.
///
/// The evaluator never writes to the replay memory and never triggers an
/// optimization step; the caller is expected to put the agent in evaluation
/// mode first, so that the exploration policy uses its test
/// parameterization.
pub struct DefaultEvaluator<E: Env, P: Processor> {
    n_episodes: usize,
    window_length: usize,
    processor: P,
    env: E,
}

impl<E: Env, P: Processor> DefaultEvaluator<E, P> {
    /// Constructs an evaluator with its own environment instance.
    pub fn new(
        config: &E::Config,
        seed: u64,
        n_episodes: usize,
        window_length: usize,
        processor: P,
    ) -> Result<Self> {
        Ok(Self {
            n_episodes,
            window_length,
            processor,
            env: E::build(config, seed)?,
        })
    }

    /// Runs the evaluation episodes and returns the mean episode return.
    pub fn evaluate<A: Agent<P::Frame>>(&mut self, agent: &mut A) -> Result<f32> {
        let mut r_total = 0f32;

        for episode in 0..self.n_episodes {
            let mut recent = WindowBuffer::new(self.window_length);
            let raw = self.env.reset()?;
            recent.push(self.processor.process_observation(&raw)?);
            let mut r_episode = 0f32;

            loop {
                let act = agent.select_action(&recent.window())?;
                let (raw, reward, terminal) = self.env.step(act);
                r_episode += reward;
                if terminal {
                    break;
                }
                recent.push(self.processor.process_observation(&raw)?);
            }

            info!("Evaluation episode {}: return = {}", episode, r_episode);
            r_total += r_episode;
        }

        Ok(r_total / self.n_episodes as f32)
    }
}
