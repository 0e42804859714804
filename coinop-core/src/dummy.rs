//! Deterministic stub environment used in tests.
use crate::Env;
use anyhow::Result;

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug)]
pub struct DummyEnvConfig {
    /// Number of discrete actions.
    pub n_actions: usize,

    /// Episode length; a terminal flag is raised every this many steps.
    pub episode_length: usize,

    /// Rewards emitted cyclically, one per step.
    pub rewards: Vec<f32>,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            n_actions: 2,
            episode_length: 10,
            rewards: vec![1.],
        }
    }
}

/// A deterministic environment with a fixed reward sequence and a terminal
/// flag every `episode_length` steps.
///
/// Observations are two-element vectors encoding the step count within the
/// episode, which makes window contents predictable in tests.
pub struct DummyEnv {
    config: DummyEnvConfig,
    t: usize,
    t_episode: usize,
    shape: Vec<usize>,
}

impl DummyEnv {
    fn obs(&self) -> Vec<f32> {
        vec![self.t_episode as f32, self.t as f32]
    }
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;

    fn build(config: &Self::Config, _seed: u64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            t: 0,
            t_episode: 0,
            shape: vec![2],
        })
    }

    fn reset(&mut self) -> Result<Vec<f32>> {
        self.t_episode = 0;
        Ok(self.obs())
    }

    fn step(&mut self, _act: usize) -> (Vec<f32>, f32, bool) {
        let reward = self.config.rewards[self.t % self.config.rewards.len()];
        self.t += 1;
        self.t_episode += 1;
        let terminal = self.t_episode >= self.config.episode_length;
        (self.obs(), reward, terminal)
    }

    fn action_space_size(&self) -> usize {
        self.config.n_actions
    }

    fn observation_shape(&self) -> &[usize] {
        &self.shape
    }
}
