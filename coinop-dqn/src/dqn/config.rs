//! Configuration of [`Dqn`](super::Dqn).
use super::{DqnExplorer, EpsilonGreedy, SyncMode};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Dqn`](super::Dqn).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig {
    /// Number of transitions per sampled batch.
    pub batch_size: usize,

    /// Discount factor (gamma) of the bootstrap target.
    pub discount_factor: f32,

    /// Target-network synchronization scheme.
    pub sync: SyncMode,

    /// Exploration strategy.
    pub explorer: DqnExplorer,

    /// Random seed of the exploration policy.
    pub seed: u64,
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            discount_factor: 0.99,
            sync: SyncMode::Hard { interval: 10_000 },
            explorer: DqnExplorer::EpsilonGreedy(EpsilonGreedy::new()),
            seed: 42,
        }
    }
}

impl DqnConfig {
    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount_factor(mut self, v: f32) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets the synchronization scheme.
    pub fn sync(mut self, v: SyncMode) -> Self {
        self.sync = v;
        self
    }

    /// Sets the exploration strategy.
    pub fn explorer(mut self, v: DqnExplorer) -> Self {
        self.explorer = v;
        self
    }

    /// Sets the random seed of the exploration policy.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`DqnConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
