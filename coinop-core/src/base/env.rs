//! Environment.
use anyhow::Result;

/// Represents an environment producing raw observations and rewards.
///
/// The environment is an external collaborator of the training engine: the
/// engine only consumes the operations below and never inspects the
/// simulator behind them. Raw observations are flat `f32` slices; the
/// [`Processor`](crate::processor::Processor) turns them into stored frames.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: u64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment and returns the initial raw observation.
    fn reset(&mut self) -> Result<Vec<f32>>;

    /// Applies a discrete action and returns `(raw_obs, reward, terminal)`.
    fn step(&mut self, act: usize) -> (Vec<f32>, f32, bool);

    /// Number of discrete actions.
    fn action_space_size(&self) -> usize;

    /// Shape of raw observations.
    fn observation_shape(&self) -> &[usize];
}
