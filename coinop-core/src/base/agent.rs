//! Agent.
use super::Frame;
use crate::memory::ReplayMemory;
use anyhow::Result;
use std::path::Path;

/// A trainable action-value policy over windowed observations.
pub trait Agent<O: Frame> {
    /// Selects a discrete action for the current state window.
    ///
    /// `window` holds `window_length` consecutive frames, oldest first,
    /// zero-padded on the left near an episode start. In training mode the
    /// exploration policy applies; in evaluation mode its test
    /// parameterization is used instead.
    fn select_action(&mut self, window: &[O]) -> Result<usize>;

    /// Performs one optimization step on a batch sampled from `memory`.
    ///
    /// Returns the loss of the step. Target-network synchronization happens
    /// inside this call.
    fn opt(&mut self, memory: &mut ReplayMemory<O>) -> Result<f32>;

    /// Sets the agent to training mode.
    fn train(&mut self);

    /// Sets the agent to evaluation mode.
    fn eval(&mut self);

    /// Returns `true` in training mode.
    fn is_train(&self) -> bool;

    /// Saves the agent parameters in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Loads the agent parameters from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
