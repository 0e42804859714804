//! The function-approximator seam.
use anyhow::Result;
use ndarray::Array2;
use std::path::Path;

/// An opaque differentiable action-value function approximator.
///
/// This is the boundary where the training engine hands off to a numerical
/// backend. The engine never looks inside: each call is blocking, returns no
/// partial results, and a failure during [`Approximator::train_on_batch`]
/// aborts the run (a retried step could leave parameters in an undefined
/// blend).
pub trait Approximator {
    /// Returns Q-values for a batch of flattened state windows.
    ///
    /// `input` has shape `[batch, window_length * frame_len]`; the result
    /// has shape `[batch, n_actions]`.
    fn predict(&self, input: &Array2<f32>) -> Result<Array2<f32>>;

    /// Performs one optimizer step towards `targets` and returns the loss.
    ///
    /// `targets` is a full `[batch, n_actions]` matrix in which non-selected
    /// entries equal the current prediction, so only the selected action of
    /// each row contributes error.
    fn train_on_batch(&mut self, input: &Array2<f32>, targets: &Array2<f32>) -> Result<f32>;

    /// Number of actions (output dimension).
    fn out_dim(&self) -> usize;

    /// Blends own parameters towards `src`: `self = (1 - tau) * self + tau * src`.
    ///
    /// `tau = 1.0` is a hard copy.
    fn track(&mut self, src: &Self, tau: f32);

    /// Saves a parameter snapshot into the given file.
    fn save(&self, path: &Path) -> Result<()>;

    /// Restores a parameter snapshot from the given file.
    fn load(&mut self, path: &Path) -> Result<()>;
}
