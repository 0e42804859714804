//! Turns raw environment observations into stored frames.
//!
//! A [`Processor`] is stateless and deterministic so that replayed
//! transitions stay reproducible. Pixel observations are quantised into a
//! compact `u8` form on the way into the replay memory and divided by the
//! maximum representable value on the way out; low-dimensional state
//! vectors pass through unchanged. Rewards are clipped into a symmetric
//! range to bound gradient magnitude — lossy and intentional.
use crate::{error::CoinopError, Frame};
use anyhow::Result;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// A single-channel intensity frame stored as bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelFrame {
    data: Vec<u8>,
}

impl PixelFrame {
    /// Constructs a frame from raw bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Returns the stored bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Frame for PixelFrame {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn zeros_like(&self) -> Self {
        Self {
            data: vec![0; self.data.len()],
        }
    }

    fn write_scaled(&self, out: &mut [f32]) {
        for (o, v) in out.iter_mut().zip(self.data.iter()) {
            *o = *v as f32 / 255.;
        }
    }
}

/// A low-dimensional state vector stored as-is.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorFrame {
    data: Vec<f32>,
}

impl VectorFrame {
    /// Constructs a frame from raw values.
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Returns the stored values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

impl Frame for VectorFrame {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn zeros_like(&self) -> Self {
        Self {
            data: vec![0.; self.data.len()],
        }
    }

    fn write_scaled(&self, out: &mut [f32]) {
        out.copy_from_slice(&self.data);
    }
}

/// Maps raw observations to frames and clips rewards.
pub trait Processor: Clone {
    /// The frame type this processor produces.
    type Frame: Frame;

    /// Deterministically maps a raw observation to a frame.
    ///
    /// Fails with [`CoinopError::Shape`] if `raw` does not have the number
    /// of elements the processor was built for.
    fn process_observation(&self, raw: &[f32]) -> Result<Self::Frame>;

    /// Clips the reward into the configured symmetric range.
    fn process_reward(&self, reward: f32) -> f32;
}

/// Processor for pixel environments.
///
/// Expects raw intensities in `[0, 255]` and quantises them to bytes.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PixelProcessor {
    /// Shape of raw observations, e.g. `[84, 84]`.
    pub shape: Vec<usize>,

    /// Reward clip range.
    pub reward_clip: (f32, f32),
}

impl PixelProcessor {
    /// Constructs a processor for the given observation shape.
    pub fn new(shape: Vec<usize>) -> Self {
        Self {
            shape,
            reward_clip: (-1., 1.),
        }
    }

    /// Sets the reward clip range.
    pub fn reward_clip(mut self, min: f32, max: f32) -> Self {
        self.reward_clip = (min, max);
        self
    }
}

impl Processor for PixelProcessor {
    type Frame = PixelFrame;

    fn process_observation(&self, raw: &[f32]) -> Result<PixelFrame> {
        let expected: usize = self.shape.iter().product();
        if raw.len() != expected {
            return Err(CoinopError::Shape {
                expected: self.shape.clone(),
                got: raw.len(),
            }
            .into());
        }
        let data = raw.iter().map(|v| v.clamp(0., 255.) as u8).collect();
        Ok(PixelFrame::new(data))
    }

    fn process_reward(&self, reward: f32) -> f32 {
        reward.clamp(self.reward_clip.0, self.reward_clip.1)
    }
}

/// Pass-through processor for vector-state environments.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct VectorProcessor {
    /// Dimension of raw observations.
    pub dim: usize,

    /// Reward clip range.
    pub reward_clip: (f32, f32),
}

impl VectorProcessor {
    /// Constructs a processor for the given observation dimension.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            reward_clip: (-1., 1.),
        }
    }

    /// Sets the reward clip range.
    pub fn reward_clip(mut self, min: f32, max: f32) -> Self {
        self.reward_clip = (min, max);
        self
    }
}

impl Processor for VectorProcessor {
    type Frame = VectorFrame;

    fn process_observation(&self, raw: &[f32]) -> Result<VectorFrame> {
        if raw.len() != self.dim {
            return Err(CoinopError::Shape {
                expected: vec![self.dim],
                got: raw.len(),
            }
            .into());
        }
        Ok(VectorFrame::new(raw.to_vec()))
    }

    fn process_reward(&self, reward: f32) -> f32 {
        reward.clamp(self.reward_clip.0, self.reward_clip.1)
    }
}

/// Assembles sampled windows into the approximator input matrix.
///
/// Each row is one flattened window, frames oldest first, rescaled via
/// [`Frame::write_scaled`]. All windows must have the same length and all
/// frames the same number of elements.
pub fn process_state_batch<O: Frame>(windows: &[Vec<O>]) -> Array2<f32> {
    if windows.is_empty() {
        return Array2::zeros((0, 0));
    }
    let window_length = windows[0].len();
    let frame_len = windows[0][0].len();
    let mut out = Array2::zeros((windows.len(), window_length * frame_len));
    let mut row = vec![0f32; window_length * frame_len];
    for (i, window) in windows.iter().enumerate() {
        for (k, frame) in window.iter().enumerate() {
            frame.write_scaled(&mut row[k * frame_len..(k + 1) * frame_len]);
        }
        for (j, v) in row.iter().enumerate() {
            out[[i, j]] = *v;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_shape_mismatch_fails() {
        let proc = PixelProcessor::new(vec![2, 2]);
        assert!(proc.process_observation(&[0., 1., 2.]).is_err());
        assert!(proc.process_observation(&[0., 1., 2., 3.]).is_ok());
    }

    #[test]
    fn reward_clip_is_idempotent() {
        let proc = PixelProcessor::new(vec![1]);
        for r in [-10., -1., -0.3, 0., 0.7, 1., 42.] {
            let once = proc.process_reward(r);
            assert_eq!(proc.process_reward(once), once);
            assert!(once >= -1. && once <= 1.);
        }
    }

    #[test]
    fn pixel_frame_rescales_by_max_value() {
        let proc = PixelProcessor::new(vec![3]);
        let frame = proc.process_observation(&[0., 127.5, 255.]).unwrap();
        let mut out = [0f32; 3];
        frame.write_scaled(&mut out);
        assert_eq!(out[0], 0.);
        assert_eq!(out[2], 1.);
        assert!((out[1] - 127. / 255.).abs() < 1e-6);
    }

    #[test]
    fn state_batch_flattens_windows_oldest_first() {
        let w1 = vec![
            VectorFrame::new(vec![1., 2.]),
            VectorFrame::new(vec![3., 4.]),
        ];
        let w2 = vec![
            VectorFrame::new(vec![5., 6.]),
            VectorFrame::new(vec![7., 8.]),
        ];
        let batch = process_state_batch(&[w1, w2]);
        assert_eq!(batch.shape(), &[2, 4]);
        assert_eq!(batch.row(0).to_vec(), vec![1., 2., 3., 4.]);
        assert_eq!(batch.row(1).to_vec(), vec![5., 6., 7., 8.]);
    }
}
