//! Recent-frame window of the running episode.
use crate::Frame;

/// Keeps the last `window_length` frames of the current episode.
///
/// The trainer and the evaluator use this to assemble the state window for
/// action selection. Cleared at every episode boundary, so a fresh episode
/// starts with a zero-padded window and never sees frames of the previous
/// episode.
pub struct WindowBuffer<O: Frame> {
    window_length: usize,
    frames: Vec<O>,
}

impl<O: Frame> WindowBuffer<O> {
    /// Creates an empty buffer for windows of the given length.
    pub fn new(window_length: usize) -> Self {
        assert!(window_length > 0);
        Self {
            window_length,
            frames: Vec::with_capacity(window_length),
        }
    }

    /// Appends the newest frame, dropping the oldest if the buffer is full.
    pub fn push(&mut self, frame: O) {
        if self.frames.len() == self.window_length {
            self.frames.remove(0);
        }
        self.frames.push(frame);
    }

    /// Drops all frames (episode boundary).
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Returns the current window, oldest first, zero-padded on the left.
    ///
    /// Panics if no frame has been pushed since the last clear; the caller
    /// always pushes the initial observation right after a reset.
    pub fn window(&self) -> Vec<O> {
        assert!(!self.frames.is_empty());
        let pad = self.frames[0].zeros_like();
        let n_pad = self.window_length - self.frames.len();
        let mut window = vec![pad; n_pad];
        window.extend(self.frames.iter().cloned());
        window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::VectorFrame;

    #[test]
    fn pads_left_until_full_then_slides() {
        let mut buf = WindowBuffer::new(3);
        buf.push(VectorFrame::new(vec![1.]));
        let vals: Vec<f32> = buf.window().iter().map(|f| f.data()[0]).collect();
        assert_eq!(vals, vec![0., 0., 1.]);

        buf.push(VectorFrame::new(vec![2.]));
        buf.push(VectorFrame::new(vec![3.]));
        buf.push(VectorFrame::new(vec![4.]));
        let vals: Vec<f32> = buf.window().iter().map(|f| f.data()[0]).collect();
        assert_eq!(vals, vec![2., 3., 4.]);

        buf.clear();
        buf.push(VectorFrame::new(vec![5.]));
        let vals: Vec<f32> = buf.window().iter().map(|f| f.data()[0]).collect();
        assert_eq!(vals, vec![0., 0., 5.]);
    }
}
