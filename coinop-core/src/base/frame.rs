//! Processed observation frames.
use std::fmt::Debug;

/// A processed observation with a fixed number of elements.
///
/// Frames are stored by value in the replay memory and never mutated after
/// insertion. Pixel frames keep a compact integer form to save memory and
/// are rescaled into the floating-point range the approximator expects only
/// when a batch is assembled.
pub trait Frame: Clone + Debug {
    /// Returns the number of elements in the frame.
    fn len(&self) -> usize;

    /// Returns `true` if the frame has no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a zero-filled frame of the same shape.
    ///
    /// Used to pad state windows on the left when an episode boundary is
    /// crossed before the window is full.
    fn zeros_like(&self) -> Self;

    /// Writes the frame into `out`, rescaled for the approximator.
    ///
    /// `out.len()` must equal [`Frame::len`].
    fn write_scaled(&self, out: &mut [f32]);
}
