//! Circular transition store with lazy window reconstruction.
//!
//! Frames are stored once in a flat ring; state windows are rebuilt on
//! demand by walking backward from a sampled index, padding with zero
//! frames when an episode boundary is crossed. This trades a small CPU
//! cost per sample for not duplicating raw frames per window.
use super::ReplayMemoryConfig;
use crate::{error::CoinopError, Frame};
use anyhow::Result;
use rand::{rngs::StdRng, RngCore, SeedableRng};

/// A batch of transitions sampled from [`ReplayMemory`].
///
/// `obs[i]` and `next_obs[i]` are windows of `window_length` frames each,
/// oldest first. `is_terminal` uses `i8` flags; a terminal transition's
/// next-state window is defined but must not contribute to the bootstrap
/// target.
pub struct TransitionBatch<O: Frame> {
    /// State windows.
    pub obs: Vec<Vec<O>>,

    /// Selected actions.
    pub act: Vec<u32>,

    /// Clipped rewards.
    pub reward: Vec<f32>,

    /// Next-state windows.
    pub next_obs: Vec<Vec<O>>,

    /// Episode-end flags.
    pub is_terminal: Vec<i8>,
}

impl<O: Frame> TransitionBatch<O> {
    /// Returns the number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}

/// Bounded circular store of transitions with windowed uniform sampling.
///
/// Owned exclusively by the training-loop controller; `append` is the only
/// mutator of the stored data.
pub struct ReplayMemory<O: Frame> {
    capacity: usize,
    window_length: usize,

    /// Insertion cursor. Once the ring is full it also points at the oldest
    /// entry.
    i: usize,

    /// Current number of stored transitions.
    size: usize,

    obs: Vec<O>,
    act: Vec<u32>,
    reward: Vec<f32>,
    is_terminal: Vec<i8>,

    /// Random number generator for sampling.
    rng: StdRng,
}

impl<O: Frame> ReplayMemory<O> {
    /// Builds an empty memory from the given configuration.
    pub fn build(config: &ReplayMemoryConfig) -> Self {
        Self {
            capacity: config.capacity,
            window_length: config.window_length,
            i: 0,
            size: 0,
            obs: Vec::with_capacity(config.capacity),
            act: Vec::with_capacity(config.capacity),
            reward: Vec::with_capacity(config.capacity),
            is_terminal: Vec::with_capacity(config.capacity),
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Returns the current number of stored transitions.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if no transition is stored.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the configured window length.
    pub fn window_length(&self) -> usize {
        self.window_length
    }

    /// Translates a logical index (0 = oldest retained entry) into a ring
    /// position.
    fn phys(&self, j: usize) -> usize {
        debug_assert!(j < self.size);
        (self.i + self.capacity - self.size + j) % self.capacity
    }

    /// Returns the transition at logical index `j` as
    /// `(obs, act, reward, is_terminal)`.
    pub fn transition(&self, j: usize) -> (&O, u32, f32, bool) {
        let p = self.phys(j);
        (
            &self.obs[p],
            self.act[p],
            self.reward[p],
            self.is_terminal[p] == 1,
        )
    }

    /// Appends one transition, overwriting the oldest entry at capacity.
    ///
    /// `terminal` marks an episode boundary: the next appended frame belongs
    /// to a new episode and windows never mix frames across that boundary.
    pub fn append(&mut self, obs: O, act: usize, reward: f32, terminal: bool) {
        let flag = terminal as i8;
        if self.obs.len() < self.capacity {
            self.obs.push(obs);
            self.act.push(act as u32);
            self.reward.push(reward);
            self.is_terminal.push(flag);
        } else {
            self.obs[self.i] = obs;
            self.act[self.i] = act as u32;
            self.reward[self.i] = reward;
            self.is_terminal[self.i] = flag;
        }
        self.i = (self.i + 1) % self.capacity;
        self.size = (self.size + 1).min(self.capacity);
    }

    /// Reconstructs the window of `window_length` frames ending at logical
    /// index `e`, zero-padded on the left if an episode boundary is crossed.
    ///
    /// A frame `obs[k]` with `is_terminal[k] == 1` ended its episode, so the
    /// walk from `e` stops before including it: frames of a *different*
    /// prior episode are replaced by zero padding, never reused.
    fn window_ending_at(&self, e: usize) -> Vec<O> {
        let mut frames = Vec::with_capacity(self.window_length);
        frames.push(self.obs[self.phys(e)].clone());
        let mut k = e;
        while frames.len() < self.window_length && k > 0 {
            k -= 1;
            if self.is_terminal[self.phys(k)] == 1 {
                break;
            }
            frames.push(self.obs[self.phys(k)].clone());
        }
        let pad = frames[0].zeros_like();
        while frames.len() < self.window_length {
            frames.push(pad.clone());
        }
        frames.reverse();
        frames
    }

    /// Draws `size` transitions uniformly at random, with replacement.
    ///
    /// Valid positions exclude the newest entry (it lacks a complete
    /// next-state window) and the oldest `window_length - 1` entries (their
    /// windows would need history that no longer — or does not yet — exist).
    ///
    /// Fails with [`CoinopError::InsufficientData`] if no valid position
    /// exists.
    pub fn batch(&mut self, size: usize) -> Result<TransitionBatch<O>> {
        let lo = self.window_length - 1;
        // Highest logical index with a complete next window.
        if self.size < self.window_length + 1 {
            return Err(CoinopError::InsufficientData {
                required: self.window_length + 1,
                len: self.size,
            }
            .into());
        }
        let hi = self.size - 2;
        let n = hi - lo + 1;

        let mut obs = Vec::with_capacity(size);
        let mut act = Vec::with_capacity(size);
        let mut reward = Vec::with_capacity(size);
        let mut next_obs = Vec::with_capacity(size);
        let mut is_terminal = Vec::with_capacity(size);

        for _ in 0..size {
            let j = lo + (self.rng.next_u32() as usize) % n;
            let p = self.phys(j);
            obs.push(self.window_ending_at(j));
            next_obs.push(self.window_ending_at(j + 1));
            act.push(self.act[p]);
            reward.push(self.reward[p]);
            is_terminal.push(self.is_terminal[p]);
        }

        Ok(TransitionBatch {
            obs,
            act,
            reward,
            next_obs,
            is_terminal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::VectorFrame;

    fn frame(v: f32) -> VectorFrame {
        VectorFrame::new(vec![v])
    }

    fn value(f: &VectorFrame) -> f32 {
        f.data()[0]
    }

    fn memory(capacity: usize, window_length: usize) -> ReplayMemory<VectorFrame> {
        ReplayMemory::build(
            &ReplayMemoryConfig::default()
                .capacity(capacity)
                .window_length(window_length)
                .seed(7),
        )
    }

    #[test]
    fn ring_keeps_only_last_capacity_entries() {
        let mut m = memory(5, 1);
        for t in 0..8 {
            m.append(frame(t as f32), t, t as f32, false);
        }
        assert_eq!(m.len(), 5);
        for j in 0..5 {
            let (o, a, r, _) = m.transition(j);
            // Oldest retained entry is t = 3.
            assert_eq!(value(o), (j + 3) as f32);
            assert_eq!(a, (j + 3) as u32);
            assert_eq!(r, (j + 3) as f32);
        }
    }

    #[test]
    fn sampling_before_enough_data_fails() {
        let mut m = memory(10, 4);
        for t in 0..4 {
            m.append(frame(t as f32), 0, 0., false);
        }
        assert!(m.batch(1).is_err());
        m.append(frame(4.), 0, 0., false);
        assert!(m.batch(1).is_ok());
    }

    #[test]
    fn windows_are_zero_padded_at_episode_start() {
        let mut m = memory(100, 4);
        // First episode: frames 1..=3, terminal at 3.
        m.append(frame(1.), 0, 0., false);
        m.append(frame(2.), 0, 0., false);
        m.append(frame(3.), 0, 0., true);
        // Second episode: frames 10..=13.
        m.append(frame(10.), 0, 0., false);
        m.append(frame(11.), 0, 0., false);
        m.append(frame(12.), 0, 0., false);
        m.append(frame(13.), 0, 0., false);

        // Window ending at the second frame of episode two: padding on the
        // left, never frames 1..=3 from the previous episode.
        let w = m.window_ending_at(4);
        let vals: Vec<f32> = w.iter().map(value).collect();
        assert_eq!(vals, vec![0., 0., 10., 11.]);

        // Deep inside episode two there is no padding.
        let w = m.window_ending_at(6);
        let vals: Vec<f32> = w.iter().map(value).collect();
        assert_eq!(vals, vec![10., 11., 12., 13.]);

        // A window ending on the terminal frame stays within episode one.
        let w = m.window_ending_at(2);
        let vals: Vec<f32> = w.iter().map(value).collect();
        assert_eq!(vals, vec![0., 1., 2., 3.]);
    }

    #[test]
    fn next_window_of_terminal_transition_starts_fresh() {
        let mut m = memory(100, 3);
        m.append(frame(1.), 0, 0., false);
        m.append(frame(2.), 0, 0., true);
        m.append(frame(10.), 0, 0., false);
        m.append(frame(11.), 0, 0., false);

        // Next window of the terminal transition at logical index 1 ends at
        // index 2 — the first frame of the new episode, zero-padded.
        let w = m.window_ending_at(2);
        let vals: Vec<f32> = w.iter().map(value).collect();
        assert_eq!(vals, vec![0., 0., 10.]);
    }

    #[test]
    fn sampled_batch_has_consistent_shapes() {
        let mut m = memory(50, 4);
        for t in 0..30 {
            m.append(frame(t as f32), t % 3, 1., (t + 1) % 10 == 0);
        }
        let batch = m.batch(16).unwrap();
        assert_eq!(batch.len(), 16);
        for i in 0..16 {
            assert_eq!(batch.obs[i].len(), 4);
            assert_eq!(batch.next_obs[i].len(), 4);
        }
    }

    #[test]
    fn sampling_is_reproducible_under_a_fixed_seed() {
        let mut a = memory(50, 2);
        let mut b = memory(50, 2);
        for t in 0..20 {
            a.append(frame(t as f32), t, t as f32, false);
            b.append(frame(t as f32), t, t as f32, false);
        }
        let ba = a.batch(8).unwrap();
        let bb = b.batch(8).unwrap();
        assert_eq!(ba.act, bb.act);
        assert_eq!(ba.reward, bb.reward);
    }
}
