//! Target network and its synchronization scheme.
use anyhow::Result;
use coinop_core::Approximator;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// How the target network follows the online network.
///
/// Exactly one mode is active per run.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub enum SyncMode {
    /// Full parameter copy every `interval` optimization steps.
    Hard {
        /// Synchronization interval in optimization steps.
        interval: usize,
    },

    /// Polyak blend `target = (1 - tau) * target + tau * online` every
    /// optimization step. Used for small environments.
    Soft {
        /// Blend factor, typically well below 1.
        tau: f32,
    },
}

/// A lagged copy of the online approximator used for bootstrap targets.
///
/// Using a slowly-moving copy breaks the feedback loop of the network
/// chasing a target derived from itself, which otherwise diverges. The copy
/// is mutated only by [`TargetNetwork::maybe_sync`].
pub struct TargetNetwork<Q: Approximator + Clone> {
    net: Q,
    mode: SyncMode,
    last_sync: usize,
}

impl<Q: Approximator + Clone> TargetNetwork<Q> {
    /// Creates a target network as a copy of the online network.
    pub fn new(online: &Q, mode: SyncMode) -> Self {
        Self {
            net: online.clone(),
            mode,
            last_sync: 0,
        }
    }

    /// Returns the lagged network.
    pub fn network(&self) -> &Q {
        &self.net
    }

    /// Returns the lagged network mutably (parameter loading only).
    pub fn network_mut(&mut self) -> &mut Q {
        &mut self.net
    }

    /// Computes one bootstrap target per sampled transition.
    ///
    /// `target = reward` exactly when the transition is terminal, else
    /// `reward + gamma * max_a Q_target(next_state)`. A terminal
    /// transition's next-state window therefore never contributes,
    /// regardless of its Q-values.
    pub fn compute_targets(
        &self,
        next_states: &Array2<f32>,
        reward: &[f32],
        is_terminal: &[i8],
        gamma: f32,
    ) -> Result<Vec<f32>> {
        let q_next = self.net.predict(next_states)?;
        Ok(reward
            .iter()
            .zip(is_terminal.iter())
            .enumerate()
            .map(|(i, (&r, &terminal))| {
                if terminal == 1 {
                    r
                } else {
                    let max = q_next.row(i).iter().cloned().fold(f32::NEG_INFINITY, f32::max);
                    r + gamma * max
                }
            })
            .collect())
    }

    /// Refreshes the lagged copy according to the configured mode.
    ///
    /// `opt_step` counts optimization steps, starting at 1.
    pub fn maybe_sync(&mut self, online: &Q, opt_step: usize) {
        match self.mode {
            SyncMode::Hard { interval } => {
                if opt_step - self.last_sync >= interval {
                    self.net.track(online, 1.0);
                    self.last_sync = opt_step;
                }
            }
            SyncMode::Soft { tau } => {
                self.net.track(online, tau);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use ndarray::Array2;
    use std::path::Path;

    /// Predicts the same Q-row for every batch element.
    #[derive(Clone)]
    struct ConstApprox(Vec<f32>);

    impl Approximator for ConstApprox {
        fn predict(&self, input: &Array2<f32>) -> Result<Array2<f32>> {
            let n = input.nrows();
            let mut out = Array2::zeros((n, self.0.len()));
            for i in 0..n {
                for (j, v) in self.0.iter().enumerate() {
                    out[[i, j]] = *v;
                }
            }
            Ok(out)
        }

        fn train_on_batch(&mut self, _: &Array2<f32>, _: &Array2<f32>) -> Result<f32> {
            Ok(0.)
        }

        fn out_dim(&self) -> usize {
            self.0.len()
        }

        fn track(&mut self, src: &Self, tau: f32) {
            for (a, b) in self.0.iter_mut().zip(src.0.iter()) {
                *a = (1. - tau) * *a + tau * *b;
            }
        }

        fn save(&self, _: &Path) -> Result<()> {
            Ok(())
        }

        fn load(&mut self, _: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn terminal_target_is_the_reward_exactly() {
        // Next-state Q-values are large on purpose; a terminal transition
        // must ignore them.
        let online = ConstApprox(vec![100., 200.]);
        let tgt = TargetNetwork::new(&online, SyncMode::Hard { interval: 1 });
        let next = Array2::zeros((2, 3));
        let targets = tgt
            .compute_targets(&next, &[5.0, 1.0], &[1, 0], 0.9)
            .unwrap();
        assert_eq!(targets[0], 5.0);
        assert!((targets[1] - (1.0 + 0.9 * 200.)).abs() < 1e-5);
    }

    #[test]
    fn hard_sync_copies_at_the_interval_only() {
        let mut online = ConstApprox(vec![1., 2.]);
        let mut tgt = TargetNetwork::new(&online, SyncMode::Hard { interval: 3 });

        online.0 = vec![10., 20.];
        tgt.maybe_sync(&online, 1);
        assert_eq!(tgt.network().0, vec![1., 2.]);
        tgt.maybe_sync(&online, 2);
        assert_eq!(tgt.network().0, vec![1., 2.]);
        tgt.maybe_sync(&online, 3);
        assert_eq!(tgt.network().0, vec![10., 20.]);

        // Unchanged again until the next interval elapses.
        online.0 = vec![30., 40.];
        tgt.maybe_sync(&online, 4);
        tgt.maybe_sync(&online, 5);
        assert_eq!(tgt.network().0, vec![10., 20.]);
        tgt.maybe_sync(&online, 6);
        assert_eq!(tgt.network().0, vec![30., 40.]);
    }

    #[test]
    fn soft_sync_blends_every_step() {
        let online = ConstApprox(vec![1.]);
        let mut tgt = TargetNetwork::new(&ConstApprox(vec![0.]), SyncMode::Soft { tau: 0.5 });
        tgt.maybe_sync(&online, 1);
        assert_eq!(tgt.network().0, vec![0.5]);
        tgt.maybe_sync(&online, 2);
        assert_eq!(tgt.network().0, vec![0.75]);
    }
}
