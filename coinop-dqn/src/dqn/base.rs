//! DQN agent.
use super::{config::DqnConfig, explorer::DqnExplorer, target::TargetNetwork};
use anyhow::Result;
use coinop_core::{
    memory::ReplayMemory,
    processor::process_state_batch,
    Agent, Approximator, Frame,
};
use log::info;
use std::{fs, marker::PhantomData, path::Path};

/// DQN agent over an opaque approximator.
///
/// Owns the online network, the lagged [`TargetNetwork`] and the
/// exploration policy. One [`Agent::opt`] call performs one training step:
/// sample a batch, compute bootstrap targets through the target network,
/// run one optimizer step on the online network, then check whether the
/// target must be synchronized.
pub struct Dqn<Q, O>
where
    Q: Approximator + Clone,
    O: Frame,
{
    qnet: Q,
    qnet_tgt: TargetNetwork<Q>,
    explorer: DqnExplorer,
    batch_size: usize,
    discount_factor: f32,
    train: bool,

    /// Environment steps taken so far; drives the exploration schedule.
    n_steps: usize,

    /// Optimization steps taken so far; drives target synchronization.
    n_opts: usize,

    rng: fastrand::Rng,
    phantom: PhantomData<O>,
}

impl<Q, O> Dqn<Q, O>
where
    Q: Approximator + Clone,
    O: Frame,
{
    /// Constructs a DQN agent around the given online network.
    ///
    /// The target network starts as an exact copy.
    pub fn new(qnet: Q, config: DqnConfig) -> Self {
        let qnet_tgt = TargetNetwork::new(&qnet, config.sync);
        Self {
            qnet,
            qnet_tgt,
            explorer: config.explorer,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            train: true,
            n_steps: 0,
            n_opts: 0,
            rng: fastrand::Rng::with_seed(config.seed),
            phantom: PhantomData,
        }
    }

    /// Returns the number of optimization steps taken.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Returns the lagged target network.
    pub fn target_network(&self) -> &Q {
        self.qnet_tgt.network()
    }

    fn update_critic(&mut self, memory: &mut ReplayMemory<O>) -> Result<f32> {
        let batch = memory.batch(self.batch_size)?;
        let obs = process_state_batch(&batch.obs);
        let next_obs = process_state_batch(&batch.next_obs);

        let tgt_values = self.qnet_tgt.compute_targets(
            &next_obs,
            &batch.reward,
            &batch.is_terminal,
            self.discount_factor,
        )?;

        // Full target matrix: non-selected actions keep their predicted
        // value so only the selected action contributes error.
        let mut targets = self.qnet.predict(&obs)?;
        for (i, (&act, &tgt)) in batch.act.iter().zip(tgt_values.iter()).enumerate() {
            targets[[i, act as usize]] = tgt;
        }

        self.qnet.train_on_batch(&obs, &targets)
    }
}

impl<Q, O> Agent<O> for Dqn<Q, O>
where
    Q: Approximator + Clone,
    O: Frame,
{
    fn select_action(&mut self, window: &[O]) -> Result<usize> {
        let input = process_state_batch(&[window.to_vec()]);
        let q = self.qnet.predict(&input)?;
        let q_values = q.row(0).to_vec();
        let step = self.n_steps;
        if self.train {
            self.n_steps += 1;
        }
        self.explorer
            .select(&q_values, step, self.train, &mut self.rng)
    }

    fn opt(&mut self, memory: &mut ReplayMemory<O>) -> Result<f32> {
        let loss = self.update_critic(memory)?;
        self.n_opts += 1;
        self.qnet_tgt.maybe_sync(&self.qnet, self.n_opts);
        Ok(loss)
    }

    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(&path.join("qnet.bin"))?;
        self.qnet_tgt.network().save(&path.join("qnet_tgt.bin"))?;
        info!("Saved Q-networks in {:?}", path);
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.qnet.load(&path.join("qnet.bin"))?;
        self.qnet_tgt
            .network_mut()
            .load(&path.join("qnet_tgt.bin"))?;
        Ok(())
    }
}
