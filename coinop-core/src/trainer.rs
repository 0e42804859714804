//! Train an [`Agent`].
mod config;

use crate::{
    callback::Callback,
    error::CoinopError,
    memory::{ReplayMemory, ReplayMemoryConfig},
    processor::Processor,
    record::{
        Record,
        RecordValue::{DateTime, Scalar},
    },
    Agent, DefaultEvaluator, Env, WindowBuffer,
};
use anyhow::Result;
use chrono::Local;
pub use config::TrainerConfig;
use log::info;

/// Manages the training loop and the objects it owns.
///
/// The loop moves through three phases:
///
/// * **Warmup** — for the first `warmup_period` environment steps, actions
///   are selected and transitions stored, but no optimization step runs.
///   This fills the replay memory with diverse data before any gradient
///   update.
/// * **Training** — after warmup, once every `opt_interval` steps the agent
///   performs one optimization step on a batch sampled from the replay
///   memory. Target-network synchronization happens inside the agent.
/// * **Done** — once `max_steps` is reached, final parameters are saved and
///   an optional block of deterministic evaluation episodes runs with the
///   agent in evaluation mode; no memory write and no optimization step
///   happens past this point.
///
/// Per step the observable side effects are exactly one replay-memory
/// append, zero or one optimization step, and the
/// [`Callback::on_step_end`] / [`Callback::on_episode_end`] events.
///
/// Any approximator failure during an optimization step is wrapped into
/// [`CoinopError::TrainingAborted`] and ends the run; the loop never
/// retries a step, since a retried gradient update would leave parameters
/// in an undefined blend and desynchronize reward accounting.
pub struct Trainer<E, P>
where
    E: Env,
    P: Processor,
{
    /// Configuration of the environment for training.
    env_config: E::Config,

    /// Configuration of the replay memory.
    memory_config: ReplayMemoryConfig,

    /// Observation/reward processor, shared with the evaluator.
    processor: P,

    /// Where to save the trained model.
    model_dir: Option<String>,

    /// Total number of environment steps.
    max_steps: usize,

    /// Environment steps before the first optimization step.
    warmup_period: usize,

    /// Interval of optimization in environment steps.
    opt_interval: usize,

    /// Interval of saving model parameters in environment steps.
    save_interval: usize,

    /// Number of evaluation episodes run after training.
    eval_episodes: usize,

    /// Random seed for the environment.
    seed: u64,
}

/// Counters of a finished training run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainSummary {
    /// Environment steps executed.
    pub env_steps: usize,

    /// Optimization steps executed.
    pub opt_steps: usize,

    /// Episodes completed.
    pub episodes: usize,

    /// Mean return of the evaluation episodes, if any ran.
    pub eval_reward: Option<f32>,
}

impl<E, P> Trainer<E, P>
where
    E: Env,
    P: Processor,
{
    /// Constructs a trainer.
    pub fn build(
        config: TrainerConfig,
        env_config: E::Config,
        memory_config: ReplayMemoryConfig,
        processor: P,
    ) -> Self {
        Self {
            env_config,
            memory_config,
            processor,
            model_dir: config.model_dir,
            max_steps: config.max_steps,
            warmup_period: config.warmup_period,
            opt_interval: config.opt_interval,
            save_interval: config.save_interval,
            eval_episodes: config.eval_episodes,
            seed: config.seed,
        }
    }

    fn save_model<A: Agent<P::Frame>>(agent: &A, model_dir: &str) {
        match agent.save_params(model_dir.as_ref()) {
            Ok(()) => info!("Saved the model in {:?}", model_dir),
            Err(_) => info!("Failed to save model in {:?}", model_dir),
        }
    }

    /// Runs the training loop to completion.
    pub fn train<A>(
        &mut self,
        agent: &mut A,
        callbacks: &mut [Box<dyn Callback>],
    ) -> Result<TrainSummary>
    where
        A: Agent<P::Frame>,
    {
        let mut env = E::build(&self.env_config, self.seed)?;
        let mut memory = ReplayMemory::build(&self.memory_config);
        let mut recent = WindowBuffer::new(self.memory_config.window_length);
        let mut summary = TrainSummary::default();
        let mut episode_reward = 0f32;
        let mut episode_steps = 0usize;
        agent.train();

        let raw = env.reset()?;
        let mut frame = self.processor.process_observation(&raw)?;
        recent.push(frame.clone());

        for step in 1..=self.max_steps {
            // Environment step: select an action from the current window,
            // apply it, store the transition.
            let act = agent.select_action(&recent.window())?;
            let (raw, reward, terminal) = env.step(act);
            let reward = self.processor.process_reward(reward);
            memory.append(frame.clone(), act, reward, terminal);
            summary.env_steps = step;
            episode_reward += reward;
            episode_steps += 1;

            // Optimization step.
            let mut loss = None;
            if step > self.warmup_period && step % self.opt_interval == 0 {
                let l = agent
                    .opt(&mut memory)
                    .map_err(|source| CoinopError::TrainingAborted { step, source })?;
                summary.opt_steps += 1;
                loss = Some(l);
            }

            let mut record = Record::from_scalar("reward", reward);
            record.insert("episode_step_count", Scalar(episode_steps as f32));
            if let Some(l) = loss {
                record.insert("loss", Scalar(l));
            }
            for cb in callbacks.iter_mut() {
                cb.on_step_end(step, &record);
            }

            if terminal {
                summary.episodes += 1;
                let record = Record::from_slice(&[
                    ("episode_reward", Scalar(episode_reward)),
                    ("episode_length", Scalar(episode_steps as f32)),
                    ("datetime", DateTime(Local::now())),
                ]);
                for cb in callbacks.iter_mut() {
                    cb.on_episode_end(summary.episodes, &record);
                }

                // Fresh window for the new episode; the finished episode's
                // frames stay in the replay memory for sampling.
                let raw = env.reset()?;
                frame = self.processor.process_observation(&raw)?;
                recent.clear();
                recent.push(frame.clone());
                episode_reward = 0.;
                episode_steps = 0;
            } else {
                frame = self.processor.process_observation(&raw)?;
                recent.push(frame.clone());
            }

            if self.save_interval > 0 && step % self.save_interval == 0 {
                if let Some(model_dir) = &self.model_dir {
                    Self::save_model(agent, model_dir);
                }
            }
        }

        if let Some(model_dir) = &self.model_dir {
            Self::save_model(agent, model_dir);
        }

        if self.eval_episodes > 0 {
            info!("Starts evaluation of the trained model");
            agent.eval();
            let mut evaluator = DefaultEvaluator::<E, P>::new(
                &self.env_config,
                self.seed + 1,
                self.eval_episodes,
                self.memory_config.window_length,
                self.processor.clone(),
            )?;
            let eval_reward = evaluator.evaluate(agent)?;
            info!("Evaluation reward: {}", eval_reward);
            summary.eval_reward = Some(eval_reward);
        }

        Ok(summary)
    }
}
