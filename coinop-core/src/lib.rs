#![warn(missing_docs)]
//! Backend-independent core of a deep Q-learning training engine.
//!
//! The crate provides the pieces that do not depend on any particular
//! numerical backend: the [`Env`] and [`Approximator`] seams, the frame
//! [`processor`], the windowed [`memory::ReplayMemory`], the training-loop
//! [`Trainer`] and the [`record`]/[`callback`] telemetry types. A concrete
//! agent (see the `coinop-dqn` crate) plugs into these through the
//! [`Agent`] trait.
pub mod callback;
pub mod dummy;
pub mod error;
pub mod memory;
pub mod processor;
pub mod record;

mod base;
pub use base::{Agent, Approximator, Env, Frame};

mod window;
pub use window::WindowBuffer;

mod evaluator;
pub use evaluator::DefaultEvaluator;

mod trainer;
pub use trainer::{TrainSummary, Trainer, TrainerConfig};
