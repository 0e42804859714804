//! DQN agent.
mod base;
mod config;
mod explorer;
mod target;
pub use base::Dqn;
pub use config::DqnConfig;
pub use explorer::{DqnExplorer, EpsilonGreedy, Softmax};
pub use target::{SyncMode, TargetNetwork};
