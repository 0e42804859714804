//! Bounded replay memory with windowed random sampling.
mod base;
mod config;
pub use base::{ReplayMemory, TransitionBatch};
pub use config::ReplayMemoryConfig;
