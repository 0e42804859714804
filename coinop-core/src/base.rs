//! Core traits.
mod agent;
mod approximator;
mod env;
mod frame;
pub use agent::Agent;
pub use approximator::Approximator;
pub use env::Env;
pub use frame::Frame;
