#![warn(missing_docs)]
//! DQN agent for the `coinop` training engine.
//!
//! The [`dqn::Dqn`] agent combines an online approximator, a lagged
//! [`dqn::TargetNetwork`] and an exploration [`dqn::DqnExplorer`] into an
//! implementation of [`coinop_core::Agent`]. The [`mlp`] module provides a
//! small self-contained approximator so the engine can run without an
//! external numerical backend.
pub mod dqn;
pub mod mlp;
