//! Error taxonomy of the training engine.
//!
//! All variants are fatal: reinforcement-learning state is order-sensitive,
//! so no operation is retried automatically. The run halts and the last
//! successful checkpoint remains on disk.
use thiserror::Error;

/// Errors raised by the training engine.
#[derive(Debug, Error)]
pub enum CoinopError {
    /// A raw observation did not match the shape the processor was built for.
    ///
    /// Indicates an environment/processor mismatch that cannot self-correct.
    #[error("observation shape mismatch: expected {expected:?}, got {got} elements")]
    Shape {
        /// Shape the processor expects.
        expected: Vec<usize>,
        /// Number of elements actually received.
        got: usize,
    },

    /// The replay memory was sampled before enough transitions existed.
    ///
    /// Must never occur when the warmup period is sized correctly; treated
    /// as a programming-invariant violation.
    #[error("replay memory holds {len} transitions, sampling requires at least {required}")]
    InsufficientData {
        /// Minimum number of stored transitions required for sampling.
        required: usize,
        /// Number of transitions currently stored.
        len: usize,
    },

    /// The exploration policy received an empty Q-value vector.
    #[error("exploration policy received an empty Q-value vector")]
    InvalidPolicyState,

    /// An approximator call failed during a training step.
    #[error("training aborted at step {step}")]
    TrainingAborted {
        /// Global environment step at which the failure occurred.
        step: usize,
        /// The underlying approximator failure.
        #[source]
        source: anyhow::Error,
    },

    /// A record key did not hold the requested value type.
    #[error("record key {0} does not hold a scalar")]
    RecordValueType(String),
}
