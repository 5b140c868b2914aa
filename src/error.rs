//! Error types for flux-stream pipelines.
//!
//! Construction errors are returned synchronously when a stage is built;
//! everything else travels through the pipeline as an `Err` element and
//! surfaces at that element's input position.

/// Main error type for flux-stream operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamError {
    /// Stage rejected at build time: concurrency must be at least 1
    #[error("invalid concurrency {0}: must be at least 1")]
    InvalidConcurrency(usize),
    /// Stage rejected at build time: group size must be at least 1
    #[error("invalid group size {0}: must be at least 1")]
    InvalidGroupSize(usize),
    /// Stage rejected at build time: group window must be a positive duration
    #[error("invalid group interval: must be a positive duration")]
    InvalidGroupInterval,
    /// Stage rejected at build time: frequency must be positive and finite
    #[error("invalid frequency {0}: must be positive and finite")]
    InvalidFrequency(f64),
    /// Stage rejected at build time: truncate needs a count or a predicate
    #[error("truncate requires a count or a predicate")]
    InvalidTruncateArgs,
    /// A worker task failed while processing one element
    #[error("transformation failed: {0}")]
    Transformation(String),
    /// The explicit "no more elements" sentinel. Produced by source adapters
    /// to report exhaustion as a value; never a failure when the machinery
    /// itself terminates a stream.
    #[error("no more elements")]
    Exhausted,
    /// User code leaked the exhaustion sentinel where a failure was expected;
    /// rewritten at the user-code boundary so it cannot end the stream early.
    #[error("exhaustion signal raised by user code, reclassified as a failure")]
    ReclassifiedExhaustion,
    /// Custom error with message
    #[error("stream error: {0}")]
    Custom(String),
}

/// Result type for flux-stream operations
pub type StreamResult<T> = Result<T, StreamError>;
