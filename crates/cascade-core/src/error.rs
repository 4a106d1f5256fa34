//! Error types for the stepping core

use crate::types::{ActionId, StreamId};

/// Result type for cascade-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or stepping the core
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An action label is already registered
    #[error("duplicate action label '{label}'")]
    DuplicateActionLabel { label: String },

    /// An action or output block was registered with an empty label
    #[error("empty label for {context}")]
    EmptyLabel { context: &'static str },

    /// An action reported an id that is not the registry's next sequential id
    #[error("action id {actual} does not match next registry id {expected}")]
    ActionIdMismatch { expected: ActionId, actual: ActionId },

    /// Action lookup past the end of the registry
    #[error("action id {id} is out of range: {num_actions} actions registered")]
    ActionIdOutOfRange { id: ActionId, num_actions: usize },

    /// Stream id at or above the configured stream count
    #[error("stream id {stream_id} is out of range: max streams is {max_streams}")]
    StreamIdOutOfRange { stream_id: StreamId, max_streams: usize },

    /// Track slot count of zero
    #[error("number of track slots is not set")]
    ZeroTrackSlots,

    /// Malformed process-wide configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Timing accumulators out of step with the executable action list
    #[error("action sequence has {actions} actions but {timers} timing accumulators")]
    SequenceLengthMismatch { actions: usize, timers: usize },

    /// An action's execute contract raised during stepping
    #[error("action '{label}' failed: {source}")]
    Execution {
        label: String,
        #[source]
        source: Box<Error>,
    },

    /// Initializer queue would exceed its configured capacity
    #[error(
        "track initializer queue overflowed: {pending} pending + {incoming} incoming > capacity {capacity}"
    )]
    InitializerOverflow {
        pending: usize,
        incoming: usize,
        capacity: usize,
    },

    /// Copy between a space-resident buffer and host memory with mismatched extents
    #[error("buffer copy size mismatch: buffer holds {buffer_len} elements, transfer wants {transfer_len}")]
    BufferSizeMismatch { buffer_len: usize, transfer_len: usize },

    /// Device runtime failure
    #[error("device error: {0}")]
    Device(String),

    /// Duplicate output block under one category
    #[error("duplicate output entry '{label}' for category '{category}'")]
    DuplicateOutputLabel { label: String, category: &'static str },

    /// Assembling the output document failed
    #[error("failed to serialize output: {0}")]
    OutputSerialization(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a stepping failure with the originating action's label
    pub fn execution(label: impl Into<String>, source: Error) -> Self {
        Self::Execution {
            label: label.into(),
            source: Box::new(source),
        }
    }

    /// Create a device runtime error
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Create a configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
