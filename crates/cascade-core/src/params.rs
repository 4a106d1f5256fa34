//! Process-wide shared configuration

use std::sync::Arc;

use tracing::debug;

use crate::action::ActionRegistry;
use crate::error::{Error, Result};
use crate::space::MemorySpace;
use crate::track::TrackOrder;

/// Input for building [`CoreParams`]
pub struct CoreParamsInput<M: MemorySpace> {
    /// Fully populated action registry
    pub registry: Arc<ActionRegistry<M>>,
    /// Maximum number of concurrent streams; stream ids must stay below this
    pub max_streams: usize,
    /// Lane reordering policy applied at the start of each step
    pub track_order: TrackOrder,
    /// Capacity of the per-stream track initializer queue
    pub init_capacity: usize,
}

/// Shared immutable configuration consumed by every stream and action
///
/// Fixed before any state is constructed; changing it afterwards is
/// unsupported. Safe to reference from multiple streams concurrently since
/// nothing here is mutated post-construction.
pub struct CoreParams<M: MemorySpace> {
    registry: Arc<ActionRegistry<M>>,
    max_streams: usize,
    track_order: TrackOrder,
    init_capacity: usize,
}

impl<M: MemorySpace> CoreParams<M> {
    /// Validate and freeze the configuration
    pub fn new(input: CoreParamsInput<M>) -> Result<Self> {
        if input.max_streams == 0 {
            return Err(Error::invalid_config("maximum stream count is not set"));
        }
        if input.init_capacity == 0 {
            return Err(Error::invalid_config("track initializer capacity is not set"));
        }

        debug!(
            max_streams = input.max_streams,
            track_order = %input.track_order,
            init_capacity = input.init_capacity,
            num_actions = input.registry.num_actions(),
            "core parameters constructed"
        );

        Ok(Self {
            registry: input.registry,
            max_streams: input.max_streams,
            track_order: input.track_order,
            init_capacity: input.init_capacity,
        })
    }

    /// The shared action registry
    pub fn registry(&self) -> &Arc<ActionRegistry<M>> {
        &self.registry
    }

    /// Maximum number of concurrent streams
    pub fn max_streams(&self) -> usize {
        self.max_streams
    }

    /// Lane reordering policy applied between steps
    pub fn track_order(&self) -> TrackOrder {
        self.track_order
    }

    /// Per-stream initializer queue capacity
    pub fn init_capacity(&self) -> usize {
        self.init_capacity
    }
}
