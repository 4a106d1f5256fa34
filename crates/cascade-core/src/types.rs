//! Identifiers and plain data shared across the stepping core

use std::fmt;

use serde::Serialize;

/// Identifier of a registered action
///
/// Ids are densely assigned by the registry in registration order, starting
/// at zero, and are never reused within a registry's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId(pub u32);

impl ActionId {
    /// Sentinel for a lane with no pending action
    pub const UNASSIGNED: ActionId = ActionId(u32::MAX);

    /// Create a new action id
    pub const fn new(id: u32) -> Self {
        ActionId(id)
    }

    /// Get the internal id
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Get the id as a storage index
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this id is the "no pending action" sentinel
    pub const fn is_unassigned(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an independent execution pipeline instance
///
/// Each stream owns exactly one [`CoreState`](crate::state::CoreState);
/// ids must stay below the configured maximum stream count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(pub u32);

impl StreamId {
    /// Create a new stream id
    pub const fn new(id: u32) -> Self {
        StreamId(id)
    }

    /// Get the internal id
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a lane's underlying storage slot
///
/// The lane permutation array maps execution rank to this storage index;
/// reordering permutes ids, never the lane payload itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackSlotId(pub u32);

impl TrackSlotId {
    /// Create a new track slot id
    pub const fn new(id: u32) -> Self {
        TrackSlotId(id)
    }

    /// Get the internal id
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Get the id as a storage index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TrackSlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the event a track belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub u32);

impl EventId {
    pub const fn new(id: u32) -> Self {
        EventId(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Identifier of a track within its event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackId(pub u32);

impl TrackId {
    pub const fn new(id: u32) -> Self {
        TrackId(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Identifier of a particle species in the external physics tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticleId(pub u32);

impl ParticleId {
    pub const fn new(id: u32) -> Self {
        ParticleId(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Coarse pipeline phase used as the primary action-sequencing key
///
/// Actions sharing a phase are tie-broken by ascending [`ActionId`], so the
/// per-step execution order is total and deterministic regardless of
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionOrder {
    /// Beginning of step: primary conversion and lane initialization
    Start,
    /// Pre-step setup: geometry distance-to-boundary queries
    Pre,
    /// Along-step propagation and continuous physics
    Along,
    /// Post-step discrete interaction selection
    Post,
    /// End of step: bookkeeping and lane retirement
    End,
}

impl ActionOrder {
    /// Lowercase phase name
    pub const fn as_str(self) -> &'static str {
        match self {
            ActionOrder::Start => "start",
            ActionOrder::Pre => "pre",
            ActionOrder::Along => "along",
            ActionOrder::Post => "post",
            ActionOrder::End => "end",
        }
    }
}

impl fmt::Display for ActionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of one lane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TrackStatus {
    /// Vacant or retired: skipped by every step action
    #[default]
    Inactive,
    /// Carrying a live track
    Alive,
}

impl TrackStatus {
    pub const fn is_alive(self) -> bool {
        matches!(self, TrackStatus::Alive)
    }
}

/// Per-lane record of the next action expected to act and its budget
///
/// Recomputed by the physics/geometry collaborators each step; read by the
/// lane reordering policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepLimit {
    /// Action that will next act on this lane
    pub action: ActionId,
    /// Remaining distance before that action applies
    pub distance: f64,
}

impl Default for StepLimit {
    fn default() -> Self {
        Self {
            action: ActionId::UNASSIGNED,
            distance: 0.0,
        }
    }
}

/// Externally supplied input particle descriptor awaiting lane conversion
///
/// Consumed exactly once when converted into a [`TrackInitializer`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Primary {
    pub particle_id: ParticleId,
    /// Kinetic energy [MeV]
    pub energy: f64,
    pub position: [f64; 3],
    pub direction: [f64; 3],
    /// Global time offset [s]
    pub time: f64,
    pub event_id: EventId,
    pub track_id: TrackId,
}

/// Converted primary awaiting assignment to a vacant lane
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackInitializer {
    pub particle_id: ParticleId,
    pub energy: f64,
    pub position: [f64; 3],
    pub direction: [f64; 3],
    pub time: f64,
    pub event_id: EventId,
    pub track_id: TrackId,
}

impl From<Primary> for TrackInitializer {
    fn from(p: Primary) -> Self {
        Self {
            particle_id: p.particle_id,
            energy: p.energy,
            position: p.position,
            direction: p.direction,
            time: p.time,
            event_id: p.event_id,
            track_id: p.track_id,
        }
    }
}

/// Minimal per-lane identity payload written on initializer assignment
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackRecord {
    pub track_id: TrackId,
    pub event_id: EventId,
    pub energy: f64,
    pub time: f64,
}

/// Scalar occupancy counters for one stream's state
///
/// Invariant between steps: `num_vacancies` plus the number of alive lanes
/// equals the lane capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoreStateCounters {
    /// Lanes not currently carrying a live track
    pub num_vacancies: usize,
    /// Primaries staged by the most recent insertion, not yet converted
    pub num_primaries: usize,
    /// Initializers converted and awaiting assignment to a free lane
    pub num_initializers: usize,
}
