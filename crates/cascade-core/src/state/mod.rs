//! Per-stream track-slot state container
//!
//! One [`CoreState`] holds everything a single execution stream owns: the
//! fixed-capacity lane arrays, the rank→storage permutation, the occupancy
//! counters, and the staging path that brings externally supplied primaries
//! into the state's memory space.
//!
//! ```text
//! CoreState<M>
//! ├── track_slots   - rank → storage index permutation (reordered between steps)
//! ├── status        - per-lane lifecycle flag
//! ├── step_limit    - per-lane (pending action, distance) record
//! ├── records       - per-lane identity payload
//! ├── counters      - vacancies / pending primaries / pending initializers
//! └── primaries     - staged input batch, host staging + space-resident mirror
//! ```
//!
//! Lane lifecycle: `uninitialized → alive` on initializer assignment,
//! `alive → dead` on kill or domain exit, `dead → uninitialized` on slot
//! reclamation; lanes cycle indefinitely. Between steps the occupancy
//! invariant holds: `num_vacancies + alive lanes == num_track_slots`.
//!
//! A state is exclusively owned by one stream. Nothing here is shared
//! between streams; the shared read-only configuration lives in
//! [`CoreParams`](crate::params::CoreParams).

use std::fmt;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::params::CoreParams;
use crate::space::{Host, MemorySpace};
use crate::track::{partition_status, sort_step_limit_action, TrackOrder};
use crate::types::{
    CoreStateCounters, Primary, StepLimit, StreamId, TrackInitializer, TrackRecord, TrackSlotId,
    TrackStatus,
};

/// Raw addresses of one state's lane arrays
///
/// A back-reference handed to kernels that need the whole state by pointer.
/// It is not an ownership edge: the descriptor is rebuilt on demand
/// whenever the owning state is reconstructed and is never serialized or
/// relied upon for lifetime management.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateDescriptor {
    pub stream_id: u32,
    pub num_track_slots: u64,
    pub track_slots_addr: u64,
    pub status_addr: u64,
    pub step_limit_addr: u64,
    pub records_addr: u64,
}

/// Split-borrow view over one stream's lane arrays and counters
///
/// Handed to per-step work that mutates lane payload: the permutation is
/// read-only here because only the reordering policies may permute it.
pub struct LanesMut<'a> {
    /// rank → storage index mapping
    pub track_slots: &'a [TrackSlotId],
    pub status: &'a mut [TrackStatus],
    pub step_limit: &'a mut [StepLimit],
    pub records: &'a mut [TrackRecord],
    pub counters: &'a mut CoreStateCounters,
}

impl LanesMut<'_> {
    /// Retire a live lane, keeping the vacancy counter in step
    pub fn kill(&mut self, slot: TrackSlotId) {
        let status = &mut self.status[slot.index()];
        if status.is_alive() {
            *status = TrackStatus::Inactive;
            self.counters.num_vacancies += 1;
        }
    }
}

/// Per-stream lane state, parameterized over the memory space
pub struct CoreState<M: MemorySpace> {
    stream_id: StreamId,
    num_track_slots: usize,
    track_slots: M::Buffer<TrackSlotId>,
    status: M::Buffer<TrackStatus>,
    step_limit: M::Buffer<StepLimit>,
    records: M::Buffer<TrackRecord>,
    counters: CoreStateCounters,
    /// Host staging for inserted primaries; grows, never shrinks
    staged_primaries: Vec<Primary>,
    /// Space-resident mirror of the staged batch; grows, never shrinks
    primaries: Option<M::Buffer<Primary>>,
    /// Converted initializers awaiting assignment to a free lane
    initializers: Vec<TrackInitializer>,
    init_capacity: usize,
    /// Lazily built back-reference descriptor
    descriptor: Option<M::Buffer<StateDescriptor>>,
}

impl<M: MemorySpace> fmt::Debug for CoreState<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreState")
            .field("stream_id", &self.stream_id)
            .field("num_track_slots", &self.num_track_slots)
            .field("counters", &self.counters)
            .field("init_capacity", &self.init_capacity)
            .finish_non_exhaustive()
    }
}

impl<M: MemorySpace> CoreState<M> {
    /// Construct the state for one stream
    ///
    /// Allocates all lane arrays at the given fixed capacity; the capacity
    /// never changes afterwards. The permutation starts as the identity and
    /// every lane starts uninitialized, so the vacancy counter starts at
    /// the full capacity.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error if `stream_id` is not below the
    /// configured maximum stream count or if `num_track_slots` is zero.
    pub fn new(params: &CoreParams<M>, stream_id: StreamId, num_track_slots: usize) -> Result<Self> {
        if stream_id.get() as usize >= params.max_streams() {
            return Err(Error::StreamIdOutOfRange {
                stream_id,
                max_streams: params.max_streams(),
            });
        }
        if num_track_slots == 0 {
            return Err(Error::ZeroTrackSlots);
        }

        let mut track_slots = M::alloc(num_track_slots)?;
        let identity: Vec<TrackSlotId> = (0..num_track_slots as u32).map(TrackSlotId::new).collect();
        M::copy_to(&mut track_slots, &identity)?;

        let status = M::alloc(num_track_slots)?;
        let step_limit = M::alloc(num_track_slots)?;
        let records = M::alloc(num_track_slots)?;

        info!(
            stream = %stream_id,
            slots = num_track_slots,
            space = M::LABEL,
            "core state initialization complete"
        );

        Ok(Self {
            stream_id,
            num_track_slots,
            track_slots,
            status,
            step_limit,
            records,
            counters: CoreStateCounters {
                num_vacancies: num_track_slots,
                num_primaries: 0,
                num_initializers: 0,
            },
            staged_primaries: Vec::new(),
            primaries: None,
            initializers: Vec::new(),
            init_capacity: params.init_capacity(),
            descriptor: None,
        })
    }

    /// Owning stream
    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Fixed lane capacity
    pub fn size(&self) -> usize {
        self.num_track_slots
    }

    /// Occupancy counters
    pub fn counters(&self) -> &CoreStateCounters {
        &self.counters
    }

    /// Mutable occupancy counters
    ///
    /// Collaborators updating lane statuses outside [`edit_lanes`]
    /// (e.g. device kernels) are responsible for keeping the vacancy
    /// invariant intact through this handle.
    pub fn counters_mut(&mut self) -> &mut CoreStateCounters {
        &mut self.counters
    }

    /// Stage a batch of primaries for later conversion
    ///
    /// Appends the batch into host staging (grow-only, to amortize repeated
    /// calls), records the batch size in `num_primaries`, and mirrors the
    /// batch into the state's memory space. Lane statuses are untouched:
    /// conversion to initializers and lane assignment are separate steps.
    ///
    /// Each call replaces the previous batch; the caller is responsible for
    /// not staging more than the lane array can ultimately absorb, which is
    /// detected at assignment time, not here.
    pub fn insert_primaries(&mut self, primaries: &[Primary]) -> Result<()> {
        let count = primaries.len();
        if self.staged_primaries.len() < count {
            self.staged_primaries.resize(count, Primary::default());
        }
        self.staged_primaries[..count].copy_from_slice(primaries);
        self.counters.num_primaries = count;

        if count == 0 {
            return Ok(());
        }
        if self.primaries.as_ref().map_or(true, |buf| M::len(buf) < count) {
            self.primaries = Some(M::alloc(count)?);
        }
        if let Some(buf) = self.primaries.as_mut() {
            M::copy_to(buf, &self.staged_primaries[..count])?;
        }

        debug!(stream = %self.stream_id, count, "staged primaries");
        Ok(())
    }

    /// Read the most recently staged batch back from the state's space
    pub fn copy_primaries_to_host(&self, dst: &mut [Primary]) -> Result<()> {
        match &self.primaries {
            Some(buf) => M::copy_from(buf, dst),
            None if dst.is_empty() => Ok(()),
            None => Err(Error::BufferSizeMismatch {
                buffer_len: 0,
                transfer_len: dst.len(),
            }),
        }
    }

    /// Queue converted initializers for lane assignment
    ///
    /// # Errors
    ///
    /// Fails with a resource-exhaustion error when the queue would exceed
    /// the configured capacity; the queue is left unchanged.
    pub fn extend_initializers(&mut self, initializers: &[TrackInitializer]) -> Result<()> {
        let pending = self.initializers.len();
        if pending + initializers.len() > self.init_capacity {
            return Err(Error::InitializerOverflow {
                pending,
                incoming: initializers.len(),
                capacity: self.init_capacity,
            });
        }
        self.initializers.extend_from_slice(initializers);
        self.counters.num_initializers = self.initializers.len();
        Ok(())
    }

    /// Take up to `count` initializers off the back of the queue
    pub fn pop_initializers(&mut self, count: usize) -> Vec<TrackInitializer> {
        let keep = self.initializers.len().saturating_sub(count);
        let taken = self.initializers.split_off(keep);
        self.counters.num_initializers = self.initializers.len();
        taken
    }

    /// Initializers currently awaiting assignment
    pub fn initializers(&self) -> &[TrackInitializer] {
        &self.initializers
    }

    /// Space-resident back-reference descriptor, built on first use
    pub fn state_ref(&mut self) -> Result<&M::Buffer<StateDescriptor>> {
        if let Some(ref descriptor) = self.descriptor {
            return Ok(descriptor);
        }
        let descriptor = StateDescriptor {
            stream_id: self.stream_id.get(),
            num_track_slots: self.num_track_slots as u64,
            track_slots_addr: M::address_of(&self.track_slots),
            status_addr: M::address_of(&self.status),
            step_limit_addr: M::address_of(&self.step_limit),
            records_addr: M::address_of(&self.records),
        };
        let mut buffer = M::alloc(1)?;
        M::copy_to(&mut buffer, &[descriptor])?;
        Ok(self.descriptor.insert(buffer))
    }

    /// Apply a reordering policy to the lane permutation
    ///
    /// Only the rank→storage mapping is permuted; lane payload never moves.
    /// Must be re-applied at the start of each step because the previous
    /// step's actions can flip any lane's status or step limit.
    pub fn reorder(&mut self, order: TrackOrder) -> Result<()> {
        match order {
            TrackOrder::Unsorted => Ok(()),
            TrackOrder::PartitionStatus => {
                if !M::IS_DEVICE {
                    let Self {
                        track_slots, status, ..
                    } = &mut *self;
                    if let (Some(slots), Some(status)) = (M::view_mut(track_slots), M::view(status)) {
                        partition_status(slots, status);
                        return Ok(());
                    }
                }
                // Device residency: round-trip the permutation and keys
                let mut slots = vec![TrackSlotId::default(); self.num_track_slots];
                M::copy_from(&self.track_slots, &mut slots)?;
                let mut status = vec![TrackStatus::default(); self.num_track_slots];
                M::copy_from(&self.status, &mut status)?;
                partition_status(&mut slots, &status);
                M::copy_to(&mut self.track_slots, &slots)
            }
            TrackOrder::SortStepLimitAction => {
                if !M::IS_DEVICE {
                    let Self {
                        track_slots,
                        step_limit,
                        ..
                    } = &mut *self;
                    if let (Some(slots), Some(limits)) = (M::view_mut(track_slots), M::view(step_limit)) {
                        sort_step_limit_action(slots, limits);
                        return Ok(());
                    }
                }
                let mut slots = vec![TrackSlotId::default(); self.num_track_slots];
                M::copy_from(&self.track_slots, &mut slots)?;
                let mut limits = vec![StepLimit::default(); self.num_track_slots];
                M::copy_from(&self.step_limit, &mut limits)?;
                sort_step_limit_action(&mut slots, &limits);
                M::copy_to(&mut self.track_slots, &slots)
            }
        }
    }

    /// Run `edit` against host-visible lane arrays
    ///
    /// On the host the closure operates on the arrays in place; on the
    /// device the arrays are copied out, edited, and written back. This is
    /// the reference path for lane mutation from host code; device-side
    /// kernels use the back-reference descriptor instead.
    pub fn edit_lanes<R>(&mut self, edit: impl FnOnce(&mut LanesMut<'_>) -> R) -> Result<R> {
        if !M::IS_DEVICE {
            let Self {
                track_slots,
                status,
                step_limit,
                records,
                counters,
                ..
            } = &mut *self;
            if let (Some(slots), Some(status), Some(limits), Some(records)) = (
                M::view(track_slots),
                M::view_mut(status),
                M::view_mut(step_limit),
                M::view_mut(records),
            ) {
                let mut lanes = LanesMut {
                    track_slots: slots,
                    status,
                    step_limit: limits,
                    records,
                    counters,
                };
                return Ok(edit(&mut lanes));
            }
        }

        let n = self.num_track_slots;
        let mut slots = vec![TrackSlotId::default(); n];
        M::copy_from(&self.track_slots, &mut slots)?;
        let mut status = vec![TrackStatus::default(); n];
        M::copy_from(&self.status, &mut status)?;
        let mut limits = vec![StepLimit::default(); n];
        M::copy_from(&self.step_limit, &mut limits)?;
        let mut records = vec![TrackRecord::default(); n];
        M::copy_from(&self.records, &mut records)?;

        let result = {
            let mut lanes = LanesMut {
                track_slots: &slots,
                status: &mut status,
                step_limit: &mut limits,
                records: &mut records,
                counters: &mut self.counters,
            };
            edit(&mut lanes)
        };

        M::copy_to(&mut self.status, &status)?;
        M::copy_to(&mut self.step_limit, &limits)?;
        M::copy_to(&mut self.records, &records)?;
        Ok(result)
    }

    /// Copy the lane permutation into host memory
    pub fn copy_track_slots_to_host(&self, dst: &mut [TrackSlotId]) -> Result<()> {
        M::copy_from(&self.track_slots, dst)
    }

    /// Copy the per-lane statuses into host memory
    pub fn copy_status_to_host(&self, dst: &mut [TrackStatus]) -> Result<()> {
        M::copy_from(&self.status, dst)
    }

    /// Copy the per-lane step limits into host memory
    pub fn copy_step_limit_to_host(&self, dst: &mut [StepLimit]) -> Result<()> {
        M::copy_from(&self.step_limit, dst)
    }
}

/// Direct views, available only when the state is host-resident
impl CoreState<Host> {
    /// Lane permutation: rank → storage index
    pub fn track_slots(&self) -> &[TrackSlotId] {
        &self.track_slots
    }

    /// Mutable lane permutation, for external reordering collaborators
    pub fn track_slots_mut(&mut self) -> &mut [TrackSlotId] {
        &mut self.track_slots
    }

    /// Per-lane lifecycle status, indexed by storage slot
    pub fn status(&self) -> &[TrackStatus] {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut [TrackStatus] {
        &mut self.status
    }

    /// Per-lane step limits, indexed by storage slot
    pub fn step_limit(&self) -> &[StepLimit] {
        &self.step_limit
    }

    pub fn step_limit_mut(&mut self) -> &mut [StepLimit] {
        &mut self.step_limit
    }

    /// Per-lane identity records, indexed by storage slot
    pub fn records(&self) -> &[TrackRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [TrackRecord] {
        &mut self.records
    }

    /// The most recently staged primary batch
    pub fn primaries(&self) -> &[Primary] {
        &self.staged_primaries[..self.counters.num_primaries]
    }

    /// Split-borrow view over the lane arrays and counters
    pub fn lanes_mut(&mut self) -> LanesMut<'_> {
        LanesMut {
            track_slots: &self.track_slots,
            status: &mut self.status,
            step_limit: &mut self.step_limit,
            records: &mut self.records,
            counters: &mut self.counters,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Host state on stream 0
    pub fn host_state_fixture(params: &CoreParams<Host>, num_track_slots: usize) -> CoreState<Host> {
        CoreState::new(params, StreamId::new(0), num_track_slots).unwrap()
    }
}
