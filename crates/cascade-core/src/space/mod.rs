//! Memory-space abstraction for lane storage
//!
//! The same logical state exists either host-resident or device-resident.
//! This module abstracts over the two with a storage-backend trait so that
//! the scheduling core is written once:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               MemorySpace trait              │
//! │  - alloc / copy_to / copy_from               │
//! │  - view / view_mut  (host residency only)    │
//! │  - synchronize                               │
//! └──────────────┬──────────────────────────────┘
//!                │
//!        ┌───────┴────────┐
//!        ▼                ▼
//!   ┌─────────┐     ┌──────────┐
//!   │  Host   │     │  Device  │  (cuda feature)
//!   │ Vec<T>  │     │  cudarc  │
//!   └─────────┘     └──────────┘
//! ```
//!
//! Host code never dereferences device-resident lane data: on the device
//! space `view`/`view_mut` return `None` and inspection goes through an
//! explicit `copy_from` transfer.

mod host;

#[cfg(feature = "cuda")]
mod cuda;

pub use host::Host;

#[cfg(feature = "cuda")]
pub use cuda::{Device, DeviceBuffer};

use crate::error::Result;

/// Marker for values that may live in space-resident lane storage
///
/// Blanket-implemented: any plain `Copy` value with a default works. The
/// default value is what freshly allocated storage is filled with.
pub trait LaneValue: Copy + Default + Send + Sync + 'static {}

impl<T: Copy + Default + Send + Sync + 'static> LaneValue for T {}

/// Storage backend for one memory space
///
/// Implementations provide allocation, host transfers in both directions,
/// and (when the storage is host-addressable) direct slice views. All
/// methods are associated functions: a space is a type-level tag, not a
/// runtime object, so state containers can be generic over it without
/// carrying a backend handle.
///
/// # Transfer semantics
///
/// `copy_to` writes `src.len()` elements into the buffer's prefix and
/// `copy_from` fills all of `dst` from the buffer's prefix; both fail with
/// [`Error::BufferSizeMismatch`](crate::error::Error::BufferSizeMismatch)
/// when the transfer exceeds the buffer's extent.
pub trait MemorySpace: Send + Sync + 'static {
    /// Space-resident storage for a contiguous array of values
    type Buffer<T: LaneValue>: Send + Sync;

    /// True when buffers live in device memory
    const IS_DEVICE: bool;

    /// Human-readable space name for diagnostics
    const LABEL: &'static str;

    /// Allocate storage for `len` elements, each initialized to `T::default()`
    fn alloc<T: LaneValue>(len: usize) -> Result<Self::Buffer<T>>;

    /// Copy `src` into the buffer's prefix
    fn copy_to<T: LaneValue>(buffer: &mut Self::Buffer<T>, src: &[T]) -> Result<()>;

    /// Fill `dst` from the buffer's prefix
    fn copy_from<T: LaneValue>(buffer: &Self::Buffer<T>, dst: &mut [T]) -> Result<()>;

    /// Number of elements the buffer holds
    fn len<T: LaneValue>(buffer: &Self::Buffer<T>) -> usize;

    /// Borrow the buffer as a slice, when host-addressable
    fn view<T: LaneValue>(buffer: &Self::Buffer<T>) -> Option<&[T]>;

    /// Mutably borrow the buffer as a slice, when host-addressable
    fn view_mut<T: LaneValue>(buffer: &mut Self::Buffer<T>) -> Option<&mut [T]>;

    /// Raw address of the buffer's storage, for back-reference descriptors
    ///
    /// On the device space this is a device pointer suitable for kernel
    /// arguments; on the host it is the slice address. Diagnostic and
    /// descriptor use only, never an ownership edge.
    fn address_of<T: LaneValue>(buffer: &Self::Buffer<T>) -> u64;

    /// Block until all previously issued work in this space has completed
    ///
    /// No-op on the host; a full device barrier otherwise.
    fn synchronize() -> Result<()>;
}
