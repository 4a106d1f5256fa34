//! CUDA device memory space
//!
//! Device-resident lane storage backed by `cudarc`. Buffers are raw byte
//! allocations; generic lane values cross the PCIe bus as opaque memcpys,
//! so the element layout is only ever interpreted on the side that wrote
//! it. Kernels that do interpret lane data receive addresses through the
//! state's back-reference descriptor and are external to this crate.

use std::marker::PhantomData;
use std::mem;
use std::sync::{Arc, OnceLock};

use cudarc::driver::{CudaDevice, CudaSlice, DevicePtr};

use super::{LaneValue, MemorySpace};
use crate::error::{Error, Result};

/// Process-wide CUDA context, created on first use
///
/// Mirrors the one-per-process device model: every stream's buffers live in
/// the same context, and the context outlives all of them.
fn global_device() -> Result<Arc<CudaDevice>> {
    static DEVICE: OnceLock<std::result::Result<Arc<CudaDevice>, String>> = OnceLock::new();

    DEVICE
        .get_or_init(|| CudaDevice::new(0).map_err(|e| format!("CUDA device initialization failed: {e}")))
        .clone()
        .map_err(Error::Device)
}

/// Device-resident storage for `len` elements of `T`
///
/// The underlying allocation is `len * size_of::<T>()` bytes; freeing
/// happens when the slice is dropped.
pub struct DeviceBuffer<T: LaneValue> {
    raw: CudaSlice<u8>,
    len: usize,
    _marker: PhantomData<T>,
}

// Safety: the only access paths are whole-buffer transfers through the
// owning CudaDevice, which serializes them on its default stream.
unsafe impl<T: LaneValue> Send for DeviceBuffer<T> {}
unsafe impl<T: LaneValue> Sync for DeviceBuffer<T> {}

/// Reinterpret a host slice as its raw bytes for an opaque device transfer.
fn as_bytes<T: LaneValue>(src: &[T]) -> &[u8] {
    // Safety: T is Copy with no drop glue; the bytes are only memcpy'd to
    // the device and back, never interpreted as another type on the host.
    unsafe { std::slice::from_raw_parts(src.as_ptr() as *const u8, mem::size_of_val(src)) }
}

fn as_bytes_mut<T: LaneValue>(dst: &mut [T]) -> &mut [u8] {
    // Safety: see as_bytes; every byte is overwritten by the transfer
    // before the slice is read again as T.
    unsafe { std::slice::from_raw_parts_mut(dst.as_mut_ptr() as *mut u8, mem::size_of_val(dst)) }
}

/// CUDA device memory space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Device;

impl MemorySpace for Device {
    type Buffer<T: LaneValue> = DeviceBuffer<T>;

    const IS_DEVICE: bool = true;
    const LABEL: &'static str = "device";

    fn alloc<T: LaneValue>(len: usize) -> Result<Self::Buffer<T>> {
        let device = global_device()?;
        let num_bytes = len * mem::size_of::<T>();
        let mut raw = device
            .alloc_zeros::<u8>(num_bytes.max(1))
            .map_err(|e| Error::device(format!("device allocation of {num_bytes} bytes failed: {e}")))?;

        // Zeroed bytes are not necessarily T::default(); upload defaults so
        // the allocation contract matches the host space.
        if len > 0 {
            let defaults = vec![T::default(); len];
            device
                .htod_sync_copy_into(as_bytes(&defaults), &mut raw)
                .map_err(|e| Error::device(format!("default-fill transfer failed: {e}")))?;
        }

        Ok(DeviceBuffer {
            raw,
            len,
            _marker: PhantomData,
        })
    }

    fn copy_to<T: LaneValue>(buffer: &mut Self::Buffer<T>, src: &[T]) -> Result<()> {
        if src.len() > buffer.len {
            return Err(Error::BufferSizeMismatch {
                buffer_len: buffer.len,
                transfer_len: src.len(),
            });
        }
        if src.is_empty() {
            return Ok(());
        }
        let device = global_device()?;
        let bytes = as_bytes(src);
        let mut prefix = buffer.raw.slice_mut(0..bytes.len());
        device
            .htod_sync_copy_into(bytes, &mut prefix)
            .map_err(|e| Error::device(format!("host-to-device copy failed: {e}")))
    }

    fn copy_from<T: LaneValue>(buffer: &Self::Buffer<T>, dst: &mut [T]) -> Result<()> {
        if dst.len() > buffer.len {
            return Err(Error::BufferSizeMismatch {
                buffer_len: buffer.len,
                transfer_len: dst.len(),
            });
        }
        if dst.is_empty() {
            return Ok(());
        }
        let device = global_device()?;
        let bytes = as_bytes_mut(dst);
        let prefix = buffer.raw.slice(0..bytes.len());
        device
            .dtoh_sync_copy_into(&prefix, bytes)
            .map_err(|e| Error::device(format!("device-to-host copy failed: {e}")))
    }

    fn len<T: LaneValue>(buffer: &Self::Buffer<T>) -> usize {
        buffer.len
    }

    fn view<T: LaneValue>(_buffer: &Self::Buffer<T>) -> Option<&[T]> {
        None
    }

    fn view_mut<T: LaneValue>(_buffer: &mut Self::Buffer<T>) -> Option<&mut [T]> {
        None
    }

    fn address_of<T: LaneValue>(buffer: &Self::Buffer<T>) -> u64 {
        *buffer.raw.device_ptr()
    }

    fn synchronize() -> Result<()> {
        global_device()?
            .synchronize()
            .map_err(|e| Error::device(format!("device synchronization failed: {e}")))
    }
}
