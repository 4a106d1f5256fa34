//! Host memory space: plain `Vec` storage, always available

use super::{LaneValue, MemorySpace};
use crate::error::{Error, Result};

/// Host-resident memory space
///
/// The reference implementation of [`MemorySpace`]. Buffers are `Vec`s,
/// views are always available, and synchronization is a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Host;

impl MemorySpace for Host {
    type Buffer<T: LaneValue> = Vec<T>;

    const IS_DEVICE: bool = false;
    const LABEL: &'static str = "host";

    fn alloc<T: LaneValue>(len: usize) -> Result<Self::Buffer<T>> {
        Ok(vec![T::default(); len])
    }

    fn copy_to<T: LaneValue>(buffer: &mut Self::Buffer<T>, src: &[T]) -> Result<()> {
        if src.len() > buffer.len() {
            return Err(Error::BufferSizeMismatch {
                buffer_len: buffer.len(),
                transfer_len: src.len(),
            });
        }
        buffer[..src.len()].copy_from_slice(src);
        Ok(())
    }

    fn copy_from<T: LaneValue>(buffer: &Self::Buffer<T>, dst: &mut [T]) -> Result<()> {
        if dst.len() > buffer.len() {
            return Err(Error::BufferSizeMismatch {
                buffer_len: buffer.len(),
                transfer_len: dst.len(),
            });
        }
        dst.copy_from_slice(&buffer[..dst.len()]);
        Ok(())
    }

    fn len<T: LaneValue>(buffer: &Self::Buffer<T>) -> usize {
        buffer.len()
    }

    fn view<T: LaneValue>(buffer: &Self::Buffer<T>) -> Option<&[T]> {
        Some(buffer.as_slice())
    }

    fn view_mut<T: LaneValue>(buffer: &mut Self::Buffer<T>) -> Option<&mut [T]> {
        Some(buffer.as_mut_slice())
    }

    fn address_of<T: LaneValue>(buffer: &Self::Buffer<T>) -> u64 {
        buffer.as_ptr() as u64
    }

    fn synchronize() -> Result<()> {
        Ok(())
    }
}
