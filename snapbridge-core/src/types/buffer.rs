//! Buffer handles, windows and element sizes.

use std::fmt;
use std::num::NonZeroUsize;

use crate::config::RemainderPolicy;
use crate::error::BridgeError;
use crate::host::HostRuntime;
use crate::types::BitShuffleType;

//==================================================================================
// 1. BufferHandle
//==================================================================================

/// A borrowed reference to a caller-owned byte region.
///
/// The bridge never allocates, frees or keeps a handle beyond one call.
pub enum BufferHandle<'a, H: HostRuntime + ?Sized> {
    /// A region on the host's managed heap. It may move unless pinned.
    HeapBacked(&'a H::Array),
    /// A region at a fixed address for its whole lifetime.
    OffHeap(&'a H::Direct),
}

impl<'a, H: HostRuntime + ?Sized> BufferHandle<'a, H> {
    pub fn is_off_heap(&self) -> bool {
        matches!(self, BufferHandle::OffHeap(_))
    }
}

impl<'a, H: HostRuntime + ?Sized> Clone for BufferHandle<'a, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, H: HostRuntime + ?Sized> Copy for BufferHandle<'a, H> {}

impl<'a, H: HostRuntime + ?Sized> fmt::Debug for BufferHandle<'a, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferHandle::HeapBacked(_) => f.write_str("BufferHandle::HeapBacked"),
            BufferHandle::OffHeap(_) => f.write_str("BufferHandle::OffHeap"),
        }
    }
}

//==================================================================================
// 2. Window
//==================================================================================

/// An `(offset, length)` sub-range of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub offset: usize,
    pub length: usize,
}

impl Window {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Builds a window from the signed integers a host passes across the boundary.
    pub fn from_raw(offset: i32, length: i32) -> Result<Self, BridgeError> {
        Ok(Self {
            offset: non_negative(offset, "offset")?,
            length: non_negative(length, "length")?,
        })
    }

    /// One past the last byte of the window.
    pub fn end(&self) -> Result<usize, BridgeError> {
        self.offset.checked_add(self.length).ok_or_else(|| {
            BridgeError::InvalidInput(format!(
                "window offset {} + length {} overflows",
                self.offset, self.length
            ))
        })
    }

    /// Fails unless the window lies entirely inside `capacity` bytes.
    pub fn check_within(&self, capacity: usize) -> Result<(), BridgeError> {
        let end = self.end()?;
        if end > capacity {
            return Err(BridgeError::InvalidInput(format!(
                "window [{}, {}) exceeds buffer capacity {}",
                self.offset, end, capacity
            )));
        }
        Ok(())
    }
}

pub(crate) fn non_negative(value: i32, what: &str) -> Result<usize, BridgeError> {
    usize::try_from(value)
        .map_err(|_| BridgeError::InvalidInput(format!("negative {}: {}", what, value)))
}

//==================================================================================
// 3. ElementSize
//==================================================================================

/// The byte width of one logical element in a shuffle operation. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementSize(NonZeroUsize);

impl ElementSize {
    pub fn new(size: usize) -> Result<Self, BridgeError> {
        NonZeroUsize::new(size)
            .map(Self)
            .ok_or_else(|| BridgeError::InvalidInput("element size must be positive".to_string()))
    }

    pub fn from_raw(size: i32) -> Result<Self, BridgeError> {
        Self::new(non_negative(size, "element size")?)
    }

    pub(crate) fn from_type(ty: BitShuffleType) -> Self {
        // type_size() is never zero.
        Self(NonZeroUsize::new(ty.type_size()).unwrap_or(NonZeroUsize::MIN))
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }

    /// Number of whole elements in `length` bytes, honouring the remainder policy.
    pub fn element_count(&self, length: usize, policy: RemainderPolicy) -> Result<usize, BridgeError> {
        let size = self.get();
        let remainder = length % size;
        if remainder != 0 && policy == RemainderPolicy::Reject {
            return Err(BridgeError::InvalidInput(format!(
                "length {} is not a multiple of element size {}",
                length, size
            )));
        }
        Ok(length / size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_from_raw_rejects_negatives() {
        assert_eq!(Window::from_raw(3, 5).unwrap(), Window::new(3, 5));
        assert!(matches!(
            Window::from_raw(-1, 5),
            Err(BridgeError::InvalidInput(_))
        ));
        assert!(matches!(
            Window::from_raw(0, i32::MIN),
            Err(BridgeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_window_bounds() {
        assert!(Window::new(0, 16).check_within(16).is_ok());
        assert!(Window::new(16, 0).check_within(16).is_ok());
        assert!(Window::new(8, 9).check_within(16).is_err());
        assert!(Window::new(usize::MAX, 2).check_within(usize::MAX).is_err());
    }

    #[test]
    fn test_element_count_policies() {
        let four = ElementSize::new(4).unwrap();
        assert_eq!(four.element_count(8, RemainderPolicy::Reject).unwrap(), 2);
        assert!(four.element_count(10, RemainderPolicy::Reject).is_err());
        assert_eq!(four.element_count(10, RemainderPolicy::Truncate).unwrap(), 2);
    }

    #[test]
    fn test_element_size_must_be_positive() {
        assert!(ElementSize::new(0).is_err());
        assert!(ElementSize::from_raw(-4).is_err());
        assert_eq!(ElementSize::from_raw(8).unwrap().get(), 8);
        assert_eq!(ElementSize::from_type(BitShuffleType::Short).get(), 2);
    }
}
