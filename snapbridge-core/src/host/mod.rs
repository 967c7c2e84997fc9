// In: src/host/mod.rs

//! The capability interface the bridge needs from the managed host runtime.
//!
//! The bridge does not know how a particular runtime pins its arrays or where it
//! keeps direct buffers. It only needs three things: a way to pin (and later
//! unpin) a heap-backed array into a stable address, a way to read the fixed
//! address of an off-heap buffer, and a way to raise a typed error in the
//! caller. `HostRuntime` is that contract.
//!
//! While any array is pinned, nothing downstream may call back into the host.
//! The resolver and dispatcher only ever call `unpin_array` in that window;
//! `raise_error` is called by the translator after every pin is released.

use std::ptr::NonNull;

use crate::error::ErrorCode;

#[cfg(test)]
pub(crate) mod test_host;

/// A heap-backed array held at a stable address until it is handed back to
/// [`HostRuntime::unpin_array`].
pub struct PinnedArray<T> {
    pub base: NonNull<u8>,
    /// Size of the array in bytes.
    pub len: usize,
    pub writable: bool,
    /// Whatever the host needs to release the pin.
    pub token: T,
}

/// The stable address of an off-heap buffer.
#[derive(Debug, Clone, Copy)]
pub struct DirectRegion {
    pub base: NonNull<u8>,
    pub capacity: usize,
    pub writable: bool,
}

/// Services a managed runtime exposes to the bridge.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - The address returned by `pin_array` stays valid and unmoved for `len`
///   bytes until the matching `unpin_array` call.
/// - The address returned by `direct_region` stays valid for `capacity` bytes
///   for the duration of the current call.
/// - Memory reported as `writable` may be written through the returned pointer.
pub unsafe trait HostRuntime {
    /// A relocatable, garbage-collected array.
    type Array: ?Sized;
    /// A buffer living at a fixed address.
    type Direct: ?Sized;
    /// Bookkeeping returned by a pin and consumed by the matching unpin.
    type PinToken;

    /// Pins `array`. `None` means the host refused, e.g. under memory pressure.
    fn pin_array(&self, array: &Self::Array) -> Option<PinnedArray<Self::PinToken>>;

    /// Releases a pin obtained from `pin_array` on the same array.
    fn unpin_array(&self, array: &Self::Array, pinned: PinnedArray<Self::PinToken>);

    /// The fixed address of an off-heap buffer, or `None` if `buffer` is not one.
    fn direct_region(&self, buffer: &Self::Direct) -> Option<DirectRegion>;

    /// Raises an error carrying `code` in the caller. Never called while pinned.
    fn raise_error(&self, code: ErrorCode);
}
