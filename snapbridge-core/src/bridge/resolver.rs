// In: src/bridge/resolver.rs

//! The Buffer Resolver: turns a host buffer handle into a raw, bounded view that
//! is valid for exactly one call.
//!
//! Heap-backed arrays go through `PinningResolver`, off-heap buffers through
//! `DirectResolver`. Either way the result is a `ResolvedBuffer` guard whose
//! `Drop` gives the pin back to the host, so every exit path releases it,
//! including the early return when a sibling buffer fails to resolve.

use std::ops::Range;
use std::ptr::{self, NonNull};
use std::slice;

use crate::error::{BridgeError, BufferRole};
use crate::host::{HostRuntime, PinnedArray};
use crate::types::{BufferHandle, Window};

//==================================================================================
// 1. The Scoped Acquisition
//==================================================================================

struct HeldPin<'h, H: HostRuntime + ?Sized> {
    host: &'h H,
    array: &'h H::Array,
    pinned: PinnedArray<H::PinToken>,
}

/// A buffer whose base address is stable until this value is dropped.
pub struct ResolvedBuffer<'h, H: HostRuntime + ?Sized> {
    base: NonNull<u8>,
    capacity: usize,
    writable: bool,
    role: BufferRole,
    pin: Option<HeldPin<'h, H>>,
}

impl<'h, H: HostRuntime + ?Sized> ResolvedBuffer<'h, H> {
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn role(&self) -> BufferRole {
        self.role
    }

    pub fn is_pinned(&self) -> bool {
        self.pin.is_some()
    }

    /// Address range covered by `window`, after checking it fits the buffer.
    fn span(&self, window: Window) -> Result<Range<usize>, BridgeError> {
        window.check_within(self.capacity)?;
        let start = self.base.as_ptr() as usize + window.offset;
        Ok(start..start + window.length)
    }

    fn ensure_writable(&self) -> Result<(), BridgeError> {
        if self.writable {
            Ok(())
        } else {
            Err(BridgeError::BufferUnavailable { role: self.role })
        }
    }

    /// Read-only view of `window`.
    pub fn window(&self, window: Window) -> Result<&[u8], BridgeError> {
        self.span(window)?;
        // SAFETY: the host guarantees `capacity` bytes at `base` while this guard
        // lives, and the window was checked against that capacity.
        Ok(unsafe { slice::from_raw_parts(self.base.as_ptr().add(window.offset), window.length) })
    }

    /// Writable view of `window`.
    pub fn window_mut(&mut self, window: Window) -> Result<&mut [u8], BridgeError> {
        self.ensure_writable()?;
        self.span(window)?;
        // SAFETY: as for `window`, plus the host reported the memory writable and
        // `&mut self` rules out a second view through this guard.
        Ok(unsafe {
            slice::from_raw_parts_mut(self.base.as_ptr().add(window.offset), window.length)
        })
    }
}

impl<'h, H: HostRuntime + ?Sized> Drop for ResolvedBuffer<'h, H> {
    fn drop(&mut self) {
        if let Some(held) = self.pin.take() {
            held.host.unpin_array(held.array, held.pinned);
        }
    }
}

//==================================================================================
// 2. Resolution Strategies
//==================================================================================

/// A way of obtaining a stable address for one kind of host buffer.
pub trait Resolver<H: HostRuntime + ?Sized> {
    type Source: ?Sized;

    fn resolve<'h>(
        host: &'h H,
        source: &'h Self::Source,
        role: BufferRole,
    ) -> Result<ResolvedBuffer<'h, H>, BridgeError>;
}

/// Pins a relocatable heap array for the duration of the call.
pub struct PinningResolver;

impl<H: HostRuntime + ?Sized> Resolver<H> for PinningResolver {
    type Source = H::Array;

    fn resolve<'h>(
        host: &'h H,
        array: &'h H::Array,
        role: BufferRole,
    ) -> Result<ResolvedBuffer<'h, H>, BridgeError> {
        let pinned = host
            .pin_array(array)
            .ok_or(BridgeError::OutOfMemory { role })?;
        Ok(ResolvedBuffer {
            base: pinned.base,
            capacity: pinned.len,
            writable: pinned.writable,
            role,
            pin: Some(HeldPin {
                host,
                array,
                pinned,
            }),
        })
    }
}

/// Reads the fixed address of an off-heap buffer. Nothing to release.
pub struct DirectResolver;

impl<H: HostRuntime + ?Sized> Resolver<H> for DirectResolver {
    type Source = H::Direct;

    fn resolve<'h>(
        host: &'h H,
        buffer: &'h H::Direct,
        role: BufferRole,
    ) -> Result<ResolvedBuffer<'h, H>, BridgeError> {
        let region = host
            .direct_region(buffer)
            .ok_or(BridgeError::BufferUnavailable { role })?;
        Ok(ResolvedBuffer {
            base: region.base,
            capacity: region.capacity,
            writable: region.writable,
            role,
            pin: None,
        })
    }
}

/// Picks the strategy matching the handle's variant.
pub fn resolve<'h, H: HostRuntime + ?Sized>(
    host: &'h H,
    handle: BufferHandle<'h, H>,
    role: BufferRole,
) -> Result<ResolvedBuffer<'h, H>, BridgeError> {
    match handle {
        BufferHandle::HeapBacked(array) => {
            <PinningResolver as Resolver<H>>::resolve(host, array, role)
        }
        BufferHandle::OffHeap(buffer) => <DirectResolver as Resolver<H>>::resolve(host, buffer, role),
    }
}

/// Resolves a source and a destination, all or nothing. If the destination
/// fails, the already-resolved source is released by its guard before the
/// error is returned.
pub fn resolve_pair<'h, H: HostRuntime + ?Sized>(
    host: &'h H,
    source: BufferHandle<'h, H>,
    destination: BufferHandle<'h, H>,
) -> Result<(ResolvedBuffer<'h, H>, ResolvedBuffer<'h, H>), BridgeError> {
    let src = resolve(host, source, BufferRole::Source)?;
    let dst = resolve(host, destination, BufferRole::Destination)?;
    Ok((src, dst))
}

//==================================================================================
// 3. Paired Views
//==================================================================================

/// Empty ranges cover no bytes and never overlap anything.
fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    !a.is_empty() && !b.is_empty() && a.start < b.end && b.start < a.end
}

/// Borrows a read-only source window and a writable destination window at
/// once. The two must not overlap in memory, even when both handles name the
/// same host array.
pub fn split_windows<'a, 'h, H: HostRuntime + ?Sized>(
    src: &'a ResolvedBuffer<'h, H>,
    src_window: Window,
    dst: &'a mut ResolvedBuffer<'h, H>,
    dst_window: Window,
) -> Result<(&'a [u8], &'a mut [u8]), BridgeError> {
    let src_span = src.span(src_window)?;
    let dst_span = dst.span(dst_window)?;
    if overlaps(&src_span, &dst_span) {
        return Err(BridgeError::InvalidInput(format!(
            "source window [{}, {}) overlaps destination window [{}, {})",
            src_window.offset,
            src_window.offset + src_window.length,
            dst_window.offset,
            dst_window.offset + dst_window.length
        )));
    }
    let input = src.window(src_window)?;
    let output = dst.window_mut(dst_window)?;
    Ok((input, output))
}

/// Copies `src_window` to `dst_offset` with memmove semantics.
pub fn copy_window<H: HostRuntime + ?Sized>(
    src: &ResolvedBuffer<'_, H>,
    src_window: Window,
    dst: &mut ResolvedBuffer<'_, H>,
    dst_offset: usize,
    allow_overlap: bool,
) -> Result<(), BridgeError> {
    dst.ensure_writable()?;
    let dst_window = Window::new(dst_offset, src_window.length);
    let src_span = src.span(src_window)?;
    let dst_span = dst.span(dst_window)?;
    if !allow_overlap && overlaps(&src_span, &dst_span) {
        return Err(BridgeError::InvalidInput(
            "array copy source and destination overlap".to_string(),
        ));
    }
    // SAFETY: both spans were bounds-checked against host-guaranteed capacities
    // and `ptr::copy` tolerates overlap.
    unsafe {
        ptr::copy(
            src.base.as_ptr().add(src_window.offset),
            dst.base.as_ptr().add(dst_offset),
            src_window.length,
        );
    }
    Ok(())
}
