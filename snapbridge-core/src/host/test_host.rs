//! An instrumented in-process host used by the unit tests.
//!
//! It counts pins and unpins, can refuse a chosen pin attempt, and records every
//! `raise_error` call together with whether a buffer was still pinned at the time.

use std::cell::{Cell, RefCell, UnsafeCell};
use std::ptr::NonNull;

use super::{DirectRegion, HostRuntime, PinnedArray};
use crate::error::ErrorCode;

/// A heap-backed test array.
pub(crate) struct TestArray {
    data: Box<[UnsafeCell<u8>]>,
    read_only: bool,
}

impl TestArray {
    pub(crate) fn new(bytes: &[u8]) -> Self {
        Self {
            data: bytes.iter().copied().map(UnsafeCell::new).collect(),
            read_only: false,
        }
    }

    pub(crate) fn zeroed(len: usize) -> Self {
        Self::new(&vec![0u8; len])
    }

    pub(crate) fn read_only(bytes: &[u8]) -> Self {
        Self {
            read_only: true,
            ..Self::new(bytes)
        }
    }

    pub(crate) fn to_vec(&self) -> Vec<u8> {
        // SAFETY: tests only read while no pin is live.
        self.data.iter().map(|b| unsafe { *b.get() }).collect()
    }

    fn base(&self) -> NonNull<u8> {
        NonNull::new(self.data.as_ptr() as *mut u8).unwrap_or(NonNull::dangling())
    }
}

/// An off-heap test buffer. `unaddressable` ones behave like a heap buffer
/// passed where a direct one was required.
pub(crate) struct TestDirect {
    data: Box<[UnsafeCell<u8>]>,
    addressable: bool,
}

impl TestDirect {
    pub(crate) fn new(bytes: &[u8]) -> Self {
        Self {
            data: bytes.iter().copied().map(UnsafeCell::new).collect(),
            addressable: true,
        }
    }

    pub(crate) fn zeroed(len: usize) -> Self {
        Self::new(&vec![0u8; len])
    }

    pub(crate) fn unaddressable(len: usize) -> Self {
        Self {
            addressable: false,
            ..Self::zeroed(len)
        }
    }

    pub(crate) fn to_vec(&self) -> Vec<u8> {
        self.data.iter().map(|b| unsafe { *b.get() }).collect()
    }
}

#[derive(Default)]
pub(crate) struct TestHost {
    pin_attempts: Cell<usize>,
    pins: Cell<usize>,
    unpins: Cell<usize>,
    active_pins: Cell<usize>,
    refuse_pin_attempt: Cell<Option<usize>>,
    raised: RefCell<Vec<ErrorCode>>,
    raised_while_pinned: Cell<usize>,
}

impl TestHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes the `attempt`-th pin (0-based, counted over the host's lifetime) fail.
    pub(crate) fn refuse_pin(self, attempt: usize) -> Self {
        self.refuse_pin_attempt.set(Some(attempt));
        self
    }

    pub(crate) fn pins(&self) -> usize {
        self.pins.get()
    }

    pub(crate) fn unpins(&self) -> usize {
        self.unpins.get()
    }

    pub(crate) fn active_pins(&self) -> usize {
        self.active_pins.get()
    }

    pub(crate) fn raised(&self) -> Vec<ErrorCode> {
        self.raised.borrow().clone()
    }

    pub(crate) fn raised_while_pinned(&self) -> usize {
        self.raised_while_pinned.get()
    }

    /// Every pin released and no host call made while pinned.
    pub(crate) fn assert_balanced(&self) {
        assert_eq!(self.pins(), self.unpins(), "pin/unpin count mismatch");
        assert_eq!(self.active_pins(), 0, "a pin is still held");
        assert_eq!(self.raised_while_pinned(), 0, "error raised while pinned");
    }
}

unsafe impl HostRuntime for TestHost {
    type Array = TestArray;
    type Direct = TestDirect;
    type PinToken = ();

    fn pin_array(&self, array: &TestArray) -> Option<PinnedArray<()>> {
        let attempt = self.pin_attempts.get();
        self.pin_attempts.set(attempt + 1);
        if self.refuse_pin_attempt.get() == Some(attempt) {
            return None;
        }
        self.pins.set(self.pins.get() + 1);
        self.active_pins.set(self.active_pins.get() + 1);
        Some(PinnedArray {
            base: array.base(),
            len: array.data.len(),
            writable: !array.read_only,
            token: (),
        })
    }

    fn unpin_array(&self, _array: &TestArray, _pinned: PinnedArray<()>) {
        self.unpins.set(self.unpins.get() + 1);
        self.active_pins.set(self.active_pins.get() - 1);
    }

    fn direct_region(&self, buffer: &TestDirect) -> Option<DirectRegion> {
        if !buffer.addressable {
            return None;
        }
        Some(DirectRegion {
            base: NonNull::new(buffer.data.as_ptr() as *mut u8).unwrap_or(NonNull::dangling()),
            capacity: buffer.data.len(),
            writable: true,
        })
    }

    fn raise_error(&self, code: ErrorCode) {
        if self.active_pins.get() > 0 {
            self.raised_while_pinned
                .set(self.raised_while_pinned.get() + 1);
        }
        self.raised.borrow_mut().push(code);
    }
}
