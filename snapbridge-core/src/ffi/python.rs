// In: src/ffi/python.rs

//! The Python host. Heap-backed buffers are any object exporting the buffer
//! protocol with byte items (`bytes`, `bytearray`, `memoryview`, uint8 numpy
//! arrays); holding the `PyBuffer` export keeps the memory in place, so the
//! export is the pin. Off-heap buffers are `DirectBuffer` objects: a buffer
//! export taken once at construction (typically over an `mmap` or a `ctypes`
//! array) and held until the `DirectBuffer` is dropped, so every call sees the
//! same stable address without a pin step.
//!
//! Errors raised by the bridge surface as `IOError("NAME(code)")`.

use std::cell::Cell;
use std::ptr::NonNull;

use log::debug;
use pyo3::buffer::PyBuffer;
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;

use crate::bridge::{stateless_api, Bridge};
use crate::error::ErrorCode;
use crate::host::{DirectRegion, HostRuntime, PinnedArray};
use crate::types::BufferHandle;

//==================================================================================
// I. Host Implementation
//==================================================================================

/// An off-heap region backed by a live buffer export.
///
/// The exporter cannot resize or free its memory while the export is held, so
/// the address stays valid for the lifetime of this object.
#[pyclass(name = "DirectBuffer", module = "snapbridge")]
pub struct DirectBuffer {
    buffer: PyBuffer<u8>,
}

#[pymethods]
impl DirectBuffer {
    #[new]
    fn new(source: &Bound<'_, PyAny>) -> PyResult<Self> {
        let buffer = PyBuffer::<u8>::get_bound(source)?;
        if !buffer.is_c_contiguous() {
            return Err(PyValueError::new_err("direct buffers must be C-contiguous"));
        }
        Ok(Self { buffer })
    }

    #[getter]
    fn capacity(&self) -> usize {
        self.buffer.len_bytes()
    }

    #[getter]
    fn readonly(&self) -> bool {
        self.buffer.readonly()
    }
}

impl DirectBuffer {
    fn region(&self) -> Option<DirectRegion> {
        Some(DirectRegion {
            base: NonNull::new(self.buffer.buf_ptr() as *mut u8)?,
            capacity: self.buffer.len_bytes(),
            writable: !self.buffer.readonly(),
        })
    }
}

pub struct PyHost<'py> {
    py: Python<'py>,
    raised: Cell<Option<ErrorCode>>,
}

impl<'py> PyHost<'py> {
    pub fn new(py: Python<'py>) -> Self {
        Self {
            py,
            raised: Cell::new(None),
        }
    }

    /// Converts a raised code into a Python exception.
    fn finish<T>(&self, value: T) -> PyResult<T> {
        match self.raised.take() {
            Some(code) => Err(PyIOError::new_err(code.message())),
            None => Ok(value),
        }
    }
}

unsafe impl<'py> HostRuntime for PyHost<'py> {
    type Array = Bound<'py, PyAny>;
    type Direct = DirectBuffer;
    type PinToken = PyBuffer<u8>;

    fn pin_array(&self, array: &Bound<'py, PyAny>) -> Option<PinnedArray<PyBuffer<u8>>> {
        let buffer = match PyBuffer::<u8>::get_bound(array) {
            Ok(buffer) => buffer,
            Err(e) => {
                debug!("buffer export refused: {}", e);
                return None;
            }
        };
        if !buffer.is_c_contiguous() {
            buffer.release(self.py);
            return None;
        }
        let base = NonNull::new(buffer.buf_ptr() as *mut u8).unwrap_or(NonNull::dangling());
        Some(PinnedArray {
            base,
            len: buffer.len_bytes(),
            writable: !buffer.readonly(),
            token: buffer,
        })
    }

    fn unpin_array(&self, _array: &Bound<'py, PyAny>, pinned: PinnedArray<PyBuffer<u8>>) {
        pinned.token.release(self.py);
    }

    fn direct_region(&self, buffer: &DirectBuffer) -> Option<DirectRegion> {
        buffer.region()
    }

    fn raise_error(&self, code: ErrorCode) {
        self.raised.set(Some(code));
    }
}

/// A buffer argument as received from Python. `DirectBuffer` is tried first so
/// it is never mistaken for a plain buffer exporter.
#[derive(FromPyObject)]
pub enum BufferArg<'py> {
    Direct(PyRef<'py, DirectBuffer>),
    Heap(Bound<'py, PyAny>),
}

impl<'py> BufferArg<'py> {
    fn handle(&self) -> BufferHandle<'_, PyHost<'py>> {
        match self {
            BufferArg::Direct(direct) => BufferHandle::OffHeap(&**direct),
            BufferArg::Heap(obj) => BufferHandle::HeapBacked(obj),
        }
    }
}

//==================================================================================
// II. Entry Points
//==================================================================================

#[pyfunction]
#[pyo3(name = "raw_compress", signature = (input, input_offset, input_length, output, output_offset = 0))]
pub fn raw_compress_py<'py>(
    py: Python<'py>,
    input: BufferArg<'py>,
    input_offset: i32,
    input_length: i32,
    output: BufferArg<'py>,
    output_offset: i32,
) -> PyResult<i32> {
    let host = PyHost::new(py);
    let bridge = Bridge::with_defaults(&host);
    let n = bridge.raw_compress(
        input.handle(),
        input_offset,
        input_length,
        output.handle(),
        output_offset,
    );
    host.finish(n)
}

#[pyfunction]
#[pyo3(name = "raw_uncompress", signature = (input, input_offset, input_length, output, output_offset = 0))]
pub fn raw_uncompress_py<'py>(
    py: Python<'py>,
    input: BufferArg<'py>,
    input_offset: i32,
    input_length: i32,
    output: BufferArg<'py>,
    output_offset: i32,
) -> PyResult<i32> {
    let host = PyHost::new(py);
    let bridge = Bridge::with_defaults(&host);
    let n = bridge.raw_uncompress(
        input.handle(),
        input_offset,
        input_length,
        output.handle(),
        output_offset,
    );
    host.finish(n)
}

#[pyfunction]
#[pyo3(name = "max_compressed_length")]
pub fn max_compressed_length_py(py: Python<'_>, source_bytes: i32) -> PyResult<i32> {
    let host = PyHost::new(py);
    let n = Bridge::with_defaults(&host).max_compressed_length(source_bytes);
    host.finish(n)
}

#[pyfunction]
#[pyo3(name = "uncompressed_length")]
pub fn uncompressed_length_py<'py>(
    py: Python<'py>,
    input: BufferArg<'py>,
    offset: i32,
    length: i32,
) -> PyResult<i32> {
    let host = PyHost::new(py);
    let n = Bridge::with_defaults(&host).uncompressed_length(input.handle(), offset, length);
    host.finish(n)
}

#[pyfunction]
#[pyo3(name = "is_valid_compressed_buffer")]
pub fn is_valid_compressed_buffer_py<'py>(
    py: Python<'py>,
    input: BufferArg<'py>,
    offset: i32,
    length: i32,
) -> PyResult<bool> {
    let host = PyHost::new(py);
    let valid = Bridge::with_defaults(&host).is_valid_compressed_buffer(input.handle(), offset, length);
    host.finish(valid)
}

#[pyfunction]
#[pyo3(name = "array_copy")]
pub fn array_copy_py<'py>(
    py: Python<'py>,
    src: BufferArg<'py>,
    offset: i32,
    length: i32,
    dest: BufferArg<'py>,
    dest_offset: i32,
) -> PyResult<()> {
    let host = PyHost::new(py);
    Bridge::with_defaults(&host).array_copy(src.handle(), offset, length, dest.handle(), dest_offset);
    host.finish(())
}

#[pyfunction]
#[pyo3(name = "bit_shuffle", signature = (input, input_offset, type_size, length, output, output_offset = 0))]
pub fn bit_shuffle_py<'py>(
    py: Python<'py>,
    input: BufferArg<'py>,
    input_offset: i32,
    type_size: i32,
    length: i32,
    output: BufferArg<'py>,
    output_offset: i32,
) -> PyResult<i32> {
    let host = PyHost::new(py);
    let n = Bridge::with_defaults(&host).bit_shuffle(
        input.handle(),
        input_offset,
        type_size,
        length,
        output.handle(),
        output_offset,
    );
    host.finish(n)
}

#[pyfunction]
#[pyo3(name = "bit_unshuffle", signature = (input, input_offset, type_size, length, output, output_offset = 0))]
pub fn bit_unshuffle_py<'py>(
    py: Python<'py>,
    input: BufferArg<'py>,
    input_offset: i32,
    type_size: i32,
    length: i32,
    output: BufferArg<'py>,
    output_offset: i32,
) -> PyResult<i32> {
    let host = PyHost::new(py);
    let n = Bridge::with_defaults(&host).bit_unshuffle(
        input.handle(),
        input_offset,
        type_size,
        length,
        output.handle(),
        output_offset,
    );
    host.finish(n)
}

// --- Direct-only variants: whole buffers, offsets zero ---

#[pyfunction]
#[pyo3(name = "compress_direct")]
pub fn compress_direct_py<'py>(
    py: Python<'py>,
    input: BufferArg<'py>,
    output: BufferArg<'py>,
) -> PyResult<i32> {
    let host = PyHost::new(py);
    let len = direct_len(&input);
    let n = Bridge::with_defaults(&host).compress_direct(input.handle(), 0, len, output.handle(), 0);
    host.finish(n)
}

#[pyfunction]
#[pyo3(name = "uncompress_direct")]
pub fn uncompress_direct_py<'py>(
    py: Python<'py>,
    input: BufferArg<'py>,
    output: BufferArg<'py>,
) -> PyResult<i32> {
    let host = PyHost::new(py);
    let len = direct_len(&input);
    let n = Bridge::with_defaults(&host).uncompress_direct(input.handle(), 0, len, output.handle(), 0);
    host.finish(n)
}

#[pyfunction]
#[pyo3(name = "shuffle_direct")]
pub fn shuffle_direct_py<'py>(
    py: Python<'py>,
    input: BufferArg<'py>,
    type_size: i32,
    output: BufferArg<'py>,
) -> PyResult<i32> {
    let host = PyHost::new(py);
    let len = direct_len(&input);
    let n = Bridge::with_defaults(&host).shuffle_direct(
        input.handle(),
        0,
        type_size,
        len,
        output.handle(),
        0,
    );
    host.finish(n)
}

#[pyfunction]
#[pyo3(name = "unshuffle_direct")]
pub fn unshuffle_direct_py<'py>(
    py: Python<'py>,
    input: BufferArg<'py>,
    type_size: i32,
    output: BufferArg<'py>,
) -> PyResult<i32> {
    let host = PyHost::new(py);
    let len = direct_len(&input);
    let n = Bridge::with_defaults(&host).unshuffle_direct(
        input.handle(),
        0,
        type_size,
        len,
        output.handle(),
        0,
    );
    host.finish(n)
}

/// Capacity of a direct buffer as a host length. Heap buffers report 0 here;
/// the direct-only entry points reject them before the length matters.
fn direct_len(buffer: &BufferArg<'_>) -> i32 {
    match buffer {
        BufferArg::Direct(direct) => i32::try_from(direct.capacity()).unwrap_or(i32::MAX),
        BufferArg::Heap(_) => 0,
    }
}

//==================================================================================
// III. Convenience API (bytes in, bytes out)
//==================================================================================

#[pyfunction]
#[pyo3(name = "compress")]
pub fn compress_py<'py>(py: Python<'py>, data: &[u8]) -> PyResult<Bound<'py, PyBytes>> {
    let compressed = py.allow_threads(|| stateless_api::compress(data))?;
    Ok(PyBytes::new_bound(py, &compressed))
}

#[pyfunction]
#[pyo3(name = "uncompress")]
pub fn uncompress_py<'py>(py: Python<'py>, data: &[u8]) -> PyResult<Bound<'py, PyBytes>> {
    let raw = py.allow_threads(|| stateless_api::uncompress(data))?;
    Ok(PyBytes::new_bound(py, &raw))
}

#[pyfunction]
#[pyo3(name = "native_library_version")]
pub fn native_library_version_py() -> &'static str {
    crate::bridge::native_library_version()
}

#[pyfunction]
#[pyo3(name = "supports_bit_shuffle")]
pub fn supports_bit_shuffle_py() -> bool {
    crate::bridge::supports_bit_shuffle()
}

#[pyfunction]
#[pyo3(name = "enable_verbose_logging", signature = (log_file = None))]
pub fn enable_verbose_logging_py(log_file: Option<String>) -> PyResult<()> {
    crate::observability::enable_verbose_logging(log_file.as_deref())?;
    Ok(())
}
