//! This file is the root of the `snapbridge` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`bridge`, `kernels`, etc.)
//!     so the Rust compiler knows they exist, and re-exporting the public API.
//! 2.  Defining the `#[pymodule]` which acts as the main entry point when the
//!     compiled library is imported into Python (feature `python`).

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod kernels;
pub mod observability;
pub mod traits;
pub mod types;

#[cfg(feature = "python")]
mod ffi;

pub use bridge::{native_library_version, supports_bit_shuffle, Bridge};
pub use config::{BridgeConfig, CodecKind, RemainderPolicy};
pub use error::{BridgeError, BufferRole, CodecOp, ErrorCode};
pub use host::{DirectRegion, HostRuntime, PinnedArray};
pub use observability::enable_verbose_logging;
pub use traits::BlockCodec;
pub use types::{BitShuffleType, BufferHandle, ElementSize, Window};

//==================================================================================
// 2. Python Module Definition
//==================================================================================
#[cfg(feature = "python")]
use pyo3::prelude::*;

/// The `snapbridge` Python module, containing all exposed Rust functions.
#[cfg(feature = "python")]
#[pymodule]
fn snapbridge(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // --- Buffer-level entry points ---
    m.add_function(wrap_pyfunction!(ffi::raw_compress_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::raw_uncompress_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::max_compressed_length_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::uncompressed_length_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::is_valid_compressed_buffer_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::array_copy_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::bit_shuffle_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::bit_unshuffle_py, m)?)?;

    // --- Direct-only variants ---
    m.add_class::<ffi::DirectBuffer>()?;
    m.add_function(wrap_pyfunction!(ffi::compress_direct_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::uncompress_direct_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::shuffle_direct_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::unshuffle_direct_py, m)?)?;

    // --- Bytes in, bytes out ---
    m.add_function(wrap_pyfunction!(ffi::compress_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::uncompress_py, m)?)?;

    m.add_function(wrap_pyfunction!(ffi::native_library_version_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::supports_bit_shuffle_py, m)?)?;
    m.add("__version__", VERSION)?;

    m.add_function(wrap_pyfunction!(ffi::enable_verbose_logging_py, m)?)?;

    Ok(())
}
