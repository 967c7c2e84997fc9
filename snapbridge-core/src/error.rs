// In: src/error.rs

//! This module defines the single, unified error type for the snapbridge library,
//! together with the fixed numeric code table the host runtime understands.
//!
//! Core operations never raise anything themselves. They return
//! `Result<T, BridgeError>`, and only the translator (`bridge::translate`) or an
//! outer adapter turns a `BridgeError` into the host's own error signal.

use std::fmt;

use thiserror::Error;

//==================================================================================
// I. Buffer Roles
//==================================================================================

/// Which side of an operation a buffer was supplied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferRole {
    Source,
    Destination,
}

impl fmt::Display for BufferRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferRole::Source => f.write_str("input"),
            BufferRole::Destination => f.write_str("destination"),
        }
    }
}

/// The codec operation that rejected its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecOp {
    Compress,
    Uncompress,
    UncompressedLength,
    Shuffle,
    Unshuffle,
}

impl fmt::Display for CodecOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodecOp::Compress => "compress",
            CodecOp::Uncompress => "uncompress",
            CodecOp::UncompressedLength => "uncompressed length",
            CodecOp::Shuffle => "bit-shuffle",
            CodecOp::Unshuffle => "bit-unshuffle",
        };
        f.write_str(name)
    }
}

//==================================================================================
// II. The Error Type
//==================================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The host could not produce a usable address for the buffer, e.g. a
    /// non-direct buffer was passed where a direct one is required, or a
    /// read-only buffer was passed as a destination.
    #[error("{role} is not a direct buffer")]
    BufferUnavailable { role: BufferRole },

    /// Pinning a heap-backed buffer was denied by the host.
    #[error("failed to pin the {role} buffer (out of memory)")]
    OutOfMemory { role: BufferRole },

    /// Malformed offset/length/element-size combination.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The external codec rejected the data as corrupt or malformed.
    #[error("Codec {op} failed: {reason}")]
    CodecFailure { op: CodecOp, reason: String },
}

impl BridgeError {
    pub(crate) fn codec(op: CodecOp, reason: impl fmt::Display) -> Self {
        BridgeError::CodecFailure {
            op,
            reason: reason.to_string(),
        }
    }

    /// The numeric code handed to the host's error-raising callback.
    pub fn code(&self) -> ErrorCode {
        match self {
            BridgeError::BufferUnavailable { .. } => ErrorCode::NotADirectBuffer,
            BridgeError::OutOfMemory { .. } => ErrorCode::OutOfMemory,
            BridgeError::InvalidInput(_) => ErrorCode::ParsingError,
            BridgeError::CodecFailure {
                op: CodecOp::Uncompress,
                ..
            } => ErrorCode::FailedToUncompress,
            BridgeError::CodecFailure { .. } => ErrorCode::ParsingError,
        }
    }
}

//==================================================================================
// III. Host Error Codes
//==================================================================================

/// Error codes shared with the host side.
///
/// DO NOT renumber these: the ids are part of the contract with the host's
/// exception constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Unknown = 0,
    FailedToLoadNativeLibrary = 1,
    ParsingError = 2,
    NotADirectBuffer = 3,
    OutOfMemory = 4,
    FailedToUncompress = 5,
}

impl ErrorCode {
    const ALL: [ErrorCode; 6] = [
        ErrorCode::Unknown,
        ErrorCode::FailedToLoadNativeLibrary,
        ErrorCode::ParsingError,
        ErrorCode::NotADirectBuffer,
        ErrorCode::OutOfMemory,
        ErrorCode::FailedToUncompress,
    ];

    pub fn id(self) -> i32 {
        self as i32
    }

    /// Unrecognised ids map to `Unknown`.
    pub fn from_id(id: i32) -> Self {
        Self::ALL
            .into_iter()
            .find(|code| code.id() == id)
            .unwrap_or(ErrorCode::Unknown)
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::Unknown => "UNKNOWN",
            ErrorCode::FailedToLoadNativeLibrary => "FAILED_TO_LOAD_NATIVE_LIBRARY",
            ErrorCode::ParsingError => "PARSING_ERROR",
            ErrorCode::NotADirectBuffer => "NOT_A_DIRECT_BUFFER",
            ErrorCode::OutOfMemory => "OUT_OF_MEMORY",
            ErrorCode::FailedToUncompress => "FAILED_TO_UNCOMPRESS",
        }
    }

    /// The message the host attaches to the error it raises, e.g. `PARSING_ERROR(2)`.
    pub fn message(self) -> String {
        format!("{}({})", self.name(), self.id())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

impl From<bytemuck::PodCastError> for BridgeError {
    fn from(err: bytemuck::PodCastError) -> Self {
        BridgeError::InvalidInput(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<BridgeError> for pyo3::PyErr {
    fn from(err: BridgeError) -> pyo3::PyErr {
        pyo3::exceptions::PyIOError::new_err(format!("{}: {}", err.code(), err))
    }
}
