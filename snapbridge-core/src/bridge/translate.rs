// In: src/bridge/translate.rs

//! The Error Translator. Turns a `Result` into the host's calling convention:
//! on failure the host is told the error code and the caller gets a dummy
//! return value that the host discards once its own exception is pending.
//!
//! `translate` takes the finished `Result`, so by construction every
//! `ResolvedBuffer` of the call has been dropped (and unpinned) before
//! `raise_error` runs.

use log::debug;

use crate::error::BridgeError;
use crate::host::HostRuntime;

/// The value returned to the host alongside a raised error.
pub trait Sentinel {
    fn sentinel() -> Self;
}

impl Sentinel for i32 {
    fn sentinel() -> Self {
        0
    }
}

impl Sentinel for i64 {
    fn sentinel() -> Self {
        0
    }
}

impl Sentinel for usize {
    fn sentinel() -> Self {
        0
    }
}

impl Sentinel for bool {
    fn sentinel() -> Self {
        false
    }
}

impl Sentinel for () {
    fn sentinel() -> Self {}
}

pub fn translate<H, T>(host: &H, result: Result<T, BridgeError>) -> T
where
    H: HostRuntime + ?Sized,
    T: Sentinel,
{
    match result {
        Ok(value) => value,
        Err(err) => {
            let code = err.code();
            debug!("raising {} to host: {}", code, err);
            host.raise_error(code);
            T::sentinel()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BufferRole, ErrorCode};
    use crate::host::test_host::TestHost;

    #[test]
    fn test_ok_passes_through_without_raising() {
        let host = TestHost::new();
        assert_eq!(translate(&host, Ok::<i32, BridgeError>(42)), 42);
        assert!(host.raised().is_empty());
    }

    #[test]
    fn test_errors_raise_their_code_and_return_sentinel() {
        let host = TestHost::new();
        let n: i32 = translate(
            &host,
            Err(BridgeError::BufferUnavailable {
                role: BufferRole::Source,
            }),
        );
        let valid: bool = translate(&host, Err(BridgeError::InvalidInput("x".into())));
        translate::<_, ()>(
            &host,
            Err(BridgeError::OutOfMemory {
                role: BufferRole::Destination,
            }),
        );
        assert_eq!(n, 0);
        assert!(!valid);
        assert_eq!(
            host.raised(),
            vec![
                ErrorCode::NotADirectBuffer,
                ErrorCode::ParsingError,
                ErrorCode::OutOfMemory
            ]
        );
    }
}
