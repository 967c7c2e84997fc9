//! Outer adapters that connect a concrete host runtime to the bridge.

pub mod python;

pub use python::*;
