// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the boundary between a managed host runtime and the codecs in
// `kernels`. The host owns every byte; the bridge only borrows a raw view of a
// caller-supplied window for the length of one call.
//
// Call Flow (every entry point):
//
//   1. [Entry Point (entry::Bridge)]        -> Receives handles + raw i32 offsets/lengths
//         |
//         `-> parses them into `Window` / `ElementSize` (negative -> InvalidInput)
//
//   2. [Codec Dispatcher (dispatch)]        -> Resolves 1 or 2 buffers
//         |
//         `-> a. `resolver::resolve_pair` pins heap arrays / reads direct addresses
//         |
//         `-> b. `split_windows` bounds-checks both windows and borrows them
//         |
//         `-> c. runs the `BlockCodec` or bit-shuffle kernel
//         |
//         `-> d. returns `Result<usize, BridgeError>`; the guards drop here and unpin
//
//   3. [Error Translator (translate)]       -> Ok -> value, Err -> host.raise_error(code)
//
// Nothing calls back into the host between a pin and its release: resolution
// happens up front, and `raise_error` is only reachable from step 3.
//
// ====================================================================================
pub mod dispatch;
pub mod entry;
pub mod resolver;
pub mod stateless_api;
pub mod translate;

// --- Host-Facing API ---
pub use entry::{native_library_version, supports_bit_shuffle, Bridge};

// --- Building Blocks (for adapters and testing) ---
pub use resolver::{DirectResolver, PinningResolver, ResolvedBuffer, Resolver};
pub use translate::{translate, Sentinel};
