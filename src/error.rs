/*!
Error types for the fallible library-level operations of the bridge.

Scope
=====
Per the design, almost nothing in the accelerated dispatch path raises a hard
error — every rejection degrades to the CPU path via `dispatch::Outcome`
(see `dispatch.rs`). `BridgeError` exists for the operations that are
genuinely fallible as library calls in their own right: transcoding a
malformed source batch, and allocating the KDS buffer a batch's row count
and column set call for. Callers that only care about the dispatch protocol
never see this type; `dispatch::try_accelerate` converts either variant into
a `Fallback` outcome plus a debug-level log line.
*/

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to allocate a {0}-byte KDS buffer")]
    AllocationFailed(usize),

    #[error("geometry payload for row {row} is malformed: {reason}")]
    MalformedGeometry { row: usize, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, BridgeError>;
