/*!
kds - The Arrow→KDS transcoder, component D (§4.D). The largest single
component by design weight (§2: "40%"), split into focused submodules:

  layout   - byte-exact sizing/offset constants (§3's header + column
             region invariants).
  geometry - the 48-byte per-value POINT-Z header and WKB parsing.
  encode   - builds a `KdsBuffer` from an `ArrowBatch`.
  decode   - the reverse operation, for the accelerator's result buffer.

Only `encode`/`decode` and `KdsBuffer` are re-exported; `layout` and
`geometry`'s constants are implementation detail an external caller never
needs (the accelerator runtime is the only other party that cares, and it
was built against this exact layout — §9).
*/

pub mod decode;
pub mod encode;
pub mod geometry;
pub mod layout;

pub use decode::decode;
pub use encode::{encode, KdsBuffer};
